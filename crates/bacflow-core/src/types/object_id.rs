use crate::types::ObjectType;
use crate::EncodeError;

pub const MAX_INSTANCE: u32 = 0x3F_FFFF;
pub const MAX_OBJECT_TYPE: u16 = 0x3FF;

/// A packed BACnet object identifier: 10-bit type, 22-bit instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(into = "ObjectIdParts", try_from = "ObjectIdParts")
)]
pub struct ObjectId(u32);

impl ObjectId {
    /// Packs a type and instance.
    ///
    /// Out-of-range parts are rejected rather than truncated.
    pub const fn new(object_type: ObjectType, instance: u32) -> Result<Self, EncodeError> {
        let t = object_type.to_u16();
        if t > MAX_OBJECT_TYPE || instance > MAX_INSTANCE {
            return Err(EncodeError::ValueOutOfRange);
        }
        Ok(Self(((t as u32) << 22) | instance))
    }

    /// Shorthand for the device object of `instance`.
    pub const fn device(instance: u32) -> Result<Self, EncodeError> {
        Self::new(ObjectType::Device, instance)
    }

    pub const fn raw(self) -> u32 {
        self.0
    }

    /// Every 32-bit pattern is a valid packing, so this never fails.
    pub const fn from_raw(raw: u32) -> Self {
        Self(raw)
    }

    pub const fn object_type(self) -> ObjectType {
        ObjectType::from_u16(((self.0 >> 22) & MAX_OBJECT_TYPE as u32) as u16)
    }

    pub const fn instance(self) -> u32 {
        self.0 & MAX_INSTANCE
    }
}

impl core::fmt::Display for ObjectId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}:{}", self.object_type(), self.instance())
    }
}

/// Serialized form of [`ObjectId`].
#[cfg(feature = "serde")]
#[derive(serde::Serialize, serde::Deserialize)]
struct ObjectIdParts {
    object_type: ObjectType,
    instance: u32,
}

#[cfg(feature = "serde")]
impl From<ObjectId> for ObjectIdParts {
    fn from(id: ObjectId) -> Self {
        Self {
            object_type: id.object_type(),
            instance: id.instance(),
        }
    }
}

#[cfg(feature = "serde")]
impl TryFrom<ObjectIdParts> for ObjectId {
    type Error = EncodeError;

    fn try_from(parts: ObjectIdParts) -> Result<Self, Self::Error> {
        ObjectId::new(parts.object_type, parts.instance)
    }
}
