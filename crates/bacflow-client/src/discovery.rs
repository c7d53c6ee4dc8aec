//! Devices found by Who-Is and the objects read from them.

use crate::{ClientDataValue, ClientError};
use bacflow_core::services::i_am::IAmRequest;
use bacflow_core::types::{Address, MaxApdu, ObjectId, ObjectType, PropertyId, Segmentation};
use std::collections::BTreeMap;

/// A device and everything learnt about it so far.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Device {
    pub address: Address,
    pub device_id: ObjectId,
    /// Largest APDU the device accepts, in octets.
    pub max_apdu: u32,
    pub segmentation: Segmentation,
    pub vendor_id: u32,
    #[cfg_attr(feature = "serde", serde(default, with = "objects_by_type_name"))]
    pub objects: BTreeMap<ObjectType, BTreeMap<u32, Object>>,
}

impl Device {
    /// A device known only by address and instance, assumed to take full
    /// 1476-octet APDUs.
    pub fn new(address: Address, instance: u32) -> Result<Self, ClientError> {
        Ok(Self {
            address,
            device_id: ObjectId::device(instance)?,
            max_apdu: MaxApdu::UpTo1476.octets(),
            segmentation: Segmentation::NoSegmentation,
            vendor_id: 0,
            objects: BTreeMap::new(),
        })
    }

    pub fn from_i_am(address: Address, i_am: &IAmRequest) -> Self {
        Self {
            address,
            device_id: i_am.device_id,
            max_apdu: i_am.max_apdu,
            segmentation: i_am.segmentation,
            vendor_id: i_am.vendor_id,
            objects: BTreeMap::new(),
        }
    }

    pub fn instance(&self) -> u32 {
        self.device_id.instance()
    }

    /// The APDU budget requests to this device must fit.
    pub fn max_apdu_len(&self) -> usize {
        self.max_apdu.max(MaxApdu::UpTo50.octets()) as usize
    }

    pub fn insert_object(&mut self, object: Object) {
        self.objects
            .entry(object.object_id.object_type())
            .or_default()
            .insert(object.object_id.instance(), object);
    }

    pub fn object(&self, id: ObjectId) -> Option<&Object> {
        self.objects.get(&id.object_type())?.get(&id.instance())
    }

    pub fn object_count(&self) -> usize {
        self.objects.values().map(BTreeMap::len).sum()
    }
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Object {
    pub object_id: ObjectId,
    pub name: Option<String>,
    pub description: Option<String>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub properties: Vec<PropertyValue>,
}

impl Object {
    pub fn new(object_id: ObjectId) -> Self {
        Self {
            object_id,
            name: None,
            description: None,
            properties: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PropertyValue {
    pub property_id: PropertyId,
    pub value: ClientDataValue,
}

/// Object maps keyed by the protocol type name so they serialize as JSON objects.
#[cfg(feature = "serde")]
mod objects_by_type_name {
    use super::Object;
    use bacflow_core::types::ObjectType;
    use serde::de::Error as _;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::collections::BTreeMap;

    type Objects = BTreeMap<ObjectType, BTreeMap<u32, Object>>;

    pub fn serialize<S: Serializer>(objects: &Objects, serializer: S) -> Result<S::Ok, S::Error> {
        objects
            .iter()
            .map(|(object_type, by_instance)| (object_type.to_string(), by_instance))
            .collect::<BTreeMap<_, _>>()
            .serialize(serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Objects, D::Error> {
        let named = BTreeMap::<String, BTreeMap<u32, Object>>::deserialize(deserializer)?;
        named
            .into_iter()
            .map(|(name, by_instance)| {
                parse_type(&name)
                    .map(|object_type| (object_type, by_instance))
                    .ok_or_else(|| D::Error::custom(format!("unknown object type '{name}'")))
            })
            .collect()
    }

    fn parse_type(name: &str) -> Option<ObjectType> {
        match name.strip_prefix("proprietary-") {
            Some(number) => number.parse().ok().map(ObjectType::from_u16),
            None => ObjectType::from_name(name),
        }
    }
}
