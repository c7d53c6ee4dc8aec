use bacflow_core::services::read_property_multiple::{PropertyResult, ReadAccessResult};
use bacflow_core::types::{
    BitString, DataValue, Date, ErrorClass, ErrorCode, ObjectId, PropertyId, Time,
};

/// An owned application value, detached from the frame it was decoded from.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ClientDataValue {
    Null,
    Boolean(bool),
    Unsigned(u32),
    Signed(i32),
    Real(f32),
    Double(f64),
    OctetString(Vec<u8>),
    CharacterString(String),
    BitString { unused_bits: u8, data: Vec<u8> },
    Enumerated(u32),
    Date(Date),
    Time(Time),
    ObjectId(ObjectId),
    Constructed {
        tag_num: u8,
        values: Vec<ClientDataValue>,
    },
}

impl ClientDataValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::CharacterString(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_unsigned(&self) -> Option<u32> {
        match self {
            Self::Unsigned(v) => Some(*v),
            _ => None,
        }
    }

    /// Object identifiers held directly or inside a list.
    pub fn object_ids(&self) -> Vec<ObjectId> {
        match self {
            Self::ObjectId(id) => vec![*id],
            Self::Constructed { values, .. } => values
                .iter()
                .filter_map(|v| match v {
                    Self::ObjectId(id) => Some(*id),
                    _ => None,
                })
                .collect(),
            _ => Vec::new(),
        }
    }

    /// Borrows this value for encoding.
    pub fn as_data_value(&self) -> DataValue<'_> {
        match self {
            Self::Null => DataValue::Null,
            Self::Boolean(v) => DataValue::Boolean(*v),
            Self::Unsigned(v) => DataValue::Unsigned(*v),
            Self::Signed(v) => DataValue::Signed(*v),
            Self::Real(v) => DataValue::Real(*v),
            Self::Double(v) => DataValue::Double(*v),
            Self::OctetString(v) => DataValue::OctetString(v),
            Self::CharacterString(v) => DataValue::CharacterString(v),
            Self::BitString { unused_bits, data } => DataValue::BitString(BitString {
                unused_bits: *unused_bits,
                data,
            }),
            Self::Enumerated(v) => DataValue::Enumerated(*v),
            Self::Date(v) => DataValue::Date(*v),
            Self::Time(v) => DataValue::Time(*v),
            Self::ObjectId(v) => DataValue::ObjectId(*v),
            Self::Constructed { tag_num, values } => DataValue::Constructed {
                tag_num: *tag_num,
                values: values.iter().map(Self::as_data_value).collect(),
            },
        }
    }
}

impl From<DataValue<'_>> for ClientDataValue {
    fn from(value: DataValue<'_>) -> Self {
        match value {
            DataValue::Null => Self::Null,
            DataValue::Boolean(v) => Self::Boolean(v),
            DataValue::Unsigned(v) => Self::Unsigned(v),
            DataValue::Signed(v) => Self::Signed(v),
            DataValue::Real(v) => Self::Real(v),
            DataValue::Double(v) => Self::Double(v),
            DataValue::OctetString(v) => Self::OctetString(v.to_vec()),
            DataValue::CharacterString(v) => Self::CharacterString(v.to_string()),
            DataValue::BitString(v) => Self::BitString {
                unused_bits: v.unused_bits,
                data: v.data.to_vec(),
            },
            DataValue::Enumerated(v) => Self::Enumerated(v),
            DataValue::Date(v) => Self::Date(v),
            DataValue::Time(v) => Self::Time(v),
            DataValue::ObjectId(v) => Self::ObjectId(v),
            DataValue::Constructed { tag_num, values } => Self::Constructed {
                tag_num,
                values: values.into_iter().map(Self::from).collect(),
            },
        }
    }
}

/// The (class, code) pair a device returned for one property.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PropertyError {
    pub class: u32,
    pub code: u32,
}

impl PropertyError {
    pub fn error_class(&self) -> Option<ErrorClass> {
        ErrorClass::from_u32(self.class)
    }

    pub fn error_code(&self) -> Option<ErrorCode> {
        ErrorCode::from_u32(self.code)
    }
}

/// One property of a read-multiple reply.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PropertyRead {
    pub property_id: PropertyId,
    pub array_index: Option<u32>,
    pub value: Result<ClientDataValue, PropertyError>,
}

/// Every property read from one object in a read-multiple reply.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ObjectReads {
    pub object_id: ObjectId,
    pub properties: Vec<PropertyRead>,
}

impl ObjectReads {
    /// The value read for `property_id`, if the device returned one.
    pub fn value(&self, property_id: PropertyId) -> Option<&ClientDataValue> {
        self.properties
            .iter()
            .find(|p| p.property_id == property_id)
            .and_then(|p| p.value.as_ref().ok())
    }
}

impl From<ReadAccessResult<'_>> for ObjectReads {
    fn from(result: ReadAccessResult<'_>) -> Self {
        Self {
            object_id: result.object_id,
            properties: result
                .results
                .into_iter()
                .map(|element| PropertyRead {
                    property_id: element.property_id,
                    array_index: element.array_index,
                    value: match element.result {
                        PropertyResult::Value(v) => Ok(v.into()),
                        PropertyResult::Error { class, code } => Err(PropertyError { class, code }),
                    },
                })
                .collect(),
        }
    }
}
