use crate::apdu::ConfirmedRequestHeader;
use crate::encoding::{
    primitives::{encode_ctx_object_id, encode_ctx_unsigned},
    tag::Tag,
    writer::Writer,
};
use crate::types::{ObjectId, PropertyId};
use crate::EncodeError;

#[cfg(feature = "alloc")]
use crate::apdu::{decode_error_values, ComplexAckHeader};
#[cfg(feature = "alloc")]
use crate::encoding::{
    primitives::{
        decode_ctx_object_id, decode_ctx_unsigned, decode_optional_ctx_unsigned,
        encode_app_enumerated,
    },
    reader::Reader,
    tag::{expect_closing, expect_opening},
};
#[cfg(feature = "alloc")]
use crate::error::TagClass;
#[cfg(feature = "alloc")]
use crate::services::value_codec::{decode_values_until_closing, encode_application_data_value};
#[cfg(feature = "alloc")]
use crate::types::DataValue;
#[cfg(feature = "alloc")]
use crate::DecodeError;
#[cfg(feature = "alloc")]
use alloc::vec::Vec;

pub const SERVICE_READ_PROPERTY_MULTIPLE: u8 = 0x0E;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PropertyReference {
    pub property_id: PropertyId,
    pub array_index: Option<u32>,
}

impl PropertyReference {
    pub const fn new(property_id: PropertyId) -> Self {
        Self {
            property_id,
            array_index: None,
        }
    }

    pub const fn indexed(property_id: PropertyId, index: u32) -> Self {
        Self {
            property_id,
            array_index: Some(index),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReadAccessSpecification<'a> {
    pub object_id: ObjectId,
    pub properties: &'a [PropertyReference],
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReadPropertyMultipleRequest<'a> {
    pub specs: &'a [ReadAccessSpecification<'a>],
    pub invoke_id: u8,
}

impl<'a> ReadPropertyMultipleRequest<'a> {
    pub fn encode(&self, w: &mut Writer<'_>) -> Result<(), EncodeError> {
        ConfirmedRequestHeader::new(self.invoke_id, SERVICE_READ_PROPERTY_MULTIPLE).encode(w)?;
        for spec in self.specs {
            encode_ctx_object_id(w, 0, spec.object_id.raw())?;
            Tag::Opening { tag_num: 1 }.encode(w)?;
            for prop in spec.properties {
                encode_ctx_unsigned(w, 0, prop.property_id.to_u32())?;
                if let Some(idx) = prop.array_index {
                    encode_ctx_unsigned(w, 1, idx)?;
                }
            }
            Tag::Closing { tag_num: 1 }.encode(w)?;
        }
        Ok(())
    }
}

/// Outcome of reading one property: its value or the device's error.
#[cfg(feature = "alloc")]
#[derive(Debug, Clone, PartialEq)]
pub enum PropertyResult<'a> {
    Value(DataValue<'a>),
    Error { class: u32, code: u32 },
}

#[cfg(feature = "alloc")]
#[derive(Debug, Clone, PartialEq)]
pub struct ReadResultElement<'a> {
    pub property_id: PropertyId,
    pub array_index: Option<u32>,
    pub result: PropertyResult<'a>,
}

#[cfg(feature = "alloc")]
#[derive(Debug, Clone, PartialEq)]
pub struct ReadAccessResult<'a> {
    pub object_id: ObjectId,
    pub results: Vec<ReadResultElement<'a>>,
}

#[cfg(feature = "alloc")]
#[derive(Debug, Clone, PartialEq)]
pub struct ReadPropertyMultipleAck<'a> {
    pub results: Vec<ReadAccessResult<'a>>,
}

#[cfg(feature = "alloc")]
impl<'a> ReadPropertyMultipleAck<'a> {
    pub fn encode(&self, w: &mut Writer<'_>, invoke_id: u8) -> Result<(), EncodeError> {
        ComplexAckHeader::new(invoke_id, SERVICE_READ_PROPERTY_MULTIPLE).encode(w)?;
        for object in &self.results {
            encode_ctx_object_id(w, 0, object.object_id.raw())?;
            Tag::Opening { tag_num: 1 }.encode(w)?;
            for element in &object.results {
                encode_ctx_unsigned(w, 2, element.property_id.to_u32())?;
                if let Some(idx) = element.array_index {
                    encode_ctx_unsigned(w, 3, idx)?;
                }
                match &element.result {
                    PropertyResult::Value(value) => {
                        Tag::Opening { tag_num: 4 }.encode(w)?;
                        encode_application_data_value(w, value)?;
                        Tag::Closing { tag_num: 4 }.encode(w)?;
                    }
                    PropertyResult::Error { class, code } => {
                        Tag::Opening { tag_num: 5 }.encode(w)?;
                        encode_app_enumerated(w, *class)?;
                        encode_app_enumerated(w, *code)?;
                        Tag::Closing { tag_num: 5 }.encode(w)?;
                    }
                }
            }
            Tag::Closing { tag_num: 1 }.encode(w)?;
        }
        Ok(())
    }

    /// Decodes every object block up to the end of the buffer.
    ///
    /// A per-property error block `[5]` is recorded in place and decoding
    /// carries on with the next property.
    pub fn decode_after_header(r: &mut Reader<'a>) -> Result<Self, DecodeError> {
        let mut results = Vec::new();
        while !r.is_empty() {
            let object_id = ObjectId::from_raw(decode_ctx_object_id(r, 0)?);
            expect_opening(r, 1)?;

            let mut elements = Vec::new();
            while Tag::peek(r)? != (Tag::Closing { tag_num: 1 }) {
                elements.push(decode_element(r)?);
            }
            expect_closing(r, 1)?;

            results.push(ReadAccessResult {
                object_id,
                results: elements,
            });
        }
        Ok(Self { results })
    }
}

#[cfg(feature = "alloc")]
fn decode_element<'a>(r: &mut Reader<'a>) -> Result<ReadResultElement<'a>, DecodeError> {
    let property_id = PropertyId::from_u32(decode_ctx_unsigned(r, 2)?);
    let array_index = decode_optional_ctx_unsigned(r, 3)?;
    let result = match Tag::decode(r)? {
        Tag::Opening { tag_num: 4 } => {
            PropertyResult::Value(decode_values_until_closing(r, 4, Some(property_id))?)
        }
        Tag::Opening { tag_num: 5 } => {
            let (class, code) = decode_error_values(r)?;
            expect_closing(r, 5)?;
            PropertyResult::Error { class, code }
        }
        Tag::Opening { tag_num } => {
            return Err(DecodeError::IncorrectTag {
                expected: 4,
                actual: tag_num,
            })
        }
        _ => {
            return Err(DecodeError::WrongTagType {
                expected: TagClass::Opening,
            })
        }
    };
    Ok(ReadResultElement {
        property_id,
        array_index,
        result,
    })
}
