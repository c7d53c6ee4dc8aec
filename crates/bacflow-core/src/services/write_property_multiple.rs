use crate::apdu::ConfirmedRequestHeader;
use crate::encoding::{
    primitives::{encode_ctx_object_id, encode_ctx_unsigned},
    tag::Tag,
    writer::Writer,
};
use crate::services::value_codec::encode_application_data_value;
use crate::services::write_property::PRIORITY_RANGE;
use crate::types::{DataValue, ObjectId, PropertyId};
use crate::EncodeError;

pub const SERVICE_WRITE_PROPERTY_MULTIPLE: u8 = 0x10;

/// One property write inside a [`WriteAccessSpecification`].
#[derive(Debug, Clone, PartialEq)]
pub struct PropertyWriteSpec<'a> {
    pub property_id: PropertyId,
    pub array_index: Option<u32>,
    pub value: DataValue<'a>,
    pub priority: Option<u8>,
}

impl<'a> PropertyWriteSpec<'a> {
    pub const fn new(property_id: PropertyId, value: DataValue<'a>) -> Self {
        Self {
            property_id,
            array_index: None,
            value,
            priority: None,
        }
    }

    pub const fn at_priority(mut self, priority: u8) -> Self {
        self.priority = Some(priority);
        self
    }

    pub const fn at_index(mut self, index: u32) -> Self {
        self.array_index = Some(index);
        self
    }

    fn encode(&self, w: &mut Writer<'_>) -> Result<(), EncodeError> {
        encode_ctx_unsigned(w, 0, self.property_id.to_u32())?;
        if let Some(idx) = self.array_index {
            encode_ctx_unsigned(w, 1, idx)?;
        }
        Tag::Opening { tag_num: 2 }.encode(w)?;
        encode_application_data_value(w, &self.value)?;
        Tag::Closing { tag_num: 2 }.encode(w)?;
        match self.priority {
            Some(priority) => encode_ctx_unsigned(w, 3, u32::from(priority)),
            None => Ok(()),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct WriteAccessSpecification<'a> {
    pub object_id: ObjectId,
    pub properties: &'a [PropertyWriteSpec<'a>],
}

#[derive(Debug, Clone, PartialEq)]
pub struct WritePropertyMultipleRequest<'a> {
    pub specs: &'a [WriteAccessSpecification<'a>],
    pub invoke_id: u8,
}

impl<'a> WritePropertyMultipleRequest<'a> {
    /// Fails with `ValueOutOfRange` before writing anything if any priority
    /// lies outside 1-16.
    pub fn encode(&self, w: &mut Writer<'_>) -> Result<(), EncodeError> {
        let bad_priority = self
            .specs
            .iter()
            .flat_map(|spec| spec.properties)
            .filter_map(|prop| prop.priority)
            .any(|p| !PRIORITY_RANGE.contains(&p));
        if bad_priority {
            return Err(EncodeError::ValueOutOfRange);
        }

        ConfirmedRequestHeader::new(self.invoke_id, SERVICE_WRITE_PROPERTY_MULTIPLE).encode(w)?;
        for spec in self.specs {
            encode_ctx_object_id(w, 0, spec.object_id.raw())?;
            Tag::Opening { tag_num: 1 }.encode(w)?;
            for prop in spec.properties {
                prop.encode(w)?;
            }
            Tag::Closing { tag_num: 1 }.encode(w)?;
        }
        Ok(())
    }
}
