use crate::encoding::{
    primitives::{
        decode_character_string, decode_signed, decode_unsigned, encode_signed, encode_unsigned,
        signed_width, unsigned_width,
    },
    reader::Reader,
    tag::{AppTag, Tag},
    writer::Writer,
};
use crate::error::TagClass;
use crate::services::context::context_tag_type;
use crate::types::{BitString, DataValue, Date, ObjectId, PropertyId, Time};
use crate::{DecodeError, EncodeError};

#[cfg(not(feature = "alloc"))]
use crate::encoding::tag::expect_closing;
#[cfg(feature = "alloc")]
use alloc::vec::Vec;

fn u32_len(len: usize) -> Result<u32, EncodeError> {
    u32::try_from(len).map_err(|_| EncodeError::ValueOutOfRange)
}

pub fn encode_application_data_value(
    w: &mut Writer<'_>,
    value: &DataValue<'_>,
) -> Result<(), EncodeError> {
    let app = |tag, len| Tag::Application { tag, len };
    match value {
        DataValue::Null => app(AppTag::Null, 0).encode(w),
        DataValue::Boolean(v) => app(AppTag::Boolean, u32::from(*v)).encode(w),
        DataValue::Unsigned(v) | DataValue::Enumerated(v) => {
            let tag = if matches!(value, DataValue::Unsigned(_)) {
                AppTag::UnsignedInt
            } else {
                AppTag::Enumerated
            };
            app(tag, unsigned_width(*v) as u32).encode(w)?;
            encode_unsigned(w, *v).map(|_| ())
        }
        DataValue::Signed(v) => {
            app(AppTag::SignedInt, signed_width(*v) as u32).encode(w)?;
            encode_signed(w, *v).map(|_| ())
        }
        DataValue::Real(v) => {
            app(AppTag::Real, 4).encode(w)?;
            w.write_be_u32(v.to_bits())
        }
        DataValue::Double(v) => {
            app(AppTag::Double, 8).encode(w)?;
            w.write_all(&v.to_bits().to_be_bytes())
        }
        DataValue::OctetString(v) => {
            app(AppTag::OctetString, u32_len(v.len())?).encode(w)?;
            w.write_all(v)
        }
        DataValue::CharacterString(v) => {
            let bytes = v.as_bytes();
            app(AppTag::CharacterString, u32_len(bytes.len() + 1)?).encode(w)?;
            // Character set 0: UTF-8.
            w.write_u8(0)?;
            w.write_all(bytes)
        }
        DataValue::BitString(v) => {
            if v.unused_bits > 7 {
                return Err(EncodeError::ValueOutOfRange);
            }
            app(AppTag::BitString, u32_len(v.data.len() + 1)?).encode(w)?;
            w.write_u8(v.unused_bits)?;
            w.write_all(v.data)
        }
        DataValue::Date(v) => {
            app(AppTag::Date, 4).encode(w)?;
            w.write_all(&v.to_bytes())
        }
        DataValue::Time(v) => {
            app(AppTag::Time, 4).encode(w)?;
            w.write_all(&v.to_bytes())
        }
        DataValue::ObjectId(v) => {
            app(AppTag::ObjectId, 4).encode(w)?;
            w.write_be_u32(v.raw())
        }
        #[cfg(feature = "alloc")]
        DataValue::Constructed { tag_num, values } => {
            Tag::Opening { tag_num: *tag_num }.encode(w)?;
            for child in values {
                encode_application_data_value(w, child)?;
            }
            Tag::Closing { tag_num: *tag_num }.encode(w)
        }
    }
}

pub fn decode_application_data_value<'a>(r: &mut Reader<'a>) -> Result<DataValue<'a>, DecodeError> {
    let tag = Tag::decode(r)?;
    decode_application_data_value_from_tag(r, tag)
}

/// Decodes a value whose tag has already been read, with no property context.
pub fn decode_application_data_value_from_tag<'a>(
    r: &mut Reader<'a>,
    tag: Tag,
) -> Result<DataValue<'a>, DecodeError> {
    decode_value_in_context(r, tag, None)
}

/// Decodes a value, resolving context tags through the property's table rows.
pub fn decode_value_in_context<'a>(
    r: &mut Reader<'a>,
    tag: Tag,
    property: Option<PropertyId>,
) -> Result<DataValue<'a>, DecodeError> {
    match tag {
        Tag::Application { tag, len } => decode_primitive(r, tag, len, false),
        Tag::Context { tag_num, len } => {
            let app_tag = context_tag_type(property, tag_num)?;
            decode_primitive(r, app_tag, len, true)
        }
        #[cfg(feature = "alloc")]
        Tag::Opening { tag_num } => {
            let mut children = Vec::new();
            loop {
                let child_tag = Tag::decode(r)?;
                if child_tag == (Tag::Closing { tag_num }) {
                    break;
                }
                children.push(decode_value_in_context(r, child_tag, property)?);
            }
            Ok(DataValue::Constructed {
                tag_num,
                values: children,
            })
        }
        #[cfg(not(feature = "alloc"))]
        Tag::Opening { .. } => Err(DecodeError::Message("constructed values require alloc")),
        Tag::Closing { .. } => Err(DecodeError::WrongTagType {
            expected: TagClass::Application,
        }),
    }
}

/// Reads every value up to the closing tag `tag_num`, consuming it.
///
/// A single value is returned as-is; zero or several values become a
/// [`DataValue::Constructed`] list carrying `tag_num`.
pub fn decode_values_until_closing<'a>(
    r: &mut Reader<'a>,
    tag_num: u8,
    property: Option<PropertyId>,
) -> Result<DataValue<'a>, DecodeError> {
    let closing = Tag::Closing { tag_num };
    let first = Tag::decode(r)?;
    #[cfg(feature = "alloc")]
    {
        if first == closing {
            return Ok(DataValue::Constructed {
                tag_num,
                values: Vec::new(),
            });
        }
        let value = decode_value_in_context(r, first, property)?;
        if Tag::peek(r)? == closing {
            Tag::decode(r)?;
            return Ok(value);
        }
        let mut values = alloc::vec![value];
        loop {
            let tag = Tag::decode(r)?;
            if tag == closing {
                break;
            }
            values.push(decode_value_in_context(r, tag, property)?);
        }
        Ok(DataValue::Constructed { tag_num, values })
    }
    #[cfg(not(feature = "alloc"))]
    {
        let value = decode_value_in_context(r, first, property)?;
        expect_closing(r, tag_num)?;
        Ok(value)
    }
}

fn read_array<const N: usize>(r: &mut Reader<'_>, len: u32) -> Result<[u8; N], DecodeError> {
    if len as usize != N {
        return Err(DecodeError::InvalidLength);
    }
    let mut out = [0u8; N];
    out.copy_from_slice(r.read_exact(N)?);
    Ok(out)
}

fn decode_primitive<'a>(
    r: &mut Reader<'a>,
    tag: AppTag,
    len: u32,
    context: bool,
) -> Result<DataValue<'a>, DecodeError> {
    Ok(match tag {
        AppTag::Null if !context => match len {
            0 => DataValue::Null,
            _ => return Err(DecodeError::InvalidLength),
        },
        // A context tag with no table row falls back to tag 0; its content
        // octets are kept raw so the reader stays aligned.
        AppTag::Null => match r.read_exact(len as usize)? {
            [] => DataValue::Null,
            raw => DataValue::OctetString(raw),
        },
        // Application booleans keep the value in the length field;
        // context booleans carry one content octet.
        AppTag::Boolean if !context => DataValue::Boolean(len != 0),
        AppTag::Boolean => {
            let [b] = read_array::<1>(r, len)?;
            DataValue::Boolean(b != 0)
        }
        AppTag::UnsignedInt => DataValue::Unsigned(decode_unsigned(r, len as usize)?),
        AppTag::SignedInt => DataValue::Signed(decode_signed(r, len as usize)?),
        AppTag::Real => DataValue::Real(f32::from_be_bytes(read_array(r, len)?)),
        AppTag::Double => DataValue::Double(f64::from_be_bytes(read_array(r, len)?)),
        AppTag::OctetString => DataValue::OctetString(r.read_exact(len as usize)?),
        AppTag::CharacterString => {
            DataValue::CharacterString(decode_character_string(r, len as usize)?)
        }
        AppTag::BitString => {
            if len == 0 {
                return Err(DecodeError::InvalidLength);
            }
            let raw = r.read_exact(len as usize)?;
            if raw[0] > 7 {
                return Err(DecodeError::InvalidValue);
            }
            DataValue::BitString(BitString::new(raw[0], &raw[1..]))
        }
        AppTag::Enumerated => DataValue::Enumerated(decode_unsigned(r, len as usize)?),
        AppTag::Date => DataValue::Date(Date::from_bytes(read_array(r, len)?)),
        AppTag::Time => DataValue::Time(Time::from_bytes(read_array(r, len)?)),
        AppTag::ObjectId => {
            DataValue::ObjectId(ObjectId::from_raw(u32::from_be_bytes(read_array(r, len)?)))
        }
    })
}
