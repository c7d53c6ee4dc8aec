use crate::encoding::{
    reader::Reader,
    tag::{expect_context, AppTag, Tag},
    writer::Writer,
};
use crate::error::TagClass;
use crate::{DecodeError, EncodeError};

/// Number of octets the minimal-width form of `value` occupies.
pub const fn unsigned_width(value: u32) -> usize {
    if value <= 0xFF {
        1
    } else if value <= 0xFFFF {
        2
    } else if value <= 0xFF_FFFF {
        3
    } else {
        4
    }
}

pub fn encode_unsigned(w: &mut Writer<'_>, value: u32) -> Result<usize, EncodeError> {
    let len = unsigned_width(value);
    w.write_all(&value.to_be_bytes()[4 - len..])?;
    Ok(len)
}

pub fn decode_unsigned(r: &mut Reader<'_>, len: usize) -> Result<u32, DecodeError> {
    if len == 0 || len > 4 {
        return Err(DecodeError::InvalidLength);
    }
    let mut value = 0u32;
    for _ in 0..len {
        value = (value << 8) | r.read_u8()? as u32;
    }
    Ok(value)
}

pub const fn signed_width(value: i32) -> usize {
    if value >= -128 && value <= 127 {
        1
    } else if value >= -32_768 && value <= 32_767 {
        2
    } else if value >= -8_388_608 && value <= 8_388_607 {
        3
    } else {
        4
    }
}

pub fn encode_signed(w: &mut Writer<'_>, value: i32) -> Result<usize, EncodeError> {
    let len = signed_width(value);
    w.write_all(&value.to_be_bytes()[4 - len..])?;
    Ok(len)
}

pub fn decode_signed(r: &mut Reader<'_>, len: usize) -> Result<i32, DecodeError> {
    if len == 0 || len > 4 {
        return Err(DecodeError::InvalidLength);
    }
    let bytes = r.read_exact(len)?;
    let fill = if bytes[0] & 0x80 != 0 { 0xFF } else { 0x00 };
    let mut out = [fill; 4];
    out[4 - len..].copy_from_slice(bytes);
    Ok(i32::from_be_bytes(out))
}

fn encode_tagged_unsigned(w: &mut Writer<'_>, tag: Tag, value: u32) -> Result<(), EncodeError> {
    tag.encode(w)?;
    encode_unsigned(w, value).map(|_| ())
}

pub fn encode_app_unsigned(w: &mut Writer<'_>, value: u32) -> Result<(), EncodeError> {
    let len = unsigned_width(value) as u32;
    encode_tagged_unsigned(
        w,
        Tag::Application {
            tag: AppTag::UnsignedInt,
            len,
        },
        value,
    )
}

pub fn encode_app_enumerated(w: &mut Writer<'_>, value: u32) -> Result<(), EncodeError> {
    let len = unsigned_width(value) as u32;
    encode_tagged_unsigned(
        w,
        Tag::Application {
            tag: AppTag::Enumerated,
            len,
        },
        value,
    )
}

pub fn encode_app_object_id(w: &mut Writer<'_>, object_id_raw: u32) -> Result<(), EncodeError> {
    Tag::Application {
        tag: AppTag::ObjectId,
        len: 4,
    }
    .encode(w)?;
    w.write_be_u32(object_id_raw)
}

pub fn encode_app_signed(w: &mut Writer<'_>, value: i32) -> Result<(), EncodeError> {
    Tag::Application {
        tag: AppTag::SignedInt,
        len: signed_width(value) as u32,
    }
    .encode(w)?;
    encode_signed(w, value).map(|_| ())
}

pub fn encode_app_real(w: &mut Writer<'_>, value: f32) -> Result<(), EncodeError> {
    Tag::Application {
        tag: AppTag::Real,
        len: 4,
    }
    .encode(w)?;
    w.write_be_u32(value.to_bits())
}

/// Reads an application tag that must be `expected` and returns its length.
pub fn expect_application(r: &mut Reader<'_>, expected: AppTag) -> Result<u32, DecodeError> {
    match Tag::decode(r)? {
        Tag::Application { tag, len } if tag == expected => Ok(len),
        Tag::Application { tag, .. } => Err(DecodeError::IncorrectTag {
            expected: expected as u8,
            actual: tag as u8,
        }),
        _ => Err(DecodeError::WrongTagType {
            expected: TagClass::Application,
        }),
    }
}

pub fn decode_app_unsigned(r: &mut Reader<'_>) -> Result<u32, DecodeError> {
    let len = expect_application(r, AppTag::UnsignedInt)?;
    decode_unsigned(r, len as usize)
}

pub fn decode_app_enumerated(r: &mut Reader<'_>) -> Result<u32, DecodeError> {
    let len = expect_application(r, AppTag::Enumerated)?;
    decode_unsigned(r, len as usize)
}

pub fn decode_app_signed(r: &mut Reader<'_>) -> Result<i32, DecodeError> {
    let len = expect_application(r, AppTag::SignedInt)?;
    decode_signed(r, len as usize)
}

pub fn decode_app_object_id(r: &mut Reader<'_>) -> Result<u32, DecodeError> {
    match expect_application(r, AppTag::ObjectId)? {
        4 => r.read_be_u32(),
        _ => Err(DecodeError::InvalidLength),
    }
}

pub fn decode_app_real(r: &mut Reader<'_>) -> Result<f32, DecodeError> {
    match expect_application(r, AppTag::Real)? {
        4 => Ok(f32::from_bits(r.read_be_u32()?)),
        _ => Err(DecodeError::InvalidLength),
    }
}

pub fn encode_ctx_unsigned(w: &mut Writer<'_>, tag_num: u8, value: u32) -> Result<(), EncodeError> {
    let len = unsigned_width(value) as u32;
    encode_tagged_unsigned(w, Tag::Context { tag_num, len }, value)
}

pub fn encode_ctx_enumerated(
    w: &mut Writer<'_>,
    tag_num: u8,
    value: u32,
) -> Result<(), EncodeError> {
    encode_ctx_unsigned(w, tag_num, value)
}

pub fn encode_ctx_object_id(
    w: &mut Writer<'_>,
    tag_num: u8,
    object_id_raw: u32,
) -> Result<(), EncodeError> {
    Tag::Context { tag_num, len: 4 }.encode(w)?;
    w.write_be_u32(object_id_raw)
}

pub fn encode_ctx_signed(w: &mut Writer<'_>, tag_num: u8, value: i32) -> Result<(), EncodeError> {
    Tag::Context {
        tag_num,
        len: signed_width(value) as u32,
    }
    .encode(w)?;
    encode_signed(w, value).map(|_| ())
}

pub fn encode_ctx_character_string(
    w: &mut Writer<'_>,
    tag_num: u8,
    value: &str,
) -> Result<(), EncodeError> {
    let bytes = value.as_bytes();
    Tag::Context {
        tag_num,
        len: (bytes.len() + 1) as u32,
    }
    .encode(w)?;
    w.write_u8(0)?;
    w.write_all(bytes)
}

pub fn decode_ctx_unsigned(r: &mut Reader<'_>, tag_num: u8) -> Result<u32, DecodeError> {
    let len = expect_context(r, tag_num)?;
    decode_unsigned(r, len as usize)
}

pub fn decode_ctx_object_id(r: &mut Reader<'_>, tag_num: u8) -> Result<u32, DecodeError> {
    match expect_context(r, tag_num)? {
        4 => r.read_be_u32(),
        _ => Err(DecodeError::InvalidLength),
    }
}

/// Decodes context tag `tag_num` as an unsigned value only if it is next in the stream.
pub fn decode_optional_ctx_unsigned(
    r: &mut Reader<'_>,
    tag_num: u8,
) -> Result<Option<u32>, DecodeError> {
    if r.is_empty() {
        return Ok(None);
    }
    match Tag::peek(r)? {
        Tag::Context { tag_num: n, .. } if n == tag_num => {
            decode_ctx_unsigned(r, tag_num).map(Some)
        }
        _ => Ok(None),
    }
}

/// Decodes a character string body (charset octet then text). Only UTF-8 is accepted.
pub fn decode_character_string<'a>(
    r: &mut Reader<'a>,
    len: usize,
) -> Result<&'a str, DecodeError> {
    if len == 0 {
        return Err(DecodeError::InvalidLength);
    }
    let raw = r.read_exact(len)?;
    if raw[0] != 0 {
        return Err(DecodeError::Message("unsupported character set"));
    }
    core::str::from_utf8(&raw[1..]).map_err(|_| DecodeError::InvalidValue)
}

pub fn encode_opening_tag(w: &mut Writer<'_>, tag_num: u8) -> Result<(), EncodeError> {
    Tag::Opening { tag_num }.encode(w)
}

pub fn encode_closing_tag(w: &mut Writer<'_>, tag_num: u8) -> Result<(), EncodeError> {
    Tag::Closing { tag_num }.encode(w)
}
