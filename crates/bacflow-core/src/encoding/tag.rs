use crate::encoding::{reader::Reader, writer::Writer};
use crate::error::TagClass;
use crate::{DecodeError, EncodeError};

const CONTEXT_BIT: u8 = 0b0000_1000;
const EXTENDED_TAG: u8 = 0x0F;
const EXTENDED_LEN: u8 = 5;
const OPENING_LEN: u8 = 6;
const CLOSING_LEN: u8 = 7;

/// Application tag numbers 0..=12; 13..=15 are reserved.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AppTag {
    Null = 0,
    Boolean = 1,
    UnsignedInt = 2,
    SignedInt = 3,
    Real = 4,
    Double = 5,
    OctetString = 6,
    CharacterString = 7,
    BitString = 8,
    Enumerated = 9,
    Date = 10,
    Time = 11,
    ObjectId = 12,
}

impl AppTag {
    pub fn from_u8(value: u8) -> Result<Self, DecodeError> {
        match value {
            0 => Ok(Self::Null),
            1 => Ok(Self::Boolean),
            2 => Ok(Self::UnsignedInt),
            3 => Ok(Self::SignedInt),
            4 => Ok(Self::Real),
            5 => Ok(Self::Double),
            6 => Ok(Self::OctetString),
            7 => Ok(Self::CharacterString),
            8 => Ok(Self::BitString),
            9 => Ok(Self::Enumerated),
            10 => Ok(Self::Date),
            11 => Ok(Self::Time),
            12 => Ok(Self::ObjectId),
            other => Err(DecodeError::UnsupportedTag(other)),
        }
    }
}

/// A decoded tag header.
///
/// For `Application { tag: Boolean, .. }` the `len` field carries the value
/// itself, there is no content octet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tag {
    Application { tag: AppTag, len: u32 },
    Context { tag_num: u8, len: u32 },
    Opening { tag_num: u8 },
    Closing { tag_num: u8 },
}

impl Tag {
    pub fn class(self) -> TagClass {
        match self {
            Tag::Application { .. } => TagClass::Application,
            Tag::Context { .. } => TagClass::Context,
            Tag::Opening { .. } => TagClass::Opening,
            Tag::Closing { .. } => TagClass::Closing,
        }
    }

    pub fn encode(self, w: &mut Writer<'_>) -> Result<(), EncodeError> {
        match self {
            Tag::Application { tag, len } => encode_with_meta(w, tag as u8, false, len),
            Tag::Context { tag_num, len } => encode_with_meta(w, tag_num, true, len),
            Tag::Opening { tag_num } => encode_open_close(w, tag_num, OPENING_LEN),
            Tag::Closing { tag_num } => encode_open_close(w, tag_num, CLOSING_LEN),
        }
    }

    pub fn decode(r: &mut Reader<'_>) -> Result<Self, DecodeError> {
        let first = r.read_u8()?;
        let class_context = (first & CONTEXT_BIT) != 0;

        let mut tag_num = (first >> 4) & 0x0f;
        if tag_num == EXTENDED_TAG {
            tag_num = r.read_u8()?;
        }

        let len_val = first & 0x07;
        if class_context && len_val == OPENING_LEN {
            return Ok(Tag::Opening { tag_num });
        }
        if class_context && len_val == CLOSING_LEN {
            return Ok(Tag::Closing { tag_num });
        }

        let len = decode_len(r, len_val)?;
        if class_context {
            Ok(Tag::Context { tag_num, len })
        } else {
            Ok(Tag::Application {
                tag: AppTag::from_u8(tag_num)?,
                len,
            })
        }
    }

    /// Peeks at the next tag without consuming it.
    pub fn peek(r: &Reader<'_>) -> Result<Self, DecodeError> {
        let mut probe = *r;
        Tag::decode(&mut probe)
    }
}

/// Reads a context tag that must carry `expected` and returns its length.
pub fn expect_context(r: &mut Reader<'_>, expected: u8) -> Result<u32, DecodeError> {
    match Tag::decode(r)? {
        Tag::Context { tag_num, len } if tag_num == expected => Ok(len),
        Tag::Context { tag_num, .. } => Err(DecodeError::IncorrectTag {
            expected,
            actual: tag_num,
        }),
        _ => Err(DecodeError::WrongTagType {
            expected: TagClass::Context,
        }),
    }
}

pub fn expect_opening(r: &mut Reader<'_>, expected: u8) -> Result<(), DecodeError> {
    match Tag::decode(r)? {
        Tag::Opening { tag_num } if tag_num == expected => Ok(()),
        Tag::Opening { tag_num } => Err(DecodeError::IncorrectTag {
            expected,
            actual: tag_num,
        }),
        _ => Err(DecodeError::WrongTagType {
            expected: TagClass::Opening,
        }),
    }
}

pub fn expect_closing(r: &mut Reader<'_>, expected: u8) -> Result<(), DecodeError> {
    match Tag::decode(r)? {
        Tag::Closing { tag_num } if tag_num == expected => Ok(()),
        Tag::Closing { tag_num } => Err(DecodeError::IncorrectTag {
            expected,
            actual: tag_num,
        }),
        _ => Err(DecodeError::WrongTagType {
            expected: TagClass::Closing,
        }),
    }
}

fn encode_with_meta(
    w: &mut Writer<'_>,
    tag_num: u8,
    is_context: bool,
    len: u32,
) -> Result<(), EncodeError> {
    let mut first: u8 = if tag_num <= 14 {
        tag_num << 4
    } else {
        EXTENDED_TAG << 4
    };
    if is_context {
        first |= CONTEXT_BIT;
    }

    let len_code = if len <= 4 { len as u8 } else { EXTENDED_LEN };
    first |= len_code;
    w.write_u8(first)?;

    if tag_num > 14 {
        w.write_u8(tag_num)?;
    }

    if len_code == EXTENDED_LEN {
        if len <= 253 {
            w.write_u8(len as u8)?;
        } else if len <= u16::MAX as u32 {
            w.write_u8(254)?;
            w.write_be_u16(len as u16)?;
        } else {
            w.write_u8(255)?;
            w.write_be_u32(len)?;
        }
    }
    Ok(())
}

fn encode_open_close(w: &mut Writer<'_>, tag_num: u8, marker: u8) -> Result<(), EncodeError> {
    let mut first = CONTEXT_BIT | marker;
    first |= if tag_num <= 14 {
        tag_num << 4
    } else {
        EXTENDED_TAG << 4
    };
    w.write_u8(first)?;
    if tag_num > 14 {
        w.write_u8(tag_num)?;
    }
    Ok(())
}

fn decode_len(r: &mut Reader<'_>, len_code: u8) -> Result<u32, DecodeError> {
    match len_code {
        0..=4 => Ok(len_code as u32),
        EXTENDED_LEN => match r.read_u8()? {
            v @ 0..=253 => Ok(v as u32),
            254 => Ok(r.read_be_u16()? as u32),
            _ => r.read_be_u32(),
        },
        _ => Err(DecodeError::InvalidLength),
    }
}
