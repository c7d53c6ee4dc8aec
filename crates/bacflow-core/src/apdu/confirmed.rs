use crate::apdu::ApduType;
use crate::encoding::{
    primitives::{decode_unsigned, encode_app_enumerated},
    reader::Reader,
    tag::{expect_closing, AppTag, Tag},
    writer::Writer,
};
use crate::types::MaxApdu;
use crate::{DecodeError, EncodeError};

const SEGMENTED: u8 = 0b0000_1000;
const MORE_FOLLOWS: u8 = 0b0000_0100;
const SEGMENTED_RESPONSE_ACCEPTED: u8 = 0b0000_0010;

/// Reads the first APDU octet and checks its type nibble.
pub(crate) fn read_pdu_flags(r: &mut Reader<'_>, expected: ApduType) -> Result<u8, DecodeError> {
    let b0 = r.read_u8()?;
    if (b0 >> 4) != expected as u8 {
        return Err(DecodeError::InvalidValue);
    }
    Ok(b0 & 0x0F)
}

fn read_segment_fields(
    r: &mut Reader<'_>,
    segmented: bool,
) -> Result<(Option<u8>, Option<u8>), DecodeError> {
    if segmented {
        Ok((Some(r.read_u8()?), Some(r.read_u8()?)))
    } else {
        Ok((None, None))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConfirmedRequestHeader {
    pub segmented: bool,
    pub more_follows: bool,
    pub segmented_response_accepted: bool,
    pub max_segments: u8,
    pub max_apdu: u8,
    pub invoke_id: u8,
    pub sequence_number: Option<u8>,
    pub proposed_window_size: Option<u8>,
    pub service_choice: u8,
}

impl ConfirmedRequestHeader {
    /// An unsegmented request that does not accept segmented replies.
    pub const fn new(invoke_id: u8, service_choice: u8) -> Self {
        Self {
            segmented: false,
            more_follows: false,
            segmented_response_accepted: false,
            max_segments: 0,
            max_apdu: MaxApdu::UpTo1476 as u8,
            invoke_id,
            sequence_number: None,
            proposed_window_size: None,
            service_choice,
        }
    }

    pub fn encode(&self, w: &mut Writer<'_>) -> Result<(), EncodeError> {
        let mut b0 = (ApduType::ConfirmedRequest as u8) << 4;
        if self.segmented {
            b0 |= SEGMENTED;
        }
        if self.more_follows {
            b0 |= MORE_FOLLOWS;
        }
        if self.segmented_response_accepted {
            b0 |= SEGMENTED_RESPONSE_ACCEPTED;
        }

        w.write_u8(b0)?;
        w.write_u8((self.max_segments << 4) | (self.max_apdu & 0x0f))?;
        w.write_u8(self.invoke_id)?;
        if self.segmented {
            w.write_u8(self.sequence_number.unwrap_or(0))?;
            w.write_u8(self.proposed_window_size.unwrap_or(1))?;
        }
        w.write_u8(self.service_choice)
    }

    pub fn decode(r: &mut Reader<'_>) -> Result<Self, DecodeError> {
        let flags = read_pdu_flags(r, ApduType::ConfirmedRequest)?;
        let segmented = flags & SEGMENTED != 0;
        let seg_apdu = r.read_u8()?;
        let invoke_id = r.read_u8()?;
        let (sequence_number, proposed_window_size) = read_segment_fields(r, segmented)?;
        Ok(Self {
            segmented,
            more_follows: flags & MORE_FOLLOWS != 0,
            segmented_response_accepted: flags & SEGMENTED_RESPONSE_ACCEPTED != 0,
            max_segments: seg_apdu >> 4,
            max_apdu: seg_apdu & 0x0f,
            invoke_id,
            sequence_number,
            proposed_window_size,
            service_choice: r.read_u8()?,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ComplexAckHeader {
    pub segmented: bool,
    pub more_follows: bool,
    pub invoke_id: u8,
    pub sequence_number: Option<u8>,
    pub proposed_window_size: Option<u8>,
    pub service_choice: u8,
}

impl ComplexAckHeader {
    pub const fn new(invoke_id: u8, service_choice: u8) -> Self {
        Self {
            segmented: false,
            more_follows: false,
            invoke_id,
            sequence_number: None,
            proposed_window_size: None,
            service_choice,
        }
    }

    pub fn encode(&self, w: &mut Writer<'_>) -> Result<(), EncodeError> {
        let mut b0 = (ApduType::ComplexAck as u8) << 4;
        if self.segmented {
            b0 |= SEGMENTED;
        }
        if self.more_follows {
            b0 |= MORE_FOLLOWS;
        }
        w.write_u8(b0)?;
        w.write_u8(self.invoke_id)?;
        if self.segmented {
            w.write_u8(self.sequence_number.unwrap_or(0))?;
            w.write_u8(self.proposed_window_size.unwrap_or(1))?;
        }
        w.write_u8(self.service_choice)
    }

    pub fn decode(r: &mut Reader<'_>) -> Result<Self, DecodeError> {
        let flags = read_pdu_flags(r, ApduType::ComplexAck)?;
        let segmented = flags & SEGMENTED != 0;
        let invoke_id = r.read_u8()?;
        let (sequence_number, proposed_window_size) = read_segment_fields(r, segmented)?;
        Ok(Self {
            segmented,
            more_follows: flags & MORE_FOLLOWS != 0,
            invoke_id,
            sequence_number,
            proposed_window_size,
            service_choice: r.read_u8()?,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SimpleAck {
    pub invoke_id: u8,
    pub service_choice: u8,
}

impl SimpleAck {
    pub fn encode(&self, w: &mut Writer<'_>) -> Result<(), EncodeError> {
        w.write_u8((ApduType::SimpleAck as u8) << 4)?;
        w.write_u8(self.invoke_id)?;
        w.write_u8(self.service_choice)
    }

    pub fn decode(r: &mut Reader<'_>) -> Result<Self, DecodeError> {
        read_pdu_flags(r, ApduType::SimpleAck)?;
        Ok(Self {
            invoke_id: r.read_u8()?,
            service_choice: r.read_u8()?,
        })
    }
}

/// An Error PDU. Class and code are absent only when the body is empty.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BacnetError {
    pub invoke_id: u8,
    pub service_choice: u8,
    pub error_class: Option<u32>,
    pub error_code: Option<u32>,
}

impl BacnetError {
    pub fn encode(&self, w: &mut Writer<'_>) -> Result<(), EncodeError> {
        w.write_u8((ApduType::Error as u8) << 4)?;
        w.write_u8(self.invoke_id)?;
        w.write_u8(self.service_choice)?;
        if let (Some(class), Some(code)) = (self.error_class, self.error_code) {
            encode_app_enumerated(w, class)?;
            encode_app_enumerated(w, code)?;
        }
        Ok(())
    }

    pub fn decode(r: &mut Reader<'_>) -> Result<Self, DecodeError> {
        read_pdu_flags(r, ApduType::Error)?;
        let invoke_id = r.read_u8()?;
        let service_choice = r.read_u8()?;
        let (error_class, error_code) = if r.is_empty() {
            (None, None)
        } else {
            let (class, code) = decode_error_pair(r)?;
            (Some(class), Some(code))
        };
        Ok(Self {
            invoke_id,
            service_choice,
            error_class,
            error_code,
        })
    }
}

/// Decodes an error (class, code) pair, bare or wrapped in opening/closing tag 0.
pub fn decode_error_pair(r: &mut Reader<'_>) -> Result<(u32, u32), DecodeError> {
    if Tag::peek(r)? == (Tag::Opening { tag_num: 0 }) {
        Tag::decode(r)?;
        let pair = decode_error_values(r)?;
        expect_closing(r, 0)?;
        Ok(pair)
    } else {
        decode_error_values(r)
    }
}

/// Decodes the two values of an error body, either enumerated or context 0/1.
pub fn decode_error_values(r: &mut Reader<'_>) -> Result<(u32, u32), DecodeError> {
    let class_tag = Tag::decode(r)?;
    let class = decode_error_value(r, class_tag, 0)?;
    let code_tag = Tag::decode(r)?;
    let code = decode_error_value(r, code_tag, 1)?;
    Ok((class, code))
}

fn decode_error_value(r: &mut Reader<'_>, tag: Tag, position: u8) -> Result<u32, DecodeError> {
    match tag {
        Tag::Context { tag_num, len } if tag_num == position => decode_unsigned(r, len as usize),
        Tag::Context { tag_num, .. } => Err(DecodeError::IncorrectTag {
            expected: position,
            actual: tag_num,
        }),
        Tag::Application {
            tag: AppTag::Enumerated,
            len,
        } => decode_unsigned(r, len as usize),
        Tag::Application { tag, .. } => Err(DecodeError::IncorrectTag {
            expected: AppTag::Enumerated as u8,
            actual: tag as u8,
        }),
        Tag::Opening { tag_num } | Tag::Closing { tag_num } => {
            Err(DecodeError::UnsupportedTag(tag_num))
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RejectPdu {
    pub invoke_id: u8,
    pub reason: u8,
}

impl RejectPdu {
    pub fn encode(&self, w: &mut Writer<'_>) -> Result<(), EncodeError> {
        w.write_u8((ApduType::Reject as u8) << 4)?;
        w.write_u8(self.invoke_id)?;
        w.write_u8(self.reason)
    }

    pub fn decode(r: &mut Reader<'_>) -> Result<Self, DecodeError> {
        read_pdu_flags(r, ApduType::Reject)?;
        Ok(Self {
            invoke_id: r.read_u8()?,
            reason: r.read_u8()?,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AbortPdu {
    pub server: bool,
    pub invoke_id: u8,
    pub reason: u8,
}

impl AbortPdu {
    pub fn encode(&self, w: &mut Writer<'_>) -> Result<(), EncodeError> {
        w.write_u8(((ApduType::Abort as u8) << 4) | u8::from(self.server))?;
        w.write_u8(self.invoke_id)?;
        w.write_u8(self.reason)
    }

    pub fn decode(r: &mut Reader<'_>) -> Result<Self, DecodeError> {
        let flags = read_pdu_flags(r, ApduType::Abort)?;
        Ok(Self {
            server: flags & 0x01 != 0,
            invoke_id: r.read_u8()?,
            reason: r.read_u8()?,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SegmentAck {
    pub negative_ack: bool,
    pub sent_by_server: bool,
    pub invoke_id: u8,
    pub sequence_number: u8,
    pub actual_window_size: u8,
}

impl SegmentAck {
    pub fn encode(&self, w: &mut Writer<'_>) -> Result<(), EncodeError> {
        let mut b0 = (ApduType::SegmentAck as u8) << 4;
        if self.negative_ack {
            b0 |= 0b0000_0010;
        }
        if self.sent_by_server {
            b0 |= 0b0000_0001;
        }
        w.write_all(&[
            b0,
            self.invoke_id,
            self.sequence_number,
            self.actual_window_size,
        ])
    }

    pub fn decode(r: &mut Reader<'_>) -> Result<Self, DecodeError> {
        let flags = read_pdu_flags(r, ApduType::SegmentAck)?;
        Ok(Self {
            negative_ack: flags & 0b0000_0010 != 0,
            sent_by_server: flags & 0b0000_0001 != 0,
            invoke_id: r.read_u8()?,
            sequence_number: r.read_u8()?,
            actual_window_size: r.read_u8()?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::{AbortPdu, BacnetError, ConfirmedRequestHeader};
    use crate::encoding::{reader::Reader, writer::Writer};
    use crate::DecodeError;

    #[test]
    fn confirmed_header_bytes() {
        let mut buf = [0u8; 8];
        let mut w = Writer::new(&mut buf);
        ConfirmedRequestHeader::new(7, 0x0C).encode(&mut w).unwrap();
        assert_eq!(w.as_written(), &[0x00, 0x05, 7, 0x0C]);
    }

    #[test]
    fn segmented_header_carries_sequence_and_window() {
        let mut h = ConfirmedRequestHeader::new(3, 0x0E);
        h.segmented = true;
        h.more_follows = true;
        h.segmented_response_accepted = true;
        h.sequence_number = Some(2);
        h.proposed_window_size = Some(4);
        let mut buf = [0u8; 8];
        let mut w = Writer::new(&mut buf);
        h.encode(&mut w).unwrap();
        assert_eq!(w.as_written(), &[0x0E, 0x05, 3, 2, 4, 0x0E]);
        let back = ConfirmedRequestHeader::decode(&mut Reader::new(w.as_written())).unwrap();
        assert_eq!(back, h);
    }

    #[test]
    fn bacnet_error_without_details() {
        let e = BacnetError::decode(&mut Reader::new(&[0x50, 1, 15])).unwrap();
        assert_eq!(e.invoke_id, 1);
        assert_eq!(e.error_class, None);
        assert_eq!(e.error_code, None);
    }

    #[test]
    fn bacnet_error_context_and_application_forms() {
        for bytes in [
            &[0x50, 1, 15, 0x09, 0x02, 0x19, 0x20][..],
            &[0x50, 1, 15, 0x91, 0x02, 0x91, 0x20][..],
            &[0x50, 1, 15, 0x0E, 0x91, 0x02, 0x91, 0x20, 0x0F][..],
        ] {
            let e = BacnetError::decode(&mut Reader::new(bytes)).unwrap();
            assert_eq!(e.service_choice, 15);
            assert_eq!(e.error_class, Some(2));
            assert_eq!(e.error_code, Some(32));
        }
    }

    #[test]
    fn bacnet_error_encode_decode() {
        let e = BacnetError {
            invoke_id: 9,
            service_choice: 12,
            error_class: Some(1),
            error_code: Some(31),
        };
        let mut buf = [0u8; 16];
        let mut w = Writer::new(&mut buf);
        e.encode(&mut w).unwrap();
        assert_eq!(BacnetError::decode(&mut Reader::new(w.as_written())).unwrap(), e);
    }

    #[test]
    fn bacnet_error_with_misplaced_tag() {
        let err = BacnetError::decode(&mut Reader::new(&[0x50, 1, 15, 0x19, 0x02])).unwrap_err();
        assert_eq!(
            err,
            DecodeError::IncorrectTag {
                expected: 0,
                actual: 1
            }
        );
    }

    #[test]
    fn abort_server_bit() {
        let a = AbortPdu::decode(&mut Reader::new(&[0x71, 4, 9])).unwrap();
        assert!(a.server);
        assert_eq!(a.invoke_id, 4);
        assert_eq!(a.reason, 9);
    }
}
