use crate::apdu::{
    AbortPdu, BacnetError, ComplexAckHeader, ConfirmedRequestHeader, RejectPdu, SegmentAck,
    SimpleAck, UnconfirmedRequestHeader,
};
use crate::encoding::{reader::Reader, writer::Writer};
use crate::{DecodeError, EncodeError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ApduType {
    ConfirmedRequest = 0,
    UnconfirmedRequest = 1,
    SimpleAck = 2,
    ComplexAck = 3,
    SegmentAck = 4,
    Error = 5,
    Reject = 6,
    Abort = 7,
}

impl ApduType {
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(Self::ConfirmedRequest),
            1 => Some(Self::UnconfirmedRequest),
            2 => Some(Self::SimpleAck),
            3 => Some(Self::ComplexAck),
            4 => Some(Self::SegmentAck),
            5 => Some(Self::Error),
            6 => Some(Self::Reject),
            7 => Some(Self::Abort),
            _ => None,
        }
    }

    /// True for the kinds that answer a confirmed request.
    pub const fn is_confirmed_reply(self) -> bool {
        matches!(
            self,
            Self::SimpleAck | Self::ComplexAck | Self::Error | Self::Reject | Self::Abort
        )
    }
}

/// An application header of any kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Apdu {
    ConfirmedRequest(ConfirmedRequestHeader),
    UnconfirmedRequest(UnconfirmedRequestHeader),
    SimpleAck(SimpleAck),
    ComplexAck(ComplexAckHeader),
    SegmentAck(SegmentAck),
    Error(BacnetError),
    Reject(RejectPdu),
    Abort(AbortPdu),
}

impl Apdu {
    pub fn kind(&self) -> ApduType {
        match self {
            Self::ConfirmedRequest(_) => ApduType::ConfirmedRequest,
            Self::UnconfirmedRequest(_) => ApduType::UnconfirmedRequest,
            Self::SimpleAck(_) => ApduType::SimpleAck,
            Self::ComplexAck(_) => ApduType::ComplexAck,
            Self::SegmentAck(_) => ApduType::SegmentAck,
            Self::Error(_) => ApduType::Error,
            Self::Reject(_) => ApduType::Reject,
            Self::Abort(_) => ApduType::Abort,
        }
    }

    /// Invoke ID of the confirmed kinds; `None` for unconfirmed requests.
    pub fn invoke_id(&self) -> Option<u8> {
        match self {
            Self::ConfirmedRequest(h) => Some(h.invoke_id),
            Self::UnconfirmedRequest(_) => None,
            Self::SimpleAck(h) => Some(h.invoke_id),
            Self::ComplexAck(h) => Some(h.invoke_id),
            Self::SegmentAck(h) => Some(h.invoke_id),
            Self::Error(h) => Some(h.invoke_id),
            Self::Reject(h) => Some(h.invoke_id),
            Self::Abort(h) => Some(h.invoke_id),
        }
    }

    pub fn service_choice(&self) -> Option<u8> {
        match self {
            Self::ConfirmedRequest(h) => Some(h.service_choice),
            Self::UnconfirmedRequest(h) => Some(h.service_choice),
            Self::SimpleAck(h) => Some(h.service_choice),
            Self::ComplexAck(h) => Some(h.service_choice),
            Self::Error(h) => Some(h.service_choice),
            Self::SegmentAck(_) | Self::Reject(_) | Self::Abort(_) => None,
        }
    }

    pub fn encode(&self, w: &mut Writer<'_>) -> Result<(), EncodeError> {
        match self {
            Self::ConfirmedRequest(h) => h.encode(w),
            Self::UnconfirmedRequest(h) => h.encode(w),
            Self::SimpleAck(h) => h.encode(w),
            Self::ComplexAck(h) => h.encode(w),
            Self::SegmentAck(h) => h.encode(w),
            Self::Error(h) => h.encode(w),
            Self::Reject(h) => h.encode(w),
            Self::Abort(h) => h.encode(w),
        }
    }

    /// Decodes the header; the reader is left at the start of the service data.
    ///
    /// Error PDUs consume their (class, code) body as part of the header.
    pub fn decode(r: &mut Reader<'_>) -> Result<Self, DecodeError> {
        let kind = ApduType::from_u8(r.peek_u8()? >> 4).ok_or(DecodeError::InvalidValue)?;
        Ok(match kind {
            ApduType::ConfirmedRequest => {
                Self::ConfirmedRequest(ConfirmedRequestHeader::decode(r)?)
            }
            ApduType::UnconfirmedRequest => {
                Self::UnconfirmedRequest(UnconfirmedRequestHeader::decode(r)?)
            }
            ApduType::SimpleAck => Self::SimpleAck(SimpleAck::decode(r)?),
            ApduType::ComplexAck => Self::ComplexAck(ComplexAckHeader::decode(r)?),
            ApduType::SegmentAck => Self::SegmentAck(SegmentAck::decode(r)?),
            ApduType::Error => Self::Error(BacnetError::decode(r)?),
            ApduType::Reject => Self::Reject(RejectPdu::decode(r)?),
            ApduType::Abort => Self::Abort(AbortPdu::decode(r)?),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::{Apdu, ApduType};
    use crate::apdu::UnconfirmedRequestHeader;
    use crate::encoding::reader::Reader;
    use crate::DecodeError;

    #[test]
    fn decodes_each_reply_kind() {
        let cases: [(&[u8], ApduType, Option<u8>); 5] = [
            (&[0x20, 5, 15], ApduType::SimpleAck, Some(5)),
            (&[0x30, 6, 12], ApduType::ComplexAck, Some(6)),
            (&[0x50, 7, 12, 0x91, 1, 0x91, 31], ApduType::Error, Some(7)),
            (&[0x60, 8, 3], ApduType::Reject, Some(8)),
            (&[0x70, 9, 4], ApduType::Abort, Some(9)),
        ];
        for (bytes, kind, invoke_id) in cases {
            let apdu = Apdu::decode(&mut Reader::new(bytes)).unwrap();
            assert_eq!(apdu.kind(), kind);
            assert!(apdu.kind().is_confirmed_reply());
            assert_eq!(apdu.invoke_id(), invoke_id);
        }
    }

    #[test]
    fn unconfirmed_has_no_invoke_id() {
        let mut r = Reader::new(&[0x10, 0x08]);
        let apdu = Apdu::decode(&mut r).unwrap();
        assert_eq!(
            apdu,
            Apdu::UnconfirmedRequest(UnconfirmedRequestHeader { service_choice: 8 })
        );
        assert_eq!(apdu.invoke_id(), None);
        assert!(r.is_empty());
    }

    #[test]
    fn unknown_kind_and_truncation() {
        assert_eq!(
            Apdu::decode(&mut Reader::new(&[0x80, 0])).unwrap_err(),
            DecodeError::InvalidValue
        );
        assert_eq!(
            Apdu::decode(&mut Reader::new(&[0x30, 1])).unwrap_err(),
            DecodeError::MalformedFrame
        );
    }
}
