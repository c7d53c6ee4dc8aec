use crate::apdu::confirmed::read_pdu_flags;
use crate::apdu::ApduType;
use crate::encoding::{reader::Reader, writer::Writer};
use crate::{DecodeError, EncodeError};

/// Header for a BACnet Unconfirmed-Request APDU.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UnconfirmedRequestHeader {
    pub service_choice: u8,
}

/// Unconfirmed service choices this stack speaks.
pub mod service {
    pub const I_AM: u8 = 0x00;
    pub const WHO_IS: u8 = 0x08;
}

impl UnconfirmedRequestHeader {
    pub fn encode(&self, w: &mut Writer<'_>) -> Result<(), EncodeError> {
        w.write_u8((ApduType::UnconfirmedRequest as u8) << 4)?;
        w.write_u8(self.service_choice)
    }

    pub fn decode(r: &mut Reader<'_>) -> Result<Self, DecodeError> {
        read_pdu_flags(r, ApduType::UnconfirmedRequest)?;
        Ok(Self {
            service_choice: r.read_u8()?,
        })
    }
}
