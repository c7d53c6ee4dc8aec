//! BACnet/IP virtual link control (BVLC) envelope.

use crate::encoding::{reader::Reader, writer::Writer};
use crate::types::Address;
use crate::{DecodeError, EncodeError};

pub const BVLC_TYPE_BIP: u8 = 0x81;
pub const BVLC_HEADER_LEN: usize = 4;
/// Original source IPv4 address and port carried by Forwarded-NPDU.
pub const FORWARDED_ORIGIN_LEN: usize = 6;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BvlcFunction {
    Result,
    WriteBroadcastDistributionTable,
    ReadBroadcastDistributionTable,
    ReadBroadcastDistributionTableAck,
    ForwardedNpdu,
    RegisterForeignDevice,
    ReadForeignDeviceTable,
    ReadForeignDeviceTableAck,
    DeleteForeignDeviceTableEntry,
    DistributeBroadcastToNetwork,
    OriginalUnicastNpdu,
    OriginalBroadcastNpdu,
    Unknown(u8),
}

impl BvlcFunction {
    pub const fn from_u8(value: u8) -> Self {
        match value {
            0x00 => Self::Result,
            0x01 => Self::WriteBroadcastDistributionTable,
            0x02 => Self::ReadBroadcastDistributionTable,
            0x03 => Self::ReadBroadcastDistributionTableAck,
            0x04 => Self::ForwardedNpdu,
            0x05 => Self::RegisterForeignDevice,
            0x06 => Self::ReadForeignDeviceTable,
            0x07 => Self::ReadForeignDeviceTableAck,
            0x08 => Self::DeleteForeignDeviceTableEntry,
            0x09 => Self::DistributeBroadcastToNetwork,
            0x0A => Self::OriginalUnicastNpdu,
            0x0B => Self::OriginalBroadcastNpdu,
            v => Self::Unknown(v),
        }
    }

    pub const fn to_u8(self) -> u8 {
        match self {
            Self::Result => 0x00,
            Self::WriteBroadcastDistributionTable => 0x01,
            Self::ReadBroadcastDistributionTable => 0x02,
            Self::ReadBroadcastDistributionTableAck => 0x03,
            Self::ForwardedNpdu => 0x04,
            Self::RegisterForeignDevice => 0x05,
            Self::ReadForeignDeviceTable => 0x06,
            Self::ReadForeignDeviceTableAck => 0x07,
            Self::DeleteForeignDeviceTableEntry => 0x08,
            Self::DistributeBroadcastToNetwork => 0x09,
            Self::OriginalUnicastNpdu => 0x0A,
            Self::OriginalBroadcastNpdu => 0x0B,
            Self::Unknown(v) => v,
        }
    }

    /// Whether an NPDU follows the header (after the origin, for forwarded frames).
    pub const fn carries_npdu(self) -> bool {
        matches!(
            self,
            Self::ForwardedNpdu
                | Self::DistributeBroadcastToNetwork
                | Self::OriginalUnicastNpdu
                | Self::OriginalBroadcastNpdu
        )
    }

    /// The function used to originate a frame towards `destination`.
    pub const fn for_destination(destination: &Address) -> Self {
        if destination.is_broadcast() {
            Self::OriginalBroadcastNpdu
        } else {
            Self::OriginalUnicastNpdu
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BvlcHeader {
    pub function: BvlcFunction,
    /// Whole frame length, header included.
    pub length: u16,
}

impl BvlcHeader {
    pub fn encode(&self, w: &mut Writer<'_>) -> Result<(), EncodeError> {
        w.write_u8(BVLC_TYPE_BIP)?;
        w.write_u8(self.function.to_u8())?;
        w.write_be_u16(self.length)
    }

    pub fn decode(r: &mut Reader<'_>) -> Result<Self, DecodeError> {
        if r.read_u8()? != BVLC_TYPE_BIP {
            return Err(DecodeError::InvalidValue);
        }
        let function = BvlcFunction::from_u8(r.read_u8()?);
        let length = r.read_be_u16()?;
        if (length as usize) < BVLC_HEADER_LEN {
            return Err(DecodeError::InvalidLength);
        }
        Ok(Self { function, length })
    }
}

/// A link frame split into header and payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LinkFrame<'a> {
    pub header: BvlcHeader,
    /// IPv4 address and port of the original sender of a forwarded frame.
    pub origin: Option<[u8; FORWARDED_ORIGIN_LEN]>,
    /// The NPDU for data frames, the raw body otherwise.
    pub payload: &'a [u8],
}

impl<'a> LinkFrame<'a> {
    /// Bytes past the declared length are ignored.
    pub fn decode(bytes: &'a [u8]) -> Result<Self, DecodeError> {
        if bytes.len() < BVLC_HEADER_LEN {
            return Err(DecodeError::MalformedFrame);
        }
        let mut r = Reader::new(bytes);
        let header = BvlcHeader::decode(&mut r)?;
        let declared = header.length as usize;
        if declared > bytes.len() {
            return Err(DecodeError::MalformedFrame);
        }
        let mut body = Reader::new(&bytes[BVLC_HEADER_LEN..declared]);
        let origin = if header.function == BvlcFunction::ForwardedNpdu {
            let raw = body.read_exact(FORWARDED_ORIGIN_LEN)?;
            let mut origin = [0u8; FORWARDED_ORIGIN_LEN];
            origin.copy_from_slice(raw);
            Some(origin)
        } else {
            None
        };
        let payload = body.read_rest();
        Ok(Self {
            header,
            origin,
            payload,
        })
    }

    pub fn carries_npdu(&self) -> bool {
        self.header.function.carries_npdu()
    }
}
