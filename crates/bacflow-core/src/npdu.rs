use crate::encoding::{reader::Reader, writer::Writer};
use crate::types::{Address, MacAddr, BROADCAST_NETWORK};
use crate::{DecodeError, EncodeError};

/// BACnet network layer protocol version (always `0x01`).
pub const NPDU_VERSION: u8 = 0x01;

const CONTROL_NETWORK_MESSAGE: u8 = 0x80;
const CONTROL_DESTINATION: u8 = 0x20;
const CONTROL_SOURCE: u8 = 0x08;
const CONTROL_EXPECTING_REPLY: u8 = 0x04;

/// Hop count placed on frames this stack originates.
pub const DEFAULT_HOP_COUNT: u8 = 255;

#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NetworkPriority {
    #[default]
    Normal = 0,
    Urgent = 1,
    CriticalEquipment = 2,
    LifeSafety = 3,
}

impl NetworkPriority {
    pub const fn from_bits(bits: u8) -> Self {
        match bits & 0x03 {
            0 => Self::Normal,
            1 => Self::Urgent,
            2 => Self::CriticalEquipment,
            _ => Self::LifeSafety,
        }
    }
}

/// Network-layer control message header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NetworkMessage {
    pub message_type: u8,
    /// Only carried for proprietary message types (`>= 0x80`).
    pub vendor_id: Option<u16>,
}

/// BACnet Network Protocol Data Unit (NPDU) header.
///
/// Only the routed part of an [`Address`] travels in the NPDU: a destination
/// is written when its network number is non-zero, a source only when it is
/// a specific remote network. The hop count is written iff a destination is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Npdu {
    pub expecting_reply: bool,
    pub priority: NetworkPriority,
    pub destination: Option<Address>,
    pub source: Option<Address>,
    pub hop_count: Option<u8>,
    pub network_message: Option<NetworkMessage>,
}

impl Npdu {
    pub const fn new() -> Self {
        Self {
            expecting_reply: false,
            priority: NetworkPriority::Normal,
            destination: None,
            source: None,
            hop_count: None,
            network_message: None,
        }
    }

    /// Header for an application frame sent to `destination`.
    pub fn application(destination: &Address, expecting_reply: bool) -> Self {
        Self {
            expecting_reply,
            destination: Some(*destination),
            ..Self::new()
        }
    }

    pub fn with_source(mut self, source: Address) -> Self {
        self.source = Some(source);
        self
    }

    pub fn with_priority(mut self, priority: NetworkPriority) -> Self {
        self.priority = priority;
        self
    }

    pub fn is_network_message(&self) -> bool {
        self.network_message.is_some()
    }

    fn routed_destination(&self) -> Option<&Address> {
        self.destination.as_ref().filter(|d| d.net != 0)
    }

    fn routed_source(&self) -> Option<&Address> {
        self.source
            .as_ref()
            .filter(|s| s.net != 0 && s.net != BROADCAST_NETWORK)
    }

    pub fn control(&self) -> u8 {
        let mut control = self.priority as u8;
        if self.network_message.is_some() {
            control |= CONTROL_NETWORK_MESSAGE;
        }
        if self.routed_destination().is_some() {
            control |= CONTROL_DESTINATION;
        }
        if self.routed_source().is_some() {
            control |= CONTROL_SOURCE;
        }
        if self.expecting_reply {
            control |= CONTROL_EXPECTING_REPLY;
        }
        control
    }

    pub fn encode(&self, w: &mut Writer<'_>) -> Result<(), EncodeError> {
        w.write_u8(NPDU_VERSION)?;
        w.write_u8(self.control())?;

        let destination = self.routed_destination();
        if let Some(dest) = destination {
            encode_addr(w, dest.net, &dest.adr)?;
        }
        if let Some(src) = self.routed_source() {
            encode_addr(w, src.net, &src.adr)?;
        }
        if destination.is_some() {
            w.write_u8(self.hop_count.unwrap_or(DEFAULT_HOP_COUNT))?;
        }
        if let Some(msg) = self.network_message {
            w.write_u8(msg.message_type)?;
            if msg.message_type >= 0x80 {
                w.write_be_u16(msg.vendor_id.unwrap_or(0))?;
            }
        }
        Ok(())
    }

    pub fn decode(r: &mut Reader<'_>) -> Result<Self, DecodeError> {
        let version = r.read_u8()?;
        if version != NPDU_VERSION {
            return Err(DecodeError::InvalidValue);
        }

        let control = r.read_u8()?;
        let destination = if control & CONTROL_DESTINATION != 0 {
            Some(decode_addr(r)?)
        } else {
            None
        };
        let source = if control & CONTROL_SOURCE != 0 {
            Some(decode_addr(r)?)
        } else {
            None
        };
        let hop_count = if destination.is_some() {
            Some(r.read_u8()?)
        } else {
            None
        };

        let network_message = if control & CONTROL_NETWORK_MESSAGE != 0 {
            let message_type = r.read_u8()?;
            let vendor_id = if message_type >= 0x80 {
                Some(r.read_be_u16()?)
            } else {
                None
            };
            Some(NetworkMessage {
                message_type,
                vendor_id,
            })
        } else {
            None
        };

        Ok(Self {
            expecting_reply: control & CONTROL_EXPECTING_REPLY != 0,
            priority: NetworkPriority::from_bits(control),
            destination,
            source,
            hop_count,
            network_message,
        })
    }
}

fn encode_addr(w: &mut Writer<'_>, net: u16, adr: &MacAddr) -> Result<(), EncodeError> {
    w.write_be_u16(net)?;
    w.write_u8(adr.len() as u8)?;
    w.write_all(adr.as_slice())
}

fn decode_addr(r: &mut Reader<'_>) -> Result<Address, DecodeError> {
    let net = r.read_be_u16()?;
    let len = r.read_u8()? as usize;
    let bytes = r.read_exact(len)?;
    let adr = MacAddr::new(bytes).map_err(|_| DecodeError::InvalidLength)?;
    Ok(Address {
        mac: MacAddr::EMPTY,
        net,
        adr,
    })
}

#[cfg(test)]
mod tests {
    use super::{NetworkMessage, NetworkPriority, Npdu};
    use crate::encoding::{reader::Reader, writer::Writer};
    use crate::types::Address;
    use crate::DecodeError;

    fn encode(npdu: &Npdu) -> std::vec::Vec<u8> {
        let mut buf = [0u8; 64];
        let mut w = Writer::new(&mut buf);
        npdu.encode(&mut w).unwrap();
        w.as_written().to_vec()
    }

    #[test]
    fn local_destination_writes_bare_header() {
        let dest = Address::local(&[10, 0, 0, 1, 0xBA, 0xC0]).unwrap();
        let npdu = Npdu::application(&dest, true).with_source(Address::default());
        assert_eq!(encode(&npdu), vec![0x01, 0x04]);
    }

    #[test]
    fn routed_destination_carries_hop_count() {
        let dest =
            Address::remote(&[10, 0, 0, 1, 0xBA, 0xC0], 2428, &[1, 2, 3, 4, 5, 6]).unwrap();
        let bytes = encode(&Npdu::application(&dest, true));
        assert_eq!(
            bytes,
            vec![0x01, 0x24, 0x09, 0x7C, 0x06, 1, 2, 3, 4, 5, 6, 0xFF]
        );

        let decoded = Npdu::decode(&mut Reader::new(&bytes)).unwrap();
        let got = decoded.destination.unwrap();
        assert_eq!(got.net, 2428);
        assert_eq!(got.adr.as_slice(), &[1, 2, 3, 4, 5, 6]);
        assert_eq!(decoded.hop_count, Some(255));
        assert!(decoded.expecting_reply);
    }

    #[test]
    fn global_broadcast_destination() {
        let bytes = encode(&Npdu::application(&Address::global_broadcast(), false));
        assert_eq!(bytes, vec![0x01, 0x20, 0xFF, 0xFF, 0x00, 0xFF]);
    }

    #[test]
    fn routed_source_is_decoded() {
        let bytes = [0x01, 0x08, 0x00, 0x05, 0x01, 0x11];
        let npdu = Npdu::decode(&mut Reader::new(&bytes)).unwrap();
        let src = npdu.source.unwrap();
        assert_eq!(src.net, 5);
        assert_eq!(src.adr.as_slice(), &[0x11]);
        assert!(npdu.destination.is_none());
        assert!(npdu.hop_count.is_none());
    }

    #[test]
    fn priority_bits() {
        let npdu = Npdu::new().with_priority(NetworkPriority::LifeSafety);
        assert_eq!(encode(&npdu), vec![0x01, 0x03]);
    }

    #[test]
    fn network_message_vendor_id_only_for_vendor_types() {
        let mut p = Npdu::new();
        p.network_message = Some(NetworkMessage {
            message_type: 0x80,
            vendor_id: Some(260),
        });
        let bytes = encode(&p);
        assert_eq!(bytes, vec![0x01, 0x80, 0x80, 0x01, 0x04]);
        assert_eq!(Npdu::decode(&mut Reader::new(&bytes)).unwrap(), p);

        p.network_message = Some(NetworkMessage {
            message_type: 0x01,
            vendor_id: None,
        });
        assert_eq!(encode(&p), vec![0x01, 0x80, 0x01]);
    }

    #[test]
    fn truncated_header_is_malformed() {
        let err = Npdu::decode(&mut Reader::new(&[0x01, 0x20, 0xFF])).unwrap_err();
        assert_eq!(err, DecodeError::MalformedFrame);
    }
}
