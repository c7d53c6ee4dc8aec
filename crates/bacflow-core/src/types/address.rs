use core::fmt;

use crate::EncodeError;

/// Longest MAC or routed address a frame may carry (BACnet/IPv6 uses 18 octets).
pub const MAX_MAC_LEN: usize = 18;

/// Network number addressing every network.
pub const BROADCAST_NETWORK: u16 = 0xFFFF;

/// A variable-length link-layer address stored inline.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(into = "alloc::vec::Vec<u8>", try_from = "alloc::vec::Vec<u8>")
)]
pub struct MacAddr {
    bytes: [u8; MAX_MAC_LEN],
    len: u8,
}

impl MacAddr {
    pub const EMPTY: Self = Self {
        bytes: [0; MAX_MAC_LEN],
        len: 0,
    };

    pub fn new(bytes: &[u8]) -> Result<Self, EncodeError> {
        if bytes.len() > MAX_MAC_LEN {
            return Err(EncodeError::InvalidLength);
        }
        let mut out = Self::EMPTY;
        out.bytes[..bytes.len()].copy_from_slice(bytes);
        out.len = bytes.len() as u8;
        Ok(out)
    }

    /// A BACnet/IP MAC: IPv4 octets then the big-endian port.
    pub const fn ip_port(ip: [u8; 4], port: u16) -> Self {
        let port = port.to_be_bytes();
        let mut out = Self::EMPTY;
        out.bytes[0] = ip[0];
        out.bytes[1] = ip[1];
        out.bytes[2] = ip[2];
        out.bytes[3] = ip[3];
        out.bytes[4] = port[0];
        out.bytes[5] = port[1];
        out.len = 6;
        out
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.bytes[..self.len as usize]
    }

    pub const fn len(&self) -> usize {
        self.len as usize
    }

    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }
}

impl fmt::Debug for MacAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "MacAddr({self})")
    }
}

impl fmt::Display for MacAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, b) in self.as_slice().iter().enumerate() {
            if i > 0 {
                f.write_str(":")?;
            }
            write!(f, "{b:02x}")?;
        }
        Ok(())
    }
}

#[cfg(feature = "alloc")]
impl From<MacAddr> for alloc::vec::Vec<u8> {
    fn from(value: MacAddr) -> Self {
        value.as_slice().to_vec()
    }
}

#[cfg(feature = "alloc")]
impl TryFrom<alloc::vec::Vec<u8>> for MacAddr {
    type Error = EncodeError;

    fn try_from(value: alloc::vec::Vec<u8>) -> Result<Self, Self::Error> {
        Self::new(&value)
    }
}

/// A protocol-layer address: the link MAC of the next hop plus an optional
/// routed network number and address behind it.
///
/// `net == 0` means the local network. For BACnet/IP the MAC is the four
/// IPv4 octets followed by the big-endian UDP port.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Address {
    pub mac: MacAddr,
    pub net: u16,
    pub adr: MacAddr,
}

impl Address {
    /// A station on the local network.
    pub fn local(mac: &[u8]) -> Result<Self, EncodeError> {
        Ok(Self {
            mac: MacAddr::new(mac)?,
            net: 0,
            adr: MacAddr::EMPTY,
        })
    }

    /// A station behind a router reached through `mac`.
    pub fn remote(mac: &[u8], net: u16, adr: &[u8]) -> Result<Self, EncodeError> {
        Ok(Self {
            mac: MacAddr::new(mac)?,
            net,
            adr: MacAddr::new(adr)?,
        })
    }

    /// Every station on every network.
    pub const fn global_broadcast() -> Self {
        Self {
            mac: MacAddr::EMPTY,
            net: BROADCAST_NETWORK,
            adr: MacAddr::EMPTY,
        }
    }

    /// A serial-bus station identified by its one-octet station number.
    pub fn from_station(station: u8) -> Self {
        let mut mac = MacAddr::EMPTY;
        mac.bytes[0] = station;
        mac.len = 1;
        Self {
            mac,
            net: 0,
            adr: MacAddr::EMPTY,
        }
    }

    /// Replaces the link MAC, keeping any routed part.
    pub fn with_mac(mut self, mac: MacAddr) -> Self {
        self.mac = mac;
        self
    }

    pub const fn is_broadcast(&self) -> bool {
        self.net == BROADCAST_NETWORK || self.mac.is_empty()
    }

    /// A broadcast on one specific remote network.
    pub const fn is_sub_broadcast(&self) -> bool {
        self.net != 0 && self.net != BROADCAST_NETWORK && self.adr.is_empty()
    }

    /// A directly reachable BACnet/IP endpoint.
    pub const fn is_unicast(&self) -> bool {
        self.mac.len() == 6 && self.adr.is_empty()
    }

    /// True when the routed part belongs in an NPDU header.
    pub const fn is_routed(&self) -> bool {
        self.net != 0
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.mac)?;
        if self.net != 0 {
            write!(f, " net {} adr {}", self.net, self.adr)?;
        }
        Ok(())
    }
}
