use crate::DataLinkError;
use bacflow_core::types::{Address, MacAddr};
use std::net::{Ipv4Addr, SocketAddrV4};

pub const BACNET_IP_DEFAULT_PORT: u16 = 47808;

/// Packs an IPv4 endpoint into a 6-octet BACnet/IP MAC.
pub fn ip_mac(addr: SocketAddrV4) -> MacAddr {
    MacAddr::ip_port(addr.ip().octets(), addr.port())
}

/// A local-network address for an IPv4 endpoint.
pub fn ip_address(addr: SocketAddrV4) -> Address {
    Address::default().with_mac(ip_mac(addr))
}

/// The IPv4 endpoint behind an address's link MAC.
pub fn socket_addr(address: &Address) -> Result<SocketAddrV4, DataLinkError> {
    match address.mac.as_slice() {
        [a, b, c, d, hi, lo] => Ok(SocketAddrV4::new(
            Ipv4Addr::new(*a, *b, *c, *d),
            u16::from_be_bytes([*hi, *lo]),
        )),
        _ => Err(DataLinkError::AddressNotIp(*address)),
    }
}
