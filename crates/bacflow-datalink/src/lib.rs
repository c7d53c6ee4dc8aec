//! Data-link transports for bacflow.
//!
//! A [`DataLink`] moves whole BACnet/IP datagrams (BVLC header included)
//! between protocol [`Address`](bacflow_core::types::Address)es.
//! [`BacnetIpTransport`] is the UDP implementation; [`list_interfaces`]
//! enumerates the IPv4 interfaces it can bind to.

pub mod address;
pub mod bip;
pub mod interfaces;
pub mod traits;

pub use address::{ip_address, socket_addr, BACNET_IP_DEFAULT_PORT};
pub use bip::transport::BacnetIpTransport;
pub use interfaces::{find_interface, list_interfaces, InterfaceInfo};
pub use traits::{DataLink, DataLinkError};
