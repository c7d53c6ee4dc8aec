use bacflow_core::types::Address;
use std::future::Future;
use thiserror::Error;

/// Errors that can occur at the data-link layer.
#[derive(Debug, Error)]
pub enum DataLinkError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("frame too large")]
    FrameTooLarge,
    #[error("invalid frame")]
    InvalidFrame,
    #[error("interface '{0}' not found")]
    InterfaceNotFound(String),
    #[error("interface '{0}' has no IPv4 address")]
    NoIpv4Address(String),
    #[error("address {0} is not an IP endpoint")]
    AddressNotIp(Address),
    #[error("data link closed")]
    Closed,
}

/// Sends and receives complete frames.
///
/// `send` writes one frame atomically; concurrent senders may interleave
/// whole frames but never split one. `recv` yields the sender's address
/// as seen by the link (MAC only; routed parts live in the NPDU).
pub trait DataLink: Send + Sync + 'static {
    /// Sends `frame` to `address`, returning the number of bytes written.
    fn send(
        &self,
        address: &Address,
        frame: &[u8],
    ) -> impl Future<Output = Result<usize, DataLinkError>> + Send;

    /// Receives a frame into `buf`, returning `(bytes_read, source_address)`.
    fn recv(
        &self,
        buf: &mut [u8],
    ) -> impl Future<Output = Result<(usize, Address), DataLinkError>> + Send;

    /// This endpoint's own address.
    fn local_address(&self) -> Address;

    /// The address that reaches every station on the local network.
    fn broadcast_address(&self) -> Address;
}
