use crate::address::{ip_address, socket_addr};
use crate::interfaces::{directed_broadcast, find_interface, InterfaceInfo};
use crate::{DataLink, DataLinkError};
use bacflow_core::frame::MAX_FRAME_LEN;
use bacflow_core::types::{Address, BROADCAST_NETWORK};
use std::net::{Ipv4Addr, SocketAddr, SocketAddrV4};
use std::sync::Arc;
use tokio::net::UdpSocket;

/// BACnet/IP over a broadcast-enabled UDP socket.
///
/// The socket binds the wildcard address so that subnet broadcasts are
/// received; the interface's own address and netmask decide the local and
/// broadcast [`Address`]es.
#[derive(Debug, Clone)]
pub struct BacnetIpTransport {
    socket: Arc<UdpSocket>,
    local: SocketAddrV4,
    broadcast: SocketAddrV4,
}

impl BacnetIpTransport {
    /// Binds `port` on the interface called `interface`.
    pub async fn bind_interface(interface: &str, port: u16) -> Result<Self, DataLinkError> {
        let info = find_interface(interface)?;
        Self::bind_on(&info, SocketAddrV4::new(Ipv4Addr::UNSPECIFIED, port)).await
    }

    /// Binds `bind_addr` and reports addresses from `info`.
    ///
    /// Port 0 picks an ephemeral port; the local address then carries the
    /// port the OS assigned.
    pub async fn bind_on(
        info: &InterfaceInfo,
        bind_addr: SocketAddrV4,
    ) -> Result<Self, DataLinkError> {
        let socket = UdpSocket::bind(SocketAddr::V4(bind_addr)).await?;
        socket.set_broadcast(true)?;
        let port = socket.local_addr()?.port();
        log::debug!(
            "bound BACnet/IP on {} ({}:{port}, broadcast {})",
            info.name,
            info.address,
            info.broadcast
        );
        Ok(Self {
            socket: Arc::new(socket),
            local: SocketAddrV4::new(info.address, port),
            broadcast: SocketAddrV4::new(directed_broadcast(info.address, info.netmask), port),
        })
    }

    pub fn local_addr(&self) -> SocketAddrV4 {
        self.local
    }

    fn target_for(&self, address: &Address) -> Result<SocketAddrV4, DataLinkError> {
        if address.mac.is_empty() {
            return Ok(self.broadcast);
        }
        socket_addr(address)
    }
}

impl DataLink for BacnetIpTransport {
    async fn send(&self, address: &Address, frame: &[u8]) -> Result<usize, DataLinkError> {
        if frame.len() > MAX_FRAME_LEN {
            return Err(DataLinkError::FrameTooLarge);
        }
        let target = self.target_for(address)?;
        let n = self.socket.send_to(frame, SocketAddr::V4(target)).await?;
        Ok(n)
    }

    async fn recv(&self, buf: &mut [u8]) -> Result<(usize, Address), DataLinkError> {
        loop {
            let (n, src) = self.socket.recv_from(buf).await?;
            match src {
                SocketAddr::V4(v4) => return Ok((n, ip_address(v4))),
                SocketAddr::V6(v6) => log::debug!("ignoring datagram from IPv6 peer {v6}"),
            }
        }
    }

    fn local_address(&self) -> Address {
        ip_address(self.local)
    }

    fn broadcast_address(&self) -> Address {
        let mut address = ip_address(self.broadcast);
        address.net = BROADCAST_NETWORK;
        address
    }
}
