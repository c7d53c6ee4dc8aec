//! In-memory data link for tests.

use bacflow_core::bvlc::BvlcFunction;
use bacflow_core::encoding::writer::Writer;
use bacflow_core::frame::{decode_frame, encode_frame_with};
use bacflow_core::npdu::Npdu;
use bacflow_core::types::Address;
use bacflow_core::EncodeError;
use bacflow_datalink::{DataLink, DataLinkError};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::{mpsc, Mutex};

pub(crate) const CLIENT_MAC: [u8; 6] = [10, 0, 0, 1, 0xBA, 0xC0];

/// The client's side: frames it sends go to the peer, frames the peer
/// injects come back from `recv`.
pub(crate) struct MockDataLink {
    sent: mpsc::UnboundedSender<(Address, Vec<u8>)>,
    inbound: Mutex<mpsc::UnboundedReceiver<(Vec<u8>, Address)>>,
    failing_sends: Arc<AtomicUsize>,
}

/// The network's side of a [`MockDataLink`].
pub(crate) struct MockPeer {
    pub sent: mpsc::UnboundedReceiver<(Address, Vec<u8>)>,
    inbound: mpsc::UnboundedSender<(Vec<u8>, Address)>,
    failing_sends: Arc<AtomicUsize>,
}

pub(crate) fn pair() -> (MockDataLink, MockPeer) {
    let (sent_tx, sent_rx) = mpsc::unbounded_channel();
    let (inbound_tx, inbound_rx) = mpsc::unbounded_channel();
    let failing_sends = Arc::new(AtomicUsize::new(0));
    (
        MockDataLink {
            sent: sent_tx,
            inbound: Mutex::new(inbound_rx),
            failing_sends: Arc::clone(&failing_sends),
        },
        MockPeer {
            sent: sent_rx,
            inbound: inbound_tx,
            failing_sends,
        },
    )
}

impl DataLink for MockDataLink {
    async fn send(&self, address: &Address, frame: &[u8]) -> Result<usize, DataLinkError> {
        let failing = self
            .failing_sends
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1));
        if failing.is_ok() {
            return Err(DataLinkError::Io(std::io::Error::other("injected send failure")));
        }
        self.sent
            .send((*address, frame.to_vec()))
            .map_err(|_| DataLinkError::Closed)?;
        Ok(frame.len())
    }

    async fn recv(&self, buf: &mut [u8]) -> Result<(usize, Address), DataLinkError> {
        let (frame, source) = self
            .inbound
            .lock()
            .await
            .recv()
            .await
            .ok_or(DataLinkError::Closed)?;
        if frame.len() > buf.len() {
            return Err(DataLinkError::FrameTooLarge);
        }
        buf[..frame.len()].copy_from_slice(&frame);
        Ok((frame.len(), source))
    }

    fn local_address(&self) -> Address {
        Address::local(&CLIENT_MAC).unwrap_or_default()
    }

    fn broadcast_address(&self) -> Address {
        Address::global_broadcast()
    }
}

impl MockPeer {
    /// Makes the next `n` sends fail with an I/O error.
    pub fn fail_next_sends(&self, n: usize) {
        self.failing_sends.store(n, Ordering::SeqCst);
    }

    /// Waits for the next frame the client sends and returns its destination,
    /// invoke ID (0 for unconfirmed) and bytes.
    pub async fn next_request(&mut self) -> (Address, u8, Vec<u8>) {
        let (address, frame) = self.sent.recv().await.expect("client dropped");
        let invoke_id = decode_frame(&frame)
            .expect("client sent a malformed frame")
            .apdu
            .and_then(|apdu| apdu.invoke_id())
            .unwrap_or(0);
        (address, invoke_id, frame)
    }

    /// Delivers `frame` to the client as if sent by `from`.
    pub fn inject(&self, from: Address, frame: Vec<u8>) {
        self.inbound.send((frame, from)).expect("client dropped");
    }

    /// Builds a local unicast frame whose APDU is written by `body`.
    pub fn frame<F>(body: F) -> Vec<u8>
    where
        F: FnOnce(&mut Writer<'_>) -> Result<(), EncodeError>,
    {
        let mut buf = vec![0u8; 1500];
        let mut w = Writer::new(&mut buf);
        let len = encode_frame_with(&mut w, BvlcFunction::OriginalUnicastNpdu, &Npdu::new(), body)
            .expect("reply frame");
        buf.truncate(len);
        buf
    }
}
