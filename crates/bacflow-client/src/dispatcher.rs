//! The inbound receive loop.
//!
//! One task owns `DataLink::recv`; every datagram is classified on its own
//! spawned task so a slow consumer never stalls reception.

use crate::subscription::{BroadcastEvent, SubscriptionManager};
use crate::tsm::{Reply, TransactionManager};
use bacflow_core::apdu::{unconfirmed::service, Apdu};
use bacflow_core::bvlc::LinkFrame;
use bacflow_core::encoding::reader::Reader;
use bacflow_core::frame::{decode_npdu_payload, MAX_FRAME_LEN};
use bacflow_core::services::i_am::IAmRequest;
use bacflow_core::services::who_is::WhoIsRequest;
use bacflow_core::types::Address;
use bacflow_datalink::{DataLink, DataLinkError};
use std::sync::Arc;
use tokio::task::JoinHandle;

/// What became of one inbound datagram.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dispatch {
    /// Handed to the request waiting on this invoke ID.
    Reply { invoke_id: u8 },
    /// A confirmed reply nobody was waiting for.
    LateReply { invoke_id: u8 },
    /// Published to this many subscriptions.
    Broadcast { receivers: usize },
    Discarded(&'static str),
}

pub(crate) fn spawn<D: DataLink>(
    datalink: Arc<D>,
    tsm: Arc<TransactionManager>,
    subscriptions: Arc<SubscriptionManager>,
) -> JoinHandle<()> {
    tokio::spawn(run(datalink, tsm, subscriptions))
}

async fn run<D: DataLink>(
    datalink: Arc<D>,
    tsm: Arc<TransactionManager>,
    subscriptions: Arc<SubscriptionManager>,
) {
    let mut buf = vec![0u8; MAX_FRAME_LEN];
    loop {
        match datalink.recv(&mut buf).await {
            Ok((n, source)) => {
                let datagram = buf[..n].to_vec();
                let tsm = Arc::clone(&tsm);
                let subscriptions = Arc::clone(&subscriptions);
                tokio::spawn(async move {
                    let outcome = dispatch(&tsm, &subscriptions, source, &datagram);
                    log::trace!("{} bytes from {source}: {outcome:?}", datagram.len());
                });
            }
            Err(DataLinkError::Closed) => {
                log::debug!("data link closed; dispatcher stopping");
                break;
            }
            Err(err) => log::warn!("receive failed: {err}"),
        }
    }
}

/// Classifies one datagram received from `link_source` and routes it.
pub fn dispatch(
    tsm: &TransactionManager,
    subscriptions: &SubscriptionManager,
    link_source: Address,
    datagram: &[u8],
) -> Dispatch {
    let link = match LinkFrame::decode(datagram) {
        Ok(link) => link,
        Err(err) => return discard("malformed link frame", &err),
    };
    if !link.carries_npdu() {
        return discarded("link control frame");
    }
    let frame = match decode_npdu_payload(&link) {
        Ok(frame) => frame,
        Err(err) => return discard("malformed npdu/apdu", &err),
    };
    let Some(apdu) = frame.apdu else {
        return discarded("network layer message");
    };

    let source = match frame.npdu.source {
        Some(routed) => Address {
            mac: link_source.mac,
            net: routed.net,
            adr: routed.adr,
        },
        None => link_source,
    };

    if apdu.kind().is_confirmed_reply() {
        let Some(invoke_id) = apdu.invoke_id() else {
            return discarded("confirmed reply without invoke id");
        };
        let reply = Reply {
            source,
            apdu,
            data: frame.data.to_vec(),
        };
        return if tsm.deliver(invoke_id, reply) {
            Dispatch::Reply { invoke_id }
        } else {
            Dispatch::LateReply { invoke_id }
        };
    }

    let event = match apdu {
        Apdu::UnconfirmedRequest(h) if h.service_choice == service::I_AM => {
            match IAmRequest::decode_after_header(&mut Reader::new(frame.data)) {
                Ok(i_am) => BroadcastEvent::IAm { source, i_am },
                Err(err) => return discard("malformed i-am", &err),
            }
        }
        Apdu::UnconfirmedRequest(h) if h.service_choice == service::WHO_IS => {
            match WhoIsRequest::decode_after_header(&mut Reader::new(frame.data)) {
                Ok(request) => BroadcastEvent::WhoIs { source, request },
                Err(err) => return discard("malformed who-is", &err),
            }
        }
        _ => return discarded("unhandled apdu"),
    };
    Dispatch::Broadcast {
        receivers: subscriptions.publish(event.key(), event),
    }
}

fn discard(reason: &'static str, err: &dyn std::fmt::Display) -> Dispatch {
    log::debug!("discarding frame: {reason}: {err}");
    Dispatch::Discarded(reason)
}

fn discarded(reason: &'static str) -> Dispatch {
    log::debug!("discarding frame: {reason}");
    Dispatch::Discarded(reason)
}
