//! Invoke-ID allocation and reply correlation for confirmed requests.
//!
//! A slot moves `Free -> Allocated -> (Fulfilled | TimedOut) -> Free`. The
//! slot table is guarded by one mutex held only for bookkeeping; a caller
//! waiting for a reply waits on its own oneshot channel.

use crate::ClientError;
use bacflow_core::apdu::Apdu;
use bacflow_core::types::Address;
use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::sync::{oneshot, Notify};
use tokio::time::{timeout, timeout_at, Instant};

/// Largest pool: invoke IDs `1..=255`.
pub const MAX_POOL_SIZE: u8 = 255;

/// A confirmed reply routed to its waiting request.
#[derive(Debug, Clone, PartialEq)]
pub struct Reply {
    pub source: Address,
    pub apdu: Apdu,
    /// Service data following the APDU header.
    pub data: Vec<u8>,
}

#[derive(Debug)]
struct SlotTable {
    in_use: [bool; 256],
    waiters: HashMap<u8, oneshot::Sender<Reply>>,
}

#[derive(Debug)]
pub struct TransactionManager {
    table: Mutex<SlotTable>,
    freed: Notify,
    capacity: u8,
}

impl TransactionManager {
    /// A pool handing out IDs `1..=capacity`; a capacity of 0 becomes 1.
    pub fn new(capacity: u8) -> Self {
        Self {
            table: Mutex::new(SlotTable {
                in_use: [false; 256],
                waiters: HashMap::new(),
            }),
            freed: Notify::new(),
            capacity: capacity.max(1),
        }
    }

    pub fn capacity(&self) -> u8 {
        self.capacity
    }

    fn table(&self) -> MutexGuard<'_, SlotTable> {
        self.table.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Number of allocated slots.
    pub fn outstanding(&self) -> usize {
        self.table().in_use.iter().filter(|used| **used).count()
    }

    fn try_allocate(&self) -> Option<u8> {
        let mut table = self.table();
        let id = (1..=self.capacity).find(|id| !table.in_use[usize::from(*id)])?;
        table.in_use[usize::from(id)] = true;
        Some(id)
    }

    /// Allocates the smallest free invoke ID, waiting until `deadline` for one
    /// to be released.
    pub async fn acquire(
        self: &Arc<Self>,
        deadline: Instant,
    ) -> Result<TransactionSlot, ClientError> {
        loop {
            let notified = self.freed.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            if let Some(id) = self.try_allocate() {
                return Ok(TransactionSlot {
                    tsm: Arc::clone(self),
                    id,
                });
            }
            if timeout_at(deadline, notified).await.is_err() {
                return Err(ClientError::NoTransactionCapacity);
            }
        }
    }

    /// Returns `id` to the pool. Releasing a free slot does nothing.
    pub fn release(&self, id: u8) {
        {
            let mut table = self.table();
            if !table.in_use[usize::from(id)] {
                log::debug!("invoke id {id} released twice");
                return;
            }
            table.in_use[usize::from(id)] = false;
            table.waiters.remove(&id);
        }
        self.freed.notify_waiters();
    }

    /// Hands `reply` to the request waiting on `id`, if any. Never blocks.
    ///
    /// Returns whether a waiter took the reply.
    pub fn deliver(&self, id: u8, reply: Reply) -> bool {
        let waiter = self.table().waiters.remove(&id);
        match waiter {
            Some(tx) => {
                if tx.send(reply).is_err() {
                    log::debug!("reply for invoke id {id} arrived after its waiter gave up");
                    return false;
                }
                true
            }
            None => {
                log::debug!("discarding reply for invoke id {id}: nobody is waiting");
                false
            }
        }
    }

    /// Waits up to `timeout` for the reply to `id`.
    ///
    /// The waiter is registered when this is called, not when the future is
    /// first polled, so a reply racing the send is not lost. A later call
    /// for the same ID replaces the earlier waiter.
    pub fn await_reply(
        &self,
        id: u8,
        wait: Duration,
    ) -> impl Future<Output = Result<Reply, ClientError>> + Send + 'static {
        let (tx, rx) = oneshot::channel();
        self.table().waiters.insert(id, tx);
        async move {
            match timeout(wait, rx).await {
                Ok(Ok(reply)) => Ok(reply),
                Ok(Err(_)) | Err(_) => Err(ClientError::ReplyTimeout),
            }
        }
    }
}

/// An allocated invoke ID, released when dropped.
#[derive(Debug)]
pub struct TransactionSlot {
    tsm: Arc<TransactionManager>,
    id: u8,
}

impl TransactionSlot {
    pub fn id(&self) -> u8 {
        self.id
    }

    pub fn await_reply(
        &self,
        wait: Duration,
    ) -> impl Future<Output = Result<Reply, ClientError>> + Send + 'static {
        self.tsm.await_reply(self.id, wait)
    }
}

impl Drop for TransactionSlot {
    fn drop(&mut self) {
        self.tsm.release(self.id);
    }
}

#[cfg(test)]
mod tests {
    use super::{Reply, TransactionManager};
    use crate::ClientError;
    use bacflow_core::apdu::{Apdu, SimpleAck};
    use bacflow_core::types::Address;
    use std::sync::Arc;
    use std::time::Duration;
    use tokio::time::Instant;

    fn reply(invoke_id: u8) -> Reply {
        Reply {
            source: Address::from_station(9),
            apdu: Apdu::SimpleAck(SimpleAck {
                invoke_id,
                service_choice: 0x0F,
            }),
            data: vec![invoke_id],
        }
    }

    fn soon() -> Instant {
        Instant::now() + Duration::from_millis(10)
    }

    #[tokio::test(start_paused = true)]
    async fn exhausting_the_pool_then_releasing_one() {
        let tsm = Arc::new(TransactionManager::new(255));
        let mut slots = Vec::new();
        for expected in 1..=255u8 {
            let slot = tsm.acquire(soon()).await.unwrap();
            assert_eq!(slot.id(), expected);
            slots.push(slot);
        }
        assert!(slots.iter().all(|s| s.id() != 0));

        let err = tsm.acquire(soon()).await.unwrap_err();
        assert!(matches!(err, ClientError::NoTransactionCapacity));

        let freed = slots.remove(41);
        assert_eq!(freed.id(), 42);
        drop(freed);

        let again = tsm.acquire(soon()).await.unwrap();
        assert_eq!(again.id(), 42);
        assert!(matches!(
            tsm.acquire(soon()).await.unwrap_err(),
            ClientError::NoTransactionCapacity
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn acquire_waits_for_a_release() {
        let tsm = Arc::new(TransactionManager::new(1));
        let held = tsm.acquire(soon()).await.unwrap();

        let waiter = {
            let tsm = Arc::clone(&tsm);
            tokio::spawn(async move {
                tsm.acquire(Instant::now() + Duration::from_secs(1))
                    .await
                    .map(|slot| slot.id())
            })
        };
        tokio::time::sleep(Duration::from_millis(100)).await;
        drop(held);
        assert_eq!(waiter.await.unwrap().unwrap(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn double_release_is_harmless() {
        let tsm = Arc::new(TransactionManager::new(4));
        let slot = tsm.acquire(soon()).await.unwrap();
        let id = slot.id();
        tsm.release(id);
        drop(slot);
        assert_eq!(tsm.outstanding(), 0);

        let a = tsm.acquire(soon()).await.unwrap();
        let b = tsm.acquire(soon()).await.unwrap();
        assert_ne!(a.id(), b.id());
    }

    #[tokio::test(start_paused = true)]
    async fn deliver_unblocks_the_waiter_with_that_payload() {
        let tsm = Arc::new(TransactionManager::new(8));
        let slot = tsm.acquire(soon()).await.unwrap();
        let pending = slot.await_reply(Duration::from_secs(5));

        assert!(tsm.deliver(slot.id(), reply(slot.id())));
        assert_eq!(pending.await.unwrap(), reply(slot.id()));
    }

    #[tokio::test(start_paused = true)]
    async fn deliver_without_waiter_is_dropped() {
        let tsm = Arc::new(TransactionManager::new(8));
        assert!(!tsm.deliver(3, reply(3)));

        let slot = tsm.acquire(soon()).await.unwrap();
        let pending = slot.await_reply(Duration::from_secs(1));
        assert!(tsm.deliver(slot.id(), reply(slot.id())));
        assert!(!tsm.deliver(slot.id(), reply(slot.id())));
        assert!(pending.await.is_ok());
    }

    #[tokio::test(start_paused = true)]
    async fn await_reply_times_out() {
        let tsm = Arc::new(TransactionManager::new(8));
        let slot = tsm.acquire(soon()).await.unwrap();
        let err = slot.await_reply(Duration::from_secs(5)).await.unwrap_err();
        assert!(matches!(err, ClientError::ReplyTimeout));
        assert!(!tsm.deliver(slot.id(), reply(slot.id())));
    }
}
