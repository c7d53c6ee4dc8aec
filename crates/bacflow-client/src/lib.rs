//! Async BACnet/IP client.
//!
//! [`BacnetClient`] runs one background dispatcher over a
//! [`DataLink`](bacflow_datalink::DataLink) and correlates replies to
//! requests by invoke ID. Who-Is discovery collects I-Am replies through
//! subscriptions, and [`BacnetClient::objects`] pages a device's object list.

pub mod client;
pub mod discovery;
pub mod dispatcher;
pub mod error;
pub mod subscription;
pub mod tsm;
pub mod value;
pub mod walk;

#[cfg(test)]
mod mock;

pub use client::{BacnetClient, ClientBuilder, ClientConfig};
pub use discovery::{Device, Object, PropertyValue};
pub use error::ClientError;
pub use subscription::{BroadcastEvent, KeyRange, SubscriptionManager};
pub use tsm::{TransactionManager, TransactionSlot};
pub use value::{ClientDataValue, ObjectReads, PropertyError, PropertyRead};
