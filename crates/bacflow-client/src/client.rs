//! The request orchestrator.
//!
//! Every confirmed request takes an invoke ID from the [`TransactionManager`],
//! is sent through the [`DataLink`] and waits for the dispatcher to route the
//! matching reply back. Who-Is discovery goes through the
//! [`SubscriptionManager`] instead.

use crate::dispatcher;
use crate::discovery::Device;
use crate::subscription::{BroadcastEvent, KeyRange, SubscriptionManager};
use crate::tsm::{Reply, TransactionManager, MAX_POOL_SIZE};
use crate::value::ObjectReads;
use crate::{ClientDataValue, ClientError};
use bacflow_core::apdu::{Apdu, BacnetError};
use bacflow_core::bvlc::BvlcFunction;
use bacflow_core::encoding::{reader::Reader, writer::Writer};
use bacflow_core::frame::{encode_frame, encode_frame_with};
use bacflow_core::npdu::Npdu;
use bacflow_core::services::read_property::{
    ReadPropertyAck, ReadPropertyRequest, SERVICE_READ_PROPERTY,
};
use bacflow_core::services::read_property_multiple::{
    ReadAccessSpecification, ReadPropertyMultipleAck, ReadPropertyMultipleRequest,
    SERVICE_READ_PROPERTY_MULTIPLE,
};
use bacflow_core::services::who_is::WhoIsRequest;
use bacflow_core::services::write_property::{WritePropertyRequest, SERVICE_WRITE_PROPERTY};
use bacflow_core::services::write_property_multiple::{
    WriteAccessSpecification, WritePropertyMultipleRequest, SERVICE_WRITE_PROPERTY_MULTIPLE,
};
use bacflow_core::types::{Address, ErrorClass, ErrorCode, ObjectId, PropertyId};
use bacflow_core::EncodeError;
use bacflow_datalink::{BacnetIpTransport, DataLink};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::Instant;

/// Tunables for a [`BacnetClient`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClientConfig {
    /// Number of invoke IDs that may be outstanding at once (1-255).
    pub pool_size: u8,
    /// How long a request waits for a free invoke ID.
    pub acquire_timeout: Duration,
    /// How long one attempt waits for its reply.
    pub reply_timeout: Duration,
    /// Total attempts per confirmed request, the first included.
    pub attempts: usize,
    /// Upper bound on one Who-Is collection.
    pub discovery_timeout: Duration,
    /// A Who-Is collection ends after this long without a new I-Am.
    pub discovery_idle: Duration,
    /// I-Am replies buffered per discovery before further ones are dropped.
    pub subscriber_buffer: usize,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            pool_size: MAX_POOL_SIZE,
            acquire_timeout: Duration::from_secs(1),
            reply_timeout: Duration::from_secs(5),
            attempts: 2,
            discovery_timeout: Duration::from_secs(10),
            discovery_idle: Duration::from_secs(2),
            subscriber_buffer: 64,
        }
    }
}

/// Builds a [`BacnetClient`] over any [`DataLink`].
#[derive(Debug)]
pub struct ClientBuilder<D: DataLink> {
    datalink: D,
    config: ClientConfig,
}

impl<D: DataLink> ClientBuilder<D> {
    pub fn new(datalink: D) -> Self {
        Self {
            datalink,
            config: ClientConfig::default(),
        }
    }

    pub fn with_config(mut self, config: ClientConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_pool_size(mut self, pool_size: u8) -> Self {
        self.config.pool_size = pool_size;
        self
    }

    pub fn with_acquire_timeout(mut self, timeout: Duration) -> Self {
        self.config.acquire_timeout = timeout;
        self
    }

    pub fn with_reply_timeout(mut self, timeout: Duration) -> Self {
        self.config.reply_timeout = timeout;
        self
    }

    /// Total attempts per request; values below 1 are treated as 1.
    pub fn with_attempts(mut self, attempts: usize) -> Self {
        self.config.attempts = attempts;
        self
    }

    pub fn with_discovery_timeout(mut self, timeout: Duration) -> Self {
        self.config.discovery_timeout = timeout;
        self
    }

    pub fn with_discovery_idle(mut self, idle: Duration) -> Self {
        self.config.discovery_idle = idle;
        self
    }

    pub fn with_subscriber_buffer(mut self, buffer: usize) -> Self {
        self.config.subscriber_buffer = buffer;
        self
    }

    /// Spawns the inbound dispatcher; must be called inside a tokio runtime.
    pub fn build(self) -> BacnetClient<D> {
        let datalink = Arc::new(self.datalink);
        let tsm = Arc::new(TransactionManager::new(self.config.pool_size));
        let subscriptions = Arc::new(SubscriptionManager::new(self.config.subscriber_buffer));
        let dispatcher = dispatcher::spawn(
            Arc::clone(&datalink),
            Arc::clone(&tsm),
            Arc::clone(&subscriptions),
        );
        BacnetClient {
            datalink,
            tsm,
            subscriptions,
            config: self.config,
            dispatcher,
        }
    }
}

/// An async BACnet client. Dropping it stops the inbound dispatcher.
#[derive(Debug)]
pub struct BacnetClient<D: DataLink> {
    datalink: Arc<D>,
    tsm: Arc<TransactionManager>,
    subscriptions: Arc<SubscriptionManager>,
    config: ClientConfig,
    dispatcher: JoinHandle<()>,
}

impl BacnetClient<BacnetIpTransport> {
    /// Binds BACnet/IP on the named interface and starts the dispatcher.
    pub async fn new(interface: &str, port: u16) -> Result<Self, ClientError> {
        let transport = BacnetIpTransport::bind_interface(interface, port).await?;
        Ok(Self::with_datalink(transport))
    }
}

impl<D: DataLink> BacnetClient<D> {
    pub fn builder(datalink: D) -> ClientBuilder<D> {
        ClientBuilder::new(datalink)
    }

    pub fn with_datalink(datalink: D) -> Self {
        ClientBuilder::new(datalink).build()
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn datalink(&self) -> &D {
        &self.datalink
    }

    /// Invoke IDs currently held by in-flight requests.
    pub fn outstanding_requests(&self) -> usize {
        self.tsm.outstanding()
    }

    /// Reads a whole property.
    pub async fn read_property(
        &self,
        device: &Device,
        object_id: ObjectId,
        property_id: PropertyId,
    ) -> Result<ClientDataValue, ClientError> {
        self.read_property_at(device, object_id, property_id, None)
            .await
    }

    /// Reads one element of an array property; index 0 is the array length.
    pub async fn read_property_indexed(
        &self,
        device: &Device,
        object_id: ObjectId,
        property_id: PropertyId,
        array_index: u32,
    ) -> Result<ClientDataValue, ClientError> {
        self.read_property_at(device, object_id, property_id, Some(array_index))
            .await
    }

    async fn read_property_at(
        &self,
        device: &Device,
        object_id: ObjectId,
        property_id: PropertyId,
        array_index: Option<u32>,
    ) -> Result<ClientDataValue, ClientError> {
        let reply = self
            .transact(device, |w, invoke_id| {
                ReadPropertyRequest {
                    object_id,
                    property_id,
                    array_index,
                    invoke_id,
                }
                .encode(w)
            })
            .await?;
        expect_complex_ack(&reply, SERVICE_READ_PROPERTY)?;
        let mut r = Reader::new(&reply.data);
        let ack = ReadPropertyAck::decode_after_header(&mut r)?;
        Ok(ack.value.into())
    }

    /// Writes one property. The request's invoke ID is assigned here.
    pub async fn write_property(
        &self,
        device: &Device,
        request: WritePropertyRequest<'_>,
    ) -> Result<(), ClientError> {
        let reply = self
            .transact(device, |w, invoke_id| {
                WritePropertyRequest {
                    invoke_id,
                    ..request.clone()
                }
                .encode(w)
            })
            .await?;
        expect_simple_ack(&reply, SERVICE_WRITE_PROPERTY)
    }

    /// Reads several properties of several objects in one request.
    ///
    /// Per-property errors come back inside the result; only a failure of the
    /// whole request is an `Err`.
    pub async fn read_property_multiple(
        &self,
        device: &Device,
        specs: &[ReadAccessSpecification<'_>],
    ) -> Result<Vec<ObjectReads>, ClientError> {
        let reply = self
            .transact(device, |w, invoke_id| {
                ReadPropertyMultipleRequest { specs, invoke_id }.encode(w)
            })
            .await?;
        expect_complex_ack(&reply, SERVICE_READ_PROPERTY_MULTIPLE)?;
        let mut r = Reader::new(&reply.data);
        let ack = ReadPropertyMultipleAck::decode_after_header(&mut r)?;
        Ok(ack.results.into_iter().map(ObjectReads::from).collect())
    }

    pub async fn write_property_multiple(
        &self,
        device: &Device,
        specs: &[WriteAccessSpecification<'_>],
    ) -> Result<(), ClientError> {
        let reply = self
            .transact(device, |w, invoke_id| {
                WritePropertyMultipleRequest { specs, invoke_id }.encode(w)
            })
            .await?;
        expect_simple_ack(&reply, SERVICE_WRITE_PROPERTY_MULTIPLE)
    }

    /// Broadcasts Who-Is and collects the devices that answer.
    ///
    /// `range` limits both the request and the accepted replies to those
    /// device instances; `None` asks every device.
    pub async fn who_is(&self, range: Option<(u32, u32)>) -> Result<Vec<Device>, ClientError> {
        let destination = self.datalink.broadcast_address();
        self.discover(destination, range).await
    }

    /// Sends Who-Is to one address and collects the replies.
    pub async fn who_is_at(
        &self,
        address: Address,
        range: Option<(u32, u32)>,
    ) -> Result<Vec<Device>, ClientError> {
        self.discover(address, range).await
    }

    async fn discover(
        &self,
        destination: Address,
        range: Option<(u32, u32)>,
    ) -> Result<Vec<Device>, ClientError> {
        let request = match range {
            Some((low, high)) => WhoIsRequest::range(low, high)?,
            None => WhoIsRequest::global(),
        };
        let npdu = Npdu::application(&destination, false);
        let frame = encode_with_growth(|w| {
            encode_frame_with(
                w,
                BvlcFunction::for_destination(&destination),
                &npdu,
                |w| request.encode(w),
            )
            .map(|_| ())
        })?;

        let subscription = self.subscriptions.subscribe(
            KeyRange::from(range),
            self.config.discovery_timeout,
            self.config.discovery_idle,
        );
        self.datalink.send(&destination, &frame).await?;
        let events = subscription.collect().await;

        let mut devices = BTreeMap::new();
        for event in events {
            let BroadcastEvent::IAm { source, i_am } = event else {
                continue;
            };
            let instance = i_am.device_id.instance();
            if !request.matches(instance) {
                log::debug!("ignoring i-am from device {instance} outside {range:?}");
                continue;
            }
            devices
                .entry(instance)
                .or_insert_with(|| Device::from_i_am(source, &i_am));
        }
        log::debug!("who-is to {destination} found {} devices", devices.len());
        Ok(devices.into_values().collect())
    }

    /// Runs one confirmed exchange and returns the raw reply.
    async fn transact<F>(&self, device: &Device, encode: F) -> Result<Reply, ClientError>
    where
        F: FnMut(&mut Writer<'_>, u8) -> Result<(), EncodeError>,
    {
        self.transact_counted(device, encode)
            .await
            .map(|(reply, _)| reply)
    }

    /// Like [`transact`](Self::transact), also reporting the attempt that
    /// succeeded.
    pub(crate) async fn transact_counted<F>(
        &self,
        device: &Device,
        mut encode: F,
    ) -> Result<(Reply, usize), ClientError>
    where
        F: FnMut(&mut Writer<'_>, u8) -> Result<(), EncodeError>,
    {
        let slot = self
            .tsm
            .acquire(Instant::now() + self.config.acquire_timeout)
            .await?;
        let invoke_id = slot.id();

        let apdu = encode_with_growth(|w| encode(w, invoke_id))?;
        let max = device.max_apdu_len();
        if apdu.len() > max {
            return Err(ClientError::PayloadTooLarge {
                size: apdu.len(),
                max,
            });
        }
        let npdu = Npdu::application(&device.address, true)
            .with_source(self.datalink.local_address());
        let frame = encode_with_growth(|w| {
            encode_frame(
                w,
                BvlcFunction::for_destination(&device.address),
                &npdu,
                None,
                &apdu,
            )
            .map(|_| ())
        })?;

        let attempts = self.config.attempts.max(1);
        let mut last = ClientError::ReplyTimeout;
        for attempt in 1..=attempts {
            let reply = slot.await_reply(self.config.reply_timeout);
            let outcome = match self.datalink.send(&device.address, &frame).await {
                Ok(_) => reply.await,
                Err(err) => Err(err.into()),
            };
            match outcome {
                Ok(reply) => return Ok((reply, attempt)),
                Err(err) => {
                    log::debug!(
                        "invoke id {invoke_id} to {}: attempt {attempt}/{attempts} failed: {err}",
                        device.address
                    );
                    last = err;
                }
            }
        }
        Err(ClientError::RetriesExhausted {
            attempts,
            last: Box::new(last),
        })
    }
}

impl<D: DataLink> Drop for BacnetClient<D> {
    fn drop(&mut self) {
        self.dispatcher.abort();
    }
}

/// Encodes into a buffer that grows until the output fits.
fn encode_with_growth<F>(mut encode: F) -> Result<Vec<u8>, ClientError>
where
    F: FnMut(&mut Writer<'_>) -> Result<(), EncodeError>,
{
    for size in [512usize, 1024, 2048, 4096, 8192, 16_384, 32_768, 65_536] {
        let mut buf = vec![0u8; size];
        let mut w = Writer::new(&mut buf);
        match encode(&mut w) {
            Ok(()) => {
                let written = w.as_written().len();
                buf.truncate(written);
                return Ok(buf);
            }
            Err(EncodeError::BufferTooSmall) => continue,
            Err(e) => return Err(e.into()),
        }
    }
    Err(EncodeError::BufferTooSmall.into())
}

fn expect_complex_ack(reply: &Reply, service_choice: u8) -> Result<(), ClientError> {
    match reply.apdu {
        Apdu::ComplexAck(ack) if ack.segmented => Err(ClientError::SegmentationNotSupported),
        Apdu::ComplexAck(ack) if ack.service_choice == service_choice => Ok(()),
        _ => Err(remote_failure(&reply.apdu)),
    }
}

fn expect_simple_ack(reply: &Reply, service_choice: u8) -> Result<(), ClientError> {
    match reply.apdu {
        Apdu::SimpleAck(ack) if ack.service_choice == service_choice => Ok(()),
        _ => Err(remote_failure(&reply.apdu)),
    }
}

fn remote_failure(apdu: &Apdu) -> ClientError {
    match *apdu {
        Apdu::Error(err) => remote_service_error(err),
        Apdu::Reject(rej) => ClientError::RemoteReject { reason: rej.reason },
        Apdu::Abort(abort) => ClientError::RemoteAbort {
            reason: abort.reason,
            server: abort.server,
        },
        _ => ClientError::UnexpectedPayloadType,
    }
}

fn remote_service_error(err: BacnetError) -> ClientError {
    ClientError::RemoteServiceError {
        service_choice: err.service_choice,
        error_class_raw: err.error_class,
        error_code_raw: err.error_code,
        error_class: err.error_class.and_then(ErrorClass::from_u32),
        error_code: err.error_code.and_then(ErrorCode::from_u32),
    }
}

#[cfg(test)]
mod tests {
    use super::BacnetClient;
    use crate::discovery::Device;
    use crate::mock::{pair, MockDataLink, MockPeer, CLIENT_MAC};
    use crate::{ClientDataValue, ClientError};
    use bacflow_core::apdu::{Apdu, BacnetError, SimpleAck};
    use bacflow_core::bvlc::BvlcFunction;
    use bacflow_core::frame::decode_frame;
    use bacflow_core::services::i_am::IAmRequest;
    use bacflow_core::services::read_property::{
        ReadPropertyAck, ReadPropertyRequest, SERVICE_READ_PROPERTY,
    };
    use bacflow_core::services::write_property::{WritePropertyRequest, SERVICE_WRITE_PROPERTY};
    use bacflow_core::types::{
        Address, DataValue, ErrorCode, ObjectId, ObjectType, PropertyId, Segmentation,
    };
    use bacflow_core::encoding::reader::Reader;
    use std::time::Duration;
    use tokio::time::Instant;

    const DEVICE_MAC: [u8; 6] = [10, 0, 0, 20, 0xBA, 0xC0];

    fn client() -> (BacnetClient<MockDataLink>, MockPeer) {
        let (link, peer) = pair();
        (BacnetClient::with_datalink(link), peer)
    }

    fn device() -> Device {
        Device::new(Address::local(&DEVICE_MAC).unwrap(), 20).unwrap()
    }

    fn ai1() -> ObjectId {
        ObjectId::new(ObjectType::AnalogInput, 1).unwrap()
    }

    fn present_value_ack(invoke_id: u8, value: f32) -> Vec<u8> {
        MockPeer::frame(|w| {
            ReadPropertyAck {
                object_id: ai1(),
                property_id: PropertyId::PresentValue,
                array_index: None,
                value: DataValue::Real(value),
            }
            .encode(w, invoke_id)
        })
    }

    fn i_am(instance: u32) -> Vec<u8> {
        MockPeer::frame(|w| {
            IAmRequest {
                device_id: ObjectId::device(instance).unwrap(),
                max_apdu: 1476,
                segmentation: Segmentation::NoSegmentation,
                vendor_id: 260,
            }
            .encode(w)
        })
    }

    #[tokio::test]
    async fn read_property_round_trip() {
        let (client, mut peer) = client();
        let target = device();
        let (read, ()) = tokio::join!(
            client.read_property(&target, ai1(), PropertyId::PresentValue),
            async {
                let (to, invoke_id, frame) = peer.next_request().await;
                assert_eq!(to, target.address);
                let decoded = decode_frame(&frame).unwrap();
                assert_eq!(decoded.link.function, BvlcFunction::OriginalUnicastNpdu);
                assert!(decoded.npdu.expecting_reply);
                let Some(Apdu::ConfirmedRequest(header)) = decoded.apdu else {
                    panic!("expected a confirmed request");
                };
                assert_eq!(header.service_choice, SERVICE_READ_PROPERTY);
                let mut body = Reader::new(decoded.data);
                let request =
                    ReadPropertyRequest::decode_after_header(&mut body, invoke_id).unwrap();
                assert_eq!(request.object_id, ai1());
                assert_eq!(request.property_id, PropertyId::PresentValue);
                peer.inject(target.address, present_value_ack(invoke_id, 21.5));
            }
        );
        assert_eq!(read.unwrap(), ClientDataValue::Real(21.5));
        assert_eq!(client.outstanding_requests(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn second_attempt_succeeds_after_timeout() {
        let (client, mut peer) = client();
        let target = device();
        let request = client.transact_counted(&target, |w, invoke_id| {
            ReadPropertyRequest {
                object_id: ai1(),
                property_id: PropertyId::PresentValue,
                array_index: None,
                invoke_id,
            }
            .encode(w)
        });
        let (outcome, ()) = tokio::join!(request, async {
            let (_, first, _) = peer.next_request().await;
            let (_, second, _) = peer.next_request().await;
            assert_eq!(first, second);
            peer.inject(target.address, present_value_ack(second, 1.0));
        });
        let (reply, attempts) = outcome.unwrap();
        assert_eq!(attempts, 2);
        assert!(matches!(reply.apdu, Apdu::ComplexAck(_)));
    }

    #[tokio::test(start_paused = true)]
    async fn every_attempt_timing_out_exhausts_retries() {
        let (client, mut peer) = client();
        let started = Instant::now();
        let err = client
            .read_property(&device(), ai1(), PropertyId::PresentValue)
            .await
            .unwrap_err();
        let ClientError::RetriesExhausted { attempts, last } = err else {
            panic!("expected retries to run out, got {err:?}");
        };
        assert_eq!(attempts, 2);
        assert!(matches!(*last, ClientError::ReplyTimeout));
        let waited = started.elapsed();
        assert!(waited >= Duration::from_secs(10) && waited < Duration::from_secs(11));
        assert!(peer.sent.try_recv().is_ok());
        assert!(peer.sent.try_recv().is_ok());
        assert!(peer.sent.try_recv().is_err());
        assert_eq!(client.outstanding_requests(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn send_failure_retries_without_waiting() {
        let (client, mut peer) = client();
        let target = device();
        peer.fail_next_sends(1);
        let started = Instant::now();
        let (read, ()) = tokio::join!(
            client.read_property(&target, ai1(), PropertyId::PresentValue),
            async {
                let (_, invoke_id, _) = peer.next_request().await;
                peer.inject(target.address, present_value_ack(invoke_id, 3.0));
            }
        );
        assert_eq!(read.unwrap(), ClientDataValue::Real(3.0));
        assert!(started.elapsed() < client.config().reply_timeout);
    }

    #[tokio::test]
    async fn oversized_request_is_never_sent() {
        let (client, mut peer) = client();
        let mut target = device();
        target.max_apdu = 50;
        let text = "x".repeat(64);
        let err = client
            .write_property(
                &target,
                WritePropertyRequest {
                    object_id: ai1(),
                    property_id: PropertyId::Description,
                    value: DataValue::CharacterString(&text),
                    array_index: None,
                    priority: None,
                    invoke_id: 0,
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, ClientError::PayloadTooLarge { max: 50, .. }));
        assert!(peer.sent.try_recv().is_err());
        assert_eq!(client.outstanding_requests(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn remote_error_is_not_retried() {
        let (client, mut peer) = client();
        let target = device();
        let (read, ()) = tokio::join!(
            client.read_property(&target, ai1(), PropertyId::Units),
            async {
                let (_, invoke_id, _) = peer.next_request().await;
                let error = MockPeer::frame(|w| {
                    BacnetError {
                        invoke_id,
                        service_choice: SERVICE_READ_PROPERTY,
                        error_class: Some(2),
                        error_code: Some(32),
                    }
                    .encode(w)
                });
                peer.inject(target.address, error);
            }
        );
        let err = read.unwrap_err();
        assert!(err.is_remote());
        assert!(matches!(
            err,
            ClientError::RemoteServiceError {
                error_code: Some(ErrorCode::UnknownProperty),
                ..
            }
        ));
        assert!(peer.sent.try_recv().is_err());
    }

    #[tokio::test]
    async fn write_property_expects_simple_ack() {
        let (client, mut peer) = client();
        let target = device();
        let (written, ()) = tokio::join!(
            client.write_property(
                &target,
                WritePropertyRequest {
                    object_id: ObjectId::new(ObjectType::BinaryValue, 3).unwrap(),
                    property_id: PropertyId::PresentValue,
                    value: DataValue::Enumerated(1),
                    array_index: None,
                    priority: Some(8),
                    invoke_id: 0,
                },
            ),
            async {
                let (_, invoke_id, _) = peer.next_request().await;
                let ack = MockPeer::frame(|w| {
                    SimpleAck {
                        invoke_id,
                        service_choice: SERVICE_WRITE_PROPERTY,
                    }
                    .encode(w)
                });
                peer.inject(target.address, ack);
            }
        );
        written.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn exhausted_pool_fails_fast() {
        let (link, _peer) = pair();
        let client = BacnetClient::builder(link)
            .with_pool_size(1)
            .with_acquire_timeout(Duration::from_millis(10))
            .with_attempts(1)
            .build();
        let target = device();
        let (first, second) = tokio::join!(
            client.read_property(&target, ai1(), PropertyId::PresentValue),
            async {
                tokio::time::sleep(Duration::from_millis(1)).await;
                client
                    .read_property(&target, ai1(), PropertyId::PresentValue)
                    .await
            }
        );
        assert!(matches!(
            first.unwrap_err().root(),
            ClientError::ReplyTimeout
        ));
        assert!(matches!(second.unwrap_err(), ClientError::NoTransactionCapacity));
    }

    #[tokio::test(start_paused = true)]
    async fn who_is_dedupes_and_filters_by_range() {
        let (client, mut peer) = client();
        let first_source = Address::local(&[10, 0, 0, 5, 0xBA, 0xC0]).unwrap();
        let second_source = Address::local(&[10, 0, 0, 6, 0xBA, 0xC0]).unwrap();
        let started = Instant::now();
        let (found, ()) = tokio::join!(client.who_is(Some((1, 100))), async {
            let (to, invoke_id, frame) = peer.next_request().await;
            assert_eq!(invoke_id, 0);
            assert!(to.is_broadcast());
            assert_eq!(&frame[..2], &[0x81, 0x0B]);
            peer.inject(first_source, i_am(5));
            peer.inject(second_source, i_am(5));
            peer.inject(second_source, i_am(7));
            peer.inject(second_source, i_am(300));
        });
        let found = found.unwrap();
        let instances: Vec<u32> = found.iter().map(Device::instance).collect();
        assert_eq!(instances, vec![5, 7]);
        assert_eq!(found[0].address, first_source);
        assert_eq!(found[0].vendor_id, 260);
        assert!(started.elapsed() < client.config().discovery_timeout);
    }

    #[tokio::test(start_paused = true)]
    async fn directed_who_is_goes_to_one_address() {
        let (client, mut peer) = client();
        let target = Address::local(&DEVICE_MAC).unwrap();
        let (found, ()) = tokio::join!(client.who_is_at(target, None), async {
            let (to, _, frame) = peer.next_request().await;
            assert_eq!(to, target);
            assert_eq!(&frame[..2], &[0x81, 0x0A]);
            peer.inject(target, i_am(20));
        });
        let found = found.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].address, target);
        assert_ne!(found[0].address.mac.as_slice(), &CLIENT_MAC);
    }
}
