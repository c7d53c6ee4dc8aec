//! Object-list paging and the object walk that fills [`Device::objects`].

use crate::discovery::{Device, Object};
use crate::value::ObjectReads;
use crate::{BacnetClient, ClientDataValue, ClientError};
use bacflow_core::services::read_property_multiple::{PropertyReference, ReadAccessSpecification};
use bacflow_core::types::{ObjectId, PropertyId, MAX_INSTANCE};
use bacflow_core::DecodeError;
use bacflow_datalink::DataLink;

/// Reply overhead of a read-multiple ack around its results.
const ACK_OVERHEAD: usize = 10;
/// Reply bytes per object-list element (property, index, object identifier).
const LIST_ELEMENT_LEN: usize = 13;
/// Reply bytes budgeted per object for its name and description.
const NAMES_PER_OBJECT_LEN: usize = 96;

const NAME_PROPERTIES: [PropertyReference; 2] = [
    PropertyReference::new(PropertyId::ObjectName),
    PropertyReference::new(PropertyId::Description),
];

/// Object-list entries requested per read-multiple page.
pub fn object_list_page_size(device: &Device) -> usize {
    (device.max_apdu_len().saturating_sub(ACK_OVERHEAD) / LIST_ELEMENT_LEN).max(1)
}

fn names_batch_size(device: &Device) -> usize {
    (device.max_apdu_len().saturating_sub(ACK_OVERHEAD) / NAMES_PER_OBJECT_LEN).max(1)
}

impl<D: DataLink> BacnetClient<D> {
    /// Length of the device's object list (array index 0).
    ///
    /// A length above the number of device instances is refused.
    pub async fn object_list_len(&self, device: &Device) -> Result<u32, ClientError> {
        let len = self
            .read_property_indexed(device, device.device_id, PropertyId::ObjectList, 0)
            .await?
            .as_unsigned()
            .ok_or(ClientError::UnexpectedPayloadType)?;
        if len > MAX_INSTANCE {
            log::debug!("device {}: object-list length {len} refused", device.instance());
            return Err(DecodeError::InvalidLength.into());
        }
        Ok(len)
    }

    /// Reads `count` object-list entries starting at the 1-based `start`.
    ///
    /// Entries the device reports an error for are skipped.
    pub async fn object_list_page(
        &self,
        device: &Device,
        start: u32,
        count: u32,
    ) -> Result<Vec<ObjectId>, ClientError> {
        let refs: Vec<PropertyReference> = (start..start.saturating_add(count))
            .map(|index| PropertyReference::indexed(PropertyId::ObjectList, index))
            .collect();
        let specs = [ReadAccessSpecification {
            object_id: device.device_id,
            properties: &refs,
        }];
        let reads = self.read_property_multiple(device, &specs).await?;
        let mut ids = Vec::with_capacity(refs.len());
        for read in reads.iter().flat_map(|o| &o.properties) {
            match &read.value {
                Ok(value) => ids.extend(value.object_ids()),
                Err(err) => log::debug!(
                    "device {}: object-list[{:?}] failed: {err:?}",
                    device.instance(),
                    read.array_index
                ),
            }
        }
        Ok(ids)
    }

    /// Reads the object list page by page, one index at a time if the device
    /// refuses read-multiple.
    pub async fn object_list(&self, device: &Device) -> Result<Vec<ObjectId>, ClientError> {
        let len = self.object_list_len(device).await?;
        let page = u32::try_from(object_list_page_size(device)).unwrap_or(MAX_INSTANCE);
        let mut ids = Vec::new();
        let mut start: u32 = 1;
        while start <= len {
            let count = page.min(len - start + 1);
            match self.object_list_page(device, start, count).await {
                Ok(found) => ids.extend(found),
                Err(err) if err.root().is_remote() => {
                    log::debug!(
                        "device {}: paging object-list failed ({err}); reading singly",
                        device.instance()
                    );
                    for index in start..=start + (count - 1) {
                        let value = self
                            .read_property_indexed(
                                device,
                                device.device_id,
                                PropertyId::ObjectList,
                                index,
                            )
                            .await?;
                        ids.extend(value.object_ids());
                    }
                }
                Err(err) => return Err(err),
            }
            start = match start.checked_add(count) {
                Some(next) => next,
                None => break,
            };
        }
        Ok(ids)
    }

    /// Walks the device: pages the object list, then reads every object's
    /// name and description into `device.objects`.
    ///
    /// A batch that fails is retried one object at a time; objects that
    /// still fail are kept without names. Returns the number of objects.
    pub async fn objects(&self, device: &mut Device) -> Result<usize, ClientError> {
        let ids = self.object_list(device).await?;
        for batch in ids.chunks(names_batch_size(device)) {
            let specs: Vec<ReadAccessSpecification<'_>> = batch
                .iter()
                .map(|&object_id| ReadAccessSpecification {
                    object_id,
                    properties: &NAME_PROPERTIES,
                })
                .collect();
            match self.read_property_multiple(device, &specs).await {
                Ok(reads) => {
                    for read in reads {
                        device.insert_object(named_object(read));
                    }
                }
                Err(err) => {
                    log::debug!(
                        "device {}: batch of {} names failed ({err}); reading singly",
                        device.instance(),
                        batch.len()
                    );
                    for spec in &specs {
                        let object = match self
                            .read_property_multiple(device, std::slice::from_ref(spec))
                            .await
                        {
                            Ok(mut reads) if !reads.is_empty() => named_object(reads.remove(0)),
                            Ok(_) => Object::new(spec.object_id),
                            Err(err) => {
                                log::debug!("{:?}: names unavailable: {err}", spec.object_id);
                                Object::new(spec.object_id)
                            }
                        };
                        device.insert_object(object);
                    }
                }
            }
        }
        Ok(device.object_count())
    }
}

fn named_object(reads: ObjectReads) -> Object {
    let text = |property| {
        reads
            .value(property)
            .and_then(ClientDataValue::as_str)
            .map(str::to_owned)
    };
    let mut object = Object::new(reads.object_id);
    object.name = text(PropertyId::ObjectName);
    object.description = text(PropertyId::Description);
    object
}

#[cfg(test)]
mod tests {
    use super::{names_batch_size, object_list_page_size};
    use crate::discovery::Device;
    use crate::mock::{pair, MockPeer};
    use crate::{BacnetClient, ClientError};
    use bacflow_core::apdu::{AbortPdu, RejectPdu};
    use bacflow_core::services::read_property::ReadPropertyAck;
    use bacflow_core::services::read_property_multiple::{
        PropertyResult, ReadAccessResult, ReadPropertyMultipleAck, ReadResultElement,
    };
    use bacflow_core::types::{
        Address, DataValue, ObjectId, ObjectType, PropertyId, MAX_INSTANCE,
    };
    use bacflow_core::DecodeError;

    fn target() -> Device {
        Device::new(Address::local(&[10, 0, 0, 30, 0xBA, 0xC0]).unwrap(), 30).unwrap()
    }

    fn ai(instance: u32) -> ObjectId {
        ObjectId::new(ObjectType::AnalogInput, instance).unwrap()
    }

    fn list_len_ack(device: &Device, invoke_id: u8, len: u32) -> Vec<u8> {
        MockPeer::frame(|w| {
            ReadPropertyAck {
                object_id: device.device_id,
                property_id: PropertyId::ObjectList,
                array_index: Some(0),
                value: DataValue::Unsigned(len),
            }
            .encode(w, invoke_id)
        })
    }

    fn list_entry_ack(device: &Device, invoke_id: u8, index: u32, id: ObjectId) -> Vec<u8> {
        MockPeer::frame(|w| {
            ReadPropertyAck {
                object_id: device.device_id,
                property_id: PropertyId::ObjectList,
                array_index: Some(index),
                value: DataValue::ObjectId(id),
            }
            .encode(w, invoke_id)
        })
    }

    fn rpm_ack(invoke_id: u8, results: Vec<ReadAccessResult<'static>>) -> Vec<u8> {
        MockPeer::frame(|w| ReadPropertyMultipleAck { results }.encode(w, invoke_id))
    }

    fn element(
        property_id: PropertyId,
        array_index: Option<u32>,
        result: PropertyResult<'static>,
    ) -> ReadResultElement<'static> {
        ReadResultElement {
            property_id,
            array_index,
            result,
        }
    }

    fn names(object_id: ObjectId, name: &'static str) -> ReadAccessResult<'static> {
        ReadAccessResult {
            object_id,
            results: vec![
                element(
                    PropertyId::ObjectName,
                    None,
                    PropertyResult::Value(DataValue::CharacterString(name)),
                ),
                element(
                    PropertyId::Description,
                    None,
                    PropertyResult::Error { class: 2, code: 32 },
                ),
            ],
        }
    }

    #[test]
    fn page_sizes_follow_max_apdu() {
        let mut device = Device::new(Address::from_station(3), 1).unwrap();
        assert_eq!(object_list_page_size(&device), 112);
        assert_eq!(names_batch_size(&device), 15);
        device.max_apdu = 50;
        assert_eq!(object_list_page_size(&device), 3);
        assert_eq!(names_batch_size(&device), 1);
    }

    #[tokio::test]
    async fn walk_pages_list_then_batches_names() {
        let (link, mut peer) = pair();
        let client = BacnetClient::with_datalink(link);
        let mut device = target();
        let device_id = device.device_id;
        let address = device.address;
        let probe = device.clone();
        let (walked, ()) = tokio::join!(client.objects(&mut device), async {
            let (_, id, _) = peer.next_request().await;
            peer.inject(address, list_len_ack(&probe, id, 2));

            let (_, id, _) = peer.next_request().await;
            let page = ReadAccessResult {
                object_id: device_id,
                results: vec![
                    element(
                        PropertyId::ObjectList,
                        Some(1),
                        PropertyResult::Value(DataValue::ObjectId(device_id)),
                    ),
                    element(
                        PropertyId::ObjectList,
                        Some(2),
                        PropertyResult::Value(DataValue::ObjectId(ai(1))),
                    ),
                ],
            };
            peer.inject(address, rpm_ack(id, vec![page]));

            let (_, id, _) = peer.next_request().await;
            peer.inject(
                address,
                rpm_ack(id, vec![names(device_id, "plant"), names(ai(1), "oat")]),
            );
        });
        assert_eq!(walked.unwrap(), 2);
        assert_eq!(device.address, address);
        let oat = device.object(ai(1)).unwrap();
        assert_eq!(oat.name.as_deref(), Some("oat"));
        assert_eq!(oat.description, None);
        assert_eq!(
            device.object(device_id).and_then(|o| o.name.as_deref()),
            Some("plant")
        );
    }

    #[tokio::test]
    async fn implausible_object_list_length_is_refused() {
        let (link, mut peer) = pair();
        let client = BacnetClient::with_datalink(link);
        for len in [u32::MAX, MAX_INSTANCE + 1] {
            let mut device = target();
            let address = device.address;
            let probe = device.clone();
            let (walked, ()) = tokio::join!(client.objects(&mut device), async {
                let (_, id, _) = peer.next_request().await;
                peer.inject(address, list_len_ack(&probe, id, len));
            });
            assert!(matches!(
                walked.unwrap_err(),
                ClientError::Decode(DecodeError::InvalidLength)
            ));
            assert_eq!(device.object_count(), 0);
        }
        assert!(peer.sent.try_recv().is_err());
    }

    #[tokio::test]
    async fn walk_falls_back_when_read_multiple_is_refused() {
        let (link, mut peer) = pair();
        let client = BacnetClient::with_datalink(link);
        let mut device = target();
        let address = device.address;
        let probe = device.clone();
        let reject = |invoke_id| {
            MockPeer::frame(|w| RejectPdu { invoke_id, reason: 9 }.encode(w))
        };
        let (walked, ()) = tokio::join!(client.objects(&mut device), async {
            let (_, id, _) = peer.next_request().await;
            peer.inject(address, list_len_ack(&probe, id, 2));
            let (_, id, _) = peer.next_request().await;
            peer.inject(address, reject(id));
            for (index, object) in [(1, ai(1)), (2, ai(2))] {
                let (_, id, _) = peer.next_request().await;
                peer.inject(address, list_entry_ack(&probe, id, index, object));
            }
            let (_, id, _) = peer.next_request().await;
            peer.inject(address, reject(id));
            let (_, id, _) = peer.next_request().await;
            peer.inject(address, rpm_ack(id, vec![names(ai(1), "supply")]));
            let (_, id, _) = peer.next_request().await;
            let abort = MockPeer::frame(|w| {
                AbortPdu {
                    server: true,
                    invoke_id: id,
                    reason: 4,
                }
                .encode(w)
            });
            peer.inject(address, abort);
        });
        assert_eq!(walked.unwrap(), 2);
        assert_eq!(device.object(ai(1)).unwrap().name.as_deref(), Some("supply"));
        assert_eq!(device.object(ai(2)).unwrap().name, None);
    }
}
