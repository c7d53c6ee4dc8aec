#![no_main]

use bacflow_core::encoding::reader::Reader;
use bacflow_core::services::i_am::IAmRequest;
use bacflow_core::services::read_property::ReadPropertyAck;
use bacflow_core::services::read_property_multiple::ReadPropertyMultipleAck;
use bacflow_core::services::who_is::WhoIsRequest;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let _ = ReadPropertyAck::decode_after_header(&mut Reader::new(data));
    let _ = ReadPropertyMultipleAck::decode_after_header(&mut Reader::new(data));
    let _ = IAmRequest::decode_after_header(&mut Reader::new(data));
    let _ = WhoIsRequest::decode_after_header(&mut Reader::new(data));
});
