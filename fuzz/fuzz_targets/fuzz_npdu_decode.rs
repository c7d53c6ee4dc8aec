#![no_main]

use bacflow_core::encoding::{reader::Reader, writer::Writer};
use bacflow_core::npdu::Npdu;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let mut r = Reader::new(data);
    if let Ok(npdu) = Npdu::decode(&mut r) {
        let mut buf = [0u8; 64];
        let mut w = Writer::new(&mut buf);
        let _ = npdu.encode(&mut w);
    }
});
