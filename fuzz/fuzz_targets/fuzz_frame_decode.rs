#![no_main]

use bacflow_core::frame::decode_frame;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(frame) = decode_frame(data) {
        assert!(frame.data.len() <= data.len());
    }
});
