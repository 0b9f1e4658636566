#![no_main]
use libfuzzer_sys::fuzz_target;

use geyser_harness::chain::abi::decode_accounting;
use geyser_harness::core::types::U256;

fuzz_target!(|data: &[u8]| {
    // Return data from an untrusted node must never panic the decoder.
    if let Ok(t) = decode_accounting(data) {
        assert!(data.len() >= 8 * 32);
        let _ = t.into_snapshot(U256::ZERO);
    }
});
