//! Fuzz target: `record::decode`
//!
//! Feeds arbitrary bytes to the EEPROM record decoder.  A record that
//! decodes must survive `sanitize()` and re-encode into a single slot.
//!
//! cargo fuzz run fuzz_record_decode

#![no_main]

use dewctrl::config::record;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(mut cfg) = record::decode(data) {
        cfg.sanitize();
        assert!(!cfg.clone().sanitize(), "sanitize must be idempotent");
        // Offsets decoded from arbitrary bytes may be huge but stay finite.
        assert!(cfg.channel_offsets().iter().all(|o| o.is_finite()));
        let rec = record::encode(&cfg).expect("sanitized config fits a record");
        assert_eq!(record::marker(&rec), record::VALID_MARKER);
    }
});
