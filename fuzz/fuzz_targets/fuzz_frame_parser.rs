//! Fuzz target: `Framer::feed` → `Command::parse`
//!
//! Drives arbitrary byte sequences through the streaming framer and the
//! command parser.  Asserts that neither panics, that no frame exceeds
//! the wire limit, and that every parsed setter leaves the configuration
//! within bounds.
//!
//! cargo fuzz run fuzz_frame_parser

#![no_main]

use dewctrl::config::DewConfig;
use dewctrl::protocol::frame::{Framer, MAX_FRAME_LEN, TERMINATOR};
use dewctrl::protocol::Command;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let mut framer = Framer::new();
    let mut cfg = DewConfig::default();

    framer.feed(data, |frame| {
        assert!(frame.len() <= MAX_FRAME_LEN, "frame exceeds MAX_FRAME_LEN");
        assert_eq!(frame.last(), Some(&TERMINATOR));

        match Command::parse(&frame) {
            Some(Command::SetFanSpeed(v)) => {
                cfg.set_fan_speed(v);
            }
            Some(Command::SetFanOnThreshold(v)) => cfg.set_fan_on_threshold(v),
            Some(Command::SetFanOffThreshold(v)) => cfg.set_fan_off_threshold(v),
            Some(Command::SetAmbientBias(v)) => cfg.set_ambient_bias(v),
            Some(Command::SetPageDuration(v)) => cfg.set_page_duration_ms(v),
            Some(Command::SetChannelOffset(id, v)) => cfg.set_channel_offset(id, v),
            _ => {}
        }
        assert!(cfg.channel_offsets().iter().all(|o| o.is_finite()));
        assert!(cfg.fan_off_c() <= 100 && cfg.fan_on_c() <= 100);
    });
});
