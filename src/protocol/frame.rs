//! `#`-terminated command framer.
//!
//! Wire format:
//! ```text
//! ┌──────┬────────────────────┬───┐
//! │ code │ parameter (0–13 B) │ # │
//! └──────┴────────────────────┴───┘
//! ```
//!
//! Bytes accumulate until the terminator.  At most `MAX_FRAME_LEN − 1`
//! body bytes are kept; anything longer is truncated so a frame never
//! exceeds `MAX_FRAME_LEN` bytes including the `#`.  CR and LF are
//! skipped so terminal line endings do not leak into the next frame.

use heapless::Vec;

pub const TERMINATOR: u8 = b'#';

/// Longest frame, terminator included.
pub const MAX_FRAME_LEN: usize = 15;

const MAX_BODY_LEN: usize = MAX_FRAME_LEN - 1;

/// A complete frame, terminator included.
pub type Frame = Vec<u8, MAX_FRAME_LEN>;

/// Streaming framer, one per transport.
#[derive(Debug, Default)]
pub struct Framer {
    body: Vec<u8, MAX_BODY_LEN>,
    truncated: bool,
}

impl Framer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one byte.  Returns a frame when the terminator arrives.
    pub fn push(&mut self, byte: u8) -> Option<Frame> {
        match byte {
            b'\r' | b'\n' => None,
            TERMINATOR => {
                let mut frame = Frame::new();
                // body ≤ MAX_BODY_LEN, so both writes fit.
                let _ = frame.extend_from_slice(&self.body);
                let _ = frame.push(TERMINATOR);
                if self.truncated {
                    log::debug!("Framer: overlong frame truncated to {} bytes", frame.len());
                }
                self.reset();
                Some(frame)
            }
            b => {
                if self.body.push(b).is_err() {
                    self.truncated = true;
                }
                None
            }
        }
    }

    /// Feed a chunk, handing every completed frame to `on_frame`.
    pub fn feed(&mut self, data: &[u8], mut on_frame: impl FnMut(Frame)) {
        for &b in data {
            if let Some(frame) = self.push(b) {
                on_frame(frame);
            }
        }
    }

    /// Discard any partial frame.
    pub fn reset(&mut self) {
        self.body.clear();
        self.truncated = false;
    }
}
