//! Bounded FIFO of received frames.
//!
//! Transports enqueue, the control loop dequeues one frame per pass.
//! When full, the *newest* frame is dropped so commands already accepted
//! keep their order and are never lost.

use heapless::Deque;
use log::warn;

use crate::protocol::frame::Frame;

pub const QUEUE_CAPACITY: usize = 10;

#[derive(Debug, Default)]
pub struct CommandQueue {
    frames: Deque<Frame, QUEUE_CAPACITY>,
    dropped: u32,
}

impl CommandQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Enqueue a frame.  Returns `false` if the queue was full and the
    /// frame was dropped.
    pub fn push(&mut self, frame: Frame) -> bool {
        if self.frames.push_back(frame).is_err() {
            self.dropped = self.dropped.saturating_add(1);
            warn!("CommandQueue: full, frame dropped ({} total)", self.dropped);
            return false;
        }
        true
    }

    pub fn pop(&mut self) -> Option<Frame> {
        self.frames.pop_front()
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.frames.is_full()
    }

    /// Frames discarded because the queue was full.
    pub fn dropped(&self) -> u32 {
        self.dropped
    }
}
