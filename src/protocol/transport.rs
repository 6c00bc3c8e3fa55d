//! Transport abstraction: any byte-oriented channel.
//!
//! Concrete implementations:
//! - UART0 USB serial (host application)
//! - UART1 Bluetooth SPP module
//!
//! [`SerialLink`] pairs a transport with its own [`Framer`], feeds
//! completed frames into the shared [`CommandQueue`], and implements
//! [`ResponseSink`] so replies can be broadcast to every link.
//!
//! A link stops reading while the queue is full.  Unread bytes stay in
//! the transport's receive buffer; bytes already read are parked in the
//! link and framed on a later poll.

use heapless::Vec;
use log::warn;

use crate::app::ports::ResponseSink;
use crate::protocol::frame::Framer;
use crate::protocol::queue::CommandQueue;

/// Byte-oriented transport channel.
pub trait Transport {
    /// Error type for this transport.
    type Error: core::fmt::Debug;

    /// Read up to `buf.len()` bytes into `buf`.
    /// Returns the number of bytes actually read.
    /// Returns 0 if no data is available (non-blocking).
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error>;

    /// Write `data` to the transport.
    /// Returns the number of bytes actually written.
    fn write(&mut self, data: &[u8]) -> Result<usize, Self::Error>;

    /// Flush any buffered output.
    fn flush(&mut self) -> Result<(), Self::Error>;
}

/// A null transport that discards all writes and never reads.
/// Stands in for the Bluetooth link on boards without the module.
pub struct NullTransport;

impl Transport for NullTransport {
    type Error = ();

    fn read(&mut self, _buf: &mut [u8]) -> Result<usize, ()> {
        Ok(0)
    }

    fn write(&mut self, data: &[u8]) -> Result<usize, ()> {
        Ok(data.len())
    }

    fn flush(&mut self) -> Result<(), ()> {
        Ok(())
    }
}

const READ_CHUNK: usize = 32;

/// One command channel: transport plus framing state.
pub struct SerialLink<T: Transport> {
    name: &'static str,
    transport: T,
    framer: Framer,
    /// Bytes read but not yet framed because the queue filled up.
    pending: Vec<u8, READ_CHUNK>,
}

impl<T: Transport> SerialLink<T> {
    pub fn new(name: &'static str, transport: T) -> Self {
        Self {
            name,
            transport,
            framer: Framer::new(),
            pending: Vec::new(),
        }
    }

    /// Move buffered bytes into `queue` until the transport is empty or
    /// the queue is full.  Returns the number of frames enqueued.
    pub fn poll(&mut self, queue: &mut CommandQueue) -> usize {
        let mut enqueued = 0;

        if !self.pending.is_empty() {
            let used = frame_into(&mut self.framer, &self.pending, queue, &mut enqueued);
            self.pending = Vec::from_slice(&self.pending[used..]).unwrap_or_default();
            if !self.pending.is_empty() {
                return enqueued;
            }
        }

        let mut buf = [0u8; READ_CHUNK];
        while !queue.is_full() {
            let n = match self.transport.read(&mut buf) {
                Ok(0) => break,
                Ok(n) => n.min(READ_CHUNK),
                Err(e) => {
                    warn!("{}: read error {:?}", self.name, e);
                    self.framer.reset();
                    break;
                }
            };
            let used = frame_into(&mut self.framer, &buf[..n], queue, &mut enqueued);
            if used < n {
                // `pending` is empty here and `n - used` ≤ READ_CHUNK.
                let _ = self.pending.extend_from_slice(&buf[used..n]);
                break;
            }
        }
        enqueued
    }

    /// Bytes held back while the queue was full.
    pub fn pending(&self) -> usize {
        self.pending.len()
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }
}

/// Frame `data` into `queue`, stopping before the first byte that arrives
/// while the queue is full.  Returns the number of bytes consumed.
fn frame_into(
    framer: &mut Framer,
    data: &[u8],
    queue: &mut CommandQueue,
    enqueued: &mut usize,
) -> usize {
    for (i, &b) in data.iter().enumerate() {
        if queue.is_full() {
            return i;
        }
        if let Some(frame) = framer.push(b) {
            if queue.push(frame) {
                *enqueued += 1;
            }
        }
    }
    data.len()
}

impl<T: Transport> ResponseSink for SerialLink<T> {
    fn send(&mut self, response: &str) {
        let mut remaining = response.as_bytes();
        while !remaining.is_empty() {
            match self.transport.write(remaining) {
                Ok(0) => {
                    warn!("{}: transport stalled, reply truncated", self.name);
                    break;
                }
                Ok(n) => remaining = &remaining[n.min(remaining.len())..],
                Err(e) => {
                    warn!("{}: write error {:?}", self.name, e);
                    return;
                }
            }
        }
        if let Err(e) = self.transport.flush() {
            warn!("{}: flush error {:?}", self.name, e);
        }
    }
}
