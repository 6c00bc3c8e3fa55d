//! UART transport for the command protocol.
//!
//! - **`target_os = "espidf"`**: non-blocking reads and writes through the
//!   IDF UART driver installed by `hw_init`.
//! - **`not(target_os = "espidf")`**: in-memory rx/tx queues so host
//!   tests and simulation can script traffic.

#[cfg(not(target_os = "espidf"))]
use std::collections::VecDeque;

use crate::protocol::transport::Transport;

#[cfg(target_os = "espidf")]
use esp_idf_svc::sys::*;

pub struct UartTransport {
    port: i32,
    #[cfg(not(target_os = "espidf"))]
    rx: VecDeque<u8>,
    #[cfg(not(target_os = "espidf"))]
    tx: Vec<u8>,
}

impl UartTransport {
    pub fn new(port: i32) -> Self {
        Self {
            port,
            #[cfg(not(target_os = "espidf"))]
            rx: VecDeque::new(),
            #[cfg(not(target_os = "espidf"))]
            tx: Vec::new(),
        }
    }

    pub fn port(&self) -> i32 {
        self.port
    }

    /// Queue bytes as if they had arrived on the wire.
    #[cfg(not(target_os = "espidf"))]
    pub fn inject(&mut self, bytes: &[u8]) {
        self.rx.extend(bytes);
    }

    /// Drain everything written so far.
    #[cfg(not(target_os = "espidf"))]
    pub fn take_output(&mut self) -> Vec<u8> {
        core::mem::take(&mut self.tx)
    }
}

impl Transport for UartTransport {
    type Error = i32;

    #[cfg(target_os = "espidf")]
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, i32> {
        let len = u32::try_from(buf.len()).unwrap_or(u32::MAX);
        // SAFETY: the driver for `port` was installed at boot; zero ticks
        // makes the call non-blocking.
        let n = unsafe { uart_read_bytes(self.port, buf.as_mut_ptr() as *mut _, len, 0) };
        usize::try_from(n).map_err(|_| n)
    }

    #[cfg(not(target_os = "espidf"))]
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, i32> {
        let n = buf.len().min(self.rx.len());
        for (dst, src) in buf.iter_mut().zip(self.rx.drain(..n)) {
            *dst = src;
        }
        Ok(n)
    }

    #[cfg(target_os = "espidf")]
    fn write(&mut self, data: &[u8]) -> Result<usize, i32> {
        // SAFETY: as above; the TX ring is unbuffered so this blocks until
        // the bytes are in the FIFO.
        let n = unsafe { uart_write_bytes(self.port, data.as_ptr() as *const _, data.len()) };
        usize::try_from(n).map_err(|_| n)
    }

    #[cfg(not(target_os = "espidf"))]
    fn write(&mut self, data: &[u8]) -> Result<usize, i32> {
        self.tx.extend_from_slice(data);
        Ok(data.len())
    }

    fn flush(&mut self) -> Result<(), i32> {
        Ok(())
    }
}
