//! Monotonic millisecond clock for the control loop.
//!
//! The loop scheduler works on a wrapping `u32` millisecond count.
//!
//! - **`target_os = "espidf"`**: `esp_timer_get_time()` (µs since boot).
//! - **`not(target_os = "espidf")`**: `std::time::Instant` since first use.

/// Milliseconds since boot, wrapping roughly every 49.7 days.
#[cfg(target_os = "espidf")]
pub fn uptime_ms() -> u32 {
    // SAFETY: reads the free-running high-resolution timer.
    let us = unsafe { esp_idf_svc::sys::esp_timer_get_time() };
    (us / 1_000) as u32
}

/// Milliseconds since first call, wrapping like the target clock.
#[cfg(not(target_os = "espidf"))]
pub fn uptime_ms() -> u32 {
    use std::sync::OnceLock;
    use std::time::Instant;

    static START: OnceLock<Instant> = OnceLock::new();
    START.get_or_init(Instant::now).elapsed().as_millis() as u32
}
