//! Cooperative loop scheduler.
//!
//! One control-loop pass asks the scheduler which activities are due and
//! runs them in a fixed order.  Nothing blocks and nothing pre-empts.
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │  loop pass (now_ms)                                          │
//! │                                                              │
//! │  1. command drain ─────────── every pass, one frame          │
//! │  2. switch poll ───────────── every SWITCH_POLL_MS           │
//! │  3. acquisition ───────────── every ACQUISITION_INTERVAL_MS  │
//! │        Idle ──▶ RequestSent ──▶ ResultReady ──▶ Idle          │
//! │        (request)   (next tick: read)  (processed)             │
//! │  4. display page ──────────── every page duration (if on)    │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! Timers use a free-running `u32` millisecond clock that wraps after
//! ~49.7 days.  A reading earlier than the last check counts as due, so a
//! wrap costs at most one early firing instead of a 49-day stall.

pub const SWITCH_POLL_MS: u32 = 1000;
pub const ACQUISITION_INTERVAL_MS: u32 = 1000;

// ═══════════════════════════════════════════════════════════════
//  Interval timer
// ═══════════════════════════════════════════════════════════════

/// Wraparound-tolerant elapsed-time gate.
#[derive(Debug, Clone, Copy, Default)]
pub struct IntervalTimer {
    last_ms: Option<u32>,
}

impl IntervalTimer {
    pub const fn new() -> Self {
        Self { last_ms: None }
    }

    /// A timer whose first period starts at `now_ms`.
    pub const fn started_at(now_ms: u32) -> Self {
        Self {
            last_ms: Some(now_ms),
        }
    }

    /// `true` (and re-armed at `now_ms`) when more than `period_ms` has
    /// elapsed or the clock has wrapped.  A never-fired timer is due.
    pub fn is_due(&mut self, now_ms: u32, period_ms: u32) -> bool {
        let due = match self.last_ms {
            None => true,
            Some(last) => now_ms < last || now_ms - last > period_ms,
        };
        if due {
            self.last_ms = Some(now_ms);
        }
        due
    }

    pub fn reset(&mut self, now_ms: u32) {
        self.last_ms = Some(now_ms);
    }
}

// ═══════════════════════════════════════════════════════════════
//  Two-phase acquisition
// ═══════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AcquisitionPhase {
    #[default]
    Idle,
    /// Conversions requested; results available next interval.
    RequestSent,
    /// Results read this pass; processed before returning to `Idle`.
    ResultReady,
}

/// What the control loop must do for acquisition on this tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AcquisitionStep {
    /// Phase A: issue probe conversion requests.
    Request,
    /// Phase B: read probes and ambient sensor, run the channel update.
    Read,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct AcquisitionCycle {
    phase: AcquisitionPhase,
}

impl AcquisitionCycle {
    pub fn phase(&self) -> AcquisitionPhase {
        self.phase
    }

    /// Advance on an elapsed acquisition interval.
    pub fn on_interval(&mut self) -> AcquisitionStep {
        match self.phase {
            AcquisitionPhase::Idle | AcquisitionPhase::ResultReady => {
                self.phase = AcquisitionPhase::RequestSent;
                AcquisitionStep::Request
            }
            AcquisitionPhase::RequestSent => {
                self.phase = AcquisitionPhase::ResultReady;
                AcquisitionStep::Read
            }
        }
    }

    /// Results have been consumed.
    pub fn complete(&mut self) {
        if self.phase == AcquisitionPhase::ResultReady {
            self.phase = AcquisitionPhase::Idle;
        }
    }
}

// ═══════════════════════════════════════════════════════════════
//  Loop scheduler
// ═══════════════════════════════════════════════════════════════

/// Activities due on one pass.  The command drain is always due and is
/// not represented here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DueActivities {
    pub switches: bool,
    pub acquisition: Option<AcquisitionStep>,
    pub display: bool,
}

#[derive(Debug, Default)]
pub struct LoopScheduler {
    switches: IntervalTimer,
    acquisition_timer: IntervalTimer,
    display: IntervalTimer,
    acquisition: AcquisitionCycle,
}

impl LoopScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Evaluate every timer for this pass.
    ///
    /// The switch timer only re-arms when switches are actually polled, and
    /// the display timer only runs while the display is enabled.
    pub fn poll(
        &mut self,
        now_ms: u32,
        page_duration_ms: u16,
        switches_enabled: bool,
        display_enabled: bool,
    ) -> DueActivities {
        let switches = switches_enabled && self.switches.is_due(now_ms, SWITCH_POLL_MS);
        let acquisition = self
            .acquisition_timer
            .is_due(now_ms, ACQUISITION_INTERVAL_MS)
            .then(|| self.acquisition.on_interval());
        let display = display_enabled && self.display.is_due(now_ms, u32::from(page_duration_ms));

        DueActivities {
            switches,
            acquisition,
            display,
        }
    }

    pub fn acquisition_phase(&self) -> AcquisitionPhase {
        self.acquisition.phase()
    }

    pub fn acquisition_complete(&mut self) {
        self.acquisition.complete();
    }
}
