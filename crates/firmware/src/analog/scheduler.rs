//! Scan scheduler: the one task that re-arms units and dispatches results.
//!
//! Each iteration sweeps every unit:
//!
//! | State                  | Action                                  |
//! |------------------------|-----------------------------------------|
//! | `Ready`                | dispatch callbacks, then start a scan   |
//! | `Idle` / `Starting`    | start a scan                            |
//! | `Converting`           | leave it alone                          |
//! | `NoChannels`           | nothing to do                           |
//!
//! then runs the task hook. If a scan is outstanding the task waits on the
//! shared [`ScanWake`](super::ScanWake), bounded by
//! [`ScanTiming::wake_timeout`]; otherwise it backs off for
//! [`ScanTiming::idle_backoff`]. A unit that never completes only ever costs
//! one timeout per iteration and shows up in the missed-scan counter.

use embassy_time::{with_timeout, Duration, Timer};
use platform::config::{IDLE_BACKOFF_MS, SETTLE_DELAY_MS, WAKE_TIMEOUT_MS};
use platform::{AnalogPeripheral, TickSource};

use super::unit::{ConverterUnit, ScanState};
use super::AnalogIn;

/// Scheduler delays.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScanTiming {
    /// Upper bound on one wait for a completion.
    pub wake_timeout: Duration,
    /// Pause after a completion before the next sweep.
    pub settle_delay: Duration,
    /// Pause between sweeps when nothing is converting.
    pub idle_backoff: Duration,
}

impl Default for ScanTiming {
    fn default() -> Self {
        Self {
            wake_timeout: Duration::from_millis(WAKE_TIMEOUT_MS),
            settle_delay: Duration::from_millis(SETTLE_DELAY_MS),
            idle_backoff: Duration::from_millis(IDLE_BACKOFF_MS),
        }
    }
}

/// What one sweep did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SweepOutcome {
    /// Units whose results were dispatched.
    pub dispatched: usize,
    /// Units on which a scan was started.
    pub started: usize,
    /// Units left converting from an earlier sweep.
    pub in_flight: usize,
}

impl SweepOutcome {
    /// Whether the task should wait for a completion.
    pub fn awaiting_completion(&self) -> bool {
        self.started > 0 || self.in_flight > 0
    }
}

/// How one scheduler iteration ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum IterationOutcome {
    /// Woken by this many completions.
    Woken(u32),
    /// The wake wait timed out.
    TimedOut,
    /// Nothing to convert; backed off.
    Idle,
}

/// Scheduler bound to one engine.
pub struct ScanScheduler<P: 'static, T: 'static, const UNITS: usize> {
    engine: &'static AnalogIn<P, T, UNITS>,
    timing: ScanTiming,
}

impl<P: AnalogPeripheral + 'static, T: TickSource + 'static, const UNITS: usize> ScanScheduler<P, T, UNITS> {
    /// Create a scheduler for `engine`.
    pub fn new(engine: &'static AnalogIn<P, T, UNITS>, timing: ScanTiming) -> Self {
        Self { engine, timing }
    }

    /// Delays in use.
    pub fn timing(&self) -> ScanTiming {
        self.timing
    }

    /// One pass over all units, followed by the task hook. Never waits.
    pub fn sweep(&self) -> SweepOutcome {
        let now = self.engine.clock().now_ticks();
        let mut outcome = SweepOutcome::default();
        for unit in self.engine.units() {
            match unit.state() {
                ScanState::Ready => {
                    if unit.execute_callbacks(now) {
                        outcome.dispatched = outcome.dispatched.saturating_add(1);
                    }
                    self.start(unit, &mut outcome);
                }
                ScanState::Idle | ScanState::Starting => self.start(unit, &mut outcome),
                ScanState::Converting => {
                    outcome.in_flight = outcome.in_flight.saturating_add(1);
                }
                ScanState::NoChannels => {}
            }
        }
        self.engine.run_task_hook();
        outcome
    }

    fn start(&self, unit: &'static ConverterUnit<P>, outcome: &mut SweepOutcome) {
        // Refusals are not retried here; the next sweep sees the new state.
        if unit.start_conversion(Some(self.engine.wake())).is_ok() {
            outcome.started = outcome.started.saturating_add(1);
        }
    }

    /// Sweep, then wait for a completion or back off.
    pub async fn run_iteration(&self) -> IterationOutcome {
        let sweep = self.sweep();
        if !sweep.awaiting_completion() {
            Timer::after(self.timing.idle_backoff).await;
            return IterationOutcome::Idle;
        }

        if let Ok(gives) = with_timeout(self.timing.wake_timeout, self.engine.wake().take()).await {
            Timer::after(self.timing.settle_delay).await;
            IterationOutcome::Woken(gives)
        } else {
            #[cfg_attr(not(any(feature = "defmt", feature = "emulator")), allow(unused_variables))]
            let missed = self.engine.record_missed_scan();
            #[cfg(feature = "defmt")]
            defmt::warn!("analog: no scan completion within timeout ({=u32} missed)", missed);
            #[cfg(feature = "emulator")]
            tracing::warn!(missed, "analog: no scan completion within timeout");
            IterationOutcome::TimedOut
        }
    }

    /// Run forever.
    pub async fn run(self) -> ! {
        loop {
            self.run_iteration().await;
        }
    }
}
