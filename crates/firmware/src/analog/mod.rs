//! Multi-channel analog sampling engine.
//!
//! Each converter unit repeatedly scans a table of enabled channels. A
//! two-stage DMA chain feeds the sequencer and drains the results with no
//! per-sample CPU work; a single scheduler task re-arms units and dispatches
//! results to per-channel callbacks, rate-limited by a per-channel interval.
//!
//! ```text
//! enable_channel ──▶ ChannelRegistry ──▶ ConverterUnit ──▶ DmaBridge ──▶ converter
//!                                             ▲                              │
//!        ScanScheduler ◀── ScanWake ◀── on_result_ready ◀── drain complete ◀─┘
//!             │
//!             └──▶ execute_callbacks ──▶ user callbacks
//! ```
//!
//! [`AnalogIn`] owns the units and is expected to live in a `static`
//! (typically via `StaticCell`), so interrupt handlers and the scheduler can
//! share it.

use core::cell::Cell;
use core::sync::atomic::{AtomicU32, Ordering};

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::blocking_mutex::Mutex;
use platform::config::CONVERTER_UNITS;
use platform::{AdcInput, AnalogPeripheral, TickSource, Ticks};

pub mod bridge;
pub mod dispatch;
pub mod error;
pub mod registry;
pub mod scheduler;
pub mod unit;
pub mod wake;

pub use bridge::DmaBridge;
pub use dispatch::should_fire;
pub use error::AnalogError;
pub use registry::{ChannelRegistry, InputId};
pub use scheduler::{IterationOutcome, ScanScheduler, ScanTiming, SweepOutcome};
pub use unit::{AnalogCallback, CallbackParam, ConverterUnit, ScanState, SlotInfo};
pub use wake::ScanWake;

/// Hook run by the scheduler once per sweep (e.g. a watchdog feed).
pub type TaskHook = fn();

/// Unit placement for an on-die sensor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum UnitHint {
    /// First unit with a free slot.
    #[default]
    Any,
    /// This unit only.
    Unit(u8),
}

/// Scan counters across all units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ScanDiagnostics {
    /// Scans armed.
    pub scans_started: u32,
    /// Scans whose drain completed.
    pub scans_completed: u32,
    /// Scheduler waits that timed out without a wake.
    pub missed_scans: u32,
}

/// Analog input engine: board registry, converter units and shared wake.
pub struct AnalogIn<P, T, const UNITS: usize = CONVERTER_UNITS> {
    units: [ConverterUnit<P>; UNITS],
    registry: ChannelRegistry,
    clock: T,
    wake: ScanWake,
    missed_scans: AtomicU32,
    hook: Mutex<CriticalSectionRawMutex, Cell<Option<TaskHook>>>,
}

impl<P: AnalogPeripheral, T: TickSource, const UNITS: usize> AnalogIn<P, T, UNITS> {
    /// Assemble an engine. Unit `i` of `units` must have index `i`.
    pub const fn new(units: [ConverterUnit<P>; UNITS], registry: ChannelRegistry, clock: T) -> Self {
        Self {
            units,
            registry,
            clock,
            wake: ScanWake::new(),
            missed_scans: AtomicU32::new(0),
            hook: Mutex::new(Cell::new(None)),
        }
    }

    /// Enable the input `id` for continuous sampling.
    ///
    /// `callback` (if any) receives the raw code at most once per `interval`
    /// ticks; 0 means every scan. The interval is measured from now.
    pub fn enable_channel(
        &self,
        id: InputId,
        callback: Option<AnalogCallback>,
        param: CallbackParam,
        interval: Ticks,
    ) -> Result<(), AnalogError> {
        #[cfg_attr(not(feature = "defmt"), allow(unused_variables))]
        let input = self.registry.enable_channel(
            &self.units,
            id,
            callback,
            param,
            interval,
            self.clock.now_ticks(),
        )?;
        #[cfg(feature = "defmt")]
        defmt::debug!(
            "analog: input {=usize} enabled on ADC{=u8} ch {=u8}",
            id,
            input.unit,
            input.channel
        );
        Ok(())
    }

    /// Whether input `id` is being sampled.
    pub fn is_channel_enabled(&self, id: InputId) -> bool {
        self.registry.is_channel_enabled(&self.units, id)
    }

    /// Most recent raw code for input `id`, or 0 if none.
    pub fn read_channel(&self, id: InputId) -> u16 {
        self.registry.read_channel(&self.units, id)
    }

    /// Most recent raw code for a (unit, channel) identity, or 0 if none.
    pub fn read_input(&self, input: AdcInput) -> u16 {
        registry::read_input(&self.units, input)
    }

    /// Enable on-die sensor `sensor` (0 = PTAT, 1 = CTAT).
    ///
    /// With [`UnitHint::Any`] the sensor goes on the first unit with a free
    /// slot; `UnitFull` only when every unit is full.
    pub fn enable_internal_sensor(
        &self,
        sensor: u8,
        callback: Option<AnalogCallback>,
        param: CallbackParam,
        interval: Ticks,
        hint: UnitHint,
    ) -> Result<(), AnalogError> {
        let now = self.clock.now_ticks();
        match hint {
            UnitHint::Unit(index) => self
                .unit(usize::from(index))
                .ok_or(AnalogError::UnknownUnit)?
                .enable_internal_sensor(sensor, callback, param, interval, now),
            UnitHint::Any => {
                let mut result = Err(AnalogError::UnitFull);
                for unit in &self.units {
                    result = unit.enable_internal_sensor(sensor, callback, param, interval, now);
                    if result != Err(AnalogError::UnitFull) {
                        break;
                    }
                }
                result
            }
        }
    }

    /// Converter units, in index order.
    pub fn units(&self) -> &[ConverterUnit<P>] {
        &self.units
    }

    /// Unit `index`.
    pub fn unit(&self, index: usize) -> Option<&ConverterUnit<P>> {
        self.units.get(index)
    }

    /// Board registry.
    pub fn registry(&self) -> &ChannelRegistry {
        &self.registry
    }

    /// Tick source.
    pub fn clock(&self) -> &T {
        &self.clock
    }

    /// Wake signal given by every unit's completion interrupt.
    pub fn wake(&self) -> &ScanWake {
        &self.wake
    }

    /// DMA interrupt entry point for unit `index`.
    pub fn on_dma_interrupt(&self, index: usize) -> bool {
        self.unit(index).is_some_and(ConverterUnit::on_dma_interrupt)
    }

    /// Install `hook`, returning the one it replaces.
    pub fn set_task_hook(&self, hook: Option<TaskHook>) -> Option<TaskHook> {
        self.hook.lock(|cell| cell.replace(hook))
    }

    pub(crate) fn run_task_hook(&self) {
        if let Some(hook) = self.hook.lock(Cell::get) {
            hook();
        }
    }

    pub(crate) fn record_missed_scan(&self) -> u32 {
        self.missed_scans
            .fetch_add(1, Ordering::Relaxed)
            .wrapping_add(1)
    }

    /// Scan counters summed across units.
    pub fn diagnostics(&self) -> ScanDiagnostics {
        let mut diagnostics = ScanDiagnostics {
            missed_scans: self.missed_scans.load(Ordering::Relaxed),
            ..ScanDiagnostics::default()
        };
        for unit in &self.units {
            diagnostics.scans_started = diagnostics.scans_started.wrapping_add(unit.scans_started());
            diagnostics.scans_completed =
                diagnostics.scans_completed.wrapping_add(unit.scans_completed());
        }
        diagnostics
    }
}
