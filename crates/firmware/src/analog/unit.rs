//! Converter unit: slot table, result buffer and scan state machine.
//!
//! # State machine
//!
//! ```text
//!  NoChannels ──enable──▶ Starting ──start──▶ Converting ──ISR──▶ Ready
//!                                                 ▲                 │
//!                                                 └──start── Idle ◀─┘ execute_callbacks
//! ```
//!
//! # Locking
//!
//! Two critical sections, never held across an await:
//!
//! - `table` guards the slot list. It is shared by [`ConverterUnit::enable_channel`]
//!   (any task) and [`ConverterUnit::execute_callbacks`] (scheduler task), so the
//!   scheduler never sees a partially appended slot. It only covers copies in
//!   and out of the table: neither user callbacks nor hardware bring-up run
//!   inside it.
//! - `hardware` guards the peripheral and the wake handle. It is taken by the
//!   scheduler when arming a scan and by the DMA completion interrupt.
//!
//! The state word is the only thing the interrupt publishes to the task. It
//! is stored with release ordering after the drain DMA has finished and read
//! with acquire ordering before the result buffer is copied out.

use core::cell::RefCell;
use core::sync::atomic::{AtomicU32, AtomicU8, AtomicUsize, Ordering};

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::blocking_mutex::Mutex;
use heapless::Vec;
use platform::adc::{MUXPOS_EXTERNAL_MAX, MUXPOS_PTAT};
use platform::config::{INTERNAL_SENSOR_COUNT, MAX_CHANNELS_PER_UNIT};
use platform::{AnalogPeripheral, ReferenceSelect, SamplingConfig, SequenceEntry, Ticks};

use super::bridge::DmaBridge;
use super::dispatch::should_fire;
use super::error::AnalogError;
use super::wake::ScanWake;

/// Function invoked with a channel's raw code when its interval has elapsed.
pub type AnalogCallback = fn(CallbackParam, u16);

/// Opaque value handed back to an [`AnalogCallback`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct CallbackParam(pub usize);

// ── ScanState ────────────────────────────────────────────────────────────────

/// Conversion state of a unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum ScanState {
    /// Nothing enabled; hardware untouched.
    NoChannels = 0,
    /// Hardware programmed, no scan started yet.
    Starting = 1,
    /// Results consumed, waiting to be re-armed.
    Idle = 2,
    /// Scan in flight; the drain DMA owns the result buffer.
    Converting = 3,
    /// Scan complete; results waiting for dispatch.
    Ready = 4,
}

impl ScanState {
    fn from_bits(bits: u8) -> Self {
        match bits {
            1 => Self::Starting,
            2 => Self::Idle,
            3 => Self::Converting,
            4 => Self::Ready,
            _ => Self::NoChannels,
        }
    }
}

// ── Slots ────────────────────────────────────────────────────────────────────

#[derive(Clone, Copy)]
struct ChannelSlot {
    channel: u8,
    callback: Option<AnalogCallback>,
    param: CallbackParam,
    interval: Ticks,
    last_fired: Ticks,
    last_result: u16,
}

/// Read-only view of one slot, for diagnostics and tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SlotInfo {
    /// Mux channel sampled by this slot.
    pub channel: u8,
    /// Sequencer pair streamed for this slot.
    pub entry: SequenceEntry,
    /// Whether a callback is registered.
    pub has_callback: bool,
    /// Parameter passed to the callback.
    pub param: CallbackParam,
    /// Minimum ticks between callback invocations.
    pub interval: Ticks,
    /// Tick of the last invocation (or of enabling).
    pub last_fired: Ticks,
    /// Code from the most recent completed scan.
    pub last_result: u16,
}

/// Callback due in the current dispatch, copied out of the table.
type DueCallback = (AnalogCallback, CallbackParam, u16);

struct SlotTable {
    slots: Vec<ChannelSlot, MAX_CHANNELS_PER_UNIT>,
    enabled: u32,
}

impl SlotTable {
    const fn new() -> Self {
        Self {
            slots: Vec::new(),
            enabled: 0,
        }
    }
}

struct UnitHardware<P> {
    peripheral: P,
    wake: Option<&'static ScanWake>,
}

/// Registration request for one channel.
#[derive(Clone, Copy)]
struct SlotRequest {
    entry: SequenceEntry,
    callback: Option<AnalogCallback>,
    param: CallbackParam,
    interval: Ticks,
    now: Ticks,
}

fn channel_bit(mux: u8) -> u32 {
    1u32.checked_shl(u32::from(mux)).unwrap_or(0)
}

// ── ConverterUnit ────────────────────────────────────────────────────────────

/// One physical converter instance and its DMA chain.
pub struct ConverterUnit<P> {
    index: u8,
    config: SamplingConfig,
    state: AtomicU8,
    armed: AtomicUsize,
    table: Mutex<CriticalSectionRawMutex, RefCell<SlotTable>>,
    hardware: Mutex<CriticalSectionRawMutex, RefCell<UnitHardware<P>>>,
    bridge: DmaBridge,
    scans_started: AtomicU32,
    scans_completed: AtomicU32,
}

impl<P: AnalogPeripheral> ConverterUnit<P> {
    /// Create unit `index` driving `peripheral`. The hardware is not touched
    /// until the first channel is enabled.
    pub const fn new(index: u8, peripheral: P, config: SamplingConfig) -> Self {
        Self {
            index,
            config,
            state: AtomicU8::new(ScanState::NoChannels as u8),
            armed: AtomicUsize::new(0),
            table: Mutex::new(RefCell::new(SlotTable::new())),
            hardware: Mutex::new(RefCell::new(UnitHardware {
                peripheral,
                wake: None,
            })),
            bridge: DmaBridge::new(),
            scans_started: AtomicU32::new(0),
            scans_completed: AtomicU32::new(0),
        }
    }

    /// Unit index.
    pub fn index(&self) -> u8 {
        self.index
    }

    /// Current state.
    pub fn state(&self) -> ScanState {
        ScanState::from_bits(self.state.load(Ordering::Acquire))
    }

    /// Number of slots in the table.
    pub fn channel_count(&self) -> usize {
        self.table.lock(|table| table.borrow().slots.len())
    }

    /// Whether at least one slot samples mux `channel`.
    pub fn is_channel_enabled(&self, channel: u8) -> bool {
        let bit = channel_bit(channel);
        bit != 0 && self.table.lock(|table| table.borrow().enabled & bit != 0)
    }

    /// Code from the most recent scan for mux `channel`, or 0 if that channel
    /// is not enabled or has not completed a scan.
    pub fn read_channel(&self, channel: u8) -> u16 {
        self.table.lock(|table| {
            table
                .borrow()
                .slots
                .iter()
                .find(|slot| slot.channel == channel)
                .map_or(0, |slot| slot.last_result)
        })
    }

    /// View of slot `slot`.
    pub fn slot(&self, slot: usize) -> Option<SlotInfo> {
        let entry = self.bridge.entry(slot)?;
        self.table.lock(|table| {
            table.borrow().slots.get(slot).map(|s| SlotInfo {
                channel: s.channel,
                entry,
                has_callback: s.callback.is_some(),
                param: s.param,
                interval: s.interval,
                last_fired: s.last_fired,
                last_result: s.last_result,
            })
        })
    }

    /// Scans started on this unit.
    pub fn scans_started(&self) -> u32 {
        self.scans_started.load(Ordering::Relaxed)
    }

    /// Scans completed on this unit.
    pub fn scans_completed(&self) -> u32 {
        self.scans_completed.load(Ordering::Relaxed)
    }

    /// Append a slot sampling external mux `channel`.
    ///
    /// The same channel may be enabled more than once; each call adds a slot
    /// and the channel is converted once per slot.
    pub fn enable_channel(
        &self,
        channel: u8,
        callback: Option<AnalogCallback>,
        param: CallbackParam,
        interval: Ticks,
        now: Ticks,
    ) -> Result<(), AnalogError> {
        if channel > MUXPOS_EXTERNAL_MAX {
            return Err(AnalogError::UnsupportedInput);
        }
        self.add_slot(SlotRequest {
            entry: SequenceEntry::single_ended(channel, self.config.reference),
            callback,
            param,
            interval,
            now,
        })
    }

    /// Append a slot sampling on-die temperature sensor `sensor` (0 = PTAT, 1 = CTAT).
    pub fn enable_internal_sensor(
        &self,
        sensor: u8,
        callback: Option<AnalogCallback>,
        param: CallbackParam,
        interval: Ticks,
        now: Ticks,
    ) -> Result<(), AnalogError> {
        if sensor >= INTERNAL_SENSOR_COUNT {
            return Err(AnalogError::UnsupportedInput);
        }
        self.add_slot(SlotRequest {
            entry: SequenceEntry::single_ended(
                MUXPOS_PTAT.saturating_add(sensor),
                ReferenceSelect::IntVcc1,
            ),
            callback,
            param,
            interval,
            now,
        })
    }

    fn add_slot(&self, request: SlotRequest) -> Result<(), AnalogError> {
        let first = self.table.lock(|table| {
            let mut table = table.borrow_mut();
            let slot = table.slots.len();
            if slot >= MAX_CHANNELS_PER_UNIT || !self.bridge.write_entry(slot, request.entry) {
                return Err(AnalogError::UnitFull);
            }
            let mux = request.entry.mux();
            table
                .slots
                .push(ChannelSlot {
                    channel: mux,
                    callback: request.callback,
                    param: request.param,
                    interval: request.interval,
                    last_fired: request.now,
                    last_result: 0,
                })
                .map_err(|_| AnalogError::UnitFull)?;
            table.enabled |= channel_bit(mux);
            Ok(slot == 0)
        })?;
        if first {
            self.bring_up();
        }
        Ok(())
    }

    /// Reset the converter and program both descriptors. Runs once, after the
    /// first slot is appended. The unit stays in [`ScanState::NoChannels`],
    /// and so cannot be armed, until this returns.
    fn bring_up(&self) {
        self.hardware.lock(|hw| {
            let mut hw = hw.borrow_mut();
            hw.peripheral.reset(&self.config);
            hw.peripheral.program_sequence();
        });
        self.state
            .store(ScanState::Starting as u8, Ordering::Release);
        #[cfg(feature = "defmt")]
        defmt::debug!("ADC{=u8}: converter and DMA chain configured", self.index);
    }

    /// Arm a scan of every slot currently in the table.
    ///
    /// Refuses (without queueing a retry) when the table is empty or a scan
    /// is already in flight. Only the scheduler task calls this, so checking
    /// the state is enough to keep at most one scan outstanding. `wake` is
    /// signalled from the completion interrupt.
    pub fn start_conversion(
        &'static self,
        wake: Option<&'static ScanWake>,
    ) -> Result<(), AnalogError> {
        let channels = self.channel_count();
        if channels == 0 {
            return Err(AnalogError::NoChannels);
        }
        self.hardware.lock(|hw| {
            match self.state() {
                ScanState::NoChannels => return Err(AnalogError::NoChannels),
                ScanState::Converting => return Err(AnalogError::ScanInProgress),
                ScanState::Starting | ScanState::Idle | ScanState::Ready => {}
            }
            let mut hw = hw.borrow_mut();
            hw.wake = wake;
            self.armed.store(channels, Ordering::Relaxed);
            // Converting must be visible before the drain can complete.
            self.state
                .store(ScanState::Converting as u8, Ordering::Release);
            self.bridge.arm(&mut hw.peripheral, channels);
            Ok(())
        })?;
        self.scans_started.fetch_add(1, Ordering::Relaxed);
        #[cfg(feature = "defmt")]
        defmt::trace!("ADC{=u8}: scan of {=usize} channels started", self.index, channels);
        Ok(())
    }

    /// Drain-complete handler. Interrupt context: bounded, no allocation,
    /// never blocks.
    ///
    /// Always moves the unit to [`ScanState::Ready`]; slots appended meanwhile
    /// are picked up by the next scan.
    pub fn on_result_ready(&self) {
        self.hardware.lock(|hw| self.complete_scan(&mut hw.borrow_mut()));
    }

    /// DMA interrupt entry point: completes the scan if the drain transfer
    /// has finished and the unit is converting. Returns whether it did.
    ///
    /// A completion flag raised while the unit is not converting is
    /// acknowledged and otherwise ignored.
    pub fn on_dma_interrupt(&self) -> bool {
        self.hardware.lock(|hw| {
            let mut hw = hw.borrow_mut();
            if !hw.peripheral.is_transfer_complete() {
                return false;
            }
            if self.state() != ScanState::Converting {
                hw.peripheral.disable_sequencer();
                return false;
            }
            self.complete_scan(&mut hw);
            true
        })
    }

    fn complete_scan(&self, hw: &mut UnitHardware<P>) {
        // Guards against a re-trigger if the sequencer got ahead of the drain.
        hw.peripheral.disable_sequencer();
        self.state.store(ScanState::Ready as u8, Ordering::Release);
        self.scans_completed.fetch_add(1, Ordering::Relaxed);
        if let Some(wake) = hw.wake {
            wake.give_from_isr();
        }
    }

    /// Copy the completed scan into the slot table and fire due callbacks.
    ///
    /// Every slot that took part in the scan gets its last result refreshed,
    /// whether or not its callback fires. Does nothing and returns `false`
    /// unless the unit is [`ScanState::Ready`].
    ///
    /// Results and fire times are committed first; the due callbacks then run
    /// in slot order with no lock held, so they may read or enable channels.
    pub fn execute_callbacks(&self, now: Ticks) -> bool {
        if self.state() != ScanState::Ready {
            return false;
        }
        let armed = self.armed.load(Ordering::Relaxed);
        let due = self.table.lock(|table| {
            let mut table = table.borrow_mut();
            let mut due: Vec<DueCallback, MAX_CHANNELS_PER_UNIT> = Vec::new();
            for (index, slot) in table.slots.iter_mut().enumerate().take(armed) {
                let code = self.bridge.result(index);
                slot.last_result = code;
                if should_fire(now, slot.last_fired, slot.interval) {
                    slot.last_fired = now;
                    if let Some(callback) = slot.callback {
                        // The table and `due` share one capacity.
                        if due.push((callback, slot.param, code)).is_err() {
                            break;
                        }
                    }
                }
            }
            due
        });
        for (callback, param, code) in due {
            callback(param, code);
        }
        self.state.store(ScanState::Idle as u8, Ordering::Release);
        true
    }
}

// ── Tests ────────────────────────────────────────────────────────────────────
