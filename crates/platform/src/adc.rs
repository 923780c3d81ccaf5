//! Analog converter peripheral abstraction.
//!
//! The sampling engine never touches converter or DMA registers directly. It
//! drives an [`AnalogPeripheral`], which a board port implements on top of the
//! real registers and which [`crate::mocks::SimulatedConverter`] implements for
//! host tests.
//!
//! ## Sequencer words
//!
//! Each enabled channel contributes one [`SequenceEntry`]: an `INPUTCTRL`
//! word followed by a `REFCTRL` word. The sequencer feed DMA streams these
//! pairs into the converter, which auto-starts a conversion after each pair.
//!
//! | Mux position | Input                      |
//! |--------------|----------------------------|
//! | 0x00..=0x0F  | External pins AIN0..AIN15  |
//! | 0x1C         | PTAT die temperature sensor|
//! | 0x1D         | CTAT die temperature sensor|

use crate::dma::{ResultDrain, SequenceFeed};

// ── Register field encodings ─────────────────────────────────────────────────

/// `INPUTCTRL.MUXNEG` = GND (single-ended conversion).
pub const INPUTCTRL_MUXNEG_GND: u32 = 0x18 << 8;

/// Mask of the `INPUTCTRL.MUXPOS` field.
pub const INPUTCTRL_MUXPOS_MASK: u32 = 0x1F;

/// `MUXPOS` of the first internal die temperature sensor (PTAT).
pub const MUXPOS_PTAT: u8 = 0x1C;

/// Highest mux position usable by an external pin.
pub const MUXPOS_EXTERNAL_MAX: u8 = 0x0F;

// ── Input identity ───────────────────────────────────────────────────────────

/// Physical location of an analog input: which converter, which mux channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct AdcInput {
    /// Converter unit index.
    pub unit: u8,
    /// Mux channel on that unit.
    pub channel: u8,
}

impl AdcInput {
    /// Create an input on `unit`, mux `channel`.
    pub const fn new(unit: u8, channel: u8) -> Self {
        Self { unit, channel }
    }
}

// ── Reference / prescaler ────────────────────────────────────────────────────

/// Converter voltage reference selection (`REFCTRL.REFSEL`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ReferenceSelect {
    /// Internal bandgap reference.
    IntRef,
    /// 1/2 VDDANA.
    IntVcc0,
    /// VDDANA. Ratiometric with thermistor dividers.
    #[default]
    IntVcc1,
    /// External reference on VREFA.
    ArefA,
}

impl ReferenceSelect {
    /// Raw `REFSEL` field value.
    pub const fn bits(self) -> u32 {
        match self {
            Self::IntRef => 0x0,
            Self::IntVcc0 => 0x2,
            Self::IntVcc1 => 0x3,
            Self::ArefA => 0x4,
        }
    }
}

/// Converter clock prescaler (`CTRLA.PRESCALER`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Prescaler {
    /// Peripheral clock / 2
    Div2,
    /// Peripheral clock / 4
    Div4,
    /// Peripheral clock / 8
    Div8,
    /// Peripheral clock / 16
    Div16,
    /// Peripheral clock / 32
    #[default]
    Div32,
    /// Peripheral clock / 64
    Div64,
    /// Peripheral clock / 128
    Div128,
    /// Peripheral clock / 256
    Div256,
}

impl Prescaler {
    /// Raw `PRESCALER` field value.
    pub const fn bits(self) -> u8 {
        self as u8
    }
}

// ── SequenceEntry ────────────────────────────────────────────────────────────

/// One `(INPUTCTRL, REFCTRL)` pair streamed into the sequencer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SequenceEntry {
    /// `INPUTCTRL` register value (mux-select).
    pub input_ctrl: u32,
    /// `REFCTRL` register value (reference-select).
    pub ref_ctrl: u32,
}

impl SequenceEntry {
    /// Single-ended conversion of mux position `mux` against `reference`.
    pub const fn single_ended(mux: u8, reference: ReferenceSelect) -> Self {
        Self {
            input_ctrl: INPUTCTRL_MUXNEG_GND | (mux as u32 & INPUTCTRL_MUXPOS_MASK),
            ref_ctrl: reference.bits(),
        }
    }

    /// Mux position selected by this entry.
    #[allow(clippy::cast_possible_truncation)] // masked to 5 bits
    pub const fn mux(&self) -> u8 {
        (self.input_ctrl & INPUTCTRL_MUXPOS_MASK) as u8
    }
}

// ── SamplingConfig ───────────────────────────────────────────────────────────

/// Fixed sampling and timing parameters, applied once by [`AnalogPeripheral::reset`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SamplingConfig {
    /// Converter clock prescaler.
    pub prescaler: Prescaler,
    /// Sampling time in half converter clock cycles (`SAMPCTRL.SAMPLEN`).
    pub sample_length: u8,
    /// Hardware averaging (`AVGCTRL`); 0 disables it.
    pub averaging: u8,
    /// Default reference written to `REFCTRL` before the sequencer takes over.
    pub reference: ReferenceSelect,
    /// Window monitor lower threshold.
    pub window_lower: u16,
    /// Window monitor upper threshold.
    pub window_upper: u16,
    /// Gain correction, 1.11 fixed point (`1 << 11` is unity).
    pub gain_correction: u16,
    /// Offset correction, two's complement.
    pub offset_correction: u16,
}

impl SamplingConfig {
    /// Unity gain correction value.
    pub const UNITY_GAIN: u16 = 1 << 11;
}

impl Default for SamplingConfig {
    fn default() -> Self {
        Self {
            prescaler: Prescaler::Div32,
            sample_length: 10,
            averaging: 0,
            reference: ReferenceSelect::IntVcc1,
            window_lower: 0,
            window_upper: 0xFFFF,
            gain_correction: Self::UNITY_GAIN,
            offset_correction: 0,
        }
    }
}

// ── Peripheral trait ─────────────────────────────────────────────────────────

/// Converter peripheral plus its two chained DMA channels.
///
/// Descriptor A (sequencer feed) streams [`SequenceEntry`] words into the
/// converter's DMA sequencer with auto-start enabled, so no per-channel
/// software trigger is needed. Descriptor B (result drain) moves each
/// completed code into the unit's result buffer and raises an interrupt when
/// its block completes.
///
/// Implementations must not allocate or block in any method: `is_transfer_complete`
/// and `disable_sequencer` run in interrupt context.
pub trait AnalogPeripheral {
    /// Software-reset the converter and program the fixed timing parameters.
    ///
    /// Leaves the converter enabled with the DMA sequencer (INPUTCTRL + REFCTRL,
    /// auto-start) turned on.
    fn reset(&mut self, config: &SamplingConfig);

    /// One-time configuration of both DMA descriptors (trigger source, beat
    /// size, address increment, block-complete interrupt on the drain).
    fn program_sequence(&mut self);

    /// Read and drop whatever is in the result register.
    ///
    /// Must precede every [`arm_transfer`](Self::arm_transfer): a pending
    /// result would otherwise be drained as the first code of the next scan.
    fn discard_pending_result(&mut self);

    /// Re-arm both descriptors for `drain.beats` conversions and enable them.
    fn arm_transfer(&mut self, feed: SequenceFeed, drain: ResultDrain);

    /// Whether the drain transfer has completed its block.
    fn is_transfer_complete(&self) -> bool;

    /// Disable the sequencer feed channel and clear the completion flag.
    fn disable_sequencer(&mut self);
}

// ── Tests ────────────────────────────────────────────────────────────────────
