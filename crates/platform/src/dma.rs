//! DMA buffers and transfer descriptors for the analog sequencer chain.
//!
//! Provides the two memory regions a converter unit hands to its DMA
//! channels, and the descriptors that carry them into
//! [`AnalogPeripheral::arm_transfer`](crate::AnalogPeripheral::arm_transfer).
//!
//! # Sharing model
//!
//! Both buffers are written by the DMA engine (or the simulator) while the
//! task holds only shared references, so every cell is an atomic with the
//! same in-memory representation as the plain integer the DMA moves. The
//! buffers are `#[repr(C, align(32))]` so a unit can place them in a
//! non-cacheable, DMA-reachable region without straddling cache lines.
//!
//! Ordering between the drain DMA and the task is established by the unit
//! state word (release in the completion interrupt, acquire in the
//! scheduler), so the cells themselves use relaxed accesses.

use core::sync::atomic::{AtomicU16, AtomicU32, Ordering};

use crate::adc::SequenceEntry;
use crate::config::MAX_CHANNELS_PER_UNIT;

/// Words per sequencer entry (`INPUTCTRL`, `REFCTRL`).
pub const WORDS_PER_ENTRY: usize = 2;

const SEQUENCE_WORDS: usize = MAX_CHANNELS_PER_UNIT * WORDS_PER_ENTRY;

// ── SequenceBuffer ───────────────────────────────────────────────────────────

/// Source of the sequencer feed transfer: one word pair per enabled channel.
#[derive(Debug)]
#[repr(C, align(32))]
pub struct SequenceBuffer {
    words: [AtomicU32; SEQUENCE_WORDS],
}

impl SequenceBuffer {
    /// Number of entries the buffer can hold.
    pub const CAPACITY: usize = MAX_CHANNELS_PER_UNIT;

    /// Create a zeroed buffer.
    #[allow(clippy::declare_interior_mutable_const)] // used only as an array initializer
    pub const fn new() -> Self {
        const ZERO: AtomicU32 = AtomicU32::new(0);
        Self {
            words: [ZERO; SEQUENCE_WORDS],
        }
    }

    /// Store `entry` at `slot`. Returns `false` if `slot` is out of range.
    pub fn write(&self, slot: usize, entry: SequenceEntry) -> bool {
        let Some(base) = slot.checked_mul(WORDS_PER_ENTRY) else {
            return false;
        };
        match (self.words.get(base), base.checked_add(1).and_then(|i| self.words.get(i))) {
            (Some(input), Some(reference)) => {
                input.store(entry.input_ctrl, Ordering::Relaxed);
                reference.store(entry.ref_ctrl, Ordering::Relaxed);
                true
            }
            _ => false,
        }
    }

    /// Entry stored at `slot`, if in range.
    pub fn entry(&self, slot: usize) -> Option<SequenceEntry> {
        let base = slot.checked_mul(WORDS_PER_ENTRY)?;
        let input = self.words.get(base)?;
        let reference = self.words.get(base.checked_add(1)?)?;
        Some(SequenceEntry {
            input_ctrl: input.load(Ordering::Relaxed),
            ref_ctrl: reference.load(Ordering::Relaxed),
        })
    }

    /// Address of the first word, for programming the DMA source register.
    pub fn as_ptr(&self) -> *const u32 {
        self.words.as_ptr().cast::<u32>()
    }
}

impl Default for SequenceBuffer {
    fn default() -> Self {
        Self::new()
    }
}

// ── ResultBuffer ─────────────────────────────────────────────────────────────

/// Destination of the result drain transfer: one raw code per enabled channel.
#[derive(Debug)]
#[repr(C, align(32))]
pub struct ResultBuffer {
    codes: [AtomicU16; MAX_CHANNELS_PER_UNIT],
}

impl ResultBuffer {
    /// Number of codes the buffer can hold.
    pub const CAPACITY: usize = MAX_CHANNELS_PER_UNIT;

    /// Create a zeroed buffer.
    #[allow(clippy::declare_interior_mutable_const)] // used only as an array initializer
    pub const fn new() -> Self {
        const ZERO: AtomicU16 = AtomicU16::new(0);
        Self {
            codes: [ZERO; MAX_CHANNELS_PER_UNIT],
        }
    }

    /// Code at `slot`, or 0 if out of range.
    pub fn load(&self, slot: usize) -> u16 {
        self.codes
            .get(slot)
            .map_or(0, |code| code.load(Ordering::Relaxed))
    }

    /// Write `code` at `slot` the way the drain DMA would. Out-of-range slots are ignored.
    pub fn store(&self, slot: usize, code: u16) {
        if let Some(cell) = self.codes.get(slot) {
            cell.store(code, Ordering::Relaxed);
        }
    }

    /// Address of the first code, for programming the DMA destination register.
    pub fn as_mut_ptr(&self) -> *mut u16 {
        self.codes.as_ptr().cast::<u16>().cast_mut()
    }
}

impl Default for ResultBuffer {
    fn default() -> Self {
        Self::new()
    }
}

// ── Transfer descriptors ─────────────────────────────────────────────────────

/// Descriptor A: word beats from a [`SequenceBuffer`] into the sequencer register.
#[derive(Debug, Clone, Copy)]
pub struct SequenceFeed {
    /// Source words.
    pub words: &'static SequenceBuffer,
    /// Number of 32-bit beats (two per channel).
    pub beats: usize,
}

impl SequenceFeed {
    /// Feed for `channels` sequenced conversions.
    pub fn for_channels(words: &'static SequenceBuffer, channels: usize) -> Self {
        Self {
            words,
            beats: channels.saturating_mul(WORDS_PER_ENTRY),
        }
    }

    /// Number of sequencer entries this feed covers.
    pub fn entries(&self) -> usize {
        self.beats / WORDS_PER_ENTRY
    }
}

/// Descriptor B: half-word beats from the result register into a [`ResultBuffer`].
#[derive(Debug, Clone, Copy)]
pub struct ResultDrain {
    /// Destination codes.
    pub codes: &'static ResultBuffer,
    /// Number of 16-bit beats (one per channel).
    pub beats: usize,
}

impl ResultDrain {
    /// Drain for `channels` conversions.
    pub fn for_channels(codes: &'static ResultBuffer, channels: usize) -> Self {
        Self {
            codes,
            beats: channels,
        }
    }
}

// ── Tests ────────────────────────────────────────────────────────────────────

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::adc::ReferenceSelect;

    #[test]
    fn buffers_are_cache_line_aligned() {
        assert_eq!(core::mem::align_of::<SequenceBuffer>(), 32);
        assert_eq!(core::mem::align_of::<ResultBuffer>(), 32);
        assert_eq!(core::mem::size_of::<ResultBuffer>(), 32);
    }

    #[test]
    fn sequence_write_rejects_out_of_range_slot() {
        let buf = SequenceBuffer::new();
        let entry = SequenceEntry::single_ended(3, ReferenceSelect::IntVcc1);
        assert!(buf.write(15, entry));
        assert!(!buf.write(16, entry));
        assert_eq!(buf.entry(15).unwrap(), entry);
        assert!(buf.entry(16).is_none());
    }

    #[test]
    fn result_load_out_of_range_is_zero() {
        let buf = ResultBuffer::new();
        buf.store(0, 0x0ABC);
        buf.store(40, 0x0123);
        assert_eq!(buf.load(0), 0x0ABC);
        assert_eq!(buf.load(40), 0);
    }

    #[test]
    fn feed_counts_two_words_per_channel() {
        static WORDS: SequenceBuffer = SequenceBuffer::new();
        let feed = SequenceFeed::for_channels(&WORDS, 7);
        assert_eq!(feed.beats, 14);
        assert_eq!(feed.entries(), 7);
    }
}
