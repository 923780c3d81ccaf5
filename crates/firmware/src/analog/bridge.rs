//! Two-stage DMA chain owned by a converter unit.
//!
//! Descriptor A streams the unit's sequencer words into the converter;
//! descriptor B drains completed codes into the unit's result buffer. The
//! bridge owns both memory regions. Entries are append-only: a slot written
//! while a scan is in flight lies beyond the armed beat count, so the feed
//! never observes a half-written pair.

use platform::{AnalogPeripheral, ResultBuffer, ResultDrain, SequenceBuffer, SequenceEntry, SequenceFeed};

/// Sequencer feed and result drain memory for one unit.
#[derive(Debug, Default)]
pub struct DmaBridge {
    sequence: SequenceBuffer,
    results: ResultBuffer,
}

impl DmaBridge {
    /// Create a bridge with zeroed buffers.
    pub const fn new() -> Self {
        Self {
            sequence: SequenceBuffer::new(),
            results: ResultBuffer::new(),
        }
    }

    /// Record the sequencer pair for `slot`.
    pub fn write_entry(&self, slot: usize, entry: SequenceEntry) -> bool {
        self.sequence.write(slot, entry)
    }

    /// Sequencer pair stored for `slot`.
    pub fn entry(&self, slot: usize) -> Option<SequenceEntry> {
        self.sequence.entry(slot)
    }

    /// Last drained code for `slot`.
    pub fn result(&self, slot: usize) -> u16 {
        self.results.load(slot)
    }

    /// Re-arm both transfers on `peripheral` for `channels` conversions.
    ///
    /// Discards the pending result register first.
    pub fn arm<P: AnalogPeripheral>(&'static self, peripheral: &mut P, channels: usize) {
        peripheral.discard_pending_result();
        peripheral.arm_transfer(
            SequenceFeed::for_channels(&self.sequence, channels),
            ResultDrain::for_channels(&self.results, channels),
        );
    }
}
