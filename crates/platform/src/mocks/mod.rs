//! Mock implementations for testing
//!
//! This module provides a simulated converter and a manually driven tick
//! source for use in unit and integration tests.

#![cfg(any(test, feature = "std"))]

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::adc::{AnalogPeripheral, SamplingConfig};
use crate::clock::{TickSource, Ticks};
use crate::dma::{ResultDrain, SequenceFeed};

/// Code drained into slot 0 when a scan is armed without discarding the
/// pending result register first.
pub const STALE_RESULT_CODE: u16 = 0xFFFF;

/// Number of addressable mux positions.
const MUX_POSITIONS: usize = 32;

#[derive(Debug, Default)]
struct SimState {
    config: Option<SamplingConfig>,
    resets: u32,
    sequence_programs: u32,
    discards: u32,
    arms: u32,
    sequencer_disables: u32,
    inputs: [u16; MUX_POSITIONS],
    armed: Option<(SequenceFeed, ResultDrain)>,
    corrupt_first: bool,
    result_pending: bool,
    complete: bool,
}

/// Simulated converter + DMA pair.
///
/// Cloning yields another handle to the same simulated hardware, so a test
/// can hand one clone to a converter unit and keep one to play the role of
/// the hardware: [`complete_scan`](Self::complete_scan) performs every armed
/// conversion and drains the codes into the unit's result buffer.
#[derive(Debug, Clone, Default)]
pub struct SimulatedConverter {
    inner: Arc<Mutex<SimState>>,
}

impl SimulatedConverter {
    /// Create a converter with every input reading 0.
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, SimState> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Set the code produced by mux position `mux`.
    pub fn set_input(&self, mux: u8, code: u16) {
        if let Some(slot) = self.state().inputs.get_mut(usize::from(mux)) {
            *slot = code;
        }
    }

    /// Run the armed scan to completion.
    ///
    /// Returns `false` (and changes nothing) if no scan is armed.
    pub fn complete_scan(&self) -> bool {
        let mut state = self.state();
        let Some((feed, drain)) = state.armed.take() else {
            return false;
        };
        let conversions = drain.beats.min(feed.entries());
        for slot in 0..conversions {
            let code = if slot == 0 && state.corrupt_first {
                STALE_RESULT_CODE
            } else {
                feed.words
                    .entry(slot)
                    .and_then(|entry| state.inputs.get(usize::from(entry.mux())).copied())
                    .unwrap_or(0)
            };
            drain.codes.store(slot, code);
        }
        // Auto-start leaves one more result behind after the last sequenced pair.
        state.result_pending = true;
        state.complete = true;
        true
    }

    /// Latch the drain completion flag without running a scan, as a stray
    /// block-complete would.
    pub fn raise_transfer_complete(&self) {
        self.state().complete = true;
    }

    /// Whether a scan is armed and not yet completed.
    pub fn is_armed(&self) -> bool {
        self.state().armed.is_some()
    }

    /// Channels covered by the armed scan, if any.
    pub fn armed_channels(&self) -> Option<usize> {
        self.state().armed.map(|(_, drain)| drain.beats)
    }

    /// Number of `reset` calls.
    pub fn reset_count(&self) -> u32 {
        self.state().resets
    }

    /// Number of `program_sequence` calls.
    pub fn program_count(&self) -> u32 {
        self.state().sequence_programs
    }

    /// Number of `arm_transfer` calls.
    pub fn arm_count(&self) -> u32 {
        self.state().arms
    }

    /// Number of `discard_pending_result` calls.
    pub fn discard_count(&self) -> u32 {
        self.state().discards
    }

    /// Number of `disable_sequencer` calls.
    pub fn sequencer_disable_count(&self) -> u32 {
        self.state().sequencer_disables
    }

    /// Configuration passed to the last `reset`.
    pub fn last_config(&self) -> Option<SamplingConfig> {
        self.state().config
    }
}

impl AnalogPeripheral for SimulatedConverter {
    fn reset(&mut self, config: &SamplingConfig) {
        let mut state = self.state();
        state.config = Some(*config);
        state.resets = state.resets.saturating_add(1);
        state.armed = None;
        state.complete = false;
        state.result_pending = false;
    }

    fn program_sequence(&mut self) {
        let mut state = self.state();
        state.sequence_programs = state.sequence_programs.saturating_add(1);
    }

    fn discard_pending_result(&mut self) {
        let mut state = self.state();
        state.discards = state.discards.saturating_add(1);
        state.result_pending = false;
    }

    fn arm_transfer(&mut self, feed: SequenceFeed, drain: ResultDrain) {
        let mut state = self.state();
        state.arms = state.arms.saturating_add(1);
        state.corrupt_first = state.result_pending;
        state.complete = false;
        state.armed = Some((feed, drain));
    }

    fn is_transfer_complete(&self) -> bool {
        self.state().complete
    }

    fn disable_sequencer(&mut self) {
        let mut state = self.state();
        state.sequencer_disables = state.sequencer_disables.saturating_add(1);
        state.complete = false;
    }
}

/// Tick source advanced explicitly by the test.
///
/// Clones share the same counter.
#[derive(Debug, Clone, Default)]
pub struct ManualTicks {
    now: Arc<AtomicU32>,
}

impl ManualTicks {
    /// Create a tick source starting at `start`.
    pub fn starting_at(start: Ticks) -> Self {
        Self {
            now: Arc::new(AtomicU32::new(start)),
        }
    }

    /// Advance by `ticks` (wrapping).
    pub fn advance(&self, ticks: Ticks) {
        // fetch_add wraps on overflow, matching the hardware tick counter.
        self.now.fetch_add(ticks, Ordering::Relaxed);
    }

    /// Jump to an absolute tick count.
    pub fn set(&self, ticks: Ticks) {
        self.now.store(ticks, Ordering::Relaxed);
    }
}

impl TickSource for ManualTicks {
    fn now_ticks(&self) -> Ticks {
        self.now.load(Ordering::Relaxed)
    }
}

// ── Tests ────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adc::{ReferenceSelect, SequenceEntry};
    use crate::dma::{ResultBuffer, SequenceBuffer};

    static WORDS: SequenceBuffer = SequenceBuffer::new();
    static CODES: ResultBuffer = ResultBuffer::new();

    #[test]
    fn complete_without_arm_is_a_no_op() {
        let sim = SimulatedConverter::new();
        assert!(!sim.complete_scan());
        assert!(!sim.is_transfer_complete());
    }

    #[test]
    fn skipped_discard_corrupts_first_code() {
        let mut sim = SimulatedConverter::new();
        assert!(WORDS.write(0, SequenceEntry::single_ended(2, ReferenceSelect::IntVcc1)));
        sim.set_input(2, 1234);

        sim.discard_pending_result();
        sim.arm_transfer(
            SequenceFeed::for_channels(&WORDS, 1),
            ResultDrain::for_channels(&CODES, 1),
        );
        assert!(sim.complete_scan());
        assert_eq!(CODES.load(0), 1234);

        // Re-arm without reading the result register.
        sim.arm_transfer(
            SequenceFeed::for_channels(&WORDS, 1),
            ResultDrain::for_channels(&CODES, 1),
        );
        assert!(sim.complete_scan());
        assert_eq!(CODES.load(0), STALE_RESULT_CODE);
    }

    #[test]
    fn manual_ticks_wrap() {
        let ticks = ManualTicks::starting_at(u32::MAX);
        ticks.advance(2);
        assert_eq!(ticks.now_ticks(), 1);
    }
}
