//! Property-based tests for callback throttling.
//! Drives a single converter unit through arbitrary scan timings, including
//! tick counter wrap, and checks the firing law on every dispatch.
#![allow(
    clippy::unwrap_used,
    clippy::cast_possible_truncation,
    clippy::indexing_slicing,
    clippy::arithmetic_side_effects
)]

use std::cell::RefCell;

use firmware::analog::should_fire;
use firmware::{CallbackParam, ConverterUnit};
use platform::mocks::SimulatedConverter;
use platform::SamplingConfig;
use proptest::prelude::*;

thread_local! {
    static FIRED: RefCell<Vec<u16>> = const { RefCell::new(Vec::new()) };
    static PER_SLOT: RefCell<[u32; 16]> = const { RefCell::new([0; 16]) };
}

fn count_slot(param: CallbackParam, _: u16) {
    PER_SLOT.with(|counts| counts.borrow_mut()[param.0] += 1);
}

fn record(_: CallbackParam, code: u16) {
    FIRED.with(|fired| fired.borrow_mut().push(code));
}

fn take_fired() -> Vec<u16> {
    FIRED.with(|fired| std::mem::take(&mut *fired.borrow_mut()))
}

/// One complete scan dispatched at `now`; returns whether the callback ran.
fn scan(unit: &'static ConverterUnit<SimulatedConverter>, sim: &SimulatedConverter, now: u32) -> bool {
    unit.start_conversion(None).unwrap();
    assert!(sim.complete_scan());
    assert!(unit.on_dma_interrupt());
    assert!(unit.execute_callbacks(now));
    !take_fired().is_empty()
}

proptest! {
    /// Fires iff at least `interval` ticks have passed since the last fire
    /// (or since enabling), measured with wrapping subtraction.
    #[test]
    fn fires_exactly_when_interval_elapsed(
        start in any::<u32>(),
        interval in 0u32..300,
        gaps in proptest::collection::vec(0u32..120, 1..40),
    ) {
        let sim = SimulatedConverter::new();
        let unit: &'static _ = Box::leak(Box::new(ConverterUnit::new(0, sim.clone(), SamplingConfig::default())));
        take_fired();
        unit.enable_channel(3, Some(record), CallbackParam(0), interval, start).unwrap();

        let mut now = start;
        let mut last_fired = start;
        for gap in gaps {
            now = now.wrapping_add(gap);
            let expected = now.wrapping_sub(last_fired) >= interval;
            prop_assert_eq!(scan(unit, &sim, now), expected);
            prop_assert_eq!(should_fire(now, last_fired, interval), expected);
            if expected {
                last_fired = now;
            }
            prop_assert_eq!(unit.slot(0).unwrap().last_fired, last_fired);
        }
    }

    /// With interval 0 every completed scan fires, and the delivered code is
    /// always the freshest one.
    #[test]
    fn zero_interval_delivers_every_code(codes in proptest::collection::vec(0u16..4096, 1..30)) {
        let sim = SimulatedConverter::new();
        let unit: &'static _ = Box::leak(Box::new(ConverterUnit::new(0, sim.clone(), SamplingConfig::default())));
        take_fired();
        unit.enable_channel(9, Some(record), CallbackParam(0), 0, 0).unwrap();

        let mut delivered = Vec::new();
        for &code in &codes {
            sim.set_input(9, code);
            unit.start_conversion(None).unwrap();
            prop_assert!(sim.complete_scan());
            unit.on_result_ready();
            prop_assert!(unit.execute_callbacks(0));
            delivered.extend(take_fired());
            prop_assert_eq!(unit.read_channel(9), code);
        }
        prop_assert_eq!(delivered, codes);
    }

    /// With 1..=16 channels, N completed scans refresh every slot exactly N
    /// times, each time with that scan's code.
    #[test]
    fn every_slot_refreshed_once_per_scan(channels in 1usize..=16, scans in 1u32..20) {
        let sim = SimulatedConverter::new();
        let unit: &'static _ = Box::leak(Box::new(ConverterUnit::new(0, sim.clone(), SamplingConfig::default())));
        PER_SLOT.with(|counts| *counts.borrow_mut() = [0; 16]);
        for slot in 0..channels {
            unit.enable_channel(slot as u8, Some(count_slot), CallbackParam(slot), 0, 0).unwrap();
        }

        for scan in 0..scans {
            for mux in 0..channels {
                sim.set_input(mux as u8, (scan as u16) * 16 + mux as u16);
            }
            unit.start_conversion(None).unwrap();
            prop_assert!(sim.complete_scan());
            prop_assert!(unit.on_dma_interrupt());
            prop_assert!(unit.execute_callbacks(scan));
            for mux in 0..channels {
                prop_assert_eq!(unit.read_channel(mux as u8), (scan as u16) * 16 + mux as u16);
            }
        }
        let counts = PER_SLOT.with(|counts| *counts.borrow());
        prop_assert!(counts[..channels].iter().all(|&n| n == scans));
        prop_assert!(counts[channels..].iter().all(|&n| n == 0));
    }
}
