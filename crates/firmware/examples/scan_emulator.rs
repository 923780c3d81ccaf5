//! Analog Scan Emulator
//!
//! Runs the sampling engine on the desktop against the simulated converter:
//! a thermistor sampled every scan, an inductive sensor throttled to 250 ms
//! and the PTAT die sensor once a second.
//!
//! Run with: RUST_LOG=debug cargo run --example scan_emulator --features emulator
#![allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::indexing_slicing,
    clippy::arithmetic_side_effects
)]

use std::time::Duration;

use firmware::{AnalogIn, CallbackParam, ChannelRegistry, ConverterUnit, ScanScheduler, ScanTiming, UnitHint};
use platform::mocks::SimulatedConverter;
use platform::{AdcInput, EmbassyTicks, SamplingConfig};
use static_cell::StaticCell;
use tracing_subscriber::EnvFilter;

type Engine = AnalogIn<SimulatedConverter, EmbassyTicks>;

const THERMISTOR: usize = 0;
const INDUCTIVE: usize = 2;

static BOARD: [Option<AdcInput>; 4] = [
    Some(AdcInput::new(0, 4)),
    None,
    Some(AdcInput::new(1, 6)),
    None,
];

static ENGINE: StaticCell<Engine> = StaticCell::new();

fn on_sample(param: CallbackParam, code: u16) {
    tracing::info!(input = param.0, code, "sample");
}

fn on_die_temperature(_: CallbackParam, code: u16) {
    tracing::info!(code, "die sensor");
}

/// Plays the converter + DMA controller: completes armed scans after a fixed
/// conversion time and raises the DMA interrupt.
async fn hardware(engine: &'static Engine, sims: [SimulatedConverter; 2]) {
    let mut drift: u16 = 0;
    loop {
        tokio::time::sleep(Duration::from_millis(3)).await;
        drift = drift.wrapping_add(7) % 512;
        sims[0].set_input(4, 1800 + drift);
        sims[1].set_input(6, 3000 - drift);
        sims[0].set_input(0x1C, 2100);
        for (index, sim) in sims.iter().enumerate() {
            if sim.complete_scan() {
                engine.on_dma_interrupt(index);
            }
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    tracing::info!("Analog input emulator v{}", platform::config::ANALOG_IN_VERSION);

    let sims = [SimulatedConverter::new(), SimulatedConverter::new()];
    let engine: &'static Engine = ENGINE.init(AnalogIn::new(
        [
            ConverterUnit::new(0, sims[0].clone(), SamplingConfig::default()),
            ConverterUnit::new(1, sims[1].clone(), SamplingConfig::default()),
        ],
        ChannelRegistry::new(&BOARD),
        EmbassyTicks,
    ));

    engine.enable_channel(THERMISTOR, Some(on_sample), CallbackParam(THERMISTOR), 0)?;
    engine.enable_channel(INDUCTIVE, Some(on_sample), CallbackParam(INDUCTIVE), 250)?;
    engine.enable_internal_sensor(0, Some(on_die_temperature), CallbackParam(0), 1000, UnitHint::Any)?;

    tokio::spawn(hardware(engine, sims));
    let scheduler = ScanScheduler::new(engine, ScanTiming::default());
    let scan_task = tokio::spawn(async move { scheduler.run().await });

    tokio::time::sleep(Duration::from_secs(3)).await;
    scan_task.abort();

    let diagnostics = engine.diagnostics();
    tracing::info!(
        started = diagnostics.scans_started,
        completed = diagnostics.scans_completed,
        missed = diagnostics.missed_scans,
        "done"
    );
    tracing::info!(
        thermistor = engine.read_channel(THERMISTOR),
        inductive = engine.read_channel(INDUCTIVE),
        "last readings"
    );
    Ok(())
}
