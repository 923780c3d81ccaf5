//! Analog Input Firmware
//!
//! Continuous multi-channel sampling for motion-controller boards: thermistors,
//! inductive sensors and the on-die temperature sensors, scanned by the
//! converter units with DMA and delivered to per-channel callbacks.
//!
//! # Architecture
//!
//! ```text
//! Sensor drivers (callbacks, read_channel)
//!         ↓
//! Sampling engine (analog module: registry, units, scheduler)
//!         ↓
//! Platform HAL (AnalogPeripheral, DMA buffers, tick source)
//!         ↓
//! Converter registers + DMA controller
//! ```
//!
//! # Features
//!
//! - `emulator` - Run the engine on the desktop against the simulated converter (tokio, tracing)
//! - `std` - Enable standard library (for emulator and testing)
//! - `defmt` - Enable defmt logging
//!
//! # Examples
//!
//! ## Emulator Target
//!
//! ```bash
//! cargo run --example scan_emulator --features emulator
//! ```

#![cfg_attr(all(not(test), not(feature = "std")), no_std)]
// Upgrade relevant warns to deny; keep pedantic as warn (too noisy for firmware)
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
// Critical correctness: deny these
#![deny(clippy::await_holding_lock)] // holding a blocking Mutex across .await is a bug
#![deny(unsafe_op_in_unsafe_fn)]
// unsafe fn body is not implicitly unsafe block
// Logging discipline (allow println in tests via clippy.toml)
#![warn(clippy::print_stdout)] // prefer tracing/defmt over println! in lib code
#![warn(clippy::dbg_macro)] // dbg! should not be left in committed code
// Intentional allows for this codebase:
#![allow(clippy::module_name_repetitions)] // common in Rust crates; not a real issue
#![allow(clippy::missing_errors_doc)] // most errors are self-explanatory
// Pedantic lints too noisy for firmware application code:
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::doc_markdown)]
#![allow(clippy::unused_self)]

pub mod analog;

// Re-export key types
pub use analog::{
    AnalogCallback, AnalogError, AnalogIn, CallbackParam, ChannelRegistry, ConverterUnit,
    InputId, IterationOutcome, ScanDiagnostics, ScanScheduler, ScanState, ScanTiming, ScanWake,
    SweepOutcome, TaskHook, UnitHint,
};
