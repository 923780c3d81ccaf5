//! Hardware Abstraction Layer (HAL) for the analog input subsystem
//!
//! This crate provides trait-based abstractions for the analog converter
//! peripheral and its DMA plumbing, enabling the sampling engine to be
//! developed and tested without physical hardware.
//!
//! # Architecture Layers
//!
//! ```text
//! Sensor drivers (thermistors, inductive sensors, die sensors)
//!         ↓
//! Sampling engine (firmware crate: registry, units, scheduler)
//!         ↓
//! Platform HAL (this crate - trait abstractions)
//!         ↓
//! Converter registers + DMA controller
//! ```
//!
//! # Modules
//!
//! - [`adc`] - Converter peripheral trait, sequencer encoding, sampling config
//! - [`dma`] - Sequencer feed / result drain buffers and transfer descriptors
//! - [`clock`] - Tick source used for callback throttling
//! - [`config`] - Compile-time sizing and timing constants
//!
//! # Features
//!
//! - `std`: Enable the simulated converter in [`mocks`] (for testing)
//! - `defmt`: Enable defmt logging derives
//!
//! # Example
//!
//! ```no_run
//! use platform::{AnalogPeripheral, SamplingConfig};
//!
//! fn bring_up<P: AnalogPeripheral>(adc: &mut P) {
//!     adc.reset(&SamplingConfig::default());
//!     adc.program_sequence();
//! }
//! ```

// ── Lint policy ─────────────────────────────────────────────────────────────
#![deny(clippy::unwrap_used)] // no .unwrap() in production code
#![deny(clippy::expect_used)] // no .expect() in production code
#![deny(clippy::panic)] // no panic!() in production code
#![deny(clippy::unreachable)] // no unreachable!() that isn't documented
#![deny(unused_must_use)]
// all Results must be handled
// ────────────────────────────────────────────────────────────────────────────
#![cfg_attr(not(test), no_std)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(unsafe_op_in_unsafe_fn)] // unsafe fn body is not implicitly unsafe block
#![warn(clippy::print_stdout)] // prefer tracing/defmt over println! in lib code
// Pedantic lints suppressed for this hardware HAL crate:
#![allow(clippy::doc_markdown)] // register names in doc comments
#![allow(clippy::must_use_candidate)] // hardware accessors, callers decide
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]

#[cfg(feature = "std")]
extern crate std;

pub mod adc;
pub mod clock;
pub mod config;
pub mod dma;

#[cfg(any(test, feature = "std"))]
pub mod mocks;

// Re-export the converter abstraction
pub use adc::{
    AdcInput, AnalogPeripheral, Prescaler, ReferenceSelect, SamplingConfig, SequenceEntry,
};

// Re-export DMA types
pub use dma::{ResultBuffer, ResultDrain, SequenceBuffer, SequenceFeed};

// Re-export time types
pub use clock::{EmbassyTicks, TickSource, Ticks};
