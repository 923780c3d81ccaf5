//! Analog subsystem configuration and constants
//!
//! This module defines central sizing and timing values used across the
//! sampling engine. Drivers and tests should reference these constants
//! rather than hardcoding values.

/// Number of converter instances on the target MCU.
pub const CONVERTER_UNITS: usize = 2;

/// Maximum channels sequenced per converter unit.
///
/// Tied to the width of the channel-enable bitmap and the fixed slot tables.
pub const MAX_CHANNELS_PER_UNIT: usize = 16;

/// Number of on-die temperature sensors (PTAT and CTAT).
pub const INTERNAL_SENSOR_COUNT: u8 = 2;

/// Upper bound on a single wake wait, in milliseconds.
///
/// Covers worst-case conversion plus DMA transfer time for a full unit.
pub const WAKE_TIMEOUT_MS: u64 = 500;

/// Delay after a successful wake before the next sweep, in milliseconds.
pub const SETTLE_DELAY_MS: u64 = 2;

/// Delay between sweeps while no unit has anything to convert, in milliseconds.
pub const IDLE_BACKOFF_MS: u64 = 10;

/// Subsystem version (synchronized with Cargo.toml)
pub const ANALOG_IN_VERSION: &str = env!("CARGO_PKG_VERSION");
