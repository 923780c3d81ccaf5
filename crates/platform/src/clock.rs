//! Firmware time base used for callback throttling.
//!
//! Ticks are milliseconds on target and wrap at `u32::MAX` (~49.7 days).
//! All interval arithmetic on [`Ticks`] must use wrapping subtraction.

/// Firmware tick count.
pub type Ticks = u32;

/// Source of the current tick count.
pub trait TickSource {
    /// Current tick count.
    fn now_ticks(&self) -> Ticks;
}

/// Tick source backed by the Embassy time driver.
#[derive(Debug, Clone, Copy, Default)]
pub struct EmbassyTicks;

impl TickSource for EmbassyTicks {
    #[allow(clippy::cast_possible_truncation)] // wrapping tick counter by definition
    fn now_ticks(&self) -> Ticks {
        embassy_time::Instant::now().as_millis() as Ticks
    }
}

impl<T: TickSource + ?Sized> TickSource for &T {
    fn now_ticks(&self) -> Ticks {
        (**self).now_ticks()
    }
}
