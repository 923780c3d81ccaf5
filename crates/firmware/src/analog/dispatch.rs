//! Per-channel callback throttling.

use platform::Ticks;

/// Whether a channel whose callback last fired at `last_fired` is due at `now`.
///
/// Fires iff `now - last_fired >= interval` in wrapping tick arithmetic, so an
/// interval of 0 fires on every scan and a counter wrap does not stall a
/// channel.
#[must_use]
pub const fn should_fire(now: Ticks, last_fired: Ticks, interval: Ticks) -> bool {
    now.wrapping_sub(last_fired) >= interval
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_interval_always_fires() {
        assert!(should_fire(0, 0, 0));
        assert!(should_fire(17, 17, 0));
    }

    #[test]
    fn fires_exactly_at_interval_boundary() {
        assert!(!should_fire(199, 100, 100));
        assert!(should_fire(200, 100, 100));
        assert!(should_fire(250, 100, 100));
    }

    #[test]
    fn survives_tick_wrap() {
        let last = u32::MAX - 10;
        assert!(!should_fire(5, last, 100));
        assert!(should_fire(89, last, 100));
    }
}
