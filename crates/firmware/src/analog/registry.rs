//! Board input table: maps logical input ids to (unit, channel) pairs.

use platform::{AdcInput, AnalogPeripheral, Ticks};

use super::error::AnalogError;
use super::unit::{AnalogCallback, CallbackParam, ConverterUnit};

/// Logical input identity (a board pin index).
pub type InputId = usize;

/// Static capability table for the board.
///
/// Index `id` holds the input's converter unit and mux channel, or `None`
/// when the pin has no analog function.
#[derive(Debug, Clone, Copy)]
pub struct ChannelRegistry {
    inputs: &'static [Option<AdcInput>],
}

impl ChannelRegistry {
    /// Wrap a board table.
    pub const fn new(inputs: &'static [Option<AdcInput>]) -> Self {
        Self { inputs }
    }

    /// Number of input ids in the table.
    pub fn len(&self) -> usize {
        self.inputs.len()
    }

    /// Whether the table is empty.
    pub fn is_empty(&self) -> bool {
        self.inputs.is_empty()
    }

    /// Analog identity of `id`, if it has one.
    pub fn resolve(&self, id: InputId) -> Option<AdcInput> {
        self.inputs.get(id).copied().flatten()
    }

    /// Resolve `id` and append a slot for it on its unit.
    ///
    /// On error nothing is changed.
    pub fn enable_channel<P: AnalogPeripheral>(
        &self,
        units: &[ConverterUnit<P>],
        id: InputId,
        callback: Option<AnalogCallback>,
        param: CallbackParam,
        interval: Ticks,
        now: Ticks,
    ) -> Result<AdcInput, AnalogError> {
        let input = self.resolve(id).ok_or(AnalogError::UnsupportedInput)?;
        let unit = units
            .get(usize::from(input.unit))
            .ok_or(AnalogError::UnknownUnit)?;
        unit.enable_channel(input.channel, callback, param, interval, now)?;
        Ok(input)
    }

    /// Whether `id` resolves to a channel enabled on its unit.
    pub fn is_channel_enabled<P: AnalogPeripheral>(
        &self,
        units: &[ConverterUnit<P>],
        id: InputId,
    ) -> bool {
        self.resolve(id)
            .and_then(|input| {
                units
                    .get(usize::from(input.unit))
                    .map(|unit| unit.is_channel_enabled(input.channel))
            })
            .unwrap_or(false)
    }

    /// Last result for `id`; 0 if it is unknown, not enabled, or not yet scanned.
    pub fn read_channel<P: AnalogPeripheral>(&self, units: &[ConverterUnit<P>], id: InputId) -> u16 {
        self.resolve(id)
            .map_or(0, |input| read_input(units, input))
    }
}

/// Last result for a raw (unit, channel) identity.
pub fn read_input<P: AnalogPeripheral>(units: &[ConverterUnit<P>], input: AdcInput) -> u16 {
    units
        .get(usize::from(input.unit))
        .map_or(0, |unit| unit.read_channel(input.channel))
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing, clippy::arithmetic_side_effects)]
mod tests {
    use super::*;
    use platform::mocks::SimulatedConverter;
    use platform::SamplingConfig;

    static BOARD: [Option<AdcInput>; 5] = [
        Some(AdcInput::new(0, 2)),
        None,
        Some(AdcInput::new(1, 5)),
        Some(AdcInput::new(7, 0)),
        Some(AdcInput::new(0, 16)),
    ];

    fn units() -> [ConverterUnit<SimulatedConverter>; 2] {
        [
            ConverterUnit::new(0, SimulatedConverter::new(), SamplingConfig::default()),
            ConverterUnit::new(1, SimulatedConverter::new(), SamplingConfig::default()),
        ]
    }

    #[test]
    fn resolve_handles_gaps_and_out_of_range() {
        let registry = ChannelRegistry::new(&BOARD);
        assert_eq!(registry.resolve(0), Some(AdcInput::new(0, 2)));
        assert_eq!(registry.resolve(1), None);
        assert_eq!(registry.resolve(99), None);
        assert_eq!(registry.len(), 5);
    }

    #[test]
    fn enable_routes_to_owning_unit() {
        let registry = ChannelRegistry::new(&BOARD);
        let units = units();
        let input = registry
            .enable_channel(&units, 2, None, CallbackParam(0), 0, 0)
            .unwrap();
        assert_eq!(input, AdcInput::new(1, 5));
        assert_eq!(units[0].channel_count(), 0);
        assert_eq!(units[1].channel_count(), 1);
        assert!(registry.is_channel_enabled(&units, 2));
        assert!(!registry.is_channel_enabled(&units, 0));
    }

    #[test]
    fn enable_failures_leave_units_untouched() {
        let registry = ChannelRegistry::new(&BOARD);
        let units = units();
        let err = |id| registry.enable_channel(&units, id, None, CallbackParam(0), 0, 0);
        assert_eq!(err(1), Err(AnalogError::UnsupportedInput));
        assert_eq!(err(42), Err(AnalogError::UnsupportedInput));
        assert_eq!(err(3), Err(AnalogError::UnknownUnit));
        assert_eq!(err(4), Err(AnalogError::UnsupportedInput));
        assert_eq!(units[0].channel_count() + units[1].channel_count(), 0);
    }

    #[test]
    fn read_of_unknown_or_disabled_input_is_zero() {
        let registry = ChannelRegistry::new(&BOARD);
        let units = units();
        assert_eq!(registry.read_channel(&units, 0), 0);
        assert_eq!(registry.read_channel(&units, 1), 0);
        assert_eq!(registry.read_channel(&units, 3), 0);
    }
}
