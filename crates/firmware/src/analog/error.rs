//! Analog subsystem errors.
//!
//! All engine operations report failure through status values. Nothing here
//! unwinds: parts of the engine run in interrupt context.

/// Errors returned by the analog input engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum AnalogError {
    /// The input identity has no analog capability (or the sensor index does not exist).
    UnsupportedInput,
    /// The target unit already sequences its maximum number of channels.
    UnitFull,
    /// A unit index outside the fixed set of converter units.
    UnknownUnit,
    /// The unit has no channels enabled, so there is nothing to convert.
    NoChannels,
    /// A scan is already in flight on the unit.
    ScanInProgress,
}

impl AnalogError {
    /// Whether this is a configuration-time error (as opposed to a scan-start refusal).
    pub fn is_configuration(self) -> bool {
        matches!(
            self,
            Self::UnsupportedInput | Self::UnitFull | Self::UnknownUnit
        )
    }
}

#[cfg(feature = "std")]
impl std::error::Error for AnalogError {}

impl core::fmt::Display for AnalogError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::UnsupportedInput => write!(f, "Input has no analog capability"),
            Self::UnitFull => write!(f, "Converter unit channel table is full"),
            Self::UnknownUnit => write!(f, "No such converter unit"),
            Self::NoChannels => write!(f, "No channels enabled on converter unit"),
            Self::ScanInProgress => write!(f, "Scan already in progress"),
        }
    }
}
