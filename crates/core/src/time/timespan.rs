//! Unit conversion helper exposed to scripts as `TimeSpan`.

/// Converts durations to milliseconds.
///
/// Inputs are not validated: negative and non-finite numbers are converted
/// arithmetically.
pub struct TimeSpan;

impl TimeSpan {
    pub const MILLIS_PER_MINUTE: f64 = 60_000.0;

    pub fn from_minutes(minutes: f64) -> f64 {
        minutes * Self::MILLIS_PER_MINUTE
    }

    pub fn from_milliseconds(milliseconds: f64) -> f64 {
        milliseconds
    }
}
