//! The `time` object exposed to scripts.

use std::time::Duration;

use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use thiserror::Error;

use super::culture::Culture;
use super::formatter::TimeFormatter;
use super::parser::{parse_auto, parse_with_format};
use super::zoned::ZonedDateTime;
use crate::clock::{SharedClock, SystemClock};

/// Zone used when the host supplies none.
pub const FALLBACK_TIMEZONE: Tz = chrono_tz::America::Sao_Paulo;

/// Error type for date parsing and formatting.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TimeError {
    #[error("invalid date '{input}': {reason}")]
    InvalidDate { input: String, reason: String },

    #[error("unknown time zone: {0}")]
    InvalidTimeZone(String),
}

impl TimeError {
    /// Name of the error kind as shown to scripts.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::InvalidDate { .. } => "InvalidDateError",
            Self::InvalidTimeZone(_) => "InvalidTimeZoneError",
        }
    }
}

/// Options for [`Time::parse_date`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParseOptions {
    /// Host pattern; auto-detection is used when absent.
    pub format: Option<String>,
    /// Culture for month and weekday names (default `en-US`).
    pub culture: Option<String>,
    /// Target zone (default: the instance default).
    pub time_zone: Option<String>,
}

/// Options for [`Time::date_to_string`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormatOptions {
    /// Host pattern (default [`TimeFormatter::DEFAULT_FORMAT`]).
    pub format: Option<String>,
    /// Zone to render in (default: the instance default).
    pub time_zone: Option<String>,
}

/// What `parse_date` accepts: text, or an instant that only needs a zone.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DateInput {
    Text(String),
    Instant(DateTime<Utc>),
}

impl From<&str> for DateInput {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for DateInput {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<DateTime<Utc>> for DateInput {
    fn from(value: DateTime<Utc>) -> Self {
        Self::Instant(value)
    }
}

impl From<ZonedDateTime> for DateInput {
    fn from(value: ZonedDateTime) -> Self {
        Self::Instant(value.instant())
    }
}

/// Parse an IANA zone identifier.
pub fn parse_zone(name: &str) -> Result<Tz, TimeError> {
    name.trim().parse::<Tz>().map_err(|_| TimeError::InvalidTimeZone(name.to_string()))
}

/// Pick the default zone from host settings.
///
/// The configured zone is only honoured when `use_configured` is on; an
/// unknown identifier is logged and replaced by the fallback.
pub fn resolve_default_zone(configured: Option<&str>, use_configured: bool) -> Tz {
    if !use_configured {
        return FALLBACK_TIMEZONE;
    }
    match configured {
        Some(name) => parse_zone(name).unwrap_or_else(|e| {
            tracing::warn!("{e}; using {}", FALLBACK_TIMEZONE.name());
            FALLBACK_TIMEZONE
        }),
        None => FALLBACK_TIMEZONE,
    }
}

/// Timezone-aware date parsing and formatting.
///
/// The default zone is fixed at construction and passed explicitly into
/// every call.
#[derive(Clone)]
pub struct Time {
    default_zone: Tz,
    clock: SharedClock,
}

impl Time {
    pub fn new(default_zone: Tz) -> Self {
        Self::with_clock(default_zone, SystemClock::shared())
    }

    pub fn with_clock(default_zone: Tz, clock: SharedClock) -> Self {
        Self { default_zone, clock }
    }

    pub fn default_zone(&self) -> Tz {
        self.default_zone
    }

    /// Current instant in the default zone.
    pub fn now(&self) -> ZonedDateTime {
        ZonedDateTime::new(self.clock.now(), self.default_zone)
    }

    fn zone_or_default(&self, name: Option<&str>) -> Result<Tz, TimeError> {
        name.map_or(Ok(self.default_zone), parse_zone)
    }

    /// Parse a date and express it in the requested zone.
    pub fn parse_date(
        &self,
        date: impl Into<DateInput>,
        options: &ParseOptions,
    ) -> Result<ZonedDateTime, TimeError> {
        let zone = self.zone_or_default(options.time_zone.as_deref())?;
        let text = match date.into() {
            DateInput::Instant(instant) => return Ok(ZonedDateTime::new(instant, zone)),
            DateInput::Text(text) => text,
        };

        let parsed = match options.format.as_deref() {
            Some(format) => {
                let culture = Culture::resolve(options.culture.as_deref());
                parse_with_format(&text, format, culture, zone).ok_or_else(|| {
                    TimeError::InvalidDate {
                        input: text.clone(),
                        reason: format!("does not match format '{format}' ({})", culture.tag()),
                    }
                })?
            }
            None => parse_auto(&text, zone).ok_or_else(|| TimeError::InvalidDate {
                input: text.clone(),
                reason: "unrecognised date layout".into(),
            })?,
        };

        Ok(ZonedDateTime::from_local(parsed))
    }

    /// Render an instant in the requested zone and pattern.
    pub fn date_to_string(
        &self,
        date: impl Into<DateTime<Utc>>,
        options: &FormatOptions,
    ) -> Result<String, TimeError> {
        let zone = self.zone_or_default(options.time_zone.as_deref())?;
        let format = options.format.as_deref().unwrap_or(TimeFormatter::DEFAULT_FORMAT);
        let local = date.into().with_timezone(&zone);
        Ok(TimeFormatter::format(&local, format))
    }

    /// Suspend for roughly `milliseconds`. Non-positive or non-finite
    /// durations return immediately.
    pub async fn sleep(&self, milliseconds: f64) {
        if !milliseconds.is_finite() || milliseconds <= 0.0 {
            return;
        }
        let duration = Duration::try_from_secs_f64(milliseconds / 1000.0).unwrap_or(Duration::MAX);
        self.clock.sleep(duration).await;
    }
}

impl Default for Time {
    fn default() -> Self {
        Self::new(FALLBACK_TIMEZONE)
    }
}

impl std::fmt::Debug for Time {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Time").field("default_zone", &self.default_zone).finish_non_exhaustive()
    }
}
