//! Instants paired with the zone they should be shown in.

use std::fmt;

use chrono::{DateTime, SecondsFormat, Utc};
use chrono_tz::Tz;

use super::formatter::TimeFormatter;

/// A point in time plus the zone used for every rendering of it.
///
/// The machine's local zone is never consulted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ZonedDateTime {
    instant: DateTime<Utc>,
    zone: Tz,
}

impl ZonedDateTime {
    pub fn new(instant: DateTime<Utc>, zone: Tz) -> Self {
        Self { instant, zone }
    }

    pub fn from_local(local: DateTime<Tz>) -> Self {
        Self { instant: local.with_timezone(&Utc), zone: local.timezone() }
    }

    pub fn instant(&self) -> DateTime<Utc> {
        self.instant
    }

    pub fn zone(&self) -> Tz {
        self.zone
    }

    /// The same instant as wall-clock time in this zone.
    pub fn local(&self) -> DateTime<Tz> {
        self.instant.with_timezone(&self.zone)
    }

    /// The same instant shown in another zone.
    pub fn with_zone(&self, zone: Tz) -> Self {
        Self { instant: self.instant, zone }
    }

    pub fn timestamp_millis(&self) -> i64 {
        self.instant.timestamp_millis()
    }

    /// Date portion, e.g. `Mon Jan 15 2024`.
    pub fn to_date_string(&self) -> String {
        self.local().format("%a %b %d %Y").to_string()
    }

    /// Time portion, e.g. `00:00:00 GMT-0300 (America/Sao_Paulo)`.
    pub fn to_time_string(&self) -> String {
        let local = self.local();
        format!("{} GMT{} ({})", local.format("%H:%M:%S"), local.format("%z"), self.zone.name())
    }

    /// Date and time portions joined by a space.
    pub fn to_full_string(&self) -> String {
        format!("{} {}", self.to_date_string(), self.to_time_string())
    }

    /// UTC ISO 8601 with milliseconds, e.g. `2024-01-15T03:00:00.000Z`.
    pub fn to_iso_string(&self) -> String {
        self.instant.to_rfc3339_opts(SecondsFormat::Millis, true)
    }

    /// Render with a host pattern in this zone.
    pub fn format(&self, pattern: &str) -> String {
        TimeFormatter::format(&self.local(), pattern)
    }
}

impl fmt::Display for ZonedDateTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_full_string())
    }
}

impl From<ZonedDateTime> for DateTime<Utc> {
    fn from(value: ZonedDateTime) -> Self {
        value.instant
    }
}

impl From<DateTime<Tz>> for ZonedDateTime {
    fn from(value: DateTime<Tz>) -> Self {
        Self::from_local(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use chrono_tz::America::Sao_Paulo;
    use chrono_tz::Asia::Tokyo;

    fn midnight_sao_paulo() -> ZonedDateTime {
        ZonedDateTime::from_local(Sao_Paulo.with_ymd_and_hms(2024, 1, 15, 0, 0, 0).unwrap())
    }

    #[test]
    fn test_renderings_report_zone() {
        let d = midnight_sao_paulo();
        insta::assert_snapshot!(d.to_date_string(), @"Mon Jan 15 2024");
        insta::assert_snapshot!(d.to_time_string(), @"00:00:00 GMT-0300 (America/Sao_Paulo)");
        insta::assert_snapshot!(d.to_string(), @"Mon Jan 15 2024 00:00:00 GMT-0300 (America/Sao_Paulo)");
    }

    #[test]
    fn test_iso_string_is_utc() {
        assert_eq!(midnight_sao_paulo().to_iso_string(), "2024-01-15T03:00:00.000Z");
    }

    #[test]
    fn test_with_zone_keeps_instant() {
        let d = midnight_sao_paulo();
        let tokyo = d.with_zone(Tokyo);
        assert_eq!(tokyo.instant(), d.instant());
        assert_eq!(tokyo.to_date_string(), "Mon Jan 15 2024");
        assert_eq!(tokyo.format("HH:mm"), "12:00");
    }
}
