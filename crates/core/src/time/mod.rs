//! Timezone-aware date handling for scripts.
//!
//! [`Time`] backs the `time` script object: `parseDate`, `dateToString` and
//! `sleep`. Dates come back as [`ZonedDateTime`], which always renders in the
//! zone it was parsed for. [`TimeSpan`] backs the `TimeSpan` object.
//!
//! # Example
//!
//! ```rust
//! use botshim_core::time::{FormatOptions, ParseOptions, Time};
//!
//! let time = Time::default();
//! let date = time
//!     .parse_date("15/01/2024", &ParseOptions {
//!         format: Some("dd/MM/yyyy".into()),
//!         ..Default::default()
//!     })
//!     .unwrap();
//! let text = time
//!     .date_to_string(date, &FormatOptions {
//!         time_zone: Some("UTC".into()),
//!         ..Default::default()
//!     })
//!     .unwrap();
//! assert_eq!(text, "2024-01-15T03:00:00.0000000+00:00");
//! ```

mod culture;
mod engine;
mod formatter;
mod parser;
mod timespan;
mod zoned;

pub use culture::Culture;
pub use engine::{
    DateInput, FALLBACK_TIMEZONE, FormatOptions, ParseOptions, Time, TimeError, parse_zone,
    resolve_default_zone,
};
pub use formatter::{FormatToken, TimeFormatter};
pub use timespan::TimeSpan;
pub use zoned::ZonedDateTime;
