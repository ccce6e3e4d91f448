//! Host date format patterns.
//!
//! Scripts describe dates with moment-style patterns (`YYYY-MM-DD HH:mm`),
//! except that the host writes day-of-month as `dd`. [`TimeFormatter`]
//! translates that token, splits a pattern into [`FormatToken`]s, and turns
//! tokens into rendered text or into a chrono parse pattern.
//!
//! Supported tokens:
//!
//! | token | meaning |
//! |-------|---------|
//! | `YYYY` `yyyy` | four-digit year |
//! | `YY` `yy` | two-digit year |
//! | `MMMM` `MMM` `MM` `M` | month name, abbreviation, padded, plain |
//! | `DDDD` | day of year |
//! | `DD` `D` | day of month, padded and plain |
//! | `dddd` `ddd` `d` | weekday name, abbreviation, number (Sunday = 0) |
//! | `HH` `H` `hh` `h` | 24h and 12h hours |
//! | `mm` `m` `ss` `s` | minutes and seconds |
//! | `S`…`SSSSSSSSS` | fractional seconds, one to nine digits |
//! | `A` `a` | AM/PM, am/pm |
//! | `Z` `ZZ` | offset as `+03:00` / `+0300` |
//! | `X` | Unix seconds |
//! | `[text]` | literal text |

use std::fmt::Write;
use std::sync::LazyLock;

use chrono::{DateTime, TimeZone, Timelike};
use regex::Regex;

static TOKEN_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"\[[^\]]*\]|YYYY|yyyy|YY|yy|MMMM|MMM|MM|M|DDDD|DD|D|dddd|ddd|d|HH|H|hh|h|mm|m|ss|s|S{1,9}|A|a|ZZ|Z|X",
    )
    .expect("valid regex")
});

/// One element of a compiled date pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormatToken {
    Literal(String),
    Year4,
    Year2,
    MonthName,
    MonthAbbr,
    Month2,
    Month1,
    DayOfYear,
    Day2,
    Day1,
    WeekdayName,
    WeekdayAbbr,
    WeekdayNumber,
    Hour24Padded,
    Hour24,
    Hour12Padded,
    Hour12,
    Minute2,
    Minute1,
    Second2,
    Second1,
    /// Fractional seconds with the given number of digits (1-9).
    Fraction(u8),
    Meridiem { upper: bool },
    OffsetColon,
    OffsetCompact,
    UnixSeconds,
}

impl FormatToken {
    fn from_match(m: &str) -> Self {
        match m {
            "YYYY" | "yyyy" => Self::Year4,
            "YY" | "yy" => Self::Year2,
            "MMMM" => Self::MonthName,
            "MMM" => Self::MonthAbbr,
            "MM" => Self::Month2,
            "M" => Self::Month1,
            "DDDD" => Self::DayOfYear,
            "DD" => Self::Day2,
            "D" => Self::Day1,
            "dddd" => Self::WeekdayName,
            "ddd" => Self::WeekdayAbbr,
            "d" => Self::WeekdayNumber,
            "HH" => Self::Hour24Padded,
            "H" => Self::Hour24,
            "hh" => Self::Hour12Padded,
            "h" => Self::Hour12,
            "mm" => Self::Minute2,
            "m" => Self::Minute1,
            "ss" => Self::Second2,
            "s" => Self::Second1,
            "A" => Self::Meridiem { upper: true },
            "a" => Self::Meridiem { upper: false },
            "ZZ" => Self::OffsetCompact,
            "Z" => Self::OffsetColon,
            "X" => Self::UnixSeconds,
            s if s.starts_with('S') => Self::Fraction(s.len() as u8),
            s => Self::Literal(s.trim_start_matches('[').trim_end_matches(']').to_string()),
        }
    }

    pub fn is_hour(&self) -> bool {
        matches!(self, Self::Hour24Padded | Self::Hour24 | Self::Hour12Padded | Self::Hour12)
    }

    pub fn is_hour_12(&self) -> bool {
        matches!(self, Self::Hour12Padded | Self::Hour12)
    }

    pub fn is_minute(&self) -> bool {
        matches!(self, Self::Minute2 | Self::Minute1)
    }

    /// Any token that fixes part of the time of day.
    pub fn is_time_field(&self) -> bool {
        self.is_hour()
            || self.is_minute()
            || matches!(
                self,
                Self::Second2
                    | Self::Second1
                    | Self::Fraction(_)
                    | Self::Meridiem { .. }
                    | Self::UnixSeconds
            )
    }

    /// chrono specifier used when rendering this token.
    fn render_spec(&self) -> Option<&'static str> {
        Some(match self {
            Self::Year4 => "%Y",
            Self::Year2 => "%y",
            Self::MonthName => "%B",
            Self::MonthAbbr => "%b",
            Self::Month2 => "%m",
            Self::Month1 => "%-m",
            Self::DayOfYear => "%j",
            Self::Day2 => "%d",
            Self::Day1 => "%-d",
            Self::WeekdayName => "%A",
            Self::WeekdayAbbr => "%a",
            Self::WeekdayNumber => "%w",
            Self::Hour24Padded => "%H",
            Self::Hour24 => "%-H",
            Self::Hour12Padded => "%I",
            Self::Hour12 => "%-I",
            Self::Minute2 => "%M",
            Self::Minute1 => "%-M",
            Self::Second2 => "%S",
            Self::Second1 => "%-S",
            Self::Meridiem { upper: true } => "%p",
            Self::Meridiem { upper: false } => "%P",
            Self::OffsetColon => "%:z",
            Self::OffsetCompact => "%z",
            Self::UnixSeconds => "%s",
            Self::Literal(_) | Self::Fraction(_) => return None,
        })
    }

    /// chrono specifier used when parsing this token.
    fn parse_spec(&self) -> Option<&'static str> {
        Some(match self {
            Self::Month1 => "%m",
            Self::Day1 => "%d",
            Self::Hour24 => "%H",
            Self::Hour12 => "%I",
            Self::Minute1 => "%M",
            Self::Second1 => "%S",
            Self::Meridiem { .. } => "%p",
            Self::Fraction(n) if *n <= 3 => "%3f",
            Self::Fraction(n) if *n <= 6 => "%6f",
            Self::Fraction(_) => "%9f",
            other => return other.render_spec(),
        })
    }
}

/// Stateless helper for host date patterns.
pub struct TimeFormatter;

impl TimeFormatter {
    /// Pattern used by `dateToString` when the script gives none.
    pub const DEFAULT_FORMAT: &'static str = "yyyy-MM-ddTHH:mm:ss.SSSSSSSZ";

    /// Replace the host day-of-month token `dd` with `DD`.
    ///
    /// Only runs of exactly two `d` outside `[...]` literals are touched, so
    /// `ddd` and `dddd` keep their weekday meaning.
    pub fn translate(format: &str) -> String {
        let mut out = String::with_capacity(format.len());
        let mut chars = format.chars().peekable();
        while let Some(c) = chars.next() {
            match c {
                '[' => {
                    out.push(c);
                    for inner in chars.by_ref() {
                        out.push(inner);
                        if inner == ']' {
                            break;
                        }
                    }
                }
                'd' => {
                    let mut run = 1;
                    while chars.peek() == Some(&'d') {
                        chars.next();
                        run += 1;
                    }
                    if run == 2 {
                        out.push_str("DD");
                    } else {
                        out.extend(std::iter::repeat_n('d', run));
                    }
                }
                _ => out.push(c),
            }
        }
        out
    }

    /// Translate and split a host pattern into tokens.
    pub fn compile(format: &str) -> Vec<FormatToken> {
        let translated = Self::translate(format);
        let mut tokens = Vec::new();
        let mut last = 0;
        for m in TOKEN_RE.find_iter(&translated) {
            if m.start() > last {
                push_literal(&mut tokens, &translated[last..m.start()]);
            }
            match FormatToken::from_match(m.as_str()) {
                FormatToken::Literal(text) => push_literal(&mut tokens, &text),
                token => tokens.push(token),
            }
            last = m.end();
        }
        if last < translated.len() {
            push_literal(&mut tokens, &translated[last..]);
        }
        tokens
    }

    /// Render `dt` with a host pattern.
    pub fn format<Tz: TimeZone>(dt: &DateTime<Tz>, format: &str) -> String
    where
        Tz::Offset: std::fmt::Display,
    {
        Self::render(dt, &Self::compile(format))
    }

    /// Render `dt` with already compiled tokens.
    pub fn render<Tz: TimeZone>(dt: &DateTime<Tz>, tokens: &[FormatToken]) -> String
    where
        Tz::Offset: std::fmt::Display,
    {
        let mut out = String::new();
        for token in tokens {
            match token {
                FormatToken::Literal(text) => out.push_str(text),
                FormatToken::Fraction(digits) => {
                    let nanos = format!("{:09}", dt.nanosecond() % 1_000_000_000);
                    out.push_str(&nanos[..usize::from(*digits).min(9)]);
                }
                other => {
                    if let Some(spec) = other.render_spec() {
                        let _ = write!(out, "{}", dt.format(spec));
                    }
                }
            }
        }
        out
    }

    /// Build a chrono parse pattern from tokens.
    ///
    /// A `.` literal directly before fractional seconds becomes `%.f`, which
    /// accepts any number of digits.
    pub fn parse_pattern(tokens: &[FormatToken]) -> String {
        let mut pattern = String::new();
        for token in tokens {
            match token {
                FormatToken::Literal(text) => pattern.push_str(&text.replace('%', "%%")),
                FormatToken::Fraction(_) if pattern.ends_with('.') => {
                    pattern.pop();
                    pattern.push_str("%.f");
                }
                other => {
                    if let Some(spec) = other.parse_spec() {
                        pattern.push_str(spec);
                    }
                }
            }
        }
        pattern
    }
}

fn push_literal(tokens: &mut Vec<FormatToken>, text: &str) {
    if let Some(FormatToken::Literal(prev)) = tokens.last_mut() {
        prev.push_str(text);
    } else {
        tokens.push(FormatToken::Literal(text.to_string()));
    }
}
