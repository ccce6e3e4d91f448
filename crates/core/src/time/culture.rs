//! Cultures used when parsing dates with an explicit format.
//!
//! chrono only understands English month and weekday names, so input written
//! under another culture has its names rewritten to English before parsing.

use std::borrow::Cow;
use std::sync::LazyLock;

use regex::{Captures, Regex};

const EN_MONTHS: [&str; 12] = [
    "January", "February", "March", "April", "May", "June", "July", "August",
    "September", "October", "November", "December",
];
const EN_MONTHS_ABBR: [&str; 12] =
    ["Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec"];
const EN_WEEKDAYS: [&str; 7] =
    ["Monday", "Tuesday", "Wednesday", "Thursday", "Friday", "Saturday", "Sunday"];

const PT_MONTHS: [&str; 12] = [
    "janeiro", "fevereiro", "março", "abril", "maio", "junho", "julho", "agosto",
    "setembro", "outubro", "novembro", "dezembro",
];
const PT_MONTHS_ABBR: [&str; 12] =
    ["jan", "fev", "mar", "abr", "mai", "jun", "jul", "ago", "set", "out", "nov", "dez"];
const PT_WEEKDAYS: [&str; 7] = [
    "segunda-feira", "terça-feira", "quarta-feira", "quinta-feira", "sexta-feira",
    "sábado", "domingo",
];

const ES_MONTHS: [&str; 12] = [
    "enero", "febrero", "marzo", "abril", "mayo", "junio", "julio", "agosto",
    "septiembre", "octubre", "noviembre", "diciembre",
];
const ES_MONTHS_ABBR: [&str; 12] =
    ["ene", "feb", "mar", "abr", "may", "jun", "jul", "ago", "sep", "oct", "nov", "dic"];
const ES_WEEKDAYS: [&str; 7] =
    ["lunes", "martes", "miércoles", "jueves", "viernes", "sábado", "domingo"];

/// A parsing culture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Culture {
    #[default]
    EnUs,
    PtBr,
    EsEs,
}

impl Culture {
    /// Look up a culture by tag (`pt-BR`, `pt_br`, `es`).
    pub fn from_tag(tag: &str) -> Option<Self> {
        let normalized = tag.trim().replace('_', "-").to_lowercase();
        let language = normalized.split('-').next().unwrap_or_default();
        match language {
            "en" => Some(Self::EnUs),
            "pt" => Some(Self::PtBr),
            "es" => Some(Self::EsEs),
            _ => None,
        }
    }

    /// Resolve an optional tag, falling back to `en-US` for unknown cultures.
    pub fn resolve(tag: Option<&str>) -> Self {
        match tag {
            None => Self::default(),
            Some(t) => Self::from_tag(t).unwrap_or_else(|| {
                tracing::debug!(culture = t, "unknown culture, using en-US");
                Self::default()
            }),
        }
    }

    pub fn tag(&self) -> &'static str {
        match self {
            Self::EnUs => "en-US",
            Self::PtBr => "pt-BR",
            Self::EsEs => "es-ES",
        }
    }

    fn names(&self) -> Option<&'static NameTable> {
        match self {
            Self::EnUs => None,
            Self::PtBr => Some(&*PT_NAMES),
            Self::EsEs => Some(&*ES_NAMES),
        }
    }

    /// Rewrite month and weekday names of this culture into English.
    pub fn normalize<'a>(&self, input: &'a str) -> Cow<'a, str> {
        let Some(table) = self.names() else {
            return Cow::Borrowed(input);
        };
        table.pattern.replace_all(input, |caps: &Captures<'_>| {
            let found = caps[0].to_lowercase();
            table
                .pairs
                .iter()
                .find(|(local, _)| *local == found)
                .map_or_else(|| caps[0].to_string(), |(_, english)| (*english).to_string())
        })
    }
}

/// Local names paired with their English forms, plus one regex matching any
/// of them.
struct NameTable {
    pairs: Vec<(&'static str, &'static str)>,
    pattern: Regex,
}

impl NameTable {
    fn build(
        months: &[&'static str; 12],
        abbr: &[&'static str; 12],
        weekdays: &[&'static str; 7],
    ) -> Self {
        let mut pairs: Vec<(&'static str, &'static str)> = months
            .iter()
            .copied()
            .zip(EN_MONTHS)
            .chain(abbr.iter().copied().zip(EN_MONTHS_ABBR))
            .chain(weekdays.iter().copied().zip(EN_WEEKDAYS))
            .collect();
        // Longest first so "março" wins over "mar".
        pairs.sort_by_key(|(local, _)| std::cmp::Reverse(local.chars().count()));

        let alternation: Vec<String> =
            pairs.iter().map(|(local, _)| regex::escape(local)).collect();
        let pattern = Regex::new(&format!(r"(?i)\b(?:{})\b", alternation.join("|")))
            .expect("escaped names form a valid regex");
        Self { pairs, pattern }
    }
}

static PT_NAMES: LazyLock<NameTable> =
    LazyLock::new(|| NameTable::build(&PT_MONTHS, &PT_MONTHS_ABBR, &PT_WEEKDAYS));
static ES_NAMES: LazyLock<NameTable> =
    LazyLock::new(|| NameTable::build(&ES_MONTHS, &ES_MONTHS_ABBR, &ES_WEEKDAYS));
