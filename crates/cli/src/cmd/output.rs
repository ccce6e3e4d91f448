//! Shared output formatting.

use botshim_core::time::ZonedDateTime;
use serde::Serialize;
use tabled::{Table, Tabled, settings::Style};

/// Renderings of a parsed date, for JSON output.
#[derive(Debug, Serialize)]
pub struct DateOutput {
    pub full: String,
    pub date: String,
    pub time: String,
    pub iso: String,
    pub zone: String,
    pub epoch_millis: i64,
}

impl From<&ZonedDateTime> for DateOutput {
    fn from(date: &ZonedDateTime) -> Self {
        Self {
            full: date.to_full_string(),
            date: date.to_date_string(),
            time: date.to_time_string(),
            iso: date.to_iso_string(),
            zone: date.zone().name().to_string(),
            epoch_millis: date.timestamp_millis(),
        }
    }
}

/// Row for the date renderings table.
#[derive(Tabled)]
struct RenderingRow {
    #[tabled(rename = "Rendering")]
    name: &'static str,
    #[tabled(rename = "Value")]
    value: String,
}

/// Print date renderings as a table.
pub fn print_date_table(date: &DateOutput) {
    let rows = vec![
        RenderingRow { name: "full", value: date.full.clone() },
        RenderingRow { name: "date", value: date.date.clone() },
        RenderingRow { name: "time", value: date.time.clone() },
        RenderingRow { name: "iso", value: date.iso.clone() },
        RenderingRow { name: "zone", value: date.zone.clone() },
        RenderingRow { name: "epoch_millis", value: date.epoch_millis.to_string() },
    ];
    println!("{}", Table::new(&rows).with(Style::rounded()));
}

/// Print any serializable value as pretty JSON.
pub fn print_json<T: Serialize>(value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(json) => println!("{json}"),
        Err(e) => super::fail(format!("Failed to serialize output: {e}")),
    }
}
