//! `botshim time`: parse and format dates from the shell.

use botshim_core::time::{FormatOptions, ParseOptions, Time, TimeError};
use std::path::Path;

use super::output::{DateOutput, print_date_table, print_json};
use super::{fail, load_config};
use crate::{OutputFormat, TimeFormatArgs, TimeParseArgs};

fn report(e: TimeError) -> ! {
    fail(format!("{}: {e}", e.kind()))
}

pub fn parse(config_path: Option<&Path>, profile: Option<&str>, args: &TimeParseArgs) {
    let rc = load_config(config_path, profile);
    let time = Time::new(rc.default_timezone());

    let options = ParseOptions {
        format: args.format.clone(),
        culture: args.culture.clone(),
        time_zone: args.timezone.clone(),
    };
    let date = time.parse_date(args.input.as_str(), &options).unwrap_or_else(|e| report(e));

    let output = DateOutput::from(&date);
    match args.output {
        OutputFormat::Table => print_date_table(&output),
        OutputFormat::Json => print_json(&output),
    }
    crate::logging::flush();
}

pub fn format(config_path: Option<&Path>, profile: Option<&str>, args: &TimeFormatArgs) {
    let rc = load_config(config_path, profile);
    let time = Time::new(rc.default_timezone());

    let date = time
        .parse_date(args.input.as_str(), &ParseOptions::default())
        .unwrap_or_else(|e| report(e));
    let options = FormatOptions { format: args.format.clone(), time_zone: args.timezone.clone() };
    let text = time.date_to_string(date, &options).unwrap_or_else(|e| report(e));

    println!("{text}");
    crate::logging::flush();
}
