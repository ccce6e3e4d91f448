//! `time` global and the date userdata it returns.
//!
//! Dates handed to scripts are [`ZonedDateTime`] userdata, so every
//! rendering reports the zone the date was parsed into:
//!
//! ```lua
//! local d = time.parseDate("2024-01-15", { format = "yyyy-MM-dd", timeZone = "America/Sao_Paulo" })
//! d:toDateString()   -- "Mon Jan 15 2024"
//! d:toISOString()    -- "2024-01-15T03:00:00.000Z"
//! time.dateToString(d, { timeZone = "UTC" })
//! ```

use chrono::{DateTime, Utc};
use mlua::{Function, Lua, MetaMethod, Result as LuaResult, Table, UserData, UserDataMethods, Value};

use super::types::HostError;
use crate::time::{DateInput, FormatOptions, ParseOptions, Time, ZonedDateTime};

impl UserData for ZonedDateTime {
    fn add_methods<M: UserDataMethods<Self>>(methods: &mut M) {
        methods.add_method("toDateString", |_, this, ()| Ok(this.to_date_string()));
        methods.add_method("toTimeString", |_, this, ()| Ok(this.to_time_string()));
        methods.add_method("toString", |_, this, ()| Ok(this.to_full_string()));
        methods.add_method("toISOString", |_, this, ()| Ok(this.to_iso_string()));
        methods.add_method("getTime", |_, this, ()| Ok(this.timestamp_millis()));
        methods.add_method("getTimeZone", |_, this, ()| Ok(this.zone().name()));
        methods.add_method("format", |_, this, pattern: String| Ok(this.format(&pattern)));

        methods.add_meta_method(MetaMethod::ToString, |_, this, ()| Ok(this.to_full_string()));
    }
}

/// Register the `time` global table.
pub fn register_time_table(lua: &Lua) -> LuaResult<()> {
    let time = lua.create_table()?;

    time.set("parseDate", create_parse_date_fn(lua)?)?;
    time.set("dateToString", create_date_to_string_fn(lua)?)?;
    time.set("sleep", create_sleep_fn(lua)?)?;
    time.set("now", lua.create_function(|lua, ()| Ok(host_time(lua)?.now()))?)?;

    lua.globals().set("time", time)?;
    Ok(())
}

/// Create `time.parseDate(date, { format?, culture?, timeZone? })`.
fn create_parse_date_fn(lua: &Lua) -> LuaResult<Function> {
    lua.create_function(|lua, (date, options): (Value, Option<Table>)| {
        let input = date_input(date)?;
        let options = parse_options(options)?;
        host_time(lua)?.parse_date(input, &options).map_err(|e| HostError::from(e).into_lua())
    })
}

/// Create `time.dateToString(date, { format?, timeZone? })`.
///
/// Text input is auto-detected in the default zone first.
fn create_date_to_string_fn(lua: &Lua) -> LuaResult<Function> {
    lua.create_function(|lua, (date, options): (Value, Option<Table>)| {
        let time = host_time(lua)?;
        let instant = match date_input(date)? {
            DateInput::Instant(instant) => instant,
            DateInput::Text(text) => time
                .parse_date(text, &ParseOptions::default())
                .map_err(|e| HostError::from(e).into_lua())?
                .instant(),
        };
        let options = format_options(options)?;
        time.date_to_string(instant, &options).map_err(|e| HostError::from(e).into_lua())
    })
}

/// Create `time.sleep(ms)`. Only usable from an async run.
fn create_sleep_fn(lua: &Lua) -> LuaResult<Function> {
    lua.create_async_function(|lua, milliseconds: Option<f64>| async move {
        let time = host_time(&lua)?;
        time.sleep(milliseconds.unwrap_or(0.0)).await;
        Ok(())
    })
}

fn host_time(lua: &Lua) -> LuaResult<Time> {
    lua.app_data_ref::<Time>()
        .map(|time| time.clone())
        .ok_or_else(|| mlua::Error::runtime("time not available"))
}

/// Accept text, epoch milliseconds, or a date returned by `parseDate`.
fn date_input(value: Value) -> LuaResult<DateInput> {
    match value {
        Value::String(s) => Ok(DateInput::Text(s.to_str()?.to_string())),
        Value::Integer(ms) => from_epoch_millis(ms),
        Value::Number(ms) if ms.is_finite() => from_epoch_millis(ms as i64),
        Value::UserData(ud) => {
            let date = ud.borrow::<ZonedDateTime>()?;
            Ok(DateInput::Instant(date.instant()))
        }
        other => Err(HostError::new(
            "InvalidDateError",
            format!("cannot read a date from a {} value", other.type_name()),
        )
        .into_lua()),
    }
}

fn from_epoch_millis(ms: i64) -> LuaResult<DateInput> {
    DateTime::<Utc>::from_timestamp_millis(ms).map(DateInput::Instant).ok_or_else(|| {
        HostError::new("InvalidDateError", format!("timestamp {ms} is out of range")).into_lua()
    })
}

fn parse_options(table: Option<Table>) -> LuaResult<ParseOptions> {
    let Some(table) = table else {
        return Ok(ParseOptions::default());
    };
    Ok(ParseOptions {
        format: table.get("format")?,
        culture: table.get("culture")?,
        time_zone: table.get("timeZone")?,
    })
}

fn format_options(table: Option<Table>) -> LuaResult<FormatOptions> {
    let Some(table) = table else {
        return Ok(FormatOptions::default());
    };
    Ok(FormatOptions { format: table.get("format")?, time_zone: table.get("timeZone")? })
}
