//! Lua bindings for the host runtime objects.
//!
//! This module installs the `context` and `TimeSpan` globals and the value
//! conversions shared by every binding. `time` and `request` live in their
//! own modules.

use mlua::{
    DeserializeOptions, Function, Lua, LuaSerdeExt, Result as LuaResult, SerializeOptions, Table,
    Value,
};
use serde_json::Value as Json;

use super::request_bindings::register_request_table;
use super::time_bindings::register_time_table;
use super::types::HostError;
use crate::context::{Context, VariableName};
use crate::time::{TimeSpan, ZonedDateTime};

/// Register every host global.
///
/// After calling this function, Lua scripts can use:
/// - `context.getVariableAsync(name)` / `setVariableAsync(name, value, ttl?)`
///   / `deleteVariableAsync(name)`
/// - `time.parseDate(date, options?)`, `time.dateToString(date, options?)`,
///   `time.sleep(ms)`
/// - `TimeSpan.fromMinutes(n)`, `TimeSpan.fromMilliseconds(n)`
/// - `request.fetchAsync(url, options?)`
///
/// The session's [`Context`], [`crate::time::Time`] and
/// [`crate::request::Request`] must already be in the state's app data.
pub fn register_host_globals(lua: &Lua) -> LuaResult<()> {
    register_context_table(lua)?;
    register_time_span_table(lua)?;
    register_time_table(lua)?;
    register_request_table(lua)?;
    Ok(())
}

fn register_context_table(lua: &Lua) -> LuaResult<()> {
    let context = lua.create_table()?;

    context.set("getVariableAsync", create_get_variable_fn(lua)?)?;
    context.set("setVariableAsync", create_set_variable_fn(lua)?)?;
    context.set("deleteVariableAsync", create_delete_variable_fn(lua)?)?;

    lua.globals().set("context", context)?;
    Ok(())
}

fn register_time_span_table(lua: &Lua) -> LuaResult<()> {
    let time_span = lua.create_table()?;

    time_span.set("fromMinutes", lua.create_function(|_, n: f64| Ok(TimeSpan::from_minutes(n)))?)?;
    time_span.set(
        "fromMilliseconds",
        lua.create_function(|_, n: f64| Ok(TimeSpan::from_milliseconds(n)))?,
    )?;

    lua.globals().set("TimeSpan", time_span)?;
    Ok(())
}

/// Create `context.getVariableAsync(name)`.
///
/// Returns the stored value, or `""` when the variable is absent or expired.
///
/// ```lua
/// context.setVariableAsync("greeting", { text = "hi" })
/// local v = context.getVariableAsync("greeting")  -- { text = "hi" }
/// ```
fn create_get_variable_fn(lua: &Lua) -> LuaResult<Function> {
    lua.create_function(|lua, name: Value| {
        let name = variable_name(lua, name)?;
        let value = with_context(lua, |ctx| ctx.get_variable(name.as_str()))?
            .map_err(|e| HostError::from(e).into_lua())?;
        json_to_lua(lua, &value)
    })
}

/// Create `context.setVariableAsync(name, value, ttlMillis?)`.
///
/// A negative ttl raises `ExpirationError`; zero or nil means no expiry.
fn create_set_variable_fn(lua: &Lua) -> LuaResult<Function> {
    lua.create_function(|lua, (name, value, ttl): (Value, Value, Option<f64>)| {
        let name = variable_name(lua, name)?;
        let value = lua_to_json(lua, value)?;
        let ttl = ttl_millis(ttl);
        with_context(lua, |ctx| ctx.set_variable(name.as_str(), value, ttl))?
            .map_err(|e| HostError::from(e).into_lua())
    })
}

fn create_delete_variable_fn(lua: &Lua) -> LuaResult<Function> {
    lua.create_function(|lua, name: Value| {
        let name = variable_name(lua, name)?;
        with_context(lua, |ctx| ctx.delete_variable(name.as_str()))?
            .map_err(|e| HostError::from(e).into_lua())
    })
}

/// Run `f` against the session context stored in app data.
///
/// The borrow ends before `f`'s result is returned, so callers must not
/// hold on to it across an await.
pub(crate) fn with_context<R>(lua: &Lua, f: impl FnOnce(&mut Context) -> R) -> LuaResult<R> {
    let mut ctx = lua
        .app_data_mut::<Context>()
        .ok_or_else(|| mlua::Error::runtime("context not available"))?;
    Ok(f(&mut *ctx))
}

fn variable_name(lua: &Lua, value: Value) -> LuaResult<VariableName> {
    let json = lua_to_json(lua, value)?;
    VariableName::from_value(&json).map_err(|e| HostError::from(e).into_lua())
}

/// Lua numbers are floats; NaN counts as "no expiry" and fractions round
/// away from zero so that `-0.5` is still rejected.
fn ttl_millis(ttl: Option<f64>) -> i64 {
    match ttl {
        None => 0,
        Some(t) if t.is_nan() => 0,
        Some(t) if t < 0.0 => t.floor() as i64,
        Some(t) => t.ceil() as i64,
    }
}

/// Deepest table nesting accepted when converting to JSON.
const MAX_TABLE_DEPTH: usize = 64;

/// Convert a Lua value into JSON.
///
/// Dates become their ISO string. Tables holding exactly the keys `1..=n`
/// become arrays; any other table becomes an object whose number and boolean
/// keys are written as strings. Functions and threads inside tables are
/// skipped.
pub(crate) fn lua_to_json(lua: &Lua, value: Value) -> LuaResult<Json> {
    value_to_json(lua, value, 0)
}

fn value_to_json(lua: &Lua, value: Value, depth: usize) -> LuaResult<Json> {
    match value {
        Value::UserData(ud) if ud.is::<ZonedDateTime>() => {
            Ok(Json::String(ud.borrow::<ZonedDateTime>()?.to_iso_string()))
        }
        Value::Table(table) => table_to_json(lua, table, depth + 1),
        other => {
            lua.from_value_with(other, DeserializeOptions::new().deny_unsupported_types(false))
        }
    }
}

fn table_to_json(lua: &Lua, table: Table, depth: usize) -> LuaResult<Json> {
    if depth > MAX_TABLE_DEPTH {
        let message = format!("tables nested deeper than {MAX_TABLE_DEPTH} levels");
        return Err(conversion_error(message));
    }

    let mut entries = Vec::new();
    for pair in table.pairs::<Value, Value>() {
        let (key, value) = pair?;
        if !matches!(value, Value::Function(_) | Value::Thread(_)) {
            entries.push((key, value));
        }
    }

    let len = table.raw_len();
    let in_sequence = |key: &Value| matches!(key, Value::Integer(i) if *i >= 1 && (*i as usize) <= len);
    let is_array = (len > 0 && entries.len() == len && entries.iter().all(|(k, _)| in_sequence(k)))
        || (entries.is_empty() && table.metatable() == Some(lua.array_metatable()));

    if is_array {
        let mut items = vec![Json::Null; entries.len()];
        for (key, value) in entries {
            if let Value::Integer(i) = key {
                items[i as usize - 1] = value_to_json(lua, value, depth)?;
            }
        }
        return Ok(Json::Array(items));
    }

    let mut map = serde_json::Map::with_capacity(entries.len());
    for (key, value) in entries {
        let key = match key {
            Value::String(s) => s.to_str()?.to_string(),
            Value::Integer(i) => i.to_string(),
            Value::Number(n) => n.to_string(),
            Value::Boolean(b) => b.to_string(),
            other => {
                return Err(conversion_error(format!(
                    "table keys must be strings or numbers, got {}",
                    other.type_name()
                )));
            }
        };
        map.insert(key, value_to_json(lua, value, depth)?);
    }
    Ok(Json::Object(map))
}

fn conversion_error(message: String) -> mlua::Error {
    HostError::new("ConversionError", message).into_lua()
}

/// Convert JSON into a Lua value. `null` becomes `nil`.
pub(crate) fn json_to_lua(lua: &Lua, value: &Json) -> LuaResult<Value> {
    lua.to_value_with(
        value,
        SerializeOptions::new().serialize_none_to_null(false).serialize_unit_to_null(false),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(None, 0)]
    #[case(Some(f64::NAN), 0)]
    #[case(Some(0.0), 0)]
    #[case(Some(1500.0), 1500)]
    #[case(Some(0.5), 1)]
    #[case(Some(-0.5), -1)]
    #[case(Some(-10.0), -10)]
    fn test_ttl_millis(#[case] input: Option<f64>, #[case] expected: i64) {
        assert_eq!(ttl_millis(input), expected);
    }

    #[test]
    fn test_json_round_trip_nested_table() {
        let lua = Lua::new();
        let value: Value = lua.load(r#"{ name = "ana", tags = { "a", "b" } }"#).eval().unwrap();
        let json = lua_to_json(&lua, value).unwrap();
        assert_eq!(json, serde_json::json!({"name": "ana", "tags": ["a", "b"]}));

        let back = json_to_lua(&lua, &json).unwrap();
        let table = back.as_table().unwrap();
        assert_eq!(table.get::<String>("name").unwrap(), "ana");
    }

    #[rstest]
    #[case(r#"{ [10] = "x" }"#, serde_json::json!({"10": "x"}))]
    #[case(r#"{ [1] = "a", [3] = "c" }"#, serde_json::json!({"1": "a", "3": "c"}))]
    #[case(r#"{ [1.5] = true, [false] = 0 }"#, serde_json::json!({"1.5": true, "false": 0}))]
    #[case(r#"{ 1, 2, { k = "v" } }"#, serde_json::json!([1, 2, {"k": "v"}]))]
    #[case(r#"{ n = 1, f = function() end }"#, serde_json::json!({"n": 1}))]
    #[case("{}", serde_json::json!({}))]
    fn test_table_keys_to_json(#[case] source: &str, #[case] expected: serde_json::Value) {
        let lua = Lua::new();
        let value: Value = lua.load(source).eval().unwrap();
        assert_eq!(lua_to_json(&lua, value).unwrap(), expected);
    }

    #[test]
    fn test_unsupported_table_key_has_error_kind() {
        let lua = Lua::new();
        let value: Value = lua.load("{ [{}] = 1 }").eval().unwrap();
        let err = lua_to_json(&lua, value).unwrap_err();
        let host = err.downcast_ref::<HostError>().expect("host error");
        assert_eq!(host.kind, "ConversionError");
    }

    #[test]
    fn test_self_referencing_table_is_rejected() {
        let lua = Lua::new();
        let value: Value = lua.load("local t = {}; t.me = t; return t").eval().unwrap();
        assert!(lua_to_json(&lua, value).is_err());
    }

    #[test]
    fn test_json_null_is_nil() {
        let lua = Lua::new();
        let value = json_to_lua(&lua, &serde_json::Value::Null).unwrap();
        assert!(value.is_nil());
    }
}
