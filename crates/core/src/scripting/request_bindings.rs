//! `request` global.
//!
//! ```lua
//! local resp = request.fetchAsync("https://api.example.com/items", {
//!     method = "POST",
//!     headers = { Authorization = "Bearer token" },
//!     body = { name = "item" },
//! })
//! if resp.success then
//!     local data = resp:jsonAsync()
//! end
//! ```

use std::collections::BTreeMap;

use mlua::{Function, Lua, MultiValue, Result as LuaResult, Table, Value};

use super::bindings::{json_to_lua, lua_to_json};
use super::types::HostError;
use crate::request::{FetchOptions, FetchResponse, Request};

/// Register the `request` global table.
pub fn register_request_table(lua: &Lua) -> LuaResult<()> {
    let request = lua.create_table()?;
    request.set("fetchAsync", create_fetch_fn(lua)?)?;
    lua.globals().set("request", request)?;
    Ok(())
}

/// Create `request.fetchAsync(url, { method?, headers?, body? })`.
///
/// Transport failures come back as a response with `status == 0`; only an
/// unknown method raises.
fn create_fetch_fn(lua: &Lua) -> LuaResult<Function> {
    lua.create_async_function(|lua, (url, options): (String, Option<Table>)| async move {
        let options = fetch_options(&lua, options)?;
        let client = lua
            .app_data_ref::<Request>()
            .map(|request| request.clone())
            .ok_or_else(|| mlua::Error::runtime("request not available"))?;

        let response = client
            .fetch_async(&url, options)
            .await
            .map_err(|e| HostError::from(e).into_lua())?;
        response_table(&lua, response)
    })
}

fn fetch_options(lua: &Lua, table: Option<Table>) -> LuaResult<FetchOptions> {
    let Some(table) = table else {
        return Ok(FetchOptions::default());
    };

    let mut headers = BTreeMap::new();
    if let Some(header_table) = table.get::<Option<Table>>("headers")? {
        for pair in header_table.pairs::<String, String>() {
            let (name, value) = pair?;
            headers.insert(name, value);
        }
    }

    let body = match table.get::<Value>("body")? {
        Value::Nil => None,
        value => Some(lua_to_json(lua, value)?),
    };

    Ok(FetchOptions { method: table.get("method")?, headers, body })
}

fn response_table(lua: &Lua, response: FetchResponse) -> LuaResult<Table> {
    let table = lua.create_table()?;
    table.set("status", response.status)?;
    table.set("success", response.success)?;
    table.set("body", response.body.as_str())?;

    let headers = lua.create_table()?;
    for (name, value) in &response.headers {
        headers.set(name.as_str(), value.as_str())?;
    }
    table.set("headers", headers)?;

    if let Some(json) = &response.json {
        table.set("json", json_to_lua(lua, json)?)?;
    }
    if let Some(error) = &response.error {
        table.set("error", error.as_str())?;
    }

    // Accepts both `resp.jsonAsync()` and `resp:jsonAsync()`.
    let json_async = lua.create_async_function(move |lua, _: MultiValue| {
        let response = response.clone();
        async move {
            match response.json_async().await {
                Some(json) => json_to_lua(&lua, &json),
                None => Ok(Value::Nil),
            }
        }
    })?;
    table.set("jsonAsync", json_async)?;

    Ok(table)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_fetch_options_from_table() {
        let lua = Lua::new();
        let table: Table = lua
            .load(r#"{ method = "post", headers = { ["X-Id"] = "7" }, body = { a = 1 } }"#)
            .eval()
            .unwrap();

        let options = fetch_options(&lua, Some(table)).unwrap();
        assert_eq!(options.method.as_deref(), Some("post"));
        assert_eq!(options.headers.get("X-Id").map(String::as_str), Some("7"));
        assert_eq!(options.body, Some(json!({"a": 1})));
    }

    #[test]
    fn test_fetch_options_default_when_absent() {
        let lua = Lua::new();
        assert_eq!(fetch_options(&lua, None).unwrap(), FetchOptions::default());
    }

    #[test]
    fn test_response_table_fields() {
        let lua = Lua::new();
        let response = FetchResponse::completed(
            201,
            BTreeMap::from([("content-type".to_string(), "application/json".to_string())]),
            r#"{"id":3}"#.to_string(),
        );
        let table = response_table(&lua, response).unwrap();

        assert_eq!(table.get::<u16>("status").unwrap(), 201);
        assert!(table.get::<bool>("success").unwrap());
        let json: Table = table.get("json").unwrap();
        assert_eq!(json.get::<i64>("id").unwrap(), 3);
        let headers: Table = table.get("headers").unwrap();
        assert_eq!(headers.get::<String>("content-type").unwrap(), "application/json");
        assert!(table.get::<Value>("error").unwrap().is_nil());
    }

    #[test]
    fn test_degraded_response_table() {
        let lua = Lua::new();
        let table = response_table(&lua, FetchResponse::degraded("refused")).unwrap();
        assert_eq!(table.get::<u16>("status").unwrap(), 0);
        assert!(!table.get::<bool>("success").unwrap());
        assert_eq!(table.get::<String>("error").unwrap(), "refused");
        assert!(table.get::<Value>("json").unwrap().is_nil());
    }
}
