//! Lua scripting engine with sandboxing.
//!
//! This module provides a sandboxed Lua execution environment that hosts
//! one script session: the runtime objects are injected as globals and the
//! script's `run` function is called asynchronously.

use mlua::{Lua, MultiValue, Result as LuaResult, StdLib, Value};
use serde_json::Value as Json;
use tracing::{debug, warn};

use super::bindings::{json_to_lua, lua_to_json, register_host_globals, with_context};
use super::host::HostObjects;
use super::types::{SandboxConfig, ScriptOutcome, ScriptingError};
use crate::config::types::{ExceptionCapture, ResolvedConfig};
use crate::context::Context;

/// Name of the function a script must define.
pub const ENTRY_POINT: &str = "run";

/// A sandboxed Lua execution environment for one script session.
///
/// # Example
///
/// ```rust
/// use botshim_core::scripting::{HostObjects, SandboxConfig, ScriptEngine};
///
/// let engine = ScriptEngine::new(SandboxConfig::restricted(), HostObjects::default()).unwrap();
/// let result = engine.eval_string(r#"tostring(TimeSpan.fromMinutes(2))"#).unwrap();
/// assert_eq!(result, "120000.0");
/// ```
pub struct ScriptEngine {
    lua: Lua,
    exceptions: ExceptionCapture,
}

impl ScriptEngine {
    /// Create a new engine owning the given session objects.
    pub fn new(config: SandboxConfig, host: HostObjects) -> Result<Self, ScriptingError> {
        // Base functions (print, type, tostring, pcall, ...) are always there;
        // we add table, string, utf8 and math.
        let libs = StdLib::TABLE | StdLib::STRING | StdLib::UTF8 | StdLib::MATH;

        let lua = Lua::new_with(libs, mlua::LuaOptions::default())?;

        if config.memory_limit > 0 {
            lua.set_memory_limit(config.memory_limit)?;
        }

        Self::apply_sandbox(&lua)?;

        let HostObjects { context, time, request, exceptions } = host;
        lua.set_app_data(context);
        lua.set_app_data(time);
        lua.set_app_data(request);

        register_host_globals(&lua)?;

        Ok(Self { lua, exceptions })
    }

    /// Create an engine for the active profile.
    pub fn from_config(config: &ResolvedConfig) -> Result<Self, ScriptingError> {
        Self::new(SandboxConfig::from(&config.sandbox), HostObjects::from_config(config))
    }

    /// Execute a Lua snippet and return the result.
    ///
    /// Returns `None` if the snippet returns nil or no value. Suspending
    /// bindings (`time.sleep`, `request.fetchAsync`) need [`ScriptEngine::run`].
    pub fn eval(&self, script: &str) -> Result<Option<String>, ScriptingError> {
        let value: Value = self.lua.load(script).eval()?;

        match value {
            Value::Nil => Ok(None),
            Value::String(s) => Ok(Some(s.to_str()?.to_string())),
            Value::Integer(i) => Ok(Some(i.to_string())),
            Value::Number(n) => Ok(Some(format!("{n:?}"))),
            Value::Boolean(b) => Ok(Some(b.to_string())),
            other => Ok(Some(format!("{other:?}"))),
        }
    }

    /// Execute a Lua snippet that must return a string value.
    ///
    /// Returns an error if the snippet returns nil.
    pub fn eval_string(&self, script: &str) -> Result<String, ScriptingError> {
        self.eval(script)?
            .ok_or_else(|| ScriptingError::Lua(mlua::Error::runtime("script returned nil")))
    }

    /// Execute a Lua snippet that returns a boolean.
    pub fn eval_bool(&self, script: &str) -> Result<bool, ScriptingError> {
        let value: Value = self.lua.load(script).eval()?;
        match value {
            Value::Boolean(b) => Ok(b),
            Value::Nil => Ok(false),
            _ => Err(ScriptingError::Lua(mlua::Error::runtime("expected boolean result"))),
        }
    }

    /// Load `source`, call its `run(...)` with `args` and convert the result.
    ///
    /// When exception capture is on, a failure is stored as
    /// `"<Kind>: <message>"` in the configured variable and reported as
    /// [`ScriptOutcome::Captured`] instead of an error.
    pub async fn run(
        &self,
        name: &str,
        source: &str,
        args: Vec<Json>,
    ) -> Result<ScriptOutcome, ScriptingError> {
        match self.call_entry_point(name, source, args).await {
            Ok(value) => Ok(ScriptOutcome::Completed(value)),
            Err(err) if self.exceptions.capture => {
                let message = err.script_message();
                let variable = self.exceptions.variable.clone();
                warn!(script = name, variable = %variable, "script failed, captured: {message}");
                self.with_context(|ctx| {
                    ctx.set_variable(&variable, Json::String(message.clone()), 0)
                })??;
                Ok(ScriptOutcome::Captured { variable, message })
            }
            Err(err) => Err(err),
        }
    }

    async fn call_entry_point(
        &self,
        name: &str,
        source: &str,
        args: Vec<Json>,
    ) -> Result<Json, ScriptingError> {
        debug!(script = name, args = args.len(), "loading script");
        // Each script must define its own entry point.
        self.lua.globals().set(ENTRY_POINT, Value::Nil)?;
        self.lua.load(source).set_name(name).exec_async().await?;

        let entry: Option<mlua::Function> = self.lua.globals().get(ENTRY_POINT)?;
        let entry = entry.ok_or_else(|| ScriptingError::MissingEntryPoint(ENTRY_POINT.into()))?;

        let args = args
            .iter()
            .map(|arg| json_to_lua(&self.lua, arg))
            .collect::<LuaResult<Vec<_>>>()?;
        let result: Value = entry.call_async(MultiValue::from_vec(args)).await?;

        Ok(lua_to_json(&self.lua, result)?)
    }

    /// Run `f` against the session's variable store.
    pub fn with_context<R>(&self, f: impl FnOnce(&mut Context) -> R) -> Result<R, ScriptingError> {
        with_context(&self.lua, f).map_err(|_| ScriptingError::HostUnavailable("context"))
    }

    /// Apply sandbox restrictions by removing dangerous globals.
    fn apply_sandbox(lua: &Lua) -> LuaResult<()> {
        let globals = lua.globals();

        // Code loading, filesystem, process and interpreter internals.
        globals.set("dofile", Value::Nil)?;
        globals.set("loadfile", Value::Nil)?;
        globals.set("load", Value::Nil)?;
        globals.set("require", Value::Nil)?;
        globals.set("package", Value::Nil)?;
        globals.set("io", Value::Nil)?;
        globals.set("os", Value::Nil)?;
        globals.set("debug", Value::Nil)?;
        globals.set("collectgarbage", Value::Nil)?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::{Clock, FakeClock};
    use serde_json::json;

    fn engine() -> ScriptEngine {
        ScriptEngine::new(SandboxConfig::restricted(), HostObjects::default()).unwrap()
    }

    fn capturing_engine() -> ScriptEngine {
        let config = ResolvedConfig {
            exceptions: ExceptionCapture { capture: true, variable: "lastError".into() },
            ..Default::default()
        };
        ScriptEngine::from_config(&config).unwrap()
    }

    #[test]
    fn test_time_span_from_minutes() {
        let result = engine().eval_string("TimeSpan.fromMinutes(2)").unwrap();
        assert_eq!(result, "120000.0");
    }

    #[test]
    fn test_context_set_then_get() {
        let engine = engine();
        let result = engine
            .eval_string(
                r#"
                context.setVariableAsync("name", "ana")
                return context.getVariableAsync("name")
                "#,
            )
            .unwrap();
        assert_eq!(result, "ana");
    }

    #[test]
    fn test_context_missing_is_empty_string() {
        let result = engine().eval_string(r#"context.getVariableAsync("nope")"#).unwrap();
        assert_eq!(result, "");
    }

    #[test]
    fn test_context_nil_value_stored_as_empty_object() {
        let engine = engine();
        engine.eval(r#"context.setVariableAsync("blank", nil)"#).unwrap();
        let stored = engine.with_context(|ctx| ctx.get_variable("blank")).unwrap().unwrap();
        assert_eq!(stored, json!({}));
    }

    #[test]
    fn test_context_naming_error_kind() {
        let ok = engine()
            .eval_bool(
                r#"
                local ok, err = pcall(context.getVariableAsync, "")
                return not ok and string.find(tostring(err), "NamingError") ~= nil
                "#,
            )
            .unwrap();
        assert!(ok);
    }

    #[test]
    fn test_context_non_string_name_rejected() {
        let ok = engine()
            .eval_bool(
                r#"
                local ok, err = pcall(context.setVariableAsync, 42, "x")
                return not ok and string.find(tostring(err), "NamingError") ~= nil
                "#,
            )
            .unwrap();
        assert!(ok);
    }

    #[test]
    fn test_context_negative_ttl_leaves_value() {
        let engine = engine();
        let ok = engine
            .eval_bool(
                r#"
                context.setVariableAsync("k", "old")
                local ok, err = pcall(context.setVariableAsync, "k", "new", -5)
                return not ok and string.find(tostring(err), "ExpirationError") ~= nil
                "#,
            )
            .unwrap();
        assert!(ok);
        assert_eq!(engine.eval_string(r#"context.getVariableAsync("k")"#).unwrap(), "old");
    }

    #[test]
    fn test_context_ttl_uses_session_clock() {
        let clock = FakeClock::new(1_700_000_000_000);
        let host = HostObjects::with_clock(&ResolvedConfig::default(), clock.shared());
        let engine = ScriptEngine::new(SandboxConfig::restricted(), host).unwrap();

        engine.eval(r#"context.setVariableAsync("otp", "1234", 1000)"#).unwrap();
        clock.advance_ms(999);
        assert_eq!(engine.eval_string(r#"context.getVariableAsync("otp")"#).unwrap(), "1234");
        clock.advance_ms(1);
        assert_eq!(engine.eval_string(r#"context.getVariableAsync("otp")"#).unwrap(), "");
    }

    #[tokio::test]
    async fn test_run_passes_args_and_returns_json() {
        let outcome = engine()
            .run(
                "sum.lua",
                r#"function run(a, b) return { total = a + b.n } end"#,
                vec![json!(2), json!({"n": 3})],
            )
            .await
            .unwrap();
        assert_eq!(outcome, ScriptOutcome::Completed(json!({"total": 5})));
    }

    #[tokio::test]
    async fn test_run_sleep_advances_fake_clock() {
        let clock = FakeClock::new(0);
        let host = HostObjects::with_clock(&ResolvedConfig::default(), clock.shared());
        let engine = ScriptEngine::new(SandboxConfig::restricted(), host).unwrap();

        let outcome = engine
            .run(
                "sleep.lua",
                r#"function run() time.sleep(TimeSpan.fromMinutes(1)); return "done" end"#,
                vec![],
            )
            .await
            .unwrap();
        assert_eq!(outcome, ScriptOutcome::Completed(json!("done")));
        assert_eq!(clock.now_millis(), 60_000);
    }

    #[tokio::test]
    async fn test_run_without_entry_point() {
        let err = engine().run("empty.lua", "local x = 1", vec![]).await.unwrap_err();
        assert!(matches!(err, ScriptingError::MissingEntryPoint(_)));
    }

    #[tokio::test]
    async fn test_run_does_not_reuse_previous_entry_point() {
        let engine = engine();
        let first = engine
            .run("a.lua", r#"function run() return "from a" end"#, vec![])
            .await
            .unwrap();
        assert_eq!(first, ScriptOutcome::Completed(json!("from a")));

        let err = engine.run("b.lua", "local x = 1", vec![]).await.unwrap_err();
        assert!(matches!(err, ScriptingError::MissingEntryPoint(_)));
    }

    #[tokio::test]
    async fn test_run_error_propagates_without_capture() {
        let err = engine()
            .run("bad.lua", r#"function run() return time.parseDate("not-a-date") end"#, vec![])
            .await
            .unwrap_err();
        assert!(err.script_message().starts_with("InvalidDateError: "));
    }

    #[tokio::test]
    async fn test_run_error_captured_into_variable() {
        let engine = capturing_engine();
        let outcome = engine
            .run("bad.lua", r#"function run() return time.parseDate("not-a-date") end"#, vec![])
            .await
            .unwrap();

        let ScriptOutcome::Captured { variable, message } = outcome else {
            panic!("expected captured outcome");
        };
        assert_eq!(variable, "lastError");
        assert!(message.starts_with("InvalidDateError: "));

        let stored = engine.with_context(|ctx| ctx.get_variable("lastError")).unwrap().unwrap();
        assert_eq!(stored, Json::String(message));
    }

    #[tokio::test]
    async fn test_lua_error_captured_as_script_error() {
        let outcome = capturing_engine()
            .run("boom.lua", r#"function run() error("boom") end"#, vec![])
            .await
            .unwrap();
        let ScriptOutcome::Captured { message, .. } = outcome else {
            panic!("expected captured outcome");
        };
        assert!(message.starts_with("ScriptError: "));
        assert!(message.contains("boom"));
    }

    #[test]
    fn test_context_table_with_number_keys() {
        let engine = engine();
        engine.eval(r#"context.setVariableAsync("m", { [10] = "x" })"#).unwrap();
        let stored = engine.eval_string(r#"context.getVariableAsync("m")["10"]"#).unwrap();
        assert_eq!(stored, "x");
    }

    #[tokio::test]
    async fn test_unconvertible_value_captured_with_kind() {
        let outcome = capturing_engine()
            .run(
                "keys.lua",
                r#"function run() context.setVariableAsync("m", { [{}] = 1 }) end"#,
                vec![],
            )
            .await
            .unwrap();
        let ScriptOutcome::Captured { message, .. } = outcome else {
            panic!("expected captured outcome");
        };
        assert!(message.starts_with("ConversionError: "), "got {message}");
    }

    #[test]
    fn test_sandbox_no_io() {
        let result = engine().eval(r#"io"#).unwrap();
        assert!(result.is_none(), "io should be nil in sandbox");
    }

    #[test]
    fn test_sandbox_no_os() {
        let result = engine().eval(r#"os"#).unwrap();
        assert!(result.is_none(), "os should be nil in sandbox");
    }

    #[test]
    fn test_sandbox_no_require() {
        let result = engine().eval(r#"require"#).unwrap();
        assert!(result.is_none(), "require should be nil in sandbox");
    }

    #[test]
    fn test_sandbox_no_load() {
        let result = engine().eval(r#"load"#).unwrap();
        assert!(result.is_none(), "load should be nil in sandbox");
    }

    #[test]
    fn test_pure_lua_string() {
        let result = engine().eval_string(r#"string.upper("hello")"#).unwrap();
        assert_eq!(result, "HELLO");
    }

    #[test]
    fn test_eval_returns_none_for_no_return() {
        let result = engine().eval(r#"local x = 1"#).unwrap();
        assert!(result.is_none());
    }
}
