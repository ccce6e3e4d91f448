//! Scripting types and error definitions.

use serde_json::Value;
use thiserror::Error;

use crate::config::types::SandboxLimits;
use crate::context::ContextError;
use crate::request::HttpError;
use crate::time::TimeError;

/// Errors that can occur while hosting a script.
#[derive(Debug, Error)]
pub enum ScriptingError {
    /// Error from the Lua runtime, including errors raised by bindings.
    #[error("Lua error: {0}")]
    Lua(#[from] mlua::Error),

    /// The script does not define the entry point.
    #[error("script does not define a '{0}' function")]
    MissingEntryPoint(String),

    /// Host-side context failure outside of a script call.
    #[error(transparent)]
    Context(#[from] ContextError),

    /// A host object was not installed in the Lua state.
    #[error("host object '{0}' not available")]
    HostUnavailable(&'static str),
}

impl ScriptingError {
    /// Render the error the way scripts see it: `"<Kind>: <message>"`.
    pub fn script_message(&self) -> String {
        match self {
            Self::Lua(err) => describe_lua_error(err),
            Self::MissingEntryPoint(_) | Self::HostUnavailable(_) => {
                format!("ScriptError: {self}")
            }
            Self::Context(err) => format!("{}: {err}", err.kind()),
        }
    }
}

/// Error raised into Lua by a host binding.
///
/// Its display form is the script-visible `"<Kind>: <message>"`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind}: {message}")]
pub struct HostError {
    pub kind: &'static str,
    pub message: String,
}

impl HostError {
    pub fn new(kind: &'static str, message: impl Into<String>) -> Self {
        Self { kind, message: message.into() }
    }

    /// Wrap into an error Lua can raise and the engine can recover.
    pub fn into_lua(self) -> mlua::Error {
        mlua::Error::external(self)
    }
}

impl From<ContextError> for HostError {
    fn from(err: ContextError) -> Self {
        Self::new(err.kind(), err.to_string())
    }
}

impl From<TimeError> for HostError {
    fn from(err: TimeError) -> Self {
        Self::new(err.kind(), err.to_string())
    }
}

impl From<HttpError> for HostError {
    fn from(err: HttpError) -> Self {
        Self::new(err.kind(), err.to_string())
    }
}

/// Walk callback wrappers down to the error that was actually raised.
fn root_cause(err: &mlua::Error) -> &mlua::Error {
    match err {
        mlua::Error::CallbackError { cause, .. } => root_cause(cause),
        mlua::Error::WithContext { cause, .. } => root_cause(cause),
        other => other,
    }
}

fn describe_lua_error(err: &mlua::Error) -> String {
    match root_cause(err) {
        mlua::Error::ExternalError(inner) => match inner.downcast_ref::<HostError>() {
            Some(host) => host.to_string(),
            None => format!("ScriptError: {inner}"),
        },
        mlua::Error::RuntimeError(msg) => format!("ScriptError: {msg}"),
        mlua::Error::SyntaxError { message, .. } => format!("SyntaxError: {message}"),
        mlua::Error::MemoryError(msg) => format!("MemoryError: {msg}"),
        other => format!("ScriptError: {other}"),
    }
}

/// How a script run ended.
#[derive(Debug, Clone, PartialEq)]
pub enum ScriptOutcome {
    /// The entry point returned this value.
    Completed(Value),
    /// The script failed and the failure was stored in `variable`.
    Captured { variable: String, message: String },
}

/// Configuration for the Lua sandbox.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SandboxConfig {
    /// Maximum memory the Lua VM can allocate (in bytes). 0 = unlimited.
    pub memory_limit: usize,
}

impl Default for SandboxConfig {
    fn default() -> Self {
        Self::restricted()
    }
}

impl SandboxConfig {
    /// A restrictive sandbox suitable for user scripts.
    pub fn restricted() -> Self {
        Self { memory_limit: 10 * 1024 * 1024 }
    }

    pub fn unlimited() -> Self {
        Self { memory_limit: 0 }
    }
}

impl From<&SandboxLimits> for SandboxConfig {
    fn from(limits: &SandboxLimits) -> Self {
        Self { memory_limit: limits.memory_limit_mb.saturating_mul(1024 * 1024) }
    }
}
