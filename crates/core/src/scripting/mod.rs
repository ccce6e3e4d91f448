//! Lua host for bot scripts.
//!
//! This module provides a sandboxed Lua environment that injects the bot
//! runtime objects as globals and runs a script's `run(...)` entry point.
//!
//! # Example
//!
//! ```rust
//! use botshim_core::scripting::{HostObjects, SandboxConfig, ScriptEngine};
//!
//! let engine = ScriptEngine::new(SandboxConfig::restricted(), HostObjects::default()).unwrap();
//! engine.eval(r#"context.setVariableAsync("step", "greeting")"#).unwrap();
//! let step = engine.eval_string(r#"context.getVariableAsync("step")"#).unwrap();
//! assert_eq!(step, "greeting");
//! ```
//!
//! # Available Lua globals
//!
//! - `context` - session variables with optional expiry
//! - `time` - timezone-aware `parseDate`, `dateToString` and `sleep`
//! - `TimeSpan` - unit conversion to milliseconds
//! - `request` - `fetchAsync` HTTP calls
//!
//! Binding failures raise Lua errors whose message starts with the error
//! kind, e.g. `NamingError: ...`.
//!
//! # Security
//!
//! The Lua environment is sandboxed to prevent:
//! - File system access (`io` library removed)
//! - Shell command execution (`os` library removed)
//! - Loading external modules (`require` removed)
//! - Arbitrary code loading (`load`, `loadfile`, `dofile` removed)
//! - Debug library access (`debug` removed)

pub mod bindings;
pub mod engine;
pub mod host;
pub mod request_bindings;
pub mod time_bindings;
pub mod types;

pub use engine::{ENTRY_POINT, ScriptEngine};
pub use host::HostObjects;
pub use types::{HostError, SandboxConfig, ScriptOutcome, ScriptingError};
