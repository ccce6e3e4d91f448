//! Stand-in runtime objects for bot scripts.
//!
//! Bot scripts receive `context`, `time`, `TimeSpan` and `request` from
//! their host at execution time. This crate implements those objects so
//! scripts can be run and tested outside the host, and embeds them in a
//! sandboxed Lua engine.

pub mod clock;
pub mod context;
pub mod request;
pub mod scripting;
pub mod time;

pub mod config {
    pub mod loader;
    pub mod types;
}

pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
