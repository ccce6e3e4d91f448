//! Runtime objects a script session is given.
//!
//! `HostObjects` bundles the `context`, `time` and `request` collaborators
//! plus the exception capture policy for one session. The engine moves
//! them into the Lua state's app data, so each session owns its own
//! variable store.

use crate::clock::{SharedClock, SystemClock};
use crate::config::types::{ExceptionCapture, ResolvedConfig};
use crate::context::Context;
use crate::request::Request;
use crate::time::Time;

/// Collaborators injected into one script session.
#[derive(Debug)]
pub struct HostObjects {
    pub context: Context,
    pub time: Time,
    pub request: Request,
    pub exceptions: ExceptionCapture,
}

impl HostObjects {
    /// Build the session objects for the active profile.
    pub fn from_config(config: &ResolvedConfig) -> Self {
        Self::with_clock(config, SystemClock::shared())
    }

    /// Same as [`HostObjects::from_config`], reading time from `clock`.
    pub fn with_clock(config: &ResolvedConfig, clock: SharedClock) -> Self {
        Self {
            context: Context::with_clock(clock.clone()),
            time: Time::with_clock(config.default_timezone(), clock),
            request: Request::new(config.http.timeout()),
            exceptions: config.exceptions.clone(),
        }
    }
}

impl Default for HostObjects {
    fn default() -> Self {
        Self::from_config(&ResolvedConfig::default())
    }
}
