//! Session-scoped variable context.

use std::collections::BTreeMap;

use serde_json::Value;

use super::repository::VariableRepository;
use super::types::VariableName;
use crate::clock::{SharedClock, SystemClock};

/// Error type for context operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ContextError {
    #[error("invalid variable name: {0}")]
    Naming(String),

    #[error("negative expiration not allowed; use zero for no expiration (got {0})")]
    Expiration(i64),
}

impl ContextError {
    /// Name of the error kind as shown to scripts.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Naming(_) => "NamingError",
            Self::Expiration(_) => "ExpirationError",
        }
    }
}

type Result<T> = std::result::Result<T, ContextError>;

/// Variables visible to one script session.
///
/// The `*_async` methods mirror the host's asynchronous API. They never
/// suspend; the synchronous methods do the actual work.
pub struct Context {
    repository: VariableRepository,
    clock: SharedClock,
}

impl Context {
    pub fn new() -> Self {
        Self::with_clock(SystemClock::shared())
    }

    /// Create a context that reads expiry time from `clock`.
    pub fn with_clock(clock: SharedClock) -> Self {
        Self { repository: VariableRepository::new(), clock }
    }

    /// Get a variable, or `""` when it is absent or expired.
    pub fn get_variable(&mut self, name: &str) -> Result<Value> {
        let name = VariableName::new(name)?;
        Ok(self.lookup(&name).unwrap_or_else(|| Value::String(String::new())))
    }

    /// Get a variable, or `None` when it is absent or expired.
    pub fn lookup(&mut self, name: &VariableName) -> Option<Value> {
        let now = self.clock.now();
        self.repository.get(name, now)
    }

    /// Store a variable. `ttl_millis == 0` means no expiration.
    pub fn set_variable(&mut self, name: &str, value: Value, ttl_millis: i64) -> Result<()> {
        let name = VariableName::new(name)?;
        let ttl = u64::try_from(ttl_millis).map_err(|_| ContextError::Expiration(ttl_millis))?;
        tracing::debug!(variable = %name, ttl_millis = ttl, "set variable");
        let now = self.clock.now();
        self.repository.set(name, value, ttl, now);
        Ok(())
    }

    /// Delete a variable. Deleting an absent variable is not an error.
    pub fn delete_variable(&mut self, name: &str) -> Result<()> {
        let name = VariableName::new(name)?;
        if self.repository.delete(&name) {
            tracing::debug!(variable = %name, "deleted variable");
        }
        Ok(())
    }

    pub fn has_variable(&self, name: &str) -> Result<bool> {
        let name = VariableName::new(name)?;
        Ok(self.repository.has(&name, self.clock.now()))
    }

    pub async fn get_variable_async(&mut self, name: &str) -> Result<Value> {
        self.get_variable(name)
    }

    pub async fn set_variable_async(
        &mut self,
        name: &str,
        value: Value,
        ttl_millis: i64,
    ) -> Result<()> {
        self.set_variable(name, value, ttl_millis)
    }

    pub async fn delete_variable_async(&mut self, name: &str) -> Result<()> {
        self.delete_variable(name)
    }

    /// Snapshot of live variables, keyed by name.
    pub fn variables(&self) -> BTreeMap<String, Value> {
        self.repository
            .live_entries(self.clock.now())
            .into_iter()
            .map(|(name, entry)| (name.to_string(), entry.value().clone()))
            .collect()
    }

    /// Remove expired entries now instead of waiting for them to be read.
    pub fn purge_expired(&mut self) -> usize {
        let now = self.clock.now();
        self.repository.purge_expired(now)
    }
}

impl Default for Context {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Context {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Context").field("repository", &self.repository).finish_non_exhaustive()
    }
}
