//! Variable store value types.

use std::fmt;

use chrono::{DateTime, Duration, Utc};
use serde_json::Value;

use super::manager::ContextError;

/// A validated, non-empty variable identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VariableName(String);

impl VariableName {
    /// Validate a name supplied by Rust callers.
    pub fn new(name: impl Into<String>) -> Result<Self, ContextError> {
        let name = name.into();
        if name.is_empty() {
            return Err(ContextError::Naming("variable name must not be empty".into()));
        }
        Ok(Self(name))
    }

    /// Validate a dynamically typed name, as received from script code.
    ///
    /// Anything other than a non-empty JSON string is rejected.
    pub fn from_value(value: &Value) -> Result<Self, ContextError> {
        match value {
            Value::String(s) => Self::new(s.as_str()),
            Value::Null => Err(ContextError::Naming("variable name is missing".into())),
            other => Err(ContextError::Naming(format!(
                "variable name must be a string, got {}",
                json_type_name(other)
            ))),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for VariableName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// A stored value and its optional expiry instant.
#[derive(Debug, Clone, PartialEq)]
pub struct VariableEntry {
    value: Value,
    expires_at: Option<DateTime<Utc>>,
}

impl VariableEntry {
    /// Build an entry stored at `now`. A zero TTL never expires, and so does
    /// one too large to represent.
    pub fn new(value: Value, ttl_millis: u64, now: DateTime<Utc>) -> Self {
        let expires_at = if ttl_millis > 0 {
            i64::try_from(ttl_millis)
                .ok()
                .and_then(Duration::try_milliseconds)
                .and_then(|ttl| now.checked_add_signed(ttl))
        } else {
            None
        };
        Self { value, expires_at }
    }

    pub fn value(&self) -> &Value {
        &self.value
    }

    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        self.expires_at
    }

    /// An entry is expired once `now` reaches its expiry instant.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|t| now >= t)
    }
}
