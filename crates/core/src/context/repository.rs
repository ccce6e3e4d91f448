//! In-memory variable repository with lazy expiry.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde_json::{Map, Value};

use super::types::{VariableEntry, VariableName};

/// Name → entry map owned by a single `Context`.
///
/// Expired entries are only removed when `get` observes them (or when
/// `purge_expired` is called explicitly). Nothing sweeps in the background.
#[derive(Debug, Default, Clone)]
pub struct VariableRepository {
    entries: HashMap<VariableName, VariableEntry>,
}

impl VariableRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// True if a live entry exists. Does not evict.
    pub fn has(&self, name: &VariableName, now: DateTime<Utc>) -> bool {
        self.entries.get(name).is_some_and(|e| !e.is_expired(now))
    }

    /// Return the live value, evicting the entry if it has expired.
    pub fn get(&mut self, name: &VariableName, now: DateTime<Utc>) -> Option<Value> {
        let expired = self.entries.get(name)?.is_expired(now);
        if expired {
            self.entries.remove(name);
            tracing::debug!(variable = %name, "evicted expired variable");
            return None;
        }
        self.entries.get(name).map(|e| e.value().clone())
    }

    /// Store `value`, replacing any previous entry and its TTL.
    ///
    /// `null` is stored as an empty object.
    pub fn set(&mut self, name: VariableName, value: Value, ttl_millis: u64, now: DateTime<Utc>) {
        let value = match value {
            Value::Null => Value::Object(Map::new()),
            other => other,
        };
        self.entries.insert(name, VariableEntry::new(value, ttl_millis, now));
    }

    /// Remove the entry if present. Returns whether anything was removed.
    pub fn delete(&mut self, name: &VariableName) -> bool {
        self.entries.remove(name).is_some()
    }

    /// Drop every entry that has expired at `now`. Returns the count removed.
    pub fn purge_expired(&mut self, now: DateTime<Utc>) -> usize {
        let before = self.entries.len();
        self.entries.retain(|_, entry| !entry.is_expired(now));
        before - self.entries.len()
    }

    /// Live entries sorted by name.
    pub fn live_entries(&self, now: DateTime<Utc>) -> Vec<(&VariableName, &VariableEntry)> {
        let mut live: Vec<_> =
            self.entries.iter().filter(|(_, e)| !e.is_expired(now)).collect();
        live.sort_by(|a, b| a.0.cmp(b.0));
        live
    }

    /// Number of stored entries, expired ones included.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use serde_json::json;

    fn name(s: &str) -> VariableName {
        VariableName::new(s).unwrap()
    }

    fn t0() -> DateTime<Utc> {
        DateTime::from_timestamp_millis(1_700_000_000_000).unwrap()
    }

    #[test]
    fn test_set_then_get() {
        let mut repo = VariableRepository::new();
        repo.set(name("a"), json!({"x": [1, 2]}), 0, t0());
        assert_eq!(repo.get(&name("a"), t0()), Some(json!({"x": [1, 2]})));
    }

    #[test]
    fn test_get_missing_is_none() {
        let mut repo = VariableRepository::new();
        assert_eq!(repo.get(&name("missing"), t0()), None);
    }

    #[test]
    fn test_null_is_stored_as_empty_object() {
        let mut repo = VariableRepository::new();
        repo.set(name("a"), Value::Null, 0, t0());
        assert_eq!(repo.get(&name("a"), t0()), Some(json!({})));
    }

    #[test]
    fn test_has_does_not_evict() {
        let mut repo = VariableRepository::new();
        repo.set(name("a"), json!(1), 10, t0());
        let later = t0() + Duration::milliseconds(10);

        assert!(!repo.has(&name("a"), later));
        assert_eq!(repo.len(), 1);

        assert_eq!(repo.get(&name("a"), later), None);
        assert_eq!(repo.len(), 0);
    }

    #[test]
    fn test_set_replaces_ttl() {
        let mut repo = VariableRepository::new();
        repo.set(name("a"), json!(1), 10, t0());
        repo.set(name("a"), json!(2), 0, t0());
        let much_later = t0() + Duration::days(365);
        assert_eq!(repo.get(&name("a"), much_later), Some(json!(2)));
    }

    #[test]
    fn test_delete_missing_is_noop() {
        let mut repo = VariableRepository::new();
        assert!(!repo.delete(&name("nothing")));
        repo.set(name("a"), json!(true), 0, t0());
        assert!(repo.delete(&name("a")));
        assert!(repo.is_empty());
    }

    #[test]
    fn test_purge_expired_and_live_entries() {
        let mut repo = VariableRepository::new();
        repo.set(name("short"), json!(1), 5, t0());
        repo.set(name("b"), json!(2), 0, t0());
        repo.set(name("a"), json!(3), 0, t0());

        let later = t0() + Duration::milliseconds(5);
        let live: Vec<&str> =
            repo.live_entries(later).into_iter().map(|(n, _)| n.as_str()).collect();
        assert_eq!(live, vec!["a", "b"]);

        assert_eq!(repo.purge_expired(later), 1);
        assert_eq!(repo.len(), 2);
    }
}
