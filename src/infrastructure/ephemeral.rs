use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;

use crate::domain::errors::DomainError;
use crate::domain::ports::{Clock, EphemeralStore};

use super::clock::SystemClock;

#[derive(Debug, Clone)]
enum Value {
    Text(String),
    List(Vec<String>),
}

#[derive(Debug, Clone)]
struct Entry {
    value: Value,
    expires_at: Option<DateTime<Utc>>,
}

impl Entry {
    fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|at| at <= now)
    }
}

/// Process-local key-value store with Redis-like semantics: expired keys vanish on access,
/// `set` drops any previous TTL, and a list that loses its last element is deleted.
pub struct InMemoryEphemeralStore {
    entries: Mutex<HashMap<String, Entry>>,
    clock: Arc<dyn Clock>,
}

impl InMemoryEphemeralStore {
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            clock,
        }
    }

    fn deadline(&self, ttl: Duration) -> Result<DateTime<Utc>, DomainError> {
        let ttl = chrono::Duration::from_std(ttl)
            .map_err(|e| DomainError::InvalidInput(format!("ttl out of range: {e}")))?;
        Ok(self.clock.now() + ttl)
    }

    fn purge_expired(&self, entries: &mut HashMap<String, Entry>, key: &str) {
        let now = self.clock.now();
        if entries.get(key).is_some_and(|e| e.is_expired(now)) {
            entries.remove(key);
        }
    }
}

impl Default for InMemoryEphemeralStore {
    fn default() -> Self {
        Self::new()
    }
}

fn wrong_type(key: &str) -> DomainError {
    DomainError::Internal(format!("key '{key}' holds the wrong kind of value"))
}

impl EphemeralStore for InMemoryEphemeralStore {
    fn set(&self, key: &str, value: String, ttl: Option<Duration>) -> Result<(), DomainError> {
        let expires_at = ttl.map(|t| self.deadline(t)).transpose()?;
        self.entries.lock().insert(
            key.to_string(),
            Entry {
                value: Value::Text(value),
                expires_at,
            },
        );
        Ok(())
    }

    fn set_if_absent(
        &self,
        key: &str,
        value: String,
        ttl: Option<Duration>,
    ) -> Result<bool, DomainError> {
        let expires_at = ttl.map(|t| self.deadline(t)).transpose()?;
        let mut entries = self.entries.lock();
        self.purge_expired(&mut entries, key);
        if entries.contains_key(key) {
            return Ok(false);
        }
        entries.insert(
            key.to_string(),
            Entry {
                value: Value::Text(value),
                expires_at,
            },
        );
        Ok(true)
    }

    fn get(&self, key: &str) -> Result<Option<String>, DomainError> {
        let mut entries = self.entries.lock();
        self.purge_expired(&mut entries, key);
        match entries.get(key) {
            None => Ok(None),
            Some(Entry {
                value: Value::Text(text),
                ..
            }) => Ok(Some(text.clone())),
            Some(_) => Err(wrong_type(key)),
        }
    }

    fn delete(&self, key: &str) -> Result<bool, DomainError> {
        let mut entries = self.entries.lock();
        self.purge_expired(&mut entries, key);
        Ok(entries.remove(key).is_some())
    }

    fn exists(&self, key: &str) -> Result<bool, DomainError> {
        let mut entries = self.entries.lock();
        self.purge_expired(&mut entries, key);
        Ok(entries.contains_key(key))
    }

    fn expire(&self, key: &str, ttl: Duration) -> Result<bool, DomainError> {
        let deadline = self.deadline(ttl)?;
        let mut entries = self.entries.lock();
        self.purge_expired(&mut entries, key);
        match entries.get_mut(key) {
            Some(entry) => {
                entry.expires_at = Some(deadline);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    fn ttl(&self, key: &str) -> Result<Option<Duration>, DomainError> {
        let mut entries = self.entries.lock();
        self.purge_expired(&mut entries, key);
        let now = self.clock.now();
        Ok(entries
            .get(key)
            .and_then(|e| e.expires_at)
            .and_then(|at| (at - now).to_std().ok()))
    }

    fn list_push(&self, key: &str, value: String) -> Result<usize, DomainError> {
        let mut entries = self.entries.lock();
        self.purge_expired(&mut entries, key);
        let entry = entries.entry(key.to_string()).or_insert_with(|| Entry {
            value: Value::List(Vec::new()),
            expires_at: None,
        });
        match &mut entry.value {
            Value::List(items) => {
                items.push(value);
                Ok(items.len())
            }
            Value::Text(_) => Err(wrong_type(key)),
        }
    }

    fn list_range(&self, key: &str) -> Result<Vec<String>, DomainError> {
        let mut entries = self.entries.lock();
        self.purge_expired(&mut entries, key);
        match entries.get(key) {
            None => Ok(Vec::new()),
            Some(Entry {
                value: Value::List(items),
                ..
            }) => Ok(items.clone()),
            Some(_) => Err(wrong_type(key)),
        }
    }

    fn list_remove(&self, key: &str, value: &str, count: usize) -> Result<usize, DomainError> {
        let mut entries = self.entries.lock();
        self.purge_expired(&mut entries, key);
        let Some(entry) = entries.get_mut(key) else {
            return Ok(0);
        };
        let Value::List(items) = &mut entry.value else {
            return Err(wrong_type(key));
        };

        let mut removed = 0;
        items.retain(|item| {
            if removed < count && item == value {
                removed += 1;
                false
            } else {
                true
            }
        });
        if items.is_empty() {
            entries.remove(key);
        }
        Ok(removed)
    }

    fn list_len(&self, key: &str) -> Result<usize, DomainError> {
        Ok(self.list_range(key)?.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::clock::ManualClock;

    fn store() -> (InMemoryEphemeralStore, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::new(Utc::now()));
        (InMemoryEphemeralStore::with_clock(clock.clone()), clock)
    }

    #[test]
    fn keys_vanish_after_their_ttl() {
        let (store, clock) = store();
        store
            .set("k", "v".to_string(), Some(Duration::from_secs(60)))
            .unwrap();
        clock.advance(chrono::Duration::seconds(59));
        assert_eq!(store.get("k").unwrap().as_deref(), Some("v"));
        clock.advance(chrono::Duration::seconds(1));
        assert_eq!(store.get("k").unwrap(), None);
        assert!(!store.exists("k").unwrap());
    }

    #[test]
    fn set_without_ttl_clears_previous_ttl() {
        let (store, _) = store();
        store
            .set("k", "a".to_string(), Some(Duration::from_secs(60)))
            .unwrap();
        store.set("k", "b".to_string(), None).unwrap();
        assert_eq!(store.ttl("k").unwrap(), None);
    }

    #[test]
    fn set_if_absent_only_writes_once() {
        let (store, _) = store();
        assert!(store.set_if_absent("k", "first".to_string(), None).unwrap());
        assert!(!store.set_if_absent("k", "second".to_string(), None).unwrap());
        assert_eq!(store.get("k").unwrap().as_deref(), Some("first"));
    }

    #[test]
    fn set_if_absent_reclaims_an_expired_key() {
        let (store, clock) = store();
        store
            .set("k", "old".to_string(), Some(Duration::from_secs(1)))
            .unwrap();
        clock.advance(chrono::Duration::seconds(2));
        assert!(store.set_if_absent("k", "new".to_string(), None).unwrap());
    }

    #[test]
    fn list_keeps_insertion_order_and_removes_one_occurrence() {
        let (store, _) = store();
        for v in ["a", "b", "a", "c"] {
            store.list_push("l", v.to_string()).unwrap();
        }
        assert_eq!(store.list_remove("l", "a", 1).unwrap(), 1);
        assert_eq!(store.list_range("l").unwrap(), vec!["b", "a", "c"]);
        assert_eq!(store.list_remove("l", "zzz", 1).unwrap(), 0);
    }

    #[test]
    fn emptied_list_is_deleted() {
        let (store, _) = store();
        store.list_push("l", "a".to_string()).unwrap();
        store.expire("l", Duration::from_secs(900)).unwrap();
        store.list_remove("l", "a", 1).unwrap();
        assert!(!store.exists("l").unwrap());
        assert_eq!(store.list_len("l").unwrap(), 0);
    }

    #[test]
    fn push_keeps_existing_ttl() {
        let (store, clock) = store();
        store.list_push("l", "a".to_string()).unwrap();
        store.expire("l", Duration::from_secs(100)).unwrap();
        clock.advance(chrono::Duration::seconds(40));
        store.list_push("l", "b".to_string()).unwrap();
        assert_eq!(store.ttl("l").unwrap(), Some(Duration::from_secs(60)));
    }

    #[test]
    fn expire_on_missing_key_reports_false() {
        let (store, _) = store();
        assert!(!store.expire("nope", Duration::from_secs(5)).unwrap());
    }

    #[test]
    fn list_operations_reject_text_keys() {
        let (store, _) = store();
        store.set("k", "v".to_string(), None).unwrap();
        assert!(matches!(
            store.list_push("k", "x".to_string()),
            Err(DomainError::Internal(_))
        ));
    }
}
