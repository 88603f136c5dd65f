use std::collections::{HashMap, HashSet};

use async_trait::async_trait;

use super::{Operation, SmokeStore};
use crate::error::StoreError;

/// Transient set store with Redis command semantics.
///
/// Every issued command is recorded in order so tests can check which steps
/// ran. A failure can be injected on one operation, the store can be told
/// to keep empty sets around instead of dropping the key the way Redis does,
/// and it can acknowledge writes it then loses.
///
/// # Example
///
/// ```rust
/// use sentinel_smoke::store::{InMemoryStore, Operation, SmokeStore};
///
/// # tokio_test_block_on(async {
/// let mut store = InMemoryStore::new();
/// store.sadd("k", "v").await.unwrap();
/// assert_eq!(store.spop("k").await.unwrap(), Some("v".to_string()));
/// assert_eq!(store.exists("k").await.unwrap(), 0);
/// assert_eq!(store.operations(), &[Operation::SAdd, Operation::SPop, Operation::Exists]);
/// # });
/// # fn tokio_test_block_on<F: std::future::Future>(f: F) -> F::Output {
/// #     tokio::runtime::Builder::new_current_thread().build().unwrap().block_on(f)
/// # }
/// ```
#[derive(Debug, Default)]
pub struct InMemoryStore {
    sets: HashMap<String, HashSet<String>>,
    operations: Vec<Operation>,
    fail_on: Option<(Operation, String)>,
    keep_empty_sets: bool,
    drop_writes: bool,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every `operation` fail with `message`.
    pub fn failing_on(mut self, operation: Operation, message: impl Into<String>) -> Self {
        self.fail_on = Some((operation, message.into()));
        self
    }

    /// Keep a key whose set became empty, so it still counts in `EXISTS`.
    pub fn keeping_empty_sets(mut self) -> Self {
        self.keep_empty_sets = true;
        self
    }

    /// Acknowledge `SADD` without storing anything, like a primary that
    /// lost the write.
    pub fn dropping_writes(mut self) -> Self {
        self.drop_writes = true;
        self
    }

    /// Commands issued so far, including failed ones.
    pub fn operations(&self) -> &[Operation] {
        &self.operations
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.sets.contains_key(key)
    }

    fn record(&mut self, operation: Operation) -> Result<(), StoreError> {
        self.operations.push(operation);
        match &self.fail_on {
            Some((failing, message)) if *failing == operation => {
                Err(StoreError::Unavailable(message.clone()))
            }
            _ => Ok(()),
        }
    }
}

#[async_trait]
impl SmokeStore for InMemoryStore {
    async fn ping(&mut self) -> Result<String, StoreError> {
        self.record(Operation::Ping)?;
        Ok("PONG".to_string())
    }

    async fn del(&mut self, key: &str) -> Result<i64, StoreError> {
        self.record(Operation::Del)?;
        Ok(i64::from(self.sets.remove(key).is_some()))
    }

    async fn sadd(&mut self, key: &str, member: &str) -> Result<i64, StoreError> {
        self.record(Operation::SAdd)?;
        if self.drop_writes {
            return Ok(1);
        }
        let inserted = self
            .sets
            .entry(key.to_string())
            .or_default()
            .insert(member.to_string());
        Ok(i64::from(inserted))
    }

    async fn spop(&mut self, key: &str) -> Result<Option<String>, StoreError> {
        self.record(Operation::SPop)?;
        let Some(set) = self.sets.get_mut(key) else {
            return Ok(None);
        };

        let popped = set.iter().next().cloned();
        if let Some(member) = &popped {
            set.remove(member);
        }
        if set.is_empty() && !self.keep_empty_sets {
            self.sets.remove(key);
        }
        Ok(popped)
    }

    async fn exists(&mut self, key: &str) -> Result<i64, StoreError> {
        self.record(Operation::Exists)?;
        Ok(i64::from(self.sets.contains_key(key)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn deleting_missing_key_is_not_an_error() {
        let mut store = InMemoryStore::new();
        assert_eq!(store.del("absent").await.unwrap(), 0);
    }

    #[tokio::test]
    async fn sadd_counts_only_new_members() {
        let mut store = InMemoryStore::new();
        assert_eq!(store.sadd("k", "a").await.unwrap(), 1);
        assert_eq!(store.sadd("k", "a").await.unwrap(), 0);
        assert_eq!(store.sadd("k", "b").await.unwrap(), 1);
    }

    #[tokio::test]
    async fn popping_last_member_drops_the_key() {
        let mut store = InMemoryStore::new();
        store.sadd("k", "only").await.unwrap();

        assert_eq!(store.spop("k").await.unwrap().as_deref(), Some("only"));
        assert!(!store.contains_key("k"));
        assert_eq!(store.exists("k").await.unwrap(), 0);
        assert_eq!(store.spop("k").await.unwrap(), None);
    }

    #[tokio::test]
    async fn empty_sets_can_be_retained() {
        let mut store = InMemoryStore::new().keeping_empty_sets();
        store.sadd("k", "only").await.unwrap();
        store.spop("k").await.unwrap();

        assert_eq!(store.exists("k").await.unwrap(), 1);
    }

    #[tokio::test]
    async fn dropped_write_leaves_nothing_to_pop() {
        let mut store = InMemoryStore::new().dropping_writes();

        assert_eq!(store.sadd("k", "v").await.unwrap(), 1);
        assert!(!store.contains_key("k"));
        assert_eq!(store.spop("k").await.unwrap(), None);
    }

    #[tokio::test]
    async fn injected_failure_hits_only_that_operation() {
        let mut store = InMemoryStore::new().failing_on(Operation::SAdd, "read only replica");

        assert!(store.ping().await.is_ok());
        let err = store.sadd("k", "v").await.unwrap_err();
        assert_eq!(err.to_string(), "store unavailable: read only replica");
        assert!(!store.contains_key("k"));
        assert_eq!(store.operations(), &[Operation::Ping, Operation::SAdd]);
    }
}
