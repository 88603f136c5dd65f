//! Store backends the smoke test can run against
//!
//! The sequence only needs five commands, so the seam is a narrow async
//! trait. [`RedisSentinelStore`] talks to a real deployment through
//! Sentinel; [`InMemoryStore`] mimics the same command semantics for tests.

pub mod memory;
pub mod sentinel;

use std::fmt;

use async_trait::async_trait;

use crate::error::StoreError;

pub use memory::InMemoryStore;
pub use sentinel::RedisSentinelStore;

/// Commands issued by the smoke test.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Ping,
    Del,
    SAdd,
    SPop,
    Exists,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Operation::Ping => "PING",
            Operation::Del => "DEL",
            Operation::SAdd => "SADD",
            Operation::SPop => "SPOP",
            Operation::Exists => "EXISTS",
        };
        f.write_str(name)
    }
}

/// Minimal command surface of a Redis-compatible store.
#[async_trait]
pub trait SmokeStore: Send {
    /// Liveness probe, returns the acknowledgement payload.
    async fn ping(&mut self) -> Result<String, StoreError>;

    /// Delete `key`, returning how many keys were removed. Missing keys are not an error.
    async fn del(&mut self, key: &str) -> Result<i64, StoreError>;

    /// Add `member` to the set at `key`, returning how many members were new.
    async fn sadd(&mut self, key: &str, member: &str) -> Result<i64, StoreError>;

    /// Remove and return an arbitrary member of the set at `key`.
    async fn spop(&mut self, key: &str) -> Result<Option<String>, StoreError>;

    /// Number of the given keys that exist.
    async fn exists(&mut self, key: &str) -> Result<i64, StoreError>;
}
