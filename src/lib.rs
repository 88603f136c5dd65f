//! Smoke test for a Redis deployment behind Sentinel.
//!
//! Connects to the current primary through Sentinel and runs four checks in
//! order: `PING`, a set write, `SPOP`, and an `EXISTS` that must report the
//! key gone. The first failure ends the run.

pub mod config;
pub mod error;
pub mod logging;
pub mod runner;
pub mod store;

pub use config::SentinelConfig;
pub use error::{ConfigError, SmokeError, SmokeResult, StoreError};
pub use runner::{SmokeReport, SmokeTest, Step};
pub use store::{InMemoryStore, RedisSentinelStore, SmokeStore};
