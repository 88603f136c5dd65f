//! # Error Types
//!
//! Every failure the smoke test can hit falls into one of three groups:
//! configuration problems found before any connection is attempted,
//! store errors raised by a command, and the invariant violation where the
//! store answered fine but the test key survived the pop.

use std::io;
use std::time::Duration;

use thiserror::Error;

use crate::runner::Step;

/// Problems with the configuration, detected before touching the network.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("missing configuration: {var} not found in environment variables")]
    Missing { var: &'static str },

    #[error("invalid sentinel address '{address}': {reason}")]
    InvalidAddress { address: String, reason: String },
}

/// Errors surfaced by a [`SmokeStore`](crate::store::SmokeStore) operation.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error(transparent)]
    Redis(#[from] redis::RedisError),

    #[error("command timed out after {after:?}")]
    Timeout { after: Duration },

    /// Injected failure from the in-memory store.
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Top-level error for a smoke test run.
#[derive(Debug, Error)]
pub enum SmokeError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("({step}) {} failed: {source}", .step.label())]
    Step {
        step: Step,
        #[source]
        source: StoreError,
    },

    #[error("SPOP returned no member for key '{key}'")]
    EmptyPop { key: String },

    #[error("key was not deleted properly")]
    KeyNotDeleted { key: String },

    #[error("failed to write progress output: {0}")]
    Output(#[from] io::Error),
}

impl SmokeError {
    /// The step that failed, if the failure happened inside the sequence.
    pub fn step(&self) -> Option<Step> {
        match self {
            SmokeError::Step { step, .. } => Some(*step),
            SmokeError::EmptyPop { .. } => Some(Step::Pop),
            SmokeError::KeyNotDeleted { .. } => Some(Step::VerifyAbsence),
            _ => None,
        }
    }
}

pub type SmokeResult<T> = Result<T, SmokeError>;
