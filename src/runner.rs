//! The four-step smoke test sequence
//!
//! Each step prints a header line, runs its commands and prints a result
//! line. The first failure prints a labelled error line and ends the run;
//! nothing after it is attempted and nothing is rolled back.

use std::fmt;
use std::io::Write;

use uuid::Uuid;

use crate::error::{SmokeError, SmokeResult, StoreError};
use crate::store::SmokeStore;

/// Member written into the test set.
pub const TEST_VALUE: &str = "testValue";

const STEP_COUNT: u8 = 4;

/// A step of the sequence, displayed as `n/4`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Ping,
    Write,
    Pop,
    VerifyAbsence,
}

impl Step {
    pub fn number(self) -> u8 {
        match self {
            Step::Ping => 1,
            Step::Write => 2,
            Step::Pop => 3,
            Step::VerifyAbsence => 4,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Step::Ping => "ping",
            Step::Write => "write",
            Step::Pop => "SPop",
            Step::VerifyAbsence => "existence check",
        }
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.number(), STEP_COUNT)
    }
}

/// What a successful run observed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SmokeReport {
    pub key: String,
    pub pong: String,
    pub popped: String,
}

/// One smoke test run against a single key.
pub struct SmokeTest<W: Write> {
    key: String,
    out: W,
}

impl<W: Write> SmokeTest<W> {
    /// Run against a fresh random key.
    pub fn new(out: W) -> Self {
        Self::with_key(Uuid::new_v4().to_string(), out)
    }

    pub fn with_key(key: impl Into<String>, out: W) -> Self {
        Self {
            key: key.into(),
            out,
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// Give back the output sink, e.g. to inspect captured lines.
    pub fn into_output(self) -> W {
        self.out
    }

    /// Execute all four steps in order, stopping at the first failure.
    pub async fn run<S>(&mut self, store: &mut S) -> SmokeResult<SmokeReport>
    where
        S: SmokeStore + ?Sized,
    {
        writeln!(self.out, "\n***** Redis Sentinel Test*****\n")?;
        writeln!(self.out, ">>> started testing Redis")?;

        let pong = self.ping(store).await?;
        self.write(store).await?;
        let popped = self.pop(store).await?;
        self.verify_absence(store).await?;

        writeln!(self.out, ">>> finished testing, exiting gracefully now.")?;
        tracing::info!(key = %self.key, "Smoke test finished");

        Ok(SmokeReport {
            key: self.key.clone(),
            pong,
            popped,
        })
    }

    async fn ping<S: SmokeStore + ?Sized>(&mut self, store: &mut S) -> SmokeResult<String> {
        let step = Step::Ping;
        writeln!(self.out, ">>> ({}) testing ping", step)?;
        tracing::info!(step = %step, "Sending PING");

        let pong = match store.ping().await {
            Ok(pong) => pong,
            Err(e) => return Err(self.fail(step, "failed ping", e)),
        };

        writeln!(self.out, "\t>>> ({}) result: successful ping: {}", step, pong)?;
        Ok(pong)
    }

    async fn write<S: SmokeStore + ?Sized>(&mut self, store: &mut S) -> SmokeResult<()> {
        let step = Step::Write;
        writeln!(
            self.out,
            ">>> ({}) testing writing the key-value '{}:{}'",
            step, self.key, TEST_VALUE
        )?;
        tracing::info!(step = %step, key = %self.key, "Writing test member");

        // The key must not exist before the write.
        if let Err(e) = store.del(&self.key).await {
            return Err(self.fail(step, "failed deleting key", e));
        }
        if let Err(e) = store.sadd(&self.key, TEST_VALUE).await {
            return Err(self.fail(step, "failed writing", e));
        }

        writeln!(self.out, "\t>>> ({}) result: successful write", step)?;
        Ok(())
    }

    async fn pop<S: SmokeStore + ?Sized>(&mut self, store: &mut S) -> SmokeResult<String> {
        let step = Step::Pop;
        writeln!(self.out, ">>> ({}) testing popping the test key-value", step)?;
        tracing::info!(step = %step, key = %self.key, "Popping test member");

        let popped = match store.spop(&self.key).await {
            Ok(Some(member)) => member,
            Ok(None) => {
                let err = SmokeError::EmptyPop {
                    key: self.key.clone(),
                };
                self.report_failure(step, "failed SPop", &err);
                return Err(err);
            }
            Err(e) => return Err(self.fail(step, "failed SPop", e)),
        };

        writeln!(self.out, "\t>>> ({}) result: successful SPop: {}", step, popped)?;
        Ok(popped)
    }

    async fn verify_absence<S: SmokeStore + ?Sized>(&mut self, store: &mut S) -> SmokeResult<()> {
        let step = Step::VerifyAbsence;
        writeln!(
            self.out,
            ">>> ({}) checking that the key doesn't exist after popping",
            step
        )?;
        tracing::info!(step = %step, key = %self.key, "Checking key existence");

        let exists = match store.exists(&self.key).await {
            Ok(count) => count,
            Err(e) => return Err(self.fail(step, "failed to check key existence", e)),
        };

        if exists != 0 {
            writeln!(self.out, "\t>>> ({}) result: ERROR key still exists", step)?;
            tracing::error!(step = %step, key = %self.key, count = exists, "Key survived the pop");
            return Err(SmokeError::KeyNotDeleted {
                key: self.key.clone(),
            });
        }

        writeln!(
            self.out,
            "\t>>> ({}) result: as expected, key does not exist",
            step
        )?;
        Ok(())
    }

    fn fail(&mut self, step: Step, what: &str, source: StoreError) -> SmokeError {
        self.report_failure(step, what, &source);
        SmokeError::Step { step, source }
    }

    /// Print the failure line. A broken output sink must not mask the store error.
    fn report_failure(&mut self, step: Step, what: &str, err: &dyn std::error::Error) {
        tracing::error!(step = %step, error = %err, "{}", what);
        let _ = writeln!(self.out, "\t>>> ({}) result: {}: {}", step, what, err);
    }
}
