//! Throwable Collector
//!
//! Runs independent actions and aggregates their failures instead of stopping
//! at the first one. Used by store teardown and by the node executor.

use crate::error::is_aborted;
use std::fmt;
use std::panic::{catch_unwind, AssertUnwindSafe};
use tracing::debug;

/// Outcome classification of the collected failures
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CollectedStatus {
    Successful,
    Aborted,
    Failed,
}

/// Collects failures from independent actions.
///
/// The first failure becomes the primary one and later failures are attached
/// as suppressed. An aborted primary is replaced by the next non-abort
/// failure (the abort is then suppressed), never the other way around.
#[derive(Debug, Default)]
pub struct ThrowableCollector {
    primary: Option<anyhow::Error>,
    suppressed: Vec<anyhow::Error>,
}

impl ThrowableCollector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `action`, recording its error or panic
    pub fn execute<F>(&mut self, action: F)
    where
        F: FnOnce() -> anyhow::Result<()>,
    {
        match catch_unwind(AssertUnwindSafe(action)) {
            Ok(Ok(())) => {}
            Ok(Err(error)) => self.record(error),
            Err(payload) => self.record(anyhow::anyhow!(
                "panicked: {}",
                panic_message(payload.as_ref())
            )),
        }
    }

    /// Record a failure that was produced outside of [`execute`](Self::execute)
    pub fn record(&mut self, error: anyhow::Error) {
        debug!(aborted = is_aborted(&error), error = %error, "Collected failure");
        match self.primary.take() {
            None => self.primary = Some(error),
            Some(current) if is_aborted(&current) && !is_aborted(&error) => {
                self.suppressed.insert(0, current);
                self.primary = Some(error);
            }
            Some(current) => {
                self.primary = Some(current);
                self.suppressed.push(error);
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        self.primary.is_none()
    }

    pub fn status(&self) -> CollectedStatus {
        match &self.primary {
            None => CollectedStatus::Successful,
            Some(error) if is_aborted(error) => CollectedStatus::Aborted,
            Some(_) => CollectedStatus::Failed,
        }
    }

    pub fn primary(&self) -> Option<&anyhow::Error> {
        self.primary.as_ref()
    }

    /// Consume the collector, returning the aggregated failure if any
    pub fn into_failure(self) -> Option<AggregatedFailure> {
        self.primary.map(|primary| AggregatedFailure {
            primary,
            suppressed: self.suppressed,
        })
    }

    /// Consume the collector, failing with the aggregated failure if any action failed
    pub fn assert_empty(self) -> Result<(), AggregatedFailure> {
        match self.into_failure() {
            None => Ok(()),
            Some(failure) => Err(failure),
        }
    }
}

/// One primary failure plus every failure suppressed behind it
#[derive(Debug)]
pub struct AggregatedFailure {
    primary: anyhow::Error,
    suppressed: Vec<anyhow::Error>,
}

impl AggregatedFailure {
    pub fn primary(&self) -> &anyhow::Error {
        &self.primary
    }

    pub fn suppressed(&self) -> &[anyhow::Error] {
        &self.suppressed
    }

    pub fn is_aborted(&self) -> bool {
        is_aborted(&self.primary)
    }

    /// All failures, primary first
    pub fn causes(&self) -> impl Iterator<Item = &anyhow::Error> {
        std::iter::once(&self.primary).chain(self.suppressed.iter())
    }

    pub fn len(&self) -> usize {
        1 + self.suppressed.len()
    }

    pub fn into_primary(self) -> anyhow::Error {
        self.primary
    }

    /// All failures by value, primary first
    pub fn into_causes(self) -> Vec<anyhow::Error> {
        let mut causes = Vec::with_capacity(self.len());
        causes.push(self.primary);
        causes.extend(self.suppressed);
        causes
    }
}

impl fmt::Display for AggregatedFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.primary)?;
        if !self.suppressed.is_empty() {
            write!(f, " ({} suppressed:", self.suppressed.len())?;
            for error in &self.suppressed {
                write!(f, " [{}]", error)?;
            }
            write!(f, ")")?;
        }
        Ok(())
    }
}

impl std::error::Error for AggregatedFailure {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&*self.primary)
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
