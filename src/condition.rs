//! Condition Evaluation
//!
//! Decides whether a node runs. Conditions are visited in registry stream
//! order (node-local before inherited); the first disabled result wins.

mod disabled;
pub(crate) mod evaluator;

pub use disabled::DisabledCondition;
pub use evaluator::ConditionEvaluator;

use crate::context::ExtensionContext;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Capability: decide whether the node of `context` should run
pub trait ExecutionCondition: Send + Sync {
    fn evaluate(&self, context: &ExtensionContext) -> anyhow::Result<ConditionEvaluationResult>;
}

/// Outcome of a condition: enabled or disabled, with an optional reason
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConditionEvaluationResult {
    disabled: bool,
    reason: Option<String>,
}

impl ConditionEvaluationResult {
    pub fn enabled(reason: impl Into<String>) -> Self {
        Self {
            disabled: false,
            reason: Some(reason.into()),
        }
    }

    pub fn disabled(reason: impl Into<String>) -> Self {
        Self {
            disabled: true,
            reason: Some(reason.into()),
        }
    }

    pub fn is_disabled(&self) -> bool {
        self.disabled
    }

    pub fn reason(&self) -> Option<&str> {
        self.reason.as_deref()
    }
}

impl fmt::Display for ConditionEvaluationResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = if self.disabled { "disabled" } else { "enabled" };
        match &self.reason {
            Some(reason) => write!(f, "{} ({})", state, reason),
            None => f.write_str(state),
        }
    }
}
