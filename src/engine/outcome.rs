//! Execution results reported per node.

use crate::collector::{AggregatedFailure, CollectedStatus, ThrowableCollector};
use crate::types::UniqueId;
use serde::{Deserialize, Serialize};

/// Final state of one node
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum NodeStatus {
    Successful,
    Skipped { reason: String },
    Aborted { reason: String },
    Failed { message: String, suppressed: Vec<String> },
}

impl NodeStatus {
    pub(crate) fn from_collector(collector: ThrowableCollector) -> Self {
        match collector.status() {
            CollectedStatus::Successful => NodeStatus::Successful,
            CollectedStatus::Aborted => match collector.into_failure() {
                Some(failure) => NodeStatus::Aborted {
                    reason: format!("{:#}", failure.primary()),
                },
                None => NodeStatus::Successful,
            },
            CollectedStatus::Failed => match collector.into_failure() {
                Some(failure) => Self::failed(&failure),
                None => NodeStatus::Successful,
            },
        }
    }

    fn failed(failure: &AggregatedFailure) -> Self {
        NodeStatus::Failed {
            message: format!("{:#}", failure.primary()),
            suppressed: failure
                .suppressed()
                .iter()
                .map(|error| format!("{:#}", error))
                .collect(),
        }
    }

    pub fn is_successful(&self) -> bool {
        matches!(self, NodeStatus::Successful)
    }

    pub fn is_skipped(&self) -> bool {
        matches!(self, NodeStatus::Skipped { .. })
    }

    pub fn is_aborted(&self) -> bool {
        matches!(self, NodeStatus::Aborted { .. })
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, NodeStatus::Failed { .. })
    }
}

/// Outcome of a node and, recursively, of the children it ran
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeOutcome {
    pub unique_id: UniqueId,
    pub display_name: String,
    pub status: NodeStatus,
    /// RFC 3339 timestamp of when the node started executing
    pub started_at: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<NodeOutcome>,
}

/// Number of nodes per final state in an outcome tree
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct OutcomeCounts {
    pub successful: usize,
    pub skipped: usize,
    pub aborted: usize,
    pub failed: usize,
}

impl NodeOutcome {
    /// Depth-first, parents before children
    pub fn iter(&self) -> impl Iterator<Item = &NodeOutcome> {
        let mut stack = vec![self];
        std::iter::from_fn(move || {
            let next = stack.pop()?;
            stack.extend(next.children.iter().rev());
            Some(next)
        })
    }

    pub fn find(&self, unique_id: &UniqueId) -> Option<&NodeOutcome> {
        self.iter().find(|outcome| &outcome.unique_id == unique_id)
    }

    pub fn find_by_name(&self, display_name: &str) -> Option<&NodeOutcome> {
        self.iter()
            .find(|outcome| outcome.display_name == display_name)
    }

    pub fn counts(&self) -> OutcomeCounts {
        self.iter().fold(OutcomeCounts::default(), |mut counts, outcome| {
            match outcome.status {
                NodeStatus::Successful => counts.successful += 1,
                NodeStatus::Skipped { .. } => counts.skipped += 1,
                NodeStatus::Aborted { .. } => counts.aborted += 1,
                NodeStatus::Failed { .. } => counts.failed += 1,
            }
            counts
        })
    }

    /// Whether no node in the tree failed
    pub fn is_clean(&self) -> bool {
        self.counts().failed == 0
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}
