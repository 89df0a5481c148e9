//! Reference Node Executor
//!
//! Drives an execution tree through the core: one context per node,
//! conditions, lifecycle callbacks, construction, the test body and teardown.
//! Drivers with different scheduling needs can compose the same building
//! blocks themselves.

mod executor;
mod outcome;

pub use executor::NodeExecutor;
pub use outcome::{NodeOutcome, NodeStatus, OutcomeCounts};
