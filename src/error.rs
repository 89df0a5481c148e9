//! Error types for the execution core.

use std::fmt;
use thiserror::Error;

/// Value store errors
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Object stored under key [{key}] in {namespace} is not of required type [{expected}] but [{actual}]")]
    TypeMismatch {
        namespace: String,
        key: String,
        expected: &'static str,
        actual: &'static str,
    },

    #[error("Store of [{0}] has been closed and can no longer be modified or queried")]
    Closed(String),

    #[error("Failed to compute value for key [{key}] in {namespace}: {source}")]
    ComputeFailed {
        namespace: String,
        key: String,
        #[source]
        source: anyhow::Error,
    },
}

/// Parameter resolution errors
#[derive(Debug, Error)]
pub enum ResolutionError {
    #[error("No ParameterResolver registered for parameter [{parameter}] in {target}")]
    NoResolverFound { parameter: String, target: String },

    #[error(
        "Discovered multiple competing ParameterResolvers for parameter [{parameter}] in {target}: {}",
        resolvers.join(", ")
    )]
    AmbiguousResolvers {
        parameter: String,
        target: String,
        resolvers: Vec<String>,
    },

    #[error("ParameterResolver [{resolver}] resolved no value for parameter [{parameter}] in {target}, but a value of type [{expected}] is required")]
    NullForPrimitive {
        resolver: String,
        parameter: String,
        target: String,
        expected: &'static str,
    },

    #[error("ParameterResolver [{resolver}] resolved a value of type [{actual}] for parameter [{parameter}] in {target}, but a value of type [{expected}] is required")]
    InvalidResolvedType {
        resolver: String,
        parameter: String,
        target: String,
        expected: &'static str,
        actual: &'static str,
    },

    #[error("ParameterResolver [{resolver}] failed for parameter [{parameter}] in {target}: {source}")]
    ResolverFailed {
        resolver: String,
        parameter: String,
        target: String,
        #[source]
        source: anyhow::Error,
    },
}

/// A condition raised an error while being evaluated
#[derive(Debug, Error)]
#[error("Failed to evaluate condition [{condition}]: {source}")]
pub struct ConditionEvaluationError {
    pub condition: String,
    #[source]
    pub source: anyhow::Error,
}

/// Lifecycle state of a reified invocation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InvocationStatus {
    Pending,
    Invoked,
    Skipped,
}

impl fmt::Display for InvocationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            InvocationStatus::Pending => "pending",
            InvocationStatus::Invoked => "invoked",
            InvocationStatus::Skipped => "skipped",
        };
        f.write_str(name)
    }
}

/// Ways an interceptor can break the proceed-exactly-once protocol
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChainViolation {
    NeverInvoked,
    InvokedMultipleTimes,
}

impl fmt::Display for ChainViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChainViolation::NeverInvoked => f.write_str("never called proceed or skip"),
            ChainViolation::InvokedMultipleTimes => {
                f.write_str("called proceed or skip more than once")
            }
        }
    }
}

/// Invocation protocol errors
#[derive(Debug, Error)]
pub enum InvocationError {
    #[error("Invocation is already {current} and cannot become {attempted}")]
    IllegalInvocationState {
        current: InvocationStatus,
        attempted: InvocationStatus,
    },

    #[error(
        "Chain of InvocationInterceptors is broken: [{offender}] {violation} (registered interceptors: {})",
        interceptors.join(", ")
    )]
    ChainIntegrity {
        violation: ChainViolation,
        offender: String,
        interceptors: Vec<String>,
    },

    #[error("{0} completed without producing an instance")]
    MissingInstance(String),
}

/// Registry and configuration setup errors. Never retried.
#[derive(Debug, Error)]
pub enum ConfigurationError {
    #[error("Extension [{extension}] was streamed as {capability} but does not implement it")]
    MissingCapability {
        extension: String,
        capability: &'static str,
    },

    #[error("Cannot register extension [{extension}] for [{context}]: extension dispatch has already started")]
    RegistrySealed { extension: String, context: String },

    #[error("Invalid configuration: {0}")]
    Invalid(String),

    #[error("Configuration error: {0}")]
    Load(#[from] config::ConfigError),
}

/// Top-level error surfaced to the execution driver
#[derive(Debug, Error)]
pub enum ExecutionError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Resolution(#[from] ResolutionError),

    #[error(transparent)]
    Condition(#[from] ConditionEvaluationError),

    #[error(transparent)]
    Invocation(#[from] InvocationError),

    #[error(transparent)]
    Configuration(#[from] ConfigurationError),
}

/// Abort-style failure: the node is not applicable rather than broken.
///
/// Failure aggregation ranks aborts below every other failure.
#[derive(Debug, Error)]
#[error("Aborted: {reason}")]
pub struct Aborted {
    pub reason: String,
}

impl Aborted {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

/// Whether an error chain describes an aborted execution
pub fn is_aborted(error: &anyhow::Error) -> bool {
    error.downcast_ref::<Aborted>().is_some()
}
