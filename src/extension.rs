//! Extension Model
//!
//! An extension is a plain object that opts into capabilities by returning
//! itself from the matching `as_*` accessor. Registries stream extensions by
//! capability; the condition evaluator, parameter resolution, interceptor chain
//! and node executor each consume the capability they care about.

pub mod lifecycle;
pub mod registry;

pub use lifecycle::{ExecutionExceptionHandler, LifecycleCallback};
pub use registry::ExtensionRegistry;

use crate::condition::ExecutionCondition;
use crate::invocation::InvocationInterceptor;
use crate::resolution::ParameterResolver;
use std::fmt;

/// A pluggable object implementing any subset of the capability traits.
///
/// Extensions are immutable once registered; shared state belongs in the
/// context's value store.
pub trait Extension: Send + Sync + 'static {
    /// Identity used in diagnostics and for condition deactivation patterns
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }

    fn as_condition(&self) -> Option<&dyn ExecutionCondition> {
        None
    }

    fn as_parameter_resolver(&self) -> Option<&dyn ParameterResolver> {
        None
    }

    fn as_invocation_interceptor(&self) -> Option<&dyn InvocationInterceptor> {
        None
    }

    fn as_lifecycle_callback(&self) -> Option<&dyn LifecycleCallback> {
        None
    }

    fn as_exception_handler(&self) -> Option<&dyn ExecutionExceptionHandler> {
        None
    }
}

/// Capabilities an extension can provide
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Capability {
    Condition,
    ParameterResolver,
    InvocationInterceptor,
    LifecycleCallback,
    ExceptionHandler,
}

impl Capability {
    pub const ALL: [Capability; 5] = [
        Capability::Condition,
        Capability::ParameterResolver,
        Capability::InvocationInterceptor,
        Capability::LifecycleCallback,
        Capability::ExceptionHandler,
    ];

    pub fn is_implemented_by(self, extension: &dyn Extension) -> bool {
        match self {
            Capability::Condition => extension.as_condition().is_some(),
            Capability::ParameterResolver => extension.as_parameter_resolver().is_some(),
            Capability::InvocationInterceptor => extension.as_invocation_interceptor().is_some(),
            Capability::LifecycleCallback => extension.as_lifecycle_callback().is_some(),
            Capability::ExceptionHandler => extension.as_exception_handler().is_some(),
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Capability::Condition => "ExecutionCondition",
            Capability::ParameterResolver => "ParameterResolver",
            Capability::InvocationInterceptor => "InvocationInterceptor",
            Capability::LifecycleCallback => "LifecycleCallback",
            Capability::ExceptionHandler => "ExecutionExceptionHandler",
        }
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
