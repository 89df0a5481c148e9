//! Trellis: Execution Core for Extensible Test Trees
//!
//! The machinery a test engine runs on: a tree of per-node contexts with
//! scoped value stores, registries of capability-tagged extensions, condition
//! evaluation, parameter resolution and interceptor chains around every
//! invocation. [`engine::NodeExecutor`] drives a node tree through all of it.

pub mod collector;
pub mod condition;
pub mod config;
pub mod context;
pub mod engine;
pub mod error;
pub mod extension;
pub mod invocation;
pub mod logging;
pub mod node;
pub mod resolution;
pub mod store;
pub mod types;

pub use collector::{AggregatedFailure, ThrowableCollector};
pub use condition::{ConditionEvaluationResult, ConditionEvaluator, DisabledCondition, ExecutionCondition};
pub use config::{ConfigLoader, EngineConfig};
pub use context::{new_context, ConfigurationParameters, ExtensionContext};
pub use engine::{NodeExecutor, NodeOutcome, NodeStatus};
pub use error::{Aborted, ConfigurationError, ExecutionError, InvocationError, ResolutionError, StoreError};
pub use extension::{Capability, Extension, ExtensionRegistry, ExecutionExceptionHandler, LifecycleCallback};
pub use invocation::{ExecutableInvoker, InterceptorChain, Invocation, InvocationInterceptor, InvocationKind};
pub use node::{Node, NodeKind, TreeNode};
pub use resolution::{Executable, ParameterContext, ParameterResolution, ParameterResolver, TestInfo, TypeDescriptor};
pub use store::{CloseableResource, Namespace, NamespacedHierarchicalStore, Store};
pub use types::{UniqueId, Value};
