use crate::collector::ThrowableCollector;
use crate::condition::ConditionEvaluator;
use crate::config::EngineConfig;
use crate::context::{new_context, ConfigurationParameters, ExtensionContext};
use crate::engine::outcome::{NodeOutcome, NodeStatus};
use crate::error::ConfigurationError;
use crate::extension::{Capability, Extension, ExtensionRegistry};
use crate::invocation::{ExecutableInvoker, InvocationKind};
use crate::node::{Node, NodeKind};
use crate::resolution::Executable;
use chrono::{SecondsFormat, Utc};
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

/// Executes a tree of [`Node`]s sequentially, depth first.
///
/// Per node: build the context, seal its registry, evaluate conditions, run
/// `before` callbacks, construct the instance, run the test body (failures
/// pass through exception handlers), execute children, run `after`
/// callbacks in reverse and finally close the node's store. Children are
/// closed before their parent.
///
/// Callbacks, constructors and test bodies all go through the interceptor
/// chain. Callbacks on containers are `before-all`/`after-all` invocations,
/// on tests `before-each`/`after-each`.
pub struct NodeExecutor {
    configuration: Arc<ConfigurationParameters>,
    evaluator: ConditionEvaluator,
    extensions: Vec<Arc<dyn Extension>>,
    default_extensions: bool,
}

impl NodeExecutor {
    pub fn new(config: &EngineConfig) -> Result<Self, ConfigurationError> {
        config.ensure_valid()?;
        Ok(Self {
            configuration: Arc::new(ConfigurationParameters::from_config(config)),
            evaluator: ConditionEvaluator::with_deactivation_patterns(
                &config.conditions.deactivate,
            )?,
            extensions: Vec::new(),
            default_extensions: true,
        })
    }

    /// Register an engine-wide extension in the root registry
    pub fn with_extension(self, extension: impl Extension) -> Self {
        self.with_shared_extension(Arc::new(extension))
    }

    pub fn with_shared_extension(mut self, extension: Arc<dyn Extension>) -> Self {
        self.extensions.push(extension);
        self
    }

    /// Leave the built-in extensions out of the root registry
    pub fn without_default_extensions(mut self) -> Self {
        self.default_extensions = false;
        self
    }

    pub fn execute(&self, root: Arc<dyn Node>) -> NodeOutcome {
        let outcome = self.execute_node(None, root);
        let counts = outcome.counts();
        info!(
            successful = counts.successful,
            skipped = counts.skipped,
            aborted = counts.aborted,
            failed = counts.failed,
            "Execution finished"
        );
        outcome
    }

    fn root_registry(&self, owner: String) -> Result<Arc<ExtensionRegistry>, ConfigurationError> {
        let registry = if self.default_extensions {
            ExtensionRegistry::with_default_extensions(owner)
        } else {
            ExtensionRegistry::new_root(owner)
        };
        registry.register_all(self.extensions.iter().cloned())?;
        Ok(Arc::new(registry))
    }

    fn create_context(
        &self,
        parent: Option<&Arc<ExtensionContext>>,
        node: &Arc<dyn Node>,
    ) -> Result<Arc<ExtensionContext>, ConfigurationError> {
        match parent {
            Some(parent) => new_context(parent, Arc::clone(node)),
            None => {
                let registry = self.root_registry(node.unique_id().to_string())?;
                ExtensionContext::new_root(
                    Arc::clone(node),
                    registry,
                    Arc::clone(&self.configuration),
                )
            }
        }
    }

    #[instrument(skip_all, fields(node = %node.unique_id()))]
    fn execute_node(
        &self,
        parent: Option<&Arc<ExtensionContext>>,
        node: Arc<dyn Node>,
    ) -> NodeOutcome {
        let started_at = Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true);
        let finish = |status: NodeStatus, children: Vec<NodeOutcome>| NodeOutcome {
            unique_id: node.unique_id(),
            display_name: node.display_name(),
            status,
            started_at: started_at.clone(),
            children,
        };

        let context = match self.create_context(parent, &node) {
            Ok(context) => context,
            Err(error) => {
                warn!(error = %error, "Failed to create context");
                let mut collector = ThrowableCollector::new();
                collector.record(error.into());
                return finish(NodeStatus::from_collector(collector), Vec::new());
            }
        };
        context.registry().seal();

        let mut collector = ThrowableCollector::new();
        match self.evaluator.evaluate(context.registry(), &context) {
            Ok(result) if result.is_disabled() => {
                let reason = result.reason().unwrap_or("disabled").to_string();
                debug!(reason = %reason, "Skipping node");
                close_context(&context, &mut collector);
                let status = if collector.is_empty() {
                    NodeStatus::Skipped { reason }
                } else {
                    NodeStatus::from_collector(collector)
                };
                return finish(status, Vec::new());
            }
            Ok(_) => {}
            Err(error) => {
                collector.record(error.into());
                close_context(&context, &mut collector);
                return finish(NodeStatus::from_collector(collector), Vec::new());
            }
        }

        let (before, after) = match context.kind() {
            NodeKind::Container => (InvocationKind::BeforeAll, InvocationKind::AfterAll),
            NodeKind::Test => (InvocationKind::BeforeEach, InvocationKind::AfterEach),
        };
        let callbacks = context.registry().stream(Capability::LifecycleCallback);
        for extension in &callbacks {
            collector.execute(|| run_callback(&context, extension, before));
            if !collector.is_empty() {
                break;
            }
        }

        let mut children = Vec::new();
        if collector.is_empty() {
            if let Some(constructor) = node.constructor() {
                collector.execute(|| construct(&context, &constructor));
            }
        }
        if collector.is_empty() {
            if let Some(test) = node.test_executable() {
                collector.execute(|| run_test(&context, &test));
            }
        }
        if collector.is_empty() {
            for child in node.children() {
                children.push(self.execute_node(Some(&context), child));
            }
        }

        for extension in callbacks.iter().rev() {
            collector.execute(|| run_callback(&context, extension, after));
        }

        close_context(&context, &mut collector);
        let status = NodeStatus::from_collector(collector);
        debug!(status = ?status, "Node finished");
        finish(status, children)
    }
}

/// Run one extension's `before` or `after` callback through the interceptor
/// chain, as an invocation of `kind`
fn run_callback(
    context: &Arc<ExtensionContext>,
    extension: &Arc<dyn Extension>,
    kind: InvocationKind,
) -> anyhow::Result<()> {
    let is_before = matches!(kind, InvocationKind::BeforeAll | InvocationKind::BeforeEach);
    let name = format!(
        "{}::{}",
        extension.name(),
        if is_before { "before" } else { "after" }
    );
    let callback = {
        let extension = Arc::clone(extension);
        let context = Arc::clone(context);
        Executable::method(name, move |_, _| {
            let callback = extension.as_lifecycle_callback().ok_or_else(|| {
                ConfigurationError::MissingCapability {
                    extension: extension.name().to_string(),
                    capability: Capability::LifecycleCallback.name(),
                }
            })?;
            if is_before {
                callback.before(&context)?;
            } else {
                callback.after(&context)?;
            }
            Ok(None)
        })
    };
    let instance = context.instance();
    ExecutableInvoker::new(context).invoke(&callback, instance.as_ref(), kind)?;
    Ok(())
}

fn construct(context: &ExtensionContext, constructor: &Executable) -> anyhow::Result<()> {
    let outer = if constructor.requires_outer_instance() {
        context.parent().and_then(|parent| parent.instance())
    } else {
        None
    };
    let instance = ExecutableInvoker::new(context).construct(constructor, outer.as_ref())?;
    context.set_instance(instance);
    Ok(())
}

/// Run the test body; failures are offered to exception handlers in stream
/// order until one swallows them
fn run_test(context: &ExtensionContext, test: &Executable) -> anyhow::Result<()> {
    let instance = context.instance();
    let Err(mut error) =
        ExecutableInvoker::new(context).invoke(test, instance.as_ref(), InvocationKind::Test)
    else {
        return Ok(());
    };

    for extension in context.registry().stream(Capability::ExceptionHandler) {
        let Some(handler) = extension.as_exception_handler() else {
            continue;
        };
        match handler.handle_execution_exception(context, error) {
            Ok(()) => {
                debug!(handler = extension.name(), "Exception handled");
                return Ok(());
            }
            Err(rethrown) => error = rethrown,
        }
    }
    Err(error)
}

fn close_context(context: &ExtensionContext, collector: &mut ThrowableCollector) {
    if let Err(failure) = context.close() {
        for cause in failure.into_causes() {
            collector.record(cause);
        }
    }
}
