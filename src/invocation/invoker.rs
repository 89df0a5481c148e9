use crate::context::ExtensionContext;
use crate::error::InvocationError;
use crate::invocation::{ExecutableInvocation, InterceptorChain, InvocationKind};
use crate::resolution::{Executable, ParameterResolution};
use crate::types::Value;
use tracing::debug;

/// Resolves an executable's parameters and runs it through the interceptor
/// chain of one context.
pub struct ExecutableInvoker<'a> {
    context: &'a ExtensionContext,
}

impl<'a> ExecutableInvoker<'a> {
    pub fn new(context: &'a ExtensionContext) -> Self {
        Self { context }
    }

    /// Invoke a method bound to `instance`
    pub fn invoke(
        &self,
        executable: &Executable,
        instance: Option<&Value>,
        kind: InvocationKind,
    ) -> anyhow::Result<Option<Value>> {
        let registry = self.context.registry();
        let arguments = ParameterResolution::resolve(executable, instance, self.context, registry)?;
        let mut invocation = ExecutableInvocation::new(executable, instance.cloned(), arguments);
        let invocation_context = invocation.context(kind);
        debug!(target = %executable.description(), kind = %kind, node = %self.context.unique_id(), "Invoking");
        InterceptorChain::invoke(
            &mut invocation,
            &invocation_context,
            self.context,
            registry,
            kind.interceptor_call(),
        )
    }

    /// Run a constructor; it must produce an instance.
    ///
    /// `outer` is passed at position 0 when the constructor is nested in an
    /// enclosing container.
    pub fn construct(&self, constructor: &Executable, outer: Option<&Value>) -> anyhow::Result<Value> {
        let registry = self.context.registry();
        let arguments =
            ParameterResolution::resolve_with_outer(constructor, None, outer, self.context, registry)?;
        let mut invocation = ExecutableInvocation::new(constructor, None, arguments);
        let invocation_context = invocation.context(InvocationKind::Constructor);
        debug!(target = %constructor.description(), node = %self.context.unique_id(), "Constructing instance");
        InterceptorChain::invoke(
            &mut invocation,
            &invocation_context,
            self.context,
            registry,
            InvocationKind::Constructor.interceptor_call(),
        )?
        .ok_or_else(|| InvocationError::MissingInstance(constructor.description()).into())
    }
}
