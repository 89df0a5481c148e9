use crate::context::ExtensionContext;
use crate::invocation::{Invocation, InvocationContext, InvocationKind};
use crate::types::Value;

/// Capability: wrap invocations.
///
/// Every per-kind method defaults to [`intercept`](Self::intercept), which in
/// turn defaults to proceeding. Implementations must call `proceed` or `skip`
/// on the invocation exactly once.
pub trait InvocationInterceptor: Send + Sync {
    fn intercept(
        &self,
        invocation: &mut dyn Invocation,
        _invocation_context: &InvocationContext<'_>,
        _extension_context: &ExtensionContext,
    ) -> anyhow::Result<Option<Value>> {
        invocation.proceed()
    }

    fn intercept_constructor(
        &self,
        invocation: &mut dyn Invocation,
        invocation_context: &InvocationContext<'_>,
        extension_context: &ExtensionContext,
    ) -> anyhow::Result<Option<Value>> {
        self.intercept(invocation, invocation_context, extension_context)
    }

    fn intercept_before_all(
        &self,
        invocation: &mut dyn Invocation,
        invocation_context: &InvocationContext<'_>,
        extension_context: &ExtensionContext,
    ) -> anyhow::Result<Option<Value>> {
        self.intercept(invocation, invocation_context, extension_context)
    }

    fn intercept_before_each(
        &self,
        invocation: &mut dyn Invocation,
        invocation_context: &InvocationContext<'_>,
        extension_context: &ExtensionContext,
    ) -> anyhow::Result<Option<Value>> {
        self.intercept(invocation, invocation_context, extension_context)
    }

    fn intercept_test(
        &self,
        invocation: &mut dyn Invocation,
        invocation_context: &InvocationContext<'_>,
        extension_context: &ExtensionContext,
    ) -> anyhow::Result<Option<Value>> {
        self.intercept(invocation, invocation_context, extension_context)
    }

    fn intercept_after_each(
        &self,
        invocation: &mut dyn Invocation,
        invocation_context: &InvocationContext<'_>,
        extension_context: &ExtensionContext,
    ) -> anyhow::Result<Option<Value>> {
        self.intercept(invocation, invocation_context, extension_context)
    }

    fn intercept_after_all(
        &self,
        invocation: &mut dyn Invocation,
        invocation_context: &InvocationContext<'_>,
        extension_context: &ExtensionContext,
    ) -> anyhow::Result<Option<Value>> {
        self.intercept(invocation, invocation_context, extension_context)
    }
}

/// Selects which interceptor method a chain dispatches to
pub type InterceptorCall = fn(
    &dyn InvocationInterceptor,
    &mut dyn Invocation,
    &InvocationContext<'_>,
    &ExtensionContext,
) -> anyhow::Result<Option<Value>>;

impl InvocationKind {
    pub fn interceptor_call(self) -> InterceptorCall {
        match self {
            InvocationKind::Constructor => call_constructor,
            InvocationKind::BeforeAll => call_before_all,
            InvocationKind::BeforeEach => call_before_each,
            InvocationKind::Test => call_test,
            InvocationKind::AfterEach => call_after_each,
            InvocationKind::AfterAll => call_after_all,
        }
    }
}

fn call_constructor(
    interceptor: &dyn InvocationInterceptor,
    invocation: &mut dyn Invocation,
    invocation_context: &InvocationContext<'_>,
    extension_context: &ExtensionContext,
) -> anyhow::Result<Option<Value>> {
    interceptor.intercept_constructor(invocation, invocation_context, extension_context)
}

fn call_before_all(
    interceptor: &dyn InvocationInterceptor,
    invocation: &mut dyn Invocation,
    invocation_context: &InvocationContext<'_>,
    extension_context: &ExtensionContext,
) -> anyhow::Result<Option<Value>> {
    interceptor.intercept_before_all(invocation, invocation_context, extension_context)
}

fn call_before_each(
    interceptor: &dyn InvocationInterceptor,
    invocation: &mut dyn Invocation,
    invocation_context: &InvocationContext<'_>,
    extension_context: &ExtensionContext,
) -> anyhow::Result<Option<Value>> {
    interceptor.intercept_before_each(invocation, invocation_context, extension_context)
}

fn call_test(
    interceptor: &dyn InvocationInterceptor,
    invocation: &mut dyn Invocation,
    invocation_context: &InvocationContext<'_>,
    extension_context: &ExtensionContext,
) -> anyhow::Result<Option<Value>> {
    interceptor.intercept_test(invocation, invocation_context, extension_context)
}

fn call_after_each(
    interceptor: &dyn InvocationInterceptor,
    invocation: &mut dyn Invocation,
    invocation_context: &InvocationContext<'_>,
    extension_context: &ExtensionContext,
) -> anyhow::Result<Option<Value>> {
    interceptor.intercept_after_each(invocation, invocation_context, extension_context)
}

fn call_after_all(
    interceptor: &dyn InvocationInterceptor,
    invocation: &mut dyn Invocation,
    invocation_context: &InvocationContext<'_>,
    extension_context: &ExtensionContext,
) -> anyhow::Result<Option<Value>> {
    interceptor.intercept_after_all(invocation, invocation_context, extension_context)
}
