use crate::context::ExtensionContext;
use crate::error::{ChainViolation, ConfigurationError, InvocationError, InvocationStatus};
use crate::extension::{Capability, Extension, ExtensionRegistry};
use crate::invocation::{InterceptorCall, Invocation, InvocationContext};
use crate::types::Value;
use std::cell::RefCell;
use std::sync::Arc;
use tracing::trace;

/// Runs an invocation through every registered interceptor.
///
/// Interceptors are entered in registry stream order and unwind in reverse.
/// Each interceptor sees its own validating view of the invocation, so a
/// protocol violation is attributed to the interceptor that caused it. An
/// outer interceptor recovering from that error does not hide it: once the
/// outermost call returns, a target that was neither invoked nor skipped, or
/// any recorded violation, fails the whole chain.
pub struct InterceptorChain;

impl InterceptorChain {
    pub fn invoke(
        invocation: &mut dyn Invocation,
        invocation_context: &InvocationContext<'_>,
        extension_context: &ExtensionContext,
        registry: &ExtensionRegistry,
        call: InterceptorCall,
    ) -> anyhow::Result<Option<Value>> {
        let interceptors = registry.stream(Capability::InvocationInterceptor);
        if interceptors.is_empty() {
            return invocation.proceed();
        }

        let chain = Chain {
            names: interceptors
                .iter()
                .map(|extension| extension.name().to_string())
                .collect(),
            interceptors,
            call,
            invocation_context,
            extension_context,
            violation: RefCell::new(None),
        };
        let result = chain.run(0, invocation)?;

        if let Some((violation, offender)) = chain.violation.take() {
            return Err(chain.broken(violation, &offender).into());
        }
        if invocation.status() == InvocationStatus::Pending {
            let outermost = chain.names[0].clone();
            return Err(chain.broken(ChainViolation::NeverInvoked, &outermost).into());
        }
        Ok(result)
    }
}

struct Chain<'a, 'b> {
    interceptors: Vec<Arc<dyn Extension>>,
    names: Vec<String>,
    call: InterceptorCall,
    invocation_context: &'a InvocationContext<'b>,
    extension_context: &'a ExtensionContext,
    /// Innermost violation seen, kept even if an outer interceptor recovers
    violation: RefCell<Option<(ChainViolation, String)>>,
}

impl Chain<'_, '_> {
    /// Dispatch to interceptor `index`, or to `target` once none remain
    fn run(&self, index: usize, target: &mut dyn Invocation) -> anyhow::Result<Option<Value>> {
        let Some(extension) = self.interceptors.get(index) else {
            return target.proceed();
        };
        let name = extension.name();
        let interceptor =
            extension
                .as_invocation_interceptor()
                .ok_or_else(|| ConfigurationError::MissingCapability {
                    extension: name.to_string(),
                    capability: Capability::InvocationInterceptor.name(),
                })?;

        trace!(
            interceptor = name,
            kind = %self.invocation_context.kind(),
            target = %self.invocation_context.executable().description(),
            "Entering interceptor"
        );
        let mut link = ValidatingInvocation {
            chain: self,
            next: index + 1,
            target,
            status: InvocationStatus::Pending,
            repeated: false,
        };
        let result = (self.call)(
            interceptor,
            &mut link,
            self.invocation_context,
            self.extension_context,
        );

        if link.repeated {
            self.record(ChainViolation::InvokedMultipleTimes, name);
            return Err(self.broken(ChainViolation::InvokedMultipleTimes, name).into());
        }
        if link.status == InvocationStatus::Pending {
            self.record(ChainViolation::NeverInvoked, name);
            // An interceptor failing before proceeding reports its own error
            return match result {
                Ok(_) => Err(self.broken(ChainViolation::NeverInvoked, name).into()),
                Err(error) => Err(error),
            };
        }
        result
    }

    fn record(&self, violation: ChainViolation, offender: &str) {
        let mut recorded = self.violation.borrow_mut();
        if recorded.is_none() {
            *recorded = Some((violation, offender.to_string()));
        }
    }

    fn broken(&self, violation: ChainViolation, offender: &str) -> InvocationError {
        InvocationError::ChainIntegrity {
            violation,
            offender: offender.to_string(),
            interceptors: self.names.clone(),
        }
    }
}

/// The invocation one interceptor sees: proceeding enters the rest of the chain
struct ValidatingInvocation<'c, 'a, 'b> {
    chain: &'c Chain<'a, 'b>,
    next: usize,
    target: &'c mut dyn Invocation,
    status: InvocationStatus,
    repeated: bool,
}

impl ValidatingInvocation<'_, '_, '_> {
    fn transition(&mut self, attempted: InvocationStatus) -> Result<(), InvocationError> {
        if self.status != InvocationStatus::Pending {
            self.repeated = true;
            return Err(InvocationError::IllegalInvocationState {
                current: self.status,
                attempted,
            });
        }
        self.status = attempted;
        Ok(())
    }
}

impl Invocation for ValidatingInvocation<'_, '_, '_> {
    fn proceed(&mut self) -> anyhow::Result<Option<Value>> {
        self.transition(InvocationStatus::Invoked)?;
        self.chain.run(self.next, &mut *self.target)
    }

    fn skip(&mut self) -> Result<(), InvocationError> {
        self.transition(InvocationStatus::Skipped)?;
        self.target.skip()
    }

    fn status(&self) -> InvocationStatus {
        self.status
    }
}
