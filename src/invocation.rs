//! Invocation Model
//!
//! A reified pending call that interceptors may proceed with or skip, exactly
//! once. [`InterceptorChain`] wraps the invocation in every registered
//! interceptor and [`ExecutableInvoker`] ties resolution and the chain together.

mod chain;
mod interceptor;
mod invoker;

pub use chain::InterceptorChain;
pub use interceptor::{InterceptorCall, InvocationInterceptor};
pub use invoker::ExecutableInvoker;

use crate::error::{InvocationError, InvocationStatus};
use crate::resolution::Executable;
use crate::types::Value;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A pending call. Exactly one of `proceed` or `skip` may succeed.
pub trait Invocation {
    fn proceed(&mut self) -> anyhow::Result<Option<Value>>;

    fn skip(&mut self) -> Result<(), InvocationError>;

    fn status(&self) -> InvocationStatus;
}

/// What an invocation is being made for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum InvocationKind {
    Constructor,
    BeforeAll,
    BeforeEach,
    Test,
    AfterEach,
    AfterAll,
}

impl fmt::Display for InvocationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            InvocationKind::Constructor => "constructor",
            InvocationKind::BeforeAll => "before-all",
            InvocationKind::BeforeEach => "before-each",
            InvocationKind::Test => "test",
            InvocationKind::AfterEach => "after-each",
            InvocationKind::AfterAll => "after-all",
        };
        f.write_str(name)
    }
}

/// Read-only view of an invocation handed to interceptors
#[derive(Debug, Clone)]
pub struct InvocationContext<'a> {
    kind: InvocationKind,
    executable: &'a Executable,
    instance: Option<Value>,
    arguments: Vec<Option<Value>>,
}

impl<'a> InvocationContext<'a> {
    pub fn kind(&self) -> InvocationKind {
        self.kind
    }

    pub fn executable(&self) -> &'a Executable {
        self.executable
    }

    pub fn instance(&self) -> Option<&Value> {
        self.instance.as_ref()
    }

    pub fn arguments(&self) -> &[Option<Value>] {
        &self.arguments
    }
}

/// Invocation of an [`Executable`] with resolved arguments
pub struct ExecutableInvocation<'a> {
    executable: &'a Executable,
    instance: Option<Value>,
    arguments: Vec<Option<Value>>,
    status: InvocationStatus,
}

impl<'a> ExecutableInvocation<'a> {
    pub fn new(
        executable: &'a Executable,
        instance: Option<Value>,
        arguments: Vec<Option<Value>>,
    ) -> Self {
        Self {
            executable,
            instance,
            arguments,
            status: InvocationStatus::Pending,
        }
    }

    pub fn context(&self, kind: InvocationKind) -> InvocationContext<'a> {
        InvocationContext {
            kind,
            executable: self.executable,
            instance: self.instance.clone(),
            arguments: self.arguments.clone(),
        }
    }

    fn transition(&mut self, attempted: InvocationStatus) -> Result<(), InvocationError> {
        if self.status != InvocationStatus::Pending {
            return Err(InvocationError::IllegalInvocationState {
                current: self.status,
                attempted,
            });
        }
        self.status = attempted;
        Ok(())
    }
}

impl Invocation for ExecutableInvocation<'_> {
    fn proceed(&mut self) -> anyhow::Result<Option<Value>> {
        self.transition(InvocationStatus::Invoked)?;
        self.executable
            .invoke(self.instance.as_ref(), &self.arguments)
    }

    fn skip(&mut self) -> Result<(), InvocationError> {
        self.transition(InvocationStatus::Skipped)
    }

    fn status(&self) -> InvocationStatus {
        self.status
    }
}
