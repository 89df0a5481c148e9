//! Lifecycle capabilities consumed by the node executor.

use crate::context::ExtensionContext;

/// Callbacks around the execution of a node.
///
/// `before` callbacks run in registry stream order before the node body;
/// `after` callbacks run in reverse order once the body and all children have
/// finished, even when something failed.
pub trait LifecycleCallback: Send + Sync {
    fn before(&self, _context: &ExtensionContext) -> anyhow::Result<()> {
        Ok(())
    }

    fn after(&self, _context: &ExtensionContext) -> anyhow::Result<()> {
        Ok(())
    }
}

/// Gets a chance to handle an error raised by a node's test body.
///
/// Returning `Ok(())` swallows the error; returning an error passes it (or a
/// replacement) on to the next handler.
pub trait ExecutionExceptionHandler: Send + Sync {
    fn handle_execution_exception(
        &self,
        context: &ExtensionContext,
        error: anyhow::Error,
    ) -> anyhow::Result<()>;
}
