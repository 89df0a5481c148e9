//! Extension registry: ordered, chainable collection of extensions.

use crate::condition::DisabledCondition;
use crate::error::ConfigurationError;
use crate::extension::{Capability, Extension};
use crate::resolution::TestInfoParameterResolver;
use parking_lot::RwLock;
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::trace;

/// Extension registry for one context.
///
/// Streams local extensions first, in registration order, then the parent's.
/// A child registry only holds a reference to its parent and never modifies
/// it. Registration is rejected once the registry has been sealed.
pub struct ExtensionRegistry {
    owner: String,
    parent: Option<Arc<ExtensionRegistry>>,
    extensions: RwLock<Vec<Arc<dyn Extension>>>,
    sealed: AtomicBool,
}

impl ExtensionRegistry {
    /// Create an empty root registry
    pub fn new_root(owner: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            parent: None,
            extensions: RwLock::new(Vec::new()),
            sealed: AtomicBool::new(false),
        }
    }

    /// Create a root registry holding the built-in extensions
    pub fn with_default_extensions(owner: impl Into<String>) -> Self {
        let registry = Self::new_root(owner);
        registry
            .extensions
            .write()
            .extend(default_extensions());
        registry
    }

    /// Create a registry that falls back to `parent`
    pub fn child_of(parent: &Arc<ExtensionRegistry>, owner: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            parent: Some(Arc::clone(parent)),
            extensions: RwLock::new(Vec::new()),
            sealed: AtomicBool::new(false),
        }
    }

    pub fn owner(&self) -> &str {
        &self.owner
    }

    pub fn parent(&self) -> Option<&Arc<ExtensionRegistry>> {
        self.parent.as_ref()
    }

    /// Append an extension to this registry
    pub fn register(&self, extension: Arc<dyn Extension>) -> Result<(), ConfigurationError> {
        if self.is_sealed() {
            return Err(ConfigurationError::RegistrySealed {
                extension: extension.name().to_string(),
                context: self.owner.clone(),
            });
        }
        trace!(registry = %self.owner, extension = extension.name(), "Registering extension");
        self.extensions.write().push(extension);
        Ok(())
    }

    pub fn register_all<I>(&self, extensions: I) -> Result<(), ConfigurationError>
    where
        I: IntoIterator<Item = Arc<dyn Extension>>,
    {
        for extension in extensions {
            self.register(extension)?;
        }
        Ok(())
    }

    /// Mark the start of extension dispatch; later registration fails
    pub fn seal(&self) {
        self.sealed.store(true, Ordering::Release);
    }

    pub fn is_sealed(&self) -> bool {
        self.sealed.load(Ordering::Acquire)
    }

    /// Extensions registered directly in this registry, in registration order
    pub fn local_extensions(&self) -> Vec<Arc<dyn Extension>> {
        self.extensions.read().clone()
    }

    /// Extensions providing `capability`: local ones in registration order,
    /// then the parent's, each identity at most once.
    pub fn stream(&self, capability: Capability) -> Vec<Arc<dyn Extension>> {
        let mut seen = HashSet::new();
        let mut matching = Vec::new();
        let mut current = Some(self);
        while let Some(registry) = current {
            for extension in registry.extensions.read().iter() {
                if capability.is_implemented_by(extension.as_ref())
                    && seen.insert(identity(extension))
                {
                    matching.push(Arc::clone(extension));
                }
            }
            current = registry.parent.as_deref();
        }
        matching
    }

    /// Names of the extensions providing `capability`, in stream order
    pub fn names(&self, capability: Capability) -> Vec<String> {
        self.stream(capability)
            .iter()
            .map(|extension| extension.name().to_string())
            .collect()
    }
}

fn identity(extension: &Arc<dyn Extension>) -> usize {
    Arc::as_ptr(extension) as *const () as usize
}

fn default_extensions() -> Vec<Arc<dyn Extension>> {
    vec![
        Arc::new(DisabledCondition) as Arc<dyn Extension>,
        Arc::new(TestInfoParameterResolver) as Arc<dyn Extension>,
    ]
}
