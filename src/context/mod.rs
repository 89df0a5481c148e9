//! Context Tree
//!
//! One [`ExtensionContext`] per node being executed. A context links to its
//! parent, owns a value store scope that reads through to the parent's scope,
//! and carries the extension registry used for dispatch on its node.

pub mod configuration;

pub use configuration::ConfigurationParameters;

use crate::collector::AggregatedFailure;
use crate::error::ConfigurationError;
use crate::extension::ExtensionRegistry;
use crate::node::{Node, NodeKind};
use crate::store::{Namespace, NamespacedHierarchicalStore, Store};
use crate::types::{UniqueId, Value};
use parking_lot::RwLock;
use std::any::Any;
use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;

/// Per-node runtime state handed to every extension.
pub struct ExtensionContext {
    unique_id: UniqueId,
    display_name: String,
    tags: BTreeSet<String>,
    node: Arc<dyn Node>,
    parent: Option<Arc<ExtensionContext>>,
    registry: Arc<ExtensionRegistry>,
    store: Arc<NamespacedHierarchicalStore>,
    configuration: Arc<ConfigurationParameters>,
    instance: RwLock<Option<Value>>,
}

/// Build the context for `node` as a child of `parent`
pub fn new_context(
    parent: &Arc<ExtensionContext>,
    node: Arc<dyn Node>,
) -> Result<Arc<ExtensionContext>, ConfigurationError> {
    ExtensionContext::new_child(parent, node)
}

impl ExtensionContext {
    /// Create the root context. The node's own extensions are registered into
    /// `registry`.
    pub fn new_root(
        node: Arc<dyn Node>,
        registry: Arc<ExtensionRegistry>,
        configuration: Arc<ConfigurationParameters>,
    ) -> Result<Arc<Self>, ConfigurationError> {
        registry.register_all(node.extensions())?;
        let unique_id = node.unique_id();
        let store = NamespacedHierarchicalStore::new_root(
            unique_id.to_string(),
            configuration.close_store_resources(),
        );
        Ok(Arc::new(Self {
            display_name: node.display_name(),
            tags: node.tags(),
            unique_id,
            node,
            parent: None,
            registry,
            store: Arc::new(store),
            configuration,
            instance: RwLock::new(None),
        }))
    }

    /// Create a child context with its own registry and store scope
    pub fn new_child(
        parent: &Arc<ExtensionContext>,
        node: Arc<dyn Node>,
    ) -> Result<Arc<Self>, ConfigurationError> {
        let unique_id = node.unique_id();
        let registry = ExtensionRegistry::child_of(&parent.registry, unique_id.to_string());
        registry.register_all(node.extensions())?;
        let store = NamespacedHierarchicalStore::child_of(&parent.store, unique_id.to_string());

        let mut tags = parent.tags.clone();
        tags.extend(node.tags());

        Ok(Arc::new(Self {
            display_name: node.display_name(),
            tags,
            unique_id,
            node,
            parent: Some(Arc::clone(parent)),
            registry: Arc::new(registry),
            store: Arc::new(store),
            configuration: Arc::clone(&parent.configuration),
            instance: RwLock::new(None),
        }))
    }

    pub fn unique_id(&self) -> &UniqueId {
        &self.unique_id
    }

    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    /// Own tags plus every ancestor's tags
    pub fn tags(&self) -> &BTreeSet<String> {
        &self.tags
    }

    pub fn node(&self) -> &Arc<dyn Node> {
        &self.node
    }

    pub fn kind(&self) -> NodeKind {
        self.node.kind()
    }

    pub fn parent(&self) -> Option<&Arc<ExtensionContext>> {
        self.parent.as_ref()
    }

    pub fn root(&self) -> &ExtensionContext {
        let mut current = self;
        while let Some(parent) = &current.parent {
            current = parent;
        }
        current
    }

    pub fn registry(&self) -> &Arc<ExtensionRegistry> {
        &self.registry
    }

    pub fn configuration(&self) -> &ConfigurationParameters {
        &self.configuration
    }

    pub fn configuration_parameter(&self, key: &str) -> Option<&str> {
        self.configuration.get(key)
    }

    /// Namespaced view of this context's value store
    pub fn store(&self, namespace: Namespace) -> Store {
        Store::new(Arc::clone(&self.store), namespace)
    }

    pub fn value_store(&self) -> &Arc<NamespacedHierarchicalStore> {
        &self.store
    }

    /// The instance bound to this context, or to the nearest ancestor that has one
    pub fn instance(&self) -> Option<Value> {
        if let Some(instance) = self.instance.read().clone() {
            return Some(instance);
        }
        self.parent.as_ref().and_then(|parent| parent.instance())
    }

    pub fn instance_typed<T: Any + Send + Sync>(&self) -> Option<Arc<T>> {
        self.instance().and_then(|instance| instance.downcast::<T>())
    }

    /// The instance bound to this context itself
    pub fn own_instance(&self) -> Option<Value> {
        self.instance.read().clone()
    }

    pub fn set_instance(&self, instance: Value) {
        *self.instance.write() = Some(instance);
    }

    /// Release the store scope owned by this context.
    ///
    /// Children must have been closed first.
    pub fn close(&self) -> Result<(), AggregatedFailure> {
        self.store.close_all_owned_values()
    }
}

impl fmt::Debug for ExtensionContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExtensionContext")
            .field("unique_id", &self.unique_id.to_string())
            .field("display_name", &self.display_name)
            .field("tags", &self.tags)
            .finish()
    }
}
