//! Namespaced view over a context's value store.

use super::{CloseableResource, Namespace, NamespacedHierarchicalStore};
use crate::error::StoreError;
use crate::types::Value;
use std::any::Any;
use std::sync::Arc;

/// A value store bound to a single namespace.
///
/// Handed out by [`ExtensionContext::store`](crate::context::ExtensionContext::store).
#[derive(Clone)]
pub struct Store {
    store: Arc<NamespacedHierarchicalStore>,
    namespace: Namespace,
}

impl Store {
    pub fn new(store: Arc<NamespacedHierarchicalStore>, namespace: Namespace) -> Self {
        Self { store, namespace }
    }

    pub fn namespace(&self) -> &Namespace {
        &self.namespace
    }

    pub fn get(&self, key: &str) -> Result<Option<Value>, StoreError> {
        self.store.get(&self.namespace, key)
    }

    pub fn get_typed<T: Any + Send + Sync>(&self, key: &str) -> Result<Option<Arc<T>>, StoreError> {
        self.store.get_typed(&self.namespace, key)
    }

    pub fn put<V: Any + Send + Sync>(&self, key: &str, value: V) -> Result<Option<Value>, StoreError> {
        self.store.put(&self.namespace, key, value)
    }

    pub fn put_resource<R: CloseableResource + Any + 'static>(
        &self,
        key: &str,
        resource: R,
    ) -> Result<Option<Value>, StoreError> {
        self.store.put_resource(&self.namespace, key, resource)
    }

    pub fn remove(&self, key: &str) -> Result<Option<Value>, StoreError> {
        self.store.remove(&self.namespace, key)
    }

    pub fn remove_typed<T: Any + Send + Sync>(&self, key: &str) -> Result<Option<Arc<T>>, StoreError> {
        self.store.remove_typed(&self.namespace, key)
    }

    pub fn get_or_compute_if_absent<V, F>(&self, key: &str, factory: F) -> Result<Arc<V>, StoreError>
    where
        V: Any + Send + Sync,
        F: FnOnce(&str) -> V,
    {
        self.store
            .get_or_compute_if_absent_typed(&self.namespace, key, factory)
    }

    pub fn try_get_or_compute_if_absent<V, F>(&self, key: &str, factory: F) -> Result<Value, StoreError>
    where
        V: Any + Send + Sync,
        F: FnOnce(&str) -> anyhow::Result<V>,
    {
        self.store
            .try_get_or_compute_if_absent(&self.namespace, key, factory)
    }

    pub fn get_or_compute_resource_if_absent<R, F>(
        &self,
        key: &str,
        factory: F,
    ) -> Result<Arc<R>, StoreError>
    where
        R: CloseableResource + Any + 'static,
        F: FnOnce(&str) -> R,
    {
        self.store
            .get_or_compute_resource_if_absent(&self.namespace, key, factory)
    }

    pub fn get_or_default<T: Default + Any + Send + Sync>(&self) -> Result<Arc<T>, StoreError> {
        self.store.get_or_default(&self.namespace)
    }
}
