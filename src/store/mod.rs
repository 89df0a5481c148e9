//! Namespaced Hierarchical Value Store
//!
//! Key/value storage scoped to one context. Reads fall through to the parent
//! scope when a key is absent locally; writes and removals only ever touch the
//! local scope. Values may be computed lazily with at-most-once semantics, and
//! closeable resources are released when the scope is torn down.

pub mod namespace;
pub mod resource;
pub mod view;

pub use namespace::Namespace;
pub use resource::CloseableResource;
pub use view::Store;

use crate::collector::{AggregatedFailure, ThrowableCollector};
use crate::error::StoreError;
use crate::types::Value;
use parking_lot::{Mutex, RwLock};
use std::any::Any;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, trace, warn};

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct CompositeKey {
    namespace: Namespace,
    key: String,
}

impl CompositeKey {
    fn new(namespace: &Namespace, key: &str) -> Self {
        Self {
            namespace: namespace.clone(),
            key: key.to_string(),
        }
    }
}

#[derive(Clone)]
struct StoredValue {
    value: Value,
    resource: Option<Arc<dyn CloseableResource>>,
    order: u64,
}

/// One key's slot. The slot lock serializes put/remove/compute for that key
/// only; other keys never wait on it.
#[derive(Default)]
struct StoredEntry {
    slot: Mutex<Option<StoredValue>>,
}

/// Value store for one context scope.
pub struct NamespacedHierarchicalStore {
    owner: String,
    parent: Option<Arc<NamespacedHierarchicalStore>>,
    entries: RwLock<HashMap<CompositeKey, Arc<StoredEntry>>>,
    next_order: AtomicU64,
    closed: AtomicBool,
    close_resources: bool,
}

impl NamespacedHierarchicalStore {
    /// Create a root store. `owner` names the scope in error messages.
    pub fn new_root(owner: impl Into<String>, close_resources: bool) -> Self {
        Self {
            owner: owner.into(),
            parent: None,
            entries: RwLock::new(HashMap::new()),
            next_order: AtomicU64::new(0),
            closed: AtomicBool::new(false),
            close_resources,
        }
    }

    /// Create a child scope that reads through to `parent`
    pub fn child_of(parent: &Arc<NamespacedHierarchicalStore>, owner: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            parent: Some(Arc::clone(parent)),
            entries: RwLock::new(HashMap::new()),
            next_order: AtomicU64::new(0),
            closed: AtomicBool::new(false),
            close_resources: parent.close_resources,
        }
    }

    pub fn owner(&self) -> &str {
        &self.owner
    }

    pub fn parent(&self) -> Option<&Arc<NamespacedHierarchicalStore>> {
        self.parent.as_ref()
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    /// Number of values held locally (parent values are not counted)
    pub fn len(&self) -> usize {
        let entries: Vec<Arc<StoredEntry>> = self.entries.read().values().cloned().collect();
        entries.iter().filter(|e| e.slot.lock().is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Look up a value here or in the nearest ancestor that has it
    pub fn get(&self, namespace: &Namespace, key: &str) -> Result<Option<Value>, StoreError> {
        self.ensure_open()?;
        if let Some(value) = self.local_value(&CompositeKey::new(namespace, key)) {
            return Ok(Some(value));
        }
        self.parent_value(namespace, key)
    }

    /// Look up a value and require it to be of type `T`
    pub fn get_typed<T: Any + Send + Sync>(
        &self,
        namespace: &Namespace,
        key: &str,
    ) -> Result<Option<Arc<T>>, StoreError> {
        match self.get(namespace, key)? {
            Some(value) => cast(namespace, key, &value).map(Some),
            None => Ok(None),
        }
    }

    /// Store a value in this scope, returning the previous local value
    pub fn put<V: Any + Send + Sync>(
        &self,
        namespace: &Namespace,
        key: &str,
        value: V,
    ) -> Result<Option<Value>, StoreError> {
        self.put_value(namespace, key, Value::new(value))
    }

    /// Store an already type-erased value in this scope
    pub fn put_value(
        &self,
        namespace: &Namespace,
        key: &str,
        value: Value,
    ) -> Result<Option<Value>, StoreError> {
        self.ensure_open()?;
        let stored = self.stored(value, None);
        self.replace(namespace, key, stored)
    }

    /// Store a resource that will be closed when this scope is torn down
    pub fn put_resource<R: CloseableResource + Any + 'static>(
        &self,
        namespace: &Namespace,
        key: &str,
        resource: R,
    ) -> Result<Option<Value>, StoreError> {
        self.ensure_open()?;
        let stored = self.stored_resource(Arc::new(resource));
        self.replace(namespace, key, stored)
    }

    /// Remove a value from this scope only; ancestors are untouched.
    ///
    /// Removed resources are not closed.
    pub fn remove(&self, namespace: &Namespace, key: &str) -> Result<Option<Value>, StoreError> {
        self.ensure_open()?;
        let key = CompositeKey::new(namespace, key);
        let Some(entry) = self.entries.read().get(&key).cloned() else {
            return Ok(None);
        };
        let previous = entry.slot.lock().take();
        self.prune(&key, &entry);
        Ok(previous.map(|stored| stored.value))
    }

    pub fn remove_typed<T: Any + Send + Sync>(
        &self,
        namespace: &Namespace,
        key: &str,
    ) -> Result<Option<Arc<T>>, StoreError> {
        match self.remove(namespace, key)? {
            Some(value) => cast(namespace, key, &value).map(Some),
            None => Ok(None),
        }
    }

    /// Return the value visible for `key`, computing and storing it locally
    /// if neither this scope nor an ancestor has one.
    ///
    /// The factory runs at most once per key even under concurrent callers.
    /// The factory must not access the same key of this store.
    pub fn get_or_compute_if_absent<V, F>(
        &self,
        namespace: &Namespace,
        key: &str,
        factory: F,
    ) -> Result<Value, StoreError>
    where
        V: Any + Send + Sync,
        F: FnOnce(&str) -> V,
    {
        self.compute_if_absent(namespace, key, |key| {
            Ok(self.stored(Value::new(factory(key)), None))
        })
    }

    pub fn get_or_compute_if_absent_typed<V, F>(
        &self,
        namespace: &Namespace,
        key: &str,
        factory: F,
    ) -> Result<Arc<V>, StoreError>
    where
        V: Any + Send + Sync,
        F: FnOnce(&str) -> V,
    {
        let value = self.get_or_compute_if_absent(namespace, key, factory)?;
        cast(namespace, key, &value)
    }

    /// Like [`get_or_compute_if_absent`](Self::get_or_compute_if_absent) with
    /// a fallible factory. A failed computation leaves the key absent.
    pub fn try_get_or_compute_if_absent<V, F>(
        &self,
        namespace: &Namespace,
        key: &str,
        factory: F,
    ) -> Result<Value, StoreError>
    where
        V: Any + Send + Sync,
        F: FnOnce(&str) -> anyhow::Result<V>,
    {
        self.compute_if_absent(namespace, key, |key| {
            let value = factory(key).map_err(|source| StoreError::ComputeFailed {
                namespace: namespace.to_string(),
                key: key.to_string(),
                source,
            })?;
            Ok(self.stored(Value::new(value), None))
        })
    }

    /// Compute-if-absent for closeable resources
    pub fn get_or_compute_resource_if_absent<R, F>(
        &self,
        namespace: &Namespace,
        key: &str,
        factory: F,
    ) -> Result<Arc<R>, StoreError>
    where
        R: CloseableResource + Any + 'static,
        F: FnOnce(&str) -> R,
    {
        let value = self.compute_if_absent(namespace, key, |key| {
            Ok(self.stored_resource(Arc::new(factory(key))))
        })?;
        cast(namespace, key, &value)
    }

    /// Value keyed by the type name of `T`, created with `T::default()` if absent
    pub fn get_or_default<T: Default + Any + Send + Sync>(
        &self,
        namespace: &Namespace,
    ) -> Result<Arc<T>, StoreError> {
        self.get_or_compute_if_absent_typed(namespace, std::any::type_name::<T>(), |_| {
            T::default()
        })
    }

    /// Close every closeable resource owned by this scope, most recent first.
    ///
    /// Every resource is attempted even if earlier ones fail; all failures are
    /// aggregated. The store rejects further access afterwards. Closing an
    /// already closed store does nothing.
    pub fn close_all_owned_values(&self) -> Result<(), AggregatedFailure> {
        if self.closed.swap(true, Ordering::AcqRel) {
            return Ok(());
        }

        let entries: Vec<(CompositeKey, Arc<StoredEntry>)> = self
            .entries
            .write()
            .drain()
            .collect();
        let mut owned: Vec<(CompositeKey, StoredValue)> = entries
            .into_iter()
            .filter_map(|(key, entry)| {
                let stored = entry.slot.lock().take();
                stored.map(|stored| (key, stored))
            })
            .collect();
        owned.sort_by(|a, b| b.1.order.cmp(&a.1.order));

        debug!(
            store = %self.owner,
            values = owned.len(),
            close_resources = self.close_resources,
            "Closing store"
        );

        let mut collector = ThrowableCollector::new();
        if self.close_resources {
            for (key, stored) in &owned {
                if let Some(resource) = &stored.resource {
                    trace!(store = %self.owner, namespace = %key.namespace, key = %key.key, "Closing resource");
                    collector.execute(|| resource.close());
                }
            }
        }

        collector.assert_empty().map_err(|failure| {
            warn!(store = %self.owner, failures = failure.len(), "Failed to close store resources");
            failure
        })
    }

    fn ensure_open(&self) -> Result<(), StoreError> {
        if self.is_closed() {
            return Err(StoreError::Closed(self.owner.clone()));
        }
        Ok(())
    }

    fn next_order(&self) -> u64 {
        self.next_order.fetch_add(1, Ordering::Relaxed)
    }

    fn stored(&self, value: Value, resource: Option<Arc<dyn CloseableResource>>) -> StoredValue {
        StoredValue {
            value,
            resource,
            order: self.next_order(),
        }
    }

    fn stored_resource<R: CloseableResource + Any + 'static>(&self, resource: Arc<R>) -> StoredValue {
        let value = Value::from_arc(Arc::clone(&resource));
        self.stored(value, Some(resource))
    }

    fn entry(&self, key: CompositeKey) -> Result<Arc<StoredEntry>, StoreError> {
        if let Some(entry) = self.entries.read().get(&key) {
            return Ok(Arc::clone(entry));
        }
        let mut entries = self.entries.write();
        // Closing drains the map under this lock; nothing may be inserted after
        self.ensure_open()?;
        Ok(Arc::clone(entries.entry(key).or_default()))
    }

    /// Drop an emptied entry unless someone else still holds it
    fn prune(&self, key: &CompositeKey, entry: &Arc<StoredEntry>) {
        let mut entries = self.entries.write();
        let unshared = entries
            .get(key)
            .is_some_and(|current| Arc::ptr_eq(current, entry) && Arc::strong_count(entry) == 2);
        if unshared && entry.slot.lock().is_none() {
            entries.remove(key);
        }
    }

    fn local_value(&self, key: &CompositeKey) -> Option<Value> {
        let entry = self.entries.read().get(key).cloned()?;
        let slot = entry.slot.lock();
        slot.as_ref().map(|stored| stored.value.clone())
    }

    fn parent_value(&self, namespace: &Namespace, key: &str) -> Result<Option<Value>, StoreError> {
        match &self.parent {
            Some(parent) => parent.get(namespace, key),
            None => Ok(None),
        }
    }

    fn replace(
        &self,
        namespace: &Namespace,
        key: &str,
        value: StoredValue,
    ) -> Result<Option<Value>, StoreError> {
        let entry = self.entry(CompositeKey::new(namespace, key))?;
        let mut slot = entry.slot.lock();
        // An entry fetched before a concurrent close may already be drained
        self.ensure_open()?;
        Ok(slot.replace(value).map(|stored| stored.value))
    }

    fn compute_if_absent<F>(
        &self,
        namespace: &Namespace,
        key: &str,
        compute: F,
    ) -> Result<Value, StoreError>
    where
        F: FnOnce(&str) -> Result<StoredValue, StoreError>,
    {
        self.ensure_open()?;
        let entry = self.entry(CompositeKey::new(namespace, key))?;
        let mut slot = entry.slot.lock();
        self.ensure_open()?;
        if let Some(stored) = slot.as_ref() {
            return Ok(stored.value.clone());
        }
        if let Some(inherited) = self.parent_value(namespace, key)? {
            return Ok(inherited);
        }

        trace!(store = %self.owner, namespace = %namespace, key, "Computing absent value");
        let stored = compute(key)?;
        let value = stored.value.clone();
        *slot = Some(stored);
        Ok(value)
    }
}

fn cast<T: Any + Send + Sync>(
    namespace: &Namespace,
    key: &str,
    value: &Value,
) -> Result<Arc<T>, StoreError> {
    value.downcast::<T>().ok_or_else(|| StoreError::TypeMismatch {
        namespace: namespace.to_string(),
        key: key.to_string(),
        expected: std::any::type_name::<T>(),
        actual: value.type_name(),
    })
}
