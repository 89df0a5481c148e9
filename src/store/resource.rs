//! Closeable resources owned by a store scope.

/// A value that must be released when the owning store scope is torn down.
///
/// Resources are registered explicitly through
/// [`NamespacedHierarchicalStore::put_resource`](super::NamespacedHierarchicalStore::put_resource)
/// or its compute-if-absent counterpart.
pub trait CloseableResource: Send + Sync {
    fn close(&self) -> anyhow::Result<()>;
}
