//! Shared value types used across the execution core.

use serde::{Deserialize, Serialize};
use std::any::{Any, TypeId};
use std::fmt;
use std::sync::Arc;

/// Identifier of a node in the execution tree.
///
/// A unique id is an ordered list of `(type, value)` segments, rendered as
/// `[engine:trellis]/[container:Suite]/[test:case]`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct UniqueId {
    segments: Vec<Segment>,
}

/// One `(type, value)` pair of a [`UniqueId`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Segment {
    pub segment_type: String,
    pub value: String,
}

impl UniqueId {
    /// Create a root id with a single segment
    pub fn root(segment_type: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            segments: vec![Segment {
                segment_type: segment_type.into(),
                value: value.into(),
            }],
        }
    }

    /// Create a new id with one more segment appended
    pub fn append(&self, segment_type: impl Into<String>, value: impl Into<String>) -> Self {
        let mut segments = self.segments.clone();
        segments.push(Segment {
            segment_type: segment_type.into(),
            value: value.into(),
        });
        Self { segments }
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn last_segment(&self) -> Option<&Segment> {
        self.segments.last()
    }

    /// Whether `self` is `other` or one of its ancestors
    pub fn is_prefix_of(&self, other: &UniqueId) -> bool {
        other.segments.starts_with(&self.segments)
    }
}

impl fmt::Display for UniqueId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rendered: Vec<String> = self
            .segments
            .iter()
            .map(|s| format!("[{}:{}]", s.segment_type, s.value))
            .collect();
        write!(f, "{}", rendered.join("/"))
    }
}

/// Type-erased shared value.
///
/// Used for store entries, resolved arguments, test instances and
/// invocation results. Cloning is cheap (reference counted).
#[derive(Clone)]
pub struct Value {
    inner: Arc<dyn Any + Send + Sync>,
    type_name: &'static str,
}

impl Value {
    pub fn new<T: Any + Send + Sync>(value: T) -> Self {
        Self::from_arc(Arc::new(value))
    }

    pub fn from_arc<T: Any + Send + Sync>(value: Arc<T>) -> Self {
        Self {
            inner: value,
            type_name: std::any::type_name::<T>(),
        }
    }

    /// Name of the concrete type held by this value
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// `TypeId` of the concrete type held by this value
    pub fn value_type_id(&self) -> TypeId {
        Any::type_id(&*self.inner)
    }

    pub fn is<T: Any>(&self) -> bool {
        self.inner.is::<T>()
    }

    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.inner.downcast_ref::<T>()
    }

    pub fn downcast<T: Any + Send + Sync>(&self) -> Option<Arc<T>> {
        self.inner.clone().downcast::<T>().ok()
    }

    /// Identity comparison: both values share the same allocation
    pub fn ptr_eq(&self, other: &Value) -> bool {
        std::ptr::eq(
            Arc::as_ptr(&self.inner) as *const (),
            Arc::as_ptr(&other.inner) as *const (),
        )
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Value")
            .field("type", &self.type_name)
            .finish()
    }
}
