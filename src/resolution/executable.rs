//! Callable targets and their declared parameters.

use crate::types::Value;
use std::any::{Any, TypeId};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// Signature shared by every executable body: bound instance plus resolved
/// arguments in declaration order
pub type ExecutableBody =
    dyn Fn(Option<&Value>, &[Option<Value>]) -> anyhow::Result<Option<Value>> + Send + Sync;

/// Declared type of a parameter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TypeDescriptor {
    type_id: Option<TypeId>,
    type_name: &'static str,
    optional: bool,
}

impl TypeDescriptor {
    /// A value of type `T` is required
    pub fn of<T: Any>() -> Self {
        Self {
            type_id: Some(TypeId::of::<T>()),
            type_name: std::any::type_name::<T>(),
            optional: false,
        }
    }

    /// A value of type `T`, or nothing
    pub fn optional<T: Any>() -> Self {
        Self {
            optional: true,
            ..Self::of::<T>()
        }
    }

    /// Any value, or nothing
    pub fn any() -> Self {
        Self {
            type_id: None,
            type_name: "any",
            optional: true,
        }
    }

    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    pub fn is_optional(&self) -> bool {
        self.optional
    }

    /// Whether the declared type is exactly `T`
    pub fn is<T: Any>(&self) -> bool {
        self.type_id == Some(TypeId::of::<T>())
    }

    pub fn accepts(&self, value: &Value) -> bool {
        match self.type_id {
            Some(type_id) => value.value_type_id() == type_id,
            None => true,
        }
    }
}

/// One declared input of an [`Executable`]
#[derive(Debug, Clone)]
pub struct ParameterDescriptor {
    index: usize,
    name: String,
    declared: TypeDescriptor,
    metadata: BTreeMap<String, String>,
}

impl ParameterDescriptor {
    pub fn new(name: impl Into<String>, declared: TypeDescriptor) -> Self {
        Self {
            index: 0,
            name: name.into(),
            declared,
            metadata: BTreeMap::new(),
        }
    }

    /// Attach an annotation-like key/value visible to resolvers
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn declared_type(&self) -> TypeDescriptor {
        self.declared
    }

    pub fn metadata(&self) -> &BTreeMap<String, String> {
        &self.metadata
    }
}

impl fmt::Display for ParameterDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.declared.type_name, self.name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutableKind {
    Constructor,
    Method,
}

/// A named callable with declared parameters
#[derive(Clone)]
pub struct Executable {
    name: String,
    kind: ExecutableKind,
    parameters: Vec<ParameterDescriptor>,
    requires_outer_instance: bool,
    body: Arc<ExecutableBody>,
}

impl Executable {
    pub fn method<F>(name: impl Into<String>, body: F) -> Self
    where
        F: Fn(Option<&Value>, &[Option<Value>]) -> anyhow::Result<Option<Value>>
            + Send
            + Sync
            + 'static,
    {
        Self::new(name, ExecutableKind::Method, Arc::new(body))
    }

    pub fn constructor<F>(name: impl Into<String>, body: F) -> Self
    where
        F: Fn(Option<&Value>, &[Option<Value>]) -> anyhow::Result<Option<Value>>
            + Send
            + Sync
            + 'static,
    {
        Self::new(name, ExecutableKind::Constructor, Arc::new(body))
    }

    fn new(name: impl Into<String>, kind: ExecutableKind, body: Arc<ExecutableBody>) -> Self {
        Self {
            name: name.into(),
            kind,
            parameters: Vec::new(),
            requires_outer_instance: false,
            body,
        }
    }

    pub fn with_parameter(self, name: impl Into<String>, declared: TypeDescriptor) -> Self {
        self.with_parameter_descriptor(ParameterDescriptor::new(name, declared))
    }

    pub fn with_parameter_descriptor(mut self, mut descriptor: ParameterDescriptor) -> Self {
        descriptor.index = self.parameters.len();
        self.parameters.push(descriptor);
        self
    }

    /// Declare that position 0 takes the enclosing container's instance
    pub fn nested_in_outer(mut self, outer: TypeDescriptor) -> Self {
        if !self.requires_outer_instance {
            self.parameters
                .insert(0, ParameterDescriptor::new("outer", outer));
            for (index, parameter) in self.parameters.iter_mut().enumerate() {
                parameter.index = index;
            }
            self.requires_outer_instance = true;
        }
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> ExecutableKind {
        self.kind
    }

    pub fn parameters(&self) -> &[ParameterDescriptor] {
        &self.parameters
    }

    pub fn requires_outer_instance(&self) -> bool {
        self.requires_outer_instance
    }

    /// Human readable target, e.g. `method [sum]`
    pub fn description(&self) -> String {
        match self.kind {
            ExecutableKind::Constructor => format!("constructor [{}]", self.name),
            ExecutableKind::Method => format!("method [{}]", self.name),
        }
    }

    pub fn invoke(
        &self,
        instance: Option<&Value>,
        arguments: &[Option<Value>],
    ) -> anyhow::Result<Option<Value>> {
        (self.body)(instance, arguments)
    }
}

impl fmt::Debug for Executable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Executable")
            .field("name", &self.name)
            .field("kind", &self.kind)
            .field("parameters", &self.parameters)
            .field("requires_outer_instance", &self.requires_outer_instance)
            .finish()
    }
}
