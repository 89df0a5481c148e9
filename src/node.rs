//! Execution Tree Nodes
//!
//! The core only reads nodes; building the tree (discovery) happens elsewhere.
//! [`TreeNode`] is a ready-made implementation for drivers that assemble
//! trees programmatically.

use crate::extension::Extension;
use crate::resolution::Executable;
use crate::types::UniqueId;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::sync::Arc;

/// Role of a node in the tree
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NodeKind {
    /// Groups children; may construct a shared instance
    Container,
    /// Runs a test body
    Test,
}

/// A unit in the execution tree
pub trait Node: Send + Sync {
    fn unique_id(&self) -> UniqueId;

    fn display_name(&self) -> String;

    /// Tags declared on this node only; inherited tags are added by the context
    fn tags(&self) -> BTreeSet<String> {
        BTreeSet::new()
    }

    fn kind(&self) -> NodeKind;

    fn children(&self) -> Vec<Arc<dyn Node>> {
        Vec::new()
    }

    /// Extensions registered in this node's registry before dispatch starts
    fn extensions(&self) -> Vec<Arc<dyn Extension>> {
        Vec::new()
    }

    /// Creates the instance bound to this node's context
    fn constructor(&self) -> Option<Arc<Executable>> {
        None
    }

    fn test_executable(&self) -> Option<Arc<Executable>> {
        None
    }

    /// Reason this node was declared disabled, honoured by the built-in
    /// `DisabledCondition`
    fn disabled_reason(&self) -> Option<String> {
        None
    }
}

/// Builder-style [`Node`] implementation
#[derive(Clone)]
pub struct TreeNode {
    unique_id: UniqueId,
    display_name: String,
    kind: NodeKind,
    tags: BTreeSet<String>,
    children: Vec<Arc<dyn Node>>,
    extensions: Vec<Arc<dyn Extension>>,
    constructor: Option<Arc<Executable>>,
    test_executable: Option<Arc<Executable>>,
    disabled_reason: Option<String>,
}

impl TreeNode {
    /// Root container identified as `[engine:<engine_id>]`
    pub fn engine(engine_id: &str, display_name: impl Into<String>) -> Self {
        Self::new(
            UniqueId::root("engine", engine_id),
            display_name,
            NodeKind::Container,
        )
    }

    pub fn container(parent: &UniqueId, name: &str) -> Self {
        Self::new(parent.append("container", name), name, NodeKind::Container)
    }

    pub fn test(parent: &UniqueId, name: &str) -> Self {
        Self::new(parent.append("test", name), name, NodeKind::Test)
    }

    pub fn new(unique_id: UniqueId, display_name: impl Into<String>, kind: NodeKind) -> Self {
        Self {
            unique_id,
            display_name: display_name.into(),
            kind,
            tags: BTreeSet::new(),
            children: Vec::new(),
            extensions: Vec::new(),
            constructor: None,
            test_executable: None,
            disabled_reason: None,
        }
    }

    pub fn id(&self) -> &UniqueId {
        &self.unique_id
    }

    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.insert(tag.into());
        self
    }

    pub fn with_child(mut self, child: impl Node + 'static) -> Self {
        self.children.push(Arc::new(child));
        self
    }

    pub fn with_extension(mut self, extension: impl Extension) -> Self {
        self.extensions.push(Arc::new(extension));
        self
    }

    pub fn with_shared_extension(mut self, extension: Arc<dyn Extension>) -> Self {
        self.extensions.push(extension);
        self
    }

    pub fn with_constructor(mut self, constructor: Executable) -> Self {
        self.constructor = Some(Arc::new(constructor));
        self
    }

    pub fn with_test(mut self, executable: Executable) -> Self {
        self.test_executable = Some(Arc::new(executable));
        self
    }

    pub fn disabled(mut self, reason: impl Into<String>) -> Self {
        self.disabled_reason = Some(reason.into());
        self
    }
}

impl Node for TreeNode {
    fn unique_id(&self) -> UniqueId {
        self.unique_id.clone()
    }

    fn display_name(&self) -> String {
        self.display_name.clone()
    }

    fn tags(&self) -> BTreeSet<String> {
        self.tags.clone()
    }

    fn kind(&self) -> NodeKind {
        self.kind
    }

    fn children(&self) -> Vec<Arc<dyn Node>> {
        self.children.clone()
    }

    fn extensions(&self) -> Vec<Arc<dyn Extension>> {
        self.extensions.clone()
    }

    fn constructor(&self) -> Option<Arc<Executable>> {
        self.constructor.clone()
    }

    fn test_executable(&self) -> Option<Arc<Executable>> {
        self.test_executable.clone()
    }

    fn disabled_reason(&self) -> Option<String> {
        self.disabled_reason.clone()
    }
}
