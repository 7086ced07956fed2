//! Host-side record model.
//!
//! An [`Instance`] stores its fields in a flat arena and links them by
//! [`FieldId`]; parent, child and sibling navigation is index lookups, so the
//! resolver can walk in any direction without back-pointers.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::errors::{Result, RuleError};

/// Stable address of a field inside its [`Instance`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct FieldId(usize);

impl FieldId {
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for FieldId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone)]
pub struct FieldNode {
    name: String,
    description: String,
    value: Option<String>,
    visible: bool,
    parent: Option<FieldId>,
    children: Vec<FieldId>,
}

impl FieldNode {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Free-text field definition carrying the `$keyword` annotations.
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Current value; an empty string counts as no value.
    pub fn value(&self) -> Option<&str> {
        self.value.as_deref().filter(|v| !v.is_empty())
    }

    pub fn is_empty(&self) -> bool {
        self.value().is_none()
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn parent(&self) -> Option<FieldId> {
        self.parent
    }

    pub fn children(&self) -> &[FieldId] {
        &self.children
    }
}

/// Serialized form of a field and its subtree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldDocument {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub value: Option<String>,
    #[serde(default = "default_visible")]
    pub visible: bool,
    #[serde(default)]
    pub children: Vec<FieldDocument>,
}

fn default_visible() -> bool {
    true
}

impl FieldDocument {
    pub fn new(name: &str, description: &str, value: Option<&str>) -> Self {
        Self {
            name: name.to_string(),
            description: description.to_string(),
            value: value.map(str::to_string),
            visible: true,
            children: Vec::new(),
        }
    }

    pub fn hidden(mut self) -> Self {
        self.visible = false;
        self
    }

    pub fn with_children(mut self, children: Vec<FieldDocument>) -> Self {
        self.children = children;
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstanceDocument {
    #[serde(default)]
    pub fields: Vec<FieldDocument>,
}

/// A record: an ordered forest of fields.
#[derive(Debug, Clone, Default)]
pub struct Instance {
    nodes: Vec<FieldNode>,
    roots: Vec<FieldId>,
}

impl Instance {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_fields(fields: Vec<FieldDocument>) -> Self {
        Self::from_document(InstanceDocument { fields })
    }

    pub fn from_document(doc: InstanceDocument) -> Self {
        let mut instance = Self::new();
        for field in doc.fields {
            instance.insert_document(field, None);
        }
        instance
    }

    pub fn from_json(json: &str) -> Result<Self> {
        let doc: InstanceDocument = serde_json::from_str(json)
            .map_err(|e| RuleError::InvalidDocument(format!("instance: {e}")))?;
        Ok(Self::from_document(doc))
    }

    fn insert_document(&mut self, doc: FieldDocument, parent: Option<FieldId>) -> FieldId {
        let FieldDocument {
            name,
            description,
            value,
            visible,
            children,
        } = doc;
        let id = self.push(FieldNode {
            name,
            description,
            value,
            visible,
            parent,
            children: Vec::new(),
        });
        for child in children {
            self.insert_document(child, Some(id));
        }
        id
    }

    /// Appends a field under `parent`, or as a new root field.
    pub fn add_field(
        &mut self,
        parent: Option<FieldId>,
        name: &str,
        description: &str,
        value: Option<&str>,
    ) -> FieldId {
        self.push(FieldNode {
            name: name.to_string(),
            description: description.to_string(),
            value: value.map(str::to_string),
            visible: true,
            parent,
            children: Vec::new(),
        })
    }

    fn push(&mut self, node: FieldNode) -> FieldId {
        let id = FieldId(self.nodes.len());
        let parent = node.parent;
        self.nodes.push(node);
        match parent.and_then(|p| self.nodes.get_mut(p.0)) {
            Some(parent) => parent.children.push(id),
            None => self.roots.push(id),
        }
        id
    }

    pub fn field(&self, id: FieldId) -> Option<&FieldNode> {
        self.nodes.get(id.0)
    }

    pub fn root_fields(&self) -> &[FieldId] {
        &self.roots
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn parent(&self, id: FieldId) -> Option<FieldId> {
        self.field(id).and_then(FieldNode::parent)
    }

    pub fn children(&self, id: FieldId) -> &[FieldId] {
        self.field(id).map(FieldNode::children).unwrap_or_default()
    }

    /// The list `id` belongs to, `id` included: its parent's children, or the
    /// root fields for a top-level field.
    pub fn siblings(&self, id: FieldId) -> &[FieldId] {
        match self.parent(id) {
            Some(parent) => self.children(parent),
            None => &self.roots,
        }
    }

    /// Depth-first, pre-order walk of the subtrees rooted at `start`.
    pub fn preorder<'a>(&'a self, start: &[FieldId]) -> impl Iterator<Item = FieldId> + 'a {
        let mut stack: Vec<FieldId> = start.iter().rev().copied().collect();
        std::iter::from_fn(move || {
            let id = stack.pop()?;
            stack.extend(self.children(id).iter().rev().copied());
            Some(id)
        })
    }

    /// First field named `name` in document order.
    pub fn find_by_name(&self, name: &str) -> Option<FieldId> {
        self.preorder(&self.roots)
            .find(|&id| self.field(id).is_some_and(|f| f.name == name))
    }

    pub fn set_value(&mut self, id: FieldId, value: Option<&str>) {
        if let Some(node) = self.nodes.get_mut(id.0) {
            node.value = value.map(str::to_string);
        }
    }

    pub fn set_visible(&mut self, id: FieldId, visible: bool) {
        if let Some(node) = self.nodes.get_mut(id.0) {
            node.visible = visible;
        }
    }
}
