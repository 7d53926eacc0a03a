//! Node identity model
//!
//! A node is either a cloud resource (`projects/p1`, `folders/42`) or an
//! identity principal (`user:alice@example.com`). Identity is the
//! `(id, kind)` pair; the subtype is descriptive and never part of equality.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::hash::{Hash, Hasher};

/// What a node represents
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    /// A cloud asset in the containment hierarchy
    Resource,
    /// A user, group or service account
    Identity,
}

impl NodeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            NodeKind::Resource => "resource",
            NodeKind::Identity => "identity",
        }
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Owned lookup key for the node index
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NodeKey {
    pub id: String,
    pub kind: NodeKind,
}

/// Graph vertex
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Node {
    /// Resource path or `kind:address` identity string
    pub id: String,

    pub kind: NodeKind,

    /// Resource type (`project`, `folder`) or identity type (`user`, `group`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subtype: Option<String>,
}

impl Node {
    pub fn new(id: impl Into<String>, kind: NodeKind) -> Self {
        Self {
            id: id.into(),
            kind,
            subtype: None,
        }
    }

    /// Create a resource node
    pub fn resource(id: impl Into<String>) -> Self {
        Self::new(id, NodeKind::Resource)
    }

    /// Create an identity node
    pub fn identity(id: impl Into<String>) -> Self {
        Self::new(id, NodeKind::Identity)
    }

    /// Create an identity node from an IAM member string such as
    /// `serviceAccount:ci@proj.iam.gserviceaccount.com`, using the text
    /// before the first `:` as the subtype. Members without a `:`
    /// (`allUsers`) are their own subtype.
    pub fn identity_from_member(member: impl Into<String>) -> Self {
        let member = member.into();
        let subtype = member.split(':').next().unwrap_or_default().to_string();
        Self::identity(member).with_subtype(subtype)
    }

    /// Set the subtype. An empty string leaves it unset.
    pub fn with_subtype(mut self, subtype: impl Into<String>) -> Self {
        let subtype = subtype.into();
        self.subtype = if subtype.is_empty() { None } else { Some(subtype) };
        self
    }

    pub fn subtype(&self) -> Option<&str> {
        self.subtype.as_deref()
    }

    pub fn is_resource(&self) -> bool {
        self.kind == NodeKind::Resource
    }

    pub fn is_identity(&self) -> bool {
        self.kind == NodeKind::Identity
    }

    pub fn key(&self) -> NodeKey {
        NodeKey {
            id: self.id.clone(),
            kind: self.kind,
        }
    }
}

impl PartialEq for Node {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id && self.kind == other.kind
    }
}

impl Eq for Node {}

impl Hash for Node {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
        self.kind.hash(state);
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.subtype {
            Some(subtype) => write!(f, "{}_{}({})", subtype, self.kind, self.id),
            None => write!(f, "{}({})", self.kind, self.id),
        }
    }
}
