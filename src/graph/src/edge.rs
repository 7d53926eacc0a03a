//! Edge model
//!
//! Edges are directed and typed. The relation is either structural
//! (`is_parent_resource_of`, parent resource -> child resource), group
//! membership (`belongs_to`, member -> group) or an IAM role name
//! (identity -> resource). Edges are never deduplicated.

use crate::node::Node;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Wire name of the structural parent relation
pub const IS_PARENT_RESOURCE_OF: &str = "is_parent_resource_of";

/// Wire name of the group membership relation
pub const BELONGS_TO: &str = "belongs_to";

/// Relation carried by an edge
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Relation {
    /// `from` is the direct parent container of `to`
    ParentOf,
    /// `from` is a member of the group `to`
    BelongsTo,
    /// `from` holds this role on `to`
    Role(RoleName),
}

/// Role name that is neither of the reserved relation names
///
/// Only built through the `Relation` conversions, so a reserved name always
/// maps to its own variant.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RoleName(String);

impl RoleName {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Relation {
    pub fn role(name: impl Into<String>) -> Self {
        Relation::from(name.into())
    }

    pub fn as_str(&self) -> &str {
        match self {
            Relation::ParentOf => IS_PARENT_RESOURCE_OF,
            Relation::BelongsTo => BELONGS_TO,
            Relation::Role(name) => name.as_str(),
        }
    }

    pub fn is_parent_of(&self) -> bool {
        matches!(self, Relation::ParentOf)
    }
}

impl From<&str> for Relation {
    fn from(name: &str) -> Self {
        match name {
            IS_PARENT_RESOURCE_OF => Relation::ParentOf,
            BELONGS_TO => Relation::BelongsTo,
            other => Relation::Role(RoleName(other.to_string())),
        }
    }
}

impl From<String> for Relation {
    fn from(name: String) -> Self {
        match name.as_str() {
            IS_PARENT_RESOURCE_OF => Relation::ParentOf,
            BELONGS_TO => Relation::BelongsTo,
            _ => Relation::Role(RoleName(name)),
        }
    }
}

impl From<Relation> for String {
    fn from(relation: Relation) -> Self {
        match relation {
            Relation::Role(RoleName(name)) => name,
            other => other.as_str().to_string(),
        }
    }
}

impl fmt::Display for Relation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Handle to a stored edge
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EdgeRef {
    pub(crate) graph: u64,
    pub(crate) index: usize,
}

impl EdgeRef {
    /// Position of the edge in insertion order
    pub fn index(&self) -> usize {
        self.index
    }
}

/// Borrowed view of a stored edge
#[derive(Debug, Clone, Copy)]
pub struct Edge<'g> {
    pub from: &'g Node,
    pub to: &'g Node,
    pub relation: &'g Relation,
}

impl fmt::Display for Edge<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.relation {
            Relation::ParentOf => write!(f, "{}----{}----{}", self.from, self.relation, self.to),
            other => write!(f, "{}----is_{}_of----{}", self.from, other, self.to),
        }
    }
}
