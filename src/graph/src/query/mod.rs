//! Traversal and query engine
//!
//! Answers the two permission questions over a populated [`GraphStore`]:
//! what an identity can reach (and under which role), and who can reach a
//! resource (and through which grant). Also resolves resource ancestry and
//! expands group membership.
//!
//! # Traversal rules
//!
//! - Walks are depth-first and pre-order; sibling edges are visited in
//!   store insertion order.
//! - No visited set: a node reachable along two paths is reported twice.
//! - Every public call starts from an empty accumulator.
//! - Reaching a node that is already on the current path fails with
//!   [`GraphError::CycleDetected`]; going deeper than
//!   [`TraversalLimits::max_depth`] fails with [`GraphError::DepthExceeded`].
//!
//! The identity-side and resource-side queries are not inverses. Walking
//! down from an identity follows `belongs_to` into its groups and on to the
//! groups' grants. Walking up from a resource reports the group holding a
//! grant but does not expand that group into its members.


use crate::edge::Relation;
use crate::error::{GraphError, Result};
use crate::node::Node;
use crate::store::GraphStore;
use petgraph::graph::NodeIndex;
use petgraph::visit::EdgeRef as _;
use petgraph::Direction;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Default bound on walk depth
pub const DEFAULT_MAX_DEPTH: usize = 512;

/// Bounds applied to every walk
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TraversalLimits {
    /// Maximum number of edges between the start node and any visited node
    #[serde(default = "default_max_depth")]
    pub max_depth: usize,
}

fn default_max_depth() -> usize {
    DEFAULT_MAX_DEPTH
}

impl Default for TraversalLimits {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

/// A resource an identity can reach, with the role it reaches it under
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ResourceGrant<'g> {
    pub node: &'g Node,
    pub subtype: Option<&'g str>,
    /// Relation of the last non-structural edge on the path. `None` only
    /// when the walk started on a resource and has not yet crossed a grant.
    pub role: Option<&'g str>,
}

/// An identity with a grant or membership pointing at a resource or one of its ancestors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct IdentityGrant<'g> {
    pub node: &'g Node,
    pub relation: &'g Relation,
}

/// Read-only queries over a graph store
#[derive(Debug, Clone, Copy)]
pub struct QueryEngine<'g> {
    graph: &'g GraphStore,
    limits: TraversalLimits,
}

impl<'g> QueryEngine<'g> {
    pub fn new(graph: &'g GraphStore) -> Self {
        Self::with_limits(graph, TraversalLimits::default())
    }

    pub fn with_limits(graph: &'g GraphStore, limits: TraversalLimits) -> Self {
        Self { graph, limits }
    }

    pub fn limits(&self) -> TraversalLimits {
        self.limits
    }

    pub fn graph(&self) -> &'g GraphStore {
        self.graph
    }

    /// Parent chain of a resource, nearest ancestor first and root last
    pub fn resource_ancestors(&self, resource: &Node) -> Result<Vec<&'g Node>> {
        let Some(start) = self.graph.index_of(resource) else {
            return Ok(Vec::new());
        };

        let mut walk = Walk::new(self.graph, self.limits);
        walk.ancestors(start)?;
        debug!("Resolved {} ancestors of {}", walk.out.len(), resource.id);
        Ok(walk.out)
    }

    /// Everything reachable from an identity, with the effective role
    ///
    /// A direct grant or membership edge sets the role to its own relation;
    /// an `is_parent_resource_of` edge carries the caller's role down to the
    /// child resource.
    pub fn identity_permissions(&self, identity: &Node) -> Result<Vec<ResourceGrant<'g>>> {
        let Some(start) = self.graph.index_of(identity) else {
            return Ok(Vec::new());
        };

        let mut walk = Walk::new(self.graph, self.limits);
        walk.reachable(start, None)?;
        debug!("Resolved {} reachable nodes for {}", walk.out.len(), identity.id);
        Ok(walk.out)
    }

    /// Identities holding a grant on a resource or on any of its ancestors
    pub fn resource_identities(&self, resource: &Node) -> Result<Vec<IdentityGrant<'g>>> {
        let Some(start) = self.graph.index_of(resource) else {
            return Ok(Vec::new());
        };

        let mut walk = Walk::new(self.graph, self.limits);
        walk.grantees(start)?;
        debug!("Resolved {} grants reaching {}", walk.out.len(), resource.id);
        Ok(walk.out)
    }

    /// Groups an identity belongs to, directly or through nested groups
    pub fn identity_groups(&self, identity: &Node) -> Result<Vec<&'g Node>> {
        let Some(start) = self.graph.index_of(identity) else {
            return Ok(Vec::new());
        };

        let mut walk = Walk::new(self.graph, self.limits);
        walk.membership(start, Direction::Outgoing)?;
        Ok(walk.out)
    }

    /// Members of a group, directly or through nested groups
    pub fn group_members(&self, group: &Node) -> Result<Vec<&'g Node>> {
        let Some(start) = self.graph.index_of(group) else {
            return Ok(Vec::new());
        };

        let mut walk = Walk::new(self.graph, self.limits);
        walk.membership(start, Direction::Incoming)?;
        Ok(walk.out)
    }
}

/// Per-call walk state: the result accumulator plus the current DFS path
struct Walk<'g, T> {
    graph: &'g GraphStore,
    limits: TraversalLimits,
    path: Vec<NodeIndex>,
    out: Vec<T>,
}

impl<'g, T> Walk<'g, T> {
    fn new(graph: &'g GraphStore, limits: TraversalLimits) -> Self {
        Self {
            graph,
            limits,
            path: Vec::new(),
            out: Vec::new(),
        }
    }

    fn enter(&mut self, index: NodeIndex) -> Result<()> {
        if let Some(start) = self.path.iter().position(|&on_path| on_path == index) {
            let path = self.path[start..]
                .iter()
                .chain(std::iter::once(&index))
                .map(|&i| self.graph.weight(i).id.clone())
                .collect();
            return Err(GraphError::CycleDetected { path });
        }

        if self.path.len() > self.limits.max_depth {
            return Err(GraphError::DepthExceeded {
                limit: self.limits.max_depth,
                node: self.graph.weight(index).id.clone(),
            });
        }

        self.path.push(index);
        Ok(())
    }

    fn leave(&mut self) {
        self.path.pop();
    }
}

impl<'g> Walk<'g, &'g Node> {
    fn ancestors(&mut self, index: NodeIndex) -> Result<()> {
        self.enter(index)?;
        let graph = self.graph;

        for edge in graph.incident(index, Direction::Incoming) {
            if !graph.relation(edge.id()).is_parent_of() {
                continue;
            }
            let parent = edge.source();
            self.out.push(graph.weight(parent));
            self.ancestors(parent)?;
        }

        self.leave();
        Ok(())
    }

    fn membership(&mut self, index: NodeIndex, direction: Direction) -> Result<()> {
        self.enter(index)?;
        let graph = self.graph;

        for edge in graph.incident(index, direction) {
            if *graph.relation(edge.id()) != Relation::BelongsTo {
                continue;
            }
            let next = match direction {
                Direction::Outgoing => edge.target(),
                Direction::Incoming => edge.source(),
            };
            self.out.push(graph.weight(next));
            self.membership(next, direction)?;
        }

        self.leave();
        Ok(())
    }
}

impl<'g> Walk<'g, ResourceGrant<'g>> {
    fn reachable(&mut self, index: NodeIndex, inherited: Option<&'g str>) -> Result<()> {
        self.enter(index)?;
        let graph = self.graph;

        for edge in graph.incident(index, Direction::Outgoing) {
            let relation = graph.relation(edge.id());
            let role = if relation.is_parent_of() {
                inherited
            } else {
                Some(relation.as_str())
            };

            let target = edge.target();
            let node = graph.weight(target);
            self.out.push(ResourceGrant {
                node,
                subtype: node.subtype(),
                role,
            });
            self.reachable(target, role)?;
        }

        self.leave();
        Ok(())
    }
}

impl<'g> Walk<'g, IdentityGrant<'g>> {
    fn grantees(&mut self, index: NodeIndex) -> Result<()> {
        self.enter(index)?;
        let graph = self.graph;

        for edge in graph.incident(index, Direction::Incoming) {
            let relation = graph.relation(edge.id());
            let source = edge.source();
            if !relation.is_parent_of() {
                self.out.push(IdentityGrant {
                    node: graph.weight(source),
                    relation,
                });
            }
            self.grantees(source)?;
        }

        self.leave();
        Ok(())
    }
}
