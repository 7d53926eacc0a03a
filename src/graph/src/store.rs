//! Graph store
//!
//! Owns every node and edge of one access graph. Nodes are deduplicated on
//! `(id, kind)` through a direct key -> index map; edges are appended as-is.
//! Handles returned by one store are tagged with its id and rejected by any
//! other store.

use crate::edge::{Edge, EdgeRef, Relation};
use crate::error::{GraphError, Result};
use crate::node::{Node, NodeKey, NodeKind};
use petgraph::graph::{DiGraph, EdgeIndex, EdgeReference, NodeIndex};
use petgraph::visit::EdgeRef as _;
use petgraph::Direction;
use serde::Serialize;
use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::debug;

static NEXT_GRAPH_ID: AtomicU64 = AtomicU64::new(1);

/// Handle to a node stored in a specific [`GraphStore`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeRef {
    graph: u64,
    index: NodeIndex,
}

impl NodeRef {
    /// Id of the store that issued this handle
    pub fn graph_id(&self) -> u64 {
        self.graph
    }
}

/// Node and edge counts
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct GraphStats {
    pub nodes: usize,
    pub edges: usize,
    pub resources: usize,
    pub identities: usize,
}

impl fmt::Display for GraphStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Number of Nodes: {} ({} resources, {} identities)\nNumber of Edges: {}",
            self.nodes, self.resources, self.identities, self.edges
        )
    }
}

/// Mutable collection of nodes and typed edges
pub struct GraphStore {
    /// Process-unique store id stamped on every handle
    id: u64,

    /// Petgraph directed multigraph; node and edge indices follow insertion order
    graph: DiGraph<Node, Relation>,

    /// Node index mapping ((id, kind) -> NodeIndex)
    index: HashMap<NodeKey, NodeIndex>,
}

impl GraphStore {
    /// Create a new empty store
    pub fn new() -> Self {
        Self {
            id: NEXT_GRAPH_ID.fetch_add(1, Ordering::Relaxed),
            graph: DiGraph::new(),
            index: HashMap::new(),
        }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    /// Return the canonical node for `(id, kind)`, inserting it if absent.
    ///
    /// When the stored node has no subtype and the argument carries one, the
    /// stored node adopts it. An already-set subtype is never overwritten.
    pub fn get_or_insert(&mut self, node: Node) -> NodeRef {
        if let Some(&index) = self.index.get(&node.key()) {
            let stored = &mut self.graph[index];
            if stored.subtype.is_none() && node.subtype.is_some() {
                debug!("Filling subtype of {} with {:?}", stored.id, node.subtype);
                stored.subtype = node.subtype;
            }
            return self.handle(index);
        }

        debug!("Inserting node {}", node);
        let key = node.key();
        let index = self.graph.add_node(node);
        self.index.insert(key, index);
        self.handle(index)
    }

    /// Append an edge. Both endpoints must have been issued by this store.
    pub fn insert_edge(
        &mut self,
        from: NodeRef,
        to: NodeRef,
        relation: impl Into<Relation>,
    ) -> Result<EdgeRef> {
        self.node(from)?;
        self.node(to)?;

        let relation = relation.into();
        debug!(
            "Inserting edge {} --{}--> {}",
            self.graph[from.index].id, relation, self.graph[to.index].id
        );
        let edge = self.graph.add_edge(from.index, to.index, relation);

        Ok(EdgeRef {
            graph: self.id,
            index: edge.index(),
        })
    }

    /// Resolve a handle issued by this store
    pub fn node(&self, node: NodeRef) -> Result<&Node> {
        if node.graph != self.id {
            return Err(GraphError::ForeignNode {
                node: format!("#{}", node.index.index()),
                owner: node.graph,
                graph: self.id,
            });
        }
        self.graph
            .node_weight(node.index)
            .ok_or_else(|| GraphError::UnknownNode(format!("#{}", node.index.index())))
    }

    /// Resolve an edge handle issued by this store
    pub fn edge(&self, edge: EdgeRef) -> Result<Edge<'_>> {
        if edge.graph != self.id {
            return Err(GraphError::ForeignNode {
                node: format!("edge #{}", edge.index),
                owner: edge.graph,
                graph: self.id,
            });
        }
        let index = EdgeIndex::new(edge.index);
        let (from, to) = self
            .graph
            .edge_endpoints(index)
            .ok_or_else(|| GraphError::UnknownNode(format!("edge #{}", edge.index)))?;

        Ok(Edge {
            from: &self.graph[from],
            to: &self.graph[to],
            relation: &self.graph[index],
        })
    }

    /// Look up the handle of a stored node equal to `node`
    pub fn find(&self, node: &Node) -> Option<NodeRef> {
        self.index_of(node).map(|index| self.handle(index))
    }

    /// Look up a stored node by id and kind
    pub fn get(&self, id: &str, kind: NodeKind) -> Option<&Node> {
        let key = NodeKey {
            id: id.to_string(),
            kind,
        };
        self.index.get(&key).map(|&index| &self.graph[index])
    }

    pub fn contains(&self, node: &Node) -> bool {
        self.index.contains_key(&node.key())
    }

    /// All edges leaving `node`, in insertion order, optionally restricted to one relation
    pub fn edges_from(&self, node: &Node, relation: Option<&Relation>) -> Vec<Edge<'_>> {
        self.edges_of(node, Direction::Outgoing, relation)
    }

    /// All edges arriving at `node`, in insertion order, optionally restricted to one relation
    pub fn edges_to(&self, node: &Node, relation: Option<&Relation>) -> Vec<Edge<'_>> {
        self.edges_of(node, Direction::Incoming, relation)
    }

    /// All nodes in insertion order
    pub fn nodes(&self) -> impl Iterator<Item = &Node> + '_ {
        self.graph.node_indices().map(move |index| &self.graph[index])
    }

    /// All edges in insertion order
    pub fn edges(&self) -> impl Iterator<Item = Edge<'_>> + '_ {
        self.graph.edge_references().map(move |edge| self.view(edge))
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    pub fn is_empty(&self) -> bool {
        self.graph.node_count() == 0
    }

    pub fn stats(&self) -> GraphStats {
        let resources = self.nodes().filter(|node| node.is_resource()).count();
        GraphStats {
            nodes: self.node_count(),
            edges: self.edge_count(),
            resources,
            identities: self.node_count() - resources,
        }
    }

    pub(crate) fn index_of(&self, node: &Node) -> Option<NodeIndex> {
        self.index.get(&node.key()).copied()
    }

    pub(crate) fn weight(&self, index: NodeIndex) -> &Node {
        &self.graph[index]
    }

    pub(crate) fn relation(&self, index: EdgeIndex) -> &Relation {
        &self.graph[index]
    }

    /// Edges incident to `index` in one direction, sorted into insertion order
    ///
    /// Petgraph hands adjacency lists back newest first.
    pub(crate) fn incident(
        &self,
        index: NodeIndex,
        direction: Direction,
    ) -> Vec<EdgeReference<'_, Relation>> {
        let mut edges: Vec<_> = self.graph.edges_directed(index, direction).collect();
        edges.sort_by_key(|edge| edge.id());
        edges
    }

    fn edges_of(
        &self,
        node: &Node,
        direction: Direction,
        relation: Option<&Relation>,
    ) -> Vec<Edge<'_>> {
        let Some(index) = self.index_of(node) else {
            return Vec::new();
        };

        self.incident(index, direction)
            .into_iter()
            .filter(|edge| relation.map_or(true, |r| edge.weight() == r))
            .map(|edge| self.view(edge))
            .collect()
    }

    fn view<'g>(&'g self, edge: EdgeReference<'g, Relation>) -> Edge<'g> {
        Edge {
            from: &self.graph[edge.source()],
            to: &self.graph[edge.target()],
            relation: &self.graph[edge.id()],
        }
    }

    fn handle(&self, index: NodeIndex) -> NodeRef {
        NodeRef {
            graph: self.id,
            index,
        }
    }
}

impl Default for GraphStore {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for GraphStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GraphStore")
            .field("id", &self.id)
            .field("nodes", &self.node_count())
            .field("edges", &self.edge_count())
            .finish()
    }
}

impl fmt::Display for GraphStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Nodes:")?;
        for node in self.nodes() {
            writeln!(f, "  {}", node)?;
        }
        writeln!(f)?;
        writeln!(f, "Edges:")?;
        for edge in self.edges() {
            writeln!(f, "  {}", edge)?;
        }
        Ok(())
    }
}
