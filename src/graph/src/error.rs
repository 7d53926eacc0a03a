//! Error types for the access graph

use thiserror::Error;

pub type Result<T> = std::result::Result<T, GraphError>;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GraphError {
    /// A node handle issued by a different graph store was passed to this one
    #[error("Node {node} belongs to graph {owner}, not graph {graph}")]
    ForeignNode {
        node: String,
        owner: u64,
        graph: u64,
    },

    /// A node handle does not resolve to any stored node
    #[error("Unknown node handle: {0}")]
    UnknownNode(String),

    /// The walk reached a node that is already on the current path
    #[error("Cycle detected: {}", path.join(" -> "))]
    CycleDetected { path: Vec<String> },

    /// The walk went deeper than the configured limit
    #[error("Traversal depth limit of {limit} exceeded at {node}")]
    DepthExceeded { limit: usize, node: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cycle_display() {
        let err = GraphError::CycleDetected {
            path: vec![
                "folders/1".to_string(),
                "folders/2".to_string(),
                "folders/1".to_string(),
            ],
        };
        assert_eq!(
            err.to_string(),
            "Cycle detected: folders/1 -> folders/2 -> folders/1"
        );
    }

    #[test]
    fn test_foreign_node_display() {
        let err = GraphError::ForeignNode {
            node: "projects/p1".to_string(),
            owner: 3,
            graph: 7,
        };
        assert!(err.to_string().contains("projects/p1"));
        assert!(err.to_string().contains("graph 7"));
    }
}
