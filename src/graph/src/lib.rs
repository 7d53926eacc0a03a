//! # Permgraph Graph
//!
//! In-memory access graph over a cloud resource hierarchy and the identities
//! granted roles on it.
//!
//! ## Features
//!
//! - **Node identity**: nodes are deduplicated on `(id, kind)`; the first
//!   non-empty subtype seen for a node sticks
//! - **Typed multigraph**: parent, membership and role edges, duplicates kept
//! - **Queries**: resource ancestry, identity -> resources with inherited
//!   roles, resource -> identities through ancestors, group expansion
//! - **Guards**: cycle detection on the walk path and a depth bound
//!
//! ## Example
//!
//! ```rust
//! use permgraph_graph::{GraphStore, Node, QueryEngine, Relation};
//!
//! # fn main() -> Result<(), permgraph_graph::GraphError> {
//! let mut graph = GraphStore::new();
//! let folder = graph.get_or_insert(Node::resource("folders/1").with_subtype("folder"));
//! let project = graph.get_or_insert(Node::resource("projects/p1").with_subtype("project"));
//! let user = graph.get_or_insert(Node::identity_from_member("user:ron@example.com"));
//!
//! graph.insert_edge(folder, project, Relation::ParentOf)?;
//! graph.insert_edge(user, folder, "roles/editor")?;
//!
//! let engine = QueryEngine::new(&graph);
//! let reachable = engine.identity_permissions(&Node::identity("user:ron@example.com"))?;
//! assert_eq!(reachable[1].node.id, "projects/p1");
//! assert_eq!(reachable[1].role, Some("roles/editor"));
//! # Ok(())
//! # }
//! ```

pub mod edge;
pub mod error;
pub mod node;
pub mod query;
pub mod store;

pub use edge::{Edge, EdgeRef, Relation, RoleName, BELONGS_TO, IS_PARENT_RESOURCE_OF};
pub use error::{GraphError, Result};
pub use node::{Node, NodeKey, NodeKind};
pub use query::{IdentityGrant, QueryEngine, ResourceGrant, TraversalLimits};
pub use store::{GraphStats, GraphStore, NodeRef};
