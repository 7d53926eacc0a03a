//! Integration tests for the access graph
//!
//! Exercises the public API end to end: building a store the way an asset
//! loader does, then running every query against it, including concurrent
//! reads once construction has finished.

use permgraph_graph::{
    GraphError, GraphStore, Node, NodeKind, QueryEngine, Relation, TraversalLimits,
};
use std::thread;

/// Build a small organisation the way the asset loader would: every asset
/// inserts itself with a subtype, its parent without one, then its bindings.
fn build_organisation() -> GraphStore {
    let mut graph = GraphStore::new();

    let assets: &[(&str, &str, Option<&str>, &[(&str, &str)])] = &[
        ("organizations/1", "Organization", None, &[("roles/owner", "user:admin@test.com")]),
        ("folders/10", "Folder", Some("organizations/1"), &[("roles/viewer", "group:eng@test.com")]),
        ("projects/p1111", "Project", Some("folders/10"), &[
            ("roles/editor", "user:ron@test.com"),
            ("roles/editor", "serviceAccount:ci@p1111.iam.gserviceaccount.com"),
        ]),
        ("projects/p2222", "Project", Some("folders/10"), &[]),
        ("buckets/logs", "Bucket", Some("projects/p1111"), &[("roles/storage.admin", "user:kim@test.com")]),
    ];

    for (id, asset_type, parent, bindings) in assets {
        let resource = graph.get_or_insert(Node::resource(*id).with_subtype(*asset_type));
        if let Some(parent) = parent {
            let parent = graph.get_or_insert(Node::resource(*parent));
            graph.insert_edge(parent, resource, Relation::ParentOf).unwrap();
        }
        for (role, member) in bindings.iter() {
            let identity = graph.get_or_insert(Node::identity_from_member(*member));
            graph.insert_edge(identity, resource, *role).unwrap();
        }
    }

    let ron = graph.get_or_insert(Node::identity_from_member("user:ron@test.com"));
    let eng = graph.get_or_insert(Node::identity_from_member("group:eng@test.com"));
    graph.insert_edge(ron, eng, Relation::BelongsTo).unwrap();

    graph
}

#[test]
fn test_loader_order_keeps_first_subtype() {
    let graph = build_organisation();

    // folders/10 was first inserted as an asset with a subtype, then as a
    // parent without one
    let folder = graph.get("folders/10", NodeKind::Resource).unwrap();
    assert_eq!(folder.subtype(), Some("Folder"));

    let sa = graph
        .get("serviceAccount:ci@p1111.iam.gserviceaccount.com", NodeKind::Identity)
        .unwrap();
    assert_eq!(sa.subtype(), Some("serviceAccount"));

    let stats = graph.stats();
    assert_eq!(stats.resources, 5);
    assert_eq!(stats.identities, 5);
    assert_eq!(stats.edges, 10);
}

#[test]
fn test_parent_seen_before_its_own_record_adopts_subtype() {
    let mut graph = GraphStore::new();
    let child = graph.get_or_insert(Node::resource("projects/p1").with_subtype("Project"));
    let parent = graph.get_or_insert(Node::resource("folders/9"));
    graph.insert_edge(parent, child, Relation::ParentOf).unwrap();

    assert_eq!(graph.node(parent).unwrap().subtype(), None);
    graph.get_or_insert(Node::resource("folders/9").with_subtype("Folder"));
    assert_eq!(graph.node(parent).unwrap().subtype(), Some("Folder"));
}

#[test]
fn test_all_queries_on_organisation() {
    let graph = build_organisation();
    let engine = QueryEngine::new(&graph);

    let ancestors: Vec<_> = engine
        .resource_ancestors(&Node::resource("buckets/logs"))
        .unwrap()
        .into_iter()
        .map(|node| node.id.as_str())
        .collect();
    assert_eq!(ancestors, vec!["projects/p1111", "folders/10", "organizations/1"]);

    let reachable: Vec<_> = engine
        .identity_permissions(&Node::identity("user:ron@test.com"))
        .unwrap()
        .into_iter()
        .map(|row| (row.node.id.as_str(), row.role))
        .collect();
    assert_eq!(
        reachable,
        vec![
            ("projects/p1111", Some("roles/editor")),
            ("buckets/logs", Some("roles/editor")),
            ("group:eng@test.com", Some("belongs_to")),
            ("folders/10", Some("roles/viewer")),
            ("projects/p1111", Some("roles/viewer")),
            ("buckets/logs", Some("roles/viewer")),
            ("projects/p2222", Some("roles/viewer")),
        ]
    );

    let grantees: Vec<_> = engine
        .resource_identities(&Node::resource("projects/p1111"))
        .unwrap()
        .into_iter()
        .map(|row| (row.node.id.as_str(), row.relation.as_str()))
        .collect();
    assert_eq!(
        grantees,
        vec![
            ("user:admin@test.com", "roles/owner"),
            ("group:eng@test.com", "roles/viewer"),
            ("user:ron@test.com", "belongs_to"),
            ("user:ron@test.com", "roles/editor"),
            ("serviceAccount:ci@p1111.iam.gserviceaccount.com", "roles/editor"),
        ]
    );
}

#[test]
fn test_grant_below_queried_resource_is_not_reported() {
    let graph = build_organisation();
    let engine = QueryEngine::new(&graph);

    let grantees = engine
        .resource_identities(&Node::resource("projects/p2222"))
        .unwrap();
    assert!(!grantees
        .iter()
        .any(|row| row.node.id == "user:kim@test.com"));
}

#[test]
fn test_cross_store_edge_fails_fast() {
    let mut first = build_organisation();
    let mut second = GraphStore::new();
    let outsider = second.get_or_insert(Node::identity("user:eve@test.com"));
    let project = first.get_or_insert(Node::resource("projects/p1111"));

    let before = first.edge_count();
    let err = first.insert_edge(outsider, project, "roles/owner").unwrap_err();
    assert!(matches!(err, GraphError::ForeignNode { .. }));
    assert_eq!(first.edge_count(), before);
}

#[test]
fn test_concurrent_reads_after_construction() {
    let graph = build_organisation();
    let engine = QueryEngine::with_limits(&graph, TraversalLimits::default());
    let expected = engine
        .identity_permissions(&Node::identity("user:ron@test.com"))
        .unwrap()
        .len();

    thread::scope(|scope| {
        let handles: Vec<_> = (0..8)
            .map(|_| {
                scope.spawn(|| {
                    engine
                        .identity_permissions(&Node::identity("user:ron@test.com"))
                        .unwrap()
                        .len()
                })
            })
            .collect();

        for handle in handles {
            assert_eq!(handle.join().unwrap(), expected);
        }
    });
}
