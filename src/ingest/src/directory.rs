//! Directory service boundary
//!
//! A [`DirectorySource`] lists users, groups and group members the way an
//! admin directory API does. [`ingest_memberships`] turns that listing into
//! identity nodes and `belongs_to` edges (member -> group), which is what lets
//! the identity-side query reach resources granted to a group.

use crate::error::{IngestError, Result};
use crate::IngestReport;
use async_trait::async_trait;
use permgraph_graph::{GraphStore, Node, Relation};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use tracing::{debug, info, warn};

/// Identity subtype used for directory groups
pub const GROUP_SUBTYPE: &str = "group";

/// Identity subtype assumed when a member record carries no type
pub const DEFAULT_MEMBER_TYPE: &str = "user";

/// A user account
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DirectoryUser {
    #[serde(default)]
    pub primary_email: String,

    #[serde(default)]
    pub name: UserName,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserName {
    #[serde(default)]
    pub full_name: String,
}

impl DirectoryUser {
    pub fn full_name(&self) -> &str {
        &self.name.full_name
    }
}

/// A group
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DirectoryGroup {
    #[serde(default)]
    pub email: String,

    #[serde(default)]
    pub name: String,
}

/// One member of a group
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GroupMember {
    #[serde(default)]
    pub email: String,

    /// Membership role inside the group (`OWNER`, `MANAGER`, `MEMBER`)
    #[serde(default)]
    pub role: String,

    /// Member kind (`USER`, `GROUP`, ...)
    #[serde(default, rename = "type")]
    pub member_type: String,
}

impl GroupMember {
    /// Identity subtype for this member, lowercased
    pub fn identity_type(&self) -> String {
        if self.member_type.is_empty() {
            DEFAULT_MEMBER_TYPE.to_string()
        } else {
            self.member_type.to_lowercase()
        }
    }

    /// Identity id in IAM member form (`user:ron@example.com`)
    pub fn identity_id(&self) -> String {
        format!("{}:{}", self.identity_type(), self.email)
    }
}

/// Source of users, groups and memberships
#[async_trait]
pub trait DirectorySource: Send + Sync {
    async fn list_users(&self) -> Result<Vec<DirectoryUser>>;

    async fn list_groups(&self) -> Result<Vec<DirectoryGroup>>;

    /// Members of one group. A group without members yields an empty list.
    async fn list_members(&self, group_email: &str) -> Result<Vec<GroupMember>>;
}

/// Full directory listing as stored on disk
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DirectorySnapshot {
    #[serde(default)]
    pub users: Vec<DirectoryUser>,

    #[serde(default)]
    pub groups: Vec<DirectoryGroup>,

    /// Group email -> members
    #[serde(default)]
    pub members: HashMap<String, Vec<GroupMember>>,
}

/// Directory source backed by a JSON snapshot file
#[derive(Debug, Clone, Default)]
pub struct JsonDirectory {
    snapshot: DirectorySnapshot,
}

impl JsonDirectory {
    pub fn new(snapshot: DirectorySnapshot) -> Self {
        Self { snapshot }
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(Self::new(serde_json::from_str(json)?))
    }

    /// Read a snapshot file
    pub async fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = tokio::fs::read_to_string(path)
            .await
            .map_err(|source| IngestError::Read {
                path: path.to_path_buf(),
                source,
            })?;

        let directory = Self::from_json(&contents)?;
        debug!(
            "Loaded directory snapshot from {:?}: {} users, {} groups",
            path,
            directory.snapshot.users.len(),
            directory.snapshot.groups.len()
        );
        Ok(directory)
    }
}

#[async_trait]
impl DirectorySource for JsonDirectory {
    async fn list_users(&self) -> Result<Vec<DirectoryUser>> {
        Ok(self.snapshot.users.clone())
    }

    async fn list_groups(&self) -> Result<Vec<DirectoryGroup>> {
        Ok(self.snapshot.groups.clone())
    }

    async fn list_members(&self, group_email: &str) -> Result<Vec<GroupMember>> {
        Ok(self
            .snapshot
            .members
            .get(group_email)
            .cloned()
            .unwrap_or_default())
    }
}

/// Insert directory users, groups and `member --belongs_to--> group` edges
pub async fn ingest_memberships(
    graph: &mut GraphStore,
    source: &dyn DirectorySource,
) -> Result<IngestReport> {
    let mut report = IngestReport::default();

    for user in source.list_users().await? {
        if user.primary_email.is_empty() {
            warn!("Skipping directory user without a primary email");
            report.skipped += 1;
            continue;
        }
        graph.get_or_insert(
            Node::identity(format!("{}:{}", DEFAULT_MEMBER_TYPE, user.primary_email))
                .with_subtype(DEFAULT_MEMBER_TYPE),
        );
        report.identities += 1;
    }

    for group in source.list_groups().await? {
        if group.email.is_empty() {
            warn!("Skipping directory group without an email ({:?})", group.name);
            report.skipped += 1;
            continue;
        }
        let group_node = graph.get_or_insert(
            Node::identity(format!("{}:{}", GROUP_SUBTYPE, group.email)).with_subtype(GROUP_SUBTYPE),
        );
        report.groups += 1;

        let members = source.list_members(&group.email).await?;
        if members.is_empty() {
            debug!("Group {} has no members", group.email);
        }

        for member in members {
            if member.email.is_empty() {
                warn!("Skipping member of {} without an email", group.email);
                report.skipped += 1;
                continue;
            }
            let member_node = graph.get_or_insert(
                Node::identity(member.identity_id()).with_subtype(member.identity_type()),
            );
            graph.insert_edge(member_node, group_node, Relation::BelongsTo)?;
            report.memberships += 1;
        }
    }

    info!(
        "Loaded {} users, {} groups, {} memberships ({} skipped)",
        report.identities, report.groups, report.memberships, report.skipped
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use permgraph_graph::{NodeKind, QueryEngine};

    const SNAPSHOT: &str = r#"{
        "users": [
            { "primaryEmail": "ron@test.com", "name": { "fullName": "Ron Test" } },
            { "primaryEmail": "kim@test.com", "name": { "fullName": "Kim Test" } }
        ],
        "groups": [
            { "email": "eng@test.com", "name": "Engineering" },
            { "email": "empty@test.com", "name": "Nobody" }
        ],
        "members": {
            "eng@test.com": [
                { "email": "ron@test.com", "role": "MEMBER", "type": "USER" },
                { "email": "ops@test.com", "role": "MEMBER", "type": "GROUP" }
            ]
        }
    }"#;

    #[test]
    fn test_member_identity_id() {
        let member = GroupMember {
            email: "ops@test.com".to_string(),
            role: "MEMBER".to_string(),
            member_type: "GROUP".to_string(),
        };
        assert_eq!(member.identity_id(), "group:ops@test.com");

        let untyped = GroupMember {
            email: "a@test.com".to_string(),
            ..Default::default()
        };
        assert_eq!(untyped.identity_id(), "user:a@test.com");
    }

    #[tokio::test]
    async fn test_json_directory_listing() {
        let directory = JsonDirectory::from_json(SNAPSHOT).unwrap();

        let users = directory.list_users().await.unwrap();
        assert_eq!(users.len(), 2);
        assert_eq!(users[0].full_name(), "Ron Test");

        let groups = directory.list_groups().await.unwrap();
        assert_eq!(groups[0].name, "Engineering");

        assert_eq!(directory.list_members("eng@test.com").await.unwrap().len(), 2);
        assert!(directory.list_members("empty@test.com").await.unwrap().is_empty());
        assert!(directory.list_members("unknown@test.com").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_records_without_email_are_skipped() {
        let directory = JsonDirectory::from_json(
            r#"{
                "users": [{ "name": { "fullName": "No Mail" } }, { "primaryEmail": "ron@test.com" }],
                "groups": [{ "name": "Unnamed" }, { "email": "eng@test.com" }],
                "members": {
                    "eng@test.com": [{ "role": "MEMBER", "type": "USER" }, { "email": "ron@test.com" }]
                }
            }"#,
        )
        .unwrap();
        let mut graph = GraphStore::new();

        let report = ingest_memberships(&mut graph, &directory).await.unwrap();
        assert_eq!(report.skipped, 3);
        assert_eq!(report.identities, 1);
        assert_eq!(report.groups, 1);
        assert_eq!(report.memberships, 1);
        assert_eq!(graph.node_count(), 2);
        assert_eq!(graph.edge_count(), 1);
    }

    #[tokio::test]
    async fn test_ingest_memberships() {
        let directory = JsonDirectory::from_json(SNAPSHOT).unwrap();
        let mut graph = GraphStore::new();

        let report = ingest_memberships(&mut graph, &directory).await.unwrap();
        assert_eq!(report.identities, 2);
        assert_eq!(report.groups, 2);
        assert_eq!(report.memberships, 2);

        let nested = graph.get("group:ops@test.com", NodeKind::Identity).unwrap();
        assert_eq!(nested.subtype(), Some("group"));

        let engine = QueryEngine::new(&graph);
        let members: Vec<_> = engine
            .group_members(&Node::identity("group:eng@test.com"))
            .unwrap()
            .iter()
            .map(|node| node.id.clone())
            .collect();
        assert_eq!(members, vec!["user:ron@test.com", "group:ops@test.com"]);
    }
}
