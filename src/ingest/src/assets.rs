//! Cloud asset export loader
//!
//! Reads an asset inventory export (a JSON array of asset records, each with
//! its IAM policy) and turns it into graph insertions:
//!
//! - one resource node per asset, subtype taken from `asset_type`
//! - `parent --is_parent_resource_of--> asset` when the asset has a parent
//! - `member --<role>--> asset` for every member of every binding
//!
//! Records are taken as they come; missing fields default to empty.

use crate::error::{IngestError, Result};
use crate::IngestReport;
use permgraph_graph::{GraphStore, Node, Relation};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{debug, info, warn};

/// Service host marker that prefixes resource names in the export
const SERVICE_HOST_SUFFIX: &str = ".googleapis.com/";

/// One asset of the export
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AssetRecord {
    /// Full resource name, e.g. `//cloudresourcemanager.googleapis.com/projects/p1111`
    #[serde(default)]
    pub name: String,

    /// Asset type, e.g. `cloudresourcemanager.googleapis.com/Project`
    #[serde(default)]
    pub asset_type: String,

    /// The asset itself first, then its parent, up to the organization
    #[serde(default)]
    pub ancestors: Vec<String>,

    #[serde(default)]
    pub iam_policy: IamPolicy,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IamPolicy {
    #[serde(default)]
    pub bindings: Vec<Binding>,
}

/// A role granted to a list of members
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Binding {
    #[serde(default)]
    pub role: String,

    /// Member strings such as `user:ron@example.com`
    #[serde(default)]
    pub members: Vec<String>,
}

impl AssetRecord {
    /// Resource path with the service host stripped (`projects/p1111`)
    pub fn resource_id(&self) -> &str {
        self.name
            .rsplit(SERVICE_HOST_SUFFIX)
            .next()
            .unwrap_or_default()
    }

    /// Last segment of the asset type (`Project`)
    pub fn resource_type(&self) -> &str {
        self.asset_type.rsplit('/').next().unwrap_or_default()
    }

    /// Immediate parent, if any
    pub fn parent_id(&self) -> Option<&str> {
        self.ancestors.get(1).map(String::as_str)
    }
}

/// Parse an export document
pub fn parse_assets(json: &str) -> Result<Vec<AssetRecord>> {
    Ok(serde_json::from_str(json)?)
}

/// Read and parse an export file
pub async fn read_asset_file(path: impl AsRef<Path>) -> Result<Vec<AssetRecord>> {
    let path = path.as_ref();
    let contents = tokio::fs::read_to_string(path)
        .await
        .map_err(|source| IngestError::Read {
            path: path.to_path_buf(),
            source,
        })?;

    let records = parse_assets(&contents)?;
    debug!("Parsed {} asset records from {:?}", records.len(), path);
    Ok(records)
}

/// Insert every record into the graph
pub fn load_assets(graph: &mut GraphStore, records: &[AssetRecord]) -> Result<IngestReport> {
    let mut report = IngestReport::default();

    for record in records {
        let resource_id = record.resource_id();
        if resource_id.is_empty() {
            warn!("Skipping asset record without a name");
            report.skipped += 1;
            continue;
        }

        let resource =
            graph.get_or_insert(Node::resource(resource_id).with_subtype(record.resource_type()));
        report.resources += 1;

        match record.parent_id() {
            Some(parent_id) => {
                let parent = graph.get_or_insert(Node::resource(parent_id));
                graph.insert_edge(parent, resource, Relation::ParentOf)?;
                report.parent_links += 1;
            }
            None => debug!("{} is a root resource", resource_id),
        }

        for binding in &record.iam_policy.bindings {
            for member in &binding.members {
                let identity = graph.get_or_insert(Node::identity_from_member(member.as_str()));
                graph.insert_edge(identity, resource, binding.role.as_str())?;
                report.grants += 1;
            }
        }
    }

    info!(
        "Loaded {} resources ({} parent links, {} grants, {} skipped)",
        report.resources, report.parent_links, report.grants, report.skipped
    );
    Ok(report)
}

/// Read an export file and insert it into the graph
pub async fn load_asset_file(graph: &mut GraphStore, path: impl AsRef<Path>) -> Result<IngestReport> {
    let records = read_asset_file(path).await?;
    load_assets(graph, &records)
}
