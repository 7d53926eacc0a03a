//! # Permgraph Ingest
//!
//! Populates a [`permgraph_graph::GraphStore`] from outside data:
//!
//! - [`assets`]: cloud asset inventory exports (resource hierarchy + IAM bindings)
//! - [`directory`]: directory users, groups and group membership

pub mod assets;
pub mod directory;
pub mod error;

pub use assets::{load_asset_file, load_assets, parse_assets, read_asset_file, AssetRecord, Binding, IamPolicy};
pub use directory::{
    ingest_memberships, DirectoryGroup, DirectorySnapshot, DirectorySource, DirectoryUser,
    GroupMember, JsonDirectory,
};
pub use error::{IngestError, Result};

use serde::Serialize;
use std::ops::AddAssign;

/// Counts of what a loader inserted
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct IngestReport {
    pub resources: usize,
    pub parent_links: usize,
    pub grants: usize,
    pub identities: usize,
    pub groups: usize,
    pub memberships: usize,
    /// Records dropped for lacking an id
    pub skipped: usize,
}

impl AddAssign for IngestReport {
    fn add_assign(&mut self, other: Self) {
        self.resources += other.resources;
        self.parent_links += other.parent_links;
        self.grants += other.grants;
        self.identities += other.identities;
        self.groups += other.groups;
        self.memberships += other.memberships;
        self.skipped += other.skipped;
    }
}
