//! Text rendering of graph and query results

use permgraph_graph::{GraphStore, IdentityGrant, Node, ResourceGrant};
use permgraph_ingest::{DirectoryGroup, DirectorySource, DirectoryUser, GroupMember, IngestReport};
use std::io::{self, Write};

/// Graph dump followed by load counters and node/edge totals
pub fn write_summary<W: Write>(out: &mut W, graph: &GraphStore, report: &IngestReport) -> io::Result<()> {
    writeln!(out, "{}", graph)?;
    writeln!(out)?;
    writeln!(
        out,
        "Loaded: {} resources, {} parent links, {} grants, {} groups, {} memberships, {} skipped",
        report.resources,
        report.parent_links,
        report.grants,
        report.groups,
        report.memberships,
        report.skipped
    )?;
    writeln!(out, "{}", graph.stats())
}

pub fn write_ancestors<W: Write>(out: &mut W, resource_id: &str, ancestors: &[&Node]) -> io::Result<()> {
    if ancestors.is_empty() {
        return writeln!(out, "No ancestors for {}", resource_id);
    }

    writeln!(out, "Ancestors of {}", resource_id)?;
    for node in ancestors {
        writeln!(out, "  {}", node)?;
    }
    Ok(())
}

pub fn write_identity_permissions<W: Write>(
    out: &mut W,
    identity_id: &str,
    rows: &[ResourceGrant<'_>],
) -> io::Result<()> {
    if rows.is_empty() {
        return writeln!(out, "Nothing reachable from {}", identity_id);
    }

    writeln!(out, "Reachable from {}", identity_id)?;
    for row in rows {
        writeln!(
            out,
            "  {} [{}] {}",
            row.node.id,
            row.subtype.unwrap_or("-"),
            row.role.unwrap_or("-")
        )?;
    }
    Ok(())
}

pub fn write_resource_identities<W: Write>(
    out: &mut W,
    resource_id: &str,
    rows: &[IdentityGrant<'_>],
) -> io::Result<()> {
    if rows.is_empty() {
        return writeln!(out, "No identities reach {}", resource_id);
    }

    writeln!(out, "Identities reaching {}", resource_id)?;
    for row in rows {
        writeln!(out, "  {} {}", row.node.id, row.relation)?;
    }
    Ok(())
}

/// Plain list of nodes under a heading, or `empty` when there are none
pub fn write_nodes<W: Write>(out: &mut W, heading: &str, empty: &str, nodes: &[&Node]) -> io::Result<()> {
    if nodes.is_empty() {
        return writeln!(out, "{}", empty);
    }

    writeln!(out, "{}", heading)?;
    for node in nodes {
        writeln!(out, "  {}", node)?;
    }
    Ok(())
}

/// Users, groups and each group's members, as listed by a directory source
#[derive(Debug, Clone, Default)]
pub struct DirectoryListing {
    pub users: Vec<DirectoryUser>,
    pub groups: Vec<(DirectoryGroup, Vec<GroupMember>)>,
}

impl DirectoryListing {
    pub async fn collect(source: &dyn DirectorySource) -> permgraph_ingest::Result<Self> {
        let users = source.list_users().await?;

        let mut groups = Vec::new();
        for group in source.list_groups().await? {
            let members = source.list_members(&group.email).await?;
            groups.push((group, members));
        }

        Ok(Self { users, groups })
    }

    pub fn write<W: Write>(&self, out: &mut W) -> io::Result<()> {
        if self.users.is_empty() {
            writeln!(out, "No users in the domain.")?;
        } else {
            writeln!(out, "Users")?;
            for user in &self.users {
                writeln!(out, "{} ({})", user.primary_email, user.full_name())?;
            }
        }

        if self.groups.is_empty() {
            writeln!(out, "No groups in the domain.")?;
            return Ok(());
        }

        writeln!(out, "\nGroups")?;
        for (group, _) in &self.groups {
            writeln!(out, "{} ({})", group.email, group.name)?;
        }

        writeln!(out, "\nMembers of each group:")?;
        for (group, members) in &self.groups {
            if members.is_empty() {
                writeln!(out, "\nNo members in the group {}", group.email)?;
                continue;
            }
            writeln!(out, "\nMembers of group {}", group.email)?;
            for member in members {
                writeln!(out, "{} {} {}", member.email, member.role, member.member_type)?;
            }
        }
        Ok(())
    }
}
