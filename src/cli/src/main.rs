//! Permgraph - IAM access graph explorer
//!
//! Loads a cloud asset export (and optionally a directory snapshot) into an
//! access graph and answers:
//! - which resources an identity can reach, and under which role
//! - which identities hold grants on a resource or its ancestors
//! - resource ancestry and group membership

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use permgraph_graph::{GraphStore, Node, QueryEngine};
use permgraph_ingest::{ingest_memberships, load_asset_file, IngestReport, JsonDirectory};
use serde::Serialize;
use std::io::{self, Write};
use std::path::PathBuf;
use tracing::{debug, info};

mod config;
mod report;

use config::Config;
use report::DirectoryListing;

/// Permgraph CLI
#[derive(Parser)]
#[command(name = "permgraph")]
#[command(about = "Explore who can access what in a cloud IAM export")]
#[command(version)]
struct Cli {
    /// Path to configuration file
    #[arg(short, long, env = "PERMGRAPH_CONFIG")]
    config: Option<PathBuf>,

    /// Asset export to load (overrides config)
    #[arg(long, env = "PERMGRAPH_ASSETS")]
    assets: Option<PathBuf>,

    /// Directory snapshot to load (overrides config)
    #[arg(long, env = "PERMGRAPH_DIRECTORY")]
    directory: Option<PathBuf>,

    /// Maximum walk depth (overrides config)
    #[arg(long)]
    max_depth: Option<usize>,

    /// Output format
    #[arg(long, value_enum, default_value_t = Format::Text)]
    format: Format,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Format {
    Text,
    Json,
}

#[derive(Subcommand)]
enum Command {
    #[command(flatten)]
    Query(QueryCommand),

    /// List directory users, groups and memberships
    Directory,
}

/// Subcommands answered from the loaded graph
#[derive(Subcommand)]
enum QueryCommand {
    /// Print every node and edge plus totals
    Summary,

    /// Parent chain of a resource
    Ancestors {
        /// Resource id, e.g. projects/p1111
        resource: String,
    },

    /// Resources an identity can reach, with the effective role
    Identity {
        /// Identity id, e.g. user:ron@example.com
        identity: String,
    },

    /// Identities holding grants on a resource or its ancestors
    Resource {
        /// Resource id, e.g. buckets/build-artifacts
        resource: String,
    },

    /// Groups an identity belongs to
    Groups {
        identity: String,
    },

    /// Members of a group
    Members {
        /// Group id, e.g. group:eng@example.com
        group: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => Config::load(path)?,
        None => Config::default(),
    };

    // Apply CLI overrides
    if let Some(assets) = cli.assets {
        config.data.assets = assets;
    }
    if let Some(directory) = cli.directory {
        config.data.directory = Some(directory);
    }
    if let Some(max_depth) = cli.max_depth {
        config.traversal.max_depth = max_depth;
    }
    config.validate()?;

    // Initialize logging
    let log_level = if cli.verbose { "debug" } else { config.logging.level.as_str() };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| log_level.into()),
        )
        .with_target(true)
        .with_writer(io::stderr)
        .init();

    if let Some(path) = &cli.config {
        info!("Loaded configuration from {:?}", path);
    }

    let stdout = io::stdout();
    let mut out = stdout.lock();

    match cli.command {
        Command::Directory => list_directory(&config, &mut out).await,
        Command::Query(query) => {
            let (graph, loaded) = build_graph(&config).await?;
            let engine = QueryEngine::with_limits(&graph, config.traversal);
            run_query(&mut out, &engine, &loaded, query, cli.format)
        }
    }
}

fn run_query<W: Write>(
    out: &mut W,
    engine: &QueryEngine<'_>,
    loaded: &IngestReport,
    query: QueryCommand,
    format: Format,
) -> Result<()> {
    match query {
        QueryCommand::Summary => match format {
            Format::Text => report::write_summary(out, engine.graph(), loaded)?,
            Format::Json => emit_json(out, &engine.graph().stats())?,
        },
        QueryCommand::Ancestors { resource } => {
            let rows = engine.resource_ancestors(&Node::resource(resource.as_str()))?;
            match format {
                Format::Text => report::write_ancestors(out, &resource, &rows)?,
                Format::Json => emit_json(out, &rows)?,
            }
        }
        QueryCommand::Identity { identity } => {
            let rows = engine.identity_permissions(&Node::identity(identity.as_str()))?;
            match format {
                Format::Text => report::write_identity_permissions(out, &identity, &rows)?,
                Format::Json => emit_json(out, &rows)?,
            }
        }
        QueryCommand::Resource { resource } => {
            let rows = engine.resource_identities(&Node::resource(resource.as_str()))?;
            match format {
                Format::Text => report::write_resource_identities(out, &resource, &rows)?,
                Format::Json => emit_json(out, &rows)?,
            }
        }
        QueryCommand::Groups { identity } => {
            let rows = engine.identity_groups(&Node::identity(identity.as_str()))?;
            match format {
                Format::Text => report::write_nodes(
                    out,
                    &format!("Groups of {}", identity),
                    &format!("{} belongs to no groups", identity),
                    &rows,
                )?,
                Format::Json => emit_json(out, &rows)?,
            }
        }
        QueryCommand::Members { group } => {
            let rows = engine.group_members(&Node::identity(group.as_str()))?;
            match format {
                Format::Text => report::write_nodes(
                    out,
                    &format!("Members of {}", group),
                    &format!("No members in the group {}", group),
                    &rows,
                )?,
                Format::Json => emit_json(out, &rows)?,
            }
        }
    }

    Ok(())
}

async fn list_directory<W: Write>(config: &Config, out: &mut W) -> Result<()> {
    let path = config
        .data
        .directory
        .as_ref()
        .context("No directory snapshot configured (use --directory or [data] directory)")?;

    let directory = JsonDirectory::load(path)
        .await
        .with_context(|| format!("Failed to load directory snapshot {:?}", path))?;
    let listing = DirectoryListing::collect(&directory).await?;
    listing.write(out)?;
    Ok(())
}

/// Load the asset export, then the directory snapshot when one is configured
async fn build_graph(config: &Config) -> Result<(GraphStore, IngestReport)> {
    let mut graph = GraphStore::new();

    let mut loaded = load_asset_file(&mut graph, &config.data.assets)
        .await
        .with_context(|| format!("Failed to load assets from {:?}", config.data.assets))?;

    if let Some(path) = &config.data.directory {
        let directory = JsonDirectory::load(path)
            .await
            .with_context(|| format!("Failed to load directory snapshot {:?}", path))?;
        loaded += ingest_memberships(&mut graph, &directory).await?;
    }

    debug!("{}", graph.stats());
    Ok((graph, loaded))
}

fn emit_json<W: Write, T: Serialize + ?Sized>(out: &mut W, value: &T) -> Result<()> {
    serde_json::to_writer_pretty(&mut *out, value)?;
    writeln!(out)?;
    Ok(())
}
