//! Error types for graph ingestion

use permgraph_graph::GraphError;
use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, IngestError>;

#[derive(Debug, Error)]
pub enum IngestError {
    /// Input file could not be read
    #[error("Failed to read {path:?}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Input is not valid JSON for the expected shape
    #[error("Failed to parse input: {0}")]
    Parse(#[from] serde_json::Error),

    /// Graph rejected an insertion
    #[error("Graph error: {0}")]
    Graph(#[from] GraphError),
}
