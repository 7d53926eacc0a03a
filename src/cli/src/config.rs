//! CLI configuration loading and validation

use anyhow::{Context, Result};
use permgraph_graph::TraversalLimits;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Complete CLI configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub data: DataSection,

    #[serde(default)]
    pub traversal: TraversalLimits,

    #[serde(default)]
    pub logging: LoggingSection,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DataSection {
    /// Asset inventory export (JSON array)
    #[serde(default = "default_assets_path")]
    pub assets: PathBuf,

    /// Directory snapshot; membership is skipped when unset
    #[serde(default)]
    pub directory: Option<PathBuf>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingSection {
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for DataSection {
    fn default() -> Self {
        Self {
            assets: default_assets_path(),
            directory: None,
        }
    }
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_assets_path() -> PathBuf { PathBuf::from("assets/data/gcp_permissions.json") }
fn default_log_level() -> String { "info".to_string() }

const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

impl Config {
    /// Load configuration from TOML file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read configuration file {:?}", path))?;

        let mut config: Config = toml::from_str(&contents)
            .context("Failed to parse configuration file")?;

        // data paths in the file are relative to the file itself
        if let Some(base) = path.parent() {
            config.data.assets = resolve(base, &config.data.assets);
            config.data.directory = config.data.directory.map(|dir| resolve(base, &dir));
        }

        Ok(config)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.traversal.max_depth == 0 {
            anyhow::bail!("traversal.max_depth must be at least 1");
        }

        if !LOG_LEVELS.contains(&self.logging.level.as_str()) {
            anyhow::bail!(
                "logging.level must be one of {}, got '{}'",
                LOG_LEVELS.join(", "),
                self.logging.level
            );
        }

        if self.data.assets.as_os_str().is_empty() {
            anyhow::bail!("data.assets must not be empty");
        }

        Ok(())
    }
}

fn resolve(base: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base.join(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.traversal.max_depth, permgraph_graph::query::DEFAULT_MAX_DEPTH);
        assert_eq!(config.logging.level, "info");
        assert!(config.data.directory.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_load_resolves_relative_paths() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("permgraph.toml");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(
            file,
            r#"
[data]
assets = "data/assets.json"
directory = "/srv/directory.json"

[traversal]
max_depth = 64
"#
        )
        .unwrap();

        let config = Config::load(&path).unwrap();
        assert_eq!(config.data.assets, dir.path().join("data/assets.json"));
        assert_eq!(config.data.directory, Some(PathBuf::from("/srv/directory.json")));
        assert_eq!(config.traversal.max_depth, 64);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let config: Config = toml::from_str("[logging]\nlevel = \"debug\"\n").unwrap();
        assert_eq!(config.data.assets, default_assets_path());
        assert_eq!(config.logging.level, "debug");
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = Config::default();
        config.traversal.max_depth = 0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.logging.level = "loud".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_missing_file_is_an_error() {
        assert!(Config::load("/nonexistent/permgraph.toml").is_err());
    }
}
