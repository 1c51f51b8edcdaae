//! Configuration handling for the aspectconf CLI

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Name of the per-directory configuration file
pub const CONFIG_FILE: &str = "aspectconf.toml";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub output: OutputConfig,

    /// Contract used when a command does not name one
    #[serde(default)]
    pub default_contract: Option<String>,

    /// Manifest used when a command does not name one
    #[serde(default)]
    pub manifest: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    #[serde(default)]
    pub format: OutputFormat,

    #[serde(default = "default_true")]
    pub pretty: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Json,
    Toml,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            format: OutputFormat::default(),
            pretty: default_true(),
        }
    }
}

fn default_true() -> bool {
    true
}

/// Load configuration from `path`, or from `aspectconf.toml` in `dir` if present
pub fn load_config(path: Option<PathBuf>, dir: &Path) -> Result<Config> {
    let path = match path {
        Some(path) => path,
        None => {
            let local = dir.join(CONFIG_FILE);
            if !local.exists() {
                return Ok(Config::default());
            }
            local
        }
    };
    let content = std::fs::read_to_string(&path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let config: Config = toml::from_str(&content)
        .with_context(|| format!("Failed to parse {}", path.display()))?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_without_file() {
        let dir = tempfile::tempdir().unwrap();
        let config = load_config(None, dir.path()).unwrap();
        assert_eq!(config.output.format, OutputFormat::Json);
        assert!(config.output.pretty);
        assert!(config.default_contract.is_none());
    }

    #[test]
    fn test_local_file_is_picked_up() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join(CONFIG_FILE),
            "default_contract = \"IPerson\"\nmanifest = \"person.toml\"\n\n[output]\nformat = \"toml\"\n",
        )
        .unwrap();

        let config = load_config(None, dir.path()).unwrap();
        assert_eq!(config.output.format, OutputFormat::Toml);
        assert_eq!(config.default_contract.as_deref(), Some("IPerson"));
        assert_eq!(config.manifest, Some(PathBuf::from("person.toml")));
    }

    #[test]
    fn test_explicit_path_must_exist() {
        let dir = tempfile::tempdir().unwrap();
        assert!(load_config(Some(dir.path().join("missing.toml")), dir.path()).is_err());
    }
}
