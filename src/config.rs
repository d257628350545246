//! Run configuration.
//!
//! Loaded from `.protosync.json` when present; CLI flags override file
//! values. Every field has a sensible default so the tool works in a
//! bare project with no config at all.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::Result;

pub const CONFIG_FILE: &str = ".protosync.json";

/// Configuration for one `gen` invocation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Schema file, directory, or `*.proto` pattern to process.
    #[serde(default = "default_schema_path")]
    pub schema_path: PathBuf,

    /// Where generated metadata artifacts land. Defaults to the schema
    /// document's own directory.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_dir: Option<PathBuf>,

    /// Base directory that `@emit_to:` targets are resolved against.
    #[serde(default = "default_project_root")]
    pub project_root: PathBuf,

    /// Run rustfmt over generated/modified Rust files.
    #[serde(default)]
    pub format_output: bool,

    /// External wire-binding compiler invoked on the injected
    /// intermediate document. Best effort; failures are logged.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub compiler_cmd: Option<String>,

    /// Directory receiving the rate rule module instead of the schema
    /// directory.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rate_output: Option<PathBuf>,

    /// Glob patterns excluded from schema discovery.
    #[serde(default)]
    pub exclude: Vec<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            schema_path: default_schema_path(),
            output_dir: None,
            project_root: default_project_root(),
            format_output: false,
            compiler_cmd: None,
            rate_output: None,
            exclude: Vec::new(),
        }
    }
}

fn default_schema_path() -> PathBuf {
    PathBuf::from("proto")
}

fn default_project_root() -> PathBuf {
    PathBuf::from(".")
}

impl Config {
    /// Load config from a file.
    pub fn load<P: AsRef<std::path::Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Save config to a file.
    pub fn save<P: AsRef<std::path::Path>>(&self, path: P) -> Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Load from the default location or fall back to defaults.
    pub fn load_or_default() -> Self {
        Self::load(CONFIG_FILE).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_through_json() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join(CONFIG_FILE);
        let mut config = Config::default();
        config.format_output = true;
        config.exclude.push("**/legacy/**".to_string());
        config.save(&path).unwrap();

        let loaded = Config::load(&path).unwrap();
        assert!(loaded.format_output);
        assert_eq!(loaded.exclude, config.exclude);
        assert_eq!(loaded.schema_path, PathBuf::from("proto"));
    }

    #[test]
    fn missing_fields_fall_back_to_defaults() {
        let loaded: Config = serde_json::from_str("{}").unwrap();
        assert_eq!(loaded.project_root, PathBuf::from("."));
        assert!(!loaded.format_output);
    }
}
