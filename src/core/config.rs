//! Configuration management with layered hierarchy

use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::warn;

use crate::core::workspace::Workspace;

/// itree configuration with layered hierarchy
#[derive(Debug, Default, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Database file override (relative to `.itree/`)
    pub database: Option<String>,

    /// Default output format
    pub default_format: Option<String>,

    /// tracing filter directive used when RUST_LOG is unset
    pub log_filter: Option<String>,
}

impl Config {
    /// Load configuration from all sources, merging in priority order.
    ///
    /// Without a workspace only the global file and the environment apply.
    pub fn load_for(workspace: Option<&Workspace>) -> Self {
        let mut config = Config::default();

        // Global user config (~/.config/itree/config.yaml)
        if let Some(global_path) = Self::global_config_path() {
            if let Some(global) = Self::read_file(&global_path) {
                config.merge(global);
            }
        }

        // Workspace config (.itree/config.yaml)
        if let Some(ws) = workspace {
            if let Some(local) = Self::read_file(&ws.itree_dir().join("config.yaml")) {
                config.merge(local);
            }
        }

        if let Ok(database) = std::env::var("ITREE_DATABASE") {
            config.database = Some(database);
        }
        if let Ok(format) = std::env::var("ITREE_FORMAT") {
            config.default_format = Some(format);
        }

        config
    }

    /// Parse a config file; unreadable or malformed files are skipped
    fn read_file(path: &Path) -> Option<Config> {
        if !path.exists() {
            return None;
        }
        let contents = std::fs::read_to_string(path).ok()?;
        match Self::from_yaml(&contents) {
            Ok(config) => Some(config),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "ignoring malformed config file");
                None
            }
        }
    }

    pub fn from_yaml(contents: &str) -> Result<Config, serde_yml::Error> {
        // A file holding only comments parses as null
        if contents.lines().all(|l| l.trim().is_empty() || l.trim_start().starts_with('#')) {
            return Ok(Config::default());
        }
        serde_yml::from_str(contents)
    }

    fn global_config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("", "", "itree")
            .map(|dirs| dirs.config_dir().join("config.yaml"))
    }

    /// Merge another config into this one (other takes precedence)
    fn merge(&mut self, other: Config) {
        if other.database.is_some() {
            self.database = other.database;
        }
        if other.default_format.is_some() {
            self.default_format = other.default_format;
        }
        if other.log_filter.is_some() {
            self.log_filter = other.log_filter;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full_config() {
        let config = Config::from_yaml(
            "database: stock.db\ndefault_format: json\nlog_filter: itree=trace\n",
        )
        .unwrap();
        assert_eq!(config.database.as_deref(), Some("stock.db"));
        assert_eq!(config.default_format.as_deref(), Some("json"));
        assert_eq!(config.log_filter.as_deref(), Some("itree=trace"));
    }

    #[test]
    fn test_comment_only_config_is_default() {
        let config = Config::from_yaml("# nothing here\n\n# database: x.db\n").unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_merge_prefers_later_layer() {
        let mut base = Config::from_yaml("database: a.db\ndefault_format: csv\n").unwrap();
        base.merge(Config::from_yaml("database: b.db\n").unwrap());
        assert_eq!(base.database.as_deref(), Some("b.db"));
        assert_eq!(base.default_format.as_deref(), Some("csv"));
    }

    #[test]
    fn test_malformed_workspace_config_is_skipped() {
        let tmp = tempfile::tempdir().unwrap();
        let ws = Workspace::init(tmp.path()).unwrap();
        std::fs::write(ws.itree_dir().join("config.yaml"), "database: [unclosed").unwrap();

        assert!(Config::read_file(&ws.itree_dir().join("config.yaml")).is_none());
    }

    #[test]
    fn test_workspace_layer_applies() {
        let tmp = tempfile::tempdir().unwrap();
        let ws = Workspace::init(tmp.path()).unwrap();
        std::fs::write(ws.itree_dir().join("config.yaml"), "log_filter: itree=info
").unwrap();

        let config = Config::load_for(Some(&ws));
        assert_eq!(config.log_filter.as_deref(), Some("itree=info"));
    }
}
