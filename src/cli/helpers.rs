//! Shared helper functions for CLI commands

use clap::ValueEnum;
use miette::{IntoDiagnostic, Result};

use crate::cli::{GlobalOpts, OutputFormat};
use crate::core::identity::{EntityId, EntityPrefix};
use crate::core::{Config, Store, Workspace};

/// Everything a command needs to talk to the database
pub struct Session {
    pub workspace: Workspace,
    pub config: Config,
    pub store: Store,
}

impl Session {
    /// Output format after applying the configured default
    pub fn format(&self, global: &GlobalOpts) -> OutputFormat {
        effective_format(global.format, &self.config)
    }
}

/// Locate the workspace from `--workspace` or the current directory
pub fn find_workspace(global: &GlobalOpts) -> Result<Workspace> {
    let found = match &global.workspace {
        Some(path) => Workspace::discover_from(path),
        None => Workspace::discover(),
    };
    found.map_err(|e| miette::miette!("{}", e))
}

/// Discover the workspace, load its config, and open the database
pub fn open_session(global: &GlobalOpts) -> Result<Session> {
    let workspace = find_workspace(global)?;
    let config = Config::load_for(Some(&workspace));
    let path = workspace.database_path(config.database.as_deref());
    let store = Store::open(&path).into_diagnostic()?;

    Ok(Session {
        workspace,
        config,
        store,
    })
}

/// `--format auto` defers to the configured default format
pub fn effective_format(requested: OutputFormat, config: &Config) -> OutputFormat {
    if requested != OutputFormat::Auto {
        return requested;
    }
    config
        .default_format
        .as_deref()
        .and_then(|s| OutputFormat::from_str(s, true).ok())
        .unwrap_or(OutputFormat::Auto)
}

/// Parse a command-line ID that must belong to the given table
pub fn parse_id(input: &str, prefix: EntityPrefix) -> Result<EntityId> {
    EntityId::parse_as(input.trim(), prefix).map_err(|e| miette::miette!("{}", e))
}

/// Truncate a string to max_len characters, adding "..." if truncated
pub fn truncate_str(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}

/// Ask before a destructive action; `--yes` skips the prompt.
///
/// Without a terminal to ask on, the action is refused.
pub fn confirm(prompt: &str, assume_yes: bool) -> Result<bool> {
    if assume_yes {
        return Ok(true);
    }
    if !console::user_attended() {
        return Err(miette::miette!(
            "refusing to continue without confirmation; pass --yes"
        ));
    }
    dialoguer::Confirm::new()
        .with_prompt(prompt)
        .default(false)
        .interact()
        .into_diagnostic()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_str() {
        assert_eq!(truncate_str("hello", 10), "hello");
        assert_eq!(truncate_str("hello world", 8), "hello...");
        assert_eq!(truncate_str("hi", 2), "hi");
        assert_eq!(truncate_str("ééééé", 4), "é...");
    }

    #[test]
    fn test_effective_format_uses_config_default() {
        let config = Config {
            default_format: Some("json".into()),
            ..Default::default()
        };
        assert_eq!(effective_format(OutputFormat::Auto, &config), OutputFormat::Json);
        assert_eq!(effective_format(OutputFormat::Csv, &config), OutputFormat::Csv);

        let bogus = Config {
            default_format: Some("xml".into()),
            ..Default::default()
        };
        assert_eq!(effective_format(OutputFormat::Auto, &bogus), OutputFormat::Auto);
    }

    #[test]
    fn test_parse_id_checks_kind() {
        let id = EntityId::new(EntityPrefix::Run);
        assert_eq!(parse_id(&format!(" {} ", id), EntityPrefix::Run).unwrap(), id);
        assert!(parse_id(&id.to_string(), EntityPrefix::Prj).is_err());
    }
}
