//! Path resolution for config and vault files.

use std::path::{Path, PathBuf};

use crate::cli::Cli;
use crate::config::{default_config_path, default_vault_path, read_config, NotevaultConfig};

/// Resolve the config file path, checking NOTEVAULT_CONFIG first.
pub fn resolve_config_path() -> anyhow::Result<PathBuf> {
    if let Ok(value) = std::env::var("NOTEVAULT_CONFIG") {
        if !value.trim().is_empty() {
            return Ok(PathBuf::from(value));
        }
    }
    default_config_path()
}

/// Load the config file if there is one.
pub fn load_config() -> anyhow::Result<Option<NotevaultConfig>> {
    let path = resolve_config_path()?;
    if !path.exists() {
        return Ok(None);
    }
    read_config(&path).map(Some)
}

/// Resolve the vault path: flag or env, then config, then the XDG default.
pub fn resolve_vault_path(cli: &Cli, config: Option<&NotevaultConfig>) -> anyhow::Result<PathBuf> {
    if let Some(path) = cli.vault.as_deref() {
        return Ok(PathBuf::from(path));
    }
    if let Some(config) = config {
        return Ok(PathBuf::from(&config.vault.path));
    }
    default_vault_path()
}

/// Error message when the vault file is missing.
pub fn missing_vault_message(path: &Path) -> String {
    format!(
        "No vault found at {}\n\nRun:\n  notevault init\n\nOr specify a vault path:\n  NOTEVAULT_PATH=/path/to/notes.vault notevault init",
        path.display()
    )
}
