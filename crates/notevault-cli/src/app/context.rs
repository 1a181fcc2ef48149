//! Application context for the NoteVault CLI.
//!
//! Combines CLI arguments with the lazily-loaded config file.

use std::path::PathBuf;

use once_cell::unsync::OnceCell;

use notevault_core::{Vault, VaultConfig};

use crate::cli::Cli;
use crate::config::NotevaultConfig;
use crate::errors::CliError;
use crate::helpers::check_timeout_minutes;

use super::password::login_with_retry;
use super::resolver::{load_config, missing_vault_message, resolve_vault_path};

/// Application context that bundles CLI args with configuration.
pub struct AppContext<'a> {
    cli: &'a Cli,
    config: OnceCell<Option<NotevaultConfig>>,
}

impl<'a> AppContext<'a> {
    pub fn new(cli: &'a Cli) -> Self {
        Self {
            cli,
            config: OnceCell::new(),
        }
    }

    pub fn quiet(&self) -> bool {
        self.cli.quiet
    }

    /// The config file, loaded on first use. `None` if there is no file.
    pub fn config(&self) -> anyhow::Result<Option<&NotevaultConfig>> {
        Ok(self.config.get_or_try_init(load_config)?.as_ref())
    }

    pub fn vault_path(&self) -> anyhow::Result<PathBuf> {
        resolve_vault_path(self.cli, self.config()?)
    }

    /// Session settings from the config file, or defaults.
    pub fn vault_config(&self) -> anyhow::Result<VaultConfig> {
        let Some(config) = self.config()? else {
            return Ok(VaultConfig::default());
        };
        let minutes = check_timeout_minutes(config.session.timeout_minutes, "session.timeout_minutes")?;
        Ok(VaultConfig::with_timeout_minutes(minutes))
    }

    /// Open the configured vault without logging in.
    pub fn open_vault(&self) -> anyhow::Result<Vault> {
        let path = self.vault_path()?;
        if !path.exists() {
            return Err(CliError::not_found(
                missing_vault_message(&path),
                "Hint: pass --vault or set NOTEVAULT_PATH to use another file.",
            )
            .into());
        }
        Ok(Vault::open_existing(&path, self.vault_config()?)?)
    }

    /// Open the vault and log in.
    pub fn unlock(&self) -> anyhow::Result<Vault> {
        let vault = self.open_vault()?;
        login_with_retry(&vault)?;
        Ok(vault)
    }

    /// Log in, run `f`, then log out whatever `f` returned.
    pub fn with_unlocked<T>(&self, f: impl FnOnce(&Vault) -> anyhow::Result<T>) -> anyhow::Result<T> {
        let vault = self.unlock()?;
        let result = f(&vault);
        vault.logout();
        result
    }
}
