use std::path::PathBuf;

use notevault_core::session::DEFAULT_SESSION_TIMEOUT_MINUTES;
use notevault_core::{Vault, VaultConfig};

use crate::app::{new_password, resolve_config_path, AppContext};
use crate::cli::InitArgs;
use crate::config::{write_config, NotevaultConfig};
use crate::errors::CliError;
use crate::helpers::check_timeout_minutes;

pub fn handle_init(ctx: &AppContext, args: &InitArgs) -> anyhow::Result<()> {
    let path = match args.path.as_deref() {
        Some(path) => PathBuf::from(path),
        None => ctx.vault_path()?,
    };
    let timeout = check_timeout_minutes(
        args.timeout.unwrap_or(DEFAULT_SESSION_TIMEOUT_MINUTES),
        "--timeout",
    )?;

    if path.exists() {
        let existing = Vault::open_existing(&path, VaultConfig::default())?;
        if !existing.is_setup_required()? {
            return Err(CliError::invalid_input(format!(
                "A vault already exists at {}",
                path.display()
            ))
            .into());
        }
    }

    let password = new_password()?;
    let vault = Vault::open(&path, VaultConfig::with_timeout_minutes(timeout))?;
    vault.setup(&password)?;
    vault.logout();
    tracing::info!(path = %path.display(), "vault initialised");

    let config_path = resolve_config_path()?;
    let wrote_config = if config_path.exists() {
        false
    } else {
        write_config(&config_path, &NotevaultConfig::new(&path, timeout))?;
        true
    };

    if !ctx.quiet() {
        println!("Vault created at {}", path.display());
        if wrote_config {
            println!("Config written to {}", config_path.display());
        } else {
            println!(
                "Existing config at {} left unchanged",
                config_path.display()
            );
        }
    }
    Ok(())
}
