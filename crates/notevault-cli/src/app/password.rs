//! Master password input with retry logic.

use std::io::{self, IsTerminal};

use dialoguer::Password;
use zeroize::Zeroizing;

use notevault_core::crypto::validate_password;
use notevault_core::{AuthError, Vault, VaultError};

use crate::constants::MAX_PASSWORD_ATTEMPTS;
use crate::errors::CliError;

const PASSWORD_ENV: &str = "NOTEVAULT_PASSWORD";

fn env_password() -> Option<Zeroizing<String>> {
    std::env::var(PASSWORD_ENV)
        .ok()
        .filter(|value| !value.is_empty())
        .map(Zeroizing::new)
}

fn no_tty_error() -> CliError {
    CliError::auth_failed_with_hint(
        "No password provided and no TTY available.",
        "Hint: set NOTEVAULT_PASSWORD for non-interactive use.",
    )
}

fn prompt_password() -> anyhow::Result<Zeroizing<String>> {
    Password::new()
        .with_prompt("Master password")
        .interact()
        .map(Zeroizing::new)
        .map_err(|e| anyhow::anyhow!("Failed to read password: {}", e))
}

/// Read the password for a new vault.
///
/// The environment value is passed through as is and checked by `setup`.
/// Interactive input is re-prompted until it satisfies the policy.
pub fn new_password() -> anyhow::Result<Zeroizing<String>> {
    if let Some(password) = env_password() {
        return Ok(password);
    }
    if !io::stdin().is_terminal() {
        return Err(no_tty_error().into());
    }
    loop {
        let password = Password::new()
            .with_prompt("New master password")
            .with_confirmation("Confirm password", "Passwords do not match")
            .interact()
            .map(Zeroizing::new)
            .map_err(|e| anyhow::anyhow!("Failed to read password: {}", e))?;
        let unmet = validate_password(&password);
        if unmet.is_empty() {
            return Ok(password);
        }
        eprintln!("Password is too weak:");
        for rule in unmet {
            eprintln!("  - {}", rule);
        }
    }
}

/// Log in, prompting up to three times on a terminal.
///
/// With NOTEVAULT_PASSWORD set there is exactly one attempt.
pub fn login_with_retry(vault: &Vault) -> anyhow::Result<()> {
    if let Some(password) = env_password() {
        return vault.login(&password).map_err(Into::into);
    }
    if !io::stdin().is_terminal() {
        return Err(no_tty_error().into());
    }

    let mut attempts: u32 = 0;
    loop {
        attempts += 1;
        let password = prompt_password()?;
        match vault.login(&password) {
            Ok(()) => return Ok(()),
            Err(VaultError::Auth(AuthError::InvalidCredential)) => {
                let remaining = MAX_PASSWORD_ATTEMPTS.saturating_sub(attempts);
                if remaining == 0 {
                    return Err(CliError::auth_failed_with_hint(
                        "Too many failed password attempts.",
                        "Hint: a forgotten master password cannot be recovered.\n      Exports use the same password.",
                    )
                    .into());
                }
                eprintln!(
                    "Invalid credential. {} attempt{} remaining.",
                    remaining,
                    if remaining == 1 { "" } else { "s" }
                );
            }
            Err(err) => return Err(err.into()),
        }
    }
}
