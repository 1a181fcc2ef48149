//! CLI error types for structured error handling.
//!
//! Typed errors map to stable exit codes. Core `VaultError`s are classified
//! here too, so every command can just return `anyhow::Result`.

use std::fmt;

use notevault_core::{AuthError, CryptoError, StorageError, VaultError};

/// CLI-specific errors with associated exit codes.
#[derive(Debug)]
pub enum CliError {
    /// Vault file or note not found
    NotFound { message: String, hint: String },

    /// Authentication failed (wrong password, too many attempts)
    AuthFailed {
        message: String,
        hint: Option<String>,
    },

    /// Invalid user input
    InvalidInput(String),

    /// Stored data failed verification
    IntegrityFailed { message: String, hint: String },
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::NotFound { message, hint }
            | CliError::IntegrityFailed { message, hint } => {
                write!(f, "{}\n{}", message, hint)
            }
            CliError::AuthFailed { message, hint } => {
                if let Some(h) = hint {
                    write!(f, "{}\n{}", message, h)
                } else {
                    write!(f, "{}", message)
                }
            }
            CliError::InvalidInput(message) => write!(f, "{}", message),
        }
    }
}

impl std::error::Error for CliError {}

impl CliError {
    pub fn not_found(message: impl Into<String>, hint: impl Into<String>) -> Self {
        CliError::NotFound {
            message: message.into(),
            hint: hint.into(),
        }
    }

    pub fn auth_failed(message: impl Into<String>) -> Self {
        CliError::AuthFailed {
            message: message.into(),
            hint: None,
        }
    }

    pub fn auth_failed_with_hint(message: impl Into<String>, hint: impl Into<String>) -> Self {
        CliError::AuthFailed {
            message: message.into(),
            hint: Some(hint.into()),
        }
    }

    pub fn invalid_input(message: impl Into<String>) -> Self {
        CliError::InvalidInput(message.into())
    }

    pub fn integrity_failed(message: impl Into<String>) -> Self {
        CliError::IntegrityFailed {
            message: message.into(),
            hint: "Hint: restore from an export made with `notevault export`.".to_string(),
        }
    }

    /// Classify a core error. `None` means it has no dedicated exit code.
    pub fn from_vault(err: &VaultError) -> Option<Self> {
        let mapped = match err {
            VaultError::Auth(AuthError::InvalidCredential) => {
                CliError::auth_failed("Invalid credential")
            }
            VaultError::Auth(AuthError::NotAuthenticated | AuthError::SessionExpired) => {
                CliError::auth_failed_with_hint(
                    err.to_string(),
                    "Hint: log in again to continue.",
                )
            }
            VaultError::Auth(AuthError::WeakPassword(_)) => CliError::invalid_input(err.to_string()),
            VaultError::Auth(AuthError::SetupAlreadyCompleted) => {
                CliError::invalid_input("This vault already has a master password.")
            }
            VaultError::Storage(StorageError::RecordNotFound(id)) => CliError::not_found(
                format!("No note with id {}", id),
                "Hint: run `notevault list` to see note ids.",
            ),
            VaultError::Storage(StorageError::NotInitialized) => CliError::not_found(
                "No vault found",
                "Hint: run `notevault init` first.",
            ),
            VaultError::Storage(StorageError::Corrupt(_))
            | VaultError::Crypto(CryptoError::DecryptionFailed) => {
                CliError::integrity_failed(err.to_string())
            }
            VaultError::Crypto(CryptoError::UnsupportedSchema(_)) | VaultError::Validation(_) => {
                CliError::invalid_input(err.to_string())
            }
            _ => return None,
        };
        Some(mapped)
    }

    /// Get the exit code for this error.
    pub fn exit_code(&self) -> i32 {
        use super::constants::exit_codes;
        match self {
            CliError::NotFound { .. } => exit_codes::NOT_FOUND,
            CliError::AuthFailed { .. } => exit_codes::AUTH_FAILED,
            CliError::InvalidInput(_) => exit_codes::INVALID_INPUT,
            CliError::IntegrityFailed { .. } => exit_codes::INTEGRITY_FAILED,
        }
    }
}

/// Exit code and message for an error returned by a command.
///
/// Typed CLI errors and classified core errors get their own codes;
/// anything else exits with 1.
pub fn describe(err: &anyhow::Error) -> (i32, String) {
    if let Some(cli) = err.downcast_ref::<CliError>() {
        return (cli.exit_code(), cli.to_string());
    }
    if let Some(cli) = err.downcast_ref::<VaultError>().and_then(CliError::from_vault) {
        return (cli.exit_code(), cli.to_string());
    }
    (1, format!("{:#}", err))
}
