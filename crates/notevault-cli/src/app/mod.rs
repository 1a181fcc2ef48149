//! Application-level utilities for the NoteVault CLI.
//!
//! This module provides:
//! - Application context bundling CLI args with the lazily-loaded config
//! - Path resolution for config and vault files
//! - Password prompting with retry logic

mod context;
mod password;
mod resolver;

pub use context::AppContext;
pub use password::{login_with_retry, new_password};
pub use resolver::resolve_config_path;
