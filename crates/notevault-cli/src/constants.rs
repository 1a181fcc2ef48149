//! Constants used throughout the CLI.

/// Exit codes for the CLI.
///
/// 0 is success, 1 an unclassified error and 2 is left to clap for usage
/// errors. Application-specific codes start at 3.
pub mod exit_codes {
    /// Vault file or note not found.
    pub const NOT_FOUND: i32 = 3;

    /// Invalid user input or arguments.
    pub const INVALID_INPUT: i32 = 4;

    /// Wrong password, too many attempts or no session.
    pub const AUTH_FAILED: i32 = 5;

    /// Integrity check failed or stored data does not authenticate.
    pub const INTEGRITY_FAILED: i32 = 6;
}

/// Password prompts allowed before giving up.
pub const MAX_PASSWORD_ATTEMPTS: u32 = 3;

/// How often the shell's background task checks the session deadline.
pub const EXPIRY_TICK_SECONDS: u64 = 5;

/// Default listing width for note titles.
pub const TITLE_COLUMN_WIDTH: usize = 40;
