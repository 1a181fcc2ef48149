//! UI primitives for the NoteVault CLI.
//!
//! - **Format**: String utilities (truncate, short ids, timestamps)
//! - **Render**: Note tables and detail views

use std::io::{self, IsTerminal};

pub mod format;
pub mod render;

/// How human-readable output is laid out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    /// Tables with headers, for a terminal
    Pretty,
    /// One tab-separated line per note, for pipes
    Plain,
}

impl OutputMode {
    pub fn detect() -> Self {
        if io::stdout().is_terminal() {
            OutputMode::Pretty
        } else {
            OutputMode::Plain
        }
    }

    pub fn is_pretty(self) -> bool {
        self == OutputMode::Pretty
    }
}
