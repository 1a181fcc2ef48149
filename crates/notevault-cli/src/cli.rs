use clap::{Args, Parser, Subcommand};
use clap_complete::Shell;

use notevault_core::VERSION;

/// NoteVault - password-protected, encrypted notes on the command line
#[derive(Parser)]
#[command(name = "notevault")]
#[command(author, version = VERSION, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to the vault file
    #[arg(short, long, global = true, env = "NOTEVAULT_PATH")]
    pub vault: Option<String>,

    /// Quiet mode (minimal output)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Create a new vault and set its master password
    Init(InitArgs),

    /// Add a note
    Add(AddArgs),

    /// Change the title and/or body of a note
    Edit(EditArgs),

    /// Delete a note
    Rm(RmArgs),

    /// Show one note
    Show(ShowArgs),

    /// List notes, oldest first
    List(ListArgs),

    /// Search titles and bodies (case-insensitive)
    Search(SearchArgs),

    /// Write every note, still encrypted, to a JSON file
    Export(ExportArgs),

    /// Load notes from a file written by `export`
    Import(ImportArgs),

    /// Verify the vault file
    Check,

    /// Show setup state and storage metadata
    Status(StatusArgs),

    /// Interactive session with inactivity lock
    Shell,

    /// Generate shell completions
    Completions(CompletionsArgs),
}

#[derive(Args)]
pub struct InitArgs {
    /// Where to create the vault (defaults to the XDG data directory)
    #[arg(value_name = "PATH")]
    pub path: Option<String>,

    /// Session timeout in minutes recorded in the config file
    #[arg(long, value_name = "MINUTES")]
    pub timeout: Option<i64>,
}

#[derive(Args)]
pub struct AddArgs {
    /// Note title
    #[arg(short, long)]
    pub title: String,

    /// Note body (otherwise read from stdin or prompted)
    #[arg(short, long)]
    pub body: Option<String>,
}

#[derive(Args)]
pub struct EditArgs {
    /// Note ID (a unique prefix is enough)
    #[arg(value_name = "ID")]
    pub id: String,

    /// New title
    #[arg(short, long)]
    pub title: Option<String>,

    /// New body
    #[arg(short, long)]
    pub body: Option<String>,
}

#[derive(Args)]
pub struct RmArgs {
    /// Note ID (a unique prefix is enough)
    #[arg(value_name = "ID")]
    pub id: String,
}

#[derive(Args)]
pub struct ShowArgs {
    /// Note ID (a unique prefix is enough)
    #[arg(value_name = "ID")]
    pub id: String,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Args)]
pub struct ListArgs {
    /// Time window (e.g. "7d", "24h")
    #[arg(long, conflicts_with = "since")]
    pub last: Option<String>,

    /// Only notes created at or after this time (RFC 3339)
    #[arg(long)]
    pub since: Option<String>,

    /// Only notes created at or before this time (RFC 3339)
    #[arg(long)]
    pub until: Option<String>,

    /// Limit number of results
    #[arg(long)]
    pub limit: Option<usize>,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Args)]
pub struct SearchArgs {
    /// Text to look for
    #[arg(value_name = "QUERY")]
    pub query: String,

    /// Limit number of results
    #[arg(long)]
    pub limit: Option<usize>,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Args)]
pub struct ExportArgs {
    /// Destination file
    #[arg(value_name = "DEST")]
    pub dest: String,
}

#[derive(Args)]
pub struct ImportArgs {
    /// Export file to load
    #[arg(value_name = "SRC")]
    pub src: String,
}

#[derive(Args)]
pub struct StatusArgs {
    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    #[arg(value_enum)]
    pub shell: Shell,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_edit_parses_partial_patch() {
        let cli = Cli::try_parse_from(["notevault", "edit", "abcd1234", "--title", "New"])
            .expect("edit should parse");
        match cli.command {
            Commands::Edit(args) => {
                assert_eq!(args.id, "abcd1234");
                assert_eq!(args.title.as_deref(), Some("New"));
                assert!(args.body.is_none());
            }
            _ => panic!("expected edit"),
        }
    }

    #[test]
    fn test_add_requires_title() {
        assert!(Cli::try_parse_from(["notevault", "add", "--body", "x"]).is_err());
    }
}
