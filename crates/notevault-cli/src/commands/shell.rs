//! Interactive shell: one login, many commands, locked after inactivity.

use std::io::{self, BufRead, Write};
use std::time::Duration;

use clap::{Parser, Subcommand};

use notevault_core::{spawn_expiry_ticker, NotePatch, SessionEvent, SessionState, Vault};

use crate::app::{login_with_retry, AppContext};
use crate::constants::EXPIRY_TICK_SECONDS;
use crate::errors::{describe, CliError};
use crate::helpers::{resolve_note_id, split_words};
use crate::ui::format::{format_datetime, short_id};
use crate::ui::render::{note_detail, notes_table};
use crate::ui::OutputMode;

#[derive(Parser)]
#[command(name = "notevault", no_binary_name = true, disable_version_flag = true)]
struct ShellLine {
    #[command(subcommand)]
    command: ShellCommand,
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
enum ShellCommand {
    /// List notes
    List,
    /// Search titles and bodies
    Search { query: String },
    /// Show one note
    Show { id: String },
    /// Add a note
    Add { title: String, body: Option<String> },
    /// Change a note
    Edit {
        id: String,
        #[arg(short, long)]
        title: Option<String>,
        #[arg(short, long)]
        body: Option<String>,
    },
    /// Delete a note
    Rm { id: String },
    /// Show the session state
    Status,
    /// Lock the vault
    Logout,
    /// Unlock the vault again
    Login,
    /// Leave the shell
    #[command(alias = "exit")]
    Quit,
}

enum Flow {
    Continue,
    Quit,
}

pub fn handle_shell(ctx: &AppContext) -> anyhow::Result<()> {
    let vault = ctx.unlock()?;

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(1)
        .enable_time()
        .build()?;
    let ticker = {
        let _guard = runtime.enter();
        spawn_expiry_ticker(vault.session(), Duration::from_secs(EXPIRY_TICK_SECONDS))
    };
    tracing::debug!("expiry ticker started");

    let result = repl(ctx, &vault);

    ticker.abort();
    vault.logout();
    result
}

fn repl(ctx: &AppContext, vault: &Vault) -> anyhow::Result<()> {
    if !ctx.quiet() {
        println!(
            "Vault unlocked. Locks after {} minutes without activity. Type `help` for commands.",
            vault.session().timeout().num_minutes()
        );
    }
    let mode = OutputMode::detect();
    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();

    loop {
        report_expiry(vault);
        print!("{}", prompt(&vault.session_state()));
        io::stdout().flush()?;

        let Some(line) = lines.next() else {
            break;
        };
        let words = match split_words(&line?) {
            Ok(words) => words,
            Err(err) => {
                eprintln!("Error: {}", describe(&err).1);
                continue;
            }
        };
        if words.is_empty() {
            continue;
        }
        let command = match ShellLine::try_parse_from(words) {
            Ok(line) => line.command,
            Err(err) => {
                let _ = err.print();
                continue;
            }
        };

        report_expiry(vault);
        match run_command(vault, command, mode) {
            Ok(Flow::Quit) => break,
            Ok(Flow::Continue) => {}
            Err(err) => eprintln!("Error: {}", describe(&err).1),
        }
    }
    Ok(())
}

fn prompt(state: &SessionState) -> &'static str {
    if state.is_authenticated() {
        "notevault> "
    } else {
        "notevault (locked)> "
    }
}

/// Tell the user when the ticker locked the vault while they were idle.
fn report_expiry(vault: &Vault) {
    let expired = vault
        .session()
        .drain_events()
        .into_iter()
        .any(|event| event == SessionEvent::Expired);
    if expired {
        println!("Session locked after inactivity. Run `login` to continue.");
    }
}

fn run_command(vault: &Vault, command: ShellCommand, mode: OutputMode) -> anyhow::Result<Flow> {
    match command {
        ShellCommand::Quit => return Ok(Flow::Quit),
        ShellCommand::Login => {
            login_with_retry(vault)?;
            println!("Unlocked.");
        }
        ShellCommand::Logout => {
            vault.logout();
            println!("Locked.");
        }
        ShellCommand::Status => print_status(vault)?,
        note_command => {
            // Any command is activity; a locked vault is reported by the command itself.
            if vault.session_state().is_authenticated() {
                vault.extend_session()?;
            }
            run_note_command(vault, note_command, mode)?;
        }
    }
    Ok(Flow::Continue)
}

fn run_note_command(vault: &Vault, command: ShellCommand, mode: OutputMode) -> anyhow::Result<()> {
    match command {
        ShellCommand::List => print_listing(&vault.list_notes()?, mode),
        ShellCommand::Search { query } => print_listing(&vault.search_notes(&query)?, mode),
        ShellCommand::Show { id } => {
            let id = resolve_note_id(vault, &id)?;
            println!("{}", note_detail(&vault.get_note(&id)?));
        }
        ShellCommand::Add { title, body } => {
            let note = vault.create_note(&title, &body.unwrap_or_default())?;
            println!("Added note {}", short_id(&note.id));
        }
        ShellCommand::Edit { id, title, body } => {
            let patch = NotePatch { title, body };
            if patch.is_empty() {
                return Err(CliError::invalid_input("Nothing to change: pass --title and/or --body").into());
            }
            let id = resolve_note_id(vault, &id)?;
            vault.update_note(&id, &patch)?;
            println!("Updated note {}", short_id(&id));
        }
        ShellCommand::Rm { id } => {
            let id = resolve_note_id(vault, &id)?;
            vault.delete_note(&id)?;
            println!("Deleted note {}", short_id(&id));
        }
        ShellCommand::Quit
        | ShellCommand::Login
        | ShellCommand::Logout
        | ShellCommand::Status => {}
    }
    Ok(())
}

fn print_listing(notes: &[notevault_core::PlaintextRecord], mode: OutputMode) {
    if notes.is_empty() {
        println!("No notes.");
    } else {
        println!("{}", notes_table(mode, notes));
    }
}

fn print_status(vault: &Vault) -> anyhow::Result<()> {
    match vault.session_state() {
        SessionState::Authenticated { expires_at } => {
            println!("Session: unlocked until {}", format_datetime(&expires_at, true));
        }
        SessionState::Unauthenticated => println!("Session: locked"),
    }
    println!("Notes:   {}", vault.metadata()?.record_count);
    Ok(())
}
