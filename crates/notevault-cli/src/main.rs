//! NoteVault CLI - password-protected, encrypted notes
//!
//! Command-line presentation layer over `notevault-core`. Each one-shot
//! command logs in, does its work and logs out; `shell` keeps one session
//! open with an inactivity lock.

mod app;
mod cli;
mod commands;
mod config;
mod constants;
mod errors;
mod helpers;
mod output;
mod ui;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use crate::app::AppContext;
use crate::cli::{Cli, Commands};

fn init_tracing() {
    let filter = std::env::var("NOTEVAULT_LOG")
        .ok()
        .and_then(|value| EnvFilter::try_new(value).ok())
        .or_else(|| EnvFilter::try_from_default_env().ok())
        .unwrap_or_else(|| EnvFilter::new("warn"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn run(cli: &Cli) -> anyhow::Result<()> {
    let ctx = AppContext::new(cli);
    match &cli.command {
        Commands::Init(args) => commands::handle_init(&ctx, args),
        Commands::Add(args) => commands::handle_add(&ctx, args),
        Commands::Edit(args) => commands::handle_edit(&ctx, args),
        Commands::Rm(args) => commands::handle_rm(&ctx, args),
        Commands::Show(args) => commands::handle_show(&ctx, args),
        Commands::List(args) => commands::handle_list(&ctx, args),
        Commands::Search(args) => commands::handle_search(&ctx, args),
        Commands::Export(args) => commands::handle_export(&ctx, args),
        Commands::Import(args) => commands::handle_import(&ctx, args),
        Commands::Check => commands::handle_check(&ctx),
        Commands::Status(args) => commands::handle_status(&ctx, args),
        Commands::Shell => commands::handle_shell(&ctx),
        Commands::Completions(args) => commands::handle_completions(args),
    }
}

fn main() {
    init_tracing();
    let cli = Cli::parse();

    if let Err(err) = run(&cli) {
        let (code, message) = errors::describe(&err);
        eprintln!("Error: {}", message);
        std::process::exit(code);
    }
}
