use chrono::{DateTime, Utc};

use notevault_core::PlaintextRecord;

use crate::app::AppContext;
use crate::cli::{ListArgs, SearchArgs};
use crate::errors::CliError;
use crate::helpers::{parse_datetime, parse_duration};
use crate::output::{notes_json, print_json};
use crate::ui::render::notes_table;
use crate::ui::OutputMode;

fn print_notes(ctx: &AppContext, notes: &[PlaintextRecord], json: bool) -> anyhow::Result<()> {
    if json {
        return print_json(&notes_json(notes));
    }
    if notes.is_empty() {
        if !ctx.quiet() {
            println!("No notes.");
        }
        return Ok(());
    }
    println!("{}", notes_table(OutputMode::detect(), notes));
    Ok(())
}

fn window(args: &ListArgs) -> anyhow::Result<Option<(DateTime<Utc>, DateTime<Utc>)>> {
    let since = match (&args.last, &args.since) {
        (Some(last), _) => Some(
            Utc::now()
                .checked_sub_signed(parse_duration(last)?)
                .ok_or_else(|| CliError::invalid_input(format!("--last {} reaches too far back", last)))?,
        ),
        (None, Some(since)) => Some(parse_datetime(since)?),
        (None, None) => None,
    };
    let until = args.until.as_deref().map(parse_datetime).transpose()?;
    if since.is_none() && until.is_none() {
        return Ok(None);
    }
    Ok(Some((
        since.unwrap_or(DateTime::<Utc>::MIN_UTC),
        until.unwrap_or(DateTime::<Utc>::MAX_UTC),
    )))
}

pub fn handle_list(ctx: &AppContext, args: &ListArgs) -> anyhow::Result<()> {
    let window = window(args)?;
    let mut notes = ctx.with_unlocked(|vault| match window {
        Some((since, until)) => Ok(vault.list_notes_between(since, until)?),
        None => Ok(vault.list_notes()?),
    })?;
    if let Some(limit) = args.limit {
        notes.truncate(limit);
    }
    print_notes(ctx, &notes, args.json)
}

pub fn handle_search(ctx: &AppContext, args: &SearchArgs) -> anyhow::Result<()> {
    let mut notes = ctx.with_unlocked(|vault| Ok(vault.search_notes(&args.query)?))?;
    if let Some(limit) = args.limit {
        notes.truncate(limit);
    }
    print_notes(ctx, &notes, args.json)
}
