use notevault_core::NotePatch;

use crate::app::AppContext;
use crate::cli::{AddArgs, EditArgs, RmArgs, ShowArgs};
use crate::errors::CliError;
use crate::helpers::{read_note_body, resolve_note_id};
use crate::output::{note_json, print_json};
use crate::ui::format::short_id;
use crate::ui::render::note_detail;

pub fn handle_add(ctx: &AppContext, args: &AddArgs) -> anyhow::Result<()> {
    let body = read_note_body(args.body.clone())?;
    let note = ctx.with_unlocked(|vault| Ok(vault.create_note(&args.title, &body)?))?;

    if ctx.quiet() {
        println!("{}", note.id);
    } else {
        println!("Added note {} ({})", note.id, note.title);
    }
    Ok(())
}

pub fn handle_edit(ctx: &AppContext, args: &EditArgs) -> anyhow::Result<()> {
    let mut patch = NotePatch::new();
    if let Some(title) = &args.title {
        patch = patch.title(title.clone());
    }
    if let Some(body) = &args.body {
        patch = patch.body(body.clone());
    }
    if patch.is_empty() {
        return Err(CliError::invalid_input("Nothing to change: pass --title and/or --body").into());
    }

    let note = ctx.with_unlocked(|vault| {
        let id = resolve_note_id(vault, &args.id)?;
        Ok(vault.update_note(&id, &patch)?)
    })?;

    if !ctx.quiet() {
        println!("Updated note {}", short_id(&note.id));
    }
    Ok(())
}

pub fn handle_rm(ctx: &AppContext, args: &RmArgs) -> anyhow::Result<()> {
    let id = ctx.with_unlocked(|vault| {
        let id = resolve_note_id(vault, &args.id)?;
        vault.delete_note(&id)?;
        Ok(id)
    })?;

    if !ctx.quiet() {
        println!("Deleted note {}", short_id(&id));
    }
    Ok(())
}

pub fn handle_show(ctx: &AppContext, args: &ShowArgs) -> anyhow::Result<()> {
    let note = ctx.with_unlocked(|vault| {
        let id = resolve_note_id(vault, &args.id)?;
        Ok(vault.get_note(&id)?)
    })?;

    if args.json {
        print_json(&note_json(&note))
    } else {
        println!("{}", note_detail(&note));
        Ok(())
    }
}
