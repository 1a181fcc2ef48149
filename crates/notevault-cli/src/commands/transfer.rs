use std::path::Path;

use crate::app::AppContext;
use crate::cli::{ExportArgs, ImportArgs};
use crate::errors::CliError;

pub fn handle_export(ctx: &AppContext, args: &ExportArgs) -> anyhow::Result<()> {
    let dest = Path::new(&args.dest);
    let count = ctx.with_unlocked(|vault| Ok(vault.export_to_file(dest)?))?;
    if !ctx.quiet() {
        println!("Exported {} note(s) to {}", count, dest.display());
        println!("Notes stay encrypted; the same master password is needed to import them.");
    }
    Ok(())
}

pub fn handle_import(ctx: &AppContext, args: &ImportArgs) -> anyhow::Result<()> {
    let src = Path::new(&args.src);
    if !src.exists() {
        return Err(CliError::not_found(
            format!("Export file not found: {}", src.display()),
            "Hint: create one with `notevault export <DEST>`.",
        )
        .into());
    }
    let count = ctx.with_unlocked(|vault| Ok(vault.import_from_file(src)?))?;
    if !ctx.quiet() {
        println!("Imported {} note(s) from {}", count, src.display());
    }
    Ok(())
}
