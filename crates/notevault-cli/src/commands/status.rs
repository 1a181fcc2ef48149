use crate::app::AppContext;
use crate::cli::StatusArgs;
use crate::output::{print_json, status_json};
use crate::ui::format::format_datetime;

/// Report setup state and storage metadata. Never prompts for a password.
pub fn handle_status(ctx: &AppContext, args: &StatusArgs) -> anyhow::Result<()> {
    let vault = ctx.open_vault()?;
    let path = ctx.vault_path()?;
    let setup_required = vault.is_setup_required()?;
    let metadata = if setup_required {
        None
    } else {
        Some(vault.metadata()?)
    };

    if args.json {
        return print_json(&status_json(
            &path,
            setup_required,
            metadata.as_ref(),
            &vault.session_state(),
        ));
    }

    println!("Vault:          {}", path.display());
    if setup_required {
        println!("Setup:          required (run `notevault init`)");
        return Ok(());
    }
    println!("Setup:          complete");
    if let Some(metadata) = metadata {
        println!("Notes:          {}", metadata.record_count);
        println!("Schema version: {}", metadata.schema_version);
        println!(
            "Last write:     {}",
            format_datetime(&metadata.last_synced_at, true)
        );
    }
    Ok(())
}
