use notevault_core::{StorageError, VaultError};

use crate::app::AppContext;
use crate::errors::CliError;

pub fn handle_check(ctx: &AppContext) -> anyhow::Result<()> {
    let vault = ctx.open_vault()?;
    match vault.check_integrity() {
        Ok(()) => {
            if !ctx.quiet() {
                let metadata = vault.metadata()?;
                println!("Integrity check: OK");
                println!("- sqlite: OK");
                println!("- nonces: OK");
                println!("- record count: OK ({})", metadata.record_count);
            }
            Ok(())
        }
        Err(VaultError::Storage(StorageError::Corrupt(detail))) => {
            println!("Integrity check: FAILED");
            println!("- error: {}", detail);
            Err(CliError::integrity_failed("Integrity check failed").into())
        }
        Err(err) => Err(err.into()),
    }
}
