use crate::colors::*;
use crate::store::LocalStore;
use anyhow::{Context, Result};
use std::path::Path;

pub(crate) fn cmd_list(directory: &Path) -> Result<()> {
    let store = LocalStore::open(directory)
        .with_context(|| format!("open mirror at {}", directory.display()))?;
    let records = store.records().context("read install records")?;
    if records.is_empty() {
        println!(
            "{gray}[bodega]{reset} no cookbooks mirrored at {}",
            directory.display(),
            gray = C_GRAY,
            reset = C_RESET
        );
        return Ok(());
    }
    for record in records {
        match record.source {
            Some(source) => println!(
                "{cyan}{}-{}{reset} (from {source})",
                record.name,
                record.version,
                cyan = C_CYAN,
                reset = C_RESET
            ),
            None => println!(
                "{cyan}{}-{}{reset}",
                record.name,
                record.version,
                cyan = C_CYAN,
                reset = C_RESET
            ),
        }
    }
    Ok(())
}
