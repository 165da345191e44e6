use crate::cache::FetchCache;
use crate::colors::*;
use crate::fetch::{Catalog, HttpCatalog};
use crate::fsutil;
use crate::inventory::Inventory;
use crate::mirror::InventoryBuilder;
use crate::output::Output;
use anyhow::{Context, Result};
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

pub(crate) fn cmd_mirror(inventory_path: &Path, directory: &Path) -> Result<()> {
    let started = Instant::now();
    let inventory = Inventory::load(inventory_path)
        .with_context(|| format!("load inventory {}", inventory_path.display()))?;

    if inventory.requirements.is_empty() {
        println!(
            "{gray}[bodega]{reset} {yellow}warning{reset} inventory declares no cookbooks; nothing to do",
            gray = C_GRAY,
            yellow = C_YELLOW,
            reset = C_RESET
        );
        return Ok(());
    }

    let catalogs: Vec<Box<dyn Catalog>> = inventory
        .sources
        .iter()
        .map(|base| Box::new(HttpCatalog::new(base.clone())) as Box<dyn Catalog>)
        .collect();

    let cache = Arc::new(FetchCache::new(fsutil::cache_root()));
    let builder = InventoryBuilder::new(
        directory,
        inventory.requirements,
        catalogs,
        cache,
        Output::stdout(),
    )?;
    let report = builder.build().context("build mirror")?;

    println!(
        "{gray}[bodega]{reset} {green}done{reset} {installed} installed, {kept} already present ({secs:.1}s)",
        gray = C_GRAY,
        green = C_GREEN,
        reset = C_RESET,
        installed = report.installed.len(),
        kept = report.already_installed.len(),
        secs = started.elapsed().as_secs_f64()
    );
    Ok(())
}
