use crate::colors::*;
use anyhow::{bail, Context, Result};
use std::fs;
use std::path::Path;

const STARTER_INVENTORY: &str = "\
# bodega inventory
sources:
  - https://supermarket.chef.io/api/v1

cookbooks:
  # nginx:
  #   versions:
  #     - \"~> 2.7\"
  # internal_base:
  #   git:
  #     location: https://example.com/cookbooks/internal_base.git
  #     ref: v1.0.0
  # local_tweaks:
  #   path:
  #     location: ./cookbooks/local_tweaks
";

pub(crate) fn cmd_init(path: &Path) -> Result<()> {
    if path.exists() {
        bail!("{} already exists", path.display());
    }
    fs::write(path, STARTER_INVENTORY)
        .with_context(|| format!("write {}", path.display()))?;
    println!(
        "{gray}[bodega]{reset} {green}created{reset} {}",
        path.display(),
        gray = C_GRAY,
        green = C_GREEN,
        reset = C_RESET
    );
    Ok(())
}
