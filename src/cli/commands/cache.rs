use crate::cache::FetchCache;
use crate::cli::CacheCmd;
use crate::colors::*;
use crate::fsutil;
use anyhow::{Context, Result};

pub(crate) fn cmd_cache(cmd: CacheCmd) -> Result<()> {
    match cmd {
        CacheCmd::Path => {
            println!("{}", fsutil::cache_root().display());
            Ok(())
        }
        CacheCmd::Clean => {
            let cache = FetchCache::new(fsutil::cache_root());
            cache.clear().context("clear fetch cache")?;
            println!(
                "{gray}[bodega]{reset} {green}cleaned{reset} {}",
                cache.root().display(),
                gray = C_GRAY,
                green = C_GREEN,
                reset = C_RESET
            );
            Ok(())
        }
    }
}
