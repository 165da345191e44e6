use crate::cache::FetchCache;
use crate::cookbook::CookbookMetadata;
use crate::error::{MirrorError, Result};
use crate::fsutil;
use std::path::{Path, PathBuf};
use std::process::Command;

/// A pinned requirement's source: an explicit location rather than a
/// catalog. Artifacts fetched from here take precedence over anything a
/// catalog reports for the same name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LocationSpec {
    Git {
        url: String,
        reference: Option<String>,
    },
    Path {
        path: PathBuf,
    },
}

/// A location fetch result: where the cookbook files landed and the
/// cookbook's own declared metadata.
#[derive(Debug)]
pub struct FetchedCookbook {
    pub path: PathBuf,
    pub metadata: CookbookMetadata,
}

impl LocationSpec {
    /// Identity used as the shared fetch cache key.
    pub fn source_id(&self) -> String {
        match self {
            LocationSpec::Git { url, .. } => url.clone(),
            LocationSpec::Path { path } => path.display().to_string(),
        }
    }

    pub fn describe(&self) -> String {
        match self {
            LocationSpec::Git { url, reference } => match reference {
                Some(r) => format!("git {url} @ {r}"),
                None => format!("git {url}"),
            },
            LocationSpec::Path { path } => format!("path {}", path.display()),
        }
    }

    /// Materialize the cookbook. Git sources clone once per URL per build
    /// attempt through the shared fetch cache; the requested ref is checked
    /// out into a fresh scratch copy so one clone serves many refs.
    pub fn fetch(&self, cache: &FetchCache) -> Result<FetchedCookbook> {
        match self {
            LocationSpec::Path { path } => {
                if !path.is_dir() {
                    return Err(MirrorError::fetch(
                        path.display().to_string(),
                        "not a directory",
                    ));
                }
                let metadata = CookbookMetadata::load(path)?;
                Ok(FetchedCookbook {
                    path: path.clone(),
                    metadata,
                })
            }
            LocationSpec::Git { url, reference } => {
                let clone = cache.materialize(url, |slot| git_clone(url, slot))?;
                let work = cache.scratch_dir(&self.source_id())?;
                fsutil::copy_tree(&clone, &work)?;
                if let Some(r) = reference {
                    git_checkout(&work, r)?;
                }
                let metadata = CookbookMetadata::load(&work)?;
                Ok(FetchedCookbook {
                    path: work,
                    metadata,
                })
            }
        }
    }
}

fn git_clone(url: &str, dest: &Path) -> Result<PathBuf> {
    let target = dest.join("clone");
    let status = Command::new("git")
        .args(["clone", "--quiet", url])
        .arg(&target)
        .status()
        .map_err(|e| MirrorError::fetch(url, format!("unable to run git: {e}")))?;
    if !status.success() {
        return Err(MirrorError::fetch(url, format!("git clone exited {status}")));
    }
    Ok(target)
}

fn git_checkout(work: &Path, reference: &str) -> Result<()> {
    let status = Command::new("git")
        .arg("-C")
        .arg(work)
        .args(["checkout", "--quiet", reference])
        .status()
        .map_err(|e| MirrorError::fetch(reference, format!("unable to run git: {e}")))?;
    if !status.success() {
        return Err(MirrorError::fetch(
            reference,
            format!("git checkout exited {status}"),
        ));
    }
    Ok(())
}
