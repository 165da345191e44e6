use crate::cookbook::CookbookMetadata;
use crate::error::Result;
use crate::fsutil;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::{Path, PathBuf};
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;
use walkdir::WalkDir;

/// Install record written next to each mirrored cookbook. `list` and later
/// runs read these instead of re-parsing cookbook metadata.
pub const RECORD_FILE: &str = ".bodega.json";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InstallRecord {
    pub name: String,
    pub version: String,
    #[serde(default)]
    pub source: Option<String>,
    #[serde(default)]
    pub dependencies: BTreeMap<String, String>,
    pub content_hash: String,
    pub mirrored_at: String,
}

/// Persisted record of which (name, version) cookbooks already exist in the
/// mirror. The index is rebuilt from disk at open, so `installed` reflects
/// prior runs, not just this process. Adds are idempotent and internally
/// synchronized; a global store lock serializes concurrent installs.
#[derive(Debug)]
pub struct LocalStore {
    root: PathBuf,
    index: Mutex<BTreeSet<(String, String)>>,
}

impl LocalStore {
    pub fn open(root: &Path) -> Result<Self> {
        fsutil::ensure_dir(root)?;
        let mut index = BTreeSet::new();
        for entry in fs::read_dir(root)? {
            let entry = entry?;
            if !entry.file_type()?.is_dir() {
                continue;
            }
            let record_path = entry.path().join(RECORD_FILE);
            if !record_path.exists() {
                continue;
            }
            let txt = fs::read_to_string(&record_path)?;
            if let Ok(record) = serde_json::from_str::<InstallRecord>(&txt) {
                // A staging directory left by an interrupted run can carry a
                // record too; only a directory named for its record counts
                // as installed.
                let expected = format!("{}-{}", record.name, record.version);
                if entry.file_name().to_string_lossy() == expected {
                    index.insert((record.name, record.version));
                }
            }
        }
        Ok(Self {
            root: root.to_path_buf(),
            index: Mutex::new(index),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn installed(&self, name: &str, version: &str) -> bool {
        self.index
            .lock()
            .contains(&(name.to_string(), version.to_string()))
    }

    pub fn cookbook_path(&self, name: &str, version: &str) -> PathBuf {
        self.root.join(format!("{name}-{version}"))
    }

    /// Copy a materialized cookbook into the mirror and record the metadata
    /// passed at install time. Re-adding an already-present (name, version)
    /// is a safe no-op, keyed by metadata identity: returns false and writes
    /// nothing.
    pub fn add_cookbook_from_path(
        &self,
        path: &Path,
        meta: &CookbookMetadata,
        source: Option<&str>,
    ) -> Result<bool> {
        let key = (meta.name.clone(), meta.version.clone());
        let mut index = self.index.lock();
        if index.contains(&key) {
            return Ok(false);
        }

        let dest = self.cookbook_path(&meta.name, &meta.version);
        // Dotted version directories rule out with_extension here.
        let tmp = self
            .root
            .join(format!(".tmp-{}-{}", meta.name, meta.version));
        if tmp.exists() {
            fs::remove_dir_all(&tmp)?;
        }
        fsutil::copy_tree(path, &tmp)?;
        // Git-pinned cookbooks arrive as working copies; version control
        // internals are not cookbook content.
        let git_dir = tmp.join(".git");
        if git_dir.exists() {
            fs::remove_dir_all(&git_dir)?;
        }

        let record = InstallRecord {
            name: meta.name.clone(),
            version: meta.version.clone(),
            source: source.map(str::to_string),
            dependencies: meta.dependencies.clone(),
            content_hash: tree_digest(&tmp)?,
            mirrored_at: OffsetDateTime::now_utc()
                .format(&Rfc3339)
                .unwrap_or_default(),
        };
        let record_json = serde_json::to_string_pretty(&record)
            .map_err(std::io::Error::other)?;
        fs::write(tmp.join(RECORD_FILE), record_json)?;

        if dest.exists() {
            // Stale directory with no readable record from an interrupted
            // run; replace it wholesale.
            fs::remove_dir_all(&dest)?;
        }
        fs::rename(&tmp, &dest)?;
        index.insert(key);
        Ok(true)
    }

    /// All install records, in name-version order.
    pub fn records(&self) -> Result<Vec<InstallRecord>> {
        let mut out = Vec::new();
        let index = self.index.lock();
        for (name, version) in index.iter() {
            let record_path = self.cookbook_path(name, version).join(RECORD_FILE);
            let txt = fs::read_to_string(&record_path)?;
            let record: InstallRecord =
                serde_json::from_str(&txt).map_err(std::io::Error::other)?;
            out.push(record);
        }
        Ok(out)
    }
}

/// Content digest over a cookbook tree: relative paths and file bytes in
/// sorted order. The install record file itself is excluded.
pub fn tree_digest(root: &Path) -> Result<String> {
    let mut hasher = Sha256::new();
    for entry in WalkDir::new(root).sort_by_file_name().follow_links(false) {
        let entry = entry.map_err(std::io::Error::other)?;
        if !entry.file_type().is_file() {
            continue;
        }
        let rel = entry
            .path()
            .strip_prefix(root)
            .map_err(std::io::Error::other)?;
        if rel == Path::new(RECORD_FILE) {
            continue;
        }
        hasher.update(rel.to_string_lossy().as_bytes());
        hasher.update([0]);
        hasher.update(fs::read(entry.path())?);
    }
    Ok(hex::encode(hasher.finalize()))
}
