use crate::cookbook::CookbookMetadata;
use crate::error::{MirrorError, Result};
use crate::fetch::{Catalog, UniverseEntry};
use crate::fsutil;
use crate::output::Output;
use parking_lot::Mutex;
use semver::Version;
use std::collections::BTreeMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Write a minimal cookbook fixture (`metadata.json` plus one recipe file)
/// under `root/name-version` and return its path.
pub fn fixture_cookbook(
    root: &Path,
    name: &str,
    version: &str,
    deps: &[(&str, &str)],
) -> PathBuf {
    let dir = root.join(format!("{name}-{version}"));
    fs::create_dir_all(dir.join("recipes")).expect("create fixture dirs");
    let mut dependencies = BTreeMap::new();
    for (dep, constraint) in deps {
        dependencies.insert(dep.to_string(), constraint.to_string());
    }
    let meta = CookbookMetadata {
        name: name.to_string(),
        version: version.to_string(),
        dependencies,
    };
    fs::write(
        dir.join("metadata.json"),
        serde_json::to_string_pretty(&meta).expect("serialize metadata"),
    )
    .expect("write metadata");
    fs::write(
        dir.join("recipes").join("default.rb"),
        format!("# {name} {version}\n"),
    )
    .expect("write recipe");
    dir
}

/// Directory-backed catalog for tests: every `name-version` subdirectory of
/// `root` is one advertised artifact. No network involved.
pub struct DirCatalog {
    base: String,
    root: PathBuf,
}

impl DirCatalog {
    pub fn new(base: impl Into<String>, root: impl Into<PathBuf>) -> Self {
        Self {
            base: base.into(),
            root: root.into(),
        }
    }
}

impl Catalog for DirCatalog {
    fn base(&self) -> &str {
        &self.base
    }

    fn enumerate_universe(&self) -> Result<Vec<UniverseEntry>> {
        let mut out = Vec::new();
        for entry in fs::read_dir(&self.root)? {
            let entry = entry?;
            if !entry.file_type()?.is_dir() {
                continue;
            }
            let meta = CookbookMetadata::load(&entry.path())?;
            let version = meta
                .parsed_version()
                .map_err(|e| MirrorError::metadata(entry.path(), e))?;
            out.push(UniverseEntry {
                name: meta.name,
                version,
                dependencies: meta.dependencies,
                download_url: entry.path().display().to_string(),
            });
        }
        Ok(out)
    }

    fn fetch_exact(&self, name: &str, version: &Version, work_dir: &Path) -> Result<PathBuf> {
        let src = self.root.join(format!("{name}-{version}"));
        if !src.is_dir() {
            return Err(MirrorError::fetch(
                format!("{name}-{version}"),
                format!("not present in catalog {}", self.base),
            ));
        }
        let dest = work_dir.join("cookbook");
        fsutil::copy_tree(&src, &dest)?;
        Ok(dest)
    }
}

/// Catalog that advertises entries but fails every fetch, for exercising
/// the FetchFailure path.
pub struct FailingCatalog {
    pub entries: Vec<UniverseEntry>,
}

impl Catalog for FailingCatalog {
    fn base(&self) -> &str {
        "failing://catalog"
    }

    fn enumerate_universe(&self) -> Result<Vec<UniverseEntry>> {
        Ok(self.entries.clone())
    }

    fn fetch_exact(&self, name: &str, version: &Version, _work_dir: &Path) -> Result<PathBuf> {
        Err(MirrorError::fetch(
            format!("{name}-{version}"),
            "simulated fetch failure",
        ))
    }
}

struct CaptureSink(Arc<Mutex<Vec<u8>>>);

impl Write for CaptureSink {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.lock().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

/// An Output wired to an in-memory buffer, plus a handle to read what was
/// said.
pub fn capture_output() -> (Output, Arc<Mutex<Vec<u8>>>) {
    let buffer = Arc::new(Mutex::new(Vec::new()));
    let output = Output::sink(Box::new(CaptureSink(Arc::clone(&buffer))));
    (output, buffer)
}

pub fn captured_text(buffer: &Arc<Mutex<Vec<u8>>>) -> String {
    String::from_utf8_lossy(&buffer.lock()).into_owned()
}
