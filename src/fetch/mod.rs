use crate::error::{MirrorError, Result};
use flate2::read::GzDecoder;
use once_cell::sync::{Lazy, OnceCell};
use reqwest::blocking::Client;
use semver::Version;
use serde::Deserialize;
use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tar::Archive;

pub mod location;

static CLIENT: Lazy<Client> = Lazy::new(|| {
    Client::builder()
        .timeout(Duration::from_secs(30))
        .user_agent("bodega/0.1.0 (+https://github.com/bodega-mirror/bodega)")
        .build()
        .expect("http client")
});

/// One (name, version) entry from a catalog's universe.
#[derive(Debug, Clone)]
pub struct UniverseEntry {
    pub name: String,
    pub version: Version,
    pub dependencies: BTreeMap<String, String>,
    pub download_url: String,
}

/// A remote catalog's two-operation contract: enumerate everything it knows,
/// and materialize one exact (name, version).
pub trait Catalog: Send + Sync {
    /// Identity used in origin labels and error messages.
    fn base(&self) -> &str;

    fn enumerate_universe(&self) -> Result<Vec<UniverseEntry>>;

    /// Fetch one exact artifact into `work_dir` and return the cookbook root
    /// (the directory containing its metadata).
    fn fetch_exact(&self, name: &str, version: &Version, work_dir: &Path) -> Result<PathBuf>;
}

/// Chef Supermarket-style catalog: `GET {base}/universe` yields
/// name -> version -> { download_url, dependencies, ... }; artifacts are
/// gzipped tarballs at the advertised download URL.
pub struct HttpCatalog {
    base: String,
    universe: OnceCell<HashMap<(String, String), UniverseEntry>>,
}

#[derive(Debug, Deserialize)]
struct UniverseVersion {
    download_url: String,
    #[serde(default)]
    dependencies: BTreeMap<String, String>,
}

impl HttpCatalog {
    pub fn new(base: impl Into<String>) -> Self {
        let base = base.into().trim_end_matches('/').to_string();
        Self {
            base,
            universe: OnceCell::new(),
        }
    }

    fn universe_index(&self) -> Result<&HashMap<(String, String), UniverseEntry>> {
        self.universe.get_or_try_init(|| {
            let url = format!("{}/universe", self.base);
            let resp = CLIENT
                .get(&url)
                .send()
                .map_err(|e| MirrorError::fetch(&url, e))?;
            if !resp.status().is_success() {
                return Err(MirrorError::fetch(
                    &url,
                    format!("catalog returned {}", resp.status()),
                ));
            }
            let raw: HashMap<String, HashMap<String, UniverseVersion>> =
                resp.json().map_err(|e| MirrorError::fetch(&url, e))?;
            let mut index = HashMap::new();
            for (name, versions) in raw {
                for (version_str, entry) in versions {
                    // Skip versions the catalog advertises in a shape we
                    // cannot order.
                    let Ok(version) = Version::parse(&version_str) else {
                        continue;
                    };
                    index.insert(
                        (name.clone(), version_str),
                        UniverseEntry {
                            name: name.clone(),
                            version,
                            dependencies: entry.dependencies,
                            download_url: entry.download_url,
                        },
                    );
                }
            }
            Ok(index)
        })
    }
}

impl Catalog for HttpCatalog {
    fn base(&self) -> &str {
        &self.base
    }

    fn enumerate_universe(&self) -> Result<Vec<UniverseEntry>> {
        Ok(self.universe_index()?.values().cloned().collect())
    }

    fn fetch_exact(&self, name: &str, version: &Version, work_dir: &Path) -> Result<PathBuf> {
        let key = (name.to_string(), version.to_string());
        let entry = self.universe_index()?.get(&key).ok_or_else(|| {
            MirrorError::fetch(
                format!("{name}-{version}"),
                format!("not present in catalog {}", self.base),
            )
        })?;
        let resp = CLIENT
            .get(&entry.download_url)
            .send()
            .map_err(|e| MirrorError::fetch(&entry.download_url, e))?;
        if !resp.status().is_success() {
            return Err(MirrorError::fetch(
                &entry.download_url,
                format!("status {}", resp.status()),
            ));
        }
        let bytes = resp
            .bytes()
            .map_err(|e| MirrorError::fetch(&entry.download_url, e))?;
        extract_tarball(&bytes, work_dir)?;
        Ok(cookbook_root(work_dir))
    }
}

/// Unpack a gzipped tarball under `dest`, refusing entries that escape the
/// destination. Supermarket tarballs carry a single `<name>/` top directory;
/// `cookbook_root` resolves it after extraction.
pub fn extract_tarball(bytes: &[u8], dest: &Path) -> Result<()> {
    let gz = GzDecoder::new(bytes);
    let mut ar = Archive::new(gz);
    for entry in ar.entries()? {
        let mut e = entry?;
        let path = e.path()?.into_owned();
        if path
            .components()
            .any(|c| matches!(c, std::path::Component::ParentDir))
        {
            continue;
        }
        if path.as_os_str().is_empty() {
            continue;
        }
        let dest_path = dest.join(&path);
        if let Some(parent) = dest_path.parent() {
            fs::create_dir_all(parent)?;
        }
        e.unpack(&dest_path)?;
    }
    Ok(())
}

/// Supermarket tarballs usually extract as `<name>/...`. If the directory
/// holds exactly one child directory with cookbook metadata inside, that
/// child is the cookbook root.
pub fn cookbook_root(dir: &Path) -> PathBuf {
    let entries: Vec<_> = match fs::read_dir(dir) {
        Ok(rd) => rd.flatten().collect(),
        Err(_) => return dir.to_path_buf(),
    };
    if entries.len() == 1 {
        let only = entries[0].path();
        if only.is_dir() && only.join(crate::cookbook::METADATA_FILE).exists() {
            return only;
        }
    }
    dir.to_path_buf()
}
