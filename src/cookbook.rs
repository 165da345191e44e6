use crate::error::{MirrorError, Result};
use crate::graph::constraint::Constraint;
use crate::graph::Dependency;
use semver::Version;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

pub const METADATA_FILE: &str = "metadata.json";

/// A cookbook's own declared metadata, as read from its `metadata.json`.
/// For location-pinned requirements this document is authoritative: its
/// version and dependency list take precedence over anything a catalog
/// reports for the same name.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CookbookMetadata {
    pub name: String,
    pub version: String,
    #[serde(default)]
    pub dependencies: BTreeMap<String, String>,
}

impl CookbookMetadata {
    pub fn load(cookbook_dir: &Path) -> Result<Self> {
        let path = cookbook_dir.join(METADATA_FILE);
        let txt = fs::read_to_string(&path)
            .map_err(|e| MirrorError::metadata(&path, format!("unreadable: {e}")))?;
        let meta: CookbookMetadata =
            serde_json::from_str(&txt).map_err(|e| MirrorError::metadata(&path, e))?;
        if meta.name.is_empty() {
            return Err(MirrorError::metadata(&path, "cookbook name is empty"));
        }
        meta.parsed_version()
            .map_err(|e| MirrorError::metadata(&path, e))?;
        Ok(meta)
    }

    pub fn parsed_version(&self) -> std::result::Result<Version, semver::Error> {
        Version::parse(&self.version)
    }

    /// Parse the declared dependency constraints into graph edges.
    pub fn dependency_list(&self) -> Result<Vec<Dependency>> {
        let mut out = Vec::with_capacity(self.dependencies.len());
        for (name, raw) in &self.dependencies {
            let constraint = Constraint::parse(raw).map_err(|e| {
                MirrorError::Inventory(format!(
                    "cookbook '{}' declares dependency '{name}' with bad constraint '{raw}': {e}",
                    self.name
                ))
            })?;
            out.push(Dependency {
                name: name.clone(),
                constraint,
            });
        }
        Ok(out)
    }
}
