use crate::error::{MirrorError, Result};
use crate::fetch::location::LocationSpec;
use crate::graph::constraint::Constraint;
use semver::Version;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

/// The parsed inventory declaration: catalog endpoints plus the explicit
/// cookbook requirements for one mirror-build run.
#[derive(Debug)]
pub struct Inventory {
    pub sources: Vec<String>,
    pub requirements: Requirements,
}

/// One named requirement from the inventory. A requirement carrying a
/// location is pinned: its resolved version comes from the fetched
/// cookbook's own metadata, not from graph solving.
#[derive(Debug, Clone)]
pub struct Requirement {
    pub name: String,
    pub constraints: Vec<Constraint>,
    pub location: Option<LocationSpec>,
}

#[derive(Debug, Clone, Default)]
pub struct Requirements(Vec<Requirement>);

#[derive(Debug, Deserialize)]
struct InventoryFile {
    #[serde(default)]
    sources: Vec<String>,
    #[serde(default)]
    cookbooks: BTreeMap<String, CookbookEntry>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(deny_unknown_fields)]
struct CookbookEntry {
    #[serde(default)]
    versions: Vec<String>,
    #[serde(default)]
    git: Option<GitEntry>,
    #[serde(default)]
    path: Option<PathEntry>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct GitEntry {
    location: String,
    #[serde(default, rename = "ref")]
    reference: Option<String>,
    #[serde(default)]
    branch: Option<String>,
    #[serde(default)]
    tag: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct PathEntry {
    location: PathBuf,
}

impl Inventory {
    pub fn load(path: &Path) -> Result<Self> {
        let txt = fs::read_to_string(path).map_err(|e| {
            MirrorError::Inventory(format!("unable to read {}: {e}", path.display()))
        })?;
        Self::parse(&txt, path.parent().unwrap_or(Path::new(".")))
    }

    /// Parse inventory YAML. Relative path locations are resolved against
    /// `base_dir` (the inventory file's directory).
    pub fn parse(yaml: &str, base_dir: &Path) -> Result<Self> {
        let file: InventoryFile =
            serde_yaml::from_str(yaml).map_err(|e| MirrorError::Inventory(e.to_string()))?;
        let mut requirements = Vec::new();
        for (name, entry) in file.cookbooks {
            let mut constraints = Vec::new();
            for raw in &entry.versions {
                let constraint = Constraint::parse(raw).map_err(|e| {
                    MirrorError::Inventory(format!("cookbook '{name}': {e}"))
                })?;
                constraints.push(constraint);
            }
            let location = entry_location(&name, entry)?;
            if let Some(LocationSpec::Path { path }) = &location {
                let resolved = if path.is_relative() {
                    base_dir.join(path)
                } else {
                    path.clone()
                };
                requirements.push(Requirement {
                    name,
                    constraints,
                    location: Some(LocationSpec::Path { path: resolved }),
                });
                continue;
            }
            requirements.push(Requirement {
                name,
                constraints,
                location,
            });
        }
        Ok(Self {
            sources: file.sources,
            requirements: Requirements(requirements),
        })
    }
}

fn entry_location(name: &str, entry: CookbookEntry) -> Result<Option<LocationSpec>> {
    match (entry.git, entry.path) {
        (Some(_), Some(_)) => Err(MirrorError::Inventory(format!(
            "cookbook '{name}' declares both a git and a path location"
        ))),
        (Some(git), None) => {
            let reference = git.reference.or(git.branch).or(git.tag);
            Ok(Some(LocationSpec::Git {
                url: git.location,
                reference,
            }))
        }
        (None, Some(path)) => Ok(Some(LocationSpec::Path {
            path: path.location,
        })),
        (None, None) => Ok(None),
    }
}

impl Requirements {
    pub fn new(requirements: Vec<Requirement>) -> Self {
        Self(requirements)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Requirement> {
        self.0.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Whether installing (name, version) honors the explicit inventory
    /// requirements. Names the inventory never mentions are unconstrained;
    /// a mentioned name must satisfy every declared constraint.
    pub fn version_required(&self, name: &str, version: &Version) -> bool {
        match self.0.iter().find(|r| r.name == name) {
            None => true,
            Some(req) => req.constraints.iter().all(|c| c.allows(version)),
        }
    }

    /// Render a requirement's constraints for error messages.
    pub fn describe(&self, name: &str) -> String {
        match self.0.iter().find(|r| r.name == name) {
            Some(req) if !req.constraints.is_empty() => req
                .constraints
                .iter()
                .map(|c| format!("'{c}'"))
                .collect::<Vec<_>>()
                .join(" and "),
            _ => "(any version)".into(),
        }
    }
}
