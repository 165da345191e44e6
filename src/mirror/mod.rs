use crate::cache::{CacheSession, FetchCache};
use crate::cookbook::CookbookMetadata;
use crate::error::{MirrorError, Result};
use crate::fetch::{Catalog, UniverseEntry};
use crate::graph::{Artifact, DependencyGraph, Origin};
use crate::graph::constraint::Constraint;
use crate::inventory::{Requirement, Requirements};
use crate::output::Output;
use crate::store::LocalStore;
use rayon::prelude::*;
use semver::Version;
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

/// What one build attempt produced. "Already installed" is a success path,
/// never a fault.
#[derive(Debug, Default)]
pub struct BuildReport {
    pub installed: Vec<(String, Version)>,
    pub already_installed: Vec<(String, Version)>,
}

enum Outcome {
    Installed,
    AlreadyInstalled,
}

/// Drives one complete mirror-build attempt.
///
/// The pipeline is strictly ordered: pinned installs, catalog ingestion,
/// requirement registration, resolution, fetch & install, cleanup. Pinned
/// requirements are fetched before any catalog data is consulted so their
/// metadata takes precedence; the shared fetch cache is cleared on every
/// exit path by the session guard.
pub struct InventoryBuilder {
    graph: DependencyGraph,
    store: LocalStore,
    catalogs: Vec<Box<dyn Catalog>>,
    catalog_index: HashMap<(String, String), (usize, UniverseEntry)>,
    requirements: Requirements,
    cache: Arc<FetchCache>,
    output: Output,
}

impl InventoryBuilder {
    pub fn new(
        mirror_dir: &Path,
        requirements: Requirements,
        catalogs: Vec<Box<dyn Catalog>>,
        cache: Arc<FetchCache>,
        output: Output,
    ) -> Result<Self> {
        Ok(Self {
            graph: DependencyGraph::new(),
            store: LocalStore::open(mirror_dir)?,
            catalogs,
            catalog_index: HashMap::new(),
            requirements,
            cache,
            output,
        })
    }

    pub fn store(&self) -> &LocalStore {
        &self.store
    }

    /// Build the mirror. The cache session guard guarantees the shared
    /// fetch cache is cleared whether this returns Ok or any error.
    pub fn build(mut self) -> Result<BuildReport> {
        let _session = CacheSession::new(Arc::clone(&self.cache));
        self.run()
    }

    fn run(&mut self) -> Result<BuildReport> {
        self.install_pinned()?;
        self.ingest_catalogs()?;
        self.register_requirements();
        let resolved = self.graph.resolved_requirements()?;
        self.fetch_and_install(&resolved)
    }

    /// Fetch every location-pinned requirement directly and install it
    /// immediately. Runs before catalog ingestion so pinned metadata,
    /// including the pinned cookbook's own dependency list, wins over
    /// anything a catalog reports for the same name.
    fn install_pinned(&mut self) -> Result<()> {
        let pinned: Vec<(String, crate::fetch::location::LocationSpec)> = self
            .requirements
            .iter()
            .filter_map(|r| r.location.clone().map(|loc| (r.name.clone(), loc)))
            .collect();
        for (req_name, location) in pinned {
            let described = location.describe();
            let fetched = location.fetch(&self.cache)?;
            let meta = &fetched.metadata;
            if meta.name != req_name {
                return Err(MirrorError::Inventory(format!(
                    "cookbook '{req_name}' fetched from {described} declares itself as '{}'",
                    meta.name
                )));
            }
            let version = meta
                .parsed_version()
                .map_err(|e| MirrorError::metadata(&fetched.path, e))?;
            self.graph.add_artifact(Artifact {
                name: meta.name.clone(),
                version,
                dependencies: meta.dependency_list()?,
                origin: Origin::Location(described.clone()),
            });
            if self
                .store
                .add_cookbook_from_path(&fetched.path, meta, Some(described.as_str()))?
            {
                self.output.say(format!(
                    "installed cookbook: {}-{} ({described})",
                    meta.name, meta.version
                ));
            }
        }
        Ok(())
    }

    /// Enumerate every configured catalog and register each advertised
    /// artifact as a resolution candidate. Installs nothing. Catalogs are
    /// independent and additive, so their order does not matter.
    fn ingest_catalogs(&mut self) -> Result<()> {
        for (idx, catalog) in self.catalogs.iter().enumerate() {
            for entry in catalog.enumerate_universe()? {
                let mut dependencies = Vec::with_capacity(entry.dependencies.len());
                let mut bad_constraint = None;
                for (dep_name, raw) in &entry.dependencies {
                    match Constraint::parse(raw) {
                        Ok(constraint) => dependencies.push(crate::graph::Dependency {
                            name: dep_name.clone(),
                            constraint,
                        }),
                        Err(e) => {
                            bad_constraint = Some(format!("dependency '{dep_name}': {e}"));
                            break;
                        }
                    }
                }
                if let Some(reason) = bad_constraint {
                    self.output.say(format!(
                        "ignoring {}-{} from {}: {reason}",
                        entry.name,
                        entry.version,
                        catalog.base()
                    ));
                    continue;
                }
                self.graph.add_artifact(Artifact {
                    name: entry.name.clone(),
                    version: entry.version.clone(),
                    dependencies,
                    origin: Origin::Catalog(catalog.base().to_string()),
                });
                self.catalog_index.insert(
                    (entry.name.clone(), entry.version.to_string()),
                    (idx, entry),
                );
            }
        }
        Ok(())
    }

    /// Register every inventory requirement's constraints, pinned ones
    /// included, so the graph's bookkeeping stays consistent. A requirement
    /// with no constraint still makes its name required.
    fn register_requirements(&mut self) {
        let reqs: Vec<Requirement> = self.requirements.iter().cloned().collect();
        for req in reqs {
            if req.constraints.is_empty() {
                self.graph.add_requirement(&req.name, Constraint::Any);
                continue;
            }
            for constraint in req.constraints {
                self.graph.add_requirement(&req.name, constraint);
            }
        }
    }

    /// Fetch and install each resolved pair. Distinct pairs are independent,
    /// so they run in parallel; the store's internal lock and the cache's
    /// request coalescing keep this safe.
    fn fetch_and_install(&self, resolved: &[(String, Version)]) -> Result<BuildReport> {
        let outcomes: Result<Vec<(String, Version, Outcome)>> = resolved
            .par_iter()
            .map(|(name, version)| {
                let outcome = self.install_resolved(name, version)?;
                Ok((name.clone(), version.clone(), outcome))
            })
            .collect();

        let mut report = BuildReport::default();
        for (name, version, outcome) in outcomes? {
            match outcome {
                Outcome::Installed => report.installed.push((name, version)),
                Outcome::AlreadyInstalled => report.already_installed.push((name, version)),
            }
        }
        Ok(report)
    }

    fn install_resolved(&self, name: &str, version: &Version) -> Result<Outcome> {
        let version_str = version.to_string();
        if self.store.installed(name, &version_str) {
            self.output
                .say(format!("cookbook already installed: {name}-{version}."));
            return Ok(Outcome::AlreadyInstalled);
        }

        self.verify_explicit_requirements(name, version)?;

        let (catalog_idx, entry) = self
            .catalog_index
            .get(&(name.to_string(), version_str.clone()))
            .ok_or_else(|| {
                MirrorError::fetch(
                    format!("{name}-{version}"),
                    "not found in any configured catalog",
                )
            })?;
        let catalog = &self.catalogs[*catalog_idx];
        let scratch = self.cache.scratch_dir(&format!("{name}-{version}"))?;
        let path = catalog.fetch_exact(name, version, &scratch)?;
        let meta = CookbookMetadata {
            name: entry.name.clone(),
            version: version_str,
            dependencies: entry.dependencies.clone(),
        };
        if self
            .store
            .add_cookbook_from_path(&path, &meta, Some(catalog.base()))?
        {
            self.output
                .say(format!("installed cookbook: {name}-{version}"));
            Ok(Outcome::Installed)
        } else {
            self.output
                .say(format!("cookbook already installed: {name}-{version}."));
            Ok(Outcome::AlreadyInstalled)
        }
    }

    /// A resolved version must still honor the explicit inventory
    /// requirements for its name: a transitive edge may demand a version of
    /// a cookbook the user pinned at top level, and silently installing the
    /// transitive choice would violate that pin.
    pub(crate) fn verify_explicit_requirements(&self, name: &str, version: &Version) -> Result<()> {
        if self.requirements.version_required(name, version) {
            return Ok(());
        }
        Err(MirrorError::BrokenDependency {
            name: name.to_string(),
            version: version.to_string(),
            required: self.requirements.describe(name),
        })
    }
}
