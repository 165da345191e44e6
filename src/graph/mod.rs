use crate::error::{MirrorError, Result};
use semver::Version;
use std::collections::BTreeMap;

pub mod constraint;

use constraint::Constraint;

/// Where an artifact's metadata came from. Location-sourced artifacts are
/// pinned: their resolved version is never subject to graph solving.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Origin {
    Catalog(String),
    Location(String),
}

impl Origin {
    pub fn is_pinned(&self) -> bool {
        matches!(self, Origin::Location(_))
    }
}

#[derive(Debug, Clone)]
pub struct Dependency {
    pub name: String,
    pub constraint: Constraint,
}

/// A concrete, versioned cookbook candidate known to the graph.
#[derive(Debug, Clone)]
pub struct Artifact {
    pub name: String,
    pub version: Version,
    pub dependencies: Vec<Dependency>,
    pub origin: Origin,
}

/// In-memory model of candidate artifacts and active requirements.
///
/// Resolution is closure computation over a monotonically growing constraint
/// set: start from the explicit requirements, walk each selected artifact's
/// dependency edges, add each edge as a derived constraint, and repeat until
/// nothing new is produced. When several candidate versions satisfy every
/// accumulated constraint the newest wins; pinned artifacts are fixed points
/// and always win over catalog candidates of the same name.
#[derive(Debug, Default)]
pub struct DependencyGraph {
    candidates: BTreeMap<String, BTreeMap<Version, Artifact>>,
    pinned: BTreeMap<String, Version>,
    requirements: BTreeMap<String, Vec<Constraint>>,
}

impl DependencyGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a discovered artifact as a candidate for its name. Does not
    /// trigger resolution. A pinned artifact shadows every catalog candidate
    /// of the same name, including ones registered later.
    pub fn add_artifact(&mut self, artifact: Artifact) {
        let name = artifact.name.clone();
        if artifact.origin.is_pinned() {
            self.pinned.insert(name.clone(), artifact.version.clone());
            let versions = self.candidates.entry(name).or_default();
            versions.clear();
            versions.insert(artifact.version.clone(), artifact);
            return;
        }
        if self.pinned.contains_key(&name) {
            return;
        }
        self.candidates
            .entry(name)
            .or_default()
            .insert(artifact.version.clone(), artifact);
    }

    /// Merge a constraint into the named requirement set. Repeated calls for
    /// one name conjoin; unsatisfiable conjunctions surface at resolution
    /// time, not here.
    pub fn add_requirement(&mut self, name: &str, constraint: Constraint) {
        let set = self.requirements.entry(name.to_string()).or_default();
        if !set.contains(&constraint) {
            set.push(constraint);
        }
    }

    /// Compute the version assignment satisfying every constraint and every
    /// dependency edge transitively reachable from the requirement set.
    /// Returned in name order, exactly one version per required name.
    pub fn resolved_requirements(&self) -> Result<Vec<(String, Version)>> {
        let mut accumulated = self.requirements.clone();
        loop {
            let mut selection: BTreeMap<String, Version> = BTreeMap::new();
            for (name, constraints) in &accumulated {
                selection.insert(name.clone(), self.select(name, constraints)?);
            }

            let mut grew = false;
            for (name, version) in &selection {
                let Some(artifact) = self.candidates.get(name).and_then(|m| m.get(version))
                else {
                    continue;
                };
                for dep in &artifact.dependencies {
                    let set = accumulated.entry(dep.name.clone()).or_default();
                    if !set.contains(&dep.constraint) {
                        set.push(dep.constraint.clone());
                        grew = true;
                    }
                }
            }
            if !grew {
                return Ok(selection.into_iter().collect());
            }
        }
    }

    /// Pick the version for one name under the given accumulated constraints.
    fn select(&self, name: &str, constraints: &[Constraint]) -> Result<Version> {
        if let Some(version) = self.pinned.get(name) {
            return Ok(version.clone());
        }
        let versions = self
            .candidates
            .get(name)
            .ok_or_else(|| MirrorError::Unresolvable {
                name: name.to_string(),
                constraints: describe_constraints(constraints),
            })?;
        versions
            .keys()
            .rev()
            .find(|v| constraints.iter().all(|c| c.allows(v)))
            .cloned()
            .ok_or_else(|| MirrorError::Unresolvable {
                name: name.to_string(),
                constraints: describe_constraints(constraints),
            })
    }
}

fn describe_constraints(constraints: &[Constraint]) -> String {
    if constraints.is_empty() {
        return "(any version)".into();
    }
    constraints
        .iter()
        .map(|c| format!("'{c}'"))
        .collect::<Vec<_>>()
        .join(" and ")
}
