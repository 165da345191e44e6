use semver::{Version, VersionReq};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Error)]
#[error("{0}")]
pub struct ConstraintParseError(String);

/// A version constraint as written in inventories and cookbook metadata,
/// reduced to a closed set of shapes so satisfiability checks stay
/// exhaustive. Chef-style operators (`= 1.2.0`, `>= 1.0`, `~> 1.2`) are
/// canonicalized into semver ranges before parsing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Constraint {
    /// No constraint; any version is acceptable.
    Any,
    /// Exactly one version is acceptable.
    Exact(Version),
    /// A semver range (comparator set joined by commas, all must hold).
    Range(VersionReq),
}

impl Constraint {
    pub fn parse(input: &str) -> Result<Self, ConstraintParseError> {
        let norm = canonicalize_chef_constraint(input);
        if norm == "*" {
            return Ok(Constraint::Any);
        }
        if let Some(exact) = norm.strip_prefix('=') {
            // A lone `=x.y.z` comparator is an exact pin.
            if !exact.contains(',') {
                let version = Version::parse(exact.trim()).map_err(|e| {
                    ConstraintParseError(format!("invalid version '{}': {e}", exact.trim()))
                })?;
                return Ok(Constraint::Exact(version));
            }
        }
        let req = VersionReq::from_str(&norm).map_err(|e| {
            ConstraintParseError(format!("invalid constraint '{norm}' (from '{input}'): {e}"))
        })?;
        Ok(Constraint::Range(req))
    }

    pub fn allows(&self, version: &Version) -> bool {
        match self {
            Constraint::Any => true,
            Constraint::Exact(v) => v == version,
            Constraint::Range(req) => req.matches(version),
        }
    }
}

impl fmt::Display for Constraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Constraint::Any => f.write_str(">= 0.0.0"),
            Constraint::Exact(v) => write!(f, "= {v}"),
            Constraint::Range(req) => write!(f, "{req}"),
        }
    }
}

/// Rewrite a Chef constraint string into semver comparator syntax.
///
/// Handles the pessimistic operator (`~> 1.2.3` means `>=1.2.3, <1.3.0`;
/// `~> 1.2` means `>=1.2.0, <2.0.0`), bare versions as exact pins, and
/// two-part versions padded to three. Comma-separated constraints are
/// canonicalized piecewise and conjoined.
pub fn canonicalize_chef_constraint(input: &str) -> String {
    let s = input.trim();
    if s.is_empty() || s == "*" || s == ">= 0.0.0" {
        return "*".into();
    }

    if s.contains(',') {
        let parts: Vec<String> = s
            .split(',')
            .map(canonicalize_chef_constraint)
            .filter(|p| p != "*")
            .collect();
        if parts.is_empty() {
            return "*".into();
        }
        return parts.join(", ");
    }

    // Bare version: an exact pin, padded to three components.
    if let Some(padded) = pad_version(s) {
        return format!("={padded}");
    }

    if let Some(rest) = s.strip_prefix("~>") {
        let rest = rest.trim();
        if let Some(upper) = pessimistic_upper_bound(rest) {
            let lower = pad_version(rest).unwrap_or_else(|| rest.to_string());
            return format!(">={lower}, <{upper}");
        }
        return s.to_string();
    }

    for op in [">=", "<=", ">", "<", "="] {
        if let Some(rest) = s.strip_prefix(op) {
            let rest = rest.trim();
            let padded = pad_version(rest).unwrap_or_else(|| rest.to_string());
            return format!("{op}{padded}");
        }
    }

    // Unknown shape; let the semver parser produce the error.
    s.to_string()
}

/// Pad a 1-3 part numeric version to three parts. Returns None for anything
/// that is not a plain dotted-numeric version.
fn pad_version(t: &str) -> Option<String> {
    if t.is_empty() {
        return None;
    }
    let parts: Vec<&str> = t.split('.').collect();
    if parts.len() > 3 || !parts.iter().all(|p| is_numeric(p)) {
        return None;
    }
    let mut padded: Vec<&str> = parts.clone();
    while padded.len() < 3 {
        padded.push("0");
    }
    Some(padded.join("."))
}

/// Exclusive upper bound for `~> t`: bump the second-to-last given component.
fn pessimistic_upper_bound(t: &str) -> Option<String> {
    let parts: Vec<u64> = t
        .split('.')
        .map(|p| p.parse::<u64>().ok())
        .collect::<Option<Vec<_>>>()?;
    match parts.as_slice() {
        [maj] => Some(format!("{}.0.0", maj + 1)),
        [maj, _min] => Some(format!("{}.0.0", maj + 1)),
        [maj, min, _patch] => Some(format!("{maj}.{}.0", min + 1)),
        _ => None,
    }
}

fn is_numeric(t: &str) -> bool {
    !t.is_empty() && t.chars().all(|c| c.is_ascii_digit())
}
