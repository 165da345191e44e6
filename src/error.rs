use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, MirrorError>;

/// Failure taxonomy for one mirror-build attempt. Every variant is surfaced
/// to the caller after the shared fetch cache has been cleared; nothing in
/// the pipeline swallows or retries these.
#[derive(Debug, Error)]
pub enum MirrorError {
    /// No version assignment satisfies every registered constraint and
    /// dependency edge. Reflects a real inconsistency in the inventory or
    /// the catalogs, so it is reported rather than retried.
    #[error("unable to resolve '{name}': no known version satisfies {constraints}")]
    Unresolvable { name: String, constraints: String },

    /// A transitively resolved version collides with an explicit top-level
    /// inventory requirement for the same cookbook.
    #[error(
        "the dependency {name}-{version} could not be installed. A cookbook listed in the \
         inventory depends on a version of '{name}' that does not match the explicit \
         requirements for the '{name}' cookbook ({required})"
    )]
    BrokenDependency {
        name: String,
        version: String,
        required: String,
    },

    /// Network, version-control, or filesystem failure while materializing
    /// an artifact. Retry policy, if any, belongs to the fetch collaborator.
    #[error("failed to fetch {what}: {reason}")]
    Fetch { what: String, reason: String },

    #[error("invalid cookbook metadata at {}: {reason}", path.display())]
    Metadata { path: PathBuf, reason: String },

    #[error("invalid inventory: {0}")]
    Inventory(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl MirrorError {
    pub fn fetch(what: impl Into<String>, reason: impl ToString) -> Self {
        MirrorError::Fetch {
            what: what.into(),
            reason: reason.to_string(),
        }
    }

    pub fn metadata(path: impl Into<PathBuf>, reason: impl ToString) -> Self {
        MirrorError::Metadata {
            path: path.into(),
            reason: reason.to_string(),
        }
    }
}
