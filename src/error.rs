//! Collaborator failure types.
//!
//! Every metrics source returns `SourceResult<T>`; the sampler inspects the
//! error only to log it and pick the field's fallback value.

use thiserror::Error;

pub type SourceResult<T> = std::result::Result<T, SourceError>;

/// Coarse failure category, used for logging and tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceErrorKind {
    /// The source could not produce a reading (missing file, absent tool, permission denied).
    Unavailable,
    /// The source produced data that did not parse as expected.
    Malformed,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SourceError {
    #[error("{origin} unavailable: {reason}")]
    Unavailable { origin: &'static str, reason: String },

    #[error("{origin} returned malformed data: {reason}")]
    Malformed { origin: &'static str, reason: String },
}

impl SourceError {
    pub fn unavailable(origin: &'static str, reason: impl Into<String>) -> Self {
        SourceError::Unavailable {
            origin,
            reason: reason.into(),
        }
    }

    pub fn malformed(origin: &'static str, reason: impl Into<String>) -> Self {
        SourceError::Malformed {
            origin,
            reason: reason.into(),
        }
    }

    pub fn kind(&self) -> SourceErrorKind {
        match self {
            SourceError::Unavailable { .. } => SourceErrorKind::Unavailable,
            SourceError::Malformed { .. } => SourceErrorKind::Malformed,
        }
    }

    /// Name of the collaborator that failed (e.g. "cpu_counters").
    pub fn origin(&self) -> &'static str {
        match self {
            SourceError::Unavailable { origin, .. } | SourceError::Malformed { origin, .. } => {
                origin
            }
        }
    }
}
