//! Error Types
//!
//! Every failure in grc is fatal: expansion stops at the first contract
//! violation and nothing is published. [`ExpansionError`] covers the core
//! job-name expansion, [`GrcError`] wraps it together with the I/O and API
//! failures of the surrounding pipeline.

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

/// Why a placeholder could not be bound to a matrix axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnboundCause {
    /// The job declares no `strategy.matrix` at all.
    NoMatrix,
    /// The matrix exists but has no entry for the referenced axis.
    UnknownAxis,
    /// The axis exists but its value is not a list of scalars.
    UnlistedAxis,
}

impl fmt::Display for UnboundCause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoMatrix => write!(f, "the job declares no matrix strategy"),
            Self::UnknownAxis => write!(f, "the matrix declares no such axis"),
            Self::UnlistedAxis => write!(f, "the axis has no static list of scalar values"),
        }
    }
}

/// Contract violations detected while turning job definitions into names.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExpansionError {
    #[error("{workflow}: job '{job_id}' has no name")]
    MissingName { workflow: String, job_id: String },

    #[error("job '{job_id}': name '{template}' references matrix.{axis} but {cause}")]
    UnboundPlaceholder {
        job_id: String,
        template: String,
        axis: String,
        cause: UnboundCause,
    },
}

/// Top-level error for a synchronisation run.
#[derive(Debug, Error)]
pub enum GrcError {
    #[error(transparent)]
    Expansion(#[from] ExpansionError),

    #[error("failed to parse workflow '{workflow}': {error}")]
    WorkflowParse {
        workflow: String,
        #[source]
        error: serde_yaml::Error,
    },

    #[error("invalid workflow '{workflow}': {reason}")]
    InvalidWorkflow { workflow: String, reason: String },

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("GitHub API returned {status} for {url}: {message}")]
    Api {
        status: u16,
        url: String,
        message: String,
    },

    #[error("failed to read '{}': {error}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        error: std::io::Error,
    },

    #[error("configuration error: {0}")]
    Config(String),
}

/// Result alias used throughout the crate.
pub type Result<T, E = GrcError> = std::result::Result<T, E>;
