//! GitHub Collaborators
//!
//! The two seams the synchroniser talks through: a [`WorkflowSource`] that
//! yields raw workflow files and a [`ProtectionSink`] that owns a branch's
//! required status checks.
//!
//! # Implementations
//!
//! - [`GitHubClient`]: both traits over the GitHub REST API
//! - [`LocalWorkflowSource`]: workflow files from a local checkout

pub mod client;
pub mod local;
pub mod protection;

use async_trait::async_trait;

use crate::error::Result;

pub use client::GitHubClient;
pub use local::LocalWorkflowSource;
pub use protection::{Check, RequiredStatusChecks};

/// Directory GitHub Actions reads workflows from, relative to the repo root.
pub const WORKFLOWS_DIR: &str = ".github/workflows";

/// Unparsed contents of one workflow file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawWorkflow {
    /// File name, e.g. `ci.yml`
    pub name: String,

    /// YAML text
    pub contents: String,
}

impl RawWorkflow {
    pub fn new(name: impl Into<String>, contents: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            contents: contents.into(),
        }
    }
}

/// Produces the workflow files of a repository, in a stable order.
#[async_trait]
pub trait WorkflowSource: Send + Sync {
    async fn fetch_workflows(&self) -> Result<Vec<RawWorkflow>>;
}

/// Reads and replaces a branch's required status checks.
#[async_trait]
pub trait ProtectionSink: Send + Sync {
    /// Contexts currently required on `branch`; empty when none are set.
    async fn current_checks(&self, branch: &str) -> Result<Vec<String>>;

    /// Replaces the required contexts on `branch` with exactly `checks`.
    async fn replace_checks(&self, branch: &str, checks: &[String], strict: bool) -> Result<()>;
}

/// Checks whether a file name looks like a workflow definition.
pub fn is_workflow_file(name: &str) -> bool {
    name.ends_with(".yml") || name.ends_with(".yaml")
}
