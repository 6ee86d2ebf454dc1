//! Local Workflow Source
//!
//! Reads workflow files from a checkout on disk instead of the API.
//! Useful for previewing the check list of an unpushed change.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use log::{debug, info};
use tokio::fs;

use super::{is_workflow_file, RawWorkflow, WorkflowSource};
use crate::error::{GrcError, Result};

/// Workflow files from a directory, typically `<checkout>/.github/workflows`.
#[derive(Debug, Clone)]
pub struct LocalWorkflowSource {
    dir: PathBuf,
}

impl LocalWorkflowSource {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

fn io_error(path: &Path) -> impl FnOnce(std::io::Error) -> GrcError + '_ {
    move |error| GrcError::Io {
        path: path.to_path_buf(),
        error,
    }
}

#[async_trait]
impl WorkflowSource for LocalWorkflowSource {
    /// Returns `*.yml` and `*.yaml` files sorted by file name.
    async fn fetch_workflows(&self) -> Result<Vec<RawWorkflow>> {
        let mut entries = fs::read_dir(&self.dir).await.map_err(io_error(&self.dir))?;

        let mut paths = Vec::new();
        while let Some(entry) = entries.next_entry().await.map_err(io_error(&self.dir))? {
            let path = entry.path();
            let file_type = entry.file_type().await.map_err(io_error(&path))?;
            let is_workflow = path
                .file_name()
                .and_then(|n| n.to_str())
                .is_some_and(is_workflow_file);

            if file_type.is_file() && is_workflow {
                paths.push(path);
            } else {
                debug!("Skipping {}", path.display());
            }
        }
        paths.sort();

        let mut workflows = Vec::with_capacity(paths.len());
        for path in paths {
            let contents = fs::read_to_string(&path).await.map_err(io_error(&path))?;
            let name = path
                .file_name()
                .and_then(|n| n.to_str())
                .unwrap_or_default()
                .to_string();
            workflows.push(RawWorkflow::new(name, contents));
        }

        info!(
            "Read {} workflow files from {}",
            workflows.len(),
            self.dir.display()
        );
        Ok(workflows)
    }
}
