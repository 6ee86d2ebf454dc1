//! Workflow Parser
//!
//! Converts raw workflow YAML into a [`WorkflowDocument`], checking the
//! fields job-name expansion depends on while parsing rather than when a
//! name is expanded.

use log::debug;
use serde::Deserialize;
use serde_yaml::{Mapping, Value};

use super::model::{scalar_to_string, JobDefinition, Strategy, WorkflowDocument};
use crate::error::{ExpansionError, GrcError, Result};

/// Top level of a workflow file. Everything but `jobs` is ignored.
#[derive(Deserialize)]
struct RawWorkflow {
    #[serde(default)]
    jobs: Option<Mapping>,
}

#[derive(Deserialize)]
struct RawJob {
    #[serde(default)]
    name: Option<Value>,

    #[serde(default)]
    strategy: Option<Strategy>,
}

/// Parses workflow YAML text.
///
/// # Arguments
///
/// * `source` - Name of the file the text came from, used in errors
/// * `contents` - Raw YAML
///
/// # Example
///
/// ```
/// use grc::workflow::parse_workflow;
///
/// let doc = parse_workflow("ci.yml", "jobs:\n  lint:\n    name: lint\n").unwrap();
/// assert_eq!(doc.jobs[0].1.name, "lint");
/// ```
pub fn parse_workflow(source: &str, contents: &str) -> Result<WorkflowDocument> {
    debug!("Parsing workflow '{}' ({} bytes)", source, contents.len());

    let raw: RawWorkflow = serde_yaml::from_str(contents).map_err(|e| GrcError::WorkflowParse {
        workflow: source.to_string(),
        error: e,
    })?;

    let jobs = raw.jobs.ok_or_else(|| GrcError::InvalidWorkflow {
        workflow: source.to_string(),
        reason: "no 'jobs' mapping".to_string(),
    })?;

    let mut document = WorkflowDocument::new(source);
    for (key, value) in jobs {
        let job_id = scalar_to_string(&key).ok_or_else(|| GrcError::InvalidWorkflow {
            workflow: source.to_string(),
            reason: format!("job key {:?} is not a scalar", key),
        })?;

        let job = parse_job(source, &job_id, value)?;
        document.jobs.push((job_id, job));
    }

    debug!("Workflow '{}' declares {} jobs", source, document.len());
    Ok(document)
}

/// Builds one [`JobDefinition`], rejecting jobs without a display name.
fn parse_job(source: &str, job_id: &str, value: Value) -> Result<JobDefinition> {
    let missing_name = || ExpansionError::MissingName {
        workflow: source.to_string(),
        job_id: job_id.to_string(),
    };

    // `build:` with an empty body
    if value.is_null() {
        return Err(missing_name().into());
    }

    let raw: RawJob = serde_yaml::from_value(value).map_err(|e| GrcError::WorkflowParse {
        workflow: source.to_string(),
        error: e,
    })?;

    // A display name is a string; `name: 42` or `name: {..}` is not one
    let name = match raw.name {
        Some(Value::String(name)) => name,
        _ => return Err(missing_name().into()),
    };

    Ok(JobDefinition {
        name,
        strategy: raw.strategy,
    })
}
