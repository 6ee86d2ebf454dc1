//! Matrix Placeholder Expansion
//!
//! Turns job-name templates into the check-run names GitHub reports:
//! - Detects the first `${{ matrix.<axis> }}` placeholder in a name
//! - Produces one name per value of that axis, in declaration order
//! - Leaves names without a placeholder untouched
//!
//! Names are never sorted or deduplicated. Output order is workflow order,
//! then job order, then matrix value order.

use log::{debug, info};
use once_cell::sync::Lazy;
use regex::{NoExpand, Regex};

use super::model::{JobDefinition, WorkflowDocument};
use crate::error::{ExpansionError, UnboundCause};

/// `${{ matrix.<axis> }}`, whitespace inside the braces is optional.
static MATRIX_PLACEHOLDER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\$\{\{\s*matrix\.(?P<name>\w+)\s*\}\}").expect("placeholder pattern is valid")
});

/// Returns the axis named by the first matrix placeholder in a template.
///
/// # Example
/// ```
/// use grc::workflow::matrix::find_placeholder;
///
/// assert_eq!(find_placeholder("test (${{ matrix.os }})"), Some("os"));
/// assert_eq!(find_placeholder("lint"), None);
/// ```
pub fn find_placeholder(template: &str) -> Option<&str> {
    MATRIX_PLACEHOLDER
        .captures(template)
        .and_then(|caps| caps.name("name"))
        .map(|m| m.as_str())
}

/// Expands one job into the names of the check runs it produces.
///
/// When the name references an axis, every placeholder in the name is
/// replaced by each value of that one axis in turn, even placeholders
/// that reference other axes.
// TODO: offer a cross-product expansion (each placeholder bound to its own
// axis) behind a compatibility flag once callers can opt in.
pub fn expand_job(job_id: &str, job: &JobDefinition) -> Result<Vec<String>, ExpansionError> {
    let Some(axis) = find_placeholder(&job.name) else {
        return Ok(vec![job.name.clone()]);
    };

    let unbound = |cause| ExpansionError::UnboundPlaceholder {
        job_id: job_id.to_string(),
        template: job.name.clone(),
        axis: axis.to_string(),
        cause,
    };

    let matrix = job.matrix().ok_or_else(|| unbound(UnboundCause::NoMatrix))?;
    let values = match matrix.axis(axis) {
        Some(values) => values,
        None if matrix.is_unlisted(axis) => return Err(unbound(UnboundCause::UnlistedAxis)),
        None => return Err(unbound(UnboundCause::UnknownAxis)),
    };

    let names: Vec<String> = values
        .iter()
        .map(|value| substitute_placeholders(&job.name, value))
        .collect();

    debug!(
        "Job '{}': expanded matrix.{} into {} names: {:?}",
        job_id,
        axis,
        names.len(),
        names
    );

    Ok(names)
}

/// Expands every job of one workflow document, in job order.
pub fn expand_document(document: &WorkflowDocument) -> Result<Vec<String>, ExpansionError> {
    let mut names = Vec::with_capacity(document.len());
    for (job_id, job) in &document.jobs {
        names.extend(expand_job(job_id, job)?);
    }
    Ok(names)
}

/// Expands all documents into one flat, ordered list of check names.
///
/// Stops at the first contract violation; no partial result is returned.
pub fn expand_documents(documents: &[WorkflowDocument]) -> Result<Vec<String>, ExpansionError> {
    let mut names = Vec::new();
    for document in documents {
        let expanded = expand_document(document)?;
        debug!(
            "Workflow '{}': {} jobs -> {} check names",
            document.source,
            document.len(),
            expanded.len()
        );
        names.extend(expanded);
    }

    info!(
        "Expanded {} workflows into {} check names",
        documents.len(),
        names.len()
    );
    Ok(names)
}

/// Replaces every placeholder in `template` with `value`, taken literally.
fn substitute_placeholders(template: &str, value: &str) -> String {
    MATRIX_PLACEHOLDER
        .replace_all(template, NoExpand(value))
        .into_owned()
}
