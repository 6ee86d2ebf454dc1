//! Branch Protection Payloads
//!
//! Wire types for the `required_status_checks` endpoint of the GitHub
//! branch protection API.

use serde::{Deserialize, Serialize};

/// One required status check, identified by its context (check-run name).
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Check {
    pub context: String,
}

/// Body of `PATCH .../protection/required_status_checks`.
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct RequiredStatusChecks {
    /// Require branches to be up to date before merging
    pub strict: bool,

    pub checks: Vec<Check>,
}

impl RequiredStatusChecks {
    /// Builds the payload from check names, keeping their order.
    pub fn new(names: &[String], strict: bool) -> Self {
        Self {
            strict,
            checks: names
                .iter()
                .map(|name| Check {
                    context: name.clone(),
                })
                .collect(),
        }
    }
}

/// Response of `GET .../protection/required_status_checks`.
///
/// Older protection rules only fill the deprecated `contexts` list.
#[derive(Deserialize, Debug, Default)]
pub(crate) struct CurrentStatusChecks {
    #[serde(default)]
    pub checks: Vec<Check>,

    #[serde(default)]
    pub contexts: Vec<String>,
}

impl CurrentStatusChecks {
    /// Context names, preferring `checks` over `contexts`.
    pub fn into_contexts(self) -> Vec<String> {
        if self.checks.is_empty() {
            self.contexts
        } else {
            self.checks.into_iter().map(|c| c.context).collect()
        }
    }
}
