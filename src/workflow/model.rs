//! Workflow Data Model
//!
//! The parts of a GitHub Actions workflow that decide which check runs
//! appear on a commit: the job table, each job's display name, and the
//! matrix its name may refer to.
//!
//! # Example YAML Format
//!
//! ```yaml
//! jobs:
//!   lint:
//!     name: lint
//!     runs-on: ubuntu-latest
//!
//!   test:
//!     name: test (${{ matrix.os }})
//!     strategy:
//!       matrix:
//!         os: [ubuntu-latest, macos-latest]
//! ```

use log::{debug, warn};
use serde::de::{self, Deserializer};
use serde::Deserialize;
use serde_yaml::Value;

/// One parsed workflow file.
///
/// Jobs keep the order in which they appear in the YAML document.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct WorkflowDocument {
    /// File name the document was parsed from (diagnostics only)
    pub source: String,

    /// Job id -> definition, in document order
    pub jobs: Vec<(String, JobDefinition)>,
}

impl WorkflowDocument {
    /// Creates an empty document for the given source file.
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            jobs: Vec::new(),
        }
    }

    /// Appends a job, keeping insertion order.
    pub fn with_job(mut self, id: impl Into<String>, job: JobDefinition) -> Self {
        self.jobs.push((id.into(), job));
        self
    }

    /// Looks up a job by id.
    pub fn job(&self, id: &str) -> Option<&JobDefinition> {
        self.jobs
            .iter()
            .find(|(job_id, _)| job_id == id)
            .map(|(_, job)| job)
    }

    /// Returns the number of jobs in the document.
    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    /// Checks if the document declares no jobs.
    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }
}

/// A single job: its display-name template and optional strategy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobDefinition {
    /// Display-name template, may contain `${{ matrix.<axis> }}`
    pub name: String,

    /// Build strategy, absent means "no matrix"
    pub strategy: Option<Strategy>,
}

impl JobDefinition {
    /// Creates a job with no strategy.
    ///
    /// # Example
    ///
    /// ```
    /// use grc::workflow::{JobDefinition, Matrix};
    ///
    /// let job = JobDefinition::new("test (${{ matrix.os }})")
    ///     .with_matrix(Matrix::new().with_axis("os", ["ubuntu-latest", "macos-latest"]));
    /// assert_eq!(job.matrix().and_then(|m| m.axis("os")).map(|v| v.len()), Some(2));
    /// ```
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            strategy: None,
        }
    }

    /// Sets a strategy holding the given matrix.
    pub fn with_matrix(mut self, matrix: Matrix) -> Self {
        self.strategy = Some(Strategy {
            matrix: Some(matrix),
        });
        self
    }

    /// Sets the strategy as-is (including a strategy with no matrix).
    pub fn with_strategy(mut self, strategy: Strategy) -> Self {
        self.strategy = Some(strategy);
        self
    }

    /// Returns the job's matrix, if it declares one.
    pub fn matrix(&self) -> Option<&Matrix> {
        self.strategy.as_ref().and_then(|s| s.matrix.as_ref())
    }
}

/// `strategy:` block of a job. Only the matrix matters for naming.
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
pub struct Strategy {
    #[serde(default)]
    pub matrix: Option<Matrix>,
}

/// Matrix axes in declaration order.
///
/// Only entries whose value is a list of scalars are axes. `include` and
/// `exclude` are dropped when parsing; any other entry is remembered as
/// unlisted so a name referencing it can say why it cannot be expanded.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Matrix {
    axes: Vec<(String, Vec<String>)>,
    unlisted: Vec<String>,
}

impl Matrix {
    /// Creates a matrix with no axes.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an axis with its ordered values.
    pub fn with_axis<I, S>(mut self, name: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.axes
            .push((name.into(), values.into_iter().map(Into::into).collect()));
        self
    }

    /// Values of the named axis, in declaration order.
    pub fn axis(&self, name: &str) -> Option<&[String]> {
        self.axes
            .iter()
            .find(|(axis, _)| axis == name)
            .map(|(_, values)| values.as_slice())
    }

    /// Names of all axes.
    pub fn axis_names(&self) -> impl Iterator<Item = &str> {
        self.axes.iter().map(|(name, _)| name.as_str())
    }

    /// Checks if `name` is declared but has no static list of scalar values.
    pub fn is_unlisted(&self, name: &str) -> bool {
        self.unlisted.iter().any(|axis| axis == name)
    }
}

impl<'de> Deserialize<'de> for Matrix {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let val = Value::deserialize(deserializer)?;
        match val {
            Value::Mapping(entries) => {
                let mut matrix = Matrix::new();
                for (key, value) in entries {
                    let name = scalar_to_string(&key)
                        .ok_or_else(|| de::Error::custom("Expected scalar matrix axis name"))?;
                    if name == "include" || name == "exclude" {
                        debug!("Skipping matrix '{}' entries", name);
                        continue;
                    }
                    match axis_values(&value) {
                        Some(values) => matrix.axes.push((name, values)),
                        None => {
                            if value.is_sequence() {
                                warn!("Matrix axis '{}' has non-scalar values", name);
                            } else {
                                debug!("Matrix axis '{}' has no static value list", name);
                            }
                            matrix.unlisted.push(name);
                        }
                    }
                }
                Ok(matrix)
            }
            // `matrix: ${{ fromJSON(...) }}` is only known at run time
            Value::String(expr) => {
                debug!("Matrix is an expression ('{}'), no static axes", expr);
                Ok(Matrix::new())
            }
            _ => Err(de::Error::custom("Expected matrix mapping")),
        }
    }
}

/// Reads an axis value list; `None` when the entry is not a list of scalars.
fn axis_values(value: &Value) -> Option<Vec<String>> {
    match value {
        Value::Sequence(items) => items.iter().map(scalar_to_string).collect(),
        _ => None,
    }
}

/// Renders a YAML scalar the way it appears in a check-run name.
///
/// Note that YAML reads an unquoted `3.10` as the float `3.1`.
pub(crate) fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Tagged(tagged) => scalar_to_string(&tagged.value),
        _ => None,
    }
}
