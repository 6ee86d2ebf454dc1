//! grc - Required Status Check Synchroniser
//!
//! Keeps a branch's required status checks equal to the check runs its
//! GitHub Actions workflows actually produce, including one check per
//! value of a matrix axis referenced in a job name.
//!
//! # Architecture
//!
//! The library is organized into four main modules:
//!
//! - [`workflow`]: Workflow model, parsing and job-name expansion
//! - [`github`]: Workflow sources and the branch protection sink
//! - [`sync`]: The fetch, expand and publish pipeline
//! - [`config`]: Command-line and environment configuration
//!
//! # Example
//!
//! ```rust
//! use grc::workflow::{expand_document, parse_workflow};
//!
//! let doc = parse_workflow(
//!     "ci.yml",
//!     r#"
//! jobs:
//!   test:
//!     name: test (${{ matrix.os }})
//!     strategy:
//!       matrix:
//!         os: [ubuntu-latest, macos-latest]
//! "#,
//! )
//! .unwrap();
//!
//! assert_eq!(
//!     expand_document(&doc).unwrap(),
//!     vec!["test (ubuntu-latest)", "test (macos-latest)"]
//! );
//! ```

pub mod config;
pub mod error;
pub mod github;
pub mod sync;
pub mod workflow;

// Re-export commonly used types
pub use error::{ExpansionError, GrcError, Result};
pub use sync::{ChecksDiff, SyncReport, Synchroniser};
pub use workflow::model::{JobDefinition, Matrix, WorkflowDocument};
pub use workflow::parser::parse_workflow;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Application name
pub const APP_NAME: &str = "grc";
