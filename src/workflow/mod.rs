//! Workflow Definition Module
//!
//! Models GitHub Actions workflow files and derives the check-run names
//! their jobs produce.
//!
//! # Structure
//!
//! - [`model`]: Core data structures (WorkflowDocument, JobDefinition, Matrix)
//! - [`parser`]: YAML parsing and field validation
//! - [`matrix`]: Matrix placeholder expansion

pub mod matrix;
pub mod model;
pub mod parser;

pub use matrix::{expand_document, expand_documents, expand_job, find_placeholder};
pub use model::{JobDefinition, Matrix, Strategy, WorkflowDocument};
pub use parser::parse_workflow;
