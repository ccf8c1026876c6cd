//! specdeck - normalized view over spec-driven development markdown
//!
//! Different spec tools leave different markdown behind: per-feature spec
//! directories, IDE spec folders, phased task lists with task identifiers,
//! and single plan documents with one section per unit of work. This library
//! reads all of them into one model of groups, files, phases, and tasks.
//!
//! # Pipeline
//!
//! raw text → frontmatter/title → dialect → tasks (+ phases or plan sections)
//! → [`model::SpecFile`] → grouping and auto-tagging → ordered
//! [`model::SpecGroup`] list.
//!
//! # Module Organization
//!
//! - `model`: normalized data model and the core tag vocabulary
//! - `frontmatter`: YAML header splitting and title resolution
//! - `task`: checkbox extraction and task tree construction
//! - `dialect`: ordered dialect detection rules
//! - `phase`: `## Phase N:` grouping for phased task files
//! - `plan`: splitting sectioned plans into sections
//! - `parser`: assembling one file record
//! - `scanner`: discovery, grouping, auto-tagging, ordering
//! - `detect`: auto-detection of spec locations
//! - `config`: `.specdeck.toml` loading
//! - `watch`: rescanning on markdown changes
//! - `output`: shared human and JSON output
//! - `cli`: command-line interface using clap
//! - `error`: error types and exit codes

pub mod cli;
pub mod config;
pub mod detect;
pub mod dialect;
pub mod error;
pub mod frontmatter;
pub mod model;
pub mod output;
pub mod parser;
pub mod phase;
pub mod plan;
pub mod scanner;
pub mod task;
pub mod watch;

pub use error::{Error, Result};
pub use model::{SpecFile, SpecGroup};
pub use scanner::scan;
