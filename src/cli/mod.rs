//! Command-line interface for specdeck
//!
//! This module defines the CLI structure using clap derive macros.
//! Each subcommand is defined in its own submodule.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::error::Result;
use crate::output::OutputOptions;

mod detect;
mod init;
mod list;
mod watch;

/// specdeck - one view over spec-driven development markdown
///
/// Scans spec directories and plan documents written for different tools and
/// lists them as normalized groups with status, tags, and task progress.
#[derive(Parser, Debug)]
#[command(name = "specdeck")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Project root (defaults to current directory)
    #[arg(long, global = true, env = "SPECDECK_ROOT")]
    pub root: Option<PathBuf>,

    /// Output in JSON format
    #[arg(long, global = true)]
    pub json: bool,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List spec groups by section (active, specs, plan, archive)
    List {
        /// Only show groups carrying this tag
        #[arg(long)]
        tag: Option<String>,

        /// Only show groups with this status (draft, ready, in-progress, done, blocked)
        #[arg(long)]
        status: Option<String>,

        /// Include archived groups
        #[arg(long)]
        all: bool,
    },

    /// Show spec locations detected in the project
    Detect,

    /// Write .specdeck.toml from detected spec locations
    Init {
        /// Overwrite an existing configuration
        #[arg(long)]
        force: bool,
    },

    /// Re-list groups whenever spec markdown changes
    Watch,
}

impl Commands {
    /// Subcommand name as reported in output envelopes.
    pub fn name(&self) -> &'static str {
        match self {
            Commands::List { .. } => "list",
            Commands::Detect => "detect",
            Commands::Init { .. } => "init",
            Commands::Watch => "watch",
        }
    }
}

impl Cli {
    /// Execute the CLI command
    pub fn run(self) -> Result<()> {
        let root = resolve_root(self.root)?;
        let output = OutputOptions {
            json: self.json,
            quiet: self.quiet,
        };

        match self.command {
            Commands::List { tag, status, all } => list::run(list::ListOptions {
                root,
                tag,
                status,
                all,
                output,
            }),
            Commands::Detect => detect::run(&root, output),
            Commands::Init { force } => init::run(&root, force, output),
            Commands::Watch => watch::run(&root, output),
        }
    }
}

fn resolve_root(root: Option<PathBuf>) -> Result<PathBuf> {
    let root = match root {
        Some(path) => path,
        None => std::env::current_dir()?,
    };
    if !root.is_dir() {
        return Err(crate::error::Error::InvalidArgument(format!(
            "project root is not a directory: {}",
            root.display()
        )));
    }
    Ok(root)
}
