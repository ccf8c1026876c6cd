//! Rendering of command results.
//!
//! Every command builds a serializable report plus a [`HumanOutput`]. With
//! `--json` the report is wrapped in a versioned envelope; otherwise the
//! human view is printed unless `--quiet` is set.

use std::fmt;

use serde::Serialize;

use crate::error::{Error, JsonError, Result};

pub const SCHEMA_VERSION: &str = "specdeck.v1";

#[derive(Debug, Clone, Copy)]
pub struct OutputOptions {
    pub json: bool,
    pub quiet: bool,
}

/// Plain-text view of a command result.
///
/// Renders as a header line, an optional key/value summary, titled blocks of
/// bullet lines, and trailing notes. Blocks with no lines are left out.
#[derive(Debug, Clone)]
pub struct HumanOutput {
    header: String,
    summary: Vec<(String, String)>,
    blocks: Vec<Block>,
    notes: Vec<String>,
    warnings: Vec<String>,
    next_steps: Vec<String>,
}

#[derive(Debug, Clone)]
struct Block {
    title: String,
    lines: Vec<String>,
}

impl HumanOutput {
    pub fn new(header: impl Into<String>) -> Self {
        Self {
            header: header.into(),
            summary: Vec::new(),
            blocks: Vec::new(),
            notes: Vec::new(),
            warnings: Vec::new(),
            next_steps: Vec::new(),
        }
    }

    pub fn push_summary(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.summary.push((key.into(), value.into()));
    }

    pub fn push_section(&mut self, title: impl Into<String>, lines: Vec<String>) {
        self.blocks.push(Block {
            title: title.into(),
            lines,
        });
    }

    /// A free-standing line printed after the blocks, without a bullet.
    pub fn push_note(&mut self, note: impl Into<String>) {
        self.notes.push(note.into());
    }

    pub fn push_warning(&mut self, warning: impl Into<String>) {
        self.warnings.push(warning.into());
    }

    pub fn push_next_step(&mut self, step: impl Into<String>) {
        self.next_steps.push(step.into());
    }
}

impl fmt::Display for HumanOutput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.header)?;

        if !self.summary.is_empty() {
            writeln!(f)?;
            for (key, value) in &self.summary {
                write!(f, "\n  {key}: {value}")?;
            }
        }

        let trailing: [(&str, &Vec<String>); 2] = [
            ("Warnings", &self.warnings),
            ("Next steps", &self.next_steps),
        ];
        let blocks = self
            .blocks
            .iter()
            .map(|block| (block.title.as_str(), &block.lines))
            .chain(trailing);
        for (title, lines) in blocks.filter(|(_, lines)| !lines.is_empty()) {
            write!(f, "\n\n{title}:")?;
            for line in lines {
                write!(f, "\n- {line}")?;
            }
        }

        if !self.notes.is_empty() {
            writeln!(f)?;
            for note in &self.notes {
                write!(f, "\n{note}")?;
            }
        }
        Ok(())
    }
}

#[derive(Serialize)]
struct Envelope<'a, T: Serialize> {
    schema_version: &'static str,
    command: &'a str,
    status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<&'a T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<JsonError>,
    #[serde(skip_serializing_if = "<[String]>::is_empty")]
    warnings: &'a [String],
    #[serde(skip_serializing_if = "<[String]>::is_empty")]
    next_steps: &'a [String],
}

/// Print a successful result as JSON or as its human view.
pub fn emit_success<T: Serialize>(
    options: OutputOptions,
    command: &str,
    data: &T,
    human: &HumanOutput,
) -> Result<()> {
    if options.json {
        let envelope = Envelope {
            schema_version: SCHEMA_VERSION,
            command,
            status: "success",
            data: Some(data),
            error: None,
            warnings: &human.warnings,
            next_steps: &human.next_steps,
        };
        println!("{}", serde_json::to_string_pretty(&envelope)?);
    } else if !options.quiet {
        println!("{human}");
    }
    Ok(())
}

/// Report a failed command. JSON errors go to stdout, text errors to stderr.
pub fn emit_error(command: &str, err: &Error, json: bool) -> Result<()> {
    let hints: Vec<String> = hint(err).into_iter().collect();
    if json {
        let envelope = Envelope::<()> {
            schema_version: SCHEMA_VERSION,
            command,
            status: "error",
            data: None,
            error: Some(JsonError::from(err)),
            warnings: &[],
            next_steps: &hints,
        };
        println!("{}", serde_json::to_string_pretty(&envelope)?);
        return Ok(());
    }

    eprintln!("error: {err}");
    for hint in &hints {
        eprintln!("hint: {hint}");
    }
    Ok(())
}

fn hint(err: &Error) -> Option<String> {
    match err {
        Error::InvalidConfig(_) => Some(format!("fix {} then retry", crate::config::CONFIG_FILE)),
        Error::ScanRootUnreadable { path, .. } => {
            Some(format!("check permissions on {}", path.display()))
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn hints_only_for_fixable_errors() {
        let unreadable = Error::ScanRootUnreadable {
            path: PathBuf::from("specs"),
            source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        };
        assert_eq!(hint(&unreadable).as_deref(), Some("check permissions on specs"));
        assert!(hint(&Error::InvalidConfig("x".to_string())).is_some());
        assert!(hint(&Error::OperationFailed("x".to_string())).is_none());
    }

    #[test]
    fn error_envelope_shape() {
        let err = Error::InvalidArgument("bad".to_string());
        let envelope = Envelope::<()> {
            schema_version: SCHEMA_VERSION,
            command: "list",
            status: "error",
            data: None,
            error: Some(JsonError::from(&err)),
            warnings: &[],
            next_steps: &[],
        };
        let value = serde_json::to_value(&envelope).expect("serialize");
        assert_eq!(value["command"], "list");
        assert_eq!(value["error"]["code"], 2);
        assert!(value.get("data").is_none());
        assert!(value.get("next_steps").is_none());
    }
}
