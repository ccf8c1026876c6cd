//! Auto-detection of spec locations in a project tree.
//!
//! Used when no `.specdeck.toml` exists. The walk looks for directory names
//! that well-known spec tools create and reports each as a scan root.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;

/// Directory names that signal spec content, with the tool they belong to.
const MARKER_DIRS: [(&str, SourceKind); 6] = [
    ("specs", SourceKind::Specs),
    (".kiro", SourceKind::Kiro),
    ("openspec", SourceKind::OpenSpec),
    (".openspec", SourceKind::OpenSpec),
    (".spec", SourceKind::Generic),
    ("docs", SourceKind::Generic),
];

/// Directories never descended into.
const SKIP_DIRS: [&str; 9] = [
    "node_modules",
    ".git",
    "__pycache__",
    ".venv",
    "venv",
    ".tox",
    "dist",
    "build",
    ".next",
];

const MAX_SCAN_DEPTH: usize = 4;

/// Tool convention a detected location comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    Specs,
    Kiro,
    OpenSpec,
    Generic,
}

impl SourceKind {
    pub fn as_str(self) -> &'static str {
        match self {
            SourceKind::Specs => "specs",
            SourceKind::Kiro => "kiro",
            SourceKind::OpenSpec => "openspec",
            SourceKind::Generic => "generic",
        }
    }
}

/// A directory worth scanning.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DetectedSource {
    /// Path relative to the project root, `/` separated.
    pub path: String,
    pub source: SourceKind,
    pub description: String,
    pub md_count: usize,
}

/// Find spec locations under `root`, most markdown first.
pub fn detect_spec_sources(root: &Path) -> Vec<DetectedSource> {
    let mut detected = Vec::new();
    walk(root, root, 0, &mut detected);

    let mut detected = drop_parents(detected);
    detected.sort_by(|a, b| b.md_count.cmp(&a.md_count));
    detected
}

fn walk(root: &Path, directory: &Path, depth: usize, detected: &mut Vec<DetectedSource>) {
    if depth > MAX_SCAN_DEPTH {
        return;
    }
    let mut entries: Vec<PathBuf> = match fs::read_dir(directory) {
        Ok(entries) => entries
            .filter_map(|entry| entry.ok().map(|entry| entry.path()))
            .filter(|path| path.is_dir())
            .collect(),
        Err(err) => {
            tracing::debug!(path = %directory.display(), error = %err, "cannot list directory");
            return;
        }
    };
    entries.sort();

    for entry in entries {
        let name = entry
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        if SKIP_DIRS.contains(&name.as_str()) {
            continue;
        }
        match MARKER_DIRS.iter().find(|(marker, _)| *marker == name) {
            Some((_, kind)) => process_marker(root, &entry, *kind, detected),
            None => walk(root, &entry, depth + 1, detected),
        }
    }
}

fn process_marker(root: &Path, marker: &Path, kind: SourceKind, detected: &mut Vec<DetectedSource>) {
    let label = label_for(root, marker);
    match kind {
        SourceKind::OpenSpec => {
            for source in openspec_sources(root, marker, &label) {
                add(detected, source);
            }
        }
        SourceKind::Kiro => {
            let specs = marker.join("specs");
            let best = if specs.is_dir() && count_markdown(&specs) > 0 {
                specs
            } else {
                marker.to_path_buf()
            };
            let description = if label == ".kiro" {
                "Kiro specs".to_string()
            } else {
                format!("Kiro ({label})")
            };
            add_if_markdown(root, &best, kind, description, detected);
        }
        SourceKind::Specs | SourceKind::Generic => {
            let name = marker
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_default();
            add_if_markdown(root, marker, kind, format!("{name}/ directory"), detected);
        }
    }
}

/// `changes/<name>/specs`, `changes/<name>` and `specs` under an openspec root.
fn openspec_sources(root: &Path, openspec_root: &Path, label: &str) -> Vec<DetectedSource> {
    let mut sources = Vec::new();

    let mut changes: Vec<PathBuf> = fs::read_dir(openspec_root.join("changes"))
        .map(|entries| {
            entries
                .filter_map(|entry| entry.ok().map(|entry| entry.path()))
                .filter(|path| path.is_dir())
                .collect()
        })
        .unwrap_or_default();
    changes.sort();

    for change in changes {
        let change_name = change
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        if change_name == "archive" {
            continue;
        }

        let specs = change.join("specs");
        let md_count = count_markdown(&specs);
        if specs.is_dir() && md_count > 0 {
            sources.push(DetectedSource {
                path: relative(root, &specs),
                source: SourceKind::OpenSpec,
                description: format!("OpenSpec ({label}): {change_name}/specs"),
                md_count,
            });
        }

        let top_level = count_top_level_markdown(&change);
        if top_level > 0 {
            sources.push(DetectedSource {
                path: relative(root, &change),
                source: SourceKind::OpenSpec,
                description: format!("OpenSpec ({label}): {change_name}"),
                md_count: top_level,
            });
        }
    }

    let direct = openspec_root.join("specs");
    let md_count = count_markdown(&direct);
    if direct.is_dir() && md_count > 0 {
        sources.push(DetectedSource {
            path: relative(root, &direct),
            source: SourceKind::OpenSpec,
            description: format!("OpenSpec ({label}): specs"),
            md_count,
        });
    }

    sources
}

fn add_if_markdown(
    root: &Path,
    directory: &Path,
    kind: SourceKind,
    description: String,
    detected: &mut Vec<DetectedSource>,
) {
    let md_count = count_markdown(directory);
    if md_count == 0 {
        return;
    }
    add(
        detected,
        DetectedSource {
            path: relative(root, directory),
            source: kind,
            description,
            md_count,
        },
    );
}

fn add(detected: &mut Vec<DetectedSource>, source: DetectedSource) {
    if !detected.iter().any(|existing| existing.path == source.path) {
        detected.push(source);
    }
}

/// Keep only the most specific of nested paths.
fn drop_parents(detected: Vec<DetectedSource>) -> Vec<DetectedSource> {
    let paths: Vec<String> = detected.iter().map(|source| source.path.clone()).collect();
    detected
        .into_iter()
        .filter(|source| {
            let prefix = format!("{}/", source.path);
            !paths.iter().any(|other| other.starts_with(&prefix))
        })
        .collect()
}

fn count_markdown(directory: &Path) -> usize {
    let pattern = format!(
        "{}/**/*.md",
        glob::Pattern::escape(&directory.to_string_lossy())
    );
    glob::glob(&pattern)
        .map(|paths| paths.filter_map(|path| path.ok()).filter(|path| path.is_file()).count())
        .unwrap_or(0)
}

fn count_top_level_markdown(directory: &Path) -> usize {
    fs::read_dir(directory)
        .map(|entries| {
            entries
                .filter_map(|entry| entry.ok().map(|entry| entry.path()))
                .filter(|path| path.is_file() && path.extension().is_some_and(|ext| ext == "md"))
                .count()
        })
        .unwrap_or(0)
}

fn relative(root: &Path, path: &Path) -> String {
    path.strip_prefix(root)
        .unwrap_or(path)
        .to_string_lossy()
        .replace('\\', "/")
}

/// First non-hidden segment of the relative path, for descriptions.
fn label_for(root: &Path, path: &Path) -> String {
    let relative = path.strip_prefix(root).unwrap_or(path);
    relative
        .components()
        .map(|component| component.as_os_str().to_string_lossy().into_owned())
        .find(|segment| !segment.starts_with('.'))
        .unwrap_or_else(|| {
            relative
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_default()
        })
}
