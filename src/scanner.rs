//! Scanner and grouper
//!
//! A scan runs in three stages:
//! - discovery resolves scan roots and include patterns into candidate paths,
//! - reading loads their bytes, skipping anything unreadable,
//! - grouping turns parsed files into the ordered group list.
//!
//! Grouping is a pure function of the sources it is handed, so two scans of
//! an unchanged tree are value-equal.

use std::collections::{BTreeMap, HashSet};
use std::path::{Component, Path, PathBuf};

use crate::config::Config;
use crate::error::{Error, Result};
use crate::model::{tags, Dialect, GroupKind, Role, SpecFile, SpecGroup, Tags};
use crate::parser::parse_spec_text;
use crate::plan::{parse_plan_sections, slugify};

/// A candidate markdown path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveredFile {
    pub path: PathBuf,
    /// Scan root the file lies under; `None` for include-only matches.
    pub scan_root: Option<PathBuf>,
}

/// A discovered file with its raw content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
    pub path: PathBuf,
    pub scan_root: Option<PathBuf>,
    pub contents: Vec<u8>,
}

/// Scan the project at `root` and return its groups in display order.
///
/// Missing scan roots contribute nothing. A scan root that exists but cannot
/// be listed is the only error.
pub fn scan(root: &Path, config: &Config) -> Result<Vec<SpecGroup>> {
    let root = clean_path(root);
    let discovered = discover_files(&root, config)?;
    let sources = read_sources(discovered);
    let groups = group_sources(&root, sources);
    tracing::debug!(root = %root.display(), groups = groups.len(), "scan complete");
    Ok(groups)
}

/// Resolve scan roots and include patterns into deduplicated markdown paths.
///
/// Returned paths and scan roots are both free of `.` components, so
/// `path.starts_with(scan_root)` holds for a relative project root too.
pub fn discover_files(root: &Path, config: &Config) -> Result<Vec<DiscoveredFile>> {
    let root = clean_path(root);
    let root = root.as_path();
    let excludes = config.exclude_patterns()?;
    let scan_roots: Vec<PathBuf> = config
        .scan_roots(root)
        .iter()
        .map(|scan_root| clean_path(scan_root))
        .collect();
    let mut seen: HashSet<PathBuf> = HashSet::new();
    let mut files = Vec::new();

    let mut accept = |path: PathBuf, files: &mut Vec<DiscoveredFile>| {
        if is_excluded(&path, root, &excludes) {
            tracing::debug!(path = %path.display(), "excluded");
            return;
        }
        let key = path.canonicalize().unwrap_or_else(|_| path.clone());
        if !seen.insert(key) {
            return;
        }
        let scan_root = scan_roots
            .iter()
            .find(|scan_root| path.starts_with(scan_root))
            .cloned();
        files.push(DiscoveredFile { path, scan_root });
    };

    for scan_root in &scan_roots {
        if !scan_root.is_dir() {
            tracing::debug!(path = %scan_root.display(), "scan root missing");
            continue;
        }
        if let Err(source) = std::fs::read_dir(scan_root) {
            return Err(Error::ScanRootUnreadable {
                path: scan_root.clone(),
                source,
            });
        }
        let pattern = format!("{}/**/*.md", escape_path(scan_root));
        for path in glob_files(&pattern)? {
            accept(path, &mut files);
        }
    }

    for include in &config.include {
        let pattern = format!("{}/{}", escape_path(root), include.trim_start_matches("./"));
        for path in glob_files(&pattern)? {
            accept(path, &mut files);
        }
    }

    Ok(files)
}

fn glob_files(pattern: &str) -> Result<Vec<PathBuf>> {
    let entries = glob::glob(pattern).map_err(|err| {
        Error::InvalidConfig(format!("invalid glob pattern '{pattern}': {err}"))
    })?;
    let mut paths: Vec<PathBuf> = entries
        .filter_map(|entry| match entry {
            Ok(path) => Some(path),
            Err(err) => {
                tracing::warn!(path = %err.path().display(), error = %err.error(), "skipping unreadable path");
                None
            }
        })
        .filter(|path| path.is_file())
        .map(|path| clean_path(&path))
        .collect();
    paths.sort();
    Ok(paths)
}

fn escape_path(path: &Path) -> String {
    glob::Pattern::escape(&normalize_path(path))
}

fn is_excluded(path: &Path, root: &Path, excludes: &[glob::Pattern]) -> bool {
    let relative = path.strip_prefix(root).unwrap_or(path);
    let normalized = normalize_path(relative);
    excludes.iter().any(|pattern| pattern.matches(&normalized))
}

/// Drop `.` components; an all-`.` path becomes `.`.
fn clean_path(path: &Path) -> PathBuf {
    let cleaned: PathBuf = path
        .components()
        .filter(|component| !matches!(component, Component::CurDir))
        .collect();
    if cleaned.as_os_str().is_empty() {
        PathBuf::from(".")
    } else {
        cleaned
    }
}

fn normalize_path(path: &Path) -> String {
    let mut raw = path.to_string_lossy().replace('\\', "/");
    if let Some(stripped) = raw.strip_prefix("./") {
        raw = stripped.to_string();
    }
    raw
}

/// Read every discovered file. Unreadable files are logged and skipped.
pub fn read_sources(files: Vec<DiscoveredFile>) -> Vec<SourceFile> {
    files
        .into_iter()
        .filter_map(|file| match std::fs::read(&file.path) {
            Ok(contents) => Some(SourceFile {
                path: file.path,
                scan_root: file.scan_root,
                contents,
            }),
            Err(err) => {
                tracing::warn!(path = %file.path.display(), error = %err, "skipping unreadable file");
                None
            }
        })
        .collect()
}

/// Parse, group, tag, and order a set of sources.
///
/// Sources are processed in the order given; plan groups keep that order.
pub fn group_sources(root: &Path, sources: Vec<SourceFile>) -> Vec<SpecGroup> {
    // Regular groups with whether they sit under a scan root.
    let mut regular: BTreeMap<PathBuf, (SpecGroup, bool)> = BTreeMap::new();
    let mut plan_groups: Vec<SpecGroup> = Vec::new();

    for source in sources {
        let content = match String::from_utf8(source.contents) {
            Ok(content) => content,
            Err(err) => {
                tracing::warn!(path = %source.path.display(), error = %err, "skipping non-UTF-8 file");
                continue;
            }
        };
        let file = parse_spec_text(&source.path, &content);

        if file.dialect == Dialect::SectionedPlan {
            plan_groups.extend(expand_plan(&file));
            continue;
        }

        let placement = place(&file.path, source.scan_root.as_deref());
        let (group, _) = regular.entry(placement.key).or_insert_with(|| {
            let group = SpecGroup {
                name: placement.name,
                path: placement.directory,
                kind: placement.kind,
                files: BTreeMap::new(),
                tags: Tags::new(),
            };
            (group, source.scan_root.is_some())
        });
        if let Some(replaced) = group.files.insert(file.role, file) {
            tracing::debug!(
                group = %group.name,
                path = %replaced.path.display(),
                "role already taken, keeping later file"
            );
        }
    }

    let mut groups: Vec<SpecGroup> = regular
        .into_values()
        .map(|(mut group, under_scan_root)| {
            group.tags = group
                .files
                .values()
                .flat_map(|file| file.tags.iter().map(str::to_string))
                .collect();
            apply_auto_tags(&mut group, root, under_scan_root);
            group
        })
        .collect();
    groups.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.path.cmp(&b.path)));

    for mut group in plan_groups {
        apply_auto_tags(&mut group, root, false);
        groups.push(group);
    }

    for group in &groups {
        tracing::debug!(
            group = %group.name,
            kind = ?group.kind,
            files = group.files.len(),
            tasks = group.task_total(),
            "grouped"
        );
    }
    groups
}

struct Placement {
    key: PathBuf,
    name: String,
    directory: PathBuf,
    kind: GroupKind,
}

/// Files in a subdirectory of a scan root share a directory group; files at a
/// scan root's top level or matched only by an include stand alone.
fn place(path: &Path, scan_root: Option<&Path>) -> Placement {
    let parent = path.parent().map(Path::to_path_buf).unwrap_or_default();
    let in_subdirectory = scan_root.is_some_and(|scan_root| parent != scan_root);

    if in_subdirectory {
        let name = parent
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        Placement {
            key: parent.clone(),
            name,
            directory: parent,
            kind: GroupKind::Directory,
        }
    } else {
        let name = path
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_default();
        Placement {
            key: path.to_path_buf(),
            name,
            directory: parent,
            kind: GroupKind::Standalone,
        }
    }
}

/// Replace a sectioned plan document with one virtual group per section.
pub fn expand_plan(file: &SpecFile) -> Vec<SpecGroup> {
    let directory = file.path.parent().map(Path::to_path_buf).unwrap_or_default();

    parse_plan_sections(&file.body, &file.path)
        .into_iter()
        .map(|section| {
            let mut group_tags = section.tags.clone();
            if section.is_complete() {
                group_tags.insert(tags::ARCHIVE);
            }
            let mut name = slugify(&section.title);
            if name.is_empty() {
                name = file
                    .path
                    .file_stem()
                    .map(|stem| slugify(&stem.to_string_lossy()))
                    .unwrap_or_default();
            }

            let virtual_file = SpecFile {
                path: section.source_path,
                title: section.title,
                status: section.status,
                priority: section.priority,
                tags: section.tags,
                body: section.body,
                tasks: section.tasks,
                task_tree: section.task_tree,
                phases: Vec::new(),
                dialect: Dialect::SectionedPlan,
                role: Role::Spec,
            };

            SpecGroup {
                name,
                path: directory.clone(),
                kind: GroupKind::Plan,
                files: BTreeMap::from([(Role::Spec, virtual_file)]),
                tags: group_tags,
            }
        })
        .collect()
}

fn apply_auto_tags(group: &mut SpecGroup, root: &Path, under_scan_root: bool) {
    let relative = group.path.strip_prefix(root).unwrap_or(&group.path);
    let in_archive_dir = relative
        .components()
        .any(|component| matches!(component, Component::Normal(name) if name == tags::ARCHIVE));
    if in_archive_dir {
        group.tags.insert(tags::ARCHIVE);
    }

    if under_scan_root && !group.is_plan() && !group.is_archived() {
        group.tags.insert(tags::SPECS);
    }
}
