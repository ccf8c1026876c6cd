//! Assembling one `SpecFile` from raw document text.

use std::path::Path;

use crate::dialect::detect_dialect;
use crate::error::Result;
use crate::frontmatter::{parse_document, resolve_title};
use crate::model::{Dialect, Role, SpecFile};
use crate::phase::parse_phases;
use crate::task::extract_tasks;

/// Read and parse a markdown file.
pub fn parse_spec_file(path: &Path) -> Result<SpecFile> {
    let content = std::fs::read_to_string(path)?;
    Ok(parse_spec_text(path, &content))
}

/// Parse document text that was read from `path`. Never fails: malformed
/// headers fall back to defaults and unrecognized layouts are `generic`.
pub fn parse_spec_text(path: &Path, content: &str) -> SpecFile {
    let document = parse_document(content);
    let header = document.header;
    let body = document.body;

    let title = resolve_title(&header, &body, path);
    let role = header.role.unwrap_or_else(|| {
        let stem = path
            .file_stem()
            .map(|stem| stem.to_string_lossy())
            .unwrap_or_default();
        Role::from_stem(&stem)
    });

    let dialect = detect_dialect(&body, path);
    let extracted = extract_tasks(&body);
    let phases = match dialect {
        Dialect::Phased => parse_phases(&body, &extracted.flat),
        _ => Vec::new(),
    };

    tracing::debug!(
        path = %path.display(),
        dialect = %dialect,
        tasks = extracted.flat.len(),
        phases = phases.len(),
        "parsed spec file"
    );

    SpecFile {
        path: path.to_path_buf(),
        title,
        status: header.status,
        priority: header.priority,
        tags: header.tags,
        body,
        tasks: extracted.flat,
        task_tree: extracted.tree,
        phases,
        dialect,
        role,
    }
}
