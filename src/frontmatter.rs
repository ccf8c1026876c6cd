//! YAML frontmatter splitting and title resolution.

use std::path::Path;

use serde_yaml::Value;

use crate::model::{Priority, Role, Status, Tags};

/// File stems and headings too generic to serve as a title.
pub const GENERIC_NAMES: [&str; 7] = [
    "spec",
    "design",
    "tasks",
    "todo",
    "requirements",
    "index",
    "readme",
];

/// Metadata read from a document header, defaults applied.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Header {
    pub title: Option<String>,
    pub status: Status,
    pub priority: Priority,
    pub tags: Tags,
    pub role: Option<Role>,
}

/// A document split into header metadata and the remaining body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    pub header: Header,
    pub body: String,
}

/// Split `---` delimited YAML frontmatter from the body.
///
/// Any malformed header is treated as absent: the whole text becomes the body
/// and every field takes its default.
pub fn parse_document(content: &str) -> Document {
    match split_frontmatter(content) {
        Some((yaml, body)) => match serde_yaml::from_str::<Value>(yaml) {
            Ok(Value::Mapping(map)) => Document {
                header: header_from_mapping(&map),
                body: body.to_string(),
            },
            Ok(Value::Null) => Document {
                header: Header::default(),
                body: body.to_string(),
            },
            _ => Document {
                header: Header::default(),
                body: content.to_string(),
            },
        },
        None => Document {
            header: Header::default(),
            body: content.to_string(),
        },
    }
}

fn split_frontmatter(content: &str) -> Option<(&str, &str)> {
    let content = content.strip_prefix('\u{feff}').unwrap_or(content);
    let rest = content
        .strip_prefix("---\n")
        .or_else(|| content.strip_prefix("---\r\n"))?;

    if let Some(body) = rest.strip_prefix("---\n").or_else(|| rest.strip_prefix("---\r\n")) {
        return Some(("", body));
    }

    rest.find("\n---\n")
        .map(|i| (i, i + 5))
        .or_else(|| rest.find("\n---\r\n").map(|i| (i, i + 6)))
        .or_else(|| {
            rest.strip_suffix("\n---")
                .map(|head| (head.len(), rest.len()))
        })
        .map(|(yaml_end, body_start)| (&rest[..yaml_end], &rest[body_start..]))
}

fn header_from_mapping(map: &serde_yaml::Mapping) -> Header {
    let get_str = |key: &str| -> Option<String> {
        match map.get(key)? {
            Value::String(value) => Some(value.trim().to_string()),
            Value::Number(value) => Some(value.to_string()),
            Value::Bool(value) => Some(value.to_string()),
            _ => None,
        }
    };

    let tags = match map.get("tags") {
        Some(Value::Sequence(items)) => items
            .iter()
            .filter_map(|item| match item {
                Value::String(value) => Some(value.clone()),
                Value::Number(value) => Some(value.to_string()),
                _ => None,
            })
            .collect(),
        Some(Value::String(value)) => value.split(',').collect(),
        _ => Tags::new(),
    };

    Header {
        title: get_str("title").filter(|title| !title.is_empty()),
        status: get_str("status").map(|s| Status::parse(&s)).unwrap_or_default(),
        priority: get_str("priority")
            .map(|p| Priority::parse(&p))
            .unwrap_or_default(),
        tags,
        role: get_str("role").and_then(|r| Role::parse(&r)),
    }
}

/// First level-1 heading of the body, if any.
pub fn first_heading(body: &str) -> Option<String> {
    body.lines()
        .map(str::trim)
        .find_map(|line| line.strip_prefix("# "))
        .map(|title| title.trim().to_string())
        .filter(|title| !title.is_empty())
}

pub fn is_generic_name(name: &str) -> bool {
    let lowered = name.trim().to_lowercase();
    GENERIC_NAMES.contains(&lowered.as_str())
}

/// Resolve a display title: header title, then first H1, then the path.
///
/// A generic H1 or stem (`Tasks`, `spec`, ...) defers to the parent directory
/// so every file of a project is not titled the same.
pub fn resolve_title(header: &Header, body: &str, path: &Path) -> String {
    if let Some(title) = &header.title {
        return title.clone();
    }

    let parent_name = path
        .parent()
        .and_then(Path::file_name)
        .map(|name| name.to_string_lossy().to_string())
        .filter(|name| !name.is_empty());

    if let Some(heading) = first_heading(body) {
        if !is_generic_name(&heading) {
            return heading;
        }
        if let Some(parent) = &parent_name {
            return humanize(parent);
        }
        return heading;
    }

    let stem = path
        .file_stem()
        .map(|stem| stem.to_string_lossy().to_string())
        .unwrap_or_default();
    match parent_name {
        Some(parent) if is_generic_name(&stem) => humanize(&parent),
        _ => humanize(&stem),
    }
}

/// `user_auth-flow` -> `User Auth Flow`.
pub fn humanize(name: &str) -> String {
    name.split(|ch: char| ch == '-' || ch == '_' || ch.is_whitespace())
        .filter(|word| !word.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => {
                    first.to_uppercase().collect::<String>() + &chars.as_str().to_lowercase()
                }
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}
