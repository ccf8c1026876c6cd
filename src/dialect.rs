//! Document dialect detection.
//!
//! Rules are evaluated top to bottom and the first match wins. Path rules come
//! first because they are unambiguous; phased precedes sectioned-plan because
//! only phased documents carry `T###` task identifiers.

use std::path::{Component, Path};

use once_cell::sync::Lazy;
use regex::Regex;

use crate::model::Dialect;

pub(crate) static PHASE_HEADING_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?m)^## Phase (\d+):[ \t]*(.+?)[ \t]*\r?$").expect("valid phase heading regex")
});
static TASK_WITH_ID_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?m)^[ \t]*[-*+] \[[ xX]\]\*?[ \t]+T\d+").expect("valid task id line regex")
});
pub(crate) static H2_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)^## (.+)$").expect("valid h2 regex"));
pub(crate) static STATUS_LINE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?m)^\*\*Status(?::\*\*|\*\*:)[ \t]*([^\s|*]+)").expect("valid status line regex")
});
static NUMBERED_H2_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)^## \d+\.").expect("valid numbered heading regex"));

/// Directory names that mark a tool-specific layout.
const PATH_MARKERS: [(&str, Dialect); 1] = [(".kiro", Dialect::Kiro)];

pub type Rule = fn(&str, &Path) -> bool;

/// Detection rules in priority order.
pub const RULES: [(Rule, Dialect); 4] = [
    (is_kiro_path, Dialect::Kiro),
    (is_phased, Dialect::Phased),
    (is_sectioned_plan, Dialect::SectionedPlan),
    (is_numbered, Dialect::Numbered),
];

/// Classify a document body and path.
pub fn detect_dialect(body: &str, path: &Path) -> Dialect {
    RULES
        .iter()
        .find(|(rule, _)| rule(body, path))
        .map_or(Dialect::Generic, |(_, dialect)| *dialect)
}

fn is_kiro_path(_body: &str, path: &Path) -> bool {
    path_marker(path) == Some(Dialect::Kiro)
}

fn path_marker(path: &Path) -> Option<Dialect> {
    path.components().find_map(|component| match component {
        Component::Normal(name) => PATH_MARKERS
            .iter()
            .find(|(marker, _)| name == *marker)
            .map(|(_, dialect)| *dialect),
        _ => None,
    })
}

fn is_phased(body: &str, _path: &Path) -> bool {
    PHASE_HEADING_RE.is_match(body) && TASK_WITH_ID_RE.is_match(body)
}

fn is_sectioned_plan(body: &str, _path: &Path) -> bool {
    H2_RE.find_iter(body).take(2).count() >= 2 && STATUS_LINE_RE.is_match(body)
}

fn is_numbered(body: &str, _path: &Path) -> bool {
    NUMBERED_H2_RE.is_match(body)
}
