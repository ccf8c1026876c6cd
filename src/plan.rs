//! Splitting sectioned plan documents into independent sections.
//!
//! Every `## ` heading opens a section; deeper headings stay inside it. A
//! section with neither a `**Status:**` line nor a checkbox is narrative
//! (notes, learnings, issue logs) and is not emitted.

use std::path::Path;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::dialect::{H2_RE, STATUS_LINE_RE};
use crate::model::{tags, Priority, PlanSection, Status, Tags};
use crate::task::{extract_tasks, has_tasks};

static PRIORITY_LINE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?m)\*\*Priority(?::\*\*|\*\*:)[ \t]*([^\s|*]+)").expect("valid priority regex")
});
static TAGS_LINE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?m)\*\*Tags(?::\*\*|\*\*:)[ \t]*([^|\r\n]*)").expect("valid tags regex")
});
static DONE_SUFFIX_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\s*[—–-]+\s*DONE\s*$").expect("valid done suffix regex"));
static MD_REFERENCE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\s*\([^)]*\.md\)").expect("valid md reference regex"));
static SLUG_SEPARATOR_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^a-z0-9]+").expect("valid slug regex"));

/// Split `body` into its trackable sections, in document order.
pub fn parse_plan_sections(body: &str, source_path: &Path) -> Vec<PlanSection> {
    let starts: Vec<usize> = H2_RE.find_iter(body).map(|m| m.start()).collect();

    starts
        .iter()
        .enumerate()
        .filter_map(|(i, &start)| {
            let end = starts.get(i + 1).copied().unwrap_or(body.len());
            parse_section(body[start..end].trim_end(), source_path)
        })
        .collect()
}

fn parse_section(text: &str, source_path: &Path) -> Option<PlanSection> {
    let (heading_line, section_body) = text.split_once('\n').unwrap_or((text, ""));
    let heading = heading_line.trim_start_matches("## ").trim();

    let status_line = STATUS_LINE_RE
        .captures(section_body)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str());
    if status_line.is_none() && !has_tasks(section_body) {
        return None;
    }

    let status = match status_line {
        Some(value) => Status::parse(value),
        None if DONE_SUFFIX_RE.is_match(heading) => Status::Done,
        None => Status::default(),
    };

    let priority = PRIORITY_LINE_RE
        .captures(section_body)
        .and_then(|caps| caps.get(1))
        .map(|m| Priority::parse(m.as_str()))
        .unwrap_or_default();

    let mut section_tags: Tags = [tags::PLAN].into_iter().collect();
    if let Some(raw) = TAGS_LINE_RE.captures(section_body).and_then(|caps| caps.get(1)) {
        section_tags.extend(raw.as_str().split(','));
    }

    let extracted = extract_tasks(section_body);

    Some(PlanSection {
        title: clean_section_title(heading),
        status,
        priority,
        tags: section_tags,
        tasks: extracted.flat,
        task_tree: extracted.tree,
        body: text.to_string(),
        source_path: source_path.to_path_buf(),
    })
}

/// Strip the `— DONE` suffix, a leading `Spec:` label, and `(path.md)` references.
pub fn clean_section_title(heading: &str) -> String {
    let title = DONE_SUFFIX_RE.replace(heading, "");
    let title = title.trim();
    let title = match title.get(..5) {
        Some(label) if label.eq_ignore_ascii_case("spec:") => title[5..].trim(),
        _ => title,
    };
    MD_REFERENCE_RE.replace_all(title, "").trim().to_string()
}

/// Lowercase, hyphen-separated name for a section title.
pub fn slugify(text: &str) -> String {
    let lowered = text.to_lowercase();
    SLUG_SEPARATOR_RE
        .replace_all(&lowered, "-")
        .trim_matches('-')
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sections(body: &str) -> Vec<PlanSection> {
        parse_plan_sections(body, Path::new("plan.md"))
    }

    #[test]
    fn clean_title_variants() {
        assert_eq!(clean_section_title("Feature A — DONE"), "Feature A");
        assert_eq!(clean_section_title("Feature A – DONE"), "Feature A");
        assert_eq!(clean_section_title("Feature A - done"), "Feature A");
        assert_eq!(clean_section_title("spec: My Feature"), "My Feature");
        assert_eq!(clean_section_title("Feature A (specs/feature-a.md)"), "Feature A");
        assert_eq!(
            clean_section_title("Spec: Feature A (specs/feature-a.md) — DONE"),
            "Feature A"
        );
        assert_eq!(clean_section_title("Plain Title"), "Plain Title");
        assert_eq!(clean_section_title("Café — DONE"), "Café");
    }

    #[test]
    fn slugs() {
        assert_eq!(slugify("My Feature"), "my-feature");
        assert_eq!(slugify("Feature: Auth & Tokens!"), "feature-auth-tokens");
        assert_eq!(slugify("--- hello ---"), "hello");
    }

    #[test]
    fn multi_section_split() {
        let body = "\
# Implementation Plan

## Feature A — DONE

**Status:** done | **Priority:** high | **Tags:** core, api

### Tasks
- [x] Build API
- [x] Add tests

## Feature B

**Status:** in-progress | **Priority:** medium | **Tags:** tui

### Tasks
- [x] Create widget
- [ ] Add styling
";
        let parsed = sections(body);
        assert_eq!(parsed.len(), 2);

        let a = &parsed[0];
        assert_eq!(a.title, "Feature A");
        assert_eq!(a.status, Status::Done);
        assert_eq!(a.priority, Priority::High);
        assert_eq!(a.tags.as_slice(), ["plan", "core", "api"]);
        assert_eq!(a.task_total(), 2);
        assert_eq!(a.task_percent(), 100);

        let b = &parsed[1];
        assert_eq!(b.title, "Feature B");
        assert_eq!(b.status, Status::InProgress);
        assert_eq!(b.tags.as_slice(), ["plan", "tui"]);
        assert_eq!(b.task_done(), 1);
        assert_eq!(b.task_percent(), 50);
    }

    #[test]
    fn done_suffix_without_status_line() {
        let body = "## A — DONE\n- [x] shipped\n\n## B\n**Status:** in-progress\n- [ ] work\n";
        let parsed = sections(body);
        assert_eq!(parsed[0].status, Status::Done);
        assert!(parsed[0].is_complete());
        assert_eq!(parsed[1].status, Status::InProgress);
        assert!(!parsed[1].is_complete());
    }

    #[test]
    fn status_line_beats_done_suffix() {
        let parsed = sections("## A — DONE\n**Status:** blocked\n- [x] t\n");
        assert_eq!(parsed[0].status, Status::Blocked);
    }

    #[test]
    fn first_status_line_wins() {
        let parsed = sections("## A\n**Status:** ready\n**Status:** done\n");
        assert_eq!(parsed[0].status, Status::Ready);
    }

    #[test]
    fn narrative_sections_are_dropped() {
        let body = "\
## Feature A

**Status:** done

- [x] Task 1

## Discovered Issues

Some notes about issues.

## Feature B

**Status:** ready

- [ ] Task 2
";
        let titles: Vec<_> = sections(body).into_iter().map(|s| s.title).collect();
        assert_eq!(titles, vec!["Feature A", "Feature B"]);
    }

    #[test]
    fn status_without_tasks_is_kept() {
        let body = "## Planning\n\n**Status:** done\n\nNo tasks.\n\n## Execution\n**Status:** ready\n- [ ] go\n";
        let parsed = sections(body);
        assert_eq!(parsed.len(), 2);
        assert_eq!(parsed[0].task_total(), 0);
    }

    #[test]
    fn nested_headings_stay_in_section() {
        let body = "\
## Feature A

**Status:** in-progress

### Sub-feature 1
- [x] Sub task 1

### Sub-feature 2
- [ ] Sub task 2
";
        let parsed = sections(body);
        assert_eq!(parsed.len(), 1);
        assert_eq!(parsed[0].task_total(), 2);
    }

    #[test]
    fn section_order_follows_document() {
        let body = "## Zebra\n**Status:** ready\n## Apple\n**Status:** done\n## Mango\n- [ ] t\n";
        let titles: Vec<_> = sections(body).into_iter().map(|s| s.title).collect();
        assert_eq!(titles, vec!["Zebra", "Apple", "Mango"]);
    }

    #[test]
    fn plan_tag_not_duplicated() {
        let parsed = sections("## Feature\n**Status:** ready | **Tags:** plan, tui\n- [ ] t\n");
        assert_eq!(parsed[0].tags.as_slice(), ["plan", "tui"]);
    }

    #[test]
    fn body_and_source_are_kept() {
        let parsed = parse_plan_sections(
            "## Feature A\n\n**Status:** done\n\n- [x] Task\n",
            Path::new("/project/IMPLEMENTATION_PLAN.md"),
        );
        assert!(parsed[0].body.starts_with("## Feature A"));
        assert_eq!(parsed[0].source_path, Path::new("/project/IMPLEMENTATION_PLAN.md"));
    }

    #[test]
    fn task_tree_is_built_per_section() {
        let body = "## Feature\n**Status:** in-progress\n- [ ] Parent\n  - [x] Child\n  - [ ] Other\n";
        let parsed = sections(body);
        assert_eq!(parsed[0].tasks.len(), 3);
        assert_eq!(parsed[0].task_tree.len(), 1);
        assert_eq!(parsed[0].task_tree[0].children.len(), 2);
    }

    #[test]
    fn preamble_and_empty_bodies() {
        assert!(sections("").is_empty());
        assert!(sections("# Just a heading\n- [ ] loose task\n").is_empty());
    }
}
