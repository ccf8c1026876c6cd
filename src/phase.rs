//! `## Phase N: title` grouping for phased task files.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::dialect::PHASE_HEADING_RE;
use crate::model::{Phase, Task};
use crate::task::task_lines;

static CHECKPOINT_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?m)^\*\*Checkpoint(?::\*\*|\*\*:)[ \t]*(.+?)[ \t]*\r?$")
        .expect("valid checkpoint regex")
});

struct PhaseSpan {
    start: usize,
    heading_end: usize,
    number: u32,
    title: String,
}

/// Assign `flat_tasks` (as extracted from `body`) to the phase headings that
/// precede them. Tasks before the first phase heading belong to no phase.
pub fn parse_phases(body: &str, flat_tasks: &[Task]) -> Vec<Phase> {
    let spans: Vec<PhaseSpan> = PHASE_HEADING_RE
        .captures_iter(body)
        .filter_map(|caps| {
            let whole = caps.get(0)?;
            let number = caps.get(1)?.as_str().parse().ok()?;
            Some(PhaseSpan {
                start: whole.start(),
                heading_end: whole.end(),
                number,
                title: caps.get(2)?.as_str().to_string(),
            })
        })
        .collect();
    if spans.is_empty() {
        return Vec::new();
    }

    let task_offsets: Vec<usize> = task_lines(body).map(|line| line.offset).collect();

    spans
        .iter()
        .enumerate()
        .map(|(i, span)| {
            let end = spans.get(i + 1).map_or(body.len(), |next| next.start);
            let section = &body[span.heading_end..end];

            let tasks = task_offsets
                .iter()
                .zip(flat_tasks)
                .filter(|(offset, _)| (span.start..end).contains(*offset))
                .map(|(_, task)| task.clone())
                .collect();

            Phase {
                number: span.number,
                title: span.title.clone(),
                subtitle: subtitle(&span.title, section),
                tasks,
                checkpoint: CHECKPOINT_RE
                    .captures(section)
                    .and_then(|caps| caps.get(1))
                    .map(|m| m.as_str().to_string()),
            }
        })
        .collect()
}

/// `US1 - Login Flow` yields `Login Flow`; otherwise a plain line directly
/// under the heading.
fn subtitle(title: &str, section: &str) -> Option<String> {
    if let Some((_, rest)) = title.split_once(" - ") {
        let rest = rest.trim();
        return (!rest.is_empty()).then(|| rest.to_string());
    }

    let after_heading = section
        .strip_prefix("\r\n")
        .or_else(|| section.strip_prefix('\n'))?;
    let next = after_heading.lines().next()?.trim();
    let is_plain = !next.is_empty()
        && !next.starts_with('#')
        && !next.starts_with("**Checkpoint")
        && !next.starts_with("- ")
        && !next.starts_with("* ")
        && !next.starts_with("+ ");
    if !is_plain {
        return None;
    }
    let unwrapped = next.trim_matches(|ch: char| ch == '*' || ch == '_').trim();
    (!unwrapped.is_empty()).then(|| unwrapped.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::task::extract_tasks;

    fn phases_of(body: &str) -> Vec<Phase> {
        let extracted = extract_tasks(body);
        parse_phases(body, &extracted.flat)
    }

    #[test]
    fn three_phases() {
        let body = "\
# Auth System Tasks

## Phase 1: Setup
- [x] T001 [P] Configure project structure
- [x] T002 Set up testing framework

**Checkpoint**: Foundation ready

## Phase 2: Core
- [ ] T003 [US1] Create user model
- [ ] T004 [P] [US1] Implement JWT

## Phase 3: Polish
- [ ] T005 [US2] Add error handling
";
        let phases = phases_of(body);
        assert_eq!(phases.len(), 3);

        assert_eq!(phases[0].number, 1);
        assert_eq!(phases[0].title, "Setup");
        assert_eq!(phases[0].task_total(), 2);
        assert_eq!(phases[0].task_done(), 2);
        assert_eq!(phases[0].task_percent(), 100);
        assert_eq!(phases[0].checkpoint.as_deref(), Some("Foundation ready"));

        assert_eq!(phases[1].title, "Core");
        assert_eq!(phases[1].task_total(), 2);
        assert!(phases[1].checkpoint.is_none());
        assert_eq!(phases[1].tasks[0].story.as_deref(), Some("US1"));

        assert_eq!(phases[2].task_total(), 1);
    }

    #[test]
    fn subtitle_from_title_suffix() {
        let phases = phases_of("## Phase 1: US1 - Login Flow\n- [ ] T001 Create login form\n");
        assert_eq!(phases[0].title, "US1 - Login Flow");
        assert_eq!(phases[0].subtitle.as_deref(), Some("Login Flow"));
    }

    #[test]
    fn subtitle_from_following_line() {
        let body = "## Phase 2: Foundational\n*Blocking prerequisites*\n- [ ] T010 Schema\n";
        let phases = phases_of(body);
        assert_eq!(phases[0].subtitle.as_deref(), Some("Blocking prerequisites"));
    }

    #[test]
    fn task_directly_under_heading_is_not_a_subtitle() {
        let phases = phases_of("## Phase 1: Setup\n- [ ] T001 Init\n");
        assert!(phases[0].subtitle.is_none());
    }

    #[test]
    fn tasks_before_first_phase_are_unassigned() {
        let body = "- [ ] T000 Preamble task\n## Phase 1: Setup\n- [ ] T001 Init\n";
        let extracted = extract_tasks(body);
        let phases = parse_phases(body, &extracted.flat);
        assert_eq!(extracted.flat.len(), 2);
        assert_eq!(phases.len(), 1);
        assert_eq!(phases[0].tasks.len(), 1);
        assert_eq!(phases[0].tasks[0].task_id.as_deref(), Some("T001"));
    }

    #[test]
    fn first_checkpoint_wins() {
        let body = "\
## Phase 1: Setup
- [x] T001 Init
**Checkpoint**: first
**Checkpoint:** second
";
        let phases = phases_of(body);
        assert_eq!(phases[0].checkpoint.as_deref(), Some("first"));
    }

    #[test]
    fn no_phase_headings() {
        assert!(phases_of("- [ ] T001 Loose\n").is_empty());
    }
}
