//! Checkbox task extraction.
//!
//! One linear pass over the text builds the nested tree with an explicit
//! indentation stack; the flat list is the pre-order walk of that tree, so
//! both views always describe the same tasks in document order.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::model::Task;

/// `- [ ] text`, `  * [x] text`, `- [X]* text` (the trailing `*` marks optional tasks).
pub(crate) static TASK_LINE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?m)^([ \t]*)[-*+] \[([ xX])\]\*?[ \t]+(\S.*?)[ \t]*\r?$")
        .expect("valid task line regex")
});
static TASK_ID_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(T\d+)\s+").expect("valid task id regex"));
static STORY_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\[(US\d+)\]").expect("valid story regex"));

const PARALLEL_MARKER: &str = "[P]";
const TAB_WIDTH: usize = 4;

/// Tasks of one text, in both shapes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtractedTasks {
    /// Every task in document order.
    pub flat: Vec<Task>,
    /// Top-level tasks with their children nested.
    pub tree: Vec<Task>,
}

/// A checkbox line located in the source text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct TaskLine<'a> {
    /// Byte offset of the line start.
    pub offset: usize,
    pub indent: usize,
    pub done: bool,
    pub text: &'a str,
}

pub(crate) fn task_lines(text: &str) -> impl Iterator<Item = TaskLine<'_>> {
    TASK_LINE_RE.captures_iter(text).filter_map(|caps| {
        let whole = caps.get(0)?;
        let indent = caps.get(1).map_or(0, |m| indent_width(m.as_str()));
        let done = caps.get(2).is_some_and(|m| m.as_str().eq_ignore_ascii_case("x"));
        let text = caps.get(3)?.as_str();
        Some(TaskLine {
            offset: whole.start(),
            indent,
            done,
            text,
        })
    })
}

/// Whether the text holds at least one checkbox line.
pub fn has_tasks(text: &str) -> bool {
    TASK_LINE_RE.is_match(text)
}

/// Extract all checkbox tasks from markdown text.
pub fn extract_tasks(text: &str) -> ExtractedTasks {
    let tree = build_tree(task_lines(text));
    let mut flat = Vec::new();
    flatten_into(&tree, &mut flat);
    ExtractedTasks { flat, tree }
}

fn build_tree<'a>(lines: impl Iterator<Item = TaskLine<'a>>) -> Vec<Task> {
    let mut roots: Vec<Task> = Vec::new();
    // Open ancestors of the next line: (indent, task under construction).
    let mut stack: Vec<(usize, Task)> = Vec::new();

    for line in lines {
        while stack.last().is_some_and(|(indent, _)| *indent >= line.indent) {
            close_top(&mut stack, &mut roots);
        }

        let mut task = parse_task_text(line.text);
        task.done = line.done;
        task.depth = stack.len();
        stack.push((line.indent, task));
    }

    while !stack.is_empty() {
        close_top(&mut stack, &mut roots);
    }
    roots
}

fn close_top(stack: &mut Vec<(usize, Task)>, roots: &mut Vec<Task>) {
    if let Some((_, task)) = stack.pop() {
        match stack.last_mut() {
            Some((_, parent)) => parent.children.push(task),
            None => roots.push(task),
        }
    }
}

fn flatten_into(tasks: &[Task], out: &mut Vec<Task>) {
    for task in tasks {
        out.push(task.clone());
        flatten_into(&task.children, out);
    }
}

fn indent_width(whitespace: &str) -> usize {
    whitespace
        .chars()
        .map(|ch| if ch == '\t' { TAB_WIDTH } else { 1 })
        .sum()
}

/// Strip the task id, parallel marker, and story reference from task text.
///
/// Anything that does not match a marker exactly is left in the text.
pub fn parse_task_text(raw: &str) -> Task {
    let mut text = raw.trim().to_string();

    let task_id = TASK_ID_RE.captures(&text).and_then(|caps| {
        let id = caps.get(1)?.as_str().to_string();
        let end = caps.get(0)?.end();
        Some((id, end))
    });
    let task_id = task_id.map(|(id, end)| {
        text = text[end..].to_string();
        id
    });

    let parallel = text.contains(PARALLEL_MARKER);
    if parallel {
        text = text.replace(PARALLEL_MARKER, "");
    }

    let story = STORY_RE.captures(&text).and_then(|caps| {
        let token = caps.get(0)?.as_str().to_string();
        let story = caps.get(1)?.as_str().to_string();
        Some((token, story))
    });
    let story = story.map(|(token, story)| {
        text = text.replacen(&token, "", 1);
        story
    });

    Task {
        text: collapse_spaces(&text),
        task_id,
        parallel,
        story,
        ..Task::default()
    }
}

fn collapse_spaces(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_checked_and_unchecked() {
        let extracted = extract_tasks("## Tasks\n- [ ] Not done\n- [x] Done\n- [X] Also done\n");
        let texts: Vec<_> = extracted.flat.iter().map(|t| (t.text.as_str(), t.done)).collect();
        assert_eq!(
            texts,
            vec![("Not done", false), ("Done", true), ("Also done", true)]
        );
        assert_eq!(extracted.tree.len(), 3);
    }

    #[test]
    fn no_tasks_in_prose() {
        let extracted = extract_tasks("Just some text\nWith no tasks");
        assert!(extracted.flat.is_empty());
        assert!(extracted.tree.is_empty());
        assert!(!has_tasks("- plain bullet"));
    }

    #[test]
    fn nested_scenario_counts() {
        let extracted = extract_tasks("- [x] Done thing\n- [ ] Todo thing\n  - [ ] sub\n");
        assert_eq!(extracted.flat.len(), 3);
        assert_eq!(extracted.tree.len(), 2);
        assert_eq!(extracted.tree[1].children.len(), 1);
        assert_eq!(extracted.tree[1].children[0].text, "sub");
        assert_eq!(extracted.flat.iter().filter(|t| t.done).count(), 1);
    }

    #[test]
    fn three_level_tree() {
        let text = "\
- [ ] Define API
  - [x] REST endpoints
  - [ ] WebSocket handlers
    - [ ] Connection manager
    - [x] Message parser
";
        let extracted = extract_tasks(text);
        assert_eq!(extracted.flat.len(), 5);
        assert_eq!(extracted.tree.len(), 1);

        let root = &extracted.tree[0];
        assert_eq!(root.depth, 0);
        assert_eq!(root.subtask_total(), 4);
        assert_eq!(root.subtask_done(), 2);

        let handlers = &root.children[1];
        assert_eq!(handlers.text, "WebSocket handlers");
        assert_eq!(handlers.depth, 1);
        assert_eq!(handlers.children[0].depth, 2);
        assert_eq!(handlers.children[1].text, "Message parser");
        assert!(handlers.children[1].done);
    }

    #[test]
    fn four_space_indentation() {
        let text = "- [ ] Parent\n    - [ ] Child\n        - [ ] Grandchild\n";
        let extracted = extract_tasks(text);
        assert_eq!(extracted.tree.len(), 1);
        assert_eq!(extracted.tree[0].children[0].depth, 1);
        assert_eq!(extracted.tree[0].children[0].children[0].depth, 2);
    }

    #[test]
    fn dedent_returns_to_enclosing_level() {
        let text = "\
- [ ] Group A
  - [ ] A.1
    - [ ] A.1.a
  - [x] A.2
- [x] Group B
";
        let extracted = extract_tasks(text);
        assert_eq!(extracted.tree.len(), 2);
        assert_eq!(extracted.tree[0].children.len(), 2);
        assert_eq!(extracted.tree[0].children[1].text, "A.2");
        assert_eq!(extracted.tree[1].text, "Group B");
    }

    #[test]
    fn flat_list_is_preorder() {
        let text = "- [ ] a\n  - [ ] b\n- [ ] c\n";
        let extracted = extract_tasks(text);
        let texts: Vec<_> = extracted.flat.iter().map(|t| t.text.as_str()).collect();
        assert_eq!(texts, vec!["a", "b", "c"]);
        assert_eq!(extracted.flat[0].children.len(), 1);
    }

    #[test]
    fn optional_star_marker() {
        let extracted = extract_tasks("- [x]* Completed with star\n- [ ] Normal\n");
        assert_eq!(extracted.flat[0].text, "Completed with star");
        assert!(extracted.flat[0].done);
    }

    #[test]
    fn non_checkbox_bullets_ignored() {
        let text = "- Regular bullet\n- [ ] Actual task\n* Star bullet\n- [] not a box\n";
        let extracted = extract_tasks(text);
        assert_eq!(extracted.flat.len(), 1);
        assert_eq!(extracted.flat[0].text, "Actual task");
    }

    #[test]
    fn crlf_lines() {
        let extracted = extract_tasks("- [ ] one\r\n- [x] two\r\n");
        assert_eq!(extracted.flat.len(), 2);
        assert_eq!(extracted.flat[0].text, "one");
    }

    #[test]
    fn strips_all_markers() {
        let task = parse_task_text("T010 [P] [US2] Build login form");
        assert_eq!(task.text, "Build login form");
        assert_eq!(task.task_id.as_deref(), Some("T010"));
        assert!(task.parallel);
        assert_eq!(task.story.as_deref(), Some("US2"));
    }

    #[test]
    fn task_id_only() {
        let task = parse_task_text("T001 Configure project");
        assert_eq!(task.text, "Configure project");
        assert_eq!(task.task_id.as_deref(), Some("T001"));
        assert!(!task.parallel);
        assert!(task.story.is_none());
    }

    #[test]
    fn plain_text_untouched() {
        let task = parse_task_text("Just a plain task");
        assert_eq!(task.text, "Just a plain task");
        assert!(task.task_id.is_none());
    }

    #[test]
    fn malformed_markers_stay_in_text() {
        let task = parse_task_text("TX01 [US] fix [p] thing");
        assert_eq!(task.text, "TX01 [US] fix [p] thing");
        assert!(task.task_id.is_none());
        assert!(!task.parallel);
        assert!(task.story.is_none());
    }
}
