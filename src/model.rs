//! Normalized spec model
//!
//! Every scan produces a fresh tree of these values. Nothing here is mutated
//! after construction; aggregate counts are computed on demand from the owned
//! children so totals can never drift from the tasks they summarize.

use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

use serde::Serialize;

/// Tags the core assigns. Consumers may rely on these and nothing else.
pub mod tags {
    /// Group lives under a configured scan root.
    pub const SPECS: &str = "specs";
    /// Group was split out of a sectioned plan document.
    pub const PLAN: &str = "plan";
    /// Group is retired: complete plan section or under an `archive/` directory.
    pub const ARCHIVE: &str = "archive";

    /// All tags with core-defined meaning.
    pub const KNOWN: [&str; 3] = [SPECS, PLAN, ARCHIVE];
}

/// Lifecycle status of a spec, section, or group.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Status {
    #[default]
    Draft,
    Ready,
    InProgress,
    Done,
    Blocked,
}

impl Status {
    pub const ALL: [Status; 5] = [
        Status::Draft,
        Status::Ready,
        Status::InProgress,
        Status::Done,
        Status::Blocked,
    ];

    /// Parse leniently; anything unrecognized is `Draft`.
    pub fn parse(value: &str) -> Self {
        let normalized = normalize_word(value);
        Self::ALL
            .into_iter()
            .find(|status| status.as_str() == normalized)
            .unwrap_or_default()
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Status::Draft => "draft",
            Status::Ready => "ready",
            Status::InProgress => "in-progress",
            Status::Done => "done",
            Status::Blocked => "blocked",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Priority of a spec, section, or group.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
    Critical,
}

impl Priority {
    pub const ALL: [Priority; 4] = [
        Priority::Low,
        Priority::Medium,
        Priority::High,
        Priority::Critical,
    ];

    /// Parse leniently; anything unrecognized is `Medium`.
    pub fn parse(value: &str) -> Self {
        let normalized = normalize_word(value);
        Self::ALL
            .into_iter()
            .find(|priority| priority.as_str() == normalized)
            .unwrap_or_default()
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Priority::Low => "low",
            Priority::Medium => "medium",
            Priority::High => "high",
            Priority::Critical => "critical",
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn normalize_word(value: &str) -> String {
    value
        .trim()
        .to_lowercase()
        .chars()
        .map(|ch| if ch == '_' || ch == ' ' { '-' } else { ch })
        .collect()
}

/// Role a file plays inside its group. Ordering is the aggregation order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Spec,
    Design,
    Tasks,
}

impl Role {
    /// Infer the role from a file stem (`design`, `tasks`/`todo`, else spec).
    pub fn from_stem(stem: &str) -> Self {
        match stem.to_lowercase().as_str() {
            "design" => Role::Design,
            "tasks" | "todo" => Role::Tasks,
            _ => Role::Spec,
        }
    }

    /// Parse an explicit header value; `None` for anything unknown.
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "spec" => Some(Role::Spec),
            "design" => Some(Role::Design),
            "tasks" => Some(Role::Tasks),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Role::Spec => "spec",
            Role::Design => "design",
            Role::Tasks => "tasks",
        }
    }
}

/// Document convention a file was written in.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Dialect {
    /// Path-marked IDE convention (`.kiro/`).
    Kiro,
    /// `## Phase N:` headings with `T###` task identifiers.
    Phased,
    /// Several `##` sections carrying bold `Status:` lines.
    SectionedPlan,
    /// `## N.` numbered sections.
    Numbered,
    #[default]
    Generic,
}

impl Dialect {
    pub fn as_str(self) -> &'static str {
        match self {
            Dialect::Kiro => "kiro",
            Dialect::Phased => "phased",
            Dialect::SectionedPlan => "sectioned-plan",
            Dialect::Numbered => "numbered",
            Dialect::Generic => "generic",
        }
    }

    /// Detection priority; lower wins when a group mixes dialects.
    pub fn rank(self) -> u8 {
        match self {
            Dialect::Kiro => 0,
            Dialect::Phased => 1,
            Dialect::SectionedPlan => 2,
            Dialect::Numbered => 3,
            Dialect::Generic => 4,
        }
    }
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Ordered, duplicate-free tag list.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Tags(Vec<String>);

impl Tags {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a tag unless it is empty or already present. Returns whether it was added.
    pub fn insert(&mut self, tag: impl Into<String>) -> bool {
        let tag = tag.into();
        let tag = tag.trim();
        if tag.is_empty() || self.contains(tag) {
            return false;
        }
        self.0.push(tag.to_string());
        true
    }

    pub fn extend<I, S>(&mut self, tags: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for tag in tags {
            self.insert(tag);
        }
    }

    pub fn contains(&self, tag: &str) -> bool {
        self.0.iter().any(|existing| existing == tag)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_slice(&self) -> &[String] {
        &self.0
    }
}

impl<S: Into<String>> FromIterator<S> for Tags {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let mut tags = Tags::new();
        tags.extend(iter);
        tags
    }
}

/// A checkbox task. Children are owned; counts are derived from them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Task {
    pub text: String,
    pub done: bool,
    pub depth: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub task_id: Option<String>,
    pub parallel: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub story: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<Task>,
}

impl Task {
    /// Number of descendants.
    pub fn subtask_total(&self) -> usize {
        self.children
            .iter()
            .map(|child| 1 + child.subtask_total())
            .sum()
    }

    /// Number of completed descendants.
    pub fn subtask_done(&self) -> usize {
        self.children
            .iter()
            .map(|child| usize::from(child.done) + child.subtask_done())
            .sum()
    }
}

/// A `## Phase N:` block of a phased tasks file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Phase {
    pub number: u32,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subtitle: Option<String>,
    pub tasks: Vec<Task>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub checkpoint: Option<String>,
}

impl Phase {
    pub fn task_total(&self) -> usize {
        self.tasks.len()
    }

    pub fn task_done(&self) -> usize {
        count_done(&self.tasks)
    }

    pub fn task_percent(&self) -> u8 {
        percent(self.task_done(), self.task_total())
    }
}

/// One trackable unit split out of a sectioned plan document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlanSection {
    pub title: String,
    pub status: Status,
    pub priority: Priority,
    pub tags: Tags,
    pub tasks: Vec<Task>,
    pub task_tree: Vec<Task>,
    pub body: String,
    pub source_path: PathBuf,
}

impl PlanSection {
    pub fn task_total(&self) -> usize {
        self.tasks.len()
    }

    pub fn task_done(&self) -> usize {
        count_done(&self.tasks)
    }

    pub fn task_percent(&self) -> u8 {
        percent(self.task_done(), self.task_total())
    }

    /// Explicitly done, or every task checked.
    pub fn is_complete(&self) -> bool {
        self.status == Status::Done
            || (self.task_total() > 0 && self.task_done() == self.task_total())
    }
}

/// One parsed markdown document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SpecFile {
    pub path: PathBuf,
    pub title: String,
    pub status: Status,
    pub priority: Priority,
    pub tags: Tags,
    #[serde(skip)]
    pub body: String,
    pub tasks: Vec<Task>,
    pub task_tree: Vec<Task>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub phases: Vec<Phase>,
    pub dialect: Dialect,
    pub role: Role,
}

impl SpecFile {
    pub fn task_total(&self) -> usize {
        self.tasks.len()
    }

    pub fn task_done(&self) -> usize {
        count_done(&self.tasks)
    }

    pub fn task_percent(&self) -> u8 {
        percent(self.task_done(), self.task_total())
    }
}

/// How a group came to exist.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum GroupKind {
    /// Files sharing a directory under a scan root.
    Directory,
    /// A single file directly in a scan root or matched by an include pattern.
    Standalone,
    /// A virtual group synthesized from one plan section.
    Plan,
}

/// The unit consumers render: related files plus their aggregates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SpecGroup {
    pub name: String,
    pub path: PathBuf,
    pub kind: GroupKind,
    pub files: BTreeMap<Role, SpecFile>,
    pub tags: Tags,
}

impl SpecGroup {
    pub fn spec(&self) -> Option<&SpecFile> {
        self.files.get(&Role::Spec)
    }

    pub fn design(&self) -> Option<&SpecFile> {
        self.files.get(&Role::Design)
    }

    pub fn tasks_file(&self) -> Option<&SpecFile> {
        self.files.get(&Role::Tasks)
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.contains(tag)
    }

    pub fn is_archived(&self) -> bool {
        self.has_tag(tags::ARCHIVE)
    }

    pub fn is_plan(&self) -> bool {
        self.kind == GroupKind::Plan
    }

    pub fn title(&self) -> String {
        if let Some(spec) = self.spec().filter(|spec| !spec.title.is_empty()) {
            return spec.title.clone();
        }
        self.files
            .values()
            .map(|file| file.title.as_str())
            .find(|title| !title.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| crate::frontmatter::humanize(&self.name))
    }

    /// First non-draft status across members, in role order.
    pub fn status(&self) -> Status {
        self.files
            .values()
            .map(|file| file.status)
            .find(|status| *status != Status::default())
            .unwrap_or_default()
    }

    /// First non-medium priority across members, in role order.
    pub fn priority(&self) -> Priority {
        self.files
            .values()
            .map(|file| file.priority)
            .find(|priority| *priority != Priority::default())
            .unwrap_or_default()
    }

    pub fn all_tasks(&self) -> impl Iterator<Item = &Task> {
        self.files.values().flat_map(|file| file.tasks.iter())
    }

    pub fn task_trees(&self) -> impl Iterator<Item = &Task> {
        self.files.values().flat_map(|file| file.task_tree.iter())
    }

    pub fn task_total(&self) -> usize {
        self.files.values().map(SpecFile::task_total).sum()
    }

    pub fn task_done(&self) -> usize {
        self.files.values().map(SpecFile::task_done).sum()
    }

    pub fn task_percent(&self) -> u8 {
        percent(self.task_done(), self.task_total())
    }

    /// Phases of the tasks file first, then those of the other members.
    pub fn phases(&self) -> Vec<&Phase> {
        let tasks_phases = self.tasks_file().into_iter().flat_map(|f| f.phases.iter());
        let other_phases = self
            .files
            .iter()
            .filter(|(role, _)| **role != Role::Tasks)
            .flat_map(|(_, file)| file.phases.iter());
        tasks_phases.chain(other_phases).collect()
    }

    /// Unique story references across all tasks, first-seen order.
    pub fn stories(&self) -> Vec<&str> {
        let mut seen: Vec<&str> = Vec::new();
        for story in self.all_tasks().filter_map(|task| task.story.as_deref()) {
            if !seen.contains(&story) {
                seen.push(story);
            }
        }
        seen
    }

    pub fn dialect(&self) -> Dialect {
        self.files
            .values()
            .map(|file| file.dialect)
            .min_by_key(|dialect| dialect.rank())
            .unwrap_or_default()
    }
}

fn count_done(tasks: &[Task]) -> usize {
    tasks.iter().filter(|task| task.done).count()
}

fn percent(done: usize, total: usize) -> u8 {
    if total == 0 {
        return 0;
    }
    // done <= total, so the quotient is at most 100.
    u8::try_from(done * 100 / total).unwrap_or(100)
}
