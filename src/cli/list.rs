//! specdeck list command implementation
//!
//! Scans the project and prints groups partitioned by tag membership.

use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::config::Config;
use crate::error::{Error, Result};
use crate::model::{tags, Priority, SpecGroup, Status};
use crate::output::{emit_success, HumanOutput, OutputOptions};
use crate::scanner::scan;

/// Options for the list command
pub struct ListOptions {
    pub root: PathBuf,
    pub tag: Option<String>,
    pub status: Option<String>,
    pub all: bool,
    pub output: OutputOptions,
}

/// Filters applied before partitioning.
#[derive(Debug, Clone, Default)]
pub(crate) struct ListFilter {
    pub tag: Option<String>,
    pub status: Option<Status>,
    pub all: bool,
}

#[derive(Serialize)]
pub(crate) struct ListReport {
    root: PathBuf,
    auto_detected: bool,
    spec_paths: Vec<String>,
    active: Vec<GroupSummary>,
    specs: Vec<GroupSummary>,
    plan: Vec<GroupSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    archive: Option<Vec<GroupSummary>>,
    archived_count: usize,
}

#[derive(Serialize)]
struct GroupSummary {
    name: String,
    title: String,
    path: PathBuf,
    kind: crate::model::GroupKind,
    status: Status,
    priority: Priority,
    dialect: crate::model::Dialect,
    tags: Vec<String>,
    roles: Vec<&'static str>,
    task_done: usize,
    task_total: usize,
    task_percent: u8,
}

impl GroupSummary {
    fn from_group(group: &SpecGroup) -> Self {
        Self {
            name: group.name.clone(),
            title: group.title(),
            path: group.path.clone(),
            kind: group.kind,
            status: group.status(),
            priority: group.priority(),
            dialect: group.dialect(),
            tags: group.tags.as_slice().to_vec(),
            roles: group.files.keys().map(|role| role.as_str()).collect(),
            task_done: group.task_done(),
            task_total: group.task_total(),
            task_percent: group.task_percent(),
        }
    }

    fn line(&self) -> String {
        let tasks = if self.task_total > 0 {
            format!("{}/{} ({}%)", self.task_done, self.task_total, self.task_percent)
        } else {
            "-".to_string()
        };
        format!(
            "{} [{}] {} priority, tasks {}, files: {}",
            self.title,
            self.status,
            self.priority,
            tasks,
            self.roles.join(", ")
        )
    }
}

pub fn run(options: ListOptions) -> Result<()> {
    let status = options
        .status
        .as_deref()
        .map(parse_status_filter)
        .transpose()?;
    let filter = ListFilter {
        tag: options.tag,
        status,
        all: options.all,
    };

    let config = Config::load_from_root(&options.root);
    let groups = scan(&options.root, &config)?;
    let (report, human) = build(&options.root, &config, &groups, &filter);

    emit_success(options.output, "list", &report, &human)
}

fn parse_status_filter(value: &str) -> Result<Status> {
    let status = Status::parse(value);
    // parse() is lenient; reject values that only matched by defaulting.
    if status == Status::Draft && !value.trim().eq_ignore_ascii_case("draft") {
        return Err(Error::InvalidArgument(format!(
            "unknown status '{value}' (expected one of: {})",
            Status::ALL.map(Status::as_str).join(", ")
        )));
    }
    Ok(status)
}

/// Partition and render one scan result.
pub(crate) fn build(
    root: &Path,
    config: &Config,
    groups: &[SpecGroup],
    filter: &ListFilter,
) -> (ListReport, HumanOutput) {
    let selected: Vec<&SpecGroup> = groups
        .iter()
        .filter(|group| filter.tag.as_deref().map_or(true, |tag| group.has_tag(tag)))
        .filter(|group| filter.status.map_or(true, |status| group.status() == status))
        .collect();

    let summarize = |predicate: &dyn Fn(&SpecGroup) -> bool| -> Vec<GroupSummary> {
        selected
            .iter()
            .filter(|group| predicate(**group))
            .map(|group| GroupSummary::from_group(group))
            .collect()
    };

    let active = summarize(&|group: &SpecGroup| {
        !group.has_tag(tags::ARCHIVE) && !group.has_tag(tags::PLAN) && !group.has_tag(tags::SPECS)
    });
    let specs = summarize(&|group: &SpecGroup| group.has_tag(tags::SPECS) && !group.has_tag(tags::ARCHIVE));
    let plan = summarize(&|group: &SpecGroup| group.has_tag(tags::PLAN) && !group.has_tag(tags::ARCHIVE));
    let archive = summarize(&|group: &SpecGroup| group.has_tag(tags::ARCHIVE));
    let archived_count = archive.len();

    let shown = active.len() + specs.len() + plan.len();
    let header = if selected.is_empty() {
        "specdeck list: no specs found".to_string()
    } else {
        format!("specdeck list: {shown} group(s)")
    };

    let mut human = HumanOutput::new(header);
    human.push_summary("root", root.display().to_string());
    human.push_summary("spec paths", config.spec_paths.join(", "));
    human.push_section("Active", active.iter().map(GroupSummary::line).collect());
    human.push_section("Specs", specs.iter().map(GroupSummary::line).collect());
    human.push_section("Plan", plan.iter().map(GroupSummary::line).collect());
    if filter.all {
        human.push_section("Archive", archive.iter().map(GroupSummary::line).collect());
    } else if archived_count > 0 {
        human.push_note(format!("{archived_count} archived group(s) hidden"));
        human.push_next_step("specdeck list --all");
    }
    if selected.is_empty() {
        human.push_next_step("specdeck detect");
        if !root.join(crate::config::CONFIG_FILE).exists() {
            human.push_next_step("specdeck init");
        }
    }

    let report = ListReport {
        root: root.to_path_buf(),
        auto_detected: config.auto_detected,
        spec_paths: config.spec_paths.clone(),
        active,
        specs,
        plan,
        archive: filter.all.then_some(archive),
        archived_count,
    };
    (report, human)
}
