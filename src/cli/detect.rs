//! specdeck detect command implementation

use std::path::{Path, PathBuf};

use crate::detect::{detect_spec_sources, DetectedSource};
use crate::error::Result;
use crate::output::{emit_success, HumanOutput, OutputOptions};

#[derive(serde::Serialize)]
struct DetectReport {
    root: PathBuf,
    sources: Vec<DetectedSource>,
}

pub fn run(root: &Path, output: OutputOptions) -> Result<()> {
    let sources = detect_spec_sources(root);

    let header = if sources.is_empty() {
        "specdeck detect: no spec locations found".to_string()
    } else {
        format!("specdeck detect: {} location(s)", sources.len())
    };

    let mut human = HumanOutput::new(header);
    human.push_summary("root", root.display().to_string());
    human.push_section(
        "Locations",
        sources
            .iter()
            .map(|source| {
                format!(
                    "{} ({}, {} file(s)): {}",
                    source.path,
                    source.source.as_str(),
                    source.md_count,
                    source.description
                )
            })
            .collect(),
    );
    if !sources.is_empty() {
        human.push_next_step("specdeck init");
    }

    let report = DetectReport {
        root: root.to_path_buf(),
        sources,
    };
    emit_success(output, "detect", &report, &human)
}
