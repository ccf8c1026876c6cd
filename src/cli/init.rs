//! specdeck init command implementation
//!
//! Writes `.specdeck.toml` with the spec locations detected in the project.

use std::path::{Path, PathBuf};

use crate::config::{Config, CONFIG_FILE};
use crate::error::{Error, Result};
use crate::output::{emit_success, HumanOutput, OutputOptions};

#[derive(serde::Serialize)]
struct InitReport {
    config_path: PathBuf,
    created: bool,
    auto_detected: bool,
    spec_paths: Vec<String>,
}

pub fn run(root: &Path, force: bool, output: OutputOptions) -> Result<()> {
    let config_path = root.join(CONFIG_FILE);
    if config_path.exists() && !force {
        return Err(Error::InvalidArgument(format!(
            "{} already exists (use --force to overwrite)",
            config_path.display()
        )));
    }

    let config = Config::auto_detect(root);
    config.save(&config_path)?;
    tracing::debug!(path = %config_path.display(), "wrote configuration");

    let header = if config.auto_detected {
        "specdeck init: wrote detected spec paths".to_string()
    } else {
        "specdeck init: wrote default configuration".to_string()
    };

    let mut human = HumanOutput::new(header);
    human.push_summary("config", config_path.display().to_string());
    human.push_summary("spec paths", config.spec_paths.join(", "));
    if !config.auto_detected {
        human.push_warning("no spec locations detected; using defaults");
    }
    human.push_next_step("specdeck list");

    let report = InitReport {
        config_path,
        created: true,
        auto_detected: config.auto_detected,
        spec_paths: config.spec_paths.clone(),
    };
    emit_success(output, "init", &report, &human)
}
