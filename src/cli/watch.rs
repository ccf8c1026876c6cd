//! specdeck watch command implementation
//!
//! Prints the listing once, then again after every settled change.

use std::path::Path;
use std::sync::mpsc;

use crate::config::Config;
use crate::error::{Error, Result};
use crate::output::{emit_error, emit_success, OutputOptions};
use crate::scanner::scan;

use super::list::{build, ListFilter};

pub fn run(root: &Path, output: OutputOptions) -> Result<()> {
    let config = Config::load_from_root(root);
    let filter = ListFilter::default();

    let groups = scan(root, &config)?;
    let (report, human) = build(root, &config, &groups, &filter);
    emit_success(output, "watch", &report, &human)?;

    let (tx, rx) = mpsc::channel();
    let _handle = crate::watch::spawn(root.to_path_buf(), config.clone(), tx)?;

    for update in rx {
        match update {
            Ok(groups) => {
                let (report, human) = build(root, &config, &groups, &filter);
                emit_success(output, "watch", &report, &human)?;
            }
            Err(err) => {
                tracing::warn!(error = %err, "rescan failed");
                emit_error("watch", &err, output.json)?;
            }
        }
    }
    Err(Error::OperationFailed("watcher stopped".to_string()))
}
