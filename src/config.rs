//! Configuration loading and management
//!
//! Handles parsing of `.specdeck.toml` configuration files. Without a file the
//! scan locations are auto-detected from the project layout.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::detect::detect_spec_sources;
use crate::error::{Error, Result};

/// Name of the project configuration file
pub const CONFIG_FILE: &str = ".specdeck.toml";

/// Main configuration structure
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Directories scanned recursively for markdown, relative to the project root
    #[serde(default = "default_spec_paths")]
    pub spec_paths: Vec<String>,

    /// Extra glob patterns for individual files, relative to the project root
    #[serde(default)]
    pub include: Vec<String>,

    /// Glob patterns of paths to skip, matched against project-relative paths
    #[serde(default = "default_exclude")]
    pub exclude: Vec<String>,

    /// Change watching configuration
    #[serde(default)]
    pub watch: WatchConfig,

    /// Set when scan paths came from auto-detection rather than a file
    #[serde(skip)]
    pub auto_detected: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            spec_paths: default_spec_paths(),
            include: Vec::new(),
            exclude: default_exclude(),
            watch: WatchConfig::default(),
            auto_detected: false,
        }
    }
}

fn default_spec_paths() -> Vec<String> {
    vec!["specs".to_string()]
}

fn default_exclude() -> Vec<String> {
    vec!["**/node_modules/**".to_string(), "**/.git/**".to_string()]
}

/// Change watching configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WatchConfig {
    /// Quiet period after the last change before rescanning
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,
}

fn default_debounce_ms() -> u64 {
    300
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            debounce_ms: default_debounce_ms(),
        }
    }
}

impl Config {
    /// Load configuration from a `.specdeck.toml` file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from the project root.
    ///
    /// A valid file wins; an invalid one falls back to defaults. Without a file
    /// the scan paths are auto-detected, or the defaults when nothing is found.
    pub fn load_from_root(root: &Path) -> Self {
        let config_path = root.join(CONFIG_FILE);
        if config_path.exists() {
            return match Self::load(&config_path) {
                Ok(config) => config,
                Err(err) => {
                    tracing::warn!(
                        path = %config_path.display(),
                        error = %err,
                        "invalid configuration, using defaults"
                    );
                    Self::default()
                }
            };
        }
        Self::auto_detect(root)
    }

    /// Build a configuration from the spec sources found under `root`.
    pub fn auto_detect(root: &Path) -> Self {
        let detected = detect_spec_sources(root);
        if detected.is_empty() {
            return Self::default();
        }
        tracing::debug!(sources = detected.len(), "auto-detected spec sources");
        Self {
            spec_paths: detected.into_iter().map(|source| source.path).collect(),
            auto_detected: true,
            ..Self::default()
        }
    }

    /// Save configuration to a file
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Absolute scan root directories for a project root.
    pub fn scan_roots(&self, root: &Path) -> Vec<PathBuf> {
        self.spec_paths
            .iter()
            .map(|spec_path| root.join(spec_path.trim_end_matches('/')))
            .collect()
    }

    /// Compiled exclude patterns.
    pub fn exclude_patterns(&self) -> Result<Vec<glob::Pattern>> {
        self.exclude
            .iter()
            .map(|pattern| compile_pattern(pattern, "exclude"))
            .collect()
    }

    fn validate(&self) -> Result<()> {
        for spec_path in &self.spec_paths {
            if spec_path.trim().is_empty() {
                return Err(Error::InvalidConfig(
                    "spec_paths cannot include empty entries".to_string(),
                ));
            }
        }
        for pattern in &self.include {
            compile_pattern(pattern, "include")?;
        }
        for pattern in &self.exclude {
            compile_pattern(pattern, "exclude")?;
        }
        if self.watch.debounce_ms == 0 {
            return Err(Error::InvalidConfig(
                "watch.debounce_ms must be > 0".to_string(),
            ));
        }
        Ok(())
    }
}

fn compile_pattern(pattern: &str, field: &str) -> Result<glob::Pattern> {
    if pattern.trim().is_empty() {
        return Err(Error::InvalidConfig(format!(
            "{field}: pattern cannot be empty"
        )));
    }
    glob::Pattern::new(pattern).map_err(|err| {
        Error::InvalidConfig(format!("{field}: invalid glob pattern '{pattern}': {err}"))
    })
}
