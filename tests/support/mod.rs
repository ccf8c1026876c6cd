#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

use tempfile::TempDir;

pub struct TestProject {
    dir: TempDir,
}

impl TestProject {
    pub fn new() -> Self {
        let dir = tempfile::tempdir().expect("failed to create tempdir");
        Self { dir }
    }

    /// A project created under the working directory, for relative-root scans.
    pub fn in_current_dir() -> Self {
        let dir = tempfile::Builder::new()
            .prefix("specdeck-rel")
            .tempdir_in(".")
            .expect("failed to create tempdir in working directory");
        Self { dir }
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// `./<name>` for projects made by `in_current_dir`.
    pub fn relative_path(&self) -> PathBuf {
        let name = self.dir.path().file_name().expect("tempdir name");
        Path::new(".").join(name)
    }

    pub fn write_file(&self, rel_path: &str, contents: &str) -> PathBuf {
        let path = self.dir.path().join(rel_path);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("create parent dirs");
        }
        fs::write(&path, contents).expect("write file");
        path
    }

    pub fn write_config(&self, contents: &str) -> PathBuf {
        self.write_file(".specdeck.toml", contents)
    }

    pub fn mkdir(&self, rel_path: &str) -> PathBuf {
        let path = self.dir.path().join(rel_path);
        fs::create_dir_all(&path).expect("create dir");
        path
    }
}

pub const PHASED_TASKS: &str = "\
---
title: Auth System
status: in-progress
---

# Auth System Tasks

## Phase 1: Setup
- [x] T001 [P] Configure project structure
- [x] T002 [P] Set up testing framework

**Checkpoint**: Foundation ready

## Phase 2: US1 - Login Flow
- [x] T003 [P] [US1] Create User model
- [ ] T004 [US1] Implement JWT validation
  - [ ] Check expiry
";

pub const PLAN: &str = "\
# Implementation Plan

## Feature A — DONE

- [x] Build API
- [x] Add tests

## Feature B

**Status:** in-progress | **Priority:** high | **Tags:** tui

- [x] Create widget
- [ ] Add styling

## Discovered Issues

Some notes about issues.
";
