//! Project conversion from a bundler pipeline to import maps.
//!
//! Runs the install tasks in order:
//! 1. Rewrite relative JS imports under the source root
//! 2. Plan npm dependency pins from package.json
//! 3. Patch layouts for the detected bundler
//! 4. Remove bundler files
//! 5. Ignore the compiled public/js folder
//!
//! Anything the user has to follow up on is collected as an after-note.

pub mod layouts;
pub mod npm;
pub mod prune;

use serde::Serialize;
use std::path::Path;

use crate::defaults::ImportmapConfig;
use crate::import_paths::{self, CollectingSink, FailedImport, FixReport, FixerOptions};
use crate::utils::{io, validation};
use crate::Result;

pub use layouts::Bundler;
pub use npm::{Pin, PinPlan};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    Done,
    Failed,
    Warn,
    Skipped,
}

impl TaskStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Done => "DONE",
            TaskStatus::Failed => "FAIL",
            TaskStatus::Warn => "WARN",
            TaskStatus::Skipped => "SKIP",
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct TaskOutcome {
    pub task: String,
    pub status: TaskStatus,
    /// Files the task changed, relative to the project root.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub files: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct InstallReport {
    pub project: String,
    pub bundler: Bundler,
    pub tasks: Vec<TaskOutcome>,
    pub imports: FixReport,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub failed_imports: Vec<FailedImport>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pins: Option<PinPlan>,
    pub notes: Vec<String>,
}

struct Tasks {
    outcomes: Vec<TaskOutcome>,
}

impl Tasks {
    fn record(&mut self, task: &str, status: TaskStatus, files: Vec<String>) {
        log_status!("install", "{} ... {}", task, status.as_str());
        self.outcomes.push(TaskOutcome {
            task: task.to_string(),
            status,
            files,
        });
    }
}

/// Convert the project at `project_root`.
///
/// I/O failures abort the run; skipped imports and a missing or unreadable
/// package.json only produce notes.
pub fn run(project_root: &Path, config: &ImportmapConfig) -> Result<InstallReport> {
    validation::require_dir(project_root, "path")?;

    log_status!("install", "Installing importmap in {}", project_root.display());

    let mut tasks = Tasks {
        outcomes: Vec::new(),
    };
    let mut notes = Vec::new();

    let source_root = project_root.join(&config.imports.source_root);
    io::ensure_dir(&source_root, "create source root")?;

    // Imports
    let sink = CollectingSink::new();
    let options = FixerOptions {
        report_base: Some(project_root.to_path_buf()),
        ..FixerOptions::from_config(&config.imports)
    };
    let imports = import_paths::fix_import_paths(&source_root, &options, &sink)?;
    let failed_imports = sink.into_failures();
    notes.extend(failed_imports.iter().map(FailedImport::note));
    tasks.record(
        "converting js imports",
        if failed_imports.is_empty() {
            TaskStatus::Done
        } else {
            TaskStatus::Warn
        },
        imports.rewrites.iter().map(|r| r.file.clone()).collect(),
    );

    // Pins
    let pins = match npm::pins(project_root, &config.install) {
        Ok(Some(plan)) => {
            notes.push("Some dev dependencies could've been skipped...".to_string());
            notes.push(format!("Pin the remaining dependencies with: {}", plan.command));
            tasks.record("pinning dependencies from NPM", TaskStatus::Done, Vec::new());
            Some(plan)
        }
        Ok(None) => {
            notes.push("Pinning was skipped because of missing package.json".to_string());
            tasks.record("pinning dependencies from NPM", TaskStatus::Warn, Vec::new());
            None
        }
        Err(err) => {
            let detail = err.details["error"]
                .as_str()
                .map(str::to_string)
                .unwrap_or_else(|| err.message.clone());
            notes.push(format!("Pinning failed, package.json could not be read: {}", detail));
            tasks.record("pinning dependencies from NPM", TaskStatus::Failed, Vec::new());
            None
        }
    };

    // Layouts (detection must run before bundler files are removed)
    let bundler = Bundler::detect(project_root);
    let found_layouts = layouts::layout_files(project_root, &config.install.layouts);
    if found_layouts.is_empty() {
        tasks.record(bundler.task_description(), TaskStatus::Skipped, Vec::new());
    } else {
        let changed = layouts::patch_layouts(project_root, &config.install.layouts, bundler)?;
        tasks.record(bundler.task_description(), TaskStatus::Done, changed);
    }

    // Bundler files
    let removed = prune::remove_bundler_files(project_root, &config.install.bundler_files)?;
    tasks.record("removing NPM related files", TaskStatus::Done, removed);

    // .gitignore
    let ignore_task = format!("dumping & ignoring `{}` folder", config.install.public_js_dir);
    if prune::ignore_public_js(project_root, &config.install.public_js_dir)? {
        tasks.record(&ignore_task, TaskStatus::Done, vec![".gitignore".to_string()]);
    } else {
        tasks.record(&ignore_task, TaskStatus::Skipped, Vec::new());
    }

    log_status!("install", "Done! {} note(s) to review", notes.len());

    Ok(InstallReport {
        project: project_root.display().to_string(),
        bundler,
        tasks: tasks.outcomes,
        imports,
        failed_imports,
        pins,
        notes,
    })
}
