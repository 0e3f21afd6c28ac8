//! Import path fixer: rewrite relative JS imports to import-map specifiers.
//!
//! Walks a source root, finds every relative `import`/`export` specifier,
//! resolves it against the importing file and rewrites it relative to the
//! root:
//!
//! 1. Enumerate source files (skipping configured and hidden directories)
//! 2. Scan each file for specifier literals
//! 3. Resolve relative specifiers; unresolvable ones go to the sink
//! 4. Splice replacements in, write back only files that changed

pub mod resolver;
pub mod scanner;
pub mod sink;

use serde::Serialize;
use std::path::{Path, PathBuf};

use crate::defaults::ImportsConfig;
use crate::error::{Error, Result};
use crate::utils::{io, validation};

pub use resolver::{FailureReason, Resolution};
pub use scanner::{ImportKind, ImportStatement, MalformedSpecifier, Scanned};
pub use sink::{CollectingSink, FailedImport, NotificationSink};

// ============================================================================
// Types
// ============================================================================

#[derive(Debug, Clone)]
pub struct FixerOptions {
    /// Source extensions without the dot, in resolution order.
    pub extensions: Vec<String>,
    pub skip_dirs: Vec<String>,
    pub skip_hidden: bool,
    /// Directory failure paths are reported relative to. Defaults to the root.
    pub report_base: Option<PathBuf>,
    /// Compute rewrites without touching the files.
    pub dry_run: bool,
}

impl FixerOptions {
    pub fn from_config(config: &ImportsConfig) -> Self {
        Self {
            extensions: config.extensions.clone(),
            skip_dirs: config.skip_dirs.clone(),
            skip_hidden: config.skip_hidden,
            report_base: None,
            dry_run: false,
        }
    }
}

impl Default for FixerOptions {
    fn default() -> Self {
        Self::from_config(&ImportsConfig::default())
    }
}

/// Everything a single-file rewrite needs.
#[derive(Debug, Clone)]
pub struct FixContext {
    root: PathBuf,
    options: FixerOptions,
}

impl FixContext {
    pub fn new(root: &Path, options: FixerOptions) -> Self {
        Self {
            root: root.to_path_buf(),
            options,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn options(&self) -> &FixerOptions {
        &self.options
    }

    fn display_path(&self, file: &Path) -> String {
        let base = self.options.report_base.as_deref().unwrap_or(&self.root);
        slash_path(file.strip_prefix(base).unwrap_or(file))
    }

    fn failure(&self, specifier: &str, file: &Path, line: usize, reason: FailureReason) -> FailedImport {
        FailedImport {
            original_statement: specifier.to_string(),
            file: self.display_path(file),
            line,
            reason,
        }
    }
}

/// Outcome of rewriting one file's content in memory.
#[derive(Debug, Clone)]
pub struct SourceRewrite {
    pub content: String,
    pub replacements: usize,
    pub failures: Vec<FailedImport>,
}

/// Per-file summary.
#[derive(Debug, Clone, Serialize)]
pub struct FileRewrite {
    /// File path relative to the report base.
    pub file: String,
    pub replacements: usize,
    #[serde(skip_serializing_if = "is_zero")]
    pub failures: usize,
    /// Whether new content was written to disk.
    pub written: bool,
}

/// Result of a full pass over a root.
#[derive(Debug, Clone, Serialize)]
pub struct FixReport {
    pub root: String,
    pub files_scanned: usize,
    pub files_modified: usize,
    pub total_replacements: usize,
    /// Relative specifiers left as written (each one was sent to the sink).
    pub unrewritten: usize,
    pub rewrites: Vec<FileRewrite>,
    pub dry_run: bool,
}

fn is_zero(v: &usize) -> bool {
    *v == 0
}

// ============================================================================
// Rewriting
// ============================================================================

/// Rewrite every relative specifier in `content`, which was read from `file`.
///
/// Touches the filesystem only to check that targets exist.
pub fn rewrite_source(content: &str, file: &Path, ctx: &FixContext) -> SourceRewrite {
    let mut edits: Vec<(usize, usize, String)> = Vec::new();
    let mut failures = Vec::new();

    for scanned in scanner::scan(content) {
        match scanned {
            Scanned::Statement(stmt) => {
                if !stmt.is_relative() {
                    continue;
                }
                match resolver::resolve(&stmt.specifier, file, &ctx.root, &ctx.options.extensions) {
                    Resolution::Rewritten(spec) => {
                        if spec != stmt.specifier {
                            edits.push((stmt.start, stmt.end, spec));
                        }
                    }
                    Resolution::Failed(reason) => {
                        failures.push(ctx.failure(&stmt.specifier, file, stmt.line, reason));
                    }
                }
            }
            Scanned::Malformed(bad) => {
                failures.push(ctx.failure(&bad.specifier, file, bad.line, FailureReason::Malformed));
            }
        }
    }

    let replacements = edits.len();

    // Replace from the end so earlier offsets stay valid
    edits.sort_by(|a, b| b.0.cmp(&a.0));
    let mut new_content = content.to_string();
    for (start, end, replacement) in &edits {
        new_content.replace_range(*start..*end, replacement);
    }

    SourceRewrite {
        content: new_content,
        replacements,
        failures,
    }
}

/// Rewrite one file in place, notifying `sink` of every specifier left alone.
///
/// The file is only written when at least one specifier changed.
pub fn fix_file(path: &Path, ctx: &FixContext, sink: &dyn NotificationSink) -> Result<FileRewrite> {
    let content = io::read_file(path, "read")?;
    let rewrite = rewrite_source(&content, path, ctx);
    let failures = rewrite.failures.len();

    for failure in rewrite.failures {
        sink.notify(failure);
    }

    let written = rewrite.replacements > 0 && !ctx.options.dry_run;
    if written {
        io::write_file_atomic(path, &rewrite.content, "write")?;
    }

    Ok(FileRewrite {
        file: ctx.display_path(path),
        replacements: rewrite.replacements,
        failures,
        written,
    })
}

/// Rewrite relative imports in every source file under `root`.
///
/// An unreadable directory or an unreadable or unwritable file does not stop
/// the pass; once everything reachable has been tried the first I/O error is
/// returned.
pub fn fix_import_paths(
    root: &Path,
    options: &FixerOptions,
    sink: &dyn NotificationSink,
) -> Result<FixReport> {
    validation::require_dir(root, "root")?;

    log_status!("imports", "Scanning {} for relative imports...", root.display());

    let (files, walk_failures) = walk_files(root, options);
    let ctx = FixContext::new(root, options.clone());

    let mut rewrites = Vec::new();
    let mut unrewritten = 0;
    let mut io_failures: Vec<(String, Error)> = walk_failures
        .into_iter()
        .map(|(path, err)| (ctx.display_path(&path), err))
        .collect();

    for file in &files {
        match fix_file(file, &ctx, sink) {
            Ok(outcome) => {
                unrewritten += outcome.failures;
                if outcome.replacements > 0 {
                    rewrites.push(outcome);
                }
            }
            Err(err) => io_failures.push((ctx.display_path(file), err)),
        }
    }

    if !io_failures.is_empty() {
        let failed: Vec<String> = io_failures.iter().map(|(file, _)| file.clone()).collect();
        let (_, first) = io_failures.remove(0);
        return Err(first.with_hint(format!(
            "Could not process {} file(s): {}",
            failed.len(),
            failed.join(", ")
        )));
    }

    let total_replacements: usize = rewrites.iter().map(|r| r.replacements).sum();
    let files_modified = rewrites.iter().filter(|r| r.written).count();

    log_status!(
        "imports",
        "Complete: {} files, {} rewritten specifiers, {} left unchanged",
        files.len(),
        total_replacements,
        unrewritten
    );

    Ok(FixReport {
        root: root.display().to_string(),
        files_scanned: files.len(),
        files_modified,
        total_replacements,
        unrewritten,
        rewrites,
        dry_run: options.dry_run,
    })
}

// ============================================================================
// File walking
// ============================================================================

/// Source files under `root` in sorted order, plus every path that could not
/// be listed or inspected.
fn walk_files(root: &Path, options: &FixerOptions) -> (Vec<PathBuf>, Vec<(PathBuf, Error)>) {
    let mut files = Vec::new();
    let mut failures = Vec::new();
    walk_recursive(root, options, &mut files, &mut failures);
    files.sort();
    failures.sort_by(|a, b| a.0.cmp(&b.0));
    (files, failures)
}

fn walk_error(e: std::io::Error, path: &Path) -> Error {
    Error::internal_io(e.to_string(), Some(format!("list {}", path.display())))
}

fn walk_recursive(
    dir: &Path,
    options: &FixerOptions,
    files: &mut Vec<PathBuf>,
    failures: &mut Vec<(PathBuf, Error)>,
) {
    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) => {
            failures.push((dir.to_path_buf(), walk_error(e, dir)));
            return;
        }
    };

    for entry in entries {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                failures.push((dir.to_path_buf(), walk_error(e, dir)));
                continue;
            }
        };
        let path = entry.path();
        let file_type = match entry.file_type() {
            Ok(file_type) => file_type,
            Err(e) => {
                failures.push((path.clone(), walk_error(e, &path)));
                continue;
            }
        };

        if file_type.is_dir() {
            let name = entry.file_name().to_string_lossy().to_string();
            if options.skip_hidden && name.starts_with('.') {
                continue;
            }
            if options.skip_dirs.iter().any(|skip| skip == &name) {
                continue;
            }
            walk_recursive(&path, options, files, failures);
        } else if path.is_file() && has_source_extension(&path, &options.extensions) {
            files.push(path);
        }
    }
}

fn has_source_extension(path: &Path, extensions: &[String]) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|ext| extensions.iter().any(|e| e == ext))
}

fn slash_path(path: &Path) -> String {
    path.components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

// ============================================================================
// Tests
// ============================================================================
