use clap::Args;
use serde::Serialize;
use std::path::PathBuf;

use importmap::defaults;
use importmap::import_paths::{self, CollectingSink, FailedImport, FixReport, FixerOptions};
use importmap::utils::validation;
use importmap::{Error, Result};

use super::CmdResult;

#[derive(Args)]
pub struct FixImportsArgs {
    /// Project directory
    #[arg(long, default_value = ".")]
    pub path: PathBuf,
    /// Source root relative to the project (overrides imports.source_root)
    #[arg(long)]
    pub root: Option<String>,
    /// Source extension, repeatable (overrides imports.extensions)
    #[arg(long = "ext", value_name = "EXT")]
    pub extensions: Vec<String>,
    /// Report rewrites without writing files
    #[arg(long)]
    pub dry_run: bool,
}

#[derive(Serialize)]
#[serde(tag = "command")]
pub enum FixImportsOutput {
    #[serde(rename = "fix-imports")]
    FixImports {
        #[serde(flatten)]
        report: FixReport,
        failures: Vec<FailedImport>,
    },
}

pub fn run(args: FixImportsArgs, _global: &super::GlobalArgs) -> CmdResult<FixImportsOutput> {
    validation::require_dir(&args.path, "path")?;
    let config = defaults::load_config(&args.path)?;

    let source_root = args.root.as_deref().unwrap_or(&config.imports.source_root);
    let root = args.path.join(source_root);

    let mut options = FixerOptions::from_config(&config.imports);
    options.report_base = Some(args.path.clone());
    options.dry_run = args.dry_run;
    if !args.extensions.is_empty() {
        options.extensions = normalize_extensions(&args.extensions)?;
    }

    let sink = CollectingSink::new();
    let report = import_paths::fix_import_paths(&root, &options, &sink)?;
    let exit_code = if report.unrewritten > 0 { 1 } else { 0 };

    Ok((
        FixImportsOutput::FixImports {
            report,
            failures: sink.into_failures(),
        },
        exit_code,
    ))
}

/// Accept `js` or `.js`; reject empty and compound extensions.
fn normalize_extensions(raw: &[String]) -> Result<Vec<String>> {
    raw.iter()
        .map(|ext| {
            let ext = validation::require_non_empty(ext, "ext", "Extension cannot be empty")?;
            let ext = ext.strip_prefix('.').unwrap_or(ext);
            if ext.is_empty() || ext.contains('.') || ext.contains('/') {
                return Err(Error::validation_invalid_argument(
                    "ext",
                    format!("Invalid extension: {}", ext),
                    None,
                    None,
                ));
            }
            Ok(ext.to_string())
        })
        .collect()
}
