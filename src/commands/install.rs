use clap::Args;
use serde::Serialize;
use std::path::PathBuf;

use importmap::defaults;
use importmap::install::{self, InstallReport};

use super::CmdResult;

#[derive(Args)]
pub struct InstallArgs {
    /// Project directory to convert
    #[arg(long, default_value = ".")]
    pub path: PathBuf,
}

#[derive(Serialize)]
#[serde(tag = "command")]
pub enum InstallOutput {
    #[serde(rename = "install")]
    Install {
        #[serde(flatten)]
        report: InstallReport,
    },
}

pub fn run(args: InstallArgs, _global: &super::GlobalArgs) -> CmdResult<InstallOutput> {
    let config = defaults::load_config(&args.path)?;
    let report = install::run(&args.path, &config)?;

    Ok((InstallOutput::Install { report }, 0))
}
