use clap::Args;
use serde::Serialize;
use std::path::PathBuf;

use importmap::defaults;
use importmap::install::npm::{self, PinPlan};
use importmap::utils::validation;
use importmap::Error;

use super::CmdResult;

#[derive(Args)]
pub struct PinsArgs {
    /// Project directory containing package.json
    #[arg(long, default_value = ".")]
    pub path: PathBuf,
}

#[derive(Serialize)]
#[serde(tag = "command")]
pub enum PinsOutput {
    #[serde(rename = "pins")]
    Pins {
        #[serde(flatten)]
        plan: PinPlan,
    },
}

pub fn run(args: PinsArgs, _global: &super::GlobalArgs) -> CmdResult<PinsOutput> {
    validation::require_dir(&args.path, "path")?;
    let config = defaults::load_config(&args.path)?;

    let plan = npm::pins(&args.path, &config.install)?.ok_or_else(|| {
        Error::validation_invalid_argument(
            "path",
            format!("No package.json in {}", args.path.display()),
            None,
            None,
        )
        .with_hint("Pins are computed from the dependencies declared in package.json")
    })?;

    Ok((PinsOutput::Pins { plan }, 0))
}
