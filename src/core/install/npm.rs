//! package.json reading and import-map pin planning.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

use crate::defaults::InstallConfig;
use crate::error::{Error, Result};
use crate::utils::io;

/// Packages pinned without a version constraint.
const UNVERSIONED_PINS: &[&str] = &["axios"];

#[derive(Debug, Default, Deserialize)]
struct PackageManifest {
    #[serde(default)]
    dependencies: BTreeMap<String, String>,
    #[serde(default, rename = "devDependencies")]
    dev_dependencies: BTreeMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Pin {
    pub package: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    /// Argument as passed to the pin command.
    pub argument: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct PinPlan {
    pub pins: Vec<Pin>,
    /// Declared packages left out because they only serve the bundler.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub skipped: Vec<String>,
    pub command: String,
}

/// Build a pin plan from package.json content.
///
/// `devDependencies` override `dependencies` for the same package.
pub fn plan_pins(manifest: &str, config: &InstallConfig) -> Result<PinPlan> {
    let manifest: PackageManifest = serde_json::from_str(manifest)
        .map_err(|e| Error::validation_invalid_json(e, Some("parse package.json".to_string())))?;

    let mut merged = manifest.dependencies;
    merged.extend(manifest.dev_dependencies);

    let mut pins = Vec::new();
    let mut skipped = Vec::new();

    for (package, version) in merged {
        if config.ignored_dependencies.iter().any(|ignored| ignored == &package) {
            skipped.push(package);
            continue;
        }

        let pin = if UNVERSIONED_PINS.contains(&package.as_str()) {
            Pin {
                argument: package.clone(),
                package,
                version: None,
            }
        } else {
            Pin {
                argument: format!("\"{}@{}\"", package, version),
                package,
                version: Some(version),
            }
        };
        pins.push(pin);
    }

    let arguments: Vec<&str> = pins.iter().map(|p| p.argument.as_str()).collect();
    let command = if arguments.is_empty() {
        config.pin_command.clone()
    } else {
        format!("{} {}", config.pin_command, arguments.join(" "))
    };

    Ok(PinPlan {
        pins,
        skipped,
        command,
    })
}

/// Read `<project>/package.json` and plan its pins. `None` when there is no
/// package.json.
pub fn pins(project_root: &Path, config: &InstallConfig) -> Result<Option<PinPlan>> {
    let path = project_root.join("package.json");
    if !path.is_file() {
        return Ok(None);
    }

    let content = io::read_file(&path, "read")?;
    plan_pins(&content, config).map(Some)
}
