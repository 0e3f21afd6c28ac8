use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::utils::io;

/// Per-project config file name, looked up at the project root.
pub const CONFIG_FILE: &str = "importmap.json";

/// Root configuration structure for importmap.json
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ImportmapConfig {
    #[serde(default)]
    pub imports: ImportsConfig,

    #[serde(default)]
    pub install: InstallConfig,
}

/// Settings for the import path fixer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportsConfig {
    /// Directory (relative to the project) that rewritten specifiers are rooted at.
    #[serde(default = "default_source_root")]
    pub source_root: String,

    /// Source file extensions, without the dot. Order decides resolution priority.
    #[serde(default = "default_extensions")]
    pub extensions: Vec<String>,

    /// Directory names skipped at any depth.
    #[serde(default = "default_skip_dirs")]
    pub skip_dirs: Vec<String>,

    /// Skip dot-directories.
    #[serde(default = "default_skip_hidden")]
    pub skip_hidden: bool,
}

impl Default for ImportsConfig {
    fn default() -> Self {
        Self {
            source_root: default_source_root(),
            extensions: default_extensions(),
            skip_dirs: default_skip_dirs(),
            skip_hidden: default_skip_hidden(),
        }
    }
}

/// Settings for the install command.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InstallConfig {
    /// Bundler files removed once the conversion is done.
    #[serde(default = "default_bundler_files")]
    pub bundler_files: Vec<String>,

    /// npm packages that only exist for the bundler and are never pinned.
    #[serde(default = "default_ignored_dependencies")]
    pub ignored_dependencies: Vec<String>,

    /// Layout names under resources/views/layouts.
    #[serde(default = "default_layouts")]
    pub layouts: Vec<String>,

    #[serde(default = "default_public_js_dir")]
    pub public_js_dir: String,

    /// Command the pin list is appended to.
    #[serde(default = "default_pin_command")]
    pub pin_command: String,
}

impl Default for InstallConfig {
    fn default() -> Self {
        Self {
            bundler_files: default_bundler_files(),
            ignored_dependencies: default_ignored_dependencies(),
            layouts: default_layouts(),
            public_js_dir: default_public_js_dir(),
            pin_command: default_pin_command(),
        }
    }
}

// =============================================================================
// Default value functions
// =============================================================================

fn default_source_root() -> String {
    "resources/js".to_string()
}

fn default_extensions() -> Vec<String> {
    vec!["js".to_string()]
}

fn default_skip_dirs() -> Vec<String> {
    vec!["node_modules".to_string()]
}

fn default_skip_hidden() -> bool {
    true
}

fn default_bundler_files() -> Vec<String> {
    [
        "package.json",
        "package-lock.json",
        "webpack.mix.js",
        "postcss.config.js",
        "vite.config.js",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

fn default_ignored_dependencies() -> Vec<String> {
    [
        "@tailwindcss/forms",
        "@tailwindcss/typography",
        "autoprefixer",
        "laravel-vite-plugin",
        "postcss",
        "tailwindcss",
        "vite",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

fn default_layouts() -> Vec<String> {
    vec!["app".to_string(), "guest".to_string()]
}

fn default_public_js_dir() -> String {
    "public/js".to_string()
}

fn default_pin_command() -> String {
    "php artisan importmap:pin".to_string()
}

// =============================================================================
// Loading functions
// =============================================================================

/// Path to the project's importmap.json.
pub fn config_path(project_root: &Path) -> PathBuf {
    project_root.join(CONFIG_FILE)
}

/// Load importmap.json from the project root, merging it over built-in defaults.
///
/// A missing file yields the defaults; a file that fails to parse is an error.
pub fn load_config(project_root: &Path) -> crate::Result<ImportmapConfig> {
    let path = config_path(project_root);

    if !path.exists() {
        return Ok(ImportmapConfig::default());
    }

    let content = io::read_file(&path, "read")?;

    let config: ImportmapConfig = serde_json::from_str(&content)
        .map_err(|e| crate::Error::config_invalid_json(path.display().to_string(), e))?;

    validate(&config)?;

    Ok(config)
}

fn validate(config: &ImportmapConfig) -> crate::Result<()> {
    if config.imports.extensions.is_empty() {
        return Err(crate::Error::config_invalid_value(
            "imports.extensions",
            None,
            "At least one source extension is required",
        ));
    }

    if let Some(ext) = config
        .imports
        .extensions
        .iter()
        .find(|ext| ext.is_empty() || ext.starts_with('.'))
    {
        return Err(crate::Error::config_invalid_value(
            "imports.extensions",
            Some(ext.clone()),
            "Extensions are written without the leading dot",
        ));
    }

    Ok(())
}
