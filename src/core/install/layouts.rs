//! Layout template patching: swap bundler asset tags for the import-map tags.

use regex::{NoExpand, Regex};
use serde::Serialize;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::utils::io;

pub const IMPORTMAP_TAGS: &str = "<x-importmap::tags />";

const MIX_SCRIPT_TAG: &str = "<script src=\"{{ mix('js/app.js') }}\" defer></script>";

/// Which asset pipeline the layouts were written for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Bundler {
    Mix,
    Vite,
    None,
}

impl Bundler {
    /// Detect from the bundler config files at the project root. Mix wins
    /// when both are present.
    pub fn detect(project_root: &Path) -> Self {
        if project_root.join("webpack.mix.js").exists() {
            Bundler::Mix
        } else if project_root.join("vite.config.js").exists() {
            Bundler::Vite
        } else {
            Bundler::None
        }
    }

    pub fn task_description(&self) -> &'static str {
        match self {
            Bundler::Mix => "replacing Mix functions in layouts",
            Bundler::Vite => "replacing Vite functions in layouts",
            Bundler::None => "adding importmap tags to layouts",
        }
    }
}

/// Existing `resources/views/layouts/<name>.blade.php` files.
pub fn layout_files(project_root: &Path, layouts: &[String]) -> Vec<PathBuf> {
    layouts
        .iter()
        .map(|name| {
            project_root
                .join("resources")
                .join("views")
                .join("layouts")
                .join(format!("{}.blade.php", name))
        })
        .filter(|path| path.is_file())
        .collect()
}

fn pattern(re: &str) -> Result<Regex> {
    Regex::new(re).map_err(|e| Error::internal_unexpected(format!("invalid pattern {}: {}", re, e)))
}

/// Patch one layout's content for the given bundler.
pub fn patch_layout(content: &str, bundler: Bundler) -> Result<String> {
    match bundler {
        Bundler::Mix => Ok(content.replace(MIX_SCRIPT_TAG, IMPORTMAP_TAGS)),
        Bundler::Vite => {
            let directive = pattern(r"@vite.*")?;
            let empty_directive_line = pattern(r".*@vite\(\[\]\).*\n")?;

            let replaced = directive.replace_all(content, NoExpand(IMPORTMAP_TAGS));
            Ok(empty_directive_line
                .replace_all(&replaced, NoExpand(""))
                .into_owned())
        }
        Bundler::None => {
            if content.contains(IMPORTMAP_TAGS) {
                return Ok(content.to_string());
            }
            let head_close = pattern(r"([ \t]*)</head>")?;
            Ok(head_close
                .replace_all(content, format!("${{1}}    {}\n${{1}}</head>", IMPORTMAP_TAGS))
                .into_owned())
        }
    }
}

/// Patch every existing layout, writing only those whose content changed.
/// Returns the changed files relative to the project root.
pub fn patch_layouts(project_root: &Path, layouts: &[String], bundler: Bundler) -> Result<Vec<String>> {
    let mut changed = Vec::new();

    for path in layout_files(project_root, layouts) {
        let content = io::read_file(&path, "read layout")?;
        let patched = patch_layout(&content, bundler)?;

        if patched != content {
            io::write_file(&path, &patched, "write layout")?;
            changed.push(
                path.strip_prefix(project_root)
                    .unwrap_or(&path)
                    .to_string_lossy()
                    .to_string(),
            );
        }
    }

    Ok(changed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    const HEAD: &str = "<html>\n    <head>\n        <title>App</title>\n    </head>\n</html>\n";

    #[test]
    fn detect_prefers_mix() {
        let dir = TempDir::new().unwrap();
        assert_eq!(Bundler::detect(dir.path()), Bundler::None);

        fs::write(dir.path().join("vite.config.js"), "").unwrap();
        assert_eq!(Bundler::detect(dir.path()), Bundler::Vite);

        fs::write(dir.path().join("webpack.mix.js"), "").unwrap();
        assert_eq!(Bundler::detect(dir.path()), Bundler::Mix);
    }

    #[test]
    fn mix_script_tag_is_replaced() {
        let content = "<head>\n    <script src=\"{{ mix('js/app.js') }}\" defer></script>\n</head>\n";
        assert_eq!(
            patch_layout(content, Bundler::Mix).unwrap(),
            "<head>\n    <x-importmap::tags />\n</head>\n"
        );
    }

    #[test]
    fn vite_directive_is_replaced() {
        let content = "<head>\n    @vite(['resources/css/app.css', 'resources/js/app.js'])\n</head>\n";
        assert_eq!(
            patch_layout(content, Bundler::Vite).unwrap(),
            "<head>\n    <x-importmap::tags />\n</head>\n"
        );
    }

    #[test]
    fn head_injection_matches_indentation() {
        assert_eq!(
            patch_layout(HEAD, Bundler::None).unwrap(),
            "<html>\n    <head>\n        <title>App</title>\n        <x-importmap::tags />\n    </head>\n</html>\n"
        );
    }

    #[test]
    fn head_injection_is_idempotent() {
        let once = patch_layout(HEAD, Bundler::None).unwrap();
        assert_eq!(patch_layout(&once, Bundler::None).unwrap(), once);
    }

    #[test]
    fn patch_layouts_writes_only_existing_changed_files() {
        let dir = TempDir::new().unwrap();
        let layouts = dir.path().join("resources/views/layouts");
        fs::create_dir_all(&layouts).unwrap();
        fs::write(layouts.join("app.blade.php"), HEAD).unwrap();

        let names = vec!["app".to_string(), "guest".to_string()];
        let changed = patch_layouts(dir.path(), &names, Bundler::None).unwrap();

        assert_eq!(changed, vec!["resources/views/layouts/app.blade.php"]);
        assert!(fs::read_to_string(layouts.join("app.blade.php"))
            .unwrap()
            .contains(IMPORTMAP_TAGS));
        assert!(!layouts.join("guest.blade.php").exists());

        let again = patch_layouts(dir.path(), &names, Bundler::None).unwrap();
        assert!(again.is_empty());
    }
}
