//! Resolve relative specifiers to root-relative bare specifiers.

use serde::Serialize;
use std::ffi::OsString;
use std::path::{Component, Path, PathBuf};

/// Why a relative specifier was left as written.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureReason {
    /// The specifier climbs above the configured root.
    OutsideRoot,
    /// No file exists at the specifier, with or without a source extension.
    TargetMissing,
    /// The literal could not be parsed (spans lines, escapes, concatenation).
    Malformed,
}

impl FailureReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            FailureReason::OutsideRoot => "outside_root",
            FailureReason::TargetMissing => "target_missing",
            FailureReason::Malformed => "malformed",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    Rewritten(String),
    Failed(FailureReason),
}

/// Resolve `specifier` as written in `importing_file` and express the target
/// relative to `root`, with a source extension stripped.
///
/// `root/pages/home.js` importing `../components/foo` where
/// `root/components/foo.js` exists resolves to `components/foo`.
pub fn resolve(
    specifier: &str,
    importing_file: &Path,
    root: &Path,
    extensions: &[String],
) -> Resolution {
    if names_directory(specifier) {
        return Resolution::Failed(FailureReason::TargetMissing);
    }

    let Some(dir) = importing_file.parent() else {
        return Resolution::Failed(FailureReason::OutsideRoot);
    };
    let (Some(joined), Some(root)) = (normalize(&dir.join(specifier)), normalize(root)) else {
        return Resolution::Failed(FailureReason::OutsideRoot);
    };

    if joined.strip_prefix(&root).is_err() {
        return Resolution::Failed(FailureReason::OutsideRoot);
    }

    let Some(target) = find_target(&joined, extensions) else {
        return Resolution::Failed(FailureReason::TargetMissing);
    };

    match target.strip_prefix(&root) {
        Ok(relative) => match to_specifier(relative, extensions) {
            Some(spec) => Resolution::Rewritten(spec),
            None => Resolution::Failed(FailureReason::TargetMissing),
        },
        Err(_) => Resolution::Failed(FailureReason::OutsideRoot),
    }
}

/// Lexically normalise a path: drop `.`, fold `..` into its parent.
///
/// Returns `None` when `..` would climb past the filesystem root.
pub fn normalize(path: &Path) -> Option<PathBuf> {
    let mut out: Vec<Component> = Vec::new();

    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => match out.last() {
                Some(Component::Normal(_)) => {
                    out.pop();
                }
                Some(Component::RootDir) | Some(Component::Prefix(_)) => return None,
                _ => out.push(component),
            },
            other => out.push(other),
        }
    }

    Some(out.iter().collect())
}

/// The path itself when it names a file, otherwise the first
/// `<path>.<ext>` that does.
/// `dir/`, `.`, `..`, `./dir/.` and `./dir/..` all name a directory, never a
/// module file, so extension probing must not run on them.
fn names_directory(specifier: &str) -> bool {
    specifier.ends_with('/') || matches!(specifier.rsplit('/').next(), Some(".") | Some(".."))
}

fn find_target(path: &Path, extensions: &[String]) -> Option<PathBuf> {
    if path.is_file() {
        return Some(path.to_path_buf());
    }

    extensions
        .iter()
        .map(|ext| with_appended_extension(path, ext))
        .find(|candidate| candidate.is_file())
}

fn with_appended_extension(path: &Path, ext: &str) -> PathBuf {
    let mut raw: OsString = path.as_os_str().to_owned();
    raw.push(".");
    raw.push(ext);
    PathBuf::from(raw)
}

fn to_specifier(relative: &Path, extensions: &[String]) -> Option<String> {
    let mut segments = Vec::new();
    for component in relative.components() {
        match component {
            Component::Normal(segment) => segments.push(segment.to_str()?.to_string()),
            _ => return None,
        }
    }

    let last = segments.pop()?;
    let last = match last.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() && extensions.iter().any(|e| e == ext) => {
            stem.to_string()
        }
        _ => last,
    };
    segments.push(last);

    Some(segments.join("/"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn js() -> Vec<String> {
        vec!["js".to_string()]
    }

    fn tree(files: &[&str]) -> TempDir {
        let dir = TempDir::new().unwrap();
        for file in files {
            let path = dir.path().join(file);
            fs::create_dir_all(path.parent().unwrap()).unwrap();
            fs::write(&path, "").unwrap();
        }
        dir
    }

    #[test]
    fn normalize_folds_dot_segments() {
        assert_eq!(
            normalize(Path::new("/a/b/./c/../d")).unwrap(),
            PathBuf::from("/a/b/d")
        );
        assert_eq!(normalize(Path::new("/..")), None);
        assert_eq!(
            normalize(Path::new("../x/../y")).unwrap(),
            PathBuf::from("../y")
        );
    }

    #[test]
    fn resolves_parent_import_to_root_relative_specifier() {
        let dir = tree(&["pages/home.js", "components/foo.js"]);
        let root = dir.path();

        let result = resolve(
            "../components/foo",
            &root.join("pages/home.js"),
            root,
            &js(),
        );
        assert_eq!(result, Resolution::Rewritten("components/foo".to_string()));
    }

    #[test]
    fn explicit_extension_is_stripped() {
        let dir = tree(&["app.js", "lib/util.js"]);
        let root = dir.path();

        let result = resolve("./lib/util.js", &root.join("app.js"), root, &js());
        assert_eq!(result, Resolution::Rewritten("lib/util".to_string()));
    }

    #[test]
    fn non_source_extension_is_kept() {
        let dir = tree(&["app.js", "styles/main.css"]);
        let root = dir.path();

        let result = resolve("./styles/main.css", &root.join("app.js"), root, &js());
        assert_eq!(result, Resolution::Rewritten("styles/main.css".to_string()));
    }

    #[test]
    fn extension_order_decides_between_candidates() {
        let dir = tree(&["app.js", "lib/util.mjs", "lib/util.js"]);
        let root = dir.path();
        let exts = vec!["mjs".to_string(), "js".to_string()];

        let result = resolve("./lib/util", &root.join("app.js"), root, &exts);
        assert_eq!(result, Resolution::Rewritten("lib/util".to_string()));
    }

    #[test]
    fn missing_target_fails() {
        let dir = tree(&["app.js"]);
        let root = dir.path();

        let result = resolve("./does-not-exist", &root.join("app.js"), root, &js());
        assert_eq!(result, Resolution::Failed(FailureReason::TargetMissing));
    }

    #[test]
    fn directory_target_fails() {
        let dir = tree(&["app.js", "widgets/index.js"]);
        let root = dir.path();

        assert_eq!(
            resolve("./widgets", &root.join("app.js"), root, &js()),
            Resolution::Failed(FailureReason::TargetMissing)
        );
        assert_eq!(
            resolve("./widgets/", &root.join("app.js"), root, &js()),
            Resolution::Failed(FailureReason::TargetMissing)
        );
    }

    #[test]
    fn dot_segments_never_resolve_to_sibling_file() {
        let dir = tree(&["pages/home.js", "pages.js", "pages/admin/list.js", "pages/admin.js"]);
        let root = dir.path();
        let home = root.join("pages/home.js");

        for specifier in [".", "./admin/.", "./admin/..", "./."] {
            assert_eq!(
                resolve(specifier, &home, root, &js()),
                Resolution::Failed(FailureReason::TargetMissing),
                "{}",
                specifier
            );
        }
        assert_eq!(
            resolve("..", &root.join("pages/admin/list.js"), root, &js()),
            Resolution::Failed(FailureReason::TargetMissing)
        );
        assert_eq!(
            resolve("./admin", &home, root, &js()),
            Resolution::Rewritten("pages/admin".to_string())
        );
    }

    #[test]
    fn climbing_above_root_fails_even_when_target_exists() {
        let dir = tree(&["js/app.js", "shared.js"]);
        let root = dir.path().join("js");

        let result = resolve("../shared", &root.join("app.js"), &root, &js());
        assert_eq!(result, Resolution::Failed(FailureReason::OutsideRoot));
    }

    #[test]
    fn relative_root_paths_resolve_lexically() {
        let dir = tree(&["resources/js/pages/home.js", "resources/js/components/foo.js"]);
        let root = dir.path().join("resources/./js");

        let result = resolve(
            "../components/foo",
            &root.join("pages/home.js"),
            &root,
            &js(),
        );
        assert_eq!(result, Resolution::Rewritten("components/foo".to_string()));
    }

    #[test]
    fn reason_names_are_stable() {
        assert_eq!(FailureReason::OutsideRoot.as_str(), "outside_root");
        assert_eq!(FailureReason::TargetMissing.as_str(), "target_missing");
        assert_eq!(FailureReason::Malformed.as_str(), "malformed");
    }
}
