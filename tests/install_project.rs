use std::fs;
use std::path::Path;

use importmap::defaults::load_config;
use importmap::import_paths::{fix_import_paths, CollectingSink, FailureReason, FixerOptions};
use importmap::install::{self, Bundler, TaskStatus};
use tempfile::TempDir;

fn write(root: &Path, rel: &str, content: &str) {
    let path = root.join(rel);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, content).unwrap();
}

fn read(root: &Path, rel: &str) -> String {
    fs::read_to_string(root.join(rel)).unwrap()
}

fn mix_project() -> TempDir {
    let dir = TempDir::new().unwrap();
    let root = dir.path();

    write(root, "webpack.mix.js", "mix.js('resources/js/app.js', 'public/js');\n");
    write(root, "package-lock.json", "{}");
    write(
        root,
        "package.json",
        r#"{
            "dependencies": { "alpinejs": "^3.10.0" },
            "devDependencies": { "axios": "^0.25", "postcss": "^8.4.6", "lodash": "^4.17.19" }
        }"#,
    );
    write(root, ".gitignore", "/node_modules\n/vendor\n");
    write(
        root,
        "resources/views/layouts/app.blade.php",
        "<head>\n    <script src=\"{{ mix('js/app.js') }}\" defer></script>\n</head>\n",
    );
    write(
        root,
        "resources/js/app.js",
        "import './bootstrap';\nimport Alpine from 'alpinejs';\nimport { cart } from './components/cart';\n",
    );
    write(root, "resources/js/bootstrap.js", "import _ from 'lodash';\n");
    write(
        root,
        "resources/js/components/cart.js",
        "export { money } from '../libs/money';\nconst view = () => import(\"../views/cart.js\");\n",
    );
    write(root, "resources/js/libs/money.js", "export const money = 1;\n");
    write(root, "resources/js/views/cart.js", "");
    write(root, "resources/js/node_modules/dep/index.js", "import './missing';\n");

    dir
}

#[test]
fn mix_project_is_fully_converted() {
    let dir = mix_project();
    let root = dir.path();

    let config = load_config(root).unwrap();
    let report = install::run(root, &config).unwrap();

    assert_eq!(report.bundler, Bundler::Mix);
    assert!(report.failed_imports.is_empty());
    assert_eq!(report.imports.total_replacements, 4);
    assert!(report.tasks.iter().all(|t| t.status == TaskStatus::Done));

    assert_eq!(
        read(root, "resources/js/app.js"),
        "import 'bootstrap';\nimport Alpine from 'alpinejs';\nimport { cart } from 'components/cart';\n"
    );
    assert_eq!(
        read(root, "resources/js/components/cart.js"),
        "export { money } from 'libs/money';\nconst view = () => import(\"views/cart\");\n"
    );
    assert_eq!(read(root, "resources/js/node_modules/dep/index.js"), "import './missing';\n");

    assert_eq!(
        read(root, "resources/views/layouts/app.blade.php"),
        "<head>\n    <x-importmap::tags />\n</head>\n"
    );
    for removed in ["webpack.mix.js", "package.json", "package-lock.json"] {
        assert!(!root.join(removed).exists(), "{} should be removed", removed);
    }
    assert_eq!(read(root, ".gitignore"), "/node_modules\n/vendor\n\n/public/js\n");

    let plan = report.pins.unwrap();
    assert_eq!(plan.skipped, vec!["postcss"]);
    assert_eq!(
        plan.command,
        "php artisan importmap:pin \"alpinejs@^3.10.0\" axios \"lodash@^4.17.19\""
    );
}

#[test]
fn second_run_changes_nothing_in_sources() {
    let dir = mix_project();
    let root = dir.path();
    let config = load_config(root).unwrap();

    install::run(root, &config).unwrap();
    let again = install::run(root, &config).unwrap();

    assert_eq!(again.imports.total_replacements, 0);
    assert_eq!(again.imports.files_modified, 0);
    assert!(again.pins.is_none());
}

#[test]
fn project_config_changes_source_root_and_extensions() {
    let dir = TempDir::new().unwrap();
    let root = dir.path();

    write(
        root,
        "importmap.json",
        r#"{ "imports": { "source_root": "assets", "extensions": ["mjs", "js"] } }"#,
    );
    write(root, "assets/app.mjs", "import { a } from './lib/a';\n");
    write(root, "assets/lib/a.mjs", "export const a = 1;\n");

    let config = load_config(root).unwrap();
    let report = install::run(root, &config).unwrap();

    assert_eq!(report.imports.total_replacements, 1);
    assert_eq!(read(root, "assets/app.mjs"), "import { a } from 'lib/a';\n");
    assert!(!root.join("resources/js").exists());
}

#[test]
fn fixer_reports_outside_root_and_missing_targets() {
    let dir = TempDir::new().unwrap();
    let root = dir.path();

    write(root, "js/app.js", "import '../../escape';\nimport './nowhere';\n");

    let sink = CollectingSink::new();
    let report = fix_import_paths(&root.join("js"), &FixerOptions::default(), &sink).unwrap();

    assert_eq!(report.unrewritten, 2);
    let reasons: Vec<FailureReason> = sink.failures().iter().map(|f| f.reason).collect();
    assert_eq!(
        reasons,
        vec![FailureReason::OutsideRoot, FailureReason::TargetMissing]
    );
    assert_eq!(read(root, "js/app.js"), "import '../../escape';\nimport './nowhere';\n");
}

#[test]
fn invalid_project_config_is_rejected() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "importmap.json", "{ nope");

    let err = load_config(dir.path()).unwrap_err();
    assert_eq!(err.code.as_str(), "config.invalid_json");
}
