//! End-to-end build pipeline tests
//!
//! Drives the full pipeline over real temp-dir projects: preprocess, scope,
//! emit, and the closing import-path resolution pass.

use base64::engine::general_purpose::STANDARD as BASE64_STANDARD;
use base64::Engine as _;
use md5::{Digest, Md5};
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

use stylescope::config::{default_config, StyleConfig};
use stylescope::pipeline::{BuildContext, BuildPipeline, BuildSummary};
use stylescope::scope::sanitize_class_name;
use stylescope::MAGIC_PATH;

const STYLES1_CSS: &str = ".test1 { font: 100% Helvetica, sans-serif; color: red; }\n";
const STYLES3_GLOBAL: &str = "body { margin: 0; }\n.box { color: green; }\n";

/// Expected scoped name under the default `[local]_[hash:base64:6]`
/// template for a class in a file with the given content.
fn expected_name(local: &str, content: &str) -> String {
    let hash: String = BASE64_STANDARD
        .encode(Md5::digest(content.as_bytes()))
        .chars()
        .take(6)
        .collect();
    sanitize_class_name(&format!("{}_{}", local, hash))
}

/// Create a test file with content.
fn create_test_file(dir: &Path, name: &str, content: &str) -> PathBuf {
    let path = dir.join(name);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    let mut file = File::create(&path).unwrap();
    file.write_all(content.as_bytes()).unwrap();
    path
}

/// Set up a project with the standard fixture files and return its context.
fn create_test_project() -> (TempDir, BuildContext) {
    let temp = TempDir::new().unwrap();
    let styles = temp.path().join("src/styles");

    create_test_file(&styles, "styles1.css", STYLES1_CSS);
    create_test_file(
        &styles,
        "styles2.scss",
        ".wrapper { .item { color: blue; } }\n",
    );
    create_test_file(&styles, "styles3.global.css", STYLES3_GLOBAL);
    create_test_file(&styles, "widgets/button.scss", ".btn { color: red; }\n");
    create_test_file(&styles, "notes.txt", "not a style file\n");

    let config = default_config();
    let ctx = BuildContext::new(config, temp.path().to_path_buf());
    (temp, ctx)
}

fn build(ctx: &BuildContext) -> BuildSummary {
    BuildPipeline::new(ctx.clone()).build().unwrap()
}

/// Collect `(relative path, content)` of every file under a directory.
fn snapshot_tree(root: &Path) -> Vec<(PathBuf, Vec<u8>)> {
    let mut entries = Vec::new();
    let pattern = format!("{}/**/*", root.display());
    for entry in glob::glob(&pattern).unwrap() {
        let path = entry.unwrap();
        if path.is_file() {
            let rel = path.strip_prefix(root).unwrap().to_path_buf();
            entries.push((rel, fs::read(&path).unwrap()));
        }
    }
    entries.sort();
    entries
}

#[test]
fn test_css_asset_created_with_hash_class_name() {
    let (temp, ctx) = create_test_project();
    build(&ctx);

    let css = fs::read_to_string(temp.path().join("dist/src/styles/styles1.css")).unwrap();
    let expected = expected_name("test1", STYLES1_CSS);
    assert!(css.contains(&format!(".{}", expected)), "got {}", css);
}

#[test]
fn test_global_styles_keep_selectors() {
    let (temp, ctx) = create_test_project();
    build(&ctx);

    let css =
        fs::read_to_string(temp.path().join("dist/src/styles/styles3.global.css")).unwrap();
    assert!(css.contains("body"), "got {}", css);
    assert!(css.contains(".box"), "got {}", css);

    let stub =
        fs::read_to_string(temp.path().join("dist/src/styles/styles3.global.js")).unwrap();
    assert!(stub.contains("\"box\":\"box\""), "got {}", stub);
}

#[test]
fn test_stub_import_resolved_after_closing_phase() {
    let (temp, ctx) = create_test_project();
    build(&ctx);

    let stub = fs::read_to_string(temp.path().join("dist/src/styles/styles1.js")).unwrap();
    let expected = expected_name("test1", STYLES1_CSS);
    assert_eq!(
        stub,
        format!(
            "import \"./src/styles/styles1.css\";\nexport default {{\"test1\":\"{}\"}};\n",
            expected
        )
    );
}

#[test]
fn test_no_sentinel_survives_the_build() {
    let (temp, ctx) = create_test_project();
    build(&ctx);

    for (path, content) in snapshot_tree(&temp.path().join("dist")) {
        let text = String::from_utf8_lossy(&content);
        assert!(!text.contains(MAGIC_PATH), "sentinel left in {:?}", path);
    }
}

#[test]
fn test_scss_compiled_and_scoped() {
    let (temp, ctx) = create_test_project();
    build(&ctx);

    let css = fs::read_to_string(temp.path().join("dist/src/styles/styles2.css")).unwrap();
    assert!(!css.contains('$'));
    // Nested sass selectors flatten into descendant selectors, both scoped.
    let stub = fs::read_to_string(temp.path().join("dist/src/styles/styles2.js")).unwrap();
    assert!(stub.contains("\"wrapper\":\"wrapper_"), "got {}", stub);
    assert!(stub.contains("\"item\":\"item_"), "got {}", stub);
}

#[test]
fn test_non_style_files_ignored() {
    let (temp, ctx) = create_test_project();
    let summary = build(&ctx);

    assert_eq!(summary.files_transformed, 4);
    assert!(!temp.path().join("dist/src/styles/notes.txt").exists());
}

#[test]
fn test_rebuild_is_byte_identical() {
    let (temp, ctx) = create_test_project();
    build(&ctx);
    let first = snapshot_tree(&temp.path().join("dist"));

    build(&ctx);
    let second = snapshot_tree(&temp.path().join("dist"));

    assert_eq!(first, second);
}

#[test]
fn test_multiple_output_dirs_all_populated_and_resolved() {
    let (temp, ctx) = create_test_project();
    let mut config = ctx.config().clone();
    config.project.out = vec![PathBuf::from("dist"), PathBuf::from("dist-esm")];
    let ctx = BuildContext::new(config, temp.path().to_path_buf());
    build(&ctx);

    for out in ["dist", "dist-esm"] {
        let stub = fs::read_to_string(
            temp.path().join(out).join("src/styles/styles1.js"),
        )
        .unwrap();
        assert!(stub.contains("import \"./src/styles/styles1.css\";"), "got {}", stub);
        assert!(!stub.contains(MAGIC_PATH));
    }
}

#[test]
fn test_auto_prefix_resolves_relative_to_each_stub() {
    let (temp, ctx) = create_test_project();
    let mut config: StyleConfig = ctx.config().clone();
    config.naming.magic_path_prefix = "auto".to_string();
    let ctx = BuildContext::new(config, temp.path().to_path_buf());
    build(&ctx);

    let stub =
        fs::read_to_string(temp.path().join("dist/src/styles/widgets/button.js")).unwrap();
    assert!(
        stub.contains("import \"../../../src/styles/widgets/button.css\";"),
        "got {}",
        stub
    );
}

#[test]
fn test_preprocessor_failure_aborts_build() {
    let (temp, ctx) = create_test_project();
    create_test_file(
        &temp.path().join("src/styles"),
        "broken.scss",
        ".a { color: $missing-variable; }\n",
    );

    let result = BuildPipeline::new(ctx).build();
    assert!(result.is_err());
}

#[test]
fn test_include_exclude_filtering() {
    let (temp, ctx) = create_test_project();
    let mut config = ctx.config().clone();
    config.filter.exclude = vec!["**/widgets/**".to_string()];
    let ctx = BuildContext::new(config, temp.path().to_path_buf());
    let summary = build(&ctx);

    assert_eq!(summary.files_transformed, 3);
    assert!(!temp.path().join("dist/src/styles/widgets/button.css").exists());
}

#[test]
fn test_class_name_prefix_applied() {
    let (temp, ctx) = create_test_project();
    let mut config = ctx.config().clone();
    config.naming.class_name_prefix = "lib-".to_string();
    let ctx = BuildContext::new(config, temp.path().to_path_buf());
    build(&ctx);

    let stub = fs::read_to_string(temp.path().join("dist/src/styles/styles1.js")).unwrap();
    assert!(stub.contains("\"test1\":\"lib-test1_"), "got {}", stub);

    // Global styles never get the prefix.
    let global =
        fs::read_to_string(temp.path().join("dist/src/styles/styles3.global.js")).unwrap();
    assert!(global.contains("\"box\":\"box\""), "got {}", global);
}

#[test]
fn test_import_css_disabled_emits_plain_stub() {
    let (temp, ctx) = create_test_project();
    let mut config = ctx.config().clone();
    config.naming.import_css = false;
    let ctx = BuildContext::new(config, temp.path().to_path_buf());
    build(&ctx);

    let stub = fs::read_to_string(temp.path().join("dist/src/styles/styles1.js")).unwrap();
    assert!(stub.starts_with("export default {"), "got {}", stub);
    assert!(!stub.contains("import"));
}

#[test]
fn test_concurrent_builds_do_not_cross_contaminate() {
    let (temp_a, ctx_a) = create_test_project();
    let (temp_b, ctx_b) = create_test_project();

    let handle_a = std::thread::spawn(move || (BuildPipeline::new(ctx_a).build(), temp_a));
    let handle_b = std::thread::spawn(move || (BuildPipeline::new(ctx_b).build(), temp_b));

    let (result_a, temp_a) = handle_a.join().unwrap();
    let (result_b, temp_b) = handle_b.join().unwrap();
    let summary_a = result_a.unwrap();
    let summary_b = result_b.unwrap();

    assert_eq!(summary_a.files_transformed, 4);
    assert_eq!(summary_b.files_transformed, 4);
    assert!(temp_a.path().join("dist/src/styles/styles1.css").exists());
    assert!(temp_b.path().join("dist/src/styles/styles1.css").exists());
}
