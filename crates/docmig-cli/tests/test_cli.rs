use docmig_test_utils::{create_ref_list, create_wrapper_layer, wrapper_path, write_batch};
use std::path::Path;
use std::process::{Command, Output};

fn docmig(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_docmig"))
        .args(args)
        .env_remove("RUST_LOG")
        .output()
        .unwrap()
}

fn lay_out(root: &Path) {
    let layer = create_wrapper_layer("layer", &["a", "b"]);
    let scene = create_ref_list("scene", &[&wrapper_path("layer", 1)]);
    write_batch(
        root,
        &[("layer.xdi", layer.as_str()), ("scene.xdi", scene.as_str())],
    );
}

#[test]
fn test_migrate_prints_json_report() {
    let dir = tempfile::tempdir().unwrap();
    lay_out(dir.path());
    let root = dir.path().to_str().unwrap();

    let out = docmig(&["migrate", root, "--json", "--sequential"]);
    assert!(out.status.success(), "{}", String::from_utf8_lossy(&out.stderr));

    let report: serde_json::Value = serde_json::from_slice(&out.stdout).unwrap();
    assert_eq!(report["totals"]["migrated"], 2);
    assert_eq!(report["documents"][1]["id"], "scene.xdi");
    assert_eq!(report["documents"][1]["refs_rewritten"], 1);

    let layer = std::fs::read_to_string(dir.path().join("layer.xdi")).unwrap();
    assert!(layer.contains(r#"ref="/layer/entities/entityData[1]""#));
}

#[test]
fn test_failures_set_exit_status() {
    let dir = tempfile::tempdir().unwrap();
    lay_out(dir.path());
    write_batch(dir.path(), &[("broken.xdi", "<object><a></object>")]);
    let root = dir.path().to_str().unwrap();

    let out = docmig(&["migrate", root, "--dry-run"]);
    assert_eq!(out.status.code(), Some(1));
    let stdout = String::from_utf8_lossy(&out.stdout);
    assert!(stdout.contains("FAILED"), "{stdout}");
    assert!(stdout.contains("broken.xdi"), "{stdout}");

    let check = docmig(&["check", root]);
    assert_eq!(check.status.code(), Some(1));
}

#[test]
fn test_check_flags_dangling_references() {
    let dir = tempfile::tempdir().unwrap();
    lay_out(dir.path());
    let root = dir.path().to_str().unwrap();

    // scene points into another document, so it dangles on its own
    let out = docmig(&["check", root]);
    assert_eq!(out.status.code(), Some(1));
    let stdout = String::from_utf8_lossy(&out.stdout);
    assert!(
        stdout.contains("scene.xdi: /scene/item -> /layer/entities/item[1] (dangling)"),
        "{stdout}"
    );
}

#[test]
fn test_rules_lists_builtin_catalog() {
    let out = docmig(&["rules"]);
    assert!(out.status.success());
    let stdout = String::from_utf8_lossy(&out.stdout);
    assert!(stdout.contains("traktor.world.ExternalEntityData"));
    assert!(stdout.contains("reencode_orientation"));
    assert_eq!(stdout.lines().count(), 8);
}
