use docmig_engine::{DocumentStatus, MigrateConfig, Migrator, OutputTarget};
use docmig_test_utils::{create_ref_list, create_wrapper_layer, parse, wrapper_path, write_batch};
use pretty_assertions::assert_eq;
use std::fs;
use std::path::Path;

const STATIC: &str = "<object>\n  <a>1</a>\n</object>\n";

fn lay_out(root: &Path) {
    let layer = create_wrapper_layer("layer", &["a", "b"]);
    let scene = create_ref_list("scene", &[&wrapper_path("layer", 1)]);
    write_batch(
        root,
        &[
            ("levels/layer.xdi", layer.as_str()),
            ("levels/nested/scene.XDI", scene.as_str()),
            ("static.xml", STATIC),
            ("notes.txt", "not a document"),
        ],
    );
}

fn run(config: &MigrateConfig, root: &Path) -> docmig_engine::BatchReport {
    Migrator::from_config(config)
        .unwrap()
        .migrate_directory(config, root)
        .unwrap()
}

#[test]
fn test_in_place_rewrites_only_changed_documents() {
    let dir = tempfile::tempdir().unwrap();
    lay_out(dir.path());

    let report = run(&MigrateConfig::new(), dir.path());

    let ids: Vec<_> = report.documents.iter().map(|d| d.id.as_str()).collect();
    assert_eq!(
        ids,
        vec!["levels/layer.xdi", "levels/nested/scene.XDI", "static.xml"]
    );
    assert_eq!(report.totals.migrated, 2);
    assert_eq!(report.totals.unchanged, 1);
    assert!(!report.has_failures());

    let scene = fs::read_to_string(dir.path().join("levels/nested/scene.XDI")).unwrap();
    assert!(scene.contains(r#"ref="/layer/entities/entityData[1]""#));
    let layer = parse(&fs::read_to_string(dir.path().join("levels/layer.xdi")).unwrap());
    assert!(docmig_engine::dangling_references(&layer).is_empty());

    assert_eq!(fs::read_to_string(dir.path().join("static.xml")).unwrap(), STATIC);
    assert_eq!(
        fs::read_to_string(dir.path().join("notes.txt")).unwrap(),
        "not a document"
    );
}

#[test]
fn test_mirror_writes_every_successful_document() {
    let src = tempfile::tempdir().unwrap();
    let out = tempfile::tempdir().unwrap();
    lay_out(src.path());
    let original = fs::read_to_string(src.path().join("levels/layer.xdi")).unwrap();

    let config = MigrateConfig::new().with_output(OutputTarget::Mirror {
        dir: out.path().to_path_buf(),
    });
    let report = run(&config, src.path());
    assert_eq!(report.totals.documents, 3);

    assert_eq!(
        fs::read_to_string(src.path().join("levels/layer.xdi")).unwrap(),
        original
    );
    assert!(out.path().join("levels/layer.xdi").is_file());
    assert!(out.path().join("levels/nested/scene.XDI").is_file());
    assert!(out.path().join("static.xml").is_file());
    assert!(!out.path().join("notes.txt").exists());
}

#[test]
fn test_mirror_inside_root_is_not_rescanned() {
    let dir = tempfile::tempdir().unwrap();
    lay_out(dir.path());
    let config = MigrateConfig::new().with_output(OutputTarget::Mirror {
        dir: dir.path().join("out"),
    });

    run(&config, dir.path());
    let second = run(&config, dir.path());
    assert_eq!(second.totals.documents, 3);
}

#[test]
fn test_mirror_spelled_differently_is_not_rescanned() {
    let dir = tempfile::tempdir().unwrap();
    lay_out(dir.path());
    let config = MigrateConfig::new().with_output(OutputTarget::Mirror {
        dir: dir.path().join("levels").join("..").join("out"),
    });

    run(&config, dir.path());
    assert!(dir.path().join("out/levels/layer.xdi").is_file());
    let second = run(&config, dir.path());
    assert_eq!(second.totals.documents, 3);
    assert!(second.documents.iter().all(|d| !d.id.starts_with("out")));
}

#[test]
fn test_dry_run_writes_nothing() {
    let dir = tempfile::tempdir().unwrap();
    lay_out(dir.path());
    let before = fs::read_to_string(dir.path().join("levels/layer.xdi")).unwrap();

    let report = run(&MigrateConfig::new().with_dry_run(true), dir.path());
    assert_eq!(report.totals.migrated, 2);
    assert_eq!(
        fs::read_to_string(dir.path().join("levels/layer.xdi")).unwrap(),
        before
    );
}

#[test]
fn test_failed_documents_are_left_untouched() {
    let dir = tempfile::tempdir().unwrap();
    lay_out(dir.path());
    write_batch(dir.path(), &[("broken.xdi", "<layer><entities></layer>")]);
    fs::write(dir.path().join("binary.xdi"), [0x3c_u8, 0xff, 0x3e]).unwrap();

    let config = MigrateConfig::new().with_parallel(false);
    let report = run(&config, dir.path());

    assert!(report.has_failures());
    assert_eq!(report.totals.failed, 2);
    assert_eq!(
        report.document("broken.xdi").map(|d| d.status),
        Some(DocumentStatus::Failed)
    );
    let binary = report.document("binary.xdi").unwrap();
    assert!(binary.error.as_deref().unwrap_or_default().contains("utf-8"));

    assert_eq!(
        fs::read_to_string(dir.path().join("broken.xdi")).unwrap(),
        "<layer><entities></layer>"
    );
    let scene = fs::read_to_string(dir.path().join("levels/nested/scene.XDI")).unwrap();
    assert!(scene.contains("entityData[1]"));
}

#[test]
fn test_config_file_selects_rules_and_extensions() {
    let dir = tempfile::tempdir().unwrap();
    lay_out(dir.path());
    let rules = dir.path().join("rules.toml");
    fs::write(
        &rules,
        r#"
        [[rule]]
        types = ["traktor.world.LayerEntityData"]
        [rule.action]
        kind = "ensure_default"
        child = "visible"
        value = "true"
        "#,
    )
    .unwrap();
    let config_path = dir.path().join("docmig.toml");
    fs::write(
        &config_path,
        format!(
            "extensions = [\"xdi\"]\nrules = {:?}\n",
            rules.to_string_lossy()
        ),
    )
    .unwrap();

    let config = MigrateConfig::load(&config_path).unwrap();
    let report = run(&config, dir.path());

    assert_eq!(report.totals.documents, 2);
    let layer = parse(&fs::read_to_string(dir.path().join("levels/layer.xdi")).unwrap());
    assert!(docmig_test_utils::text_at(&layer, "visible").is_some());
    // no collapse rule in this set
    assert!(docmig_test_utils::text_at(&layer, "entities/item/entityData").is_some());
}
