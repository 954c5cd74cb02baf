//! The `native` command set, run in-process.

use clap::Parser;
use shield_editor::native::{execute, Cli, CliError};
use shield_editor::Store;
use shield_model::{ConsumerModel, NodeKind, Vec2};
use tempfile::TempDir;

fn run(args: &[&str]) -> Result<String, CliError> {
    let argv = std::iter::once("shield-editor").chain(args.iter().copied());
    let cli = Cli::try_parse_from(argv).expect("arguments parse");
    execute(cli)
}

#[test]
fn new_writes_an_empty_project() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("empty.json");
    let path_str = path.to_str().unwrap();

    run(&["new", path_str]).unwrap();
    let summary = run(&["inspect", path_str, "--json"]).unwrap();
    let value: serde_json::Value = serde_json::from_str(&summary).unwrap();

    assert_eq!(value["nodes"], 0);
    assert_eq!(value["worksheets"], 0);
}

#[test]
fn recalc_fills_in_totals() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("in.json");
    let output = dir.path().join("out.json");

    let mut store = Store::default();
    let id = store.add_node(NodeKind::Shield, "MSB", Vec2::ZERO).unwrap();
    store
        .shields
        .get_mut()
        .get_mut(id)
        .unwrap()
        .add_consumer(ConsumerModel::new("Oven", 4.0));
    store.save_to_file(&input).unwrap();

    let message = run(&[
        "recalc",
        input.to_str().unwrap(),
        "--output",
        output.to_str().unwrap(),
    ])
    .unwrap();
    assert!(message.contains("1 worksheets"));

    let mut loaded = Store::default();
    loaded.load_from_file(&output).unwrap();
    let data = loaded.shields.get().get(id).unwrap();
    assert!((data.installed_power - 4.0).abs() < 1e-9);
    assert!(data.total_current > 0.0);
}

#[test]
fn inspect_text_lists_dangling_connections() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("dangling.json");
    std::fs::write(
        &path,
        r#"{ "nodes": [ { "type": "shield", "id": 1, "name": "A",
                          "x": 0, "y": 0 } ],
             "connections": [ { "fromId": 1, "toId": 9 } ] }"#,
    )
    .unwrap();

    let text = run(&["inspect", path.to_str().unwrap()]).unwrap();
    assert!(text.contains("dangling:"));
    assert!(text.contains("1->9"));
}

#[test]
fn inspect_reports_corrupt_files() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("bad.json");
    std::fs::write(&path, "not json").unwrap();

    let err = run(&["inspect", path.to_str().unwrap()]).unwrap_err();
    assert!(matches!(err, CliError::Project(ref e) if e.is_validation()));
}
