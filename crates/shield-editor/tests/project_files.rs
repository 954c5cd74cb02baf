//! Save/load through the file system.

use proptest::prelude::*;
use shield_editor::serialization::{self, ProjectError};
use shield_editor::{EditorSettings, Store};
use shield_model::{Camera, ConsumerModel, NodeId, NodeKind, Vec2};
use std::fs;
use tempfile::TempDir;

fn populated_store() -> Store {
    let mut store = Store::default();
    let mut add = |kind, name, x, y| {
        store.add_node(kind, name, Vec2::new(x, y)).unwrap()
    };
    let source = add(NodeKind::PowerSource, "Grid", 0.0, 0.0);
    let trafo = add(NodeKind::transformer(), "T-1", 0.0, 100.0);
    let shield = add(NodeKind::Shield, "MSB", 0.0, 200.0);
    let sub = add(NodeKind::Shield, "SB-1", 150.0, 300.0);
    store.canvas.add_connection(source, trafo);
    store.canvas.add_connection(trafo, shield);
    store.canvas.add_connection(shield, sub);
    store.canvas.add_level(250.0).unwrap();

    store
        .edit_shield(shield, |s| {
            s.add_consumer(ConsumerModel::new("Lighting", 1.5));
            s.add_consumer(ConsumerModel::new("Chiller", 22.0).three_phase());
            s.recalculate();
            Ok(())
        })
        .unwrap();
    store
}

#[test]
fn save_then_load_restores_the_document() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("plant.json");

    let mut store = populated_store();
    store.save_to_file(&path).unwrap();
    assert!(!store.modified);
    assert_eq!(store.project_path.as_deref(), Some(path.as_path()));

    let mut loaded = Store::default();
    loaded.load_from_file(&path).unwrap();

    assert_eq!(loaded.document(), store.document());
    assert_eq!(loaded.canvas.next_id(), store.canvas.next_id());
}

#[test]
fn save_leaves_no_temporary_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("plant.json");

    let mut store = populated_store();
    store.save_to_file(&path).unwrap();
    store.save_to_file(&path).unwrap();

    let names: Vec<_> = fs::read_dir(dir.path())
        .unwrap()
        .map(|e| e.unwrap().file_name().into_string().unwrap())
        .collect();
    assert_eq!(names, vec!["plant.json"]);
}

#[test]
fn saved_file_is_pretty_by_default() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("plant.json");
    populated_store().save_to_file(&path).unwrap();

    let text = fs::read_to_string(&path).unwrap();
    assert!(text.starts_with("{\n"));
    assert!(text.contains("\"shieldsData\""));

    let mut settings = EditorSettings::default();
    settings.project.pretty = false;
    let mut compact = Store::new(settings);
    compact.save_to_file(&path).unwrap();
    assert!(!fs::read_to_string(&path).unwrap().contains('\n'));
}

#[test]
fn corrupt_file_leaves_store_untouched() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("bad.json");
    fs::write(
        &path,
        r#"{ "version": 1, "nodes": [ { "type": "capacitor_bank", "id": 1,
             "name": "C", "x": 0, "y": 0 } ] }"#,
    )
    .unwrap();

    let mut store = populated_store();
    let before = store.document();
    let key = store.canvas_key();
    let version = store.shields.version();

    let err = store.load_from_file(&path).unwrap_err();

    assert!(err.is_validation());
    assert_eq!(store.document(), before);
    assert_eq!(store.canvas_key(), key);
    assert_eq!(store.shields.version(), version);
    assert!(store.project_path.is_none());
}

#[test]
fn truncated_file_is_a_validation_error() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("plant.json");
    populated_store().save_to_file(&path).unwrap();

    let text = fs::read_to_string(&path).unwrap();
    fs::write(&path, &text[..text.len() / 2]).unwrap();

    let mut store = Store::default();
    let err = store.load_from_file(&path).unwrap_err();
    assert!(matches!(err, ProjectError::Corrupt(_)));
    assert!(store.canvas.is_empty());
}

#[test]
fn missing_file_is_an_io_error() {
    let dir = TempDir::new().unwrap();
    let mut store = Store::default();

    let err = store
        .load_from_file(&dir.path().join("nowhere.json"))
        .unwrap_err();
    assert!(matches!(err, ProjectError::Io(_)));
    assert!(!err.is_validation());
}

#[test]
fn save_into_missing_directory_fails_cleanly() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("no_such_dir").join("plant.json");

    let mut store = populated_store();
    let err = store.save_to_file(&path).unwrap_err();
    assert!(matches!(err, ProjectError::Io(_)));
    assert!(store.modified);
    assert!(store.project_path.is_none());
}

#[test]
fn older_files_without_new_consumer_fields_load() {
    let json = r#"{
        "scale": 1.0, "offsetX": 0.0, "offsetY": 0.0,
        "nodes": [
            { "type": "shield", "id": 1, "name": "SH", "x": 0, "y": 0 }
        ],
        "connections": [],
        "levels": [],
        "shieldsData": {
            "1": {
                "name": "SH",
                "demandRatio": 0.7,
                "consumers": [
                    { "name": "Socket", "powerKw": 2.0, "voltage": 220.0 }
                ]
            }
        }
    }"#;
    let document =
        serialization::decode_project(json, Camera::default()).unwrap();
    let data = document.shields.iter().next().unwrap().1;

    assert_eq!(data.demand_ratio, 0.7);
    assert_eq!(data.cable_material, "Cu");
    assert_eq!(data.consumers[0].cable_length, 0.0);
    assert_eq!(data.consumers[0].phases, 1);
}

#[test]
fn load_uses_configured_zoom_bounds() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("zoomed.json");
    fs::write(&path, r#"{ "scale": 8.0 }"#).unwrap();

    let mut settings = EditorSettings::default();
    settings.camera.max_zoom = 5.0;
    let mut store = Store::new(settings);
    store.load_from_file(&path).unwrap();

    assert_eq!(store.canvas.camera().zoom(), 5.0);
    assert_eq!(store.canvas.camera().max_zoom(), 5.0);
}

#[test]
fn non_finite_value_is_not_saved() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("plant.json");
    let mut store = populated_store();
    store.save_to_file(&path).unwrap();
    let saved = fs::read_to_string(&path).unwrap();

    let shield = store.canvas.shield_ids().next().unwrap();
    store
        .edit_shield(shield, |s| {
            s.demand_ratio = f64::NAN;
            Ok(())
        })
        .unwrap();

    let err = store.save_to_file(&path).unwrap_err();
    assert!(matches!(err, ProjectError::NonFinite(_)), "{err}");
    assert!(store.modified);
    assert_eq!(fs::read_to_string(&path).unwrap(), saved);
}

// ------------------------------------------------------------------
// Generated documents
// ------------------------------------------------------------------

/// Recipe for a document, replayed through the store's own edits.
#[derive(Debug, Clone)]
struct Recipe {
    nodes: Vec<(NodeKind, f32, f32)>,
    links: Vec<(usize, usize)>,
    levels: Vec<f32>,
    consumers: Vec<Vec<ConsumerModel>>,
    removed: Option<usize>,
    view: (f32, f32, f32),
}

fn kind_strategy() -> impl Strategy<Value = NodeKind> {
    prop_oneof![
        Just(NodeKind::Shield),
        Just(NodeKind::PowerSource),
        (10.0f32..80.0, 5.0f32..60.0).prop_map(|(outer, inner)| {
            NodeKind::Transformer {
                radius_outer: outer,
                radius_inner: inner,
            }
        }),
        (5.0f32..60.0).prop_map(|radius| NodeKind::Generator { radius }),
    ]
}

fn consumer_strategy() -> impl Strategy<Value = ConsumerModel> {
    (
        "[A-Za-z0-9 -]{0,12}",
        0.0f64..250.0,
        0.5f64..=1.0,
        any::<bool>(),
        0.0f64..500.0,
    )
        .prop_map(|(name, power, pf, three_phase, length)| {
            let mut consumer =
                ConsumerModel::new(name, power).with_power_factor(pf);
            if three_phase {
                consumer = consumer.three_phase();
            }
            consumer.cable_length = length;
            consumer
        })
}

fn recipe_strategy() -> impl Strategy<Value = Recipe> {
    let coord = -1.0e4f32..1.0e4;
    (
        prop::collection::vec((kind_strategy(), coord.clone(), coord), 0..8),
        prop::collection::vec((0usize..8, 0usize..8), 0..10),
        prop::collection::vec(-1.0e4f32..1.0e4, 0..4),
        prop::collection::vec(
            prop::collection::vec(consumer_strategy(), 0..4),
            8,
        ),
        prop::option::of(0usize..8),
        (-500.0f32..500.0, -500.0f32..500.0, -3.0f32..3.0),
    )
        .prop_map(|(nodes, links, levels, consumers, removed, view)| {
            Recipe {
                nodes,
                links,
                levels,
                consumers,
                removed,
                view,
            }
        })
}

fn build(recipe: &Recipe) -> Store {
    let mut store = Store::default();
    let ids: Vec<NodeId> = recipe
        .nodes
        .iter()
        .map(|&(kind, x, y)| {
            store.add_node(kind, "", Vec2::new(x, y)).unwrap()
        })
        .collect();

    for &(a, b) in &recipe.links {
        if let (Some(&from), Some(&to)) = (ids.get(a), ids.get(b)) {
            store.canvas.add_connection(from, to);
        }
    }
    for &y in &recipe.levels {
        store.canvas.add_level(y).unwrap();
    }
    for (&id, consumers) in ids.iter().zip(&recipe.consumers) {
        if store.canvas.node(id).is_some_and(|n| n.is_shield()) {
            store
                .edit_shield(id, |s| {
                    for consumer in consumers {
                        s.add_consumer(consumer.clone());
                    }
                    s.recalculate();
                    Ok(())
                })
                .unwrap();
        }
    }
    if let Some(&gone) = recipe.removed.and_then(|i| ids.get(i)) {
        store.remove_node(gone).unwrap();
    }

    let (dx, dy, wheel) = recipe.view;
    store.canvas.pan(Vec2::new(dx, dy));
    store.canvas.zoom_at(Vec2::new(320.0, 240.0), wheel);
    store
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn generated_documents_survive_encode_and_decode(
        recipe in recipe_strategy(),
    ) {
        let store = build(&recipe);
        let json = serialization::encode_project(
            &store.canvas,
            store.shields.get(),
            false,
        )
        .unwrap();
        let decoded =
            serialization::decode_project(&json, Camera::default()).unwrap();

        let canvas = &decoded.canvas;
        prop_assert_eq!(canvas.nodes(), store.canvas.nodes());
        prop_assert_eq!(canvas.connections(), store.canvas.connections());
        prop_assert_eq!(canvas.levels(), store.canvas.levels());
        prop_assert_eq!(canvas.camera(), store.canvas.camera());

        // Worksheets of removed shields are dropped on encode.
        let mut expected = store.shields.get().clone();
        let live: Vec<NodeId> = store.canvas.shield_ids().collect();
        expected.retain(|id| live.contains(&id));
        prop_assert_eq!(&decoded.shields, &expected);

        // A removed trailing id is not remembered by the file.
        prop_assert!(canvas.next_id() <= store.canvas.next_id());
        let again = serialization::encode_project(
            canvas,
            &decoded.shields,
            false,
        )
        .unwrap();
        prop_assert_eq!(again, json);
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn non_finite_positions_are_refused(
        recipe in recipe_strategy(),
        bad in prop_oneof![
            Just(f32::NAN),
            Just(f32::INFINITY),
            Just(f32::NEG_INFINITY),
        ],
    ) {
        let mut store = build(&recipe);
        let id = store
            .add_node(NodeKind::Shield, "bad", Vec2::new(0.0, bad))
            .unwrap();
        let err = serialization::encode_project(
            &store.canvas,
            store.shields.get(),
            false,
        )
        .unwrap_err();
        prop_assert!(matches!(err, ProjectError::NonFinite(_)), "{}", err);

        store.canvas.move_node(id, Vec2::ZERO).unwrap();
        prop_assert!(serialization::encode_project(
            &store.canvas,
            store.shields.get(),
            false,
        )
        .is_ok());
    }
}
