//! Integration tests for the template library backed by JSON files.
//!
//! These exercise the same path the `templates` CLI commands take: a
//! [`JsonFileStore`] under a data directory, reopened between operations.

use std::collections::HashMap;
use std::fs;

use cursor_helper::persistence::{JsonFileStore, KeyValueStore};
use cursor_helper::templates::{
    default_values, extract_variables, NewTemplate, Template, TemplateCategory, TemplateStore,
    TemplateUpdate, INITIALIZED_KEY, TEMPLATES_KEY,
};
use serde_json::json;
use tempfile::TempDir;

// =============================================================================
// Test Helpers
// =============================================================================

fn create_test_dir() -> TempDir {
    tempfile::tempdir().expect("Failed to create temp dir")
}

fn open(dir: &TempDir) -> TemplateStore<JsonFileStore> {
    TemplateStore::open(JsonFileStore::new(dir.path())).expect("store should open")
}

/// Opens a store that has already been seeded and emptied.
fn open_empty(dir: &TempDir) -> TemplateStore<JsonFileStore> {
    let mut persistence = JsonFileStore::new(dir.path());
    persistence.set(INITIALIZED_KEY, json!(true)).unwrap();
    TemplateStore::open(persistence).expect("store should open")
}

// =============================================================================
// Seeding
// =============================================================================

#[test]
fn first_open_writes_defaults_and_flag_to_disk() {
    let dir = create_test_dir();
    let store = open(&dir);

    assert_eq!(store.len(), 8);
    assert!(dir.path().join(format!("{TEMPLATES_KEY}.json")).exists());
    assert!(dir.path().join(format!("{INITIALIZED_KEY}.json")).exists());

    let names: Vec<_> = store.all().iter().map(|t| t.name.as_str()).collect();
    assert!(names.contains(&"Bug Fix Investigation"));
    assert!(names.contains(&"React Component Creation"));
}

#[test]
fn reopening_does_not_duplicate_defaults() {
    let dir = create_test_dir();
    let first_ids: Vec<_> = open(&dir).all().iter().map(|t| t.id.clone()).collect();
    let second_ids: Vec<_> = open(&dir).all().iter().map(|t| t.id.clone()).collect();

    assert_eq!(first_ids, second_ids);
}

// =============================================================================
// CRUD across reopen
// =============================================================================

#[test]
fn created_template_survives_reopen() {
    let dir = create_test_dir();
    let created = {
        let mut store = open_empty(&dir);
        store
            .create(
                NewTemplate::new(
                    "Greeting",
                    TemplateCategory::General,
                    "Hi {{name:Your name}}, goal: {{goal:Aim::ship it}}",
                )
                .with_tags(["intro"])
                .with_extracted_variables(),
            )
            .unwrap()
    };

    let store = open_empty(&dir);
    let loaded = store.get(&created.id).expect("template should persist");
    assert_eq!(loaded, &created);
    assert_eq!(loaded.variables.len(), 2);
}

#[test]
fn update_and_delete_are_persisted() {
    let dir = create_test_dir();
    let (keep, gone) = {
        let mut store = open_empty(&dir);
        let keep = store
            .create(NewTemplate::new("keep", TemplateCategory::Testing, "{{x}}"))
            .unwrap();
        let gone = store
            .create(NewTemplate::new("gone", TemplateCategory::Testing, "{{y}}"))
            .unwrap();

        store
            .update(
                &keep.id,
                TemplateUpdate {
                    category: Some(TemplateCategory::Optimization),
                    ..Default::default()
                },
            )
            .unwrap();
        store.delete(&gone.id).unwrap();
        (keep, gone)
    };

    let store = open_empty(&dir);
    assert_eq!(store.len(), 1);
    assert_eq!(
        store.get(&keep.id).unwrap().category,
        TemplateCategory::Optimization
    );
    assert!(store.get(&gone.id).is_none());
}

// =============================================================================
// Export / import
// =============================================================================

#[test]
fn export_file_imports_into_another_library() {
    let source_dir = create_test_dir();
    let target_dir = create_test_dir();
    let export_path = source_dir.path().join("export.json");

    let source = open(&source_dir);
    fs::write(
        &export_path,
        serde_json::to_string_pretty(&source.export()).unwrap(),
    )
    .unwrap();

    let batch: Vec<Template> =
        serde_json::from_str(&fs::read_to_string(&export_path).unwrap()).unwrap();

    let mut target = open_empty(&target_dir);
    assert_eq!(target.import(batch.clone()).unwrap(), 8);
    assert_eq!(target.import(batch).unwrap(), 0, "import must be idempotent");
    assert_eq!(target.len(), 8);
}

#[test]
fn exported_json_uses_camel_case_fields() {
    let dir = create_test_dir();
    let store = open(&dir);

    let value = serde_json::to_value(store.export()).unwrap();
    let first = &value[0];
    assert!(first.get("useCount").is_some());
    assert!(first.get("createdAt").is_some());
    assert!(first.get("updatedAt").is_some());
    assert!(first["id"].as_str().unwrap().starts_with("tpl_"));
}

// =============================================================================
// Use flow
// =============================================================================

#[test]
fn render_with_defaults_fills_declared_values() {
    let dir = create_test_dir();
    let mut store = open(&dir);
    let id = store
        .search("unit test generation")
        .first()
        .map(|t| t.id.clone())
        .expect("default template present");

    let template = store.get(&id).unwrap();
    let placeholders = template.placeholders();
    let mut values = default_values(&placeholders);
    values.insert("targetName".to_string(), "parse_payload".to_string());

    let text = store.render(&id, &values).unwrap();

    assert!(text.contains("comprehensive unit tests for parse_payload:"));
    assert!(text.contains("Aim for 90% code coverage"));
    assert!(extract_variables(&text).is_empty());
    assert_eq!(store.get(&id).unwrap().use_count, 1);

    let reopened = open(&dir);
    assert_eq!(reopened.get(&id).unwrap().use_count, 1);
    assert_eq!(reopened.popular(1)[0].id, id);
}

#[test]
fn partial_values_leave_other_placeholders_in_place() {
    let dir = create_test_dir();
    let mut store = open_empty(&dir);
    let t = store
        .create(NewTemplate::new(
            "greet",
            TemplateCategory::General,
            "Hi {{name:Your name}}, goal: {{goal:Aim::ship it}}",
        ))
        .unwrap();

    let values = HashMap::from([("name".to_string(), "Ann".to_string())]);
    let text = store.render(&t.id, &values).unwrap();

    assert_eq!(text, "Hi Ann, goal: {{goal:Aim::ship it}}");
    let remaining = extract_variables(&text);
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].name, "goal");
    assert_eq!(remaining[0].default_value.as_deref(), Some(":ship it"));
}
