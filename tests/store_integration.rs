//! Integration tests for the template store and config loading

use std::fs;

use grafpad::config::DEFAULT_CONFIG_TOML;
use grafpad::store::{ensure_gitignore, write_if_missing};
use grafpad::{Config, MapResolver, Merger, Store, StoreError};
use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use tempfile::TempDir;

fn store() -> (TempDir, Store) {
    let dir = TempDir::new().unwrap();
    let store = Store::new(dir.path().join("store"));
    store.init().unwrap();
    (dir, store)
}

#[test]
fn test_init_creates_directories_once() {
    let dir = TempDir::new().unwrap();
    let store = Store::new(dir.path().join("store"));

    let created = store.init().unwrap();
    assert_eq!(created.len(), 3);
    assert!(store.root().is_dir());
    assert!(store.templates_dir().is_dir());
    assert!(store.temp_dir().is_dir());

    assert!(store.init().unwrap().is_empty());
}

#[test]
fn test_list_templates_sorted_and_filtered() {
    let (_dir, store) = store();
    let templates = store.templates_dir();
    fs::write(templates.join("gauge.json"), "{}").unwrap();
    fs::write(templates.join("alarm.yaml"), "{}").unwrap();
    fs::write(templates.join("notes.txt"), "ignored").unwrap();

    let names: Vec<String> = store
        .list_templates()
        .unwrap()
        .into_iter()
        .map(|t| t.name)
        .collect();
    assert_eq!(names, vec!["alarm", "gauge"]);
}

#[test]
fn test_load_json_template_verbatim() {
    let (_dir, store) = store();
    let text = "{\n  \"title\": \"{{TITLE}}\",\n  \"max\": \"{i{MAX}}\"\n}\n";
    fs::write(store.templates_dir().join("gauge.json"), text).unwrap();

    assert_eq!(store.load_template("gauge").unwrap(), text);
}

#[test]
fn test_load_yaml_template_as_json() {
    let (_dir, store) = store();
    let yaml = "type: stat\ntitle: '{{TITLE}}'\ngridPos: {x: 0, y: 0, w: 4, h: 3}\nmax: '{i{MAX}}'\n";
    fs::write(store.templates_dir().join("stat.yml"), yaml).unwrap();

    let text = store.load_template("stat").unwrap();
    let value: Value = serde_json::from_str(&text).unwrap();
    assert_eq!(value["title"], "{{TITLE}}");
    assert_eq!(value["gridPos"]["w"], 4);

    // The converted text still fills and merges
    let dashboard = json!({"panels": [{"id": 1, "gridPos": {"x": 0, "y": 0, "w": 4, "h": 3}}]});
    let mut values = MapResolver::new()
        .with_text("TITLE", "Pressure")
        .with_number("MAX", 6.0);
    let merged = Merger::new()
        .merge_panel(&dashboard, &text, &mut values)
        .unwrap();
    let panel = &merged.document["panels"][1];
    assert_eq!(panel["title"], "Pressure");
    assert_eq!(panel["max"], 6);
    assert_eq!(panel["gridPos"]["x"], 4);
}

#[test]
fn test_missing_template() {
    let (_dir, store) = store();
    let err = store.load_template("nope").unwrap_err();
    assert!(matches!(err, StoreError::TemplateNotFound { ref name } if name == "nope"));
}

#[test]
fn test_write_scratch() {
    let (_dir, store) = store();
    let document = json!({"uid": "abc", "panels": []});

    let path = store.write_scratch("abc", &document).unwrap();
    assert_eq!(path, store.temp_dir().join("abc.json"));

    let read: Value = serde_json::from_str(&fs::read_to_string(path).unwrap()).unwrap();
    assert_eq!(read, document);
}

#[test]
fn test_gitignore_entries_appended_once() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join(".gitignore"), "target").unwrap();

    assert!(ensure_gitignore(dir.path()).unwrap());
    assert!(!ensure_gitignore(dir.path()).unwrap());

    let text = fs::read_to_string(dir.path().join(".gitignore")).unwrap();
    assert_eq!(text, "target\n.env\nstore/temp/\n");
}

#[test]
fn test_default_config_written_and_loaded() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("grafpad.toml");

    assert!(write_if_missing(&path, DEFAULT_CONFIG_TOML).unwrap());
    assert!(!write_if_missing(&path, "overwritten").unwrap());

    let config = Config::from_file(&path).unwrap();
    assert_eq!(config.layout.grid_columns, 24);
    assert_eq!(config.http.timeout_secs, 30);
}

#[test]
fn test_config_file_values() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("grafpad.toml");
    fs::write(
        &path,
        r#"
[grafana]
url = "http://tatooine.local:3000"

[layout]
grid_columns = 12
"#,
    )
    .unwrap();

    let config = Config::from_file(&path).unwrap();
    assert_eq!(config.grafana.url, "http://tatooine.local:3000");
    assert_eq!(config.layout.grid_columns, 12);
    assert_eq!(config.layout.node_offset, 100.0);
}
