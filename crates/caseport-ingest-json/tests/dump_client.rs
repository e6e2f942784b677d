//! Reading a project from a JSON dump on disk.

use caseport_ids::SourceId;
use caseport_ingest_json::JsonDumpClient;
use caseport_ports::{CallMode, FieldValue, SectionListing, SourceClient};

const DUMP: &str = r#"{
  "projectName": "Acme",
  "sections": { "flat": [
    { "id": "1", "name": "Root" },
    { "id": "2", "name": "Auth", "parentId": "1" }
  ] },
  "attributeDefinitions": [
    { "name": "Component", "type": "Options", "options": ["UI", "API"] }
  ],
  "items": [
    { "id": "10", "name": "Login", "sectionId": "2",
      "steps": [
        { "action": "open", "expected": "shown" },
        { "call": { "target": "50", "mode": "copy" } }
      ],
      "fields": [
        { "name": "Component", "value": "UI" },
        { "name": "Automated", "value": true }
      ] },
    { "id": "11", "name": "Loose" },
    { "id": "12", "name": "Stray", "sectionId": "999" }
  ],
  "library": [
    { "id": "50", "name": "Common setup", "isShared": true }
  ],
  "attachments": {
    "10": [ { "id": "a1", "name": "shot.png", "path": "files/shot.png" } ]
  }
}"#;

fn open() -> (tempfile::TempDir, JsonDumpClient) {
    let dir = tempfile::tempdir().unwrap();
    std::fs::create_dir_all(dir.path().join("files")).unwrap();
    std::fs::write(dir.path().join("files/shot.png"), b"png").unwrap();
    let path = dir.path().join("dump.json");
    std::fs::write(&path, DUMP).unwrap();
    let client = JsonDumpClient::open(&path).unwrap();
    (dir, client)
}

#[test]
fn lists_project_sections_and_definitions() {
    let (_dir, client) = open();
    assert_eq!(client.project_name().unwrap(), "Acme");
    match client.list_sections().unwrap() {
        SectionListing::Flat(records) => {
            assert_eq!(records.len(), 2);
            assert_eq!(records[1].parent_id, Some(SourceId::from("1")));
        }
        other => panic!("expected flat listing, got {other:?}"),
    }
    let defs = client.list_attribute_definitions().unwrap();
    assert_eq!(defs[0].options, vec!["UI", "API"]);
}

#[test]
fn items_are_listed_per_section() {
    let (_dir, client) = open();
    let auth = client
        .list_items_in_section(Some(&SourceId::from("2")))
        .unwrap();
    assert_eq!(auth.len(), 1);
    assert_eq!(auth[0].steps[1].call.as_ref().unwrap().mode, CallMode::Copy);
    assert_eq!(
        auth[0].fields[1].value,
        Some(FieldValue::Bool(true))
    );

    let loose: Vec<String> = client
        .list_items_in_section(None)
        .unwrap()
        .into_iter()
        .map(|i| i.name)
        .collect();
    assert_eq!(loose, vec!["Loose", "Stray"]);
}

#[test]
fn library_items_are_fetchable_but_not_listed() {
    let (_dir, client) = open();
    let shared = client.get_item(&SourceId::from("50")).unwrap().unwrap();
    assert!(shared.is_shared);
    assert!(client.get_item(&SourceId::from("404")).unwrap().is_none());
    let listed: usize = [None, Some(SourceId::from("1")), Some(SourceId::from("2"))]
        .iter()
        .map(|s| client.list_items_in_section(s.as_ref()).unwrap().len())
        .sum();
    assert_eq!(listed, 3);
}

#[test]
fn attachments_resolve_relative_to_the_dump() {
    let (_dir, client) = open();
    let records = client.get_attachments(&SourceId::from("10")).unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(client.download_attachment(&records[0]).unwrap(), b"png");
    assert!(client.get_attachments(&SourceId::from("11")).unwrap().is_empty());
}

#[test]
fn missing_attachment_file_is_an_error() {
    let (dir, client) = open();
    std::fs::remove_file(dir.path().join("files/shot.png")).unwrap();
    let records = client.get_attachments(&SourceId::from("10")).unwrap();
    let err = client.download_attachment(&records[0]).unwrap_err();
    assert!(format!("{err:#}").contains("shot.png"));
}

#[test]
fn malformed_dump_names_the_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("broken.json");
    std::fs::write(&path, "{ not json").unwrap();
    let err = JsonDumpClient::open(&path).unwrap_err();
    assert!(format!("{err:#}").contains("broken.json"));
}
