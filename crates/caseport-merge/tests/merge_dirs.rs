//! Merging batch directories written by the file sink.

use caseport_attributes::OptionMergePolicy;
use caseport_ids::CanonicalId;
use caseport_merge::merge_export_dirs;
use caseport_ports::SinkWriter;
use caseport_render_json::{FileSink, read_root};
use caseport_schema::{Attribute, AttributeType, AttributeValue, CaseAttribute, Root, Section, TestCase};
use std::path::PathBuf;

struct Batch {
    dir: PathBuf,
    root: Root,
}

fn write_batch(dir: PathBuf, sections: Vec<Section>, cases: Vec<TestCase>, attrs: Vec<Attribute>) -> Batch {
    let sink = FileSink::create(&dir).unwrap();
    let mut root = Root::new("Acme");
    root.sections = sections;
    root.attributes = attrs;
    for tc in &cases {
        sink.write_test_case(tc).unwrap();
        root.test_cases.push(tc.id);
    }
    sink.write_main_json(&root).unwrap();
    Batch { dir, root }
}

fn tree(root: &str, path: &[&str]) -> Section {
    let mut top = Section::new(root);
    let mut cursor = &mut top;
    for name in path {
        cursor.sections.push(Section::new(*name));
        let last = cursor.sections.len() - 1;
        cursor = &mut cursor.sections[last];
    }
    top
}

#[test]
fn batches_merge_and_item_files_point_at_surviving_ids() {
    let tmp = tempfile::tempdir().unwrap();

    let a_sections = vec![tree("Root", &["Auth"])];
    let a_root_id = a_sections[0].id;
    let a_case = TestCase::new(CanonicalId::new(), "A case", a_sections[0].sections[0].id);
    let a = write_batch(tmp.path().join("a"), a_sections, vec![a_case.clone()], vec![]);

    let b_sections = vec![tree("Root", &["Auth", "Login"])];
    let b_root_id = b_sections[0].id;
    let login_id = b_sections[0].sections[0].sections[0].id;
    let b_in_root = TestCase::new(CanonicalId::new(), "B root case", b_root_id);
    let b_in_login = TestCase::new(CanonicalId::new(), "B login case", login_id);
    let b = write_batch(
        tmp.path().join("b"),
        b_sections,
        vec![b_in_root.clone(), b_in_login.clone()],
        vec![],
    );

    let out = tmp.path().join("out");
    let report =
        merge_export_dirs(&[a.dir.clone(), b.dir.clone()], &out, OptionMergePolicy::Union).unwrap();
    assert_eq!(report.batches, 2);
    assert_eq!(report.sections_remapped, 2);
    assert_eq!(report.documents_rewritten, 3);
    assert!(report.skipped.is_empty());

    let merged = read_root(&out).unwrap();
    assert_eq!(merged.sections.len(), 1);
    assert_eq!(merged.sections[0].id, a_root_id);
    let auth = &merged.sections[0].sections;
    assert_eq!(auth.len(), 1);
    assert_eq!(auth[0].name, "Auth");
    assert_eq!(auth[0].sections.len(), 1);
    assert_eq!(auth[0].sections[0].id, login_id);
    assert_eq!(merged.test_cases.len(), 3);

    let paths = caseport_output_layout::ExportPaths::new(&out);
    let moved: TestCase = serde_json::from_str(
        &std::fs::read_to_string(paths.test_case_json(b_in_root.id)).unwrap(),
    )
    .unwrap();
    assert_eq!(moved.section_id, a_root_id);
    let untouched: TestCase = serde_json::from_str(
        &std::fs::read_to_string(paths.test_case_json(b_in_login.id)).unwrap(),
    )
    .unwrap();
    assert_eq!(untouched.section_id, login_id);
    assert_eq!(b.root.sections[0].id, b_root_id);
    assert_eq!(a.root.sections[0].id, a_root_id);
}

#[test]
fn attribute_bindings_follow_the_surviving_attribute() {
    let tmp = tempfile::tempdir().unwrap();
    let section = Section::new("Root");

    let env_a = Attribute::new("Env", AttributeType::String);
    let a = write_batch(tmp.path().join("a"), vec![section.clone()], vec![], vec![env_a.clone()]);

    let env_b = Attribute::new("Env", AttributeType::String);
    let mut tc = TestCase::new(CanonicalId::new(), "B", section.id);
    tc.attributes.push(CaseAttribute::new(env_b.id, "prod"));
    let b = write_batch(tmp.path().join("b"), vec![section.clone()], vec![tc.clone()], vec![env_b]);

    let out = tmp.path().join("out");
    let report = merge_export_dirs(&[a.dir, b.dir], &out, OptionMergePolicy::Union).unwrap();
    assert_eq!(report.attributes_remapped, 1);

    let merged = read_root(&out).unwrap();
    assert_eq!(merged.attributes.len(), 1);
    assert_eq!(merged.attributes[0].id, env_a.id);

    let doc = caseport_output_layout::ExportPaths::new(&out).test_case_json(tc.id);
    let back: TestCase = serde_json::from_str(&std::fs::read_to_string(doc).unwrap()).unwrap();
    assert_eq!(back.attributes[0].id, env_a.id);
}

#[test]
fn checkbox_from_one_batch_is_backfilled_in_the_others() {
    let tmp = tempfile::tempdir().unwrap();
    let section = Section::new("Root");

    let untouched = TestCase::new(CanonicalId::new(), "A", section.id);
    let a = write_batch(tmp.path().join("a"), vec![section.clone()], vec![untouched.clone()], vec![]);

    let automated = Attribute::new("Automated", AttributeType::Checkbox);
    let mut checked = TestCase::new(CanonicalId::new(), "B", section.id);
    checked
        .attributes
        .push(CaseAttribute::new(automated.id, AttributeValue::checkbox(true)));
    let b = write_batch(
        tmp.path().join("b"),
        vec![section.clone()],
        vec![checked.clone()],
        vec![automated.clone()],
    );

    let out = tmp.path().join("out");
    let report = merge_export_dirs(&[a.dir, b.dir], &out, OptionMergePolicy::Union).unwrap();
    assert_eq!(report.checkboxes_backfilled, 1);

    let paths = caseport_output_layout::ExportPaths::new(&out);
    let read = |id: CanonicalId| -> TestCase {
        serde_json::from_str(&std::fs::read_to_string(paths.test_case_json(id)).unwrap()).unwrap()
    };
    assert_eq!(
        read(untouched.id).attributes,
        vec![CaseAttribute::new(automated.id, AttributeValue::checkbox(false))]
    );
    assert_eq!(read(checked.id).attributes, checked.attributes);
}

#[test]
fn attachments_are_copied_alongside_documents() {
    let tmp = tempfile::tempdir().unwrap();
    let section = Section::new("Root");
    let tc = TestCase::new(CanonicalId::new(), "With file", section.id);
    let dir = tmp.path().join("a");
    let batch = write_batch(dir.clone(), vec![section], vec![tc.clone()], vec![]);
    FileSink::create(&dir)
        .unwrap()
        .write_attachment(tc.id, b"bytes", "log.txt")
        .unwrap();

    let out = tmp.path().join("out");
    let report = merge_export_dirs(&[batch.dir], &out, OptionMergePolicy::Union).unwrap();
    assert_eq!(report.files_copied, 1);
    let copied = std::fs::read(out.join(tc.id.to_string()).join("log.txt")).unwrap();
    assert_eq!(copied, b"bytes");
}

#[test]
fn unreadable_item_file_is_skipped_not_fatal() {
    let tmp = tempfile::tempdir().unwrap();
    let section = Section::new("Root");
    let good = TestCase::new(CanonicalId::new(), "Good", section.id);
    let dir = tmp.path().join("a");
    let batch = write_batch(dir.clone(), vec![section.clone()], vec![good.clone()], vec![]);

    // Invalid UTF-8 cannot be rewritten as text.
    let bad_item = dir.join(CanonicalId::new().to_string());
    std::fs::create_dir_all(&bad_item).unwrap();
    std::fs::write(bad_item.join("shared-step.json"), [0xff, 0xfe, 0xfd]).unwrap();

    let out = tmp.path().join("out");
    let report = merge_export_dirs(&[batch.dir], &out, OptionMergePolicy::Union).unwrap();
    assert_eq!(report.documents_rewritten, 1);
    assert_eq!(report.skipped.len(), 1);
    assert!(report.skipped[0].path.ends_with("shared-step.json"));
    assert!(
        caseport_output_layout::ExportPaths::new(&out)
            .test_case_json(good.id)
            .exists()
    );
}

#[test]
fn missing_batch_manifest_is_fatal() {
    let tmp = tempfile::tempdir().unwrap();
    let empty = tmp.path().join("empty");
    std::fs::create_dir_all(&empty).unwrap();
    let err = merge_export_dirs(&[empty], &tmp.path().join("out"), OptionMergePolicy::Union)
        .unwrap_err();
    assert!(format!("{err:#}").contains("main.json"));
}
