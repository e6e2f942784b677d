//! Wire shape of the documents an importer reads, byte for byte.

use caseport_ids::CanonicalId;
use caseport_ports::SinkWriter;
use caseport_render_json::FileSink;
use caseport_schema::{Attribute, AttributeType, CaseAttribute, Root, Section, Step, TestCase};

#[test]
fn test_case_document_shape() {
    let dir = tempfile::tempdir().unwrap();
    let sink = FileSink::create(dir.path()).unwrap();

    let mut tc = TestCase::new(
        CanonicalId::from_u128(10),
        "Login works",
        CanonicalId::from_u128(1),
    );
    tc.steps.push(Step::text("open", "form shown"));
    tc.steps.push(Step::reference(CanonicalId::from_u128(20)));
    tc.attributes
        .push(CaseAttribute::new(CanonicalId::from_u128(30), "False"));
    sink.write_test_case(&tc).unwrap();

    let text = std::fs::read_to_string(sink.paths().test_case_json(tc.id)).unwrap();
    insta::assert_snapshot!(text, @r###"
    {
      "id": "00000000-0000-0000-0000-00000000000a",
      "name": "Login works",
      "description": "",
      "state": "NotReady",
      "priority": "Medium",
      "steps": [
        {
          "action": "open",
          "expected": "form shown",
          "testData": "",
          "actionAttachments": [],
          "expectedAttachments": [],
          "testDataAttachments": [],
          "sharedStepId": null
        },
        {
          "action": "",
          "expected": "",
          "testData": "",
          "actionAttachments": [],
          "expectedAttachments": [],
          "testDataAttachments": [],
          "sharedStepId": "00000000-0000-0000-0000-000000000014"
        }
      ],
      "preconditionSteps": [],
      "postconditionSteps": [],
      "tags": [],
      "links": [],
      "attributes": [
        {
          "id": "00000000-0000-0000-0000-00000000001e",
          "value": "False"
        }
      ],
      "attachments": [],
      "sectionId": "00000000-0000-0000-0000-000000000001",
      "iterations": [],
      "duration": 0
    }
    "###);
}

#[test]
fn manifest_document_shape() {
    let dir = tempfile::tempdir().unwrap();
    let sink = FileSink::create(dir.path()).unwrap();

    let mut attr = Attribute::new("Component", AttributeType::Options);
    attr.id = CanonicalId::from_u128(30);
    attr.options = vec!["UI".into(), "API".into()];
    let mut root = Root::new("Acme");
    root.sections
        .push(Section::with_id(CanonicalId::from_u128(1), "Root"));
    root.test_cases.push(CanonicalId::from_u128(10));
    root.attributes.push(attr);
    sink.write_main_json(&root).unwrap();

    let text = std::fs::read_to_string(sink.paths().main_json()).unwrap();
    insta::assert_snapshot!(text, @r###"
    {
      "projectName": "Acme",
      "sections": [
        {
          "id": "00000000-0000-0000-0000-000000000001",
          "name": "Root",
          "preconditionSteps": [],
          "postconditionSteps": [],
          "sections": []
        }
      ],
      "testCases": [
        "00000000-0000-0000-0000-00000000000a"
      ],
      "sharedSteps": [],
      "attributes": [
        {
          "id": "00000000-0000-0000-0000-00000000001e",
          "name": "Component",
          "type": "Options",
          "isActive": true,
          "isRequired": false,
          "options": [
            "UI",
            "API"
          ]
        }
      ]
    }
    "###);
}
