//! Wire-shape tests for the canonical JSON consumed by importers.

use caseport_ids::CanonicalId;
use caseport_schema::{
    Attribute, AttributeType, CaseAttribute, Root, Section, SharedStep, Step, TestCase,
};

fn fixed(n: u128) -> CanonicalId {
    CanonicalId::from_u128(n)
}

#[test]
fn reference_step_wire_shape() {
    let step = Step::reference(fixed(0xabc));
    insta::assert_json_snapshot!(step, @r###"
    {
      "action": "",
      "expected": "",
      "testData": "",
      "actionAttachments": [],
      "expectedAttachments": [],
      "testDataAttachments": [],
      "sharedStepId": "00000000-0000-0000-0000-000000000abc"
    }
    "###);
}

#[test]
fn root_lists_items_by_id() {
    let mut root = Root::new("Demo");
    root.sections.push(Section::with_id(fixed(1), "Root"));
    root.test_cases.push(fixed(10));
    root.shared_steps.push(fixed(11));
    root.attributes.push(Attribute {
        id: fixed(20),
        name: "Component".into(),
        kind: AttributeType::Options,
        is_active: true,
        is_required: true,
        options: vec!["UI".into(), "API".into()],
    });

    let v = serde_json::to_value(&root).unwrap();
    assert_eq!(v["projectName"], "Demo");
    assert_eq!(v["testCases"][0], "00000000-0000-0000-0000-00000000000a");
    assert_eq!(v["sharedSteps"][0], "00000000-0000-0000-0000-00000000000b");
    assert_eq!(v["sections"][0]["preconditionSteps"], serde_json::json!([]));
    assert_eq!(v["attributes"][0]["options"][1], "API");

    let back: Root = serde_json::from_value(v).unwrap();
    assert_eq!(back, root);
}

#[test]
fn test_case_field_names_are_camel_case() {
    let mut tc = TestCase::new(fixed(5), "Checkout", fixed(1));
    tc.attributes.push(CaseAttribute::new(fixed(20), "UI"));
    tc.precondition_steps.push(Step::text("logged in", ""));
    let v = serde_json::to_value(&tc).unwrap();
    for key in [
        "id",
        "name",
        "description",
        "state",
        "priority",
        "steps",
        "preconditionSteps",
        "postconditionSteps",
        "tags",
        "links",
        "attributes",
        "attachments",
        "sectionId",
        "iterations",
        "duration",
    ] {
        assert!(v.get(key).is_some(), "missing {key}");
    }
    assert_eq!(v["attributes"][0]["value"], "UI");
}

#[test]
fn shared_step_parses_without_optional_fields() {
    let json = r#"{
        "id": "00000000-0000-0000-0000-000000000002",
        "name": "Login",
        "state": "NotReady",
        "priority": "High",
        "sectionId": "00000000-0000-0000-0000-000000000001"
    }"#;
    let shared: SharedStep = serde_json::from_str(json).unwrap();
    assert_eq!(shared.id, fixed(2));
    assert!(shared.steps.is_empty());
}
