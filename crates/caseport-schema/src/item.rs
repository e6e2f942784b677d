use crate::attribute::CaseAttribute;
use crate::step::Step;
use caseport_ids::CanonicalId;
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum State {
    #[default]
    NotReady,
    NeedsWork,
    Ready,
}

#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum Priority {
    Lowest,
    Low,
    #[default]
    Medium,
    High,
    Highest,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Link {
    pub title: String,
    pub url: String,
    #[serde(default)]
    pub description: String,
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Parameter {
    pub name: String,
    pub value: String,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Iteration {
    pub parameters: Vec<Parameter>,
}

/// A standalone test case.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct TestCase {
    pub id: CanonicalId,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub state: State,
    pub priority: Priority,
    #[serde(default)]
    pub steps: Vec<Step>,
    #[serde(default)]
    pub precondition_steps: Vec<Step>,
    #[serde(default)]
    pub postcondition_steps: Vec<Step>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub links: Vec<Link>,
    #[serde(default)]
    pub attributes: Vec<CaseAttribute>,
    #[serde(default)]
    pub attachments: Vec<String>,
    pub section_id: CanonicalId,
    #[serde(default)]
    pub iterations: Vec<Iteration>,
    #[serde(default)]
    pub duration: u64,
}

impl TestCase {
    pub fn new(id: CanonicalId, name: impl Into<String>, section_id: CanonicalId) -> Self {
        Self {
            id,
            name: name.into(),
            description: String::new(),
            state: State::default(),
            priority: Priority::default(),
            steps: Vec::new(),
            precondition_steps: Vec::new(),
            postcondition_steps: Vec::new(),
            tags: Vec::new(),
            links: Vec::new(),
            attributes: Vec::new(),
            attachments: Vec::new(),
            section_id,
            iterations: Vec::new(),
            duration: 0,
        }
    }
}

/// A reusable sequence of steps referenced from other items.
///
/// Same shape as [`TestCase`] without iterations and duration.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SharedStep {
    pub id: CanonicalId,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub state: State,
    pub priority: Priority,
    #[serde(default)]
    pub steps: Vec<Step>,
    #[serde(default)]
    pub precondition_steps: Vec<Step>,
    #[serde(default)]
    pub postcondition_steps: Vec<Step>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub links: Vec<Link>,
    #[serde(default)]
    pub attributes: Vec<CaseAttribute>,
    #[serde(default)]
    pub attachments: Vec<String>,
    pub section_id: CanonicalId,
}

impl SharedStep {
    pub fn new(id: CanonicalId, name: impl Into<String>, section_id: CanonicalId) -> Self {
        Self::from_test_case(TestCase::new(id, name, section_id))
    }

    /// Reclassify an already-converted test case as a shared step.
    ///
    /// The id is kept so references handed out earlier stay valid. State is
    /// reset to the canonical default; iterations and duration are dropped.
    pub fn from_test_case(tc: TestCase) -> Self {
        Self {
            id: tc.id,
            name: tc.name,
            description: tc.description,
            state: State::NotReady,
            priority: tc.priority,
            steps: tc.steps,
            precondition_steps: tc.precondition_steps,
            postcondition_steps: tc.postcondition_steps,
            tags: tc.tags,
            links: tc.links,
            attributes: tc.attributes,
            attachments: tc.attachments,
            section_id: tc.section_id,
        }
    }
}
