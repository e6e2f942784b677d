//! Source-side records, typed at the client boundary.

use caseport_ids::SourceId;
use caseport_schema::{AttributeType, Iteration, Link};
use serde::{Deserialize, Serialize};

/// Section listing as the source system exposes it.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SectionListing {
    /// Flat records with parent pointers.
    Flat(Vec<SectionRecord>),
    /// Already nested suites/folders.
    Nested(Vec<SectionNode>),
}

impl Default for SectionListing {
    fn default() -> Self {
        Self::Flat(Vec::new())
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SectionRecord {
    pub id: SourceId,
    pub name: String,
    #[serde(default)]
    pub parent_id: Option<SourceId>,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SectionNode {
    pub id: SourceId,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub children: Vec<SectionNode>,
}

/// Custom field value as delivered by the source.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum FieldValue {
    Bool(bool),
    String(String),
    StringList(Vec<String>),
}

/// One custom field on one item.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SourceField {
    pub name: String,
    /// `None` when the source sent null.
    #[serde(default)]
    pub value: Option<FieldValue>,
    /// Enumerated option labels, when the source declares them.
    #[serde(default)]
    pub options: Vec<String>,
    #[serde(default)]
    pub required: bool,
}

impl SourceField {
    pub fn text(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: Some(FieldValue::String(value.into())),
            options: Vec::new(),
            required: false,
        }
    }
}

/// Attribute definition knowable before items are read.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct FieldDefinition {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: AttributeType,
    #[serde(default)]
    pub options: Vec<String>,
    #[serde(default)]
    pub required: bool,
}

#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum CallMode {
    /// The callee stays shared and is referenced.
    #[default]
    Link,
    /// The callee's steps are copied into the caller.
    Copy,
}

/// A step that calls another item instead of carrying content.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct CallRef {
    pub target: SourceId,
    #[serde(default)]
    pub mode: CallMode,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SourceStep {
    #[serde(default)]
    pub action: String,
    #[serde(default)]
    pub expected: String,
    #[serde(default)]
    pub test_data: String,
    #[serde(default)]
    pub action_attachments: Vec<AttachmentRecord>,
    #[serde(default)]
    pub expected_attachments: Vec<AttachmentRecord>,
    #[serde(default)]
    pub test_data_attachments: Vec<AttachmentRecord>,
    #[serde(default)]
    pub call: Option<CallRef>,
    /// Child action/expected pairs; flattened depth-first after this step.
    #[serde(default)]
    pub children: Vec<SourceStep>,
}

impl SourceStep {
    pub fn text(action: impl Into<String>, expected: impl Into<String>) -> Self {
        Self {
            action: action.into(),
            expected: expected.into(),
            ..Self::default()
        }
    }

    pub fn call(target: impl Into<SourceId>, mode: CallMode) -> Self {
        Self {
            call: Some(CallRef {
                target: target.into(),
                mode,
            }),
            ..Self::default()
        }
    }

    /// A parent that only groups children contributes no step of its own.
    pub fn is_container(&self) -> bool {
        self.call.is_none()
            && !self.children.is_empty()
            && self.action.is_empty()
            && self.expected.is_empty()
            && self.test_data.is_empty()
            && self.action_attachments.is_empty()
            && self.expected_attachments.is_empty()
            && self.test_data_attachments.is_empty()
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct AttachmentRecord {
    pub id: SourceId,
    pub name: String,
    /// Location hint for clients that read from disk.
    #[serde(default)]
    pub path: Option<String>,
}

/// One test case or shared step as the source system returns it.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ItemRecord {
    pub id: SourceId,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub priority: Option<String>,
    #[serde(default)]
    pub section_id: Option<SourceId>,
    /// Slash-separated folder path for sources that encode hierarchy in a string.
    #[serde(default)]
    pub section_path: Option<String>,
    /// The source itself marks this item as a shared step.
    #[serde(default)]
    pub is_shared: bool,
    #[serde(default)]
    pub preconditions: Vec<SourceStep>,
    #[serde(default)]
    pub steps: Vec<SourceStep>,
    #[serde(default)]
    pub postconditions: Vec<SourceStep>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub links: Vec<Link>,
    #[serde(default)]
    pub fields: Vec<SourceField>,
    #[serde(default)]
    pub iterations: Vec<Iteration>,
    #[serde(default)]
    pub duration: Option<u64>,
}

impl ItemRecord {
    pub fn new(id: impl Into<SourceId>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            ..Self::default()
        }
    }
}
