use caseport_ids::CanonicalId;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum AttributeType {
    String,
    Options,
    MultipleOptions,
    Checkbox,
    Datetime,
    User,
}

impl AttributeType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::String => "String",
            Self::Options => "Options",
            Self::MultipleOptions => "MultipleOptions",
            Self::Checkbox => "Checkbox",
            Self::Datetime => "Datetime",
            Self::User => "User",
        }
    }

    /// Whether values of this type are picked from `options`.
    pub fn has_options(&self) -> bool {
        matches!(self, Self::Options | Self::MultipleOptions)
    }
}

impl fmt::Display for AttributeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A custom attribute definition. `name` is the deduplication key.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Attribute {
    pub id: CanonicalId,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: AttributeType,
    pub is_active: bool,
    pub is_required: bool,
    #[serde(default)]
    pub options: Vec<String>,
}

impl Attribute {
    pub fn new(name: impl Into<String>, kind: AttributeType) -> Self {
        Self {
            id: CanonicalId::new(),
            name: name.into(),
            kind,
            is_active: true,
            is_required: false,
            options: Vec::new(),
        }
    }
}

/// Value bound to an attribute on one item.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum AttributeValue {
    Text(String),
    List(Vec<String>),
}

impl AttributeValue {
    pub fn empty() -> Self {
        Self::Text(String::new())
    }

    pub fn checkbox(checked: bool) -> Self {
        Self::Text(if checked { "True" } else { "False" }.to_string())
    }

    pub fn is_empty(&self) -> bool {
        match self {
            Self::Text(s) => s.is_empty(),
            Self::List(v) => v.is_empty(),
        }
    }
}

impl From<&str> for AttributeValue {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

impl From<String> for AttributeValue {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

impl From<Vec<String>> for AttributeValue {
    fn from(v: Vec<String>) -> Self {
        Self::List(v)
    }
}

/// Binds an item to an attribute value. `id` is the `Attribute.id`.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct CaseAttribute {
    pub id: CanonicalId,
    pub value: AttributeValue,
}

impl CaseAttribute {
    pub fn new(id: CanonicalId, value: impl Into<AttributeValue>) -> Self {
        Self {
            id,
            value: value.into(),
        }
    }
}
