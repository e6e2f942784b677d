use crate::attribute::Attribute;
use crate::section::Section;
use caseport_ids::CanonicalId;
use serde::{Deserialize, Serialize};

/// The `main.json` manifest of one export (or one batch before merge).
///
/// Items are listed by id only; each is persisted in its own file.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Root {
    pub project_name: String,
    #[serde(default)]
    pub sections: Vec<Section>,
    #[serde(default)]
    pub test_cases: Vec<CanonicalId>,
    #[serde(default)]
    pub shared_steps: Vec<CanonicalId>,
    #[serde(default)]
    pub attributes: Vec<Attribute>,
}

impl Root {
    pub fn new(project_name: impl Into<String>) -> Self {
        Self {
            project_name: project_name.into(),
            sections: Vec::new(),
            test_cases: Vec::new(),
            shared_steps: Vec::new(),
            attributes: Vec::new(),
        }
    }

    pub fn attribute_by_name(&self, name: &str) -> Option<&Attribute> {
        self.attributes.iter().find(|a| a.name == name)
    }
}
