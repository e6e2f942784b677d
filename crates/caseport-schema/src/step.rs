use caseport_ids::CanonicalId;
use serde::{Deserialize, Serialize};

/// One step of a test case, shared step or section pre/postcondition.
///
/// A step with `shared_step_id` set is a pure reference: its text and
/// attachment fields are empty.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Step {
    #[serde(default)]
    pub action: String,
    #[serde(default)]
    pub expected: String,
    #[serde(default)]
    pub test_data: String,
    #[serde(default)]
    pub action_attachments: Vec<String>,
    #[serde(default)]
    pub expected_attachments: Vec<String>,
    #[serde(default)]
    pub test_data_attachments: Vec<String>,
    #[serde(default)]
    pub shared_step_id: Option<CanonicalId>,
}

impl Step {
    pub fn text(action: impl Into<String>, expected: impl Into<String>) -> Self {
        Self {
            action: action.into(),
            expected: expected.into(),
            ..Self::default()
        }
    }

    pub fn reference(shared_step_id: CanonicalId) -> Self {
        Self {
            shared_step_id: Some(shared_step_id),
            ..Self::default()
        }
    }

    pub fn is_reference(&self) -> bool {
        self.shared_step_id.is_some()
    }

    /// True when the step carries no text and no attachments.
    pub fn is_blank(&self) -> bool {
        self.action.is_empty()
            && self.expected.is_empty()
            && self.test_data.is_empty()
            && self.attachment_names().next().is_none()
            && self.shared_step_id.is_none()
    }

    pub fn attachment_names(&self) -> impl Iterator<Item = &String> {
        self.action_attachments
            .iter()
            .chain(&self.expected_attachments)
            .chain(&self.test_data_attachments)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reference_step_has_no_content() {
        let id = CanonicalId::from_u128(7);
        let step = Step::reference(id);
        assert!(step.is_reference());
        assert!(step.action.is_empty());
        assert!(step.expected.is_empty());
        assert_eq!(step.attachment_names().count(), 0);
        assert!(!step.is_blank());
    }

    #[test]
    fn default_step_is_blank() {
        assert!(Step::default().is_blank());
        assert!(!Step::text("open", "").is_blank());
    }

    #[test]
    fn missing_fields_default_when_parsing() {
        let step: Step = serde_json::from_str(r#"{"action":"a"}"#).unwrap();
        assert_eq!(step.action, "a");
        assert!(step.shared_step_id.is_none());
    }
}
