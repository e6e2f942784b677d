use crate::step::Step;
use caseport_ids::CanonicalId;
use serde::{Deserialize, Serialize};

/// One node of the section tree.
///
/// `id` is unique across the whole export. `name` is not, but siblings with
/// the same name are collapsed when batches are merged.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Section {
    pub id: CanonicalId,
    pub name: String,
    #[serde(default)]
    pub precondition_steps: Vec<Step>,
    #[serde(default)]
    pub postcondition_steps: Vec<Step>,
    #[serde(default)]
    pub sections: Vec<Section>,
}

impl Section {
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_id(CanonicalId::new(), name)
    }

    pub fn with_id(id: CanonicalId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            precondition_steps: Vec::new(),
            postcondition_steps: Vec::new(),
            sections: Vec::new(),
        }
    }

    /// Depth-first search for a section by id, including `self`.
    pub fn find_mut(&mut self, id: CanonicalId) -> Option<&mut Section> {
        if self.id == id {
            return Some(self);
        }
        self.sections.iter_mut().find_map(|s| s.find_mut(id))
    }

    /// Visit this section and every descendant, parents first.
    pub fn walk<'a>(&'a self, visit: &mut impl FnMut(&'a Section)) {
        visit(self);
        for child in &self.sections {
            child.walk(visit);
        }
    }
}

/// Locate a section anywhere in a forest.
pub fn find_in_mut(sections: &mut [Section], id: CanonicalId) -> Option<&mut Section> {
    sections.iter_mut().find_map(|s| s.find_mut(id))
}

/// All section ids in a forest, in pre-order.
pub fn collect_ids(sections: &[Section]) -> Vec<CanonicalId> {
    let mut out = Vec::new();
    for s in sections {
        s.walk(&mut |node| out.push(node.id));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tree() -> Section {
        let mut root = Section::with_id(CanonicalId::from_u128(1), "Root");
        let mut auth = Section::with_id(CanonicalId::from_u128(2), "Auth");
        auth.sections
            .push(Section::with_id(CanonicalId::from_u128(3), "Login"));
        root.sections.push(auth);
        root.sections
            .push(Section::with_id(CanonicalId::from_u128(4), "Billing"));
        root
    }

    #[test]
    fn find_mut_reaches_nested_nodes() {
        let mut root = tree();
        let login = root.find_mut(CanonicalId::from_u128(3)).unwrap();
        assert_eq!(login.name, "Login");
        assert!(root.find_mut(CanonicalId::from_u128(99)).is_none());
    }

    #[test]
    fn collect_ids_is_pre_order() {
        let ids = collect_ids(&[tree()]);
        assert_eq!(
            ids,
            vec![
                CanonicalId::from_u128(1),
                CanonicalId::from_u128(2),
                CanonicalId::from_u128(3),
                CanonicalId::from_u128(4),
            ]
        );
    }
}
