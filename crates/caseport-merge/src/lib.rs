//! Merging independently exported batches into one export.
//!
//! [`merge_roots`] is the pure part: it dedupes sections per tree level and
//! attributes globally by name, unions item ids, and records which ids were
//! folded into which. [`rewrite_references`] applies that remap to an item
//! document that was written before the merge. [`merge_export_dirs`] drives
//! both over batch directories on disk.

mod fs;

pub use fs::{MergeReport, SkippedFile, merge_export_dirs};

use caseport_attributes::{OptionMergePolicy, absorb};
use caseport_ids::CanonicalId;
use caseport_schema::{Attribute, Root, Section};
use regex::{Captures, Regex};
use std::collections::{BTreeMap, HashSet};
use std::sync::LazyLock;

/// Duplicate id → surviving id.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IdRemap {
    pub sections: BTreeMap<CanonicalId, CanonicalId>,
    pub attributes: BTreeMap<CanonicalId, CanonicalId>,
}

impl IdRemap {
    pub fn is_empty(&self) -> bool {
        self.sections.is_empty() && self.attributes.is_empty()
    }
}

#[derive(Debug, Clone)]
pub struct MergeOutcome {
    pub root: Root,
    pub remap: IdRemap,
}

/// Merge batch manifests. The first batch's project name is kept.
pub fn merge_roots(roots: Vec<Root>, policy: OptionMergePolicy) -> MergeOutcome {
    let mut remap = IdRemap::default();
    let mut merged = Root::new(
        roots
            .first()
            .map(|r| r.project_name.clone())
            .unwrap_or_default(),
    );
    let mut seen_cases = HashSet::new();
    let mut seen_shared = HashSet::new();

    for root in roots {
        merge_level(&mut merged.sections, root.sections, &mut remap.sections);
        merge_attributes(
            &mut merged.attributes,
            root.attributes,
            policy,
            &mut remap.attributes,
        );
        merged
            .test_cases
            .extend(root.test_cases.into_iter().filter(|id| seen_cases.insert(*id)));
        merged
            .shared_steps
            .extend(root.shared_steps.into_iter().filter(|id| seen_shared.insert(*id)));
    }

    MergeOutcome {
        root: merged,
        remap,
    }
}

/// Dedupe `incoming` into `kept` by name; the scope is this one level.
fn merge_level(
    kept: &mut Vec<Section>,
    incoming: Vec<Section>,
    remap: &mut BTreeMap<CanonicalId, CanonicalId>,
) {
    for mut section in incoming {
        let children = std::mem::take(&mut section.sections);
        let target = match kept.iter().position(|k| k.name == section.name) {
            Some(i) => {
                let survivor = &mut kept[i];
                if section.id != survivor.id {
                    remap.insert(section.id, survivor.id);
                }
                if survivor.precondition_steps.is_empty() {
                    survivor.precondition_steps = section.precondition_steps;
                }
                if survivor.postcondition_steps.is_empty() {
                    survivor.postcondition_steps = section.postcondition_steps;
                }
                i
            }
            None => {
                kept.push(section);
                kept.len() - 1
            }
        };
        merge_level(&mut kept[target].sections, children, remap);
    }
}

fn merge_attributes(
    kept: &mut Vec<Attribute>,
    incoming: Vec<Attribute>,
    policy: OptionMergePolicy,
    remap: &mut BTreeMap<CanonicalId, CanonicalId>,
) {
    for attr in incoming {
        match kept.iter_mut().find(|k| k.name == attr.name) {
            Some(survivor) => {
                if attr.id != survivor.id {
                    remap.insert(attr.id, survivor.id);
                }
                absorb(survivor, &attr, policy);
            }
            None => kept.push(attr),
        }
    }
}

static QUOTED_GUID: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#""([0-9a-fA-F]{8}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{12})""#)
        .expect("static pattern")
});

static ID_FIELD: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#""id"(\s*:\s*)"([0-9a-fA-F]{8}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{12})""#)
        .expect("static pattern")
});

/// Replace stale ids in a serialized document.
///
/// Section ids are replaced wherever they occur as a whole quoted string.
/// Attribute ids are only replaced as the value of an `"id"` key, since
/// other GUID-valued fields may share their text.
pub fn rewrite_references(text: &str, remap: &IdRemap) -> String {
    if remap.is_empty() {
        return text.to_string();
    }
    let lookup = |map: &BTreeMap<CanonicalId, CanonicalId>, raw: &str| {
        raw.parse::<CanonicalId>()
            .ok()
            .and_then(|id| map.get(&id).copied())
    };

    let attributes_done = ID_FIELD.replace_all(text, |caps: &Captures| {
        match lookup(&remap.attributes, &caps[2]) {
            Some(kept) => format!(r#""id"{}"{kept}""#, &caps[1]),
            None => caps[0].to_string(),
        }
    });
    QUOTED_GUID
        .replace_all(&attributes_done, |caps: &Captures| {
            match lookup(&remap.sections, &caps[1]) {
                Some(kept) => format!(r#""{kept}""#),
                None => caps[0].to_string(),
            }
        })
        .into_owned()
}
