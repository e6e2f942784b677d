//! Property tests for section tree construction.

use caseport_ids::SourceId;
use caseport_ports::SectionRecord;
use caseport_schema::section::collect_ids;
use caseport_sections::SectionTree;
use proptest::prelude::*;
use std::collections::HashSet;

/// Random forests: record `i` points at some earlier record or at nothing.
fn arb_records() -> impl Strategy<Value = Vec<SectionRecord>> {
    proptest::collection::vec((any::<bool>(), any::<prop::sample::Index>(), "[A-C]"), 0..30).prop_map(
        |specs| {
            specs
                .into_iter()
                .enumerate()
                .map(|(i, (is_root, parent, name))| SectionRecord {
                    id: SourceId::from(i as u64),
                    name,
                    parent_id: if is_root || i == 0 {
                        None
                    } else {
                        Some(SourceId::from(parent.index(i) as u64))
                    },
                    description: None,
                })
                .collect()
        },
    )
}

proptest! {
    /// Every listed section appears exactly once and has its own id.
    #[test]
    fn prop_every_record_is_placed_once(records in arb_records()) {
        let tree = SectionTree::from_flat(&records, None, "Imported");
        let ids = collect_ids(tree.sections());
        let unique: HashSet<_> = ids.iter().collect();
        prop_assert_eq!(unique.len(), ids.len());
        prop_assert_eq!(ids.len(), records.len());
        for r in &records {
            let id = tree.section_for(&r.id);
            prop_assert!(id.is_some());
            prop_assert!(unique.contains(&id.unwrap()));
        }
    }

    /// Children end up under the parent the record names.
    #[test]
    fn prop_parent_links_are_respected(records in arb_records()) {
        let tree = SectionTree::from_flat(&records, None, "Imported");
        for r in &records {
            if let Some(parent) = &r.parent_id {
                let parent_id = tree.section_for(parent).unwrap();
                let child_id = tree.section_for(&r.id).unwrap();
                let mut found = false;
                for s in tree.sections() {
                    s.walk(&mut |node| {
                        if node.id == parent_id && node.sections.iter().any(|c| c.id == child_id) {
                            found = true;
                        }
                    });
                }
                prop_assert!(found);
            }
        }
    }

    /// The finished forest is never empty.
    #[test]
    fn prop_finished_forest_is_never_empty(records in arb_records()) {
        let tree = SectionTree::from_flat(&records, None, "Imported");
        prop_assert!(!tree.into_sections().is_empty());
    }
}
