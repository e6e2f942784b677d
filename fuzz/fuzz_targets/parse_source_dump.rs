//! Fuzz harness for source dumps
//!
//! Parses arbitrary input as a project dump and builds its section tree.
//! Target: `caseport_ingest_json::SourceDump`, `caseport_sections::SectionTree`

#![no_main]

use caseport_ingest_json::SourceDump;
use caseport_sections::SectionTree;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(dump) = serde_json::from_slice::<SourceDump>(data) else {
        return;
    };

    let mut tree = SectionTree::from_listing(&dump.sections, None, "Imported");
    for item in &dump.items {
        tree.resolve(item.section_id.as_ref(), item.section_path.as_deref());
    }
    let _ = tree.into_sections();
});
