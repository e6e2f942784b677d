//! A [`SourceClient`] that reads a whole project from one JSON document.
//!
//! Useful for fixtures, for replaying a captured project, and for source
//! systems whose export is a file rather than an API.
//!
//! ```json
//! {
//!   "projectName": "Acme",
//!   "sections": { "flat": [{ "id": "1", "name": "Root" }] },
//!   "attributeDefinitions": [],
//!   "items": [{ "id": "10", "name": "Login", "sectionId": "1" }],
//!   "library": [],
//!   "attachments": { "10": [{ "id": "a1", "name": "shot.png", "path": "files/shot.png" }] }
//! }
//! ```
//!
//! `items` are listed by section; `library` items are reachable only by id,
//! the way a callee outside the exported scope would be.

use anyhow::{Context, Result, anyhow};
use caseport_ids::SourceId;
use caseport_ports::{
    AttachmentRecord, FieldDefinition, ItemRecord, SectionListing, SectionNode, SourceClient,
};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::{Path, PathBuf};
use tracing::debug;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceDump {
    pub project_name: String,
    #[serde(default)]
    pub sections: SectionListing,
    #[serde(default)]
    pub attribute_definitions: Vec<FieldDefinition>,
    #[serde(default)]
    pub items: Vec<ItemRecord>,
    #[serde(default)]
    pub library: Vec<ItemRecord>,
    #[serde(default)]
    pub attachments: BTreeMap<SourceId, Vec<AttachmentRecord>>,
}

#[derive(Debug, Clone)]
pub struct JsonDumpClient {
    dump: SourceDump,
    base_dir: PathBuf,
    by_id: HashMap<SourceId, ItemRecord>,
    known_sections: HashSet<SourceId>,
}

impl JsonDumpClient {
    /// Load a dump; attachment paths resolve relative to its directory.
    pub fn open(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).with_context(|| format!("read {path:?}"))?;
        let dump: SourceDump =
            serde_json::from_str(&text).with_context(|| format!("parse source dump {path:?}"))?;
        let base_dir = path.parent().map(Path::to_path_buf).unwrap_or_default();
        Ok(Self::from_dump(dump, base_dir))
    }

    pub fn from_dump(dump: SourceDump, base_dir: impl Into<PathBuf>) -> Self {
        let by_id = dump
            .items
            .iter()
            .chain(&dump.library)
            .map(|item| (item.id.clone(), item.clone()))
            .collect();
        let known_sections = section_ids(&dump.sections);
        Self {
            dump,
            base_dir: base_dir.into(),
            by_id,
            known_sections,
        }
    }

    pub fn dump(&self) -> &SourceDump {
        &self.dump
    }
}

fn section_ids(listing: &SectionListing) -> HashSet<SourceId> {
    fn walk(nodes: &[SectionNode], out: &mut HashSet<SourceId>) {
        for node in nodes {
            out.insert(node.id.clone());
            walk(&node.children, out);
        }
    }
    let mut out = HashSet::new();
    match listing {
        SectionListing::Flat(records) => out.extend(records.iter().map(|r| r.id.clone())),
        SectionListing::Nested(nodes) => walk(nodes, &mut out),
    }
    out
}

impl SourceClient for JsonDumpClient {
    fn project_name(&self) -> Result<String> {
        Ok(self.dump.project_name.clone())
    }

    fn list_sections(&self) -> Result<SectionListing> {
        Ok(self.dump.sections.clone())
    }

    fn list_attribute_definitions(&self) -> Result<Vec<FieldDefinition>> {
        Ok(self.dump.attribute_definitions.clone())
    }

    /// `None` also collects items whose section is not in the listing.
    fn list_items_in_section(&self, section: Option<&SourceId>) -> Result<Vec<ItemRecord>> {
        Ok(self
            .dump
            .items
            .iter()
            .filter(|item| match (section, &item.section_id) {
                (Some(wanted), Some(have)) => wanted == have,
                (Some(_), None) => false,
                (None, Some(have)) => !self.known_sections.contains(have),
                (None, None) => true,
            })
            .cloned()
            .collect())
    }

    fn get_item(&self, id: &SourceId) -> Result<Option<ItemRecord>> {
        Ok(self.by_id.get(id).cloned())
    }

    fn get_attachments(&self, item: &SourceId) -> Result<Vec<AttachmentRecord>> {
        Ok(self.dump.attachments.get(item).cloned().unwrap_or_default())
    }

    fn download_attachment(&self, attachment: &AttachmentRecord) -> Result<Vec<u8>> {
        let rel = attachment
            .path
            .as_deref()
            .ok_or_else(|| anyhow!("attachment {} has no path in the dump", attachment.id))?;
        let path = self.base_dir.join(rel);
        debug!(attachment = %attachment.id, path = %path.display(), "reading attachment");
        std::fs::read(&path).with_context(|| format!("read attachment {path:?}"))
    }
}
