//! In-memory fixtures for caseport tests.
//!
//! [`MemoryClient`] plays a source system, [`MemorySink`] records everything
//! an export writes, and the builders keep test setup short.

mod builders;

pub use builders::{ItemBuilder, attachment, flat_section, item};

use anyhow::{Result, anyhow, bail};
use caseport_ids::{CanonicalId, SourceId};
use caseport_ports::{
    AttachmentRecord, FieldDefinition, ItemRecord, SectionListing, SectionRecord, SinkWriter,
    SourceClient,
};
use caseport_output_layout::ITEM_JSON_FILES;
use caseport_sanitize::UniqueNames;
use caseport_schema::{Root, SharedStep, TestCase};
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

/// A source system held entirely in memory.
///
/// Listed items are returned by `list_items_in_section`; hidden items are
/// only reachable through `get_item`, like a callee living in a part of the
/// project the export does not list.
#[derive(Debug, Default)]
pub struct MemoryClient {
    project: String,
    sections: SectionListing,
    definitions: Vec<FieldDefinition>,
    listed: Vec<SourceId>,
    items: HashMap<SourceId, ItemRecord>,
    attachments: HashMap<SourceId, Vec<AttachmentRecord>>,
    blobs: HashMap<SourceId, Vec<u8>>,
    failing: HashSet<SourceId>,
    fetched: Mutex<Vec<SourceId>>,
}

impl MemoryClient {
    pub fn new(project: &str) -> Self {
        Self {
            project: project.to_string(),
            ..Self::default()
        }
    }

    pub fn with_sections(mut self, sections: SectionListing) -> Self {
        self.sections = sections;
        self
    }

    pub fn with_flat_sections(self, records: Vec<SectionRecord>) -> Self {
        self.with_sections(SectionListing::Flat(records))
    }

    pub fn with_definition(mut self, def: FieldDefinition) -> Self {
        self.definitions.push(def);
        self
    }

    pub fn with_item(mut self, item: ItemRecord) -> Self {
        self.listed.push(item.id.clone());
        self.items.insert(item.id.clone(), item);
        self
    }

    pub fn with_hidden_item(mut self, item: ItemRecord) -> Self {
        self.items.insert(item.id.clone(), item);
        self
    }

    pub fn with_attachment(mut self, owner: &str, record: AttachmentRecord, bytes: &[u8]) -> Self {
        self.blobs.insert(record.id.clone(), bytes.to_vec());
        self.attachments
            .entry(SourceId::from(owner))
            .or_default()
            .push(record);
        self
    }

    /// Downloadable bytes for an attachment referenced from a step.
    pub fn with_blob(mut self, attachment_id: &str, bytes: &[u8]) -> Self {
        self.blobs.insert(SourceId::from(attachment_id), bytes.to_vec());
        self
    }

    /// Make `get_item` and `download_attachment` fail for `id`.
    pub fn failing_on(mut self, id: &str) -> Self {
        self.failing.insert(SourceId::from(id));
        self
    }

    /// Ids passed to `get_item`, in call order.
    pub fn fetched(&self) -> Vec<SourceId> {
        self.fetched.lock().map(|f| f.clone()).unwrap_or_default()
    }

    fn known_section(&self, id: &SourceId) -> bool {
        match &self.sections {
            SectionListing::Flat(records) => records.iter().any(|r| &r.id == id),
            SectionListing::Nested(nodes) => {
                fn walk(nodes: &[caseport_ports::SectionNode], id: &SourceId) -> bool {
                    nodes.iter().any(|n| &n.id == id || walk(&n.children, id))
                }
                walk(nodes, id)
            }
        }
    }
}

impl SourceClient for MemoryClient {
    fn project_name(&self) -> Result<String> {
        Ok(self.project.clone())
    }

    fn list_sections(&self) -> Result<SectionListing> {
        Ok(self.sections.clone())
    }

    fn list_attribute_definitions(&self) -> Result<Vec<FieldDefinition>> {
        Ok(self.definitions.clone())
    }

    fn list_items_in_section(&self, section: Option<&SourceId>) -> Result<Vec<ItemRecord>> {
        Ok(self
            .listed
            .iter()
            .filter_map(|id| self.items.get(id))
            .filter(|item| match (section, item.section_id.as_ref()) {
                (Some(wanted), Some(have)) => wanted == have,
                (Some(_), None) => false,
                (None, Some(have)) => !self.known_section(have),
                (None, None) => true,
            })
            .cloned()
            .collect())
    }

    fn get_item(&self, id: &SourceId) -> Result<Option<ItemRecord>> {
        if let Ok(mut log) = self.fetched.lock() {
            log.push(id.clone());
        }
        if self.failing.contains(id) {
            bail!("HTTP 500 fetching item {id}");
        }
        Ok(self.items.get(id).cloned())
    }

    fn get_attachments(&self, item: &SourceId) -> Result<Vec<AttachmentRecord>> {
        Ok(self.attachments.get(item).cloned().unwrap_or_default())
    }

    fn download_attachment(&self, attachment: &AttachmentRecord) -> Result<Vec<u8>> {
        if self.failing.contains(&attachment.id) {
            bail!("HTTP 404 downloading attachment {}", attachment.id);
        }
        self.blobs
            .get(&attachment.id)
            .cloned()
            .ok_or_else(|| anyhow!("no blob for attachment {}", attachment.id))
    }
}

#[derive(Debug, Default)]
struct SinkState {
    files: HashMap<(CanonicalId, String), Vec<u8>>,
    names: HashMap<CanonicalId, UniqueNames>,
    test_cases: Vec<TestCase>,
    shared_steps: Vec<SharedStep>,
    root: Option<Root>,
}

/// Records every write; stores attachment names the way a real sink does.
#[derive(Debug, Default)]
pub struct MemorySink {
    state: Mutex<SinkState>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    fn with_state<T>(&self, f: impl FnOnce(&mut SinkState) -> T) -> Result<T> {
        let mut state = self
            .state
            .lock()
            .map_err(|_| anyhow!("memory sink lock poisoned"))?;
        Ok(f(&mut state))
    }

    pub fn test_cases(&self) -> Vec<TestCase> {
        self.with_state(|s| s.test_cases.clone()).unwrap_or_default()
    }

    pub fn shared_steps(&self) -> Vec<SharedStep> {
        self.with_state(|s| s.shared_steps.clone())
            .unwrap_or_default()
    }

    pub fn root(&self) -> Option<Root> {
        self.with_state(|s| s.root.clone()).ok().flatten()
    }

    pub fn attachment(&self, owner: CanonicalId, name: &str) -> Option<Vec<u8>> {
        self.with_state(|s| s.files.get(&(owner, name.to_string())).cloned())
            .ok()
            .flatten()
    }

    pub fn attachment_count(&self) -> usize {
        self.with_state(|s| s.files.len()).unwrap_or_default()
    }
}

impl SinkWriter for MemorySink {
    fn write_attachment(
        &self,
        owner: CanonicalId,
        bytes: &[u8],
        suggested_name: &str,
    ) -> Result<String> {
        self.with_state(|s| {
            let name = s
                .names
                .entry(owner)
                .or_insert_with(|| UniqueNames::with_taken(ITEM_JSON_FILES.map(String::from)))
                .reserve(suggested_name);
            s.files.insert((owner, name.clone()), bytes.to_vec());
            name
        })
    }

    fn copy_attachment(&self, from: CanonicalId, to: CanonicalId, name: &str) -> Result<String> {
        let bytes = self
            .attachment(from, name)
            .ok_or_else(|| anyhow!("no attachment {name} stored for {from}"))?;
        self.write_attachment(to, &bytes, name)
    }

    fn discard(&self, owner: CanonicalId) -> Result<()> {
        self.with_state(|s| {
            s.names.remove(&owner);
            s.files.retain(|(stored_for, _), _| *stored_for != owner);
        })
    }

    fn write_test_case(&self, test_case: &TestCase) -> Result<()> {
        self.with_state(|s| s.test_cases.push(test_case.clone()))
    }

    fn write_shared_step(&self, shared_step: &SharedStep) -> Result<()> {
        self.with_state(|s| s.shared_steps.push(shared_step.clone()))
    }

    fn write_main_json(&self, root: &Root) -> Result<()> {
        self.with_state(|s| s.root = Some(root.clone()))
    }
}
