//! Ports between the caseport core and the outside world.
//!
//! A migrator for a concrete test-management system implements
//! [`SourceClient`]; where the canonical objects end up is a [`SinkWriter`].
//! The core never talks HTTP and never touches the filesystem directly.

pub mod records;

use anyhow::Result;
use caseport_ids::{CanonicalId, SourceId};
use caseport_schema::{Root, SharedStep, TestCase};

pub use records::{
    AttachmentRecord, CallMode, CallRef, FieldDefinition, FieldValue, ItemRecord, SectionListing,
    SectionNode, SectionRecord, SourceField, SourceStep,
};

/// Read access to one project of a source system.
///
/// Transport and pagination are the implementor's business. Every call must
/// terminate, and failures must surface as `Err` rather than empty results.
pub trait SourceClient: Send + Sync {
    fn project_name(&self) -> Result<String>;

    fn list_sections(&self) -> Result<SectionListing>;

    /// Attribute definitions known before any item is read.
    fn list_attribute_definitions(&self) -> Result<Vec<FieldDefinition>> {
        Ok(Vec::new())
    }

    /// Items in a section, or items outside every section when `None`.
    fn list_items_in_section(&self, section: Option<&SourceId>) -> Result<Vec<ItemRecord>>;

    /// Full item by id. `Ok(None)` means the source has no such item.
    fn get_item(&self, id: &SourceId) -> Result<Option<ItemRecord>>;

    fn get_attachments(&self, item: &SourceId) -> Result<Vec<AttachmentRecord>>;

    fn download_attachment(&self, attachment: &AttachmentRecord) -> Result<Vec<u8>>;
}

/// Persistence for canonical objects.
///
/// Items and attachments may be written in any order; `write_main_json` is
/// called last, once per export.
pub trait SinkWriter: Send + Sync {
    /// Store an attachment for `owner` and return the stored file name.
    ///
    /// The stored name is the suggested one with characters that are illegal
    /// in file names replaced by `_`, made unique per owner.
    fn write_attachment(&self, owner: CanonicalId, bytes: &[u8], suggested_name: &str)
        -> Result<String>;

    /// Give `to` its own copy of an attachment already stored for `from`.
    fn copy_attachment(&self, from: CanonicalId, to: CanonicalId, name: &str) -> Result<String>;

    /// Drop every attachment stored for `owner`; the item was abandoned.
    fn discard(&self, owner: CanonicalId) -> Result<()>;

    fn write_test_case(&self, test_case: &TestCase) -> Result<()>;

    fn write_shared_step(&self, shared_step: &SharedStep) -> Result<()>;

    fn write_main_json(&self, root: &Root) -> Result<()>;
}
