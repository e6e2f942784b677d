//! Canonical output layout for caseport exports.
//!
//! ```text
//! <out>/main.json
//! <out>/<item id>/test-case.json | shared-step.json
//! <out>/<owner id>/<attachment name>
//! <out>/failures.json             (captured item failures, if any)
//! <out>/batches/<n>/...            (batched runs, before merge)
//! ```

use caseport_ids::CanonicalId;
use std::path::{Path, PathBuf};

pub const FILE_MAIN_JSON: &str = "main.json";
pub const FILE_TEST_CASE_JSON: &str = "test-case.json";
pub const FILE_SHARED_STEP_JSON: &str = "shared-step.json";
pub const FILE_FAILURES_JSON: &str = "failures.json";

pub const DIR_BATCHES: &str = "batches";

/// Per-item document names. Attachments never take these names.
pub const ITEM_JSON_FILES: [&str; 2] = [FILE_TEST_CASE_JSON, FILE_SHARED_STEP_JSON];

/// True for the per-item document names.
pub fn is_item_json(file_name: &str) -> bool {
    ITEM_JSON_FILES.contains(&file_name)
}

/// Paths inside one export directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportPaths {
    pub out_dir: PathBuf,
}

impl ExportPaths {
    pub fn new(out_dir: impl Into<PathBuf>) -> Self {
        Self {
            out_dir: out_dir.into(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.out_dir
    }

    /// `main.json`
    pub fn main_json(&self) -> PathBuf {
        self.out_dir.join(FILE_MAIN_JSON)
    }

    pub fn failures_json(&self) -> PathBuf {
        self.out_dir.join(FILE_FAILURES_JSON)
    }

    /// `<id>/`, shared by an item's document and its attachments.
    pub fn item_dir(&self, id: CanonicalId) -> PathBuf {
        self.out_dir.join(id.to_string())
    }

    /// `<id>/test-case.json`
    pub fn test_case_json(&self, id: CanonicalId) -> PathBuf {
        self.item_dir(id).join(FILE_TEST_CASE_JSON)
    }

    /// `<id>/shared-step.json`
    pub fn shared_step_json(&self, id: CanonicalId) -> PathBuf {
        self.item_dir(id).join(FILE_SHARED_STEP_JSON)
    }

    /// `<owner>/<name>`; `name` must already be sanitized.
    pub fn attachment(&self, owner: CanonicalId, name: &str) -> PathBuf {
        self.item_dir(owner).join(name)
    }

    /// `batches/<n>`
    pub fn batch_dir(&self, n: usize) -> PathBuf {
        self.out_dir.join(DIR_BATCHES).join(n.to_string())
    }
}
