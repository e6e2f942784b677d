//! JSON writers for canonical caseport artifacts.
//!
//! [`FileSink`] lays an export out on disk as described by
//! [`caseport_output_layout`]: one pretty-printed document per item, the
//! `main.json` manifest, and attachment files next to their owner's document.

use anyhow::{Context, Result, anyhow};
use caseport_ids::CanonicalId;
use caseport_output_layout::{ExportPaths, ITEM_JSON_FILES, is_item_json};
use caseport_ports::SinkWriter;
use caseport_sanitize::UniqueNames;
use caseport_schema::{Root, SharedStep, TestCase};
use serde::Serialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::debug;

/// Serialize `value` as pretty JSON, creating parent directories.
pub fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).with_context(|| format!("create {parent:?}"))?;
    }
    let text = serde_json::to_string_pretty(value)
        .with_context(|| format!("serialize {path:?}"))?;
    std::fs::write(path, text).with_context(|| format!("write {path:?}"))?;
    Ok(())
}

/// Load the `main.json` of an export directory.
pub fn read_root(dir: &Path) -> Result<Root> {
    let path = ExportPaths::new(dir).main_json();
    let text = std::fs::read_to_string(&path).with_context(|| format!("read {path:?}"))?;
    serde_json::from_str(&text).with_context(|| format!("parse {path:?}"))
}

/// Every per-item document under an export directory, sorted by path.
pub fn item_json_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in std::fs::read_dir(dir).with_context(|| format!("list {dir:?}"))? {
        let item_dir = entry.with_context(|| format!("list {dir:?}"))?.path();
        if !item_dir.is_dir() {
            continue;
        }
        for inner in std::fs::read_dir(&item_dir).with_context(|| format!("list {item_dir:?}"))? {
            let path = inner.with_context(|| format!("list {item_dir:?}"))?.path();
            let is_doc = path
                .file_name()
                .and_then(|n| n.to_str())
                .is_some_and(is_item_json);
            if is_doc && path.is_file() {
                files.push(path);
            }
        }
    }
    files.sort();
    Ok(files)
}

/// [`SinkWriter`] that writes an export directory.
#[derive(Debug)]
pub struct FileSink {
    paths: ExportPaths,
    names: Mutex<HashMap<CanonicalId, UniqueNames>>,
}

impl FileSink {
    /// Sink rooted at `out_dir`, which is created if missing.
    pub fn create(out_dir: impl Into<PathBuf>) -> Result<Self> {
        let paths = ExportPaths::new(out_dir);
        std::fs::create_dir_all(paths.root())
            .with_context(|| format!("create {:?}", paths.root()))?;
        Ok(Self {
            paths,
            names: Mutex::new(HashMap::new()),
        })
    }

    pub fn paths(&self) -> &ExportPaths {
        &self.paths
    }

    /// Reserve a stored name for `owner`, seeding from files already on disk
    /// and the item document names.
    fn reserve(&self, owner: CanonicalId, suggested: &str) -> Result<String> {
        let mut names = self.lock_names()?;
        let taken = names.entry(owner).or_insert_with(|| {
            let documents = ITEM_JSON_FILES.iter().map(|n| n.to_string());
            UniqueNames::with_taken(existing_files(&self.paths.item_dir(owner)).into_iter().chain(documents))
        });
        Ok(taken.reserve(suggested))
    }

    fn lock_names(&self) -> Result<std::sync::MutexGuard<'_, HashMap<CanonicalId, UniqueNames>>> {
        self.names
            .lock()
            .map_err(|_| anyhow!("attachment name table poisoned"))
    }
}

fn existing_files(dir: &Path) -> Vec<String> {
    std::fs::read_dir(dir)
        .map(|entries| {
            entries
                .filter_map(|e| e.ok())
                .filter_map(|e| e.file_name().into_string().ok())
                .collect()
        })
        .unwrap_or_default()
}

impl SinkWriter for FileSink {
    fn write_attachment(
        &self,
        owner: CanonicalId,
        bytes: &[u8],
        suggested_name: &str,
    ) -> Result<String> {
        let name = self.reserve(owner, suggested_name)?;
        let dir = self.paths.item_dir(owner);
        std::fs::create_dir_all(&dir).with_context(|| format!("create {dir:?}"))?;
        let path = self.paths.attachment(owner, &name);
        std::fs::write(&path, bytes).with_context(|| format!("write {path:?}"))?;
        debug!(path = %path.display(), "wrote attachment");
        Ok(name)
    }

    fn copy_attachment(&self, from: CanonicalId, to: CanonicalId, name: &str) -> Result<String> {
        let source = self.paths.attachment(from, name);
        let stored = self.reserve(to, name)?;
        let dir = self.paths.item_dir(to);
        std::fs::create_dir_all(&dir).with_context(|| format!("create {dir:?}"))?;
        let target = self.paths.attachment(to, &stored);
        std::fs::copy(&source, &target)
            .with_context(|| format!("copy {source:?} to {target:?}"))?;
        Ok(stored)
    }

    fn discard(&self, owner: CanonicalId) -> Result<()> {
        self.lock_names()?.remove(&owner);
        let dir = self.paths.item_dir(owner);
        if dir.exists() {
            std::fs::remove_dir_all(&dir).with_context(|| format!("remove {dir:?}"))?;
            debug!(path = %dir.display(), "discarded attachments");
        }
        Ok(())
    }

    fn write_test_case(&self, test_case: &TestCase) -> Result<()> {
        write_json(&self.paths.test_case_json(test_case.id), test_case)
    }

    fn write_shared_step(&self, shared_step: &SharedStep) -> Result<()> {
        write_json(&self.paths.shared_step_json(shared_step.id), shared_step)
    }

    fn write_main_json(&self, root: &Root) -> Result<()> {
        write_json(&self.paths.main_json(), root)
    }
}
