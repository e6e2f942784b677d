use crate::{merge_roots, rewrite_references};
use anyhow::{Context, Result};
use caseport_attributes::OptionMergePolicy;
use caseport_ids::CanonicalId;
use caseport_output_layout::{ExportPaths, is_item_json};
use caseport_render_json::{read_root, write_json};
use caseport_schema::{AttributeType, AttributeValue, CaseAttribute};
use serde::Serialize;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// A file the merge could not carry over.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedFile {
    pub path: PathBuf,
    pub reason: String,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct MergeReport {
    pub batches: usize,
    pub sections_remapped: usize,
    pub attributes_remapped: usize,
    pub documents_rewritten: usize,
    /// `"False"` bindings added for checkboxes another batch introduced.
    pub checkboxes_backfilled: usize,
    pub files_copied: usize,
    pub skipped: Vec<SkippedFile>,
}

/// Merge batch export directories into `out_dir`.
///
/// An unreadable batch `main.json` fails the merge. Every other file is
/// best-effort: failures are logged, listed in the report and skipped.
///
/// Item documents are rewritten to the surviving ids, and every merged
/// checkbox attribute an item does not bind is bound to `"False"`.
pub fn merge_export_dirs(
    batch_dirs: &[PathBuf],
    out_dir: &Path,
    policy: OptionMergePolicy,
) -> Result<MergeReport> {
    let roots = batch_dirs
        .iter()
        .map(|dir| read_root(dir).with_context(|| format!("load batch {dir:?}")))
        .collect::<Result<Vec<_>>>()?;

    let outcome = merge_roots(roots, policy);
    let mut report = MergeReport {
        batches: batch_dirs.len(),
        sections_remapped: outcome.remap.sections.len(),
        attributes_remapped: outcome.remap.attributes.len(),
        ..MergeReport::default()
    };

    let checkboxes: Vec<CanonicalId> = outcome
        .root
        .attributes
        .iter()
        .filter(|a| a.kind == AttributeType::Checkbox)
        .map(|a| a.id)
        .collect();

    std::fs::create_dir_all(out_dir).with_context(|| format!("create {out_dir:?}"))?;
    for dir in batch_dirs {
        carry_batch(dir, out_dir, &outcome.remap, &checkboxes, &mut report);
    }

    let out = ExportPaths::new(out_dir);
    write_json(&out.main_json(), &outcome.root)?;
    info!(
        batches = report.batches,
        sections_remapped = report.sections_remapped,
        attributes_remapped = report.attributes_remapped,
        documents = report.documents_rewritten,
        checkboxes_backfilled = report.checkboxes_backfilled,
        skipped = report.skipped.len(),
        "merged batches"
    );
    Ok(report)
}

/// Copy one batch's item directories, rewriting item documents on the way.
fn carry_batch(
    dir: &Path,
    out_dir: &Path,
    remap: &crate::IdRemap,
    checkboxes: &[CanonicalId],
    report: &mut MergeReport,
) {
    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) => {
            skip(report, dir, format!("list batch: {e}"));
            return;
        }
    };
    for entry in entries {
        let item_dir = match entry {
            Ok(entry) => entry.path(),
            Err(e) => {
                skip(report, dir, format!("list batch: {e}"));
                continue;
            }
        };
        if !item_dir.is_dir() {
            continue;
        }
        let Some(name) = item_dir.file_name() else {
            continue;
        };
        let target_dir = out_dir.join(name);
        if let Err(e) = std::fs::create_dir_all(&target_dir) {
            skip(report, &item_dir, format!("create {target_dir:?}: {e}"));
            continue;
        }
        let files = match std::fs::read_dir(&item_dir) {
            Ok(files) => files,
            Err(e) => {
                skip(report, &item_dir, format!("list item: {e}"));
                continue;
            }
        };
        for file in files.filter_map(|f| f.ok()).map(|f| f.path()) {
            if !file.is_file() {
                continue;
            }
            let Some(file_name) = file.file_name() else {
                continue;
            };
            let target = target_dir.join(file_name);
            let is_doc = file_name.to_str().is_some_and(is_item_json);
            if is_doc {
                match rewrite_file(&file, &target, remap, checkboxes) {
                    Ok(added) => {
                        report.documents_rewritten += 1;
                        report.checkboxes_backfilled += added;
                    }
                    Err(e) => skip(report, &file, format!("{e:#}")),
                }
                continue;
            }
            match std::fs::copy(&file, &target).with_context(|| format!("copy to {target:?}")) {
                Ok(_) => report.files_copied += 1,
                Err(e) => skip(report, &file, format!("{e:#}")),
            }
        }
    }
}

/// Returns how many checkbox bindings were added.
fn rewrite_file(
    source: &Path,
    target: &Path,
    remap: &crate::IdRemap,
    checkboxes: &[CanonicalId],
) -> Result<usize> {
    let text = std::fs::read_to_string(source).context("read")?;
    let rewritten = rewrite_references(&text, remap);
    let (text, added) = backfill_checkboxes(&rewritten, checkboxes)?;
    std::fs::write(target, text.as_bytes()).with_context(|| format!("write {target:?}"))?;
    Ok(added)
}

/// Bind every checkbox in `checkboxes` the document leaves unbound to `"False"`.
fn backfill_checkboxes<'a>(
    text: &'a str,
    checkboxes: &[CanonicalId],
) -> Result<(std::borrow::Cow<'a, str>, usize)> {
    use std::borrow::Cow;

    if checkboxes.is_empty() {
        return Ok((Cow::Borrowed(text), 0));
    }
    let mut doc: serde_json::Value = serde_json::from_str(text).context("parse")?;
    let Some(bindings) = doc.get_mut("attributes").and_then(|a| a.as_array_mut()) else {
        return Ok((Cow::Borrowed(text), 0));
    };
    let bound: HashSet<String> = bindings
        .iter()
        .filter_map(|b| b.get("id")?.as_str().map(str::to_string))
        .collect();
    let mut added = 0;
    for id in checkboxes {
        if bound.contains(&id.to_string()) {
            continue;
        }
        let binding = CaseAttribute::new(*id, AttributeValue::checkbox(false));
        bindings.push(serde_json::to_value(binding).context("serialize binding")?);
        added += 1;
    }
    if added == 0 {
        return Ok((Cow::Borrowed(text), 0));
    }
    let text = serde_json::to_string_pretty(&doc).context("serialize")?;
    Ok((Cow::Owned(text), added))
}

fn skip(report: &mut MergeReport, path: &Path, reason: String) {
    warn!(path = %path.display(), reason = %reason, "skipping file during merge");
    report.skipped.push(SkippedFile {
        path: path.to_path_buf(),
        reason,
    });
}
