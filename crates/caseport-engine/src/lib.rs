//! Orchestration engine for caseport exports.
//!
//! Wires a [`SourceClient`] through section building, attribute declaration
//! and reference resolution into a [`SinkWriter`]. Items are written once all
//! of them are resolved, since a later item can still reclassify an earlier
//! one; `main.json` goes last.

use anyhow::{Context, Result};
use caseport_attachments::{AttachmentDownloader, default_workers};
use caseport_attributes::{AttributeAggregator, OptionMergePolicy};
use caseport_ids::{RunId, SourceId};
use caseport_merge::{MergeReport, merge_export_dirs};
use caseport_output_layout::ExportPaths;
use caseport_ports::{ItemRecord, SinkWriter, SourceClient};
use caseport_render_json::FileSink;
use caseport_resolver::{CallPolicy, Conversion, Resolver};
use caseport_schema::section::collect_ids;
use caseport_sections::SectionTree;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// What happens when one listed item fails to convert.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailurePolicy {
    /// Stop the export at the first failing item.
    #[default]
    Abort,
    /// Record the failure with the raw item and keep going.
    Capture,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportOptions {
    /// Overrides the project name the source reports.
    pub project_name: Option<String>,
    pub default_section_name: String,
    /// Parent id that marks a flat section record as top level.
    pub root_sentinel: Option<SourceId>,
    pub call_policy: CallPolicy,
    pub option_merge: OptionMergePolicy,
    pub fill_all_attributes: bool,
    pub attachment_workers: usize,
    pub failure_policy: FailurePolicy,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            project_name: None,
            default_section_name: "Imported".to_string(),
            root_sentinel: None,
            call_policy: CallPolicy::default(),
            option_merge: OptionMergePolicy::default(),
            fill_all_attributes: false,
            attachment_workers: default_workers(),
            failure_policy: FailurePolicy::default(),
        }
    }
}

/// A listed item that could not be converted.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ItemFailure {
    pub source_id: SourceId,
    pub category: String,
    pub message: String,
    /// The item exactly as the source returned it.
    pub raw: ItemRecord,
}

#[derive(Debug, Clone, Serialize)]
pub struct ExportSummary {
    pub run_id: RunId,
    pub project_name: String,
    pub generated_at: DateTime<Utc>,
    pub sections: usize,
    pub attributes: usize,
    pub test_cases: usize,
    pub shared_steps: usize,
    /// Test cases turned into shared steps after the fact.
    pub reclassified: usize,
    /// Listed items that were already converted as callees.
    pub already_classified: usize,
    pub failures: Vec<ItemFailure>,
}

pub struct Exporter<'a> {
    client: &'a dyn SourceClient,
    sink: &'a dyn SinkWriter,
    options: ExportOptions,
}

impl<'a> Exporter<'a> {
    pub fn new(client: &'a dyn SourceClient, sink: &'a dyn SinkWriter, options: ExportOptions) -> Self {
        Self {
            client,
            sink,
            options,
        }
    }

    /// Run one export: sections, attribute definitions, items, then write.
    pub fn run(&self) -> Result<ExportSummary> {
        let run_id = RunId::now("export");
        let project_name = match &self.options.project_name {
            Some(name) => name.clone(),
            None => self.client.project_name().context("fetch project name")?,
        };

        let listing = self.client.list_sections().context("list sections")?;
        let sections = SectionTree::from_listing(
            &listing,
            self.options.root_sentinel.as_ref(),
            &self.options.default_section_name,
        );
        let buckets: Vec<SourceId> = sections.source_ids().to_vec();
        info!(run = %run_id, project = %project_name, sections = buckets.len(), "sections built");

        let mut attributes =
            AttributeAggregator::new(self.options.option_merge).with_fill_all(self.options.fill_all_attributes);
        let definitions = self
            .client
            .list_attribute_definitions()
            .context("list attribute definitions")?;
        for definition in &definitions {
            attributes
                .declare(definition)
                .with_context(|| format!("declare attribute {:?}", definition.name))?;
        }

        let mut resolver = Resolver::new(self.client, self.sink, sections, attributes)
            .with_call_policy(self.options.call_policy)
            .with_downloader(AttachmentDownloader::new(self.options.attachment_workers));

        let mut already_classified = 0;
        let mut failures = Vec::new();
        for bucket in buckets.iter().map(Some).chain([None]) {
            let items = self
                .client
                .list_items_in_section(bucket)
                .with_context(|| match bucket {
                    Some(id) => format!("list items in section {id}"),
                    None => "list unsectioned items".to_string(),
                })?;
            debug!(section = ?bucket.map(SourceId::as_str), items = items.len(), "converting section");
            for item in items {
                let raw = match self.options.failure_policy {
                    FailurePolicy::Capture => Some(item.clone()),
                    FailurePolicy::Abort => None,
                };
                let source_id = item.id.clone();
                match resolver.convert_root(item) {
                    Ok(Conversion::Converted(_)) => {}
                    Ok(Conversion::AlreadyClassified(_)) => already_classified += 1,
                    Err(e) => match raw {
                        Some(raw) => {
                            warn!(item = %source_id, category = %e.category(), error = %e, "item failed; captured");
                            failures.push(ItemFailure {
                                source_id,
                                category: e.category().to_string(),
                                message: e.to_string(),
                                raw,
                            });
                        }
                        None => {
                            return Err(e).with_context(|| format!("convert item {source_id}"));
                        }
                    },
                }
            }
        }

        let reclassified = resolver.reclassified();
        let export = resolver.finish();
        for shared in &export.shared_steps {
            self.sink
                .write_shared_step(shared)
                .with_context(|| format!("write shared step {}", shared.id))?;
        }
        for tc in &export.test_cases {
            self.sink
                .write_test_case(tc)
                .with_context(|| format!("write test case {}", tc.id))?;
        }
        let root = export.root(&project_name);
        self.sink.write_main_json(&root).context("write main.json")?;

        let summary = ExportSummary {
            run_id,
            project_name,
            generated_at: Utc::now(),
            sections: collect_ids(&root.sections).len(),
            attributes: root.attributes.len(),
            test_cases: root.test_cases.len(),
            shared_steps: root.shared_steps.len(),
            reclassified,
            already_classified,
            failures,
        };
        info!(
            run = %summary.run_id,
            test_cases = summary.test_cases,
            shared_steps = summary.shared_steps,
            reclassified = summary.reclassified,
            failures = summary.failures.len(),
            "export complete"
        );
        Ok(summary)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct BatchSummary {
    pub batches: Vec<ExportSummary>,
    pub batch_dirs: Vec<PathBuf>,
    pub merge: MergeReport,
}

impl BatchSummary {
    pub fn failures(&self) -> impl Iterator<Item = &ItemFailure> {
        self.batches.iter().flat_map(|b| b.failures.iter())
    }
}

/// Export each shard into `out_dir/batches/<n>` on its own thread, then merge
/// the batches into `out_dir`.
///
/// Every shard runs to completion; the first failing shard (in shard order)
/// fails the call and nothing is merged.
pub fn run_batched(
    shards: &[Box<dyn SourceClient>],
    out_dir: &Path,
    options: &ExportOptions,
) -> Result<BatchSummary> {
    let paths = ExportPaths::new(out_dir);
    let batch_dirs: Vec<PathBuf> = (0..shards.len()).map(|n| paths.batch_dir(n)).collect();

    let results: Vec<Result<ExportSummary>> = std::thread::scope(|scope| {
        let handles: Vec<_> = shards
            .iter()
            .zip(&batch_dirs)
            .map(|(client, dir)| scope.spawn(move || export_batch(client.as_ref(), dir, options)))
            .collect();
        handles
            .into_iter()
            .map(|h| h.join().unwrap_or_else(|panic| std::panic::resume_unwind(panic)))
            .collect()
    });

    let mut batches = Vec::with_capacity(results.len());
    for (n, result) in results.into_iter().enumerate() {
        batches.push(result.with_context(|| format!("batch {n}"))?);
    }

    let merge = merge_export_dirs(&batch_dirs, out_dir, options.option_merge)?;
    Ok(BatchSummary {
        batches,
        batch_dirs,
        merge,
    })
}

fn export_batch(client: &dyn SourceClient, dir: &Path, options: &ExportOptions) -> Result<ExportSummary> {
    if dir.exists() {
        std::fs::remove_dir_all(dir).with_context(|| format!("clear stale batch {dir:?}"))?;
    }
    let sink = FileSink::create(dir)?;
    Exporter::new(client, &sink, options.clone()).run()
}
