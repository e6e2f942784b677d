//! Attachment download.
//!
//! Downloads are independent network calls, so they fan out over a bounded
//! number of scoped threads. Each worker owns a contiguous slice of the
//! input and does download-then-write for one attachment at a time.

use caseport_error::{ExportError, Result};
use caseport_ids::CanonicalId;
use caseport_ports::{AttachmentRecord, SinkWriter, SourceClient};
use std::num::NonZeroUsize;
use std::thread;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AttachmentDownloader {
    workers: usize,
}

impl Default for AttachmentDownloader {
    fn default() -> Self {
        Self::new(default_workers())
    }
}

/// Logical core count, or 1 when it cannot be determined.
pub fn default_workers() -> usize {
    thread::available_parallelism()
        .map(NonZeroUsize::get)
        .unwrap_or(1)
}

impl AttachmentDownloader {
    /// `workers` is clamped to at least 1.
    pub fn new(workers: usize) -> Self {
        Self {
            workers: workers.max(1),
        }
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Download every record for `owner` and store it through `sink`.
    ///
    /// Returns stored names in input order. Any failure fails the whole call;
    /// files already stored by other workers stay where they are.
    pub fn download_all(
        &self,
        client: &dyn SourceClient,
        sink: &dyn SinkWriter,
        owner: CanonicalId,
        records: &[AttachmentRecord],
    ) -> Result<Vec<String>> {
        if records.is_empty() {
            return Ok(Vec::new());
        }
        if self.workers == 1 || records.len() == 1 {
            return records
                .iter()
                .map(|r| fetch_one(client, sink, owner, r))
                .collect();
        }

        let chunk = records.len().div_ceil(self.workers);
        let per_chunk: Vec<Vec<Result<String>>> = thread::scope(|s| {
            let handles: Vec<_> = records
                .chunks(chunk)
                .map(|slice| {
                    s.spawn(move || {
                        slice
                            .iter()
                            .map(|r| fetch_one(client, sink, owner, r))
                            .collect::<Vec<_>>()
                    })
                })
                .collect();
            handles
                .into_iter()
                .map(|h| h.join().unwrap_or_else(|panic| std::panic::resume_unwind(panic)))
                .collect()
        });

        per_chunk.into_iter().flatten().collect()
    }
}

fn fetch_one(
    client: &dyn SourceClient,
    sink: &dyn SinkWriter,
    owner: CanonicalId,
    record: &AttachmentRecord,
) -> Result<String> {
    let bytes = client
        .download_attachment(record)
        .map_err(|e| ExportError::source_fetch("download_attachment", &record.id, e))?;
    let stored = sink
        .write_attachment(owner, &bytes, &record.name)
        .map_err(ExportError::sink)?;
    debug!(owner = %owner, attachment = %record.id, stored = %stored, bytes = bytes.len(), "stored attachment");
    Ok(stored)
}
