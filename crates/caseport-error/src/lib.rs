//! Error types for caseport.
//!
//! Library crates with distinguishable failure modes return [`ExportError`];
//! orchestration code wraps it in `anyhow` with context.

use caseport_ids::SourceId;
use std::fmt;
use std::path::PathBuf;

/// Coarse grouping used for reporting and exit decisions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// The source system failed to answer.
    Source,
    /// A cross-reference could not be resolved.
    Resolution,
    /// Source data contradicts itself.
    Validation,
    Io,
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorCategory::Source => write!(f, "source"),
            ErrorCategory::Resolution => write!(f, "resolution"),
            ErrorCategory::Validation => write!(f, "validation"),
            ErrorCategory::Io => write!(f, "io"),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("source fetch failed during {operation} ({source_id}): {message}")]
    SourceFetch {
        operation: &'static str,
        source_id: String,
        message: String,
    },

    #[error("{caller} calls {callee}, which does not exist in the source")]
    UnresolvedReference { caller: SourceId, callee: SourceId },

    #[error("call cycle detected: {}", format_chain(.chain))]
    CycleDetected { chain: Vec<SourceId> },

    #[error("attribute {name:?} is {existing} but a field declares it as {incoming}")]
    AttributeTypeConflict {
        name: String,
        existing: String,
        incoming: String,
    },

    #[error("sink failed: {message}")]
    Sink { message: String },

    #[error("io error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

fn format_chain(chain: &[SourceId]) -> String {
    chain
        .iter()
        .map(|s| s.as_str())
        .collect::<Vec<_>>()
        .join(" -> ")
}

impl ExportError {
    /// Wrap a client failure. `source_id` is whatever the failing call was about.
    pub fn source_fetch(
        operation: &'static str,
        source_id: impl fmt::Display,
        err: impl fmt::Display,
    ) -> Self {
        Self::SourceFetch {
            operation,
            source_id: source_id.to_string(),
            message: format!("{err:#}"),
        }
    }

    pub fn sink(err: impl fmt::Display) -> Self {
        Self::Sink {
            message: format!("{err:#}"),
        }
    }

    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::SourceFetch { .. } => ErrorCategory::Source,
            Self::UnresolvedReference { .. } | Self::CycleDetected { .. } => {
                ErrorCategory::Resolution
            }
            Self::AttributeTypeConflict { .. } => ErrorCategory::Validation,
            Self::Sink { .. } | Self::Io { .. } => ErrorCategory::Io,
        }
    }

    pub fn is_cycle(&self) -> bool {
        matches!(self, Self::CycleDetected { .. })
    }
}

pub type Result<T> = std::result::Result<T, ExportError>;
