//! Item-level problems collected during a run.
//!
//! Every record is also emitted through `tracing` when it is pushed.

use std::fmt;

use crate::batch::BatchId;
use crate::error::InvalidMeshReason;
use crate::material::MaterialKey;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DiagnosticKind {
    /// Skipped because its geometry is missing or empty.
    InvalidMesh(InvalidMeshReason),
    /// Dropped because it reached a partition of another material.
    MaterialMismatch {
        expected: MaterialKey,
        found: MaterialKey,
    },
    /// The aggregator could not merge a batch.
    AggregationFailed { batch: BatchId, message: String },
    /// The merged batch exists but its collider could not be built.
    ColliderFailed { batch: BatchId, message: String },
    /// A deep-combine input was skipped because its batch never merged.
    RepresentativeUnavailable { batch: BatchId },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    /// The renderable or batch the record concerns.
    pub source_id: String,
    pub kind: DiagnosticKind,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            DiagnosticKind::InvalidMesh(reason) => {
                write!(f, "skipped '{}': {}", self.source_id, reason)
            }
            DiagnosticKind::MaterialMismatch { expected, found } => write!(
                f,
                "dropped '{}': material {} routed to partition of {}",
                self.source_id, found, expected
            ),
            DiagnosticKind::AggregationFailed { batch, message } => {
                write!(f, "{} ('{}') failed to merge: {}", batch, self.source_id, message)
            }
            DiagnosticKind::ColliderFailed { batch, message } => {
                write!(f, "{} ('{}') has no collider: {}", batch, self.source_id, message)
            }
            DiagnosticKind::RepresentativeUnavailable { batch } => {
                write!(f, "{} ('{}') is unavailable for deep combine", batch, self.source_id)
            }
        }
    }
}

/// Ordered collection of [`Diagnostic`]s.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Diagnostics {
    records: Vec<Diagnostic>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a problem and log it.
    pub fn push(&mut self, source_id: impl Into<String>, kind: DiagnosticKind) {
        let record = Diagnostic {
            source_id: source_id.into(),
            kind,
        };
        match record.kind {
            DiagnosticKind::InvalidMesh(_) | DiagnosticKind::RepresentativeUnavailable { .. } => {
                tracing::warn!("{}", record)
            }
            _ => tracing::error!("{}", record),
        }
        self.records.push(record);
    }

    pub fn extend(&mut self, other: Diagnostics) {
        self.records.extend(other.records);
    }

    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.records.iter()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn invalid_meshes(&self) -> impl Iterator<Item = &Diagnostic> {
        self.records
            .iter()
            .filter(|d| matches!(d.kind, DiagnosticKind::InvalidMesh(_)))
    }

    pub fn failures(&self) -> impl Iterator<Item = &Diagnostic> {
        self.records.iter().filter(|d| {
            matches!(
                d.kind,
                DiagnosticKind::AggregationFailed { .. } | DiagnosticKind::ColliderFailed { .. }
            )
        })
    }
}

impl IntoIterator for Diagnostics {
    type Item = Diagnostic;
    type IntoIter = std::vec::IntoIter<Diagnostic>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.into_iter()
    }
}
