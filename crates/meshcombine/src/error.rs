//! Error types for grouping and aggregation.

use std::fmt;

use crate::batch::BatchId;
use crate::material::MaterialKey;
use crate::renderable::Renderable;

/// Why a renderable's geometry was unusable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InvalidMeshReason {
    /// No mesh is attached.
    MissingMesh,
    /// A mesh is attached but has no vertices.
    EmptyGeometry,
}

impl fmt::Display for InvalidMeshReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InvalidMeshReason::MissingMesh => write!(f, "no mesh attached"),
            InvalidMeshReason::EmptyGeometry => write!(f, "mesh has no vertices"),
        }
    }
}

/// Why a partition refused a member.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RejectReason {
    /// A same-material partition was offered a different material.
    MaterialMismatch {
        expected: MaterialKey,
        found: MaterialKey,
    },
    /// The member would push the partition past its vertex budget.
    CapacityExceeded {
        vertex_total: u32,
        incoming: u32,
        max_vertex_count: u32,
    },
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RejectReason::MaterialMismatch { expected, found } => {
                write!(f, "material mismatch: expected {}, found {}", expected, found)
            }
            RejectReason::CapacityExceeded {
                vertex_total,
                incoming,
                max_vertex_count,
            } => write!(
                f,
                "capacity exceeded: {} + {} > {}",
                vertex_total, incoming, max_vertex_count
            ),
        }
    }
}

/// A refused member, handed back to the caller together with the reason.
#[derive(Debug, Clone, PartialEq)]
pub struct Rejected {
    pub reason: RejectReason,
    pub member: Renderable,
}

impl Rejected {
    pub fn into_member(self) -> Renderable {
        self.member
    }
}

impl fmt::Display for Rejected {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "'{}' rejected: {}", self.member.source_id(), self.reason)
    }
}

impl std::error::Error for Rejected {}

/// Failure reported by an external aggregator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AggregateError {
    pub message: String,
}

impl AggregateError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl fmt::Display for AggregateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for AggregateError {}

/// Errors surfaced by the combine pipeline.
#[derive(Debug, Clone, PartialEq)]
pub enum CombineError {
    /// The options cannot drive a run.
    InvalidOptions {
        message: String,
    },

    /// An input had missing or empty geometry.
    InvalidMesh {
        source_id: String,
        reason: InvalidMeshReason,
    },

    /// An input was routed to a partition of another material.
    MaterialMismatch {
        source_id: String,
        expected: MaterialKey,
        found: MaterialKey,
    },

    /// The aggregator failed on one batch.
    Aggregation {
        batch: BatchId,
        source: AggregateError,
    },

    /// A run is already in progress.
    Busy,
}

impl fmt::Display for CombineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CombineError::InvalidOptions { message } => {
                write!(f, "Invalid combine options: {}", message)
            }
            CombineError::InvalidMesh { source_id, reason } => {
                write!(f, "Invalid mesh on '{}': {}", source_id, reason)
            }
            CombineError::MaterialMismatch {
                source_id,
                expected,
                found,
            } => write!(
                f,
                "'{}' has material {} but its partition holds {}",
                source_id, found, expected
            ),
            CombineError::Aggregation { batch, source } => {
                write!(f, "Aggregation of {} failed: {}", batch, source)
            }
            CombineError::Busy => {
                write!(f, "A combine run is already in progress, wait for it to finish")
            }
        }
    }
}

impl std::error::Error for CombineError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CombineError::Aggregation { source, .. } => Some(source),
            _ => None,
        }
    }
}

/// Result type alias for combine operations.
pub type CombineResult<T> = Result<T, CombineError>;
