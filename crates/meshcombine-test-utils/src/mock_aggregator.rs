//! Recording aggregator for tests.
//!
//! Performs no geometry work; it sums vertex counts, tracks submesh
//! materials, remembers merged batches so later partitions can refer to them,
//! and logs every call for assertions.

use meshcombine::{AggregateError, Aggregator, BatchId, MaterialKey, MeshRef, Partition};
use meshcombine_core::alloc::{HashMap, HashSet};
use parking_lot::Mutex;

/// A recorded aggregator call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AggregateCall {
    Merge {
        batch: BatchId,
        members: usize,
        vertex_total: u32,
        keep_submeshes_separate: bool,
    },
    BuildCollider {
        batch: BatchId,
    },
}

/// The result of a mock merge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MockMesh {
    pub batch: BatchId,
    pub vertex_count: u32,
    /// Material of each submesh.
    pub submeshes: Vec<MaterialKey>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MockCollider {
    pub batch: BatchId,
    pub vertex_count: u32,
}

/// Mock implementation of [`Aggregator`].
///
/// Methods take `&self`, so state lives behind `parking_lot::Mutex`.
#[derive(Debug, Default)]
pub struct MockAggregator {
    calls: Mutex<Vec<AggregateCall>>,
    merged: Mutex<HashMap<BatchId, MockMesh>>,
    hidden: Mutex<Vec<String>>,
    failing_merges: Mutex<HashSet<BatchId>>,
    failing_colliders: Mutex<HashSet<BatchId>>,
}

impl MockAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make `merge` fail for `batch`.
    pub fn fail_merge(&self, batch: BatchId) {
        self.failing_merges.lock().insert(batch);
    }

    /// Make `build_collider` fail for `batch`.
    pub fn fail_collider(&self, batch: BatchId) {
        self.failing_colliders.lock().insert(batch);
    }

    /// Get a copy of all recorded calls.
    pub fn calls(&self) -> Vec<AggregateCall> {
        self.calls.lock().clone()
    }

    pub fn count_merges(&self) -> usize {
        self.calls
            .lock()
            .iter()
            .filter(|call| matches!(call, AggregateCall::Merge { .. }))
            .count()
    }

    pub fn count_colliders(&self) -> usize {
        self.calls
            .lock()
            .iter()
            .filter(|call| matches!(call, AggregateCall::BuildCollider { .. }))
            .count()
    }

    /// Batch ids in the order they were merged.
    pub fn merge_order(&self) -> Vec<BatchId> {
        self.calls
            .lock()
            .iter()
            .filter_map(|call| match call {
                AggregateCall::Merge { batch, .. } => Some(*batch),
                AggregateCall::BuildCollider { .. } => None,
            })
            .collect()
    }

    /// A mesh produced by an earlier successful merge.
    pub fn merged(&self, batch: BatchId) -> Option<MockMesh> {
        self.merged.lock().get(&batch).cloned()
    }

    /// Source ids hidden because their geometry now lives in a merged batch.
    pub fn hidden(&self) -> Vec<String> {
        self.hidden.lock().clone()
    }

    pub fn clear(&self) {
        self.calls.lock().clear();
        self.merged.lock().clear();
        self.hidden.lock().clear();
    }
}

impl Aggregator for MockAggregator {
    type Mesh = MockMesh;
    type Collider = MockCollider;

    fn merge(
        &self,
        batch: BatchId,
        partition: &Partition,
        keep_submeshes_separate: bool,
    ) -> Result<MockMesh, AggregateError> {
        self.calls.lock().push(AggregateCall::Merge {
            batch,
            members: partition.len(),
            vertex_total: partition.vertex_total(),
            keep_submeshes_separate,
        });

        if self.failing_merges.lock().contains(&batch) {
            return Err(AggregateError::new(format!("mock merge failure for {}", batch)));
        }

        let mut vertex_count = 0;
        let mut submeshes = Vec::new();
        {
            let merged = self.merged.lock();
            for member in partition.members() {
                let (count, materials) = match member.mesh() {
                    Some(MeshRef::Asset(_)) => (member.vertex_count(), member.materials().to_vec()),
                    Some(MeshRef::Batch(source)) => match merged.get(&source) {
                        Some(mesh) => (mesh.vertex_count, mesh.submeshes.clone()),
                        None => {
                            return Err(AggregateError::new(format!("{} has not been merged", source)));
                        }
                    },
                    None => {
                        return Err(AggregateError::new(format!("'{}' has no mesh", member.source_id())));
                    }
                };
                vertex_count += count;
                if keep_submeshes_separate {
                    submeshes.extend(materials);
                } else if submeshes.is_empty() {
                    submeshes.extend(materials.into_iter().take(1));
                }
            }
        }

        let mesh = MockMesh {
            batch,
            vertex_count,
            submeshes,
        };
        self.merged.lock().insert(batch, mesh.clone());
        self.hidden
            .lock()
            .extend(partition.members().iter().map(|m| m.source_id().to_string()));
        Ok(mesh)
    }

    fn build_collider(&self, batch: BatchId, mesh: &MockMesh) -> Result<MockCollider, AggregateError> {
        self.calls.lock().push(AggregateCall::BuildCollider { batch });
        if self.failing_colliders.lock().contains(&batch) {
            return Err(AggregateError::new(format!("mock collider failure for {}", batch)));
        }
        Ok(MockCollider {
            batch,
            vertex_count: mesh.vertex_count,
        })
    }
}
