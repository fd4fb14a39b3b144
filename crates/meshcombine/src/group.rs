//! Per-material partition lists and the greedy splitting policy.

use std::fmt;

use crate::error::{RejectReason, Rejected};
use crate::material::MaterialKey;
use crate::partition::{BatchMode, Partition};
use crate::renderable::Renderable;

/// What a [`MaterialGroup`] collects.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum GroupKey {
    /// Renderables sharing one material.
    Material(MaterialKey),
    /// Renderables of any material.
    Mixed,
}

impl GroupKey {
    pub fn mode(&self) -> BatchMode {
        match self {
            GroupKey::Material(_) => BatchMode::SameMaterial,
            GroupKey::Mixed => BatchMode::MixedMaterial,
        }
    }
}

impl fmt::Display for GroupKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GroupKey::Material(key) => write!(f, "{}", key),
            GroupKey::Mixed => write!(f, "mixed"),
        }
    }
}

/// Where an appended member landed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppendOutcome {
    /// Added to the partition that was already last.
    Extended { partition: usize },
    /// Opened a new partition for it.
    Opened { partition: usize },
}

impl AppendOutcome {
    pub fn partition(&self) -> usize {
        match self {
            AppendOutcome::Extended { partition } | AppendOutcome::Opened { partition } => *partition,
        }
    }
}

/// The append-only partition list for one material, or for mixed mode.
///
/// Members go into the last partition while it has room; otherwise a new
/// partition is opened. One pass, no look-ahead, no repacking.
#[derive(Debug, Clone, PartialEq)]
pub struct MaterialGroup {
    key: GroupKey,
    partitions: Vec<Partition>,
}

impl MaterialGroup {
    pub fn new(key: GroupKey) -> Self {
        Self {
            key,
            partitions: Vec::new(),
        }
    }

    /// A group accepting any material.
    pub fn mixed() -> Self {
        Self::new(GroupKey::Mixed)
    }

    /// Append `member` to the last partition, or open a new one when full.
    ///
    /// Only a material mismatch is returned as an error; the member comes
    /// back inside [`Rejected`]. Capacity never fails.
    pub fn append(&mut self, member: Renderable, max_vertex_count: u32) -> Result<AppendOutcome, Rejected> {
        if let GroupKey::Material(key) = &self.key {
            if key != member.material_key() {
                return Err(Rejected {
                    reason: RejectReason::MaterialMismatch {
                        expected: key.clone(),
                        found: member.material_key().clone(),
                    },
                    member,
                });
            }
        }

        let member = match self.partitions.last_mut() {
            Some(last) => match last.try_add(member, max_vertex_count) {
                Ok(()) => {
                    return Ok(AppendOutcome::Extended {
                        partition: self.partitions.len() - 1,
                    });
                }
                Err(Rejected {
                    reason: RejectReason::CapacityExceeded { .. },
                    member,
                }) => member,
                Err(rejected) => return Err(rejected),
            },
            None => member,
        };

        let partition = match self.key.mode() {
            BatchMode::SameMaterial => Partition::new_same_material(member),
            BatchMode::MixedMaterial => {
                let mut partition = Partition::new_mixed();
                // An empty partition never rejects.
                partition.try_add(member, max_vertex_count)?;
                partition
            }
        };

        self.partitions.push(partition);
        let index = self.partitions.len() - 1;
        tracing::trace!(group = %self.key, partition = index, "opened partition");
        Ok(AppendOutcome::Opened { partition: index })
    }

    pub fn key(&self) -> &GroupKey {
        &self.key
    }

    pub fn mode(&self) -> BatchMode {
        self.key.mode()
    }

    pub fn partitions(&self) -> &[Partition] {
        &self.partitions
    }

    pub(crate) fn partitions_mut(&mut self) -> &mut [Partition] {
        &mut self.partitions
    }

    pub fn into_partitions(self) -> Vec<Partition> {
        self.partitions
    }

    /// The partition that may still have spare capacity.
    pub fn last_partition(&self) -> Option<&Partition> {
        self.partitions.last()
    }

    pub fn is_empty(&self) -> bool {
        self.partitions.is_empty()
    }

    pub fn member_count(&self) -> usize {
        self.partitions.iter().map(Partition::len).sum()
    }

    pub fn vertex_total(&self) -> u64 {
        self.partitions.iter().map(|p| p.vertex_total() as u64).sum()
    }
}
