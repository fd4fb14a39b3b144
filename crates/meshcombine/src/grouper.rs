//! Routing renderables into material groups, and the deep-combine pass.

use meshcombine_core::alloc::{IndexMap, index_map};
use meshcombine_core::profiling::profile_function;

use crate::batch::BatchId;
use crate::config::GroupingMode;
use crate::diagnostics::{DiagnosticKind, Diagnostics};
use crate::error::{InvalidMeshReason, RejectReason};
use crate::group::{GroupKey, MaterialGroup};
use crate::partition::Partition;
use crate::renderable::Renderable;

/// Progress of a grouping run.
///
/// A [`Grouper`] reports `Empty` or `Grouping`, a finished [`Grouping`]
/// reports `Grouped`, and a [`CombineJob`](crate::CombineJob) moves on through
/// `DeepCombining` to `Done`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GroupingStage {
    /// Nothing pushed yet.
    Empty,
    /// Accepting renderables.
    Grouping,
    /// All groups built; partitions ready for aggregation.
    Grouped,
    /// Representatives are being folded into mixed batches.
    DeepCombining,
    /// Every batch has been handed to the aggregator, or the run was cancelled.
    Done,
}

/// What happened to one pushed renderable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PushOutcome {
    Added { group: usize, partition: usize },
    /// Not grouped because its geometry is unusable.
    Skipped(InvalidMeshReason),
    /// Refused by its group. Reported, never retried.
    Dropped,
}

/// Routes renderables, in the order given, into lazily created groups.
///
/// Pushing is resumable at any item boundary: a host may push a slice per
/// frame and call [`Grouper::finish`] once the input is exhausted.
#[derive(Debug)]
pub struct Grouper {
    max_vertex_count: u32,
    mode: GroupingMode,
    groups: IndexMap<GroupKey, MaterialGroup>,
    diagnostics: Diagnostics,
    pushed: usize,
}

impl Grouper {
    pub fn new(max_vertex_count: u32, mode: GroupingMode) -> Self {
        Self {
            max_vertex_count,
            mode,
            groups: index_map(),
            diagnostics: Diagnostics::new(),
            pushed: 0,
        }
    }

    /// Group `renderables` by material in one call.
    pub fn group(renderables: impl IntoIterator<Item = Renderable>, max_vertex_count: u32) -> Grouping {
        let mut grouper = Self::new(max_vertex_count, GroupingMode::SameMaterial);
        grouper.extend(renderables);
        grouper.finish()
    }

    /// Route one renderable.
    pub fn push(&mut self, renderable: Renderable) -> PushOutcome {
        profile_function!();
        self.pushed += 1;

        if let Err(reason) = renderable.validate() {
            self.diagnostics
                .push(renderable.source_id(), DiagnosticKind::InvalidMesh(reason));
            return PushOutcome::Skipped(reason);
        }

        let key = match self.mode {
            GroupingMode::SameMaterial => GroupKey::Material(renderable.material_key().clone()),
            GroupingMode::MixedMaterial => GroupKey::Mixed,
        };

        let group_index = match self.groups.get_index_of(&key) {
            Some(index) => index,
            None => {
                tracing::debug!(group = %key, "new material group");
                let (index, _) = self.groups.insert_full(key.clone(), MaterialGroup::new(key));
                index
            }
        };

        match self.groups[group_index].append(renderable, self.max_vertex_count) {
            Ok(outcome) => PushOutcome::Added {
                group: group_index,
                partition: outcome.partition(),
            },
            // Routing is by key, so the group never sees a foreign material.
            Err(rejected) => {
                debug_assert!(
                    false,
                    "grouper routed '{}' into the wrong group: {}",
                    rejected.member.source_id(),
                    rejected.reason
                );
                if let RejectReason::MaterialMismatch { expected, found } = rejected.reason {
                    self.diagnostics.push(
                        rejected.member.source_id(),
                        DiagnosticKind::MaterialMismatch { expected, found },
                    );
                }
                PushOutcome::Dropped
            }
        }
    }

    pub fn extend(&mut self, renderables: impl IntoIterator<Item = Renderable>) {
        for renderable in renderables {
            self.push(renderable);
        }
    }

    pub fn stage(&self) -> GroupingStage {
        if self.pushed == 0 {
            GroupingStage::Empty
        } else {
            GroupingStage::Grouping
        }
    }

    pub fn max_vertex_count(&self) -> u32 {
        self.max_vertex_count
    }

    pub fn mode(&self) -> GroupingMode {
        self.mode
    }

    pub fn diagnostics(&self) -> &Diagnostics {
        &self.diagnostics
    }

    pub fn finish(self) -> Grouping {
        tracing::debug!(
            pushed = self.pushed,
            groups = self.groups.len(),
            "grouping finished"
        );
        Grouping {
            max_vertex_count: self.max_vertex_count,
            groups: self.groups,
            diagnostics: self.diagnostics,
        }
    }
}

/// Completed groups in the order they were first created.
#[derive(Debug, Clone)]
pub struct Grouping {
    max_vertex_count: u32,
    groups: IndexMap<GroupKey, MaterialGroup>,
    diagnostics: Diagnostics,
}

impl Grouping {
    pub(crate) fn from_parts(
        max_vertex_count: u32,
        groups: IndexMap<GroupKey, MaterialGroup>,
        diagnostics: Diagnostics,
    ) -> Self {
        Self {
            max_vertex_count,
            groups,
            diagnostics,
        }
    }

    pub fn max_vertex_count(&self) -> u32 {
        self.max_vertex_count
    }

    pub fn groups(&self) -> &IndexMap<GroupKey, MaterialGroup> {
        &self.groups
    }

    pub fn group(&self, key: &GroupKey) -> Option<&MaterialGroup> {
        self.groups.get(key)
    }

    pub fn group_at(&self, index: usize) -> Option<&MaterialGroup> {
        self.groups.get_index(index).map(|(_, group)| group)
    }

    pub fn group_count(&self) -> usize {
        self.groups.len()
    }

    pub fn partition_count(&self) -> usize {
        self.groups.values().map(|g| g.partitions().len()).sum()
    }

    pub fn diagnostics(&self) -> &Diagnostics {
        &self.diagnostics
    }

    pub(crate) fn take_diagnostics(&mut self) -> Diagnostics {
        std::mem::take(&mut self.diagnostics)
    }

    /// Always `Grouped`; later stages belong to the combine job.
    pub fn stage(&self) -> GroupingStage {
        GroupingStage::Grouped
    }

    /// Every partition with its batch id, group by group.
    pub fn batches(&self) -> impl Iterator<Item = (BatchId, &Partition)> {
        self.groups.values().enumerate().flat_map(|(group, g)| {
            g.partitions().iter().enumerate().map(move |(partition, p)| {
                (
                    BatchId::Primary {
                        group: group as u32,
                        partition: partition as u32,
                    },
                    p,
                )
            })
        })
    }

    pub fn partition(&self, id: BatchId) -> Option<&Partition> {
        match id {
            BatchId::Primary { group, partition } => self
                .group_at(group as usize)
                .and_then(|g| g.partitions().get(partition as usize)),
            BatchId::Deep { .. } => None,
        }
    }

    pub(crate) fn group_partitions_mut(&mut self, index: usize) -> Option<&mut [Partition]> {
        self.groups
            .get_index_mut(index)
            .map(|(_, group)| group.partitions_mut())
    }

    /// The last partition of group `index`, as a stand-in for its merged batch.
    pub fn representative(&self, index: usize) -> Option<Renderable> {
        let (key, group) = self.groups.get_index(index)?;
        let partition_index = group.partitions().len().checked_sub(1)?;
        let last = group.last_partition()?;
        Some(Renderable::representative(
            format!("{}#{}", key, partition_index),
            BatchId::Primary {
                group: index as u32,
                partition: partition_index as u32,
            },
            last.vertex_total(),
            last.submesh_materials(),
        ))
    }

    /// One representative per group, in group creation order.
    pub fn representatives(&self) -> impl Iterator<Item = Renderable> + '_ {
        (0..self.groups.len()).filter_map(|index| self.representative(index))
    }

    pub fn into_groups(self) -> IndexMap<GroupKey, MaterialGroup> {
        self.groups
    }
}

/// Fold the last partition of every group into mixed-material batches.
///
/// Earlier partitions of a group are already full; only the last may have
/// room, so one representative per group keeps the pass linear in the
/// number of groups.
pub fn deep_combine(grouping: &Grouping, max_vertex_count: u32) -> MaterialGroup {
    combine_representatives(grouping.representatives(), max_vertex_count)
}

/// Append `representatives` in order to a fresh mixed group.
pub fn combine_representatives(
    representatives: impl IntoIterator<Item = Renderable>,
    max_vertex_count: u32,
) -> MaterialGroup {
    profile_function!();
    let mut deep = MaterialGroup::mixed();
    for representative in representatives {
        if let Err(rejected) = deep.append(representative, max_vertex_count) {
            tracing::error!("deep combine refused {}", rejected);
        }
    }
    tracing::debug!(partitions = deep.partitions().len(), "deep combine finished");
    deep
}
