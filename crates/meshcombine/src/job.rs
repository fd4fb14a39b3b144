//! A combine run split into resumable steps.
//!
//! Grouping is pure and runs up front. Aggregation then proceeds one
//! material group per [`CombineJob::process_next_group`] call, followed by one
//! step for the deep pass, so a host can spread the work across frames.
//! Stopping between steps leaves every batch produced so far valid.

use std::sync::Arc;

use meshcombine_core::alloc::HashMap;
use meshcombine_core::profiling::{profile_function, profile_scope};

use crate::aggregator::{Aggregator, RenderableSource};
use crate::batch::BatchId;
use crate::config::CombineOptions;
use crate::diagnostics::{DiagnosticKind, Diagnostics};
use crate::error::CombineResult;
use crate::grouper::{Grouper, Grouping, GroupingStage, combine_representatives};
use crate::material::MaterialKey;
use crate::partition::{BatchMode, Partition};
use crate::renderable::Renderable;

/// Whether more steps remain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepStatus {
    Pending,
    Done,
}

/// One merged output batch.
#[derive(Debug, Clone)]
pub struct CombinedBatch<M, C> {
    pub id: BatchId,
    pub mode: BatchMode,
    pub vertex_total: u32,
    /// Material of each submesh, in submesh order.
    pub materials: Vec<MaterialKey>,
    /// Source ids of the merged members.
    pub sources: Vec<Arc<str>>,
    pub mesh: M,
    pub collider: Option<C>,
    /// The deep batch this batch was folded into, if any.
    pub absorbed_into: Option<BatchId>,
}

impl<M, C> CombinedBatch<M, C> {
    /// Still drawn on its own, i.e. not folded into a deep batch.
    pub fn is_visible(&self) -> bool {
        self.absorbed_into.is_none()
    }
}

/// Everything a run produced, including partial results of a cancelled run.
#[derive(Debug, Clone)]
pub struct CombineReport<M, C> {
    pub batches: Vec<CombinedBatch<M, C>>,
    pub diagnostics: Diagnostics,
    pub cancelled: bool,
}

impl<M, C> CombineReport<M, C> {
    pub fn batch(&self, id: BatchId) -> Option<&CombinedBatch<M, C>> {
        self.batches.iter().find(|b| b.id == id)
    }

    pub fn primary(&self) -> impl Iterator<Item = &CombinedBatch<M, C>> {
        self.batches.iter().filter(|b| !b.id.is_deep())
    }

    pub fn deep(&self) -> impl Iterator<Item = &CombinedBatch<M, C>> {
        self.batches.iter().filter(|b| b.id.is_deep())
    }

    /// Batches that remain drawn after the run.
    pub fn visible(&self) -> impl Iterator<Item = &CombinedBatch<M, C>> {
        self.batches.iter().filter(|b| b.is_visible())
    }
}

/// A resumable combine run over one snapshot of renderables.
#[derive(Debug)]
pub struct CombineJob<M, C> {
    options: CombineOptions,
    grouping: Grouping,
    stage: GroupingStage,
    next_group: usize,
    batches: Vec<CombinedBatch<M, C>>,
    batch_index: HashMap<BatchId, usize>,
    diagnostics: Diagnostics,
    cancelled: bool,
}

impl<M, C> CombineJob<M, C> {
    /// Validate `options` and group `renderables`.
    pub fn new(renderables: impl IntoIterator<Item = Renderable>, options: CombineOptions) -> CombineResult<Self> {
        options.validate()?;
        let mut grouper = Grouper::new(options.max_vertex_count, options.mode);
        grouper.extend(renderables);
        Ok(Self::from_grouping(grouper.finish(), options))
    }

    /// Enumerate `root` through `source`, then group the result.
    pub fn discover<S: RenderableSource>(source: &S, root: &S::Root, options: CombineOptions) -> CombineResult<Self> {
        options.validate()?;
        let renderables = source.enumerate(root, options.include_inactive);
        tracing::debug!(count = renderables.len(), "discovered renderables");
        Self::new(renderables, options)
    }

    /// Start from an existing grouping.
    pub fn from_grouping(mut grouping: Grouping, options: CombineOptions) -> Self {
        let diagnostics = grouping.take_diagnostics();
        let stage = if grouping.group_count() == 0 {
            GroupingStage::Done
        } else {
            GroupingStage::Grouped
        };
        Self {
            options,
            grouping,
            stage,
            next_group: 0,
            batches: Vec::new(),
            batch_index: HashMap::new(),
            diagnostics,
            cancelled: false,
        }
    }

    pub fn options(&self) -> &CombineOptions {
        &self.options
    }

    pub fn grouping(&self) -> &Grouping {
        &self.grouping
    }

    pub fn stage(&self) -> GroupingStage {
        self.stage
    }

    pub fn is_done(&self) -> bool {
        self.stage == GroupingStage::Done
    }

    /// Groups aggregated so far, and the total.
    pub fn progress(&self) -> (usize, usize) {
        (self.next_group, self.grouping.group_count())
    }

    pub fn batches(&self) -> &[CombinedBatch<M, C>] {
        &self.batches
    }

    pub fn diagnostics(&self) -> &Diagnostics {
        &self.diagnostics
    }

    /// Stop before the next step. Batches produced so far are kept.
    pub fn cancel(&mut self) {
        if !self.is_done() {
            tracing::info!(
                groups_done = self.next_group,
                groups = self.grouping.group_count(),
                "combine job cancelled"
            );
            self.cancelled = true;
            self.stage = GroupingStage::Done;
        }
    }

    /// Aggregate the next group, or run the deep pass once all groups are done.
    pub fn process_next_group<A>(&mut self, aggregator: &A) -> StepStatus
    where
        A: Aggregator<Mesh = M, Collider = C>,
    {
        profile_function!();
        match self.stage {
            GroupingStage::Empty | GroupingStage::Grouping | GroupingStage::Grouped => {
                self.aggregate_group(aggregator);
                self.next_group += 1;
                if self.next_group >= self.grouping.group_count() {
                    self.stage = if self.options.deep_combine {
                        GroupingStage::DeepCombining
                    } else {
                        GroupingStage::Done
                    };
                }
            }
            GroupingStage::DeepCombining => {
                self.aggregate_deep(aggregator);
                self.stage = GroupingStage::Done;
            }
            GroupingStage::Done => return StepStatus::Done,
        }

        if self.is_done() {
            tracing::info!(
                batches = self.batches.len(),
                diagnostics = self.diagnostics.len(),
                "combine job finished"
            );
            StepStatus::Done
        } else {
            StepStatus::Pending
        }
    }

    /// Drive every remaining step and return the report.
    pub fn run<A>(mut self, aggregator: &A) -> CombineReport<M, C>
    where
        A: Aggregator<Mesh = M, Collider = C>,
    {
        while self.process_next_group(aggregator) == StepStatus::Pending {}
        self.into_report()
    }

    pub fn into_report(self) -> CombineReport<M, C> {
        CombineReport {
            batches: self.batches,
            diagnostics: self.diagnostics,
            cancelled: self.cancelled,
        }
    }

    fn aggregate_group<A>(&mut self, aggregator: &A)
    where
        A: Aggregator<Mesh = M, Collider = C>,
    {
        let group_index = self.next_group;
        let Some((key, _)) = self.grouping.groups().get_index(group_index) else {
            return;
        };
        let key = key.to_string();
        let create_collider = self.options.create_collider;
        let Some(partitions) = self.grouping.group_partitions_mut(group_index) else {
            return;
        };

        tracing::debug!(group = %key, partitions = partitions.len(), "aggregating group");
        for (partition_index, partition) in partitions.iter_mut().enumerate() {
            let id = BatchId::Primary {
                group: group_index as u32,
                partition: partition_index as u32,
            };
            partition.finalize();
            let label = format!("{}#{}", key, partition_index);
            if let Some(batch) = aggregate(aggregator, id, partition, create_collider, &label, &mut self.diagnostics) {
                self.batch_index.insert(id, self.batches.len());
                self.batches.push(batch);
            }
        }
    }

    fn aggregate_deep<A>(&mut self, aggregator: &A)
    where
        A: Aggregator<Mesh = M, Collider = C>,
    {
        profile_scope!("deep_combine");
        let mut representatives = Vec::with_capacity(self.grouping.group_count());
        for rep in self.grouping.representatives() {
            let Some(batch) = rep.represented_batch() else {
                continue;
            };
            if self.batch_index.contains_key(&batch) {
                representatives.push(rep);
            } else {
                self.diagnostics
                    .push(rep.source_id(), DiagnosticKind::RepresentativeUnavailable { batch });
            }
        }

        let mut deep = combine_representatives(representatives, self.options.max_vertex_count);
        for (partition_index, partition) in deep.partitions_mut().iter_mut().enumerate() {
            let id = BatchId::Deep {
                partition: partition_index as u32,
            };
            partition.finalize();
            let label = format!("deep#{}", partition_index);
            let Some(batch) = aggregate(
                aggregator,
                id,
                partition,
                self.options.create_collider,
                &label,
                &mut self.diagnostics,
            ) else {
                continue;
            };

            for absorbed in partition.members().iter().filter_map(Renderable::represented_batch) {
                if let Some(&index) = self.batch_index.get(&absorbed) {
                    self.batches[index].absorbed_into = Some(id);
                }
            }
            self.batch_index.insert(id, self.batches.len());
            self.batches.push(batch);
        }
    }
}

/// Merge one finalized partition. Failures are recorded and scoped to it.
fn aggregate<A: Aggregator>(
    aggregator: &A,
    id: BatchId,
    partition: &Partition,
    create_collider: bool,
    label: &str,
    diagnostics: &mut Diagnostics,
) -> Option<CombinedBatch<A::Mesh, A::Collider>> {
    profile_scope!("aggregate");
    let mesh = match aggregator.merge(id, partition, partition.mode().keeps_submeshes_separate()) {
        Ok(mesh) => mesh,
        Err(e) => {
            diagnostics.push(
                label,
                DiagnosticKind::AggregationFailed {
                    batch: id,
                    message: e.message,
                },
            );
            return None;
        }
    };

    let collider = if create_collider {
        match aggregator.build_collider(id, &mesh) {
            Ok(collider) => Some(collider),
            Err(e) => {
                diagnostics.push(
                    label,
                    DiagnosticKind::ColliderFailed {
                        batch: id,
                        message: e.message,
                    },
                );
                None
            }
        }
    } else {
        None
    };

    tracing::debug!(
        batch = %id,
        members = partition.len(),
        vertices = partition.vertex_total(),
        "merged batch"
    );

    Some(CombinedBatch {
        id,
        mode: partition.mode(),
        vertex_total: partition.vertex_total(),
        materials: partition.submesh_materials(),
        sources: partition.members().iter().map(Renderable::source_id_arc).collect(),
        mesh,
        collider,
        absorbed_into: None,
    })
}
