//! Per-material grouping on a task pool.
//!
//! Groups never interact before the deep pass, so each material's bucket can
//! be partitioned independently. Bucketing itself stays sequential to keep
//! first-seen group order and per-group input order.

use meshcombine_core::alloc::{IndexMap, index_map};
use meshcombine_core::profiling::profile_function;

use crate::config::{CombineOptions, GroupingMode};
use crate::diagnostics::{DiagnosticKind, Diagnostics};
use crate::error::{CombineResult, RejectReason};
use crate::group::{GroupKey, MaterialGroup};
use crate::grouper::Grouping;
use crate::renderable::Renderable;
use crate::task_pool::TaskPool;

/// Group `renderables` like [`Grouper`](crate::Grouper), partitioning each
/// material on `pool`. The result matches the sequential grouping.
pub fn group_parallel(
    renderables: impl IntoIterator<Item = Renderable>,
    options: &CombineOptions,
    pool: &TaskPool,
) -> CombineResult<Grouping> {
    profile_function!();
    options.validate()?;

    let mut diagnostics = Diagnostics::new();
    let mut buckets: IndexMap<GroupKey, Vec<Renderable>> = index_map();
    for renderable in renderables {
        if let Err(reason) = renderable.validate() {
            diagnostics.push(renderable.source_id(), DiagnosticKind::InvalidMesh(reason));
            continue;
        }
        let key = match options.mode {
            GroupingMode::SameMaterial => GroupKey::Material(renderable.material_key().clone()),
            GroupingMode::MixedMaterial => GroupKey::Mixed,
        };
        buckets.entry(key).or_default().push(renderable);
    }

    let max_vertex_count = options.max_vertex_count;
    let built = pool.map_ordered(buckets, move |(key, members)| {
        let mut group = MaterialGroup::new(key);
        let mut dropped = Diagnostics::new();
        for member in members {
            if let Err(rejected) = group.append(member, max_vertex_count) {
                if let RejectReason::MaterialMismatch { expected, found } = rejected.reason {
                    dropped.push(
                        rejected.member.source_id(),
                        DiagnosticKind::MaterialMismatch { expected, found },
                    );
                }
            }
        }
        (group, dropped)
    });

    let mut groups = index_map();
    for (group, dropped) in built {
        diagnostics.extend(dropped);
        groups.insert(group.key().clone(), group);
    }

    tracing::debug!(groups = groups.len(), "parallel grouping finished");
    Ok(Grouping::from_parts(max_vertex_count, groups, diagnostics))
}
