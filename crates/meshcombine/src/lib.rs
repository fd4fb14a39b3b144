//! meshcombine - batch scene geometry into merged meshes
//!
//! Groups renderable objects into the smallest practical set of merged
//! batches under two rules: a batch holds a single material unless it is
//! explicitly a multi-material batch, and no batch grows past a vertex cap.
//!
//! - **Grouping**: [`Grouper`] buckets [`Renderable`]s by [`MaterialKey`] and
//!   splits each bucket into size-bounded [`Partition`]s
//! - **Deep combine**: [`deep_combine`] folds the last, possibly under-full,
//!   partition of every group into mixed-material batches
//! - **Aggregation**: [`CombineJob`] hands each finished partition to an
//!   [`Aggregator`], one material group per step
//!
//! The merge itself, colliders and scene traversal belong to the host and are
//! reached through [`Aggregator`] and [`RenderableSource`].
//!
//! # Quick Start
//!
//! ```
//! use meshcombine::{Grouper, MaterialKey, MeshHandle, MeshRef, Renderable, TransformRef};
//!
//! let stone = MaterialKey::labeled(1, "Stone");
//! let rocks = (0..10).map(|i| {
//!     Renderable::new(
//!         format!("rock{i}"),
//!         stone.clone(),
//!         500,
//!         Some(MeshRef::Asset(MeshHandle(i))),
//!         TransformRef::Node(i),
//!     )
//! });
//!
//! let grouping = Grouper::group(rocks, 1200);
//! assert_eq!(grouping.partition_count(), 5);
//! ```

pub mod aggregator;
pub mod batch;
pub mod combiner;
pub mod config;
pub mod diagnostics;
pub mod error;
pub mod group;
pub mod grouper;
pub mod job;
pub mod material;
pub mod parallel;
pub mod partition;
pub mod renderable;
pub mod task_pool;

pub use aggregator::{Aggregator, RenderableSource};
pub use batch::BatchId;
pub use combiner::Combiner;
pub use config::{COMPONENT_MAX_VERTEX_COUNT, CombineOptions, DEFAULT_MAX_VERTEX_COUNT, GroupingMode};
pub use diagnostics::{Diagnostic, DiagnosticKind, Diagnostics};
pub use error::{AggregateError, CombineError, CombineResult, InvalidMeshReason, RejectReason, Rejected};
pub use group::{AppendOutcome, GroupKey, MaterialGroup};
pub use grouper::{Grouper, Grouping, GroupingStage, PushOutcome, combine_representatives, deep_combine};
pub use job::{CombineJob, CombineReport, CombinedBatch, StepStatus};
pub use material::MaterialKey;
pub use parallel::group_parallel;
pub use partition::{BatchMode, Partition, PartitionState};
pub use renderable::{MeshHandle, MeshRef, Renderable, TransformRef};
pub use task_pool::TaskPool;

pub use meshcombine_core as core;

static_assertions::assert_impl_all!(Partition: Send, Sync);
static_assertions::assert_impl_all!(MaterialGroup: Send, Sync);
