//! Boundary traits for the host's scene and mesh library.
//!
//! The grouping core never touches geometry or the scene graph. Discovery
//! hands it a snapshot of [`Renderable`]s; the [`Aggregator`] turns each
//! finished [`Partition`] into a merged mesh and performs any scene side
//! effects (hiding sources, reparenting) for it.

use crate::batch::BatchId;
use crate::error::AggregateError;
use crate::partition::Partition;
use crate::renderable::Renderable;

/// Enumerates renderable objects under a root.
pub trait RenderableSource {
    type Root;

    /// Objects under `root`, in the order they should be processed.
    fn enumerate(&self, root: &Self::Root, include_inactive: bool) -> Vec<Renderable>;
}

/// Merges partitions into meshes and builds colliders from them.
///
/// Methods take `&self` so an implementation can be shared with a task pool;
/// use interior mutability to record state.
///
/// A [`MeshRef::Batch`](crate::MeshRef::Batch) member refers to the mesh an
/// earlier `merge` call returned for that batch id. Batches are always
/// merged before any partition that refers to them.
pub trait Aggregator {
    type Mesh;
    type Collider;

    /// Merge the members of `partition` into one mesh.
    ///
    /// With `keep_submeshes_separate` each member keeps its own submesh and
    /// material slot; otherwise all members collapse into one submesh.
    fn merge(
        &self,
        batch: BatchId,
        partition: &Partition,
        keep_submeshes_separate: bool,
    ) -> Result<Self::Mesh, AggregateError>;

    fn build_collider(&self, batch: BatchId, mesh: &Self::Mesh) -> Result<Self::Collider, AggregateError>;
}

impl<A: Aggregator + ?Sized> Aggregator for &A {
    type Mesh = A::Mesh;
    type Collider = A::Collider;

    fn merge(
        &self,
        batch: BatchId,
        partition: &Partition,
        keep_submeshes_separate: bool,
    ) -> Result<Self::Mesh, AggregateError> {
        (**self).merge(batch, partition, keep_submeshes_separate)
    }

    fn build_collider(&self, batch: BatchId, mesh: &Self::Mesh) -> Result<Self::Collider, AggregateError> {
        (**self).build_collider(batch, mesh)
    }
}
