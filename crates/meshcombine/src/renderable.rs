//! Input records describing one renderable object.

use std::slice;
use std::sync::Arc;

use crate::batch::BatchId;
use crate::error::InvalidMeshReason;
use crate::material::MaterialKey;

/// Opaque handle to mesh data owned by the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MeshHandle(pub u64);

/// Where a renderable's geometry comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MeshRef {
    /// Mesh data from the scene.
    Asset(MeshHandle),
    /// The merged output of an earlier batch.
    Batch(BatchId),
}

/// Opaque handle to a transform owned by the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransformRef {
    /// The transform of a scene node.
    Node(u64),
    /// Geometry already baked into world space.
    Identity,
}

/// One input object: a material, a vertex count and handles to its geometry.
///
/// Immutable once constructed. Adding it to a [`Partition`](crate::Partition)
/// moves it, so no two partitions can hold the same instance.
#[derive(Debug, Clone, PartialEq)]
pub struct Renderable {
    source_id: Arc<str>,
    material_key: MaterialKey,
    vertex_count: u32,
    mesh: Option<MeshRef>,
    transform: TransformRef,
    /// Materials contributed to a merged batch. Empty means `[material_key]`.
    carried: Arc<[MaterialKey]>,
}

impl Renderable {
    pub fn new(
        source_id: impl Into<Arc<str>>,
        material_key: MaterialKey,
        vertex_count: u32,
        mesh: Option<MeshRef>,
        transform: TransformRef,
    ) -> Self {
        Self {
            source_id: source_id.into(),
            material_key,
            vertex_count,
            mesh,
            transform,
            carried: Arc::from([]),
        }
    }

    /// A stand-in for an already merged batch.
    ///
    /// `materials` lists every material merged into that batch; the key is
    /// derived from their union.
    pub fn representative(
        source_id: impl Into<Arc<str>>,
        batch: BatchId,
        vertex_count: u32,
        materials: Vec<MaterialKey>,
    ) -> Self {
        let material_key = MaterialKey::composite(&materials);
        Self {
            source_id: source_id.into(),
            material_key,
            vertex_count,
            mesh: Some(MeshRef::Batch(batch)),
            transform: TransformRef::Identity,
            carried: materials.into(),
        }
    }

    pub fn source_id(&self) -> &str {
        &self.source_id
    }

    pub(crate) fn source_id_arc(&self) -> Arc<str> {
        self.source_id.clone()
    }

    pub fn material_key(&self) -> &MaterialKey {
        &self.material_key
    }

    pub fn vertex_count(&self) -> u32 {
        self.vertex_count
    }

    pub fn mesh(&self) -> Option<MeshRef> {
        self.mesh
    }

    pub fn transform(&self) -> TransformRef {
        self.transform
    }

    /// Materials this object contributes to a merged batch.
    pub fn materials(&self) -> &[MaterialKey] {
        if self.carried.is_empty() {
            slice::from_ref(&self.material_key)
        } else {
            &self.carried
        }
    }

    /// The batch this object stands in for, if it is a representative.
    pub fn represented_batch(&self) -> Option<BatchId> {
        match self.mesh {
            Some(MeshRef::Batch(id)) => Some(id),
            _ => None,
        }
    }

    /// Check that the object has geometry worth merging.
    pub fn validate(&self) -> Result<(), InvalidMeshReason> {
        if self.mesh.is_none() {
            return Err(InvalidMeshReason::MissingMesh);
        }
        if self.vertex_count == 0 {
            return Err(InvalidMeshReason::EmptyGeometry);
        }
        Ok(())
    }
}

static_assertions::assert_impl_all!(Renderable: Send, Sync);
