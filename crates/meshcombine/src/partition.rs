//! A single size-bounded, material-constrained batch under construction.

use meshcombine_core::alloc::{IndexSet, index_set};

use crate::error::{RejectReason, Rejected};
use crate::material::MaterialKey;
use crate::renderable::Renderable;

/// Which members a partition accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BatchMode {
    /// Every member shares one material key. Merges into a single submesh.
    SameMaterial,
    /// Members may have any material, duplicates included. Keeps one submesh per member.
    MixedMaterial,
}

impl BatchMode {
    /// Whether a merge of this batch keeps one submesh per member.
    pub fn keeps_submeshes_separate(&self) -> bool {
        matches!(self, BatchMode::MixedMaterial)
    }
}

/// Lifecycle of a partition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PartitionState {
    /// Still accepting members.
    Building,
    /// Handed to the aggregator. No further members may be added.
    Finalized,
}

/// An ordered run of renderables destined to become one merged batch.
///
/// `vertex_total` is always the sum of the members' vertex counts. An empty
/// partition accepts its first member whatever its size, so an oversized
/// object still ends up in a batch of its own.
#[derive(Debug, Clone, PartialEq)]
pub struct Partition {
    mode: BatchMode,
    members: Vec<Renderable>,
    vertex_total: u32,
    distinct_materials: IndexSet<MaterialKey>,
    state: PartitionState,
}

impl Partition {
    /// A same-material partition seeded with `first`.
    pub fn new_same_material(first: Renderable) -> Self {
        let mut distinct_materials = index_set();
        distinct_materials.insert(first.material_key().clone());
        Self {
            mode: BatchMode::SameMaterial,
            vertex_total: first.vertex_count(),
            members: vec![first],
            distinct_materials,
            state: PartitionState::Building,
        }
    }

    /// An empty mixed-material partition.
    pub fn new_mixed() -> Self {
        Self {
            mode: BatchMode::MixedMaterial,
            members: Vec::new(),
            vertex_total: 0,
            distinct_materials: index_set(),
            state: PartitionState::Building,
        }
    }

    /// Try to claim `member`.
    ///
    /// On rejection the member is handed back inside [`Rejected`].
    ///
    /// # Panics
    ///
    /// Panics if the partition has been finalized.
    pub fn try_add(&mut self, member: Renderable, max_vertex_count: u32) -> Result<(), Rejected> {
        assert!(
            self.state == PartitionState::Building,
            "try_add on a finalized partition"
        );

        if self.members.is_empty() {
            self.push(member);
            return Ok(());
        }

        if self.mode == BatchMode::SameMaterial {
            if let Some(expected) = self.key() {
                if expected != member.material_key() {
                    return Err(Rejected {
                        reason: RejectReason::MaterialMismatch {
                            expected: expected.clone(),
                            found: member.material_key().clone(),
                        },
                        member,
                    });
                }
            }
        }

        let fits = self
            .vertex_total
            .checked_add(member.vertex_count())
            .is_some_and(|total| total <= max_vertex_count);
        if !fits {
            return Err(Rejected {
                reason: RejectReason::CapacityExceeded {
                    vertex_total: self.vertex_total,
                    incoming: member.vertex_count(),
                    max_vertex_count,
                },
                member,
            });
        }

        self.push(member);
        Ok(())
    }

    fn push(&mut self, member: Renderable) {
        match self.mode {
            BatchMode::SameMaterial => {
                self.distinct_materials.insert(member.material_key().clone());
            }
            BatchMode::MixedMaterial => {
                self.distinct_materials.extend(member.materials().iter().cloned());
            }
        }
        self.vertex_total += member.vertex_count();
        self.members.push(member);
    }

    /// Mark the partition as handed off. Idempotent.
    pub fn finalize(&mut self) {
        self.state = PartitionState::Finalized;
    }

    pub fn mode(&self) -> BatchMode {
        self.mode
    }

    pub fn state(&self) -> PartitionState {
        self.state
    }

    pub fn is_finalized(&self) -> bool {
        self.state == PartitionState::Finalized
    }

    /// The shared key of a same-material partition.
    pub fn key(&self) -> Option<&MaterialKey> {
        match self.mode {
            BatchMode::SameMaterial => self.distinct_materials.first(),
            BatchMode::MixedMaterial => None,
        }
    }

    pub fn members(&self) -> &[Renderable] {
        &self.members
    }

    pub fn into_members(self) -> Vec<Renderable> {
        self.members
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn vertex_total(&self) -> u32 {
        self.vertex_total
    }

    /// Materials in the order they first joined the partition.
    pub fn distinct_materials(&self) -> &IndexSet<MaterialKey> {
        &self.distinct_materials
    }

    /// Materials of the merged batch, one entry per submesh.
    ///
    /// A same-material batch has one submesh; a mixed batch has one per
    /// carried material of each member, in member order.
    pub fn submesh_materials(&self) -> Vec<MaterialKey> {
        match self.mode {
            BatchMode::SameMaterial => self.distinct_materials.iter().cloned().collect(),
            BatchMode::MixedMaterial => self
                .members
                .iter()
                .flat_map(|m| m.materials().iter().cloned())
                .collect(),
        }
    }

    /// Vertex budget left before `max_vertex_count` is reached.
    pub fn remaining(&self, max_vertex_count: u32) -> u32 {
        max_vertex_count.saturating_sub(self.vertex_total)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::renderable::{MeshHandle, MeshRef, TransformRef};

    fn item(id: &str, material: u64, vertices: u32) -> Renderable {
        Renderable::new(
            id,
            MaterialKey::new(material),
            vertices,
            Some(MeshRef::Asset(MeshHandle(material))),
            TransformRef::Node(0),
        )
    }

    #[test]
    fn test_same_material_seed() {
        let p = Partition::new_same_material(item("a", 1, 500));
        assert_eq!(p.len(), 1);
        assert_eq!(p.vertex_total(), 500);
        assert_eq!(p.key(), Some(&MaterialKey::new(1)));
        assert_eq!(p.state(), PartitionState::Building);
    }

    #[test]
    fn test_oversized_seed_is_accepted() {
        let p = Partition::new_same_material(item("huge", 1, 5000));
        assert_eq!(p.vertex_total(), 5000);

        let mut mixed = Partition::new_mixed();
        assert!(mixed.try_add(item("huge", 1, 5000), 3000).is_ok());
        assert_eq!(mixed.vertex_total(), 5000);
    }

    #[test]
    fn test_material_mismatch_returns_member() {
        let mut p = Partition::new_same_material(item("a", 1, 10));
        let err = p.try_add(item("b", 2, 10), 100).unwrap_err();
        assert_eq!(
            err.reason,
            RejectReason::MaterialMismatch {
                expected: MaterialKey::new(1),
                found: MaterialKey::new(2),
            }
        );
        assert_eq!(err.member.source_id(), "b");
        assert_eq!(p.len(), 1);
        assert_eq!(p.vertex_total(), 10);
    }

    #[test]
    fn test_capacity_exceeded() {
        let mut p = Partition::new_same_material(item("a", 1, 500));
        assert!(p.try_add(item("b", 1, 500), 1200).is_ok());
        let err = p.try_add(item("c", 1, 500), 1200).unwrap_err();
        assert!(matches!(err.reason, RejectReason::CapacityExceeded { vertex_total: 1000, .. }));
        assert_eq!(p.vertex_total(), 1000);
    }

    #[test]
    fn test_total_past_u32_max_is_capacity_exceeded() {
        let mut p = Partition::new_same_material(item("a", 1, u32::MAX - 1));
        let err = p.try_add(item("b", 1, 10), u32::MAX).unwrap_err();
        assert!(matches!(
            err.reason,
            RejectReason::CapacityExceeded {
                vertex_total,
                incoming: 10,
                max_vertex_count: u32::MAX,
            } if vertex_total == u32::MAX - 1
        ));
        assert_eq!(p.len(), 1);
        assert_eq!(p.vertex_total(), u32::MAX - 1);

        assert!(p.try_add(item("c", 1, 1), u32::MAX).is_ok());
        assert_eq!(p.vertex_total(), u32::MAX);
    }

    #[test]
    fn test_exact_fit_is_accepted() {
        let mut p = Partition::new_same_material(item("a", 1, 600));
        assert!(p.try_add(item("b", 1, 600), 1200).is_ok());
        assert_eq!(p.remaining(1200), 0);
    }

    #[test]
    fn test_mixed_allows_duplicate_materials() {
        let mut p = Partition::new_mixed();
        p.try_add(item("a", 1, 10), 100).unwrap();
        p.try_add(item("b", 2, 10), 100).unwrap();
        p.try_add(item("c", 1, 10), 100).unwrap();
        assert_eq!(p.len(), 3);
        assert_eq!(p.distinct_materials().len(), 2);
        assert_eq!(p.submesh_materials().len(), 3);
        assert_eq!(p.key(), None);
    }

    #[test]
    #[should_panic(expected = "finalized partition")]
    fn test_add_after_finalize_panics() {
        let mut p = Partition::new_same_material(item("a", 1, 10));
        p.finalize();
        let _ = p.try_add(item("b", 1, 10), 100);
    }
}
