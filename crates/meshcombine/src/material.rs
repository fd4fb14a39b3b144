//! Material identity.

use std::fmt;
use std::hash::{BuildHasher, Hash, Hasher};
use std::sync::Arc;

use meshcombine_core::alloc::stable_state;

/// Opaque identity used to decide whether two renderables may share a batch.
///
/// Equality and hashing use only the numeric id. The label is carried for
/// log output, so two distinct materials that happen to share a display name
/// never collide.
#[derive(Clone)]
pub struct MaterialKey {
    id: u64,
    label: Option<Arc<str>>,
}

impl MaterialKey {
    /// A key without a label.
    pub const fn new(id: u64) -> Self {
        Self { id, label: None }
    }

    /// A key with a display label.
    pub fn labeled(id: u64, label: impl Into<Arc<str>>) -> Self {
        Self {
            id,
            label: Some(label.into()),
        }
    }

    /// Derive a key standing for the union of `materials`.
    ///
    /// A single material maps to itself. Otherwise the result depends only on
    /// the set of ids (not their order or repetition).
    pub fn composite(materials: &[MaterialKey]) -> Self {
        let mut ids: Vec<u64> = materials.iter().map(|m| m.id).collect();
        ids.sort_unstable();
        ids.dedup();

        if let [only] = ids.as_slice() {
            return materials
                .iter()
                .find(|m| m.id == *only)
                .cloned()
                .unwrap_or_else(|| Self::new(*only));
        }

        let mut hasher = stable_state().build_hasher();
        ids.len().hash(&mut hasher);
        for id in &ids {
            id.hash(&mut hasher);
        }
        Self {
            id: hasher.finish(),
            label: Some(format!("composite({})", ids.len()).into()),
        }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }
}

impl PartialEq for MaterialKey {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for MaterialKey {}

impl Hash for MaterialKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Debug for MaterialKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.label {
            Some(label) => write!(f, "MaterialKey({:#x} {:?})", self.id, label),
            None => write!(f, "MaterialKey({:#x})", self.id),
        }
    }
}

impl fmt::Display for MaterialKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.label {
            Some(label) => write!(f, "{}", label),
            None => write!(f, "#{}", self.id),
        }
    }
}
