/// Vertex cap used when the caller does not set one.
pub const DEFAULT_MAX_VERTEX_COUNT: u32 = 30_000;

/// Vertex cap the scene-side combine component ships with.
pub const COMPONENT_MAX_VERTEX_COUNT: u32 = 3_000;

/// How renderables are routed into groups.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GroupingMode {
    /// One group per material key.
    #[default]
    SameMaterial,
    /// A single group taking every material.
    MixedMaterial,
}

/// Options for one combine run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CombineOptions {
    /// Vertex budget per merged batch. A lone oversized object may exceed it.
    pub max_vertex_count: u32,
    /// Also combine objects that are currently inactive in the scene.
    pub include_inactive: bool,
    /// Fold the last partition of every group into multi-material batches.
    pub deep_combine: bool,
    /// Build a collider for each merged batch.
    pub create_collider: bool,
    pub mode: GroupingMode,
}

impl Default for CombineOptions {
    fn default() -> Self {
        CombineOptions {
            max_vertex_count: DEFAULT_MAX_VERTEX_COUNT,
            include_inactive: false,
            deep_combine: false,
            create_collider: true,
            mode: GroupingMode::SameMaterial,
        }
    }
}

impl CombineOptions {
    pub fn with_max_vertex_count(mut self, max_vertex_count: u32) -> Self {
        self.max_vertex_count = max_vertex_count;
        self
    }

    pub fn with_include_inactive(mut self, include_inactive: bool) -> Self {
        self.include_inactive = include_inactive;
        self
    }

    pub fn with_deep_combine(mut self, deep_combine: bool) -> Self {
        self.deep_combine = deep_combine;
        self
    }

    pub fn with_create_collider(mut self, create_collider: bool) -> Self {
        self.create_collider = create_collider;
        self
    }

    pub fn with_mode(mut self, mode: GroupingMode) -> Self {
        self.mode = mode;
        self
    }

    /// Reject options that cannot drive a run.
    pub fn validate(&self) -> crate::CombineResult<()> {
        if self.max_vertex_count == 0 {
            return Err(crate::CombineError::InvalidOptions {
                message: "max_vertex_count must be greater than zero".to_string(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let options = CombineOptions::default();
        assert_eq!(options.max_vertex_count, 30_000);
        assert!(!options.include_inactive);
        assert!(!options.deep_combine);
        assert!(options.create_collider);
        assert_eq!(options.mode, GroupingMode::SameMaterial);
        assert!(options.validate().is_ok());
    }

    #[test]
    fn test_zero_cap_is_invalid() {
        let options = CombineOptions::default().with_max_vertex_count(0);
        assert!(matches!(
            options.validate(),
            Err(crate::CombineError::InvalidOptions { .. })
        ));
    }
}
