//! Output batch identifiers.

use std::fmt;

/// Names one output batch by its position in the grouping result.
///
/// Ids are positional, so identical input yields identical ids.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum BatchId {
    /// Partition `partition` of the `group`-th material group, in creation order.
    Primary { group: u32, partition: u32 },
    /// Partition `partition` of the deep-combine group.
    Deep { partition: u32 },
}

impl BatchId {
    pub fn is_deep(&self) -> bool {
        matches!(self, BatchId::Deep { .. })
    }
}

impl fmt::Display for BatchId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BatchId::Primary { group, partition } => write!(f, "batch {}.{}", group, partition),
            BatchId::Deep { partition } => write!(f, "deep batch {}", partition),
        }
    }
}
