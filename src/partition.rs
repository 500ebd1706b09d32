//! Partition identity.

use serde::{Deserialize, Serialize};

/// Identifies one independently elected partition.
///
/// A partition belongs to a namespace (typically the name of the partition
/// group it was created under) and carries a numeric id within that
/// namespace. Equality is structural, and the type is `Ord` so it can key a
/// `BTreeMap` with deterministic iteration order.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PartitionId {
    namespace: String,
    id: u64,
}

impl PartitionId {
    /// Creates a partition id within `namespace`.
    pub fn new(namespace: impl Into<String>, id: u64) -> Self {
        Self {
            namespace: namespace.into(),
            id,
        }
    }

    /// The namespace this partition belongs to.
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// The numeric id within the namespace.
    pub fn id(&self) -> u64 {
        self.id
    }
}

impl std::fmt::Display for PartitionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}-{}", self.namespace, self.id)
    }
}
