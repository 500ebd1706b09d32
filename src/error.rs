//! Error types for election operations.

use crate::member::SessionId;
use crate::partition::PartitionId;

/// Protocol violations by the host.
///
/// The elector itself has almost no failure modes: unknown partitions are
/// created lazily, reads of unelected partitions return the zero term, and
/// expiring an unknown session is a no-op. What remains are command-contract
/// violations, which are rejected before any state is touched — a
/// half-applied command would desynchronize replicas.
#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum ElectionError {
    /// A candidate was submitted with an empty member id.
    #[error("member id must not be empty")]
    EmptyMemberId,

    /// A partition id was submitted with an empty namespace.
    #[error("partition {0} has an empty namespace")]
    InvalidPartition(PartitionId),

    /// A session tried to claim a second, different member in a partition
    /// where it already holds a candidacy.
    #[error("session {session} already holds a different member in partition {partition}")]
    SessionConflict {
        session: SessionId,
        partition: PartitionId,
    },
}
