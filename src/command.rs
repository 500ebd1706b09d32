//! The replicated command surface.
//!
//! The command set is small and fixed, so it is a closed enum dispatched
//! with a match rather than trait objects: replicas get exhaustiveness
//! checking, and the wire representation is a plain serde enum.

use serde::{Deserialize, Serialize};

use crate::elector::PrimaryElector;
use crate::member::{GroupMember, SessionId};
use crate::partition::PartitionId;
use crate::term::PrimaryTerm;

/// Commands delivered by the replicated log.
///
/// Every replica applies the identical command sequence, so applying a
/// command must be a pure function of the elector state and the command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ElectionCommand {
    /// Register `member` as a candidate for `partition`, bound to the
    /// caller's `session`.
    Enter {
        partition: PartitionId,
        member: GroupMember,
        session: SessionId,
    },
    /// Read the current term of `partition`.
    GetTerm { partition: PartitionId },
    /// Drop every candidacy held by a session the liveness subsystem has
    /// declared dead.
    ExpireSession { session: SessionId },
}

/// Result of applying an [`ElectionCommand`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ElectionResponse {
    /// The partition's term after the command.
    Term(PrimaryTerm),
    /// The command applied but has no term to report (session expiry).
    Ok,
    /// The command violated the protocol contract and was not applied.
    Error(String),
}

impl PrimaryElector {
    /// Applies one replicated command.
    ///
    /// Contract violations come back as [`ElectionResponse::Error`] with the
    /// state untouched; they must never be half-applied, or replicas that
    /// validate differently would diverge.
    pub fn apply(&mut self, command: &ElectionCommand) -> ElectionResponse {
        match command {
            ElectionCommand::Enter {
                partition,
                member,
                session,
            } => match self.enter(partition.clone(), member.clone(), *session) {
                Ok(term) => ElectionResponse::Term(term),
                Err(err) => ElectionResponse::Error(err.to_string()),
            },

            ElectionCommand::GetTerm { partition } => {
                ElectionResponse::Term(self.term(partition))
            }

            ElectionCommand::ExpireSession { session } => {
                self.expire(*session);
                ElectionResponse::Ok
            }
        }
    }
}
