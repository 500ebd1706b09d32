//! The primary-election state machine.
//!
//! One [`PrimaryElector`] instance is the deterministic core a replicated
//! log drives: every replica applies the identical sequence of enter and
//! expire operations and arrives at bit-identical state. Nothing here reads
//! the clock, draws randomness, or iterates a container whose order is not
//! a function of the command history — the ledger map and session index are
//! `BTreeMap`s precisely so that sweeps and snapshots are order-stable.
//!
//! The caller is expected to be a single-threaded command applier (the
//! replicated-log model guarantees a total order of commands), so the type
//! carries no interior locking. Hosts that sit behind a concurrent front
//! door must serialize calls into it themselves; see
//! [`ElectorStore`](crate::ElectorStore) for how the openraft embedding
//! does this.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::ElectionError;
use crate::ledger::PartitionLedger;
use crate::member::{GroupMember, SessionId};
use crate::partition::PartitionId;
use crate::term::PrimaryTerm;

/// Deterministic primary elector for every partition of a cluster.
///
/// Holds one candidate ledger per partition, a reverse index from session
/// to the candidacies it keeps alive, and the sequence counter that orders
/// candidates. The whole value is `Serialize`/`Deserialize`, so a replica
/// restarts from snapshot plus log replay.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PrimaryElector {
    /// Next entry sequence. Advanced only inside command handlers, so it is
    /// monotonic within the deterministic command stream.
    next_seq: u64,
    #[serde(with = "map_as_seq")]
    ledgers: BTreeMap<PartitionId, PartitionLedger>,
    sessions: BTreeMap<SessionId, BTreeSet<(PartitionId, GroupMember)>>,
    /// Reverse index of `sessions`: the session currently keeping each
    /// candidacy alive. Makes re-pointing a member's binding a single
    /// lookup instead of a scan over every session.
    #[serde(with = "map_as_seq")]
    bindings: BTreeMap<(PartitionId, GroupMember), SessionId>,
}

/// Serializes a `BTreeMap` as a sequence of `(key, value)` pairs so that
/// non-string keys survive formats like JSON that require string map keys.
mod map_as_seq {
    use std::collections::BTreeMap;

    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<K, V, S>(map: &BTreeMap<K, V>, serializer: S) -> Result<S::Ok, S::Error>
    where
        K: Serialize,
        V: Serialize,
        S: Serializer,
    {
        serializer.collect_seq(map.iter())
    }

    pub fn deserialize<'de, K, V, D>(deserializer: D) -> Result<BTreeMap<K, V>, D::Error>
    where
        K: Deserialize<'de> + Ord,
        V: Deserialize<'de>,
        D: Deserializer<'de>,
    {
        let pairs = Vec::<(K, V)>::deserialize(deserializer)?;
        Ok(pairs.into_iter().collect())
    }
}

impl PrimaryElector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Enters `member` as a candidate for `partition`, keeping the
    /// candidacy alive for as long as `session` lives.
    ///
    /// The first candidate of an empty partition becomes its primary at
    /// term 1. A member that is already a candidate keeps its position and
    /// sequence numbers; only the session binding is refreshed, which also
    /// covers the member re-entering under a newer session after its old
    /// one was lost. Returns the recomputed term for the partition.
    pub fn enter(
        &mut self,
        partition: PartitionId,
        member: GroupMember,
        session: SessionId,
    ) -> Result<PrimaryTerm, ElectionError> {
        if member.id().as_str().is_empty() {
            return Err(ElectionError::EmptyMemberId);
        }
        if partition.namespace().is_empty() {
            return Err(ElectionError::InvalidPartition(partition));
        }
        if let Some(held) = self.sessions.get(&session) {
            let conflicting = held
                .iter()
                .any(|(p, m)| *p == partition && *m != member);
            if conflicting {
                return Err(ElectionError::SessionConflict { session, partition });
            }
        }

        // candidacy is keyed by member identity: if the member re-enters
        // under a different session, the old binding must not outlive it
        self.release_binding(&partition, &member, session);

        let ledger = self.ledgers.entry(partition.clone()).or_default();
        if ledger.enter(member.clone(), self.next_seq) {
            self.next_seq += 1;
        }
        let term = ledger.primary_term();
        debug!(
            partition = %partition,
            member = %member,
            term = term.term(),
            "candidate entered"
        );

        self.bindings
            .insert((partition.clone(), member.clone()), session);
        self.sessions
            .entry(session)
            .or_default()
            .insert((partition, member));
        Ok(term)
    }

    /// The current term for `partition`. A partition that has never seen a
    /// candidate yields the zero term.
    pub fn term(&self, partition: &PartitionId) -> PrimaryTerm {
        self.ledgers
            .get(partition)
            .map(PartitionLedger::primary_term)
            .unwrap_or_default()
    }

    /// Sweeps every candidacy `session` was keeping alive.
    ///
    /// For each affected partition the member is removed from the ledger;
    /// if it was the primary and other candidates remain, the partition
    /// moves to the next term. Returns the recomputed term for every
    /// partition that changed, in partition order, so the host can publish
    /// leadership changes. Expiring an unknown (or already expired) session
    /// is a no-op.
    pub fn expire(&mut self, session: SessionId) -> Vec<(PartitionId, PrimaryTerm)> {
        let Some(held) = self.sessions.remove(&session) else {
            return Vec::new();
        };
        let mut changed = Vec::new();
        for key in held {
            self.bindings.remove(&key);
            let (partition, member) = key;
            let Some(ledger) = self.ledgers.get_mut(&partition) else {
                continue;
            };
            if ledger.remove(&member) {
                let term = ledger.primary_term();
                debug!(
                    partition = %partition,
                    member = %member,
                    session = %session,
                    term = term.term(),
                    "candidate expired"
                );
                changed.push((partition, term));
            }
        }
        changed
    }

    /// Partitions that have seen at least one candidate, in order.
    pub fn partitions(&self) -> impl Iterator<Item = &PartitionId> {
        self.ledgers.keys()
    }

    fn release_binding(&mut self, partition: &PartitionId, member: &GroupMember, keep: SessionId) {
        let key = (partition.clone(), member.clone());
        let Some(old) = self.bindings.get(&key).copied() else {
            return;
        };
        if old == keep {
            return;
        }
        if let Some(held) = self.sessions.get_mut(&old) {
            held.remove(&key);
            if held.is_empty() {
                self.sessions.remove(&old);
            }
        }
    }
}
