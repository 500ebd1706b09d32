//! Per-partition candidate bookkeeping and the group-diverse ordering.
//!
//! Each partition keeps a ledger of every member that has entered
//! candidacy. The candidate order handed to callers is *not* plain FIFO:
//! candidates from distinct fault domains are interleaved, so the members
//! right behind the primary come from different domains whenever possible.
//! Losing one rack or zone then leaves a partition with viable backups
//! elsewhere.
//!
//! The record list *is* the candidate order. A new entrant is placed by
//! depth: all groups contribute their first member before any group
//! contributes its second, groups ordered by first appearance within each
//! depth. An entrant lands behind every candidate of lesser depth and
//! behind earlier-seen groups at its own depth, which can never be ahead
//! of the head of the list — entering a live partition never changes the
//! sitting primary. Removal deletes the record in place; survivors keep
//! their positions rather than sliding up into the vacated group slot, so
//! a failover promotes the head of the existing backup order. Ordering
//! never consults container iteration state, so every replica computes the
//! identical order from the same command history.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::member::GroupMember;
use crate::term::PrimaryTerm;

/// One member's candidacy within a partition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) struct CandidateRecord {
    member: GroupMember,
    /// Sequence assigned when the member first entered this partition.
    entry_seq: u64,
    /// `entry_seq` of the first member of this member's group to enter the
    /// partition. Orders the groups themselves within one depth.
    group_seq: u64,
}

/// Candidate ledger and term counter for one partition.
///
/// `records` is kept in candidate order: index 0 is the primary, the rest
/// are the backups in promotion order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) struct PartitionLedger {
    term: u64,
    records: Vec<CandidateRecord>,
}

impl PartitionLedger {
    pub fn contains(&self, member: &GroupMember) -> bool {
        self.records.iter().any(|r| &r.member == member)
    }

    /// Registers `member` as a candidate with the given entry sequence.
    ///
    /// Re-entering an existing candidate is a no-op: its position and
    /// sequence numbers are preserved. The first entry into an empty ledger
    /// establishes term 1, which also resets the term after the ledger
    /// emptied out — terms restart whenever the candidate set refills from
    /// empty. Entering a non-empty ledger never moves the member at
    /// position 0: insertions cannot change the primary or the term.
    ///
    /// Returns `true` if the ledger changed (and `entry_seq` was consumed).
    pub fn enter(&mut self, member: GroupMember, entry_seq: u64) -> bool {
        if self.contains(&member) {
            return false;
        }
        let group_mates = || {
            self.records
                .iter()
                .filter(|r| r.member.group_key() == member.group_key())
        };
        let group_seq = group_mates()
            .map(|r| r.group_seq)
            .next()
            .unwrap_or(entry_seq);
        let depth = group_mates().count();
        if self.records.is_empty() {
            self.term = 1;
        }
        let position = self.insertion_point(depth, group_seq);
        self.records.insert(
            position,
            CandidateRecord {
                member,
                entry_seq,
                group_seq,
            },
        );
        true
    }

    /// Removes `member` from the ledger.
    ///
    /// The survivors keep their positions: the new order is the prior order
    /// with one entry deleted. If the removed member was the primary and
    /// other candidates remain, the term increments by one. Removing a
    /// non-primary, or the last remaining candidate, leaves the term
    /// untouched.
    ///
    /// Returns `true` if the member was present.
    pub fn remove(&mut self, member: &GroupMember) -> bool {
        let Some(position) = self.records.iter().position(|r| &r.member == member) else {
            return false;
        };
        self.records.remove(position);
        if position == 0 && !self.records.is_empty() {
            self.term += 1;
        }
        true
    }

    /// The current view: term plus candidates in diversity order.
    pub fn primary_term(&self) -> PrimaryTerm {
        let candidates = self.records.iter().map(|r| r.member.clone()).collect();
        PrimaryTerm::new(self.term, candidates)
    }

    /// Where a new entrant with the given group depth and group sequence
    /// belongs: behind every candidate of lesser depth, and within its own
    /// depth behind every group seen earlier. A candidate's depth is its
    /// current rank among its live group mates, counted off the list as it
    /// stands.
    fn insertion_point(&self, depth: usize, group_seq: u64) -> usize {
        let mut group_rank: BTreeMap<(bool, &str), usize> = BTreeMap::new();
        for (index, record) in self.records.iter().enumerate() {
            let rank = group_rank.entry(record.member.group_key()).or_insert(0);
            if (*rank, record.group_seq) > (depth, group_seq) {
                return index;
            }
            *rank += 1;
        }
        self.records.len()
    }
}
