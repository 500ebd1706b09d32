//! The derived, read-only view of one partition's election outcome.

use serde::{Deserialize, Serialize};

use crate::member::GroupMember;

/// A partition's current term, primary, and full candidate order.
///
/// This is a view recomputed from the partition's ledger on every query,
/// never mutated in place. `candidates` is the group-diverse order: the
/// primary first, then members spread across distinct fault domains before
/// any domain repeats.
///
/// A partition that has never seen a candidate yields the zero term:
/// term 0, no primary, no candidates. Callers must treat that as "no
/// election has occurred", not as an error.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrimaryTerm {
    term: u64,
    candidates: Vec<GroupMember>,
}

impl PrimaryTerm {
    pub(crate) fn new(term: u64, candidates: Vec<GroupMember>) -> Self {
        Self { term, candidates }
    }

    /// The term number. Zero iff no election has occurred.
    pub fn term(&self) -> u64 {
        self.term
    }

    /// The current primary. Always the first candidate when any exist.
    pub fn primary(&self) -> Option<&GroupMember> {
        self.candidates.first()
    }

    /// All candidates in diversity order; `candidates()[0]` is the primary.
    pub fn candidates(&self) -> &[GroupMember] {
        &self.candidates
    }

    /// Up to `count` backups: the members immediately following the primary
    /// in diversity order. Fewer are returned if not enough candidates
    /// exist; empty if there are zero or one candidates or `count` is zero.
    pub fn backups(&self, count: usize) -> &[GroupMember] {
        if self.candidates.len() <= 1 || count == 0 {
            return &[];
        }
        let end = count.saturating_add(1).min(self.candidates.len());
        &self.candidates[1..end]
    }
}
