//! primary-elector: deterministic primary election for partitioned clusters.
//!
//! This crate is the election core of a replicated cluster-primitive store:
//! for every partition it decides which member is the current *primary* and
//! in what order the remaining candidates stand by as *backups*. It is a
//! pure state machine — no clock, no randomness, no I/O — meant to be
//! driven by a consensus log so that every replica, applying the identical
//! command sequence, computes bit-identical results.
//!
//! # Architecture
//!
//! - **Candidacy**: members enter a partition bound to a liveness session;
//!   the first one in becomes primary at term 1.
//! - **Diversity ordering**: candidates are ordered round-robin across
//!   fault domains, so the backups right behind the primary sit in
//!   different racks or zones whenever possible.
//! - **Failover**: when a session expires, its member is swept from every
//!   partition; losing a primary advances that partition's term and
//!   promotes the next candidate in diversity order.
//! - **Host embedding**: [`ElectorStore`] hosts the elector as an openraft
//!   state machine with snapshot support and a watch channel for
//!   leadership-change notification.
//!
//! # Quick start
//!
//! ```rust
//! use primary_elector::{GroupMember, PartitionId, PrimaryElector, SessionId};
//!
//! let mut elector = PrimaryElector::new();
//! let partition = PartitionId::new("raft", 1);
//!
//! elector.enter(partition.clone(), GroupMember::grouped("a", "rack-1"), SessionId(1)).unwrap();
//! elector.enter(partition.clone(), GroupMember::grouped("b", "rack-2"), SessionId(2)).unwrap();
//!
//! let term = elector.term(&partition);
//! assert_eq!(term.primary(), Some(&GroupMember::grouped("a", "rack-1")));
//! assert_eq!(term.backups(1), &[GroupMember::grouped("b", "rack-2")]);
//! ```

mod command;
mod elector;
mod error;
mod ledger;
mod member;
mod partition;
mod store;
mod term;

pub use command::{ElectionCommand, ElectionResponse};
pub use elector::PrimaryElector;
pub use error::ElectionError;
pub use member::{GroupId, GroupMember, MemberId, SessionId};
pub use partition::PartitionId;
pub use store::{ElectorSnapshot, ElectorStore, TypeConfig};
pub use term::PrimaryTerm;
