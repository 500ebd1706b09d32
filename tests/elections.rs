//! End-to-end exercises of the public election surface.

use primary_elector::{
    ElectionCommand, ElectionResponse, GroupMember, PartitionId, PrimaryElector, SessionId,
};

fn partition() -> PartitionId {
    PartitionId::new("elections", 1)
}

fn grouped(i: u64) -> GroupMember {
    GroupMember::grouped(format!("m{i}"), format!("g{}", i / 3))
}

/// Builds the nine-member, three-group fixture: members m0..m8 entered in
/// order, member i in group i/3, each bound to session i.
fn three_groups_of_three() -> PrimaryElector {
    let mut elector = PrimaryElector::new();
    for i in 0..9 {
        elector
            .enter(partition(), grouped(i), SessionId(i))
            .unwrap();
    }
    elector
}

fn ids(members: &[GroupMember]) -> Vec<&str> {
    members.iter().map(|m| m.id().as_str()).collect()
}

#[test]
fn single_candidate_becomes_primary() {
    let mut elector = PrimaryElector::new();
    let term = elector
        .enter(partition(), GroupMember::new("node-a"), SessionId(1))
        .unwrap();
    assert_eq!(term.term(), 1);
    assert_eq!(term.primary(), Some(&GroupMember::new("node-a")));
    assert_eq!(term.candidates(), &[GroupMember::new("node-a")]);
}

#[test]
fn second_candidate_lines_up_behind_the_first() {
    let mut elector = PrimaryElector::new();
    elector
        .enter(partition(), GroupMember::new("node-a"), SessionId(1))
        .unwrap();
    let term = elector
        .enter(partition(), GroupMember::new("node-b"), SessionId(2))
        .unwrap();
    assert_eq!(term.term(), 1);
    assert_eq!(term.primary(), Some(&GroupMember::new("node-a")));
    assert_eq!(term.backups(2), &[GroupMember::new("node-b")]);
}

#[test]
fn candidates_interleave_across_groups() {
    let elector = three_groups_of_three();
    let term = elector.term(&partition());
    assert_eq!(term.term(), 1);
    assert_eq!(
        ids(term.candidates()),
        ["m0", "m3", "m6", "m1", "m4", "m7", "m2", "m5", "m8"]
    );
    assert_eq!(ids(term.backups(2)), ["m3", "m6"]);
}

#[test]
fn losing_the_primary_advances_the_term() {
    let mut elector = three_groups_of_three();
    elector.expire(SessionId(0)); // m0's session

    let term = elector.term(&partition());
    assert_eq!(term.term(), 2);
    assert_eq!(term.primary(), Some(&grouped(3)));
    assert_eq!(term.candidates().len(), 8);
    assert_eq!(ids(term.backups(2)), ["m6", "m1"]);
}

#[test]
fn losing_a_backup_leaves_the_term_alone() {
    let mut elector = three_groups_of_three();
    elector.expire(SessionId(0));
    elector.expire(SessionId(6)); // m6 is a backup by now

    let term = elector.term(&partition());
    assert_eq!(term.term(), 2);
    assert_eq!(term.primary(), Some(&grouped(3)));
    assert_eq!(term.candidates().len(), 7);
    assert_eq!(ids(term.backups(2)), ["m1", "m4"]);
}

#[test]
fn new_entrants_never_change_the_sitting_primary() {
    let mut elector = three_groups_of_three();
    elector.expire(SessionId(0)); // primary now m3 at term 2
    let before = elector.term(&partition());

    let term = elector
        .enter(partition(), GroupMember::grouped("fresh", "g9"), SessionId(100))
        .unwrap();
    assert_eq!(term.term(), before.term());
    assert_eq!(term.primary(), before.primary());
    assert_eq!(term.candidates().len(), before.candidates().len() + 1);
}

#[test]
fn backups_span_distinct_groups_while_available() {
    let elector = three_groups_of_three();
    let term = elector.term(&partition());
    // with 3 groups, the first 2 backups must come from 2 distinct groups,
    // neither of them the primary's
    let primary_group = term.primary().unwrap().group().unwrap();
    let backup_groups: Vec<_> = term
        .backups(2)
        .iter()
        .map(|m| m.group().unwrap())
        .collect();
    assert_ne!(backup_groups[0], backup_groups[1]);
    assert!(!backup_groups.contains(&primary_group));
}

#[test]
fn command_stream_replays_deterministically() {
    let commands: Vec<ElectionCommand> = (0..9)
        .map(|i| ElectionCommand::Enter {
            partition: partition(),
            member: grouped(i),
            session: SessionId(i),
        })
        .chain([
            ElectionCommand::ExpireSession { session: SessionId(0) },
            ElectionCommand::GetTerm { partition: partition() },
            ElectionCommand::ExpireSession { session: SessionId(6) },
            ElectionCommand::ExpireSession { session: SessionId(6) },
        ])
        .collect();

    let mut first = PrimaryElector::new();
    let mut second = PrimaryElector::new();
    let first_responses: Vec<ElectionResponse> =
        commands.iter().map(|c| first.apply(c)).collect();
    let second_responses: Vec<ElectionResponse> =
        commands.iter().map(|c| second.apply(c)).collect();

    assert_eq!(first_responses, second_responses);
    assert_eq!(first, second);
    assert_eq!(
        serde_json::to_vec(&first).unwrap(),
        serde_json::to_vec(&second).unwrap()
    );
}

#[test]
fn every_returned_term_keeps_primary_at_position_zero() {
    let mut elector = PrimaryElector::new();
    for i in 0..9 {
        let term = elector
            .enter(partition(), grouped(i), SessionId(i))
            .unwrap();
        assert_eq!(term.primary(), term.candidates().first());
    }
    for i in [0, 4, 7] {
        elector.expire(SessionId(i));
        let term = elector.term(&partition());
        assert_eq!(term.primary(), term.candidates().first());
    }
}

#[test]
fn term_never_decreases_while_candidates_remain() {
    let mut elector = three_groups_of_three();
    let mut last_term = elector.term(&partition()).term();
    for i in 0..8 {
        elector.expire(SessionId(i));
        let term = elector.term(&partition());
        assert!(term.term() >= last_term);
        last_term = term.term();
    }
    // the term advanced only when the sitting primary was removed:
    // m0 (term 2), m3 (3), m6 (4), m7 (5)
    assert_eq!(last_term, 5);
    assert_eq!(elector.term(&partition()).candidates().len(), 1);
}

#[test]
fn partition_refill_restarts_terms() {
    let mut elector = PrimaryElector::new();
    for i in 0..3 {
        elector
            .enter(partition(), grouped(i), SessionId(i))
            .unwrap();
    }
    for i in 0..3 {
        elector.expire(SessionId(i));
    }
    // ledger emptied at term 3; a fresh entrant restarts at 1
    assert_eq!(elector.term(&partition()).term(), 3);
    let term = elector
        .enter(partition(), GroupMember::new("fresh"), SessionId(100))
        .unwrap();
    assert_eq!(term.term(), 1);
    assert_eq!(term.primary(), Some(&GroupMember::new("fresh")));
}

#[test]
fn sessions_sweep_across_partitions() {
    let other = PartitionId::new("elections", 2);
    let mut elector = PrimaryElector::new();
    elector
        .enter(partition(), GroupMember::new("a"), SessionId(1))
        .unwrap();
    elector
        .enter(other.clone(), GroupMember::new("a"), SessionId(1))
        .unwrap();
    elector
        .enter(partition(), GroupMember::new("b"), SessionId(2))
        .unwrap();

    let changed = elector.expire(SessionId(1));
    assert_eq!(changed.len(), 2);
    assert_eq!(
        elector.term(&partition()).primary(),
        Some(&GroupMember::new("b"))
    );
    assert!(elector.term(&other).primary().is_none());
}
