//! Member, group, and session identity types.
//!
//! These are the identities the surrounding cluster hands to the elector:
//! the membership subsystem supplies [`GroupMember`]s, and the session
//! subsystem supplies [`SessionId`]s. The elector treats both as opaque —
//! it never validates liveness or reachability.

use serde::{Deserialize, Serialize};

/// Unique identifier for a cluster member.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MemberId(String);

impl MemberId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for MemberId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for MemberId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for MemberId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// Identifier for a fault domain (rack, zone, ...) that members share.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GroupId(String);

impl GroupId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for GroupId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for GroupId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for GroupId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// A member identity plus its optional fault-domain assignment.
///
/// Two members are equal iff both the member id and the group match. A
/// member without a group is *not* grouped together with other ungrouped
/// members: for diversity purposes each one forms a singleton group keyed
/// by its own member id.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct GroupMember {
    id: MemberId,
    group: Option<GroupId>,
}

impl GroupMember {
    /// Creates a member with no group assignment.
    pub fn new(id: impl Into<MemberId>) -> Self {
        Self {
            id: id.into(),
            group: None,
        }
    }

    /// Creates a member assigned to a fault domain.
    pub fn grouped(id: impl Into<MemberId>, group: impl Into<GroupId>) -> Self {
        Self {
            id: id.into(),
            group: Some(group.into()),
        }
    }

    pub fn id(&self) -> &MemberId {
        &self.id
    }

    pub fn group(&self) -> Option<&GroupId> {
        self.group.as_ref()
    }

    /// The key this member's group is bucketed under when ordering
    /// candidates. Ungrouped members key on their own id so they never
    /// merge with each other.
    pub(crate) fn group_key(&self) -> (bool, &str) {
        match &self.group {
            Some(group) => (true, group.as_str()),
            None => (false, self.id.as_str()),
        }
    }
}

impl std::fmt::Display for GroupMember {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.group {
            Some(group) => write!(f, "{}/{}", self.id, group),
            None => write!(f, "{}", self.id),
        }
    }
}

/// Opaque identifier of an external session.
///
/// The session subsystem owns session identity and liveness; the elector
/// only correlates candidacies with this id so it can sweep them when the
/// host reports the session expired.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct SessionId(pub u64);

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn equality_includes_group() {
        assert_eq!(GroupMember::new("a"), GroupMember::new("a"));
        assert_ne!(GroupMember::new("a"), GroupMember::grouped("a", "rack-1"));
        assert_ne!(
            GroupMember::grouped("a", "rack-1"),
            GroupMember::grouped("a", "rack-2")
        );
    }

    #[test]
    fn ungrouped_members_never_share_a_group() {
        let a = GroupMember::new("a");
        let b = GroupMember::new("b");
        assert_ne!(a.group_key(), b.group_key());
    }

    #[test]
    fn grouped_members_share_a_group_key() {
        let a = GroupMember::grouped("a", "rack-1");
        let b = GroupMember::grouped("b", "rack-1");
        assert_eq!(a.group_key(), b.group_key());
    }

    #[test]
    fn group_key_distinguishes_group_from_member_names() {
        // a group named "x" must not collide with an ungrouped member "x"
        let grouped = GroupMember::grouped("a", "x");
        let ungrouped = GroupMember::new("x");
        assert_ne!(grouped.group_key(), ungrouped.group_key());
    }

    #[test]
    fn display_formats() {
        assert_eq!(GroupMember::new("a").to_string(), "a");
        assert_eq!(GroupMember::grouped("a", "rack-1").to_string(), "a/rack-1");
    }
}
