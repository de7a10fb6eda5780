//! A single member of the organization.
//!
//! A member only stores ids for the members it is linked to. Every mutation
//! that touches more than one member goes through [`Roster`](crate::Roster),
//! which keeps the superior link and the superior's subordinate set in
//! agreement.

use std::cmp::Reverse;

use indexmap::IndexSet;

use cosca_protocol::{MemberId, MemberProfile, ROOT_LEVEL};

/// A node in the organization hierarchy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Member {
    id: MemberId,
    pub(crate) age: u32,
    /// Distance from the godfather.
    pub(crate) level: u32,
    /// Direct superior. `None` for the godfather.
    pub(crate) superior: Option<MemberId>,
    /// Direct subordinates in the order they joined.
    pub(crate) subordinates: IndexSet<MemberId>,
    /// Member promoted into this one's position while it is jailed.
    pub(crate) alternate: Option<MemberId>,
}

impl Member {
    /// Create a detached member with no superior and no subordinates.
    pub fn new(id: impl Into<MemberId>, age: u32) -> Self {
        Self {
            id: id.into(),
            age,
            level: ROOT_LEVEL,
            superior: None,
            subordinates: IndexSet::new(),
            alternate: None,
        }
    }

    pub fn id(&self) -> MemberId {
        self.id
    }

    pub fn age(&self) -> u32 {
        self.age
    }

    pub fn level(&self) -> u32 {
        self.level
    }

    pub fn superior(&self) -> Option<MemberId> {
        self.superior
    }

    pub fn alternate(&self) -> Option<MemberId> {
        self.alternate
    }

    /// Direct subordinates, in insertion order.
    pub fn subordinates(&self) -> impl Iterator<Item = MemberId> + '_ {
        self.subordinates.iter().copied()
    }

    pub fn subordinate_count(&self) -> usize {
        self.subordinates.len()
    }

    pub fn has_subordinate(&self, id: MemberId) -> bool {
        self.subordinates.contains(&id)
    }

    /// True iff this member reports to nobody.
    pub fn is_godfather(&self) -> bool {
        self.superior.is_none()
    }

    /// Ranking key: lower level first, then greater age, then larger id.
    ///
    /// Larger keys are more senior.
    pub fn seniority(&self) -> (Reverse<u32>, u32, MemberId) {
        (Reverse(self.level), self.age, self.id)
    }

    /// Flat serializable view of this member.
    pub fn profile(&self) -> MemberProfile {
        MemberProfile {
            id: self.id,
            age: self.age,
            level: self.level,
            superior: self.superior,
            subordinates: self.subordinates().collect(),
            alternate: self.alternate,
        }
    }
}
