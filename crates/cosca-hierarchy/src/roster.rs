//! Arena of members and the structural operations on them.
//!
//! Members are addressed by [`MemberId`]. The subordinate set is the owning
//! relation; the superior link is a plain id used for lookups. Levels are
//! recomputed for the whole affected subtree on every reattachment, following
//! only edges where the child's superior link points back at the parent.

use indexmap::IndexMap;

use cosca_protocol::{MemberId, MAX_HIERARCHY_DEPTH};

use crate::member::Member;
use crate::HierarchyError;

/// Every member ever admitted to the organization, active or jailed.
#[derive(Debug, Clone, Default)]
pub struct Roster {
    members: IndexMap<MemberId, Member>,
}

impl Roster {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a member, replacing any previous record with the same id.
    pub fn insert(&mut self, member: Member) -> &Member {
        let id = member.id();
        self.members.insert(id, member);
        &self.members[&id]
    }

    pub fn get(&self, id: MemberId) -> Option<&Member> {
        self.members.get(&id)
    }

    pub fn contains(&self, id: MemberId) -> bool {
        self.members.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// All members in admission order.
    pub fn iter(&self) -> impl Iterator<Item = &Member> {
        self.members.values()
    }

    /// Snapshot of a member's direct subordinate ids.
    pub fn subordinate_ids(&self, id: MemberId) -> Vec<MemberId> {
        self.members
            .get(&id)
            .map(|m| m.subordinates().collect())
            .unwrap_or_default()
    }

    fn member(&self, id: MemberId) -> Result<&Member, HierarchyError> {
        self.members
            .get(&id)
            .ok_or(HierarchyError::MemberNotFound(id))
    }

    fn member_mut(&mut self, id: MemberId) -> Result<&mut Member, HierarchyError> {
        self.members
            .get_mut(&id)
            .ok_or(HierarchyError::MemberNotFound(id))
    }

    /// Point `id` at a new superior.
    ///
    /// With `Some(boss)` the member is inserted into the boss's subordinate
    /// set and its subtree relevelled under the boss. With `None` the link is
    /// cleared and the level left as it is. The member is never removed from
    /// a previous superior's set here.
    pub fn set_boss(&mut self, id: MemberId, boss: Option<MemberId>) -> Result<(), HierarchyError> {
        match boss {
            Some(boss_id) => {
                self.member(boss_id)?;
                self.member_mut(id)?.superior = Some(boss_id);
                self.add_subordinate(boss_id, id)?;
            }
            None => {
                self.member_mut(id)?.superior = None;
            }
        }
        Ok(())
    }

    /// Insert `sub` into `boss`'s subordinate set one level below it.
    ///
    /// Re-adding an existing subordinate keeps its position in the set.
    /// Returns the subordinate id.
    pub fn add_subordinate(&mut self, boss: MemberId, sub: MemberId) -> Result<MemberId, HierarchyError> {
        let level = self.member(boss)?.level() + 1;
        self.member(sub)?;

        self.member_mut(boss)?.subordinates.insert(sub);
        self.member_mut(sub)?.level = level;
        self.relevel_subtree(sub)?;
        Ok(sub)
    }

    /// Remove `sub` from `boss`'s subordinate set.
    ///
    /// Removing a member that is not there is a no-op. Returns the boss id
    /// for chaining, or `None` if the boss itself is unknown.
    pub fn remove_subordinate(&mut self, boss: MemberId, sub: MemberId) -> Option<MemberId> {
        let member = self.members.get_mut(&boss)?;
        member.subordinates.shift_remove(&sub);
        Some(boss)
    }

    /// Force a member's level and relevel everything that reports to it.
    pub fn set_level(&mut self, id: MemberId, level: u32) -> Result<(), HierarchyError> {
        self.member_mut(id)?.level = level;
        self.relevel_subtree(id)
    }

    /// Replace a member's alternate slot, returning the previous occupant.
    pub fn set_alternate(
        &mut self,
        id: MemberId,
        alternate: Option<MemberId>,
    ) -> Result<Option<MemberId>, HierarchyError> {
        let member = self.member_mut(id)?;
        Ok(std::mem::replace(&mut member.alternate, alternate))
    }

    /// Eldest direct subordinate of `boss` not matched by `is_excluded`.
    ///
    /// Subordinates are scanned in insertion order. The first eligible one
    /// seeds the result and a later one replaces it only when strictly
    /// older, so the earliest of equally old candidates wins.
    pub fn oldest_subordinate<F>(&self, boss: MemberId, is_excluded: F) -> Option<&Member>
    where
        F: Fn(&MemberId) -> bool,
    {
        let boss = self.members.get(&boss)?;
        let mut oldest: Option<&Member> = None;

        for sub_id in boss.subordinates.iter() {
            if is_excluded(sub_id) {
                continue;
            }
            let Some(sub) = self.members.get(sub_id) else {
                continue;
            };
            match oldest {
                None => oldest = Some(sub),
                Some(current) if sub.age() > current.age() => oldest = Some(sub),
                Some(_) => {}
            }
        }

        oldest
    }

    /// Direct subordinate count plus each subordinate's own count.
    pub fn count_all_subordinates(&self, id: MemberId) -> usize {
        let Some(member) = self.members.get(&id) else {
            return 0;
        };
        member.subordinate_count()
            + member
                .subordinates()
                .map(|sub| self.count_all_subordinates(sub))
                .sum::<usize>()
    }

    /// True if `ancestor` is reachable from `id` by following superior links.
    pub fn is_ancestor(&self, ancestor: MemberId, id: MemberId) -> bool {
        let mut current = self.members.get(&id).and_then(Member::superior);
        let mut steps = 0;

        while let Some(boss) = current {
            if boss == ancestor {
                return true;
            }
            steps += 1;
            if steps > MAX_HIERARCHY_DEPTH {
                break;
            }
            current = self.members.get(&boss).and_then(Member::superior);
        }

        false
    }

    /// Recompute levels below `id` from its current level.
    fn relevel_subtree(&mut self, id: MemberId) -> Result<(), HierarchyError> {
        let mut stack = vec![(id, 0u32)];

        while let Some((parent_id, depth)) = stack.pop() {
            if depth > MAX_HIERARCHY_DEPTH {
                return Err(HierarchyError::MaxDepthExceeded(MAX_HIERARCHY_DEPTH));
            }
            let Some(parent) = self.members.get(&parent_id) else {
                continue;
            };
            let child_level = parent.level() + 1;
            let children: Vec<MemberId> = parent.subordinates().collect();

            for child_id in children {
                if let Some(child) = self.members.get_mut(&child_id) {
                    if child.superior == Some(parent_id) {
                        child.level = child_level;
                        stack.push((child_id, depth + 1));
                    }
                }
            }
        }

        Ok(())
    }
}
