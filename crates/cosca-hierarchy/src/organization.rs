//! The organization: godfather, active members and the jail.
//!
//! Incarceration protocol:
//! 1. The member moves from the active index to the jail
//! 2. A replacement is selected (see [`crate::succession`])
//! 3. A promoted replacement takes the jailed member's superior and level,
//!    leaves the jailed member's subordinate set and is recorded as its
//!    alternate; a jailed godfather hands over the top spot
//! 4. Every remaining direct report moves under the replacement
//!
//! The jailed member keeps its superior link and its own subordinate set.
//! Release walks that record to pull every report back, after demoting the
//! alternate back to a direct report. When releases come out of order, a
//! recorded member that now sits above the released one keeps its place.
//!
//! Both mutations run against a checkpoint and are undone on error.

use chrono::{DateTime, Utc};
use indexmap::{IndexMap, IndexSet};

use cosca_protocol::{ChartNode, MemberId, MemberProfile, ROOT_LEVEL};

use crate::config::{OrganizationConfig, OrphanPolicy};
use crate::member::Member;
use crate::roster::Roster;
use crate::succession::{self, Reinstatement, Replacement, Succession};
use crate::HierarchyError;

/// A hierarchy of members under a single godfather.
#[derive(Debug, Clone)]
pub struct Organization {
    /// Current godfather.
    root: MemberId,
    /// Every member ever admitted.
    roster: Roster,
    /// Free members, in admission order.
    active: IndexSet<MemberId>,
    /// Jailed members, in the order they were jailed.
    jailed: IndexMap<MemberId, Confinement>,
    config: OrganizationConfig,
}

#[derive(Debug, Clone, Copy)]
struct Confinement {
    since: DateTime<Utc>,
    /// The member was the godfather when it was jailed.
    held_top: bool,
}

/// Organization state captured before a mutation.
struct Checkpoint {
    root: MemberId,
    roster: Roster,
    active: IndexSet<MemberId>,
    jailed: IndexMap<MemberId, Confinement>,
}

impl Organization {
    /// Found an organization around its godfather, with default config.
    pub fn new(godfather: Member) -> Self {
        Self::with_config(godfather, OrganizationConfig::default())
    }

    pub fn with_config(godfather: Member, config: OrganizationConfig) -> Self {
        let root = godfather.id();
        let mut roster = Roster::new();
        roster.insert(godfather);

        let mut active = IndexSet::new();
        active.insert(root);

        tracing::debug!(godfather = %root, "Organization founded");

        Self {
            root,
            roster,
            active,
            jailed: IndexMap::new(),
            config,
        }
    }

    pub fn config(&self) -> &OrganizationConfig {
        &self.config
    }

    /// Read-only access to every member, active or jailed.
    pub fn roster(&self) -> &Roster {
        &self.roster
    }

    pub fn root_id(&self) -> MemberId {
        self.root
    }

    /// The current godfather.
    pub fn root(&self) -> &Member {
        self.roster
            .get(self.root)
            .expect("godfather is always in the roster")
    }

    /// Admit a member to the active index.
    ///
    /// A member already admitted under the same id keeps its stored record;
    /// the duplicate is ignored. Jailed ids are refused.
    pub fn add_member(&mut self, member: Member) -> Result<&Member, HierarchyError> {
        let id = member.id();
        if self.jailed.contains_key(&id) {
            return Err(HierarchyError::AlreadyJailed(id));
        }

        if self.roster.contains(id) {
            tracing::warn!(member = %id, "Member already admitted, keeping stored record");
        } else {
            self.roster.insert(member);
        }
        self.active.insert(id);

        self.roster.get(id).ok_or(HierarchyError::MemberNotFound(id))
    }

    /// Place an active member under `boss`, or detach it with `None`.
    ///
    /// The member leaves its previous superior's subordinate set first.
    pub fn attach(&mut self, id: MemberId, boss: Option<MemberId>) -> Result<(), HierarchyError> {
        self.ensure_active(id)?;
        if let Some(boss_id) = boss {
            self.ensure_active(boss_id)?;
            if id == self.root {
                return Err(HierarchyError::RootImmovable(id));
            }
            if boss_id == id || self.roster.is_ancestor(id, boss_id) {
                return Err(HierarchyError::CycleDetected {
                    member: id,
                    boss: boss_id,
                });
            }
        }

        if let Some(previous) = self.roster.get(id).and_then(Member::superior) {
            self.roster.remove_subordinate(previous, id);
        }
        self.roster.set_boss(id, boss)
    }

    /// Create a member and attach it under an active boss in one step.
    pub fn recruit(&mut self, id: impl Into<MemberId>, age: u32, boss: MemberId) -> Result<&Member, HierarchyError> {
        let id = id.into();
        self.ensure_active(boss)?;
        self.add_member(Member::new(id, age))?;
        self.attach(id, Some(boss))?;
        self.roster.get(id).ok_or(HierarchyError::MemberNotFound(id))
    }

    /// Active member by id. Jailed and unknown ids yield `None`.
    pub fn get_member(&self, id: MemberId) -> Option<&Member> {
        if self.active.contains(&id) {
            self.roster.get(id)
        } else {
            None
        }
    }

    /// Jailed member by id.
    pub fn jailed_member(&self, id: MemberId) -> Option<&Member> {
        if self.jailed.contains_key(&id) {
            self.roster.get(id)
        } else {
            None
        }
    }

    pub fn is_jailed(&self, id: MemberId) -> bool {
        self.jailed.contains_key(&id)
    }

    pub fn jailed_since(&self, id: MemberId) -> Option<DateTime<Utc>> {
        self.jailed.get(&id).map(|c| c.since)
    }

    /// Active members in admission order.
    pub fn active_members(&self) -> impl Iterator<Item = &Member> {
        self.active.iter().filter_map(|id| self.roster.get(*id))
    }

    /// Jailed members in the order they were jailed.
    pub fn jailed_members(&self) -> impl Iterator<Item = &Member> {
        self.jailed.keys().filter_map(|id| self.roster.get(*id))
    }

    /// Number of members ever admitted.
    pub fn len(&self) -> usize {
        self.roster.len()
    }

    pub fn is_empty(&self) -> bool {
        self.roster.is_empty()
    }

    pub fn count_all_subordinates(&self, id: MemberId) -> usize {
        self.roster.count_all_subordinates(id)
    }

    pub fn profile(&self, id: MemberId) -> Option<MemberProfile> {
        self.roster.get(id).map(Member::profile)
    }

    /// Send an active member to prison and repair the hierarchy around it.
    ///
    /// Either every step applies or, on error, the organization is left
    /// exactly as it was.
    pub fn send_to_prison(&mut self, id: MemberId) -> Result<Succession, HierarchyError> {
        if self.jailed.contains_key(&id) {
            return Err(HierarchyError::AlreadyJailed(id));
        }
        if !self.active.contains(&id) {
            return Err(HierarchyError::MemberNotFound(id));
        }
        self.atomically(|org| org.incarcerate(id))
    }

    fn incarcerate(&mut self, id: MemberId) -> Result<Succession, HierarchyError> {
        let member = self.roster.get(id).ok_or(HierarchyError::MemberNotFound(id))?;
        let was_godfather = id == self.root;
        let former_superior = member.superior();
        let former_level = member.level();

        let jailed_at = Utc::now();
        self.jailed.insert(
            id,
            Confinement {
                since: jailed_at,
                held_top: was_godfather,
            },
        );
        self.active.shift_remove(&id);

        let replacement = {
            let jailed = &self.jailed;
            succession::select_replacement(&self.roster, id, |m| jailed.contains_key(m))
        };

        if replacement.is_none() {
            let orphans = self.roster.subordinate_ids(id);
            let reject = was_godfather
                || (!orphans.is_empty()
                    && self.config.succession.orphan_policy == OrphanPolicy::Reject);

            if reject {
                tracing::warn!(member = %id, godfather = was_godfather, "No successor available, incarceration refused");
                return Err(HierarchyError::NoSuccessor(id));
            }
            if !orphans.is_empty() {
                tracing::warn!(
                    member = %id,
                    orphans = orphans.len(),
                    "No successor available, reports stay with the jailed member"
                );
            }
        }

        let mut new_godfather = None;
        if let Some(Replacement::Promoted(promoted)) = replacement {
            if was_godfather {
                self.root = promoted;
                new_godfather = Some(promoted);
            }
            self.roster.set_boss(promoted, former_superior)?;
            self.roster.set_level(promoted, former_level)?;
            self.roster.remove_subordinate(id, promoted);
            self.roster.set_alternate(id, Some(promoted))?;

            tracing::debug!(
                jailed = %id,
                promoted = %promoted,
                level = former_level,
                "Subordinate promoted into vacated position"
            );
        }

        let mut reassigned = Vec::new();
        if let Some(successor) = replacement.map(|r| r.member_id()) {
            reassigned = self.roster.subordinate_ids(id);
            for sub in &reassigned {
                self.roster.set_boss(*sub, Some(successor))?;
            }
        }

        tracing::info!(
            member = %id,
            replacement = ?replacement,
            reassigned = reassigned.len(),
            "Member sent to prison"
        );

        Ok(Succession {
            jailed: id,
            replacement,
            reassigned,
            new_godfather,
            jailed_at,
        })
    }

    /// Release a jailed member and restore the structure it left behind.
    ///
    /// Members that have since risen above the released member stay where
    /// they are and drop out of its record. On error nothing changes and the
    /// member stays jailed.
    pub fn release_from_prison(&mut self, id: MemberId) -> Result<Reinstatement, HierarchyError> {
        if !self.jailed.contains_key(&id) {
            return Err(if self.active.contains(&id) {
                HierarchyError::NotJailed(id)
            } else {
                HierarchyError::MemberNotFound(id)
            });
        }
        self.atomically(|org| org.reinstate(id))
    }

    fn reinstate(&mut self, id: MemberId) -> Result<Reinstatement, HierarchyError> {
        let confinement = self
            .jailed
            .shift_remove(&id)
            .ok_or(HierarchyError::NotJailed(id))?;
        let member = self.roster.get(id).ok_or(HierarchyError::MemberNotFound(id))?;

        // Reclaimed by another release in the meantime: back in the ranks.
        let restored_godfather = confinement.held_top && member.is_godfather();
        let displaced_root = self.root;

        if restored_godfather {
            self.root = id;
            self.roster.set_level(id, ROOT_LEVEL)?;
        }

        let mut recovered_alternate = self.roster.set_alternate(id, None)?;
        if let Some(alternate) = recovered_alternate {
            if self.outranks(alternate, id) {
                tracing::debug!(member = %id, alternate = %alternate, "Alternate now outranks the released member, left in place");
                recovered_alternate = None;
            } else {
                self.roster.add_subordinate(id, alternate)?;
            }
        }

        let mut reclaimed = Vec::new();
        for sub in self.roster.subordinate_ids(id) {
            if self.outranks(sub, id) {
                self.roster.remove_subordinate(id, sub);
                continue;
            }
            let current = self.roster.get(sub).and_then(Member::superior);
            if let Some(current) = current.filter(|boss| *boss != id) {
                self.roster.remove_subordinate(current, sub);
            }
            self.roster.set_boss(sub, Some(id))?;
            reclaimed.push(sub);
        }

        if restored_godfather && displaced_root != id {
            let still_on_top = self
                .roster
                .get(displaced_root)
                .is_some_and(Member::is_godfather);
            if still_on_top {
                self.roster.set_boss(displaced_root, Some(id))?;
                reclaimed.push(displaced_root);
            }
        }

        self.active.insert(id);

        tracing::info!(
            member = %id,
            godfather = restored_godfather,
            alternate = ?recovered_alternate,
            reclaimed = reclaimed.len(),
            "Member released from prison"
        );

        Ok(Reinstatement {
            released: id,
            recovered_alternate,
            reclaimed,
            restored_godfather,
            jailed_at: confinement.since,
            released_at: Utc::now(),
        })
    }

    /// True if `candidate` is the godfather or sits above `id`.
    fn outranks(&self, candidate: MemberId, id: MemberId) -> bool {
        candidate == self.root || self.roster.is_ancestor(candidate, id)
    }

    /// Run a mutation, restoring the previous state if it fails.
    fn atomically<T>(
        &mut self,
        op: impl FnOnce(&mut Self) -> Result<T, HierarchyError>,
    ) -> Result<T, HierarchyError> {
        let checkpoint = self.checkpoint();
        let result = op(self);
        if let Err(error) = &result {
            tracing::debug!(%error, "Mutation failed, state restored");
            self.restore(checkpoint);
        }
        result
    }

    fn checkpoint(&self) -> Checkpoint {
        Checkpoint {
            root: self.root,
            roster: self.roster.clone(),
            active: self.active.clone(),
            jailed: self.jailed.clone(),
        }
    }

    fn restore(&mut self, checkpoint: Checkpoint) {
        self.root = checkpoint.root;
        self.roster = checkpoint.roster;
        self.active = checkpoint.active;
        self.jailed = checkpoint.jailed;
    }

    /// Active members other than the godfather with at least
    /// `minimum_subordinates` descendants, in admission order.
    pub fn find_big_bosses(&self, minimum_subordinates: usize) -> Vec<&Member> {
        self.active_members()
            .filter(|m| m.id() != self.root)
            .filter(|m| self.roster.count_all_subordinates(m.id()) >= minimum_subordinates)
            .collect()
    }

    /// Big bosses at the configured threshold.
    pub fn big_bosses(&self) -> Vec<&Member> {
        self.find_big_bosses(self.config.queries.big_boss_threshold)
    }

    /// The more senior of two members.
    ///
    /// Lower level wins; on equal levels the elder wins; on equal ages the
    /// larger id wins.
    pub fn compare_members<'a>(&self, a: &'a Member, b: &'a Member) -> &'a Member {
        if a.seniority() >= b.seniority() {
            a
        } else {
            b
        }
    }

    /// [`compare_members`](Self::compare_members) over two active ids.
    pub fn compare_by_id(&self, a: MemberId, b: MemberId) -> Option<&Member> {
        let a = self.get_member(a)?;
        let b = self.get_member(b)?;
        Some(self.compare_members(a, b))
    }

    /// The live hierarchy from the godfather down.
    pub fn chart(&self) -> ChartNode {
        self.chart_node(self.root)
    }

    fn chart_node(&self, id: MemberId) -> ChartNode {
        let Some(member) = self.roster.get(id) else {
            return ChartNode {
                id,
                age: 0,
                level: 0,
                subordinates: vec![],
            };
        };

        let subordinates = member
            .subordinates()
            .filter(|sub| self.active.contains(sub))
            .filter(|sub| self.roster.get(*sub).and_then(Member::superior) == Some(id))
            .map(|sub| self.chart_node(sub))
            .collect();

        ChartNode {
            id,
            age: member.age(),
            level: member.level(),
            subordinates,
        }
    }

    fn ensure_active(&self, id: MemberId) -> Result<(), HierarchyError> {
        if self.active.contains(&id) {
            Ok(())
        } else if self.jailed.contains_key(&id) {
            Err(HierarchyError::AlreadyJailed(id))
        } else {
            Err(HierarchyError::MemberNotFound(id))
        }
    }
}
