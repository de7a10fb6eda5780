//! Shared fixture and invariant checks for the hierarchy integration tests.

#![allow(dead_code)]

use std::collections::{BTreeMap, BTreeSet};

use cosca_hierarchy::{Member, Organization, OrganizationConfig};
use cosca_protocol::MemberId;

pub fn id(n: u64) -> MemberId {
    MemberId(n)
}

/// Reference organization of 15 members.
///
/// ```text
///                       1 (80)
///          ┌──────────────┼──────────────┐
///        2 (74)         3 (70)         4 (73)
///   ┌──────┬─┴────┬──────┐               │
/// 5 (68) 7 (64) 8 (63) 9 (65)         12 (48)
///   │                                ┌───┼───┐
/// 6 (52) 10 (54) 11 (56)           13(61) 14(55) 15(69)
/// ```
pub fn populate() -> Organization {
    populate_with(OrganizationConfig::default())
}

pub fn populate_with(config: OrganizationConfig) -> Organization {
    let mut org = Organization::with_config(Member::new(1, 80), config);

    let roster: [(u64, u32, u64); 14] = [
        (2, 74, 1),
        (3, 70, 1),
        (4, 73, 1),
        (5, 68, 2),
        (6, 52, 5),
        (7, 64, 2),
        (8, 63, 2),
        (9, 65, 2),
        (10, 54, 5),
        (11, 56, 5),
        (12, 48, 4),
        (13, 61, 12),
        (14, 55, 12),
        (15, 69, 12),
    ];
    for (member, age, boss) in roster {
        org.recruit(member, age, id(boss)).expect("fixture recruit");
    }

    org
}

/// Structural view of one member: superior, subordinate set, level, alternate.
pub type Shape = (Option<MemberId>, BTreeSet<MemberId>, u32, Option<MemberId>);

/// Order-insensitive snapshot of the whole organization.
#[derive(Debug, PartialEq, Eq)]
pub struct Snapshot {
    pub root: MemberId,
    pub active: BTreeSet<MemberId>,
    pub jailed: BTreeSet<MemberId>,
    pub members: BTreeMap<MemberId, Shape>,
}

pub fn snapshot(org: &Organization) -> Snapshot {
    Snapshot {
        root: org.root_id(),
        active: org.active_members().map(Member::id).collect(),
        jailed: org.jailed_members().map(Member::id).collect(),
        members: org
            .roster()
            .iter()
            .map(|m| {
                (
                    m.id(),
                    (m.superior(), m.subordinates().collect(), m.level(), m.alternate()),
                )
            })
            .collect(),
    }
}

/// Partition, membership and level invariants.
pub fn assert_invariants(org: &Organization) {
    for member in org.roster().iter() {
        let mid = member.id();
        let active = org.get_member(mid).is_some();
        let jailed = org.is_jailed(mid);
        assert!(active != jailed, "{mid} must be exactly one of active/jailed");

        if let Some(boss_id) = member.superior() {
            let boss = org.roster().get(boss_id).expect("superior is in the roster");
            assert!(
                boss.has_subordinate(mid),
                "{mid} missing from the subordinate set of its superior {boss_id}"
            );
            assert_eq!(
                member.level(),
                boss.level() + 1,
                "{mid} level must be one below superior {boss_id}"
            );
        }

        if member.alternate().is_some() {
            assert!(jailed, "{mid} holds an alternate while free");
        }
    }

    let root = org.root();
    assert!(root.is_godfather(), "godfather must not report to anyone");
    assert_eq!(root.level(), 0);
    assert!(org.get_member(root.id()).is_some(), "godfather must be active");
}
