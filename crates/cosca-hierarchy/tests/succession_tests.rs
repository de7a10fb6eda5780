//! Round-trip and invariant tests for incarceration and release.
//!
//! Verifies:
//! - Jail then release restores superior, subordinate set and level for
//!   every position in the fixture (leaf, mid-level boss, godfather)
//! - Partition and level invariants hold after every mutation
//! - Nested incarcerations released in reverse order restore the fixture
//! - Interleaved jailings and releases in any order keep the invariants, and
//!   a refused mutation changes nothing

mod common;

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

use cosca_hierarchy::{HierarchyError, Member};
use cosca_protocol::MemberId;

use common::{assert_invariants, id, populate, snapshot};

// ═══════════════════════════════════════════════════════════════
// Single round trips
// ═══════════════════════════════════════════════════════════════

#[test]
fn round_trip_restores_every_position() {
    for member in 1..=15u64 {
        let mut org = populate();
        let before = snapshot(&org);
        let count_before = org.get_member(id(member)).unwrap().subordinate_count();

        org.send_to_prison(id(member)).unwrap();
        assert!(org.get_member(id(member)).is_none(), "{member} still free after jailing");
        assert_invariants(&org);

        org.release_from_prison(id(member)).unwrap();
        assert_invariants(&org);

        let restored = org.get_member(id(member)).expect("released member is free");
        assert_eq!(restored.id(), id(member));
        assert_eq!(restored.subordinate_count(), count_before);
        assert_eq!(snapshot(&org), before, "round trip of {member} changed the hierarchy");
    }
}

#[test]
fn round_trip_twice_is_stable() {
    let mut org = populate();
    let before = snapshot(&org);
    for _ in 0..2 {
        org.send_to_prison(id(1)).unwrap();
        org.release_from_prison(id(1)).unwrap();
    }
    assert_eq!(snapshot(&org), before);
}

#[test]
fn release_clears_alternate() {
    let mut org = populate();
    org.send_to_prison(id(12)).unwrap();
    assert_eq!(org.jailed_member(id(12)).unwrap().alternate(), Some(id(15)));

    org.release_from_prison(id(12)).unwrap();
    assert!(org.get_member(id(12)).unwrap().alternate().is_none());
}

#[test]
fn jailed_member_keeps_its_place_on_record() {
    let mut org = populate();
    org.send_to_prison(id(5)).unwrap();

    let jailed = org.jailed_member(id(5)).unwrap();
    assert_eq!(jailed.superior(), Some(id(2)));
    assert_eq!(jailed.level(), 2);
    assert_eq!(
        jailed.subordinates().collect::<Vec<_>>(),
        vec![id(6), id(10), id(11)]
    );
    assert!(org.get_member(id(2)).unwrap().has_subordinate(id(5)));
}

#[test]
fn godfather_succession_chain() {
    let mut org = populate();

    org.send_to_prison(id(1)).unwrap();
    assert_eq!(org.root_id(), id(2));

    // The acting godfather is jailed too: its eldest free report takes over.
    let succession = org.send_to_prison(id(2)).unwrap();
    assert_eq!(succession.new_godfather, Some(id(4)));
    assert_eq!(org.root_id(), id(4));
    assert_eq!(org.root().level(), 0);
    assert_invariants(&org);

    org.release_from_prison(id(2)).unwrap();
    assert_eq!(org.root_id(), id(2));
    assert_invariants(&org);

    org.release_from_prison(id(1)).unwrap();
    assert_eq!(org.root_id(), id(1));
    assert_eq!(snapshot(&org), snapshot(&populate()));
}

// ═══════════════════════════════════════════════════════════════
// Randomized nested incarcerations
// ═══════════════════════════════════════════════════════════════

#[test]
fn nested_incarcerations_unwind_in_reverse() {
    let mut rng = StdRng::seed_from_u64(0x0c05ca);
    let pristine = snapshot(&populate());

    for _round in 0..200 {
        let mut org = populate();
        let mut candidates: Vec<MemberId> = org.active_members().map(Member::id).collect();
        candidates.shuffle(&mut rng);
        let depth = rng.gen_range(1..=8);

        let mut jailed = Vec::new();
        for member in candidates.into_iter().take(depth) {
            match org.send_to_prison(member) {
                Ok(succession) => {
                    assert_eq!(succession.jailed, member);
                    jailed.push(member);
                }
                Err(HierarchyError::NoSuccessor(refused)) => {
                    assert_eq!(refused, member);
                    assert!(org.get_member(member).is_some());
                }
                Err(other) => panic!("unexpected error jailing {member}: {other}"),
            }
            assert_invariants(&org);
        }

        while let Some(member) = jailed.pop() {
            org.release_from_prison(member).unwrap();
            assert_invariants(&org);
        }

        assert_eq!(snapshot(&org), pristine);
    }
}

#[test]
fn interleaved_jailings_and_releases_keep_invariants() {
    let mut rng = StdRng::seed_from_u64(0x1a11_b1e5);

    for _round in 0..300 {
        let mut org = populate();

        for _step in 0..40 {
            let jailed: Vec<MemberId> = org.jailed_members().map(Member::id).collect();
            let before = snapshot(&org);

            if !jailed.is_empty() && rng.gen_bool(0.45) {
                let member = *jailed.choose(&mut rng).unwrap();
                match org.release_from_prison(member) {
                    Ok(reinstatement) => {
                        assert_eq!(reinstatement.released, member);
                        assert!(org.get_member(member).is_some());
                    }
                    Err(error) => {
                        assert!(org.is_jailed(member), "failed release of {member} lost it: {error}");
                        assert_eq!(snapshot(&org), before);
                    }
                }
            } else {
                let active: Vec<MemberId> = org.active_members().map(Member::id).collect();
                let member = *active.choose(&mut rng).unwrap();
                match org.send_to_prison(member) {
                    Ok(_) => assert!(org.is_jailed(member)),
                    Err(error) => {
                        assert_eq!(error, HierarchyError::NoSuccessor(member));
                        assert!(org.get_member(member).is_some());
                        assert_eq!(snapshot(&org), before);
                    }
                }
            }

            assert_invariants(&org);
        }

        // Whatever order they come out in, everyone gets out.
        let remaining: Vec<MemberId> = org.jailed_members().map(Member::id).collect();
        for member in remaining {
            org.release_from_prison(member).unwrap();
            assert_invariants(&org);
        }
        assert_eq!(org.active_members().count(), 15);
    }
}
