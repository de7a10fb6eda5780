//! Replacement selection for jailed members.
//!
//! When a member goes to prison its direct reports need a new boss:
//! 1. Unless the member is the godfather, its superior's eldest free direct
//!    subordinate takes them over (a sibling at the same rank)
//! 2. Failing that, the member's own eldest free direct subordinate is
//!    promoted into the vacated position and inherits the rest of the branch
//!
//! A promotion is recorded in the jailed member's alternate slot so the
//! release can put the promoted member back where it came from.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use cosca_protocol::MemberId;

use crate::roster::Roster;

/// Who takes over a jailed member's direct reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "member", rename_all = "snake_case")]
pub enum Replacement {
    /// A free member already at the jailed member's rank.
    Sibling(MemberId),
    /// One of the jailed member's own subordinates, moved up into its place.
    Promoted(MemberId),
}

impl Replacement {
    pub fn member_id(&self) -> MemberId {
        match self {
            Replacement::Sibling(id) | Replacement::Promoted(id) => *id,
        }
    }

    pub fn is_promotion(&self) -> bool {
        matches!(self, Replacement::Promoted(_))
    }
}

/// Pick the replacement for `jailed`, skipping every id `is_excluded` matches.
///
/// The caller is expected to exclude the jailed member itself as well as
/// everyone else currently in prison. A sibling never comes from below the
/// jailed member and a promoted subordinate never from above it, so the
/// reassignment cannot close a cycle.
pub fn select_replacement<F>(roster: &Roster, jailed: MemberId, is_excluded: F) -> Option<Replacement>
where
    F: Fn(&MemberId) -> bool,
{
    let member = roster.get(jailed)?;

    let sibling = member.superior().and_then(|boss| {
        roster.oldest_subordinate(boss, |m| is_excluded(m) || roster.is_ancestor(jailed, *m))
    });
    if let Some(sibling) = sibling {
        return Some(Replacement::Sibling(sibling.id()));
    }

    roster
        .oldest_subordinate(jailed, |m| is_excluded(m) || roster.is_ancestor(*m, jailed))
        .map(|sub| Replacement::Promoted(sub.id()))
}

/// Outcome of sending a member to prison.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Succession {
    pub jailed: MemberId,
    /// `None` when nobody was free to take over.
    pub replacement: Option<Replacement>,
    /// Direct reports moved under the replacement.
    pub reassigned: Vec<MemberId>,
    /// Set when the godfather was jailed and a subordinate took the top spot.
    pub new_godfather: Option<MemberId>,
    pub jailed_at: DateTime<Utc>,
}

/// Outcome of releasing a member from prison.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reinstatement {
    pub released: MemberId,
    /// Promoted member demoted back to a direct report.
    pub recovered_alternate: Option<MemberId>,
    /// Direct reports reattached to the released member.
    pub reclaimed: Vec<MemberId>,
    /// The released member is the godfather again.
    pub restored_godfather: bool,
    pub jailed_at: DateTime<Utc>,
    pub released_at: DateTime<Utc>,
}

impl Reinstatement {
    pub fn time_served(&self) -> chrono::Duration {
        self.released_at.signed_duration_since(self.jailed_at)
    }
}
