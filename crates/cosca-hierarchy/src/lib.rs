//! Cosca Hierarchy - organization structure, incarceration and succession
//!
//! Models a strict hierarchy of members under a single godfather:
//! - Arena of members addressed by id, with superior back-links
//! - Replacement selection when a member is jailed (same-rank sibling first,
//!   otherwise promotion of the member's own eldest free subordinate)
//! - Exact reversal of a promotion when the jailed member is released
//! - Big-boss queries and a seniority comparator

pub mod config;
pub mod member;
pub mod organization;
pub mod roster;
pub mod succession;

pub use config::{OrganizationConfig, OrphanPolicy};
pub use member::Member;
pub use organization::Organization;
pub use roster::Roster;
pub use succession::{Reinstatement, Replacement, Succession};

use cosca_protocol::MemberId;
use thiserror::Error;

/// Errors originating from the hierarchy layer.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum HierarchyError {
    #[error("Member not found: {0}")]
    MemberNotFound(MemberId),

    #[error("Member is already jailed: {0}")]
    AlreadyJailed(MemberId),

    #[error("Member is not jailed: {0}")]
    NotJailed(MemberId),

    #[error("No successor available to replace {0}")]
    NoSuccessor(MemberId),

    #[error("Attaching {member} under {boss} would create a cycle")]
    CycleDetected { member: MemberId, boss: MemberId },

    #[error("The godfather {0} cannot report to another member")]
    RootImmovable(MemberId),

    #[error("Hierarchy depth exceeded maximum of {0}")]
    MaxDepthExceeded(u32),
}
