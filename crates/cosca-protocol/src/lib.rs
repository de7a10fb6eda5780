//! Cosca Protocol - shared vocabulary for the organization model
//!
//! Identifiers, rank constants and the serializable view types exchanged
//! between the hierarchy engine and its callers.

pub mod constants;
pub mod identity;
pub mod types;

pub use constants::*;
pub use identity::*;
pub use types::*;
