//! Shared types for Gauntlet

mod error;

pub use error::{GauntletError, Result};

use uuid::Uuid;

/// Identifier of a member (resolved by the identity provider)
pub type MemberId = Uuid;

/// Identifier of a challenge
pub type ChallengeId = Uuid;
