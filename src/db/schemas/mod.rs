//! Database schemas for Gauntlet
//!
//! Defines the document structures for challenges, memberships, and
//! per-day activity records.

mod challenge;
mod membership;
mod metadata;
mod record;

pub use challenge::{
    ChallengeDoc, ChallengeKind, ChallengeStatus, Goal, MetricKind, CHALLENGE_COLLECTION,
};
pub use membership::{MembershipDoc, MembershipStatus, MEMBERSHIP_COLLECTION};
pub use metadata::Metadata;
pub use record::{Measure, RecordDoc, RECORD_COLLECTION};
