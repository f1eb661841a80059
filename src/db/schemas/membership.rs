//! Membership document schema
//!
//! Links a member to a challenge: applied -> joined -> ended (terminal).
//! An applied membership can also be removed outright by a voluntary leave
//! while the challenge is still open.

use bson::{doc, oid::ObjectId, DateTime, Document};
use mongodb::options::IndexOptions;
use serde::{Deserialize, Serialize};

use crate::db::mongo::{IntoIndexes, MutMetadata};
use crate::db::schemas::Metadata;
use crate::types::{ChallengeId, MemberId};

/// Collection name for memberships
pub const MEMBERSHIP_COLLECTION: &str = "memberships";

/// Membership lifecycle status
#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum MembershipStatus {
    /// Signed up; challenge has not started
    #[default]
    Applied,
    /// Challenge started with this member aboard
    Joined,
    /// Challenge finished
    Ended,
}

impl MembershipStatus {
    /// Wire/filter representation (matches the serde encoding)
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Applied => "applied",
            Self::Joined => "joined",
            Self::Ended => "ended",
        }
    }
}

/// Membership document stored in MongoDB
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct MembershipDoc {
    /// MongoDB document ID
    #[serde(skip_serializing_if = "Option::is_none")]
    pub _id: Option<ObjectId>,

    /// Common metadata
    #[serde(default)]
    pub metadata: Metadata,

    pub challenge_id: ChallengeId,

    pub member_id: MemberId,

    pub status: MembershipStatus,

    /// When the member signed up; also the tie-break order for winner
    /// selection at challenge end
    pub joined_at: DateTime,
}

impl MembershipDoc {
    /// Create a new applied membership
    pub fn new(challenge_id: ChallengeId, member_id: MemberId) -> Self {
        Self {
            _id: None,
            metadata: Metadata::new(),
            challenge_id,
            member_id,
            status: MembershipStatus::Applied,
            joined_at: DateTime::now(),
        }
    }
}

impl Default for MembershipDoc {
    fn default() -> Self {
        Self {
            _id: None,
            metadata: Metadata::default(),
            challenge_id: ChallengeId::default(),
            member_id: MemberId::default(),
            status: MembershipStatus::default(),
            joined_at: DateTime::from_millis(0),
        }
    }
}

impl IntoIndexes for MembershipDoc {
    fn into_indices() -> Vec<(Document, Option<IndexOptions>)> {
        vec![
            // One membership per (challenge, member)
            (
                doc! { "challenge_id": 1, "member_id": 1 },
                Some(
                    IndexOptions::builder()
                        .unique(true)
                        .name("challenge_member_unique".to_string())
                        .build(),
                ),
            ),
            // Member-scoped queries filter on (member, status)
            (
                doc! { "member_id": 1, "status": 1 },
                Some(
                    IndexOptions::builder()
                        .name("member_status_index".to_string())
                        .build(),
                ),
            ),
        ]
    }
}

impl MutMetadata for MembershipDoc {
    fn mut_metadata(&mut self) -> &mut Metadata {
        &mut self.metadata
    }
}
