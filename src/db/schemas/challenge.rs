//! Challenge document schema
//!
//! A challenge is a time-boxed goal-based competition. Its goal is exactly
//! one metric target, modeled as a tagged union so the invariant holds by
//! construction instead of by null-checking three columns.

use bson::{doc, oid::ObjectId, Document};
use chrono::NaiveDate;
use mongodb::options::IndexOptions;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::db::mongo::{IntoIndexes, MutMetadata};
use crate::db::schemas::Metadata;
use crate::types::{ChallengeId, MemberId};

/// Collection name for challenges
pub const CHALLENGE_COLLECTION: &str = "challenges";

/// The metric a challenge measures
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum MetricKind {
    /// Repetitions (e.g. push-ups)
    Count,
    /// Exercise duration in minutes
    Duration,
    /// Distance covered in meters
    Distance,
}

impl MetricKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Count => "count",
            Self::Duration => "duration",
            Self::Distance => "distance",
        }
    }

    /// Whether same-day submissions accumulate (distance) instead of
    /// keeping the best single submission (count, duration)
    pub fn is_cumulative(&self) -> bool {
        matches!(self, Self::Distance)
    }
}

/// Challenge goal: exactly one metric with its target value
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "snake_case", tag = "metric", content = "target")]
pub enum Goal {
    Count(i64),
    Duration(i64),
    Distance(i64),
}

impl Goal {
    pub fn kind(&self) -> MetricKind {
        match self {
            Self::Count(_) => MetricKind::Count,
            Self::Duration(_) => MetricKind::Duration,
            Self::Distance(_) => MetricKind::Distance,
        }
    }

    pub fn target(&self) -> i64 {
        match self {
            Self::Count(n) | Self::Duration(n) | Self::Distance(n) => *n,
        }
    }
}

impl Default for Goal {
    fn default() -> Self {
        Self::Count(0)
    }
}

/// Challenge kind (fixed closed set)
#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ChallengeKind {
    /// Every member chases the goal on their own
    #[default]
    Individual,
    /// Members pool their activity toward a shared goal
    Team,
    /// Elimination-style individual challenge
    Survival,
}

/// Challenge lifecycle status: open -> progress -> ended (terminal)
#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ChallengeStatus {
    /// Accepting members, not yet started
    #[default]
    Open,
    /// Running; activity counts toward the goal
    Progress,
    /// Finished; winner assigned where one exists
    Ended,
}

impl ChallengeStatus {
    /// Wire/filter representation (matches the serde encoding)
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Open => "open",
            Self::Progress => "progress",
            Self::Ended => "ended",
        }
    }
}

/// Challenge document stored in MongoDB
#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub struct ChallengeDoc {
    /// MongoDB document ID
    #[serde(skip_serializing_if = "Option::is_none")]
    pub _id: Option<ObjectId>,

    /// Common metadata (created_at, updated_at, is_deleted)
    #[serde(default)]
    pub metadata: Metadata,

    /// Challenge identifier
    pub challenge_id: ChallengeId,

    /// Member who created the challenge
    pub host_id: MemberId,

    pub kind: ChallengeKind,

    pub title: String,

    #[serde(default)]
    pub description: String,

    /// The single goal metric and its target
    pub goal: Goal,

    pub status: ChallengeStatus,

    /// First day of the challenge (inclusive)
    pub start_date: NaiveDate,

    /// Last day of the challenge (inclusive)
    pub end_date: NaiveDate,

    #[serde(default)]
    pub current_participants: i32,

    pub max_participants: i32,

    /// Challenge-wide completion percentage in [0, 100]; meaningful for
    /// team challenges, raised only by the record aggregator
    #[serde(default)]
    pub progress: f32,

    /// Winning member, set by the lifecycle scheduler at challenge end
    #[serde(skip_serializing_if = "Option::is_none")]
    pub winner_id: Option<MemberId>,
}

impl ChallengeDoc {
    /// Create a new open challenge with zero participants and progress
    pub fn new(
        host_id: MemberId,
        kind: ChallengeKind,
        title: String,
        description: String,
        goal: Goal,
        start_date: NaiveDate,
        end_date: NaiveDate,
        max_participants: i32,
    ) -> Self {
        Self {
            _id: None,
            metadata: Metadata::new(),
            challenge_id: Uuid::new_v4(),
            host_id,
            kind,
            title,
            description,
            goal,
            status: ChallengeStatus::Open,
            start_date,
            end_date,
            current_participants: 0,
            max_participants,
            progress: 0.0,
            winner_id: None,
        }
    }

    /// Whether the challenge still has room for another member
    pub fn has_capacity(&self) -> bool {
        self.current_participants < self.max_participants
    }
}

impl IntoIndexes for ChallengeDoc {
    fn into_indices() -> Vec<(Document, Option<IndexOptions>)> {
        vec![
            (
                doc! { "challenge_id": 1 },
                Some(
                    IndexOptions::builder()
                        .unique(true)
                        .name("challenge_id_unique".to_string())
                        .build(),
                ),
            ),
            (
                doc! { "status": 1 },
                Some(IndexOptions::builder().name("status_index".to_string()).build()),
            ),
            // The scheduler's start/end passes filter on (status, date)
            (
                doc! { "status": 1, "start_date": 1 },
                Some(
                    IndexOptions::builder()
                        .name("status_start_date_index".to_string())
                        .build(),
                ),
            ),
            (
                doc! { "status": 1, "end_date": 1 },
                Some(
                    IndexOptions::builder()
                        .name("status_end_date_index".to_string())
                        .build(),
                ),
            ),
            (
                doc! { "host_id": 1 },
                Some(IndexOptions::builder().name("host_id_index".to_string()).build()),
            ),
        ]
    }
}

impl MutMetadata for ChallengeDoc {
    fn mut_metadata(&mut self) -> &mut Metadata {
        &mut self.metadata
    }
}
