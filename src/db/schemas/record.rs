//! Activity record document schema
//!
//! One record per (challenge, member, calendar day), holding that day's
//! aggregated value for the challenge's goal metric. Count and duration keep
//! the best submission of the day; distance accumulates across submissions.

use bson::{doc, oid::ObjectId, Document};
use chrono::NaiveDate;
use mongodb::options::IndexOptions;
use serde::{Deserialize, Serialize};

use crate::db::mongo::{IntoIndexes, MutMetadata};
use crate::db::schemas::{Metadata, MetricKind};
use crate::types::{ChallengeId, MemberId};

/// Collection name for activity records
pub const RECORD_COLLECTION: &str = "records";

/// A measured value for exactly one metric
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "snake_case", tag = "metric", content = "value")]
pub enum Measure {
    Count(i64),
    Duration(i64),
    Distance(i64),
}

impl Measure {
    pub fn kind(&self) -> MetricKind {
        match self {
            Self::Count(_) => MetricKind::Count,
            Self::Duration(_) => MetricKind::Duration,
            Self::Distance(_) => MetricKind::Distance,
        }
    }

    pub fn value(&self) -> i64 {
        match self {
            Self::Count(n) | Self::Duration(n) | Self::Distance(n) => *n,
        }
    }

    /// Combine a new same-day submission into an existing value:
    /// best-of-day for count/duration, cumulative for distance
    pub fn merge_value(&self, existing: i64) -> i64 {
        if self.kind().is_cumulative() {
            existing + self.value()
        } else {
            existing.max(self.value())
        }
    }

    /// Same measure with a different value
    pub fn with_value(&self, value: i64) -> Self {
        match self {
            Self::Count(_) => Self::Count(value),
            Self::Duration(_) => Self::Duration(value),
            Self::Distance(_) => Self::Distance(value),
        }
    }
}

impl Default for Measure {
    fn default() -> Self {
        Self::Count(0)
    }
}

/// Activity record stored in MongoDB
#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub struct RecordDoc {
    /// MongoDB document ID
    #[serde(skip_serializing_if = "Option::is_none")]
    pub _id: Option<ObjectId>,

    /// Common metadata
    #[serde(default)]
    pub metadata: Metadata,

    pub challenge_id: ChallengeId,

    pub member_id: MemberId,

    /// Calendar day this record aggregates (UTC)
    pub day: NaiveDate,

    /// The day's aggregated value for the challenge's goal metric
    pub measure: Measure,

    /// Goal met; set once true and never cleared
    #[serde(default)]
    pub passed: bool,
}

impl IntoIndexes for RecordDoc {
    fn into_indices() -> Vec<(Document, Option<IndexOptions>)> {
        vec![
            // One record per (challenge, member, day)
            (
                doc! { "challenge_id": 1, "member_id": 1, "day": 1 },
                Some(
                    IndexOptions::builder()
                        .unique(true)
                        .name("challenge_member_day_unique".to_string())
                        .build(),
                ),
            ),
            (
                doc! { "challenge_id": 1 },
                Some(
                    IndexOptions::builder()
                        .name("challenge_id_index".to_string())
                        .build(),
                ),
            ),
            (
                doc! { "member_id": 1 },
                Some(
                    IndexOptions::builder()
                        .name("member_id_index".to_string())
                        .build(),
                ),
            ),
        ]
    }
}

impl MutMetadata for RecordDoc {
    fn mut_metadata(&mut self) -> &mut Metadata {
        &mut self.metadata
    }
}
