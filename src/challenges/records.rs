//! Activity record aggregation
//!
//! Folds a member's activity submissions into their per-day record for a
//! challenge, evaluates the pass rule, and keeps team-wide progress current.

use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use tracing::{debug, info};

use crate::challenges::progress::{evaluate_pass, ProgressCalculator};
use crate::db::schemas::{ChallengeKind, ChallengeStatus, Measure, RecordDoc};
use crate::store::{ChallengeStore, MembershipStore, RecordStore};
use crate::types::{ChallengeId, GauntletError, MemberId, Result};

/// Today's aggregation day (UTC calendar date)
pub fn today() -> NaiveDate {
    Utc::now().date_naive()
}

/// The record aggregator
pub struct RecordService {
    challenges: Arc<dyn ChallengeStore>,
    memberships: Arc<dyn MembershipStore>,
    records: Arc<dyn RecordStore>,
    progress: ProgressCalculator,
}

impl RecordService {
    pub fn new(
        challenges: Arc<dyn ChallengeStore>,
        memberships: Arc<dyn MembershipStore>,
        records: Arc<dyn RecordStore>,
    ) -> Self {
        let progress = ProgressCalculator::new(
            Arc::clone(&challenges),
            Arc::clone(&memberships),
            Arc::clone(&records),
        );
        Self {
            challenges,
            memberships,
            records,
            progress,
        }
    }

    /// Record a member's activity for today
    pub async fn record_activity(
        &self,
        member_id: MemberId,
        challenge_id: ChallengeId,
        measure: Measure,
    ) -> Result<RecordDoc> {
        self.record_activity_on(today(), member_id, challenge_id, measure)
            .await
    }

    /// Record a member's activity for a specific day.
    ///
    /// The submitted metric must match the challenge's goal metric; the
    /// submission folds into the day's record (best-of-day for count and
    /// duration, cumulative for distance). For a running team challenge,
    /// challenge-wide progress is recomputed afterwards and full progress
    /// marks every record of the challenge as passed.
    pub async fn record_activity_on(
        &self,
        day: NaiveDate,
        member_id: MemberId,
        challenge_id: ChallengeId,
        measure: Measure,
    ) -> Result<RecordDoc> {
        let mut challenge = self
            .challenges
            .find(challenge_id)
            .await?
            .ok_or_else(|| GauntletError::NotFound(format!("no challenge with id {}", challenge_id)))?;

        if measure.value() <= 0 {
            return Err(GauntletError::InvalidInput(format!(
                "{} must be positive, got {}",
                measure.kind().as_str(),
                measure.value()
            )));
        }
        if measure.kind() != challenge.goal.kind() {
            return Err(GauntletError::InvalidInput(format!(
                "challenge {} measures {}, got {}",
                challenge_id,
                challenge.goal.kind().as_str(),
                measure.kind().as_str()
            )));
        }

        if !self.memberships.exists(challenge_id, member_id).await? {
            return Err(GauntletError::NotFound(format!(
                "member {} has not joined challenge {}",
                member_id, challenge_id
            )));
        }

        let mut record = self
            .records
            .upsert_measure(challenge_id, member_id, day, measure)
            .await?;

        if !record.passed && evaluate_pass(&record, &challenge) {
            self.records.mark_passed(challenge_id, member_id, day).await?;
            record.passed = true;
            debug!(member = %member_id, challenge = %challenge_id, "goal passed");
        }

        if challenge.kind == ChallengeKind::Team && challenge.status == ChallengeStatus::Progress {
            let pct = self.progress.recompute(&mut challenge).await?;
            if pct >= 100.0 {
                let marked = self.records.mark_all_passed(challenge_id).await?;
                record.passed = true;
                if marked > 0 {
                    info!(
                        challenge = %challenge_id,
                        marked,
                        "team goal reached, all records marked passed"
                    );
                }
            }
        }

        Ok(record)
    }
}
