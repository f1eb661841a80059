//! Challenge progress and pass evaluation
//!
//! Progress is the team-wide completion percentage: the sum of every
//! member's aggregated values over the goal target, rounded and clamped to
//! [0, 100]. It only ever grows, because the underlying records only grow.

use std::sync::Arc;

use tracing::debug;

use crate::db::schemas::{ChallengeDoc, ChallengeKind, RecordDoc};
use crate::store::{ChallengeStore, MembershipStore, RecordStore};
use crate::types::Result;

/// Completion percentage for a summed total against a goal target
pub fn progress_percentage(total: i64, target: i64) -> f32 {
    if target <= 0 {
        return 0.0;
    }
    let pct = (total as f32 / target as f32) * 100.0;
    pct.round().clamp(0.0, 100.0)
}

/// Whether a record meets its challenge's goal.
///
/// Idempotent: a record that already passed stays passed. A team challenge
/// at full progress passes every record; otherwise the record's own value
/// is compared against the goal target (greater-or-equal, with distance
/// compared on the day's accumulated value).
pub fn evaluate_pass(record: &RecordDoc, challenge: &ChallengeDoc) -> bool {
    if record.passed {
        return true;
    }
    if challenge.kind == ChallengeKind::Team && challenge.progress >= 100.0 {
        return true;
    }
    record.measure.kind() == challenge.goal.kind()
        && record.measure.value() >= challenge.goal.target()
}

/// Recomputes and persists challenge-wide progress
pub struct ProgressCalculator {
    challenges: Arc<dyn ChallengeStore>,
    memberships: Arc<dyn MembershipStore>,
    records: Arc<dyn RecordStore>,
}

impl ProgressCalculator {
    pub fn new(
        challenges: Arc<dyn ChallengeStore>,
        memberships: Arc<dyn MembershipStore>,
        records: Arc<dyn RecordStore>,
    ) -> Self {
        Self {
            challenges,
            memberships,
            records,
        }
    }

    /// Recompute the challenge's completion percentage from its members'
    /// records, persist it onto the challenge, and return it
    pub async fn recompute(&self, challenge: &mut ChallengeDoc) -> Result<f32> {
        let members = self.memberships.for_challenge(challenge.challenge_id).await?;

        let mut total = 0i64;
        for membership in &members {
            total += self
                .records
                .sum_measure(membership.member_id, challenge.challenge_id)
                .await?;
        }

        let pct = progress_percentage(total, challenge.goal.target());
        challenge.progress = pct;
        self.challenges.save(challenge).await?;

        debug!(
            challenge = %challenge.challenge_id,
            total,
            progress = pct,
            "challenge progress updated"
        );
        Ok(pct)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::schemas::{ChallengeKind, ChallengeStatus, Goal, Measure, Metadata};
    use chrono::NaiveDate;
    use uuid::Uuid;

    fn challenge(kind: ChallengeKind, goal: Goal, progress: f32) -> ChallengeDoc {
        let mut ch = ChallengeDoc::new(
            Uuid::new_v4(),
            kind,
            "test".into(),
            String::new(),
            goal,
            NaiveDate::from_ymd_opt(2025, 9, 1).unwrap(),
            NaiveDate::from_ymd_opt(2025, 9, 30).unwrap(),
            10,
        );
        ch.status = ChallengeStatus::Progress;
        ch.progress = progress;
        ch
    }

    fn record(measure: Measure, passed: bool) -> RecordDoc {
        RecordDoc {
            _id: None,
            metadata: Metadata::new(),
            challenge_id: Uuid::new_v4(),
            member_id: Uuid::new_v4(),
            day: NaiveDate::from_ymd_opt(2025, 9, 3).unwrap(),
            measure,
            passed,
        }
    }

    #[test]
    fn test_percentage_rounds_and_clamps() {
        assert_eq!(progress_percentage(105, 100), 100.0);
        assert_eq!(progress_percentage(46, 100), 46.0);
        assert_eq!(progress_percentage(1, 3), 33.0);
        assert_eq!(progress_percentage(2, 3), 67.0);
    }

    #[test]
    fn test_percentage_zero_target() {
        assert_eq!(progress_percentage(50, 0), 0.0);
    }

    #[test]
    fn test_pass_threshold_met() {
        let ch = challenge(ChallengeKind::Individual, Goal::Count(10), 0.0);
        assert!(evaluate_pass(&record(Measure::Count(12), false), &ch));
        assert!(!evaluate_pass(&record(Measure::Count(9), false), &ch));
    }

    #[test]
    fn test_pass_never_downgrades() {
        let ch = challenge(ChallengeKind::Individual, Goal::Count(10), 0.0);
        assert!(evaluate_pass(&record(Measure::Count(1), true), &ch));
    }

    #[test]
    fn test_team_full_progress_passes_any_record() {
        let ch = challenge(ChallengeKind::Team, Goal::Count(100), 100.0);
        assert!(evaluate_pass(&record(Measure::Count(1), false), &ch));
    }
}
