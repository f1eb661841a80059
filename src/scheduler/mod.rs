//! Daily lifecycle scheduler
//!
//! Advances challenges and their memberships through open -> progress ->
//! ended once per day, and assigns the winner when a challenge ends. Both
//! passes key on "yesterday": a challenge whose start (or end) date was
//! yesterday transitions today. Transitions only fire from the expected
//! pre-state, so a re-run of a pass is a no-op.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Days, NaiveDate, Utc};
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

use crate::challenges::ranking::aggregate_by_member;
use crate::db::schemas::{ChallengeDoc, ChallengeStatus, MembershipStatus};
use crate::store::{ChallengeStore, MembershipStore, RecordStore};
use crate::types::{MemberId, Result};

/// Outcome of one scheduler pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TransitionSummary {
    pub started: usize,
    pub ended: usize,
}

/// Winner: the first member (in join order) holding the strictly greatest
/// value. Nobody wins when no value exceeds zero.
pub fn pick_winner(ordered_values: &[(MemberId, f64)]) -> Option<MemberId> {
    let mut winner = None;
    let mut best = 0.0f64;
    for (member, value) in ordered_values {
        if *value > best {
            best = *value;
            winner = Some(*member);
        }
    }
    winner
}

/// Next occurrence of the daily fire time strictly after `now`
pub fn next_fire_after(now: DateTime<Utc>, (hour, min, sec): (u32, u32, u32)) -> DateTime<Utc> {
    let fire_today = now
        .date_naive()
        .and_hms_opt(hour.min(23), min.min(59), sec.min(59))
        .expect("clamped fire time is a valid time of day")
        .and_utc();
    if fire_today > now {
        fire_today
    } else {
        fire_today + Days::new(1)
    }
}

/// The time-driven lifecycle job
pub struct LifecycleScheduler {
    challenges: Arc<dyn ChallengeStore>,
    memberships: Arc<dyn MembershipStore>,
    records: Arc<dyn RecordStore>,
}

impl LifecycleScheduler {
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

    /// Run both transition passes for the given day.
    ///
    /// A failure on one challenge is logged and does not stop the batch;
    /// only store-level query failures abort the pass.
    pub async fn run_once(&self, today: NaiveDate) -> Result<TransitionSummary> {
        let target = today - Days::new(1);
        info!(%today, %target, "lifecycle scheduler pass");

        let mut summary = TransitionSummary::default();

        for challenge in self.challenges.starting(target).await? {
            let id = challenge.challenge_id;
            match self.start_challenge(challenge).await {
                Ok(true) => summary.started += 1,
                Ok(false) => {}
                Err(e) => error!(challenge = %id, error = %e, "start transition failed"),
            }
        }

        for challenge in self.challenges.ending(target).await? {
            let id = challenge.challenge_id;
            match self.end_challenge(challenge).await {
                Ok(true) => summary.ended += 1,
                Ok(false) => {}
                Err(e) => error!(challenge = %id, error = %e, "end transition failed"),
            }
        }

        Ok(summary)
    }

    /// Open -> progress; applied memberships become joined.
    /// Returns false when the challenge is no longer in the pre-state.
    async fn start_challenge(&self, mut challenge: ChallengeDoc) -> Result<bool> {
        if challenge.status != ChallengeStatus::Open {
            return Ok(false);
        }

        let mut members = self.memberships.for_challenge(challenge.challenge_id).await?;
        challenge.status = ChallengeStatus::Progress;

        if members.is_empty() {
            info!(challenge = %challenge.challenge_id, "challenge started with no members");
            self.challenges.save(&challenge).await?;
            return Ok(true);
        }

        for member in &mut members {
            if member.status == MembershipStatus::Applied {
                member.status = MembershipStatus::Joined;
            }
        }
        self.memberships.save_all(&members).await?;
        self.challenges.save(&challenge).await?;

        info!(
            challenge = %challenge.challenge_id,
            members = members.len(),
            "challenge started"
        );
        Ok(true)
    }

    /// Progress -> ended; memberships end and the winner is assigned.
    async fn end_challenge(&self, mut challenge: ChallengeDoc) -> Result<bool> {
        if challenge.status != ChallengeStatus::Progress {
            return Ok(false);
        }

        let mut members = self.memberships.for_challenge(challenge.challenge_id).await?;
        challenge.status = ChallengeStatus::Ended;

        if members.is_empty() {
            info!(challenge = %challenge.challenge_id, "challenge ended with no members");
            self.challenges.save(&challenge).await?;
            return Ok(true);
        }

        for member in &mut members {
            member.status = MembershipStatus::Ended;
        }
        self.memberships.save_all(&members).await?;

        // Winner: per-kind aggregate of the challenge's metric, in join order
        let records = self.records.for_challenge(challenge.challenge_id).await?;
        let by_member: HashMap<MemberId, f64> =
            aggregate_by_member(challenge.kind, &records).into_iter().collect();
        let ordered: Vec<(MemberId, f64)> = members
            .iter()
            .map(|m| (m.member_id, by_member.get(&m.member_id).copied().unwrap_or(0.0)))
            .collect();

        if let Some(winner) = pick_winner(&ordered) {
            challenge.winner_id = Some(winner);
            info!(challenge = %challenge.challenge_id, %winner, "challenge winner assigned");
        }
        self.challenges.save(&challenge).await?;

        info!(
            challenge = %challenge.challenge_id,
            members = members.len(),
            "challenge ended"
        );
        Ok(true)
    }
}

/// Spawn the daily scheduler loop as a background task
pub fn spawn_scheduler_task(
    scheduler: Arc<LifecycleScheduler>,
    fire_time: (u32, u32, u32),
) -> JoinHandle<()> {
    info!(
        "Lifecycle scheduler started (fires daily at {:02}:{:02}:{:02} UTC)",
        fire_time.0, fire_time.1, fire_time.2
    );
    tokio::spawn(async move {
        loop {
            let now = Utc::now();
            let next = next_fire_after(now, fire_time);
            let wait = (next - now).to_std().unwrap_or(Duration::ZERO);
            debug!(%next, "lifecycle scheduler sleeping");
            tokio::time::sleep(wait).await;

            let today = Utc::now().date_naive();
            match scheduler.run_once(today).await {
                Ok(summary) => info!(
                    started = summary.started,
                    ended = summary.ended,
                    "lifecycle pass complete"
                ),
                Err(e) => error!("lifecycle pass failed: {}", e),
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn test_pick_winner_strictly_greatest() {
        let (a, b, c) = (Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4());
        let values = vec![(a, 10.0), (b, 30.0), (c, 20.0)];
        assert_eq!(pick_winner(&values), Some(b));
    }

    #[test]
    fn test_pick_winner_tie_keeps_first() {
        let (a, b) = (Uuid::new_v4(), Uuid::new_v4());
        let values = vec![(a, 30.0), (b, 30.0)];
        assert_eq!(pick_winner(&values), Some(a));
    }

    #[test]
    fn test_pick_winner_needs_nonzero() {
        let values = vec![(Uuid::new_v4(), 0.0), (Uuid::new_v4(), 0.0)];
        assert_eq!(pick_winner(&values), None);
    }

    #[test]
    fn test_next_fire_rolls_to_tomorrow() {
        let now = DateTime::parse_from_rfc3339("2025-09-03T00:00:15Z")
            .unwrap()
            .with_timezone(&Utc);
        let next = next_fire_after(now, (0, 0, 10));
        assert_eq!(next.date_naive(), now.date_naive() + Days::new(1));
    }

    #[test]
    fn test_next_fire_later_today() {
        let now = DateTime::parse_from_rfc3339("2025-09-03T00:00:05Z")
            .unwrap()
            .with_timezone(&Utc);
        let next = next_fire_after(now, (0, 0, 10));
        assert_eq!(next.date_naive(), now.date_naive());
    }
}
