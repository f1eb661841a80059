//! Contribution aggregation and leaderboard rank
//!
//! A member's comparable value depends on the challenge kind: team
//! challenges rank cumulative contribution (sum of all days), individual
//! and survival challenges rank the best single day.

use std::collections::HashMap;
use std::sync::Arc;

use crate::db::schemas::{ChallengeKind, RecordDoc};
use crate::store::{ChallengeStore, RecordStore};
use crate::types::{ChallengeId, GauntletError, MemberId, Result};

/// One member's share of a challenge leaderboard
#[derive(Debug, Clone, PartialEq)]
pub struct Contribution {
    pub member_id: MemberId,
    /// Comparable value (cumulative for team, best day otherwise)
    pub value: f64,
    /// Share of the summed values, in [0, 100]
    pub percentage: f64,
    /// Whether this row belongs to the caller
    pub is_caller: bool,
}

/// A member's records in a challenge together with their rank
#[derive(Debug, Clone)]
pub struct MemberStanding {
    pub records: Vec<RecordDoc>,
    pub value: f64,
    pub rank: u32,
}

/// Per-member comparable values in first-seen record order
pub fn aggregate_by_member(kind: ChallengeKind, records: &[RecordDoc]) -> Vec<(MemberId, f64)> {
    let mut order: Vec<MemberId> = Vec::new();
    let mut values: HashMap<MemberId, f64> = HashMap::new();

    for record in records {
        let value = record.measure.value() as f64;
        match values.entry(record.member_id) {
            std::collections::hash_map::Entry::Occupied(mut e) => {
                let current = e.get_mut();
                if kind == ChallengeKind::Team {
                    *current += value;
                } else if value > *current {
                    *current = value;
                }
            }
            std::collections::hash_map::Entry::Vacant(e) => {
                e.insert(value);
                order.push(record.member_id);
            }
        }
    }

    order
        .into_iter()
        .map(|member| {
            let value = values[&member];
            (member, value)
        })
        .collect()
}

/// 1-based rank: members with a strictly greater value, plus one.
/// Equal values share a rank.
pub fn rank_of(values: &[f64], mine: f64) -> u32 {
    values.iter().filter(|v| **v > mine).count() as u32 + 1
}

/// The ranking engine
pub struct RankingService {
    challenges: Arc<dyn ChallengeStore>,
    records: Arc<dyn RecordStore>,
}

impl RankingService {
    pub fn new(challenges: Arc<dyn ChallengeStore>, records: Arc<dyn RecordStore>) -> Self {
        Self {
            challenges,
            records,
        }
    }

    /// Leaderboard contributions for a challenge, sorted by value
    /// descending. The caller (if given) is flagged on their own row.
    pub async fn contributions(
        &self,
        challenge_id: ChallengeId,
        caller: Option<MemberId>,
    ) -> Result<Vec<Contribution>> {
        let challenge = self
            .challenges
            .find(challenge_id)
            .await?
            .ok_or_else(|| GauntletError::NotFound(format!("no challenge with id {}", challenge_id)))?;

        let records = self.records.for_challenge(challenge_id).await?;
        let aggregates = aggregate_by_member(challenge.kind, &records);
        let total: f64 = aggregates.iter().map(|(_, v)| v).sum();

        let mut contributions: Vec<Contribution> = aggregates
            .into_iter()
            .map(|(member_id, value)| Contribution {
                member_id,
                value,
                percentage: if total == 0.0 { 0.0 } else { value / total * 100.0 },
                is_caller: caller == Some(member_id),
            })
            .collect();

        // Stable sort keeps equal values in first-seen order
        contributions.sort_by(|a, b| b.value.partial_cmp(&a.value).unwrap_or(std::cmp::Ordering::Equal));
        Ok(contributions)
    }

    /// The member's leaderboard rank in a challenge
    pub async fn rank(&self, member_id: MemberId, challenge_id: ChallengeId) -> Result<u32> {
        Ok(self.standing(member_id, challenge_id).await?.rank)
    }

    /// The member's records in a challenge plus their rank
    pub async fn standing(
        &self,
        member_id: MemberId,
        challenge_id: ChallengeId,
    ) -> Result<MemberStanding> {
        let challenge = self
            .challenges
            .find(challenge_id)
            .await?
            .ok_or_else(|| GauntletError::NotFound(format!("no challenge with id {}", challenge_id)))?;

        let records = self.records.for_challenge(challenge_id).await?;
        let aggregates = aggregate_by_member(challenge.kind, &records);

        let mine = aggregates
            .iter()
            .find(|(member, _)| *member == member_id)
            .map(|(_, value)| *value)
            .ok_or_else(|| {
                GauntletError::NotFound(format!(
                    "member {} has no record in challenge {}",
                    member_id, challenge_id
                ))
            })?;

        let values: Vec<f64> = aggregates.iter().map(|(_, v)| *v).collect();
        let member_records = records
            .into_iter()
            .filter(|r| r.member_id == member_id)
            .collect();

        Ok(MemberStanding {
            records: member_records,
            value: mine,
            rank: rank_of(&values, mine),
        })
    }
}
