//! Contribution and leaderboard rank integration tests

use std::sync::Arc;

use chrono::NaiveDate;
use uuid::Uuid;

use gauntlet::challenges::{ChallengeService, NewChallenge, RankingService, RecordService};
use gauntlet::db::schemas::{ChallengeDoc, ChallengeKind, Goal, Measure};
use gauntlet::store::MemoryStore;
use gauntlet::GauntletError;

fn day(d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 9, d).unwrap()
}

fn services() -> (ChallengeService, RecordService, RankingService) {
    let store = Arc::new(MemoryStore::new());
    (
        ChallengeService::new(store.clone(), store.clone(), store.clone()),
        RecordService::new(store.clone(), store.clone(), store.clone()),
        RankingService::new(store.clone(), store),
    )
}

async fn open_challenge(
    service: &ChallengeService,
    kind: ChallengeKind,
    goal: Goal,
) -> ChallengeDoc {
    service
        .create(
            Uuid::new_v4(),
            NewChallenge {
                kind,
                title: "Ranking test".into(),
                description: String::new(),
                goal,
                start_date: day(3),
                end_date: day(10),
                max_participants: 10,
            },
        )
        .await
        .unwrap()
}

#[tokio::test]
async fn test_team_contributions_split_the_total() {
    let (challenges, records, ranking) = services();
    let ch = open_challenge(&challenges, ChallengeKind::Team, Goal::Count(200)).await;
    let (a, b) = (Uuid::new_v4(), Uuid::new_v4());
    challenges.join(a, ch.challenge_id).await.unwrap();
    challenges.join(b, ch.challenge_id).await.unwrap();

    records
        .record_activity_on(day(4), a, ch.challenge_id, Measure::Count(60))
        .await
        .unwrap();
    records
        .record_activity_on(day(5), a, ch.challenge_id, Measure::Count(40))
        .await
        .unwrap();
    records
        .record_activity_on(day(5), b, ch.challenge_id, Measure::Count(100))
        .await
        .unwrap();

    let contributions = ranking.contributions(ch.challenge_id, Some(a)).await.unwrap();
    assert_eq!(contributions.len(), 2);

    // Team contribution is cumulative: a = 100, b = 100, each half the total
    let mine = contributions.iter().find(|c| c.member_id == a).unwrap();
    assert_eq!(mine.value, 100.0);
    assert_eq!(mine.percentage, 50.0);
    assert!(mine.is_caller);

    let theirs = contributions.iter().find(|c| c.member_id == b).unwrap();
    assert_eq!(theirs.value, 100.0);
    assert!(!theirs.is_caller);
}

#[tokio::test]
async fn test_contributions_empty_total_has_zero_percentages() {
    let (challenges, _records, ranking) = services();
    let ch = open_challenge(&challenges, ChallengeKind::Team, Goal::Count(200)).await;

    let contributions = ranking.contributions(ch.challenge_id, None).await.unwrap();
    assert!(contributions.is_empty());
}

#[tokio::test]
async fn test_individual_rank_uses_best_single_day() {
    let (challenges, records, ranking) = services();
    let ch = open_challenge(&challenges, ChallengeKind::Individual, Goal::Count(1000)).await;
    let (a, b) = (Uuid::new_v4(), Uuid::new_v4());
    challenges.join(a, ch.challenge_id).await.unwrap();
    challenges.join(b, ch.challenge_id).await.unwrap();

    // a's two middling days sum past b, but b's single best day wins
    records
        .record_activity_on(day(4), a, ch.challenge_id, Measure::Count(40))
        .await
        .unwrap();
    records
        .record_activity_on(day(5), a, ch.challenge_id, Measure::Count(45))
        .await
        .unwrap();
    records
        .record_activity_on(day(4), b, ch.challenge_id, Measure::Count(60))
        .await
        .unwrap();

    assert_eq!(ranking.rank(b, ch.challenge_id).await.unwrap(), 1);
    assert_eq!(ranking.rank(a, ch.challenge_id).await.unwrap(), 2);
}

#[tokio::test]
async fn test_tied_values_share_a_rank() {
    let (challenges, records, ranking) = services();
    let ch = open_challenge(&challenges, ChallengeKind::Individual, Goal::Count(1000)).await;
    let (a, b, c) = (Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4());
    for member in [a, b, c] {
        challenges.join(member, ch.challenge_id).await.unwrap();
    }

    records
        .record_activity_on(day(4), a, ch.challenge_id, Measure::Count(30))
        .await
        .unwrap();
    records
        .record_activity_on(day(4), b, ch.challenge_id, Measure::Count(50))
        .await
        .unwrap();
    records
        .record_activity_on(day(5), c, ch.challenge_id, Measure::Count(50))
        .await
        .unwrap();

    // Rank is the count of strictly greater values plus one, so both 50s
    // share the top spot and the 30 sits below both
    assert_eq!(ranking.rank(b, ch.challenge_id).await.unwrap(), 1);
    assert_eq!(ranking.rank(c, ch.challenge_id).await.unwrap(), 1);
    assert_eq!(ranking.rank(a, ch.challenge_id).await.unwrap(), 3);
}

#[tokio::test]
async fn test_rank_without_record_is_not_found() {
    let (challenges, _records, ranking) = services();
    let ch = open_challenge(&challenges, ChallengeKind::Individual, Goal::Count(10)).await;
    let member = Uuid::new_v4();
    challenges.join(member, ch.challenge_id).await.unwrap();

    let err = ranking.rank(member, ch.challenge_id).await.unwrap_err();
    assert!(matches!(err, GauntletError::NotFound(_)));
}

#[tokio::test]
async fn test_standing_returns_member_records() {
    let (challenges, records, ranking) = services();
    let ch = open_challenge(&challenges, ChallengeKind::Individual, Goal::Count(1000)).await;
    let member = Uuid::new_v4();
    challenges.join(member, ch.challenge_id).await.unwrap();

    records
        .record_activity_on(day(4), member, ch.challenge_id, Measure::Count(40))
        .await
        .unwrap();
    records
        .record_activity_on(day(5), member, ch.challenge_id, Measure::Count(55))
        .await
        .unwrap();

    let standing = ranking.standing(member, ch.challenge_id).await.unwrap();
    assert_eq!(standing.records.len(), 2);
    assert_eq!(standing.value, 55.0);
    assert_eq!(standing.rank, 1);
}

#[tokio::test]
async fn test_contributions_sorted_descending() {
    let (challenges, records, ranking) = services();
    let ch = open_challenge(&challenges, ChallengeKind::Team, Goal::Count(1000)).await;
    let (a, b, c) = (Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4());
    for member in [a, b, c] {
        challenges.join(member, ch.challenge_id).await.unwrap();
    }

    records
        .record_activity_on(day(4), a, ch.challenge_id, Measure::Count(10))
        .await
        .unwrap();
    records
        .record_activity_on(day(4), b, ch.challenge_id, Measure::Count(30))
        .await
        .unwrap();
    records
        .record_activity_on(day(4), c, ch.challenge_id, Measure::Count(20))
        .await
        .unwrap();

    let contributions = ranking.contributions(ch.challenge_id, None).await.unwrap();
    let values: Vec<f64> = contributions.iter().map(|c| c.value).collect();
    assert_eq!(values, vec![30.0, 20.0, 10.0]);
}
