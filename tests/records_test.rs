//! Activity aggregation, pass evaluation, and team progress integration tests

use std::sync::Arc;

use chrono::NaiveDate;
use uuid::Uuid;

use gauntlet::challenges::{ChallengeService, NewChallenge, RecordService};
use gauntlet::db::schemas::{ChallengeDoc, ChallengeKind, ChallengeStatus, Goal, Measure};
use gauntlet::store::{ChallengeStore, MemoryStore};
use gauntlet::GauntletError;

fn day(d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 9, d).unwrap()
}

fn services() -> (Arc<MemoryStore>, ChallengeService, RecordService) {
    let store = Arc::new(MemoryStore::new());
    let challenges = ChallengeService::new(store.clone(), store.clone(), store.clone());
    let records = RecordService::new(store.clone(), store.clone(), store.clone());
    (store, challenges, records)
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
                title: "Test challenge".into(),
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

async fn set_status(store: &Arc<MemoryStore>, challenge: &ChallengeDoc, status: ChallengeStatus) {
    let mut doc = ChallengeStore::find(store.as_ref(), challenge.challenge_id)
        .await
        .unwrap()
        .unwrap();
    doc.status = status;
    ChallengeStore::save(store.as_ref(), &doc).await.unwrap();
}

#[tokio::test]
async fn test_best_of_day_keeps_higher_value() {
    let (_store, challenges, records) = services();
    let ch = open_challenge(&challenges, ChallengeKind::Individual, Goal::Count(10)).await;
    let member = Uuid::new_v4();
    challenges.join(member, ch.challenge_id).await.unwrap();

    let first = records
        .record_activity_on(day(4), member, ch.challenge_id, Measure::Count(4))
        .await
        .unwrap();
    assert_eq!(first.measure, Measure::Count(4));
    assert!(!first.passed);

    let second = records
        .record_activity_on(day(4), member, ch.challenge_id, Measure::Count(12))
        .await
        .unwrap();
    assert_eq!(second.measure, Measure::Count(12));
    assert!(second.passed);

    // A lower submission later in the day leaves the stored value alone
    let third = records
        .record_activity_on(day(4), member, ch.challenge_id, Measure::Count(5))
        .await
        .unwrap();
    assert_eq!(third.measure, Measure::Count(12));
    assert!(third.passed, "a set pass flag is never cleared");
}

#[tokio::test]
async fn test_distance_accumulates_within_day() {
    let (_store, challenges, records) = services();
    let ch = open_challenge(&challenges, ChallengeKind::Individual, Goal::Distance(20)).await;
    let member = Uuid::new_v4();
    challenges.join(member, ch.challenge_id).await.unwrap();

    records
        .record_activity_on(day(4), member, ch.challenge_id, Measure::Distance(5))
        .await
        .unwrap();
    let record = records
        .record_activity_on(day(4), member, ch.challenge_id, Measure::Distance(7))
        .await
        .unwrap();

    assert_eq!(record.measure, Measure::Distance(12));
    assert!(!record.passed);
}

#[tokio::test]
async fn test_distance_passes_on_accumulated_value() {
    let (_store, challenges, records) = services();
    let ch = open_challenge(&challenges, ChallengeKind::Individual, Goal::Distance(10)).await;
    let member = Uuid::new_v4();
    challenges.join(member, ch.challenge_id).await.unwrap();

    records
        .record_activity_on(day(4), member, ch.challenge_id, Measure::Distance(6))
        .await
        .unwrap();
    let record = records
        .record_activity_on(day(4), member, ch.challenge_id, Measure::Distance(6))
        .await
        .unwrap();

    assert_eq!(record.measure, Measure::Distance(12));
    assert!(record.passed);
}

#[tokio::test]
async fn test_days_aggregate_separately() {
    let (_store, challenges, records) = services();
    let ch = open_challenge(&challenges, ChallengeKind::Individual, Goal::Count(100)).await;
    let member = Uuid::new_v4();
    challenges.join(member, ch.challenge_id).await.unwrap();

    records
        .record_activity_on(day(4), member, ch.challenge_id, Measure::Count(30))
        .await
        .unwrap();
    let next_day = records
        .record_activity_on(day(5), member, ch.challenge_id, Measure::Count(20))
        .await
        .unwrap();

    assert_eq!(next_day.measure, Measure::Count(20));
}

#[tokio::test]
async fn test_team_progress_reaches_goal_and_propagates_pass() {
    let (store, challenges, records) = services();
    let ch = open_challenge(&challenges, ChallengeKind::Team, Goal::Count(100)).await;
    let (a, b) = (Uuid::new_v4(), Uuid::new_v4());
    challenges.join(a, ch.challenge_id).await.unwrap();
    challenges.join(b, ch.challenge_id).await.unwrap();
    set_status(&store, &ch, ChallengeStatus::Progress).await;

    records
        .record_activity_on(day(4), a, ch.challenge_id, Measure::Count(60))
        .await
        .unwrap();
    let after_a = challenges.get(ch.challenge_id).await.unwrap();
    assert_eq!(after_a.progress, 60.0);

    records
        .record_activity_on(day(4), b, ch.challenge_id, Measure::Count(45))
        .await
        .unwrap();

    // 105/100 rounds past the cap and clamps to 100
    let after_b = challenges.get(ch.challenge_id).await.unwrap();
    assert_eq!(after_b.progress, 100.0);

    // Team-wide pass propagation marks every record
    let a_record = records
        .record_activity_on(day(4), a, ch.challenge_id, Measure::Count(1))
        .await
        .unwrap();
    assert!(a_record.passed);
    let b_record = gauntlet::store::RecordStore::find_day(store.as_ref(), ch.challenge_id, b, day(4))
        .await
        .unwrap()
        .unwrap();
    assert!(b_record.passed);
}

#[tokio::test]
async fn test_team_progress_ignored_while_open() {
    let (_store, challenges, records) = services();
    let ch = open_challenge(&challenges, ChallengeKind::Team, Goal::Count(100)).await;
    let member = Uuid::new_v4();
    challenges.join(member, ch.challenge_id).await.unwrap();

    records
        .record_activity_on(day(4), member, ch.challenge_id, Measure::Count(60))
        .await
        .unwrap();

    let after = challenges.get(ch.challenge_id).await.unwrap();
    assert_eq!(after.progress, 0.0, "progress only moves while in progress");
}

#[tokio::test]
async fn test_metric_mismatch_rejected() {
    let (_store, challenges, records) = services();
    let ch = open_challenge(&challenges, ChallengeKind::Individual, Goal::Count(10)).await;
    let member = Uuid::new_v4();
    challenges.join(member, ch.challenge_id).await.unwrap();

    let err = records
        .record_activity_on(day(4), member, ch.challenge_id, Measure::Distance(5))
        .await
        .unwrap_err();
    assert!(matches!(err, GauntletError::InvalidInput(_)));
}

#[tokio::test]
async fn test_nonpositive_value_rejected() {
    let (_store, challenges, records) = services();
    let ch = open_challenge(&challenges, ChallengeKind::Individual, Goal::Count(10)).await;
    let member = Uuid::new_v4();
    challenges.join(member, ch.challenge_id).await.unwrap();

    let err = records
        .record_activity_on(day(4), member, ch.challenge_id, Measure::Count(0))
        .await
        .unwrap_err();
    assert!(matches!(err, GauntletError::InvalidInput(_)));
}

#[tokio::test]
async fn test_unknown_challenge_rejected() {
    let (_store, _challenges, records) = services();
    let err = records
        .record_activity_on(day(4), Uuid::new_v4(), Uuid::new_v4(), Measure::Count(5))
        .await
        .unwrap_err();
    assert!(matches!(err, GauntletError::NotFound(_)));
}

#[tokio::test]
async fn test_not_joined_rejected() {
    let (_store, challenges, records) = services();
    let ch = open_challenge(&challenges, ChallengeKind::Individual, Goal::Count(10)).await;

    let err = records
        .record_activity_on(day(4), Uuid::new_v4(), ch.challenge_id, Measure::Count(5))
        .await
        .unwrap_err();
    assert!(matches!(err, GauntletError::NotFound(_)));
}
