//! In-memory store
//!
//! Backs dev mode and the integration tests. One struct implements all
//! three store contracts over concurrent maps; per-record atomicity comes
//! from the map's per-key entry locking.

use async_trait::async_trait;
use chrono::NaiveDate;
use dashmap::DashMap;

use crate::db::schemas::{
    ChallengeDoc, ChallengeStatus, Measure, MembershipDoc, MembershipStatus, RecordDoc,
};
use crate::store::{ChallengeStore, MembershipStore, RecordStore};
use crate::types::{ChallengeId, GauntletError, MemberId, Result};

/// Map-backed implementation of every store contract
#[derive(Default)]
pub struct MemoryStore {
    challenges: DashMap<ChallengeId, ChallengeDoc>,
    memberships: DashMap<(ChallengeId, MemberId), MembershipDoc>,
    records: DashMap<(ChallengeId, MemberId, NaiveDate), RecordDoc>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn challenges_sorted_newest_first(&self, mut docs: Vec<ChallengeDoc>) -> Vec<ChallengeDoc> {
        docs.sort_by_key(|c| std::cmp::Reverse(c.metadata.created_at));
        docs
    }
}

#[async_trait]
impl ChallengeStore for MemoryStore {
    async fn insert(&self, doc: ChallengeDoc) -> Result<ChallengeDoc> {
        if self.challenges.contains_key(&doc.challenge_id) {
            return Err(GauntletError::Conflict(format!(
                "challenge {} already exists",
                doc.challenge_id
            )));
        }
        self.challenges.insert(doc.challenge_id, doc.clone());
        Ok(doc)
    }

    async fn find(&self, challenge_id: ChallengeId) -> Result<Option<ChallengeDoc>> {
        Ok(self.challenges.get(&challenge_id).map(|c| c.clone()))
    }

    async fn list(&self, status: Option<ChallengeStatus>) -> Result<Vec<ChallengeDoc>> {
        let docs = self
            .challenges
            .iter()
            .filter(|c| status.map_or(true, |s| c.status == s))
            .map(|c| c.clone())
            .collect();
        Ok(self.challenges_sorted_newest_first(docs))
    }

    async fn find_by_ids(&self, ids: &[ChallengeId]) -> Result<Vec<ChallengeDoc>> {
        Ok(ids
            .iter()
            .filter_map(|id| self.challenges.get(id).map(|c| c.clone()))
            .collect())
    }

    async fn hosted_by(&self, member_id: MemberId) -> Result<Vec<ChallengeDoc>> {
        let docs = self
            .challenges
            .iter()
            .filter(|c| c.host_id == member_id)
            .map(|c| c.clone())
            .collect();
        Ok(self.challenges_sorted_newest_first(docs))
    }

    async fn starting(&self, start_date: NaiveDate) -> Result<Vec<ChallengeDoc>> {
        Ok(self
            .challenges
            .iter()
            .filter(|c| c.status == ChallengeStatus::Open && c.start_date == start_date)
            .map(|c| c.clone())
            .collect())
    }

    async fn ending(&self, end_date: NaiveDate) -> Result<Vec<ChallengeDoc>> {
        Ok(self
            .challenges
            .iter()
            .filter(|c| c.status == ChallengeStatus::Progress && c.end_date == end_date)
            .map(|c| c.clone())
            .collect())
    }

    async fn ongoing(&self, today: NaiveDate) -> Result<Vec<ChallengeDoc>> {
        Ok(self
            .challenges
            .iter()
            .filter(|c| c.start_date <= today && today <= c.end_date)
            .map(|c| c.clone())
            .collect())
    }

    async fn upcoming(&self, today: NaiveDate) -> Result<Vec<ChallengeDoc>> {
        Ok(self
            .challenges
            .iter()
            .filter(|c| c.start_date > today)
            .map(|c| c.clone())
            .collect())
    }

    async fn ended_before(&self, today: NaiveDate) -> Result<Vec<ChallengeDoc>> {
        Ok(self
            .challenges
            .iter()
            .filter(|c| c.end_date < today)
            .map(|c| c.clone())
            .collect())
    }

    async fn save(&self, doc: &ChallengeDoc) -> Result<()> {
        let mut doc = doc.clone();
        doc.metadata.touch();
        self.challenges.insert(doc.challenge_id, doc);
        Ok(())
    }

    async fn delete(&self, challenge_id: ChallengeId) -> Result<()> {
        self.challenges.remove(&challenge_id);
        Ok(())
    }
}

#[async_trait]
impl MembershipStore for MemoryStore {
    async fn insert(&self, doc: MembershipDoc) -> Result<MembershipDoc> {
        let key = (doc.challenge_id, doc.member_id);
        if self.memberships.contains_key(&key) {
            return Err(GauntletError::Conflict(format!(
                "member {} already belongs to challenge {}",
                doc.member_id, doc.challenge_id
            )));
        }
        self.memberships.insert(key, doc.clone());
        Ok(doc)
    }

    async fn find(
        &self,
        challenge_id: ChallengeId,
        member_id: MemberId,
    ) -> Result<Option<MembershipDoc>> {
        Ok(self
            .memberships
            .get(&(challenge_id, member_id))
            .map(|m| m.clone()))
    }

    async fn exists(&self, challenge_id: ChallengeId, member_id: MemberId) -> Result<bool> {
        Ok(self.memberships.contains_key(&(challenge_id, member_id)))
    }

    async fn for_challenge(&self, challenge_id: ChallengeId) -> Result<Vec<MembershipDoc>> {
        let mut docs: Vec<MembershipDoc> = self
            .memberships
            .iter()
            .filter(|m| m.challenge_id == challenge_id)
            .map(|m| m.clone())
            .collect();
        docs.sort_by_key(|m| m.joined_at);
        Ok(docs)
    }

    async fn challenge_ids_for_member(
        &self,
        member_id: MemberId,
        status: MembershipStatus,
    ) -> Result<Vec<ChallengeId>> {
        Ok(self
            .memberships
            .iter()
            .filter(|m| m.member_id == member_id && m.status == status)
            .map(|m| m.challenge_id)
            .collect())
    }

    async fn save_all(&self, docs: &[MembershipDoc]) -> Result<()> {
        for doc in docs {
            let mut doc = doc.clone();
            doc.metadata.touch();
            self.memberships.insert((doc.challenge_id, doc.member_id), doc);
        }
        Ok(())
    }

    async fn remove(&self, challenge_id: ChallengeId, member_id: MemberId) -> Result<()> {
        self.memberships.remove(&(challenge_id, member_id));
        Ok(())
    }

    async fn remove_for_challenge(&self, challenge_id: ChallengeId) -> Result<u64> {
        let before = self.memberships.len();
        self.memberships.retain(|key, _| key.0 != challenge_id);
        Ok((before - self.memberships.len()) as u64)
    }
}

#[async_trait]
impl RecordStore for MemoryStore {
    async fn upsert_measure(
        &self,
        challenge_id: ChallengeId,
        member_id: MemberId,
        day: NaiveDate,
        measure: Measure,
    ) -> Result<RecordDoc> {
        // entry() holds the key's shard lock for the whole read-modify-write
        let mut entry = self
            .records
            .entry((challenge_id, member_id, day))
            .or_insert_with(|| RecordDoc {
                _id: None,
                metadata: crate::db::schemas::Metadata::new(),
                challenge_id,
                member_id,
                day,
                measure: measure.with_value(0),
                passed: false,
            });
        let merged = measure.merge_value(entry.measure.value());
        entry.measure = measure.with_value(merged);
        entry.metadata.touch();
        Ok(entry.clone())
    }

    async fn mark_passed(
        &self,
        challenge_id: ChallengeId,
        member_id: MemberId,
        day: NaiveDate,
    ) -> Result<()> {
        if let Some(mut record) = self.records.get_mut(&(challenge_id, member_id, day)) {
            if !record.passed {
                record.passed = true;
                record.metadata.touch();
            }
        }
        Ok(())
    }

    async fn mark_all_passed(&self, challenge_id: ChallengeId) -> Result<u64> {
        let mut marked = 0;
        for mut record in self.records.iter_mut() {
            if record.challenge_id == challenge_id && !record.passed {
                record.passed = true;
                record.metadata.touch();
                marked += 1;
            }
        }
        Ok(marked)
    }

    async fn find_day(
        &self,
        challenge_id: ChallengeId,
        member_id: MemberId,
        day: NaiveDate,
    ) -> Result<Option<RecordDoc>> {
        Ok(self
            .records
            .get(&(challenge_id, member_id, day))
            .map(|r| r.clone()))
    }

    async fn for_challenge(&self, challenge_id: ChallengeId) -> Result<Vec<RecordDoc>> {
        let mut docs: Vec<RecordDoc> = self
            .records
            .iter()
            .filter(|r| r.challenge_id == challenge_id)
            .map(|r| r.clone())
            .collect();
        docs.sort_by_key(|r| r.day);
        Ok(docs)
    }

    async fn for_member(&self, member_id: MemberId) -> Result<Vec<RecordDoc>> {
        let mut docs: Vec<RecordDoc> = self
            .records
            .iter()
            .filter(|r| r.member_id == member_id)
            .map(|r| r.clone())
            .collect();
        docs.sort_by_key(|r| std::cmp::Reverse(r.day));
        Ok(docs)
    }

    async fn for_member_in_challenge(
        &self,
        member_id: MemberId,
        challenge_id: ChallengeId,
    ) -> Result<Vec<RecordDoc>> {
        let mut docs: Vec<RecordDoc> = self
            .records
            .iter()
            .filter(|r| r.member_id == member_id && r.challenge_id == challenge_id)
            .map(|r| r.clone())
            .collect();
        docs.sort_by_key(|r| r.day);
        Ok(docs)
    }

    async fn sum_measure(&self, member_id: MemberId, challenge_id: ChallengeId) -> Result<i64> {
        Ok(self
            .records
            .iter()
            .filter(|r| r.member_id == member_id && r.challenge_id == challenge_id)
            .map(|r| r.measure.value())
            .sum())
    }

    async fn remove_for_challenge(&self, challenge_id: ChallengeId) -> Result<u64> {
        let before = self.records.len();
        self.records.retain(|key, _| key.0 != challenge_id);
        Ok((before - self.records.len()) as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::schemas::{ChallengeKind, Goal};
    use uuid::Uuid;

    #[tokio::test]
    async fn test_upsert_keeps_best_of_day() {
        let store = MemoryStore::new();
        let (ch, member) = (Uuid::new_v4(), Uuid::new_v4());
        let day = NaiveDate::from_ymd_opt(2025, 9, 3).unwrap();

        store
            .upsert_measure(ch, member, day, Measure::Count(10))
            .await
            .unwrap();
        let record = store
            .upsert_measure(ch, member, day, Measure::Count(4))
            .await
            .unwrap();

        assert_eq!(record.measure, Measure::Count(10));
    }

    #[tokio::test]
    async fn test_upsert_accumulates_distance() {
        let store = MemoryStore::new();
        let (ch, member) = (Uuid::new_v4(), Uuid::new_v4());
        let day = NaiveDate::from_ymd_opt(2025, 9, 3).unwrap();

        store
            .upsert_measure(ch, member, day, Measure::Distance(5))
            .await
            .unwrap();
        let record = store
            .upsert_measure(ch, member, day, Measure::Distance(7))
            .await
            .unwrap();

        assert_eq!(record.measure, Measure::Distance(12));
    }

    #[tokio::test]
    async fn test_challenge_insert_is_unique() {
        let store = MemoryStore::new();
        let doc = ChallengeDoc::new(
            Uuid::new_v4(),
            ChallengeKind::Individual,
            "Plank week".into(),
            String::new(),
            Goal::Duration(5),
            NaiveDate::from_ymd_opt(2025, 9, 1).unwrap(),
            NaiveDate::from_ymd_opt(2025, 9, 7).unwrap(),
            4,
        );
        ChallengeStore::insert(&store, doc.clone()).await.unwrap();
        assert!(ChallengeStore::insert(&store, doc).await.is_err());
    }
}
