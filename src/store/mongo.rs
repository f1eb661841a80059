//! MongoDB-backed store implementations
//!
//! Thin mappings from the store contracts onto the typed collection
//! wrapper. Record upserts use single-document `$max`/`$inc` updates so a
//! same-day race between two submissions cannot lose a write.

use async_trait::async_trait;
use bson::{doc, DateTime, Document};
use chrono::NaiveDate;

use crate::db::mongo::{MongoClient, MongoCollection};
use crate::db::schemas::{
    ChallengeDoc, ChallengeStatus, Measure, MembershipDoc, MembershipStatus, RecordDoc,
    CHALLENGE_COLLECTION, MEMBERSHIP_COLLECTION, RECORD_COLLECTION,
};
use crate::store::{ChallengeStore, MembershipStore, RecordStore};
use crate::types::{ChallengeId, GauntletError, MemberId, Result};

/// Challenge collection backed by MongoDB
pub struct MongoChallengeStore {
    col: MongoCollection<ChallengeDoc>,
}

impl MongoChallengeStore {
    pub async fn new(client: &MongoClient) -> Result<Self> {
        Ok(Self {
            col: client.collection(CHALLENGE_COLLECTION).await?,
        })
    }

    fn id_filter(challenge_id: ChallengeId) -> Document {
        doc! { "challenge_id": challenge_id.to_string() }
    }
}

#[async_trait]
impl ChallengeStore for MongoChallengeStore {
    async fn insert(&self, mut doc: ChallengeDoc) -> Result<ChallengeDoc> {
        let id = self.col.insert_one(doc.clone()).await?;
        doc._id = Some(id);
        Ok(doc)
    }

    async fn find(&self, challenge_id: ChallengeId) -> Result<Option<ChallengeDoc>> {
        self.col.find_one(Self::id_filter(challenge_id)).await
    }

    async fn list(&self, status: Option<ChallengeStatus>) -> Result<Vec<ChallengeDoc>> {
        let filter = match status {
            Some(status) => doc! { "status": status.as_str() },
            None => doc! {},
        };
        self.col
            .find_many_sorted(filter, Some(doc! { "metadata.created_at": -1 }))
            .await
    }

    async fn find_by_ids(&self, ids: &[ChallengeId]) -> Result<Vec<ChallengeDoc>> {
        let ids: Vec<String> = ids.iter().map(|id| id.to_string()).collect();
        self.col
            .find_many(doc! { "challenge_id": { "$in": ids } })
            .await
    }

    async fn hosted_by(&self, member_id: MemberId) -> Result<Vec<ChallengeDoc>> {
        self.col
            .find_many(doc! { "host_id": member_id.to_string() })
            .await
    }

    async fn starting(&self, start_date: NaiveDate) -> Result<Vec<ChallengeDoc>> {
        self.col
            .find_many(doc! {
                "status": ChallengeStatus::Open.as_str(),
                "start_date": start_date.to_string(),
            })
            .await
    }

    async fn ending(&self, end_date: NaiveDate) -> Result<Vec<ChallengeDoc>> {
        self.col
            .find_many(doc! {
                "status": ChallengeStatus::Progress.as_str(),
                "end_date": end_date.to_string(),
            })
            .await
    }

    async fn ongoing(&self, today: NaiveDate) -> Result<Vec<ChallengeDoc>> {
        // ISO dates compare correctly as strings
        let today = today.to_string();
        self.col
            .find_many(doc! {
                "start_date": { "$lte": &today },
                "end_date": { "$gte": &today },
            })
            .await
    }

    async fn upcoming(&self, today: NaiveDate) -> Result<Vec<ChallengeDoc>> {
        self.col
            .find_many(doc! { "start_date": { "$gt": today.to_string() } })
            .await
    }

    async fn ended_before(&self, today: NaiveDate) -> Result<Vec<ChallengeDoc>> {
        self.col
            .find_many(doc! { "end_date": { "$lt": today.to_string() } })
            .await
    }

    async fn save(&self, doc: &ChallengeDoc) -> Result<()> {
        let mut doc = doc.clone();
        doc.metadata.touch();
        self.col
            .inner()
            .replace_one(Self::id_filter(doc.challenge_id), doc)
            .await
            .map_err(|e| GauntletError::Database(format!("Replace failed: {}", e)))?;
        Ok(())
    }

    async fn delete(&self, challenge_id: ChallengeId) -> Result<()> {
        self.col.soft_delete(Self::id_filter(challenge_id)).await?;
        Ok(())
    }
}

/// Membership collection backed by MongoDB
pub struct MongoMembershipStore {
    col: MongoCollection<MembershipDoc>,
}

impl MongoMembershipStore {
    pub async fn new(client: &MongoClient) -> Result<Self> {
        Ok(Self {
            col: client.collection(MEMBERSHIP_COLLECTION).await?,
        })
    }

    fn key_filter(challenge_id: ChallengeId, member_id: MemberId) -> Document {
        doc! {
            "challenge_id": challenge_id.to_string(),
            "member_id": member_id.to_string(),
        }
    }
}

#[async_trait]
impl MembershipStore for MongoMembershipStore {
    async fn insert(&self, mut doc: MembershipDoc) -> Result<MembershipDoc> {
        let id = self.col.insert_one(doc.clone()).await?;
        doc._id = Some(id);
        Ok(doc)
    }

    async fn find(
        &self,
        challenge_id: ChallengeId,
        member_id: MemberId,
    ) -> Result<Option<MembershipDoc>> {
        self.col
            .find_one(Self::key_filter(challenge_id, member_id))
            .await
    }

    async fn exists(&self, challenge_id: ChallengeId, member_id: MemberId) -> Result<bool> {
        Ok(self.find(challenge_id, member_id).await?.is_some())
    }

    async fn for_challenge(&self, challenge_id: ChallengeId) -> Result<Vec<MembershipDoc>> {
        self.col
            .find_many_sorted(
                doc! { "challenge_id": challenge_id.to_string() },
                Some(doc! { "joined_at": 1 }),
            )
            .await
    }

    async fn challenge_ids_for_member(
        &self,
        member_id: MemberId,
        status: MembershipStatus,
    ) -> Result<Vec<ChallengeId>> {
        let docs = self
            .col
            .find_many(doc! {
                "member_id": member_id.to_string(),
                "status": status.as_str(),
            })
            .await?;
        Ok(docs.into_iter().map(|m| m.challenge_id).collect())
    }

    async fn save_all(&self, docs: &[MembershipDoc]) -> Result<()> {
        for doc in docs {
            self.col
                .update_one(
                    Self::key_filter(doc.challenge_id, doc.member_id),
                    doc! { "$set": {
                        "status": doc.status.as_str(),
                        "metadata.updated_at": DateTime::now(),
                    } },
                )
                .await?;
        }
        Ok(())
    }

    async fn remove(&self, challenge_id: ChallengeId, member_id: MemberId) -> Result<()> {
        self.col
            .delete_many(Self::key_filter(challenge_id, member_id))
            .await?;
        Ok(())
    }

    async fn remove_for_challenge(&self, challenge_id: ChallengeId) -> Result<u64> {
        let result = self
            .col
            .delete_many(doc! { "challenge_id": challenge_id.to_string() })
            .await?;
        Ok(result.deleted_count)
    }
}

/// Record collection backed by MongoDB
pub struct MongoRecordStore {
    col: MongoCollection<RecordDoc>,
}

impl MongoRecordStore {
    pub async fn new(client: &MongoClient) -> Result<Self> {
        Ok(Self {
            col: client.collection(RECORD_COLLECTION).await?,
        })
    }

    fn day_filter(challenge_id: ChallengeId, member_id: MemberId, day: NaiveDate) -> Document {
        doc! {
            "challenge_id": challenge_id.to_string(),
            "member_id": member_id.to_string(),
            "day": day.to_string(),
        }
    }
}

#[async_trait]
impl RecordStore for MongoRecordStore {
    async fn upsert_measure(
        &self,
        challenge_id: ChallengeId,
        member_id: MemberId,
        day: NaiveDate,
        measure: Measure,
    ) -> Result<RecordDoc> {
        // The equality filter seeds challenge_id/member_id/day on insert;
        // $max keeps the best submission of the day, $inc accumulates.
        let fold = if measure.kind().is_cumulative() {
            doc! { "$inc": { "measure.value": measure.value() } }
        } else {
            doc! { "$max": { "measure.value": measure.value() } }
        };

        let mut update = doc! {
            "$setOnInsert": {
                "measure.metric": measure.kind().as_str(),
                "passed": false,
                "metadata.is_deleted": false,
                "metadata.created_at": DateTime::now(),
            },
            "$set": { "metadata.updated_at": DateTime::now() },
        };
        update.extend(fold);

        self.col
            .find_one_and_upsert(Self::day_filter(challenge_id, member_id, day), update)
            .await?
            .ok_or_else(|| GauntletError::Internal("record upsert returned no document".into()))
    }

    async fn mark_passed(
        &self,
        challenge_id: ChallengeId,
        member_id: MemberId,
        day: NaiveDate,
    ) -> Result<()> {
        let mut filter = Self::day_filter(challenge_id, member_id, day);
        filter.insert("passed", doc! { "$ne": true });
        self.col
            .update_one(
                filter,
                doc! { "$set": { "passed": true, "metadata.updated_at": DateTime::now() } },
            )
            .await?;
        Ok(())
    }

    async fn mark_all_passed(&self, challenge_id: ChallengeId) -> Result<u64> {
        let result = self
            .col
            .update_many(
                doc! {
                    "challenge_id": challenge_id.to_string(),
                    "passed": { "$ne": true },
                },
                doc! { "$set": { "passed": true, "metadata.updated_at": DateTime::now() } },
            )
            .await?;
        Ok(result.modified_count)
    }

    async fn find_day(
        &self,
        challenge_id: ChallengeId,
        member_id: MemberId,
        day: NaiveDate,
    ) -> Result<Option<RecordDoc>> {
        self.col
            .find_one(Self::day_filter(challenge_id, member_id, day))
            .await
    }

    async fn for_challenge(&self, challenge_id: ChallengeId) -> Result<Vec<RecordDoc>> {
        self.col
            .find_many(doc! { "challenge_id": challenge_id.to_string() })
            .await
    }

    async fn for_member(&self, member_id: MemberId) -> Result<Vec<RecordDoc>> {
        self.col
            .find_many_sorted(
                doc! { "member_id": member_id.to_string() },
                Some(doc! { "day": -1 }),
            )
            .await
    }

    async fn for_member_in_challenge(
        &self,
        member_id: MemberId,
        challenge_id: ChallengeId,
    ) -> Result<Vec<RecordDoc>> {
        self.col
            .find_many_sorted(
                doc! {
                    "member_id": member_id.to_string(),
                    "challenge_id": challenge_id.to_string(),
                },
                Some(doc! { "day": 1 }),
            )
            .await
    }

    async fn sum_measure(&self, member_id: MemberId, challenge_id: ChallengeId) -> Result<i64> {
        let records = self.for_member_in_challenge(member_id, challenge_id).await?;
        Ok(records.iter().map(|r| r.measure.value()).sum())
    }

    async fn remove_for_challenge(&self, challenge_id: ChallengeId) -> Result<u64> {
        let result = self
            .col
            .delete_many(doc! { "challenge_id": challenge_id.to_string() })
            .await?;
        Ok(result.deleted_count)
    }
}
