//! Store contracts for challenges, memberships, and records
//!
//! The domain services talk to persistence only through these traits.
//! Two backends exist: MongoDB ([`mongo`]) for production and an in-memory
//! map ([`memory`]) for dev mode and tests.

pub mod memory;
pub mod mongo;

use async_trait::async_trait;
use chrono::NaiveDate;

use crate::db::schemas::{
    ChallengeDoc, ChallengeStatus, Measure, MembershipDoc, MembershipStatus, RecordDoc,
};
use crate::types::{ChallengeId, MemberId, Result};

pub use memory::MemoryStore;
pub use mongo::{MongoChallengeStore, MongoMembershipStore, MongoRecordStore};

/// Challenge persistence contract
#[async_trait]
pub trait ChallengeStore: Send + Sync {
    /// Persist a new challenge, returning it with its storage id set
    async fn insert(&self, doc: ChallengeDoc) -> Result<ChallengeDoc>;

    /// Find a challenge by id
    async fn find(&self, challenge_id: ChallengeId) -> Result<Option<ChallengeDoc>>;

    /// List challenges, optionally filtered by status, newest first
    async fn list(&self, status: Option<ChallengeStatus>) -> Result<Vec<ChallengeDoc>>;

    /// Find all challenges with the given ids
    async fn find_by_ids(&self, ids: &[ChallengeId]) -> Result<Vec<ChallengeDoc>>;

    /// Challenges created by the given member
    async fn hosted_by(&self, member_id: MemberId) -> Result<Vec<ChallengeDoc>>;

    /// Open challenges whose start date equals the given day
    async fn starting(&self, start_date: NaiveDate) -> Result<Vec<ChallengeDoc>>;

    /// In-progress challenges whose end date equals the given day
    async fn ending(&self, end_date: NaiveDate) -> Result<Vec<ChallengeDoc>>;

    /// Challenges whose date window contains the given day
    async fn ongoing(&self, today: NaiveDate) -> Result<Vec<ChallengeDoc>>;

    /// Challenges starting after the given day
    async fn upcoming(&self, today: NaiveDate) -> Result<Vec<ChallengeDoc>>;

    /// Challenges whose date window closed before the given day
    async fn ended_before(&self, today: NaiveDate) -> Result<Vec<ChallengeDoc>>;

    /// Persist the current state of an existing challenge
    async fn save(&self, doc: &ChallengeDoc) -> Result<()>;

    /// Remove a challenge (memberships and records go with it)
    async fn delete(&self, challenge_id: ChallengeId) -> Result<()>;
}

/// Membership persistence contract
#[async_trait]
pub trait MembershipStore: Send + Sync {
    async fn insert(&self, doc: MembershipDoc) -> Result<MembershipDoc>;

    async fn find(
        &self,
        challenge_id: ChallengeId,
        member_id: MemberId,
    ) -> Result<Option<MembershipDoc>>;

    async fn exists(&self, challenge_id: ChallengeId, member_id: MemberId) -> Result<bool>;

    /// All memberships of a challenge, in join-time order
    async fn for_challenge(&self, challenge_id: ChallengeId) -> Result<Vec<MembershipDoc>>;

    /// Ids of the challenges where the member holds the given status
    async fn challenge_ids_for_member(
        &self,
        member_id: MemberId,
        status: MembershipStatus,
    ) -> Result<Vec<ChallengeId>>;

    /// Persist status changes for a batch of memberships
    async fn save_all(&self, docs: &[MembershipDoc]) -> Result<()>;

    /// Remove a single membership (voluntary leave)
    async fn remove(&self, challenge_id: ChallengeId, member_id: MemberId) -> Result<()>;

    /// Remove every membership of a challenge (owning-challenge deletion)
    async fn remove_for_challenge(&self, challenge_id: ChallengeId) -> Result<u64>;
}

/// Activity record persistence contract
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Atomically fold a submission into the (challenge, member, day) record,
    /// creating it if absent. Count/duration keep the best value of the day;
    /// distance accumulates. Returns the post-update record.
    async fn upsert_measure(
        &self,
        challenge_id: ChallengeId,
        member_id: MemberId,
        day: NaiveDate,
        measure: Measure,
    ) -> Result<RecordDoc>;

    /// Set the pass flag on one record; a set flag is never cleared
    async fn mark_passed(
        &self,
        challenge_id: ChallengeId,
        member_id: MemberId,
        day: NaiveDate,
    ) -> Result<()>;

    /// Set the pass flag on every record of a challenge, returning how many
    /// records were newly marked
    async fn mark_all_passed(&self, challenge_id: ChallengeId) -> Result<u64>;

    async fn find_day(
        &self,
        challenge_id: ChallengeId,
        member_id: MemberId,
        day: NaiveDate,
    ) -> Result<Option<RecordDoc>>;

    async fn for_challenge(&self, challenge_id: ChallengeId) -> Result<Vec<RecordDoc>>;

    async fn for_member(&self, member_id: MemberId) -> Result<Vec<RecordDoc>>;

    async fn for_member_in_challenge(
        &self,
        member_id: MemberId,
        challenge_id: ChallengeId,
    ) -> Result<Vec<RecordDoc>>;

    /// Sum of the member's measure values across all their records in the
    /// challenge
    async fn sum_measure(&self, member_id: MemberId, challenge_id: ChallengeId) -> Result<i64>;

    /// Remove every record of a challenge (owning-challenge deletion)
    async fn remove_for_challenge(&self, challenge_id: ChallengeId) -> Result<u64>;
}
