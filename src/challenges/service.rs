//! Challenge creation, membership, and queries

use std::sync::Arc;

use chrono::NaiveDate;
use tracing::info;

use crate::db::schemas::{
    ChallengeDoc, ChallengeKind, ChallengeStatus, Goal, MembershipDoc, MembershipStatus, RecordDoc,
};
use crate::store::{ChallengeStore, MembershipStore, RecordStore};
use crate::types::{ChallengeId, GauntletError, MemberId, Result};

/// Parameters for creating a challenge
#[derive(Debug, Clone)]
pub struct NewChallenge {
    pub kind: ChallengeKind,
    pub title: String,
    pub description: String,
    pub goal: Goal,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub max_participants: i32,
}

/// Challenge lifecycle entry points for members
pub struct ChallengeService {
    challenges: Arc<dyn ChallengeStore>,
    memberships: Arc<dyn MembershipStore>,
    records: Arc<dyn RecordStore>,
}

impl ChallengeService {
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

    /// Create an open challenge hosted by the given member
    pub async fn create(&self, host_id: MemberId, req: NewChallenge) -> Result<ChallengeDoc> {
        if req.title.trim().is_empty() {
            return Err(GauntletError::InvalidInput("title must not be empty".into()));
        }
        if req.start_date >= req.end_date {
            return Err(GauntletError::InvalidInput(format!(
                "start date {} must be before end date {}",
                req.start_date, req.end_date
            )));
        }
        if req.max_participants < 1 {
            return Err(GauntletError::InvalidInput(
                "max participants must be at least 1".into(),
            ));
        }
        if req.goal.target() <= 0 {
            return Err(GauntletError::InvalidInput(format!(
                "goal {} target must be positive",
                req.goal.kind().as_str()
            )));
        }

        let doc = ChallengeDoc::new(
            host_id,
            req.kind,
            req.title,
            req.description,
            req.goal,
            req.start_date,
            req.end_date,
            req.max_participants,
        );
        let doc = self.challenges.insert(doc).await?;
        info!(challenge = %doc.challenge_id, host = %host_id, "challenge created");
        Ok(doc)
    }

    /// Find a challenge or fail with NotFound
    pub async fn get(&self, challenge_id: ChallengeId) -> Result<ChallengeDoc> {
        self.challenges
            .find(challenge_id)
            .await?
            .ok_or_else(|| GauntletError::NotFound(format!("no challenge with id {}", challenge_id)))
    }

    /// List challenges, optionally by status, newest first
    pub async fn list(&self, status: Option<ChallengeStatus>) -> Result<Vec<ChallengeDoc>> {
        self.challenges.list(status).await
    }

    /// Sign a member up for an open challenge
    pub async fn join(&self, member_id: MemberId, challenge_id: ChallengeId) -> Result<MembershipDoc> {
        let mut challenge = self.get(challenge_id).await?;

        if self.memberships.exists(challenge_id, member_id).await? {
            return Err(GauntletError::Conflict(format!(
                "member {} already applied to challenge {}",
                member_id, challenge_id
            )));
        }
        match challenge.status {
            ChallengeStatus::Open => {}
            ChallengeStatus::Progress => {
                return Err(GauntletError::Conflict(
                    "challenge is already in progress".into(),
                ));
            }
            ChallengeStatus::Ended => {
                return Err(GauntletError::Conflict("challenge has ended".into()));
            }
        }
        if !challenge.has_capacity() {
            return Err(GauntletError::Conflict(format!(
                "challenge {} is full ({} participants)",
                challenge_id, challenge.max_participants
            )));
        }

        let membership = self
            .memberships
            .insert(MembershipDoc::new(challenge_id, member_id))
            .await?;

        challenge.current_participants += 1;
        self.challenges.save(&challenge).await?;

        info!(member = %member_id, challenge = %challenge_id, "member applied");
        Ok(membership)
    }

    /// Withdraw from a challenge that has not started yet
    pub async fn leave(&self, member_id: MemberId, challenge_id: ChallengeId) -> Result<()> {
        self.memberships
            .find(challenge_id, member_id)
            .await?
            .ok_or_else(|| {
                GauntletError::NotFound(format!(
                    "member {} is not a member of challenge {}",
                    member_id, challenge_id
                ))
            })?;

        let mut challenge = self.get(challenge_id).await?;
        if challenge.status != ChallengeStatus::Open {
            return Err(GauntletError::Conflict(format!(
                "cannot leave a {} challenge",
                challenge.status.as_str()
            )));
        }
        if challenge.current_participants <= 0 {
            return Err(GauntletError::Internal(format!(
                "challenge {} has no participants to remove",
                challenge_id
            )));
        }

        self.memberships.remove(challenge_id, member_id).await?;
        challenge.current_participants -= 1;
        self.challenges.save(&challenge).await?;

        info!(member = %member_id, challenge = %challenge_id, "member left");
        Ok(())
    }

    /// Delete a challenge along with its memberships and records
    pub async fn delete(&self, challenge_id: ChallengeId) -> Result<()> {
        // Records live and die with their owning challenge
        self.get(challenge_id).await?;
        self.records.remove_for_challenge(challenge_id).await?;
        self.memberships.remove_for_challenge(challenge_id).await?;
        self.challenges.delete(challenge_id).await?;
        info!(challenge = %challenge_id, "challenge deleted");
        Ok(())
    }

    /// Challenges created by the member
    pub async fn hosted_by(&self, member_id: MemberId) -> Result<Vec<ChallengeDoc>> {
        self.challenges.hosted_by(member_id).await
    }

    /// Challenges where the member holds the given membership status
    /// (applied / joined / past lists)
    pub async fn for_member_with_status(
        &self,
        member_id: MemberId,
        status: MembershipStatus,
    ) -> Result<Vec<ChallengeDoc>> {
        let ids = self
            .memberships
            .challenge_ids_for_member(member_id, status)
            .await?;
        self.challenges.find_by_ids(&ids).await
    }

    /// Challenges whose date window contains the given day
    pub async fn ongoing(&self, today: NaiveDate) -> Result<Vec<ChallengeDoc>> {
        self.challenges.ongoing(today).await
    }

    /// Challenges starting after the given day
    pub async fn upcoming(&self, today: NaiveDate) -> Result<Vec<ChallengeDoc>> {
        self.challenges.upcoming(today).await
    }

    /// Challenges whose date window closed before the given day
    pub async fn ended(&self, today: NaiveDate) -> Result<Vec<ChallengeDoc>> {
        self.challenges.ended_before(today).await
    }

    /// All of a member's records, newest first
    pub async fn member_records(&self, member_id: MemberId) -> Result<Vec<RecordDoc>> {
        let records = self.records.for_member(member_id).await?;
        if records.is_empty() {
            return Err(GauntletError::NotFound(format!(
                "member {} has no challenge records",
                member_id
            )));
        }
        Ok(records)
    }
}
