//! Caller identity resolution
//!
//! Authentication itself lives outside this engine; the services only need
//! to know who the caller is. The boundary hands us an [`IdentityProvider`]
//! and every core operation takes the resolved member id as an explicit
//! parameter rather than reading ambient state.

use async_trait::async_trait;
use uuid::Uuid;

use crate::types::{GauntletError, MemberId, Result};

/// The member bound to the current request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CurrentMember {
    pub id: MemberId,
    /// Display name as known to the identity system (used in logs only)
    pub display_name: String,
}

impl CurrentMember {
    pub fn new(id: MemberId, display_name: impl Into<String>) -> Self {
        Self {
            id,
            display_name: display_name.into(),
        }
    }
}

/// Resolves the caller of the current operation
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Returns the current member, or `Unauthenticated` if none is bound
    async fn current_member(&self) -> Result<CurrentMember>;
}

/// Fixed identity for dev mode and tests
pub struct StaticIdentity {
    member: Option<CurrentMember>,
}

impl StaticIdentity {
    /// Provider that always resolves to the given member
    pub fn bound(member: CurrentMember) -> Self {
        Self {
            member: Some(member),
        }
    }

    /// Provider with no caller bound
    pub fn anonymous() -> Self {
        Self { member: None }
    }

    /// Dev-mode provider: binds the configured member id or a fresh one
    pub fn dev(member_id: Option<Uuid>) -> Self {
        let id = member_id.unwrap_or_else(Uuid::new_v4);
        Self::bound(CurrentMember::new(id, "dev-member"))
    }
}

#[async_trait]
impl IdentityProvider for StaticIdentity {
    async fn current_member(&self) -> Result<CurrentMember> {
        self.member
            .clone()
            .ok_or_else(|| GauntletError::Unauthenticated("no member bound to this call".into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_bound_identity_resolves() {
        let id = Uuid::new_v4();
        let provider = StaticIdentity::bound(CurrentMember::new(id, "tester"));
        let member = provider.current_member().await.unwrap();
        assert_eq!(member.id, id);
    }

    #[tokio::test]
    async fn test_anonymous_identity_fails() {
        let provider = StaticIdentity::anonymous();
        let err = provider.current_member().await.unwrap_err();
        assert!(matches!(err, GauntletError::Unauthenticated(_)));
    }
}
