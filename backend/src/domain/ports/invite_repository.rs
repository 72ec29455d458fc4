//! Port for invite persistence, including the transactional accept paths.

use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::{Invite, InviteStatus, PriestParishHistory, User, UserId};

use super::define_port_error;

define_port_error! {
    /// Persistence errors raised by invite repository adapters.
    pub enum InviteRepositoryError ("invite repository") {
        /// Registration collided with an existing account.
        DuplicateEmail { email: String } => "email {email} is already registered",
    }
}

/// User changes applied when an invite is accepted.
///
/// Adapters apply the whole grant in one transaction, and only when the
/// invite is still `pending`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InviteGrant {
    pub invite_id: Uuid,
    /// User row carrying the granted role and association. A bishop grant
    /// also makes the user head of that diocese when it has no head, and any
    /// grant releases the user from heading other dioceses.
    pub user: User,
    /// Assignment opened for priest invites. Any active entry for the same
    /// priest is closed first.
    pub history: Option<PriestParishHistory>,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait InviteRepository: Send + Sync {
    async fn create(&self, invite: &Invite) -> Result<(), InviteRepositoryError>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Invite>, InviteRepositoryError>;

    /// Look up an invite by the SHA-256 digest of its token.
    async fn find_by_digest(&self, digest: &str) -> Result<Option<Invite>, InviteRepositoryError>;

    /// Invites newest first, optionally only those sent by `invited_by`.
    async fn list(
        &self,
        invited_by: Option<UserId>,
    ) -> Result<Vec<Invite>, InviteRepositoryError>;

    /// Compare-and-set status change. Returns `false` if the stored status
    /// was no longer `from`.
    async fn transition(
        &self,
        id: Uuid,
        from: InviteStatus,
        to: InviteStatus,
    ) -> Result<bool, InviteRepositoryError>;

    /// Accept for an existing user. Returns `false` if the invite was no
    /// longer pending.
    async fn accept(&self, grant: &InviteGrant) -> Result<bool, InviteRepositoryError>;

    /// Insert `grant.user` with `password_hash` and accept. Returns `false`
    /// if the invite was no longer pending.
    async fn register(
        &self,
        grant: &InviteGrant,
        password_hash: &str,
    ) -> Result<bool, InviteRepositoryError>;
}
