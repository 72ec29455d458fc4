//! Driving port for invitations.

use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::{
    Actor, Email, Error, Invite, InviteToken, NewPassword, PersonName, User, UserRole,
};

/// Payload for issuing an invite.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewInvite {
    pub email: Email,
    pub role: UserRole,
    pub parish_id: Option<Uuid>,
    pub diocese_id: Option<Uuid>,
    pub ttl_days: Option<i64>,
}

/// A stored invite and its plaintext token, returned once.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssuedInvite {
    pub invite: Invite,
    pub token: InviteToken,
}

/// Profile supplied when registering through an invite. The email comes
/// from the invite.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InviteRegistration {
    pub password: NewPassword,
    pub first_name: PersonName,
    pub last_name: PersonName,
    pub phone: Option<String>,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait InvitesService: Send + Sync {
    async fn create(&self, actor: &Actor, invite: NewInvite) -> Result<IssuedInvite, Error>;

    async fn list(&self, actor: &Actor) -> Result<Vec<Invite>, Error>;

    /// Public lookup of a usable invite.
    async fn inspect(&self, token: &InviteToken) -> Result<Invite, Error>;

    /// Grant the invite's role to the caller.
    async fn accept(&self, actor: &Actor, token: &InviteToken) -> Result<User, Error>;

    /// Create an account from the invite and accept it.
    async fn register(
        &self,
        token: &InviteToken,
        registration: InviteRegistration,
    ) -> Result<User, Error>;

    async fn revoke(&self, actor: &Actor, id: Uuid) -> Result<Invite, Error>;
}
