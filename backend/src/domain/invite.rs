//! Tokenised, time-limited invitations to take a clergy or staff role.
//!
//! The plaintext token is returned once at creation. Only its SHA-256 digest
//! is stored, so a database leak does not expose usable invitations.

use chrono::{DateTime, Duration, Utc};
use rand::RngCore;
use rand::rngs::OsRng;
use sha2::{Digest, Sha256};
use uuid::Uuid;
use zeroize::Zeroizing;

use super::text_enum::text_enum;
use super::{Email, UserId, UserRole};

/// Default invite lifetime in days.
pub const DEFAULT_INVITE_TTL_DAYS: i64 = 7;
/// Longest lifetime an inviter may request, in days.
pub const MAX_INVITE_TTL_DAYS: i64 = 30;

const TOKEN_BYTES: usize = 32;

text_enum! {
    /// Invite lifecycle state.
    pub enum InviteStatus, parse error ParseInviteStatusError ("invite status") {
        Pending => "pending",
        Accepted => "accepted",
        Revoked => "revoked",
        Expired => "expired",
    }
}

/// Validation errors for invites.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InviteValidationError {
    #[error("role {role} cannot be granted by invitation")]
    RoleNotInvitable { role: UserRole },
    #[error("{role} invites require a parish")]
    ParishRequired { role: UserRole },
    #[error("bishop invites require a diocese")]
    DioceseRequired,
    #[error("invite lifetime must be between 1 and {max} days")]
    TtlOutOfRange { max: i64 },
    #[error("invite token is malformed")]
    MalformedToken,
}

/// Reasons an invite can no longer be used.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum InviteStateError {
    #[error("invite has already been accepted")]
    AlreadyAccepted,
    #[error("invite has been revoked")]
    Revoked,
    #[error("invite has expired")]
    Expired,
}

/// Plaintext invite token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InviteToken(Zeroizing<String>);

impl InviteToken {
    /// Generate a fresh random token.
    pub fn generate() -> Self {
        let mut bytes = Zeroizing::new([0_u8; TOKEN_BYTES]);
        OsRng.fill_bytes(&mut bytes[..]);
        Self(Zeroizing::new(hex::encode(&bytes[..])))
    }

    /// Parse a token presented by a client.
    pub fn parse(raw: &str) -> Result<Self, InviteValidationError> {
        let trimmed = raw.trim();
        let well_formed = trimmed.len() == TOKEN_BYTES * 2
            && trimmed.chars().all(|c| c.is_ascii_hexdigit());
        if !well_formed {
            return Err(InviteValidationError::MalformedToken);
        }
        Ok(Self(Zeroizing::new(trimmed.to_ascii_lowercase())))
    }

    pub fn expose(&self) -> &str {
        self.0.as_str()
    }

    /// Hex-encoded SHA-256 digest used as the lookup key.
    ///
    /// # Examples
    /// ```
    /// use confesapp::domain::InviteToken;
    ///
    /// let token = InviteToken::generate();
    /// let parsed = InviteToken::parse(token.expose()).unwrap();
    /// assert_eq!(token.digest(), parsed.digest());
    /// assert_eq!(token.digest().len(), 64);
    /// ```
    pub fn digest(&self) -> String {
        hex::encode(Sha256::digest(self.0.as_bytes()))
    }
}

/// Validate a requested lifetime, defaulting to [`DEFAULT_INVITE_TTL_DAYS`].
pub fn invite_ttl(days: Option<i64>) -> Result<Duration, InviteValidationError> {
    let days = days.unwrap_or(DEFAULT_INVITE_TTL_DAYS);
    if !(1..=MAX_INVITE_TTL_DAYS).contains(&days) {
        return Err(InviteValidationError::TtlOutOfRange {
            max: MAX_INVITE_TTL_DAYS,
        });
    }
    Ok(Duration::days(days))
}

/// Input payload for [`Invite::new`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InviteDraft {
    pub id: Uuid,
    pub token_digest: String,
    pub email: Email,
    pub role: UserRole,
    pub parish_id: Option<Uuid>,
    pub diocese_id: Option<Uuid>,
    pub invited_by: UserId,
    pub status: InviteStatus,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

/// Offer for a user to assume a role within a parish or diocese.
///
/// ## Invariants
/// - `role` is one of priest, parish staff or bishop.
/// - priest and parish staff invites carry a parish; bishop invites carry a
///   diocese.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invite {
    id: Uuid,
    token_digest: String,
    email: Email,
    role: UserRole,
    parish_id: Option<Uuid>,
    diocese_id: Option<Uuid>,
    invited_by: UserId,
    status: InviteStatus,
    expires_at: DateTime<Utc>,
    created_at: DateTime<Utc>,
}

impl Invite {
    /// Validate and construct an invite.
    pub fn new(draft: InviteDraft) -> Result<Self, InviteValidationError> {
        Self::try_from(draft)
    }

    pub fn id(&self) -> Uuid {
        self.id
    }
    pub fn token_digest(&self) -> &str {
        self.token_digest.as_str()
    }
    pub fn email(&self) -> &Email {
        &self.email
    }
    pub fn role(&self) -> UserRole {
        self.role
    }
    pub fn parish_id(&self) -> Option<Uuid> {
        self.parish_id
    }
    pub fn diocese_id(&self) -> Option<Uuid> {
        self.diocese_id
    }
    pub fn invited_by(&self) -> UserId {
        self.invited_by
    }
    pub fn status(&self) -> InviteStatus {
        self.status
    }
    pub fn expires_at(&self) -> DateTime<Utc> {
        self.expires_at
    }
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }

    /// Confirm the invite can still be accepted at `now`.
    pub fn ensure_usable(&self, now: DateTime<Utc>) -> Result<(), InviteStateError> {
        match self.status {
            InviteStatus::Accepted => Err(InviteStateError::AlreadyAccepted),
            InviteStatus::Revoked => Err(InviteStateError::Revoked),
            InviteStatus::Expired => Err(InviteStateError::Expired),
            InviteStatus::Pending if self.is_expired(now) => Err(InviteStateError::Expired),
            InviteStatus::Pending => Ok(()),
        }
    }

    /// Whether `email` is the address the invite was sent to.
    pub fn is_addressed_to(&self, email: &Email) -> bool {
        &self.email == email
    }

    #[must_use]
    pub fn with_status(mut self, status: InviteStatus) -> Self {
        self.status = status;
        self
    }
}

impl TryFrom<InviteDraft> for Invite {
    type Error = InviteValidationError;

    fn try_from(draft: InviteDraft) -> Result<Self, Self::Error> {
        match draft.role {
            UserRole::Priest | UserRole::ParishStaff if draft.parish_id.is_none() => {
                return Err(InviteValidationError::ParishRequired { role: draft.role });
            }
            UserRole::Bishop if draft.diocese_id.is_none() => {
                return Err(InviteValidationError::DioceseRequired);
            }
            UserRole::Priest | UserRole::ParishStaff | UserRole::Bishop => {}
            role @ (UserRole::Faithful | UserRole::Admin) => {
                return Err(InviteValidationError::RoleNotInvitable { role });
            }
        }

        Ok(Self {
            id: draft.id,
            token_digest: draft.token_digest,
            email: draft.email,
            role: draft.role,
            parish_id: draft.parish_id,
            diocese_id: draft.diocese_id,
            invited_by: draft.invited_by,
            status: draft.status,
            expires_at: draft.expires_at,
            created_at: draft.created_at,
        })
    }
}
