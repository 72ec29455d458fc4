//! Diocese entity.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::{DirectoryValidationError, validate_name};
use crate::domain::UserId;

/// Input payload for [`Diocese::new`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DioceseDraft {
    pub id: Uuid,
    pub name: String,
    pub bishop_id: Option<UserId>,
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Partial update for a diocese.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DioceseChanges {
    pub name: Option<String>,
    pub bishop_id: Option<UserId>,
}

/// Top-level administrative region headed by a bishop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diocese {
    id: Uuid,
    name: String,
    bishop_id: Option<UserId>,
    active: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl Diocese {
    /// Validate and construct a diocese.
    pub fn new(draft: DioceseDraft) -> Result<Self, DirectoryValidationError> {
        Self::try_from(draft)
    }

    pub fn id(&self) -> Uuid {
        self.id
    }
    pub fn name(&self) -> &str {
        self.name.as_str()
    }
    pub fn bishop_id(&self) -> Option<UserId> {
        self.bishop_id
    }
    pub fn is_active(&self) -> bool {
        self.active
    }
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Whether `user_id` is this diocese's bishop.
    pub fn is_headed_by(&self, user_id: UserId) -> bool {
        self.bishop_id == Some(user_id)
    }

    /// Apply a partial update.
    pub fn apply(
        mut self,
        changes: DioceseChanges,
        now: DateTime<Utc>,
    ) -> Result<Self, DirectoryValidationError> {
        if let Some(name) = changes.name {
            self.name = validate_name(&name)?;
        }
        if let Some(bishop_id) = changes.bishop_id {
            self.bishop_id = Some(bishop_id);
        }
        self.updated_at = now;
        Ok(self)
    }

    /// Soft-delete the diocese.
    #[must_use]
    pub fn deactivated(mut self, now: DateTime<Utc>) -> Self {
        self.active = false;
        self.updated_at = now;
        self
    }
}

impl TryFrom<DioceseDraft> for Diocese {
    type Error = DirectoryValidationError;

    fn try_from(draft: DioceseDraft) -> Result<Self, Self::Error> {
        Ok(Self {
            id: draft.id,
            name: validate_name(&draft.name)?,
            bishop_id: draft.bishop_id,
            active: draft.active,
            created_at: draft.created_at,
            updated_at: draft.updated_at,
        })
    }
}
