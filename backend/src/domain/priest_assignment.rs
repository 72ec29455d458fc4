//! Priest requests to serve a parish and the resulting assignment history.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::text_enum::text_enum;
use super::UserId;

/// Maximum length of the optional message attached to a request.
pub const REQUEST_MESSAGE_MAX: usize = 1000;

text_enum! {
    /// Review state of a [`PriestParishRequest`].
    pub enum RequestStatus, parse error ParseRequestStatusError ("request status") {
        Pending => "pending",
        Accepted => "accepted",
        Rejected => "rejected",
    }
}

/// Errors raised by request construction and review.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PriestRequestError {
    #[error("message must be at most {max} characters")]
    MessageTooLong { max: usize },
    #[error("request has already been {status}")]
    AlreadyReviewed { status: RequestStatus },
}

/// Input payload for [`PriestParishRequest::new`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PriestParishRequestDraft {
    pub id: Uuid,
    pub priest_id: UserId,
    pub parish_id: Uuid,
    pub message: Option<String>,
    pub status: RequestStatus,
    pub reviewed_by: Option<UserId>,
    pub reviewed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

/// A priest's request to be assigned to a parish.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PriestParishRequest {
    id: Uuid,
    priest_id: UserId,
    parish_id: Uuid,
    message: Option<String>,
    status: RequestStatus,
    reviewed_by: Option<UserId>,
    reviewed_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
}

impl PriestParishRequest {
    /// Validate and construct a request.
    pub fn new(draft: PriestParishRequestDraft) -> Result<Self, PriestRequestError> {
        Self::try_from(draft)
    }

    pub fn id(&self) -> Uuid {
        self.id
    }
    pub fn priest_id(&self) -> UserId {
        self.priest_id
    }
    pub fn parish_id(&self) -> Uuid {
        self.parish_id
    }
    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }
    pub fn status(&self) -> RequestStatus {
        self.status
    }
    pub fn reviewed_by(&self) -> Option<UserId> {
        self.reviewed_by
    }
    pub fn reviewed_at(&self) -> Option<DateTime<Utc>> {
        self.reviewed_at
    }
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Record a review decision. Only pending requests can be reviewed.
    pub fn reviewed(
        mut self,
        decision: RequestStatus,
        reviewer: UserId,
        now: DateTime<Utc>,
    ) -> Result<Self, PriestRequestError> {
        if self.status != RequestStatus::Pending {
            return Err(PriestRequestError::AlreadyReviewed {
                status: self.status,
            });
        }
        self.status = decision;
        self.reviewed_by = Some(reviewer);
        self.reviewed_at = Some(now);
        Ok(self)
    }
}

impl TryFrom<PriestParishRequestDraft> for PriestParishRequest {
    type Error = PriestRequestError;

    fn try_from(draft: PriestParishRequestDraft) -> Result<Self, Self::Error> {
        let message = draft
            .message
            .map(|message| message.trim().to_owned())
            .filter(|message| !message.is_empty());
        if message
            .as_ref()
            .is_some_and(|m| m.chars().count() > REQUEST_MESSAGE_MAX)
        {
            return Err(PriestRequestError::MessageTooLong {
                max: REQUEST_MESSAGE_MAX,
            });
        }
        Ok(Self {
            id: draft.id,
            priest_id: draft.priest_id,
            parish_id: draft.parish_id,
            message,
            status: draft.status,
            reviewed_by: draft.reviewed_by,
            reviewed_at: draft.reviewed_at,
            created_at: draft.created_at,
        })
    }
}

/// One period a priest served at a parish.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PriestParishHistory {
    id: Uuid,
    priest_id: UserId,
    parish_id: Uuid,
    start_date: DateTime<Utc>,
    end_date: Option<DateTime<Utc>>,
    active: bool,
}

impl PriestParishHistory {
    /// Open a new active assignment starting at `now`.
    pub fn open(priest_id: UserId, parish_id: Uuid, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            priest_id,
            parish_id,
            start_date: now,
            end_date: None,
            active: true,
        }
    }

    /// Rebuild an entry from storage.
    pub fn restore(
        id: Uuid,
        priest_id: UserId,
        parish_id: Uuid,
        start_date: DateTime<Utc>,
        end_date: Option<DateTime<Utc>>,
        active: bool,
    ) -> Self {
        Self {
            id,
            priest_id,
            parish_id,
            start_date,
            end_date,
            active,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }
    pub fn priest_id(&self) -> UserId {
        self.priest_id
    }
    pub fn parish_id(&self) -> Uuid {
        self.parish_id
    }
    pub fn start_date(&self) -> DateTime<Utc> {
        self.start_date
    }
    pub fn end_date(&self) -> Option<DateTime<Utc>> {
        self.end_date
    }
    pub fn is_active(&self) -> bool {
        self.active
    }
}
