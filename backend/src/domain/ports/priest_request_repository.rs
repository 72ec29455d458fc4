//! Port for priest parish requests and assignment history.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::{PriestParishHistory, PriestParishRequest, RequestStatus, UserId};

use super::define_port_error;

define_port_error! {
    /// Persistence errors raised by priest request repository adapters.
    pub enum PriestRequestRepositoryError ("priest request repository") {
        /// The priest already has a pending request for the parish.
        DuplicatePending => "a pending request for this parish already exists",
    }
}

/// Which requests a caller may see.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestScope {
    All,
    Priest(UserId),
    Parish(Uuid),
    /// Requests for any parish of the diocese.
    Diocese(Uuid),
}

/// Everything written when a request is accepted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestAcceptance {
    /// Request already marked accepted with reviewer fields.
    pub request: PriestParishRequest,
    pub diocese_id: Uuid,
    pub history: PriestParishHistory,
    pub now: DateTime<Utc>,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PriestRequestRepository: Send + Sync {
    async fn create(&self, request: &PriestParishRequest)
    -> Result<(), PriestRequestRepositoryError>;

    async fn find_by_id(
        &self,
        id: Uuid,
    ) -> Result<Option<PriestParishRequest>, PriestRequestRepositoryError>;

    /// Requests newest first.
    async fn list(
        &self,
        scope: RequestScope,
        status: Option<RequestStatus>,
    ) -> Result<Vec<PriestParishRequest>, PriestRequestRepositoryError>;

    /// Store a rejection if the request is still pending.
    async fn reject(
        &self,
        request: &PriestParishRequest,
    ) -> Result<bool, PriestRequestRepositoryError>;

    /// In one transaction: mark the request accepted (if still pending),
    /// close the priest's active history, open `history` and move the priest
    /// to the parish.
    async fn accept(
        &self,
        acceptance: &RequestAcceptance,
    ) -> Result<bool, PriestRequestRepositoryError>;

    /// Assignment history, newest start first.
    async fn history(
        &self,
        priest_id: UserId,
    ) -> Result<Vec<PriestParishHistory>, PriestRequestRepositoryError>;
}
