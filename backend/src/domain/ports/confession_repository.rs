//! Port for confessions and the transactional booking transitions.
//!
//! Adapters lock the target slot or band row, run the matching
//! `scheduling::plan_*` function against it and persist the plan in the same
//! transaction.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::UserId;
use crate::domain::scheduling::{
    BookingRejection, BookingRequest, Confession, ConfessionStatus,
};

use super::define_port_error;

define_port_error! {
    /// Persistence errors raised by confession repository adapters.
    pub enum ConfessionRepositoryError ("confession repository") {
        /// The referenced slot or band does not exist.
        TargetNotFound => "confession slot or band not found",
        /// The confession disappeared between read and lock.
        ConfessionNotFound => "confession not found",
        /// A booking rule refused the transition.
        Rejected { reason: BookingRejection } => "{reason}",
    }
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ConfessionRepository: Send + Sync {
    /// Book against the request's target.
    async fn book(
        &self,
        request: &BookingRequest,
        now: DateTime<Utc>,
    ) -> Result<Confession, ConfessionRepositoryError>;

    /// Cancel and release capacity.
    async fn cancel(
        &self,
        id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<Confession, ConfessionRepositoryError>;

    /// Complete after the scheduled time.
    async fn complete(
        &self,
        id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<Confession, ConfessionRepositoryError>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Confession>, ConfessionRepositoryError>;

    /// Confessions booked by the faithful, newest scheduled first.
    async fn list_for_faithful(
        &self,
        faithful_id: UserId,
    ) -> Result<Vec<Confession>, ConfessionRepositoryError>;

    /// Confessions heard by the priest, soonest first.
    async fn list_for_priest(
        &self,
        priest_id: UserId,
        status: Option<ConfessionStatus>,
    ) -> Result<Vec<Confession>, ConfessionRepositoryError>;
}
