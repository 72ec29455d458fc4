//! Port for confession band persistence.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::scheduling::{BandStatus, ConfessionBand, SchedulingValidationError};

use super::{ScheduleFilter, define_port_error};

define_port_error! {
    /// Persistence errors raised by band repository adapters.
    pub enum ConfessionBandRepositoryError ("band repository") {
        /// The locked row failed a domain rule.
        Invalid { reason: SchedulingValidationError } => "{reason}",
    }
}

/// Result of cancelling a band.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BandCancellation {
    pub band: ConfessionBand,
    /// Number of `booked` confessions that were cancelled with it.
    pub cancelled_bookings: u64,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ConfessionBandRepository: Send + Sync {
    /// Insert every band of a series in one transaction.
    async fn create_series(
        &self,
        bands: &[ConfessionBand],
    ) -> Result<(), ConfessionBandRepositoryError>;

    async fn find_by_id(
        &self,
        id: Uuid,
    ) -> Result<Option<ConfessionBand>, ConfessionBandRepositoryError>;

    /// Bands ordered by start time.
    async fn list(
        &self,
        filter: ScheduleFilter<BandStatus>,
    ) -> Result<Vec<ConfessionBand>, ConfessionBandRepositoryError>;

    /// Lock the band, apply [`ConfessionBand::with_capacity`] and store it.
    async fn update_capacity(
        &self,
        id: Uuid,
        capacity: u32,
        now: DateTime<Utc>,
    ) -> Result<Option<ConfessionBand>, ConfessionBandRepositoryError>;

    /// Lock the band, cancel it and every `booked` confession on it.
    async fn cancel(
        &self,
        id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<Option<BandCancellation>, ConfessionBandRepositoryError>;
}
