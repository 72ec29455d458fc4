//! Driving ports for confession slots, bands and bookings.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::scheduling::{
    BandStatus, Confession, ConfessionBand, ConfessionSlot, ConfessionStatus, Recurrence,
    SlotChanges, SlotStatus,
};
use crate::domain::{Actor, Error};

use super::ScheduleFilter;

/// Payload for creating a slot. The priest and parish come from the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewSlot {
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub notes: Option<String>,
}

/// Payload for creating a band or a recurring band series.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewBandSeries {
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub capacity: u32,
    pub recurrence: Recurrence,
    pub recurrence_until: Option<DateTime<Utc>>,
    pub notes: Option<String>,
}

/// Raw booking payload; exactly one target id must be present.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BookConfession {
    pub slot_id: Option<Uuid>,
    pub band_id: Option<Uuid>,
    pub notes: Option<String>,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ConfessionSlotsService: Send + Sync {
    async fn create(&self, actor: &Actor, slot: NewSlot) -> Result<ConfessionSlot, Error>;

    async fn list(&self, filter: ScheduleFilter<SlotStatus>) -> Result<Vec<ConfessionSlot>, Error>;

    async fn get(&self, id: Uuid) -> Result<ConfessionSlot, Error>;

    async fn update(
        &self,
        actor: &Actor,
        id: Uuid,
        changes: SlotChanges,
    ) -> Result<ConfessionSlot, Error>;

    async fn delete(&self, actor: &Actor, id: Uuid) -> Result<(), Error>;
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ConfessionBandsService: Send + Sync {
    /// Create one band per occurrence; returns the series in start order.
    async fn create(
        &self,
        actor: &Actor,
        series: NewBandSeries,
    ) -> Result<Vec<ConfessionBand>, Error>;

    async fn list(&self, filter: ScheduleFilter<BandStatus>) -> Result<Vec<ConfessionBand>, Error>;

    async fn get(&self, id: Uuid) -> Result<ConfessionBand, Error>;

    async fn update_capacity(
        &self,
        actor: &Actor,
        id: Uuid,
        capacity: u32,
    ) -> Result<ConfessionBand, Error>;

    async fn cancel(&self, actor: &Actor, id: Uuid) -> Result<ConfessionBand, Error>;
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ConfessionsService: Send + Sync {
    async fn book(&self, actor: &Actor, booking: BookConfession) -> Result<Confession, Error>;

    async fn cancel(&self, actor: &Actor, id: Uuid) -> Result<Confession, Error>;

    async fn complete(&self, actor: &Actor, id: Uuid) -> Result<Confession, Error>;

    async fn get(&self, actor: &Actor, id: Uuid) -> Result<Confession, Error>;

    async fn list_mine(&self, actor: &Actor) -> Result<Vec<Confession>, Error>;

    async fn list_for_priest(
        &self,
        actor: &Actor,
        status: Option<ConfessionStatus>,
    ) -> Result<Vec<Confession>, Error>;
}
