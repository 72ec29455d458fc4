//! Multi-capacity confession bands and recurring series.

use std::sync::Arc;

use async_trait::async_trait;
use mockable::Clock;
use tracing::info;
use uuid::Uuid;

use crate::domain::ports::{
    ConfessionBandRepository, ConfessionBandRepositoryError, ConfessionBandsService,
    NewBandSeries, ScheduleFilter, UserRepository,
};
use crate::domain::scheduling::{
    BAND_MAX_HOURS, BandStatus, ConfessionBand, ConfessionBandDraft, Recurrence, SeriesRequest,
    TimeWindow, expand_series,
};
use crate::domain::service_support::{
    ensure_owner_or_admin, invalid_schedule, load_actor, load_assigned_priest,
};
use crate::domain::{Actor, Error};

/// Band service implementing [`ConfessionBandsService`].
#[derive(Clone)]
pub struct ConfessionBandsServiceImpl<B, U> {
    bands: Arc<B>,
    users: Arc<U>,
    clock: Arc<dyn Clock>,
}

impl<B, U> ConfessionBandsServiceImpl<B, U> {
    pub fn new(bands: Arc<B>, users: Arc<U>, clock: Arc<dyn Clock>) -> Self {
        Self {
            bands,
            users,
            clock,
        }
    }
}

fn band_error(err: ConfessionBandRepositoryError) -> Error {
    match err {
        ConfessionBandRepositoryError::Invalid { reason } => invalid_schedule(reason),
        other => other.into(),
    }
}

impl<B, U> ConfessionBandsServiceImpl<B, U>
where
    B: ConfessionBandRepository,
    U: UserRepository,
{
    async fn require_band(&self, id: Uuid) -> Result<ConfessionBand, Error> {
        self.bands
            .find_by_id(id)
            .await?
            .ok_or_else(|| band_not_found(id))
    }
}

fn band_not_found(id: Uuid) -> Error {
    Error::not_found(format!("confession band {id} not found"))
}

#[async_trait]
impl<B, U> ConfessionBandsService for ConfessionBandsServiceImpl<B, U>
where
    B: ConfessionBandRepository,
    U: UserRepository,
{
    async fn create(
        &self,
        actor: &Actor,
        series: NewBandSeries,
    ) -> Result<Vec<ConfessionBand>, Error> {
        let (scope, parish_id) =
            load_assigned_priest(self.users.as_ref(), actor, "create confession bands").await?;
        let now = self.clock.utc();
        let first = TimeWindow::new(series.start_time, series.end_time)
            .and_then(|window| window.ensure_max_hours(BAND_MAX_HOURS))
            .and_then(|window| window.ensure_future(now))
            .map_err(invalid_schedule)?;
        let windows = expand_series(&SeriesRequest {
            first,
            recurrence: series.recurrence,
            until: series.recurrence_until,
        })
        .map_err(invalid_schedule)?;

        let series_id = Uuid::new_v4();
        let bands = windows
            .into_iter()
            .map(|window| {
                ConfessionBand::new(ConfessionBandDraft {
                    id: Uuid::new_v4(),
                    priest_id: scope.user_id(),
                    parish_id,
                    window,
                    capacity: series.capacity,
                    booked_count: 0,
                    status: BandStatus::Available,
                    recurrence: series.recurrence,
                    recurrence_until: series.recurrence_until,
                    series_id: Some(series_id),
                    notes: series.notes.clone(),
                    created_at: now,
                    updated_at: now,
                })
            })
            .collect::<Result<Vec<_>, _>>()
            .map_err(invalid_schedule)?;
        self.bands.create_series(&bands).await.map_err(band_error)?;
        info!(
            %series_id,
            occurrences = bands.len(),
            recurring = series.recurrence != Recurrence::None,
            "created confession band series"
        );
        Ok(bands)
    }

    async fn list(&self, filter: ScheduleFilter<BandStatus>) -> Result<Vec<ConfessionBand>, Error> {
        Ok(self.bands.list(filter).await?)
    }

    async fn get(&self, id: Uuid) -> Result<ConfessionBand, Error> {
        self.require_band(id).await
    }

    async fn update_capacity(
        &self,
        actor: &Actor,
        id: Uuid,
        capacity: u32,
    ) -> Result<ConfessionBand, Error> {
        let caller = load_actor(self.users.as_ref(), actor).await?;
        let current = self.require_band(id).await?;
        ensure_owner_or_admin(&caller, current.priest_id(), "change this band's capacity")?;
        let updated = self
            .bands
            .update_capacity(id, capacity, self.clock.utc())
            .await
            .map_err(band_error)?
            .ok_or_else(|| band_not_found(id))?;
        info!(band_id = %id, capacity, status = %updated.status(), "updated band capacity");
        Ok(updated)
    }

    async fn cancel(&self, actor: &Actor, id: Uuid) -> Result<ConfessionBand, Error> {
        let caller = load_actor(self.users.as_ref(), actor).await?;
        let current = self.require_band(id).await?;
        ensure_owner_or_admin(&caller, current.priest_id(), "cancel this band")?;
        let cancellation = self
            .bands
            .cancel(id, self.clock.utc())
            .await
            .map_err(band_error)?
            .ok_or_else(|| band_not_found(id))?;
        info!(
            band_id = %id,
            cancelled_bookings = cancellation.cancelled_bookings,
            "cancelled confession band"
        );
        Ok(cancellation.band)
    }
}

#[cfg(test)]
#[path = "bands_service_tests.rs"]
mod tests;
