//! PostgreSQL-backed [`ConfessionBandRepository`].
//!
//! Capacity changes and cancellation lock the band row so they serialise
//! with bookings against the same band.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use diesel_async::scoped_futures::ScopedFutureExt;
use diesel_async::{AsyncConnection, AsyncPgConnection, RunQueryDsl};
use uuid::Uuid;

use crate::domain::ports::{
    BandCancellation, ConfessionBandRepository, ConfessionBandRepositoryError, ScheduleFilter,
};
use crate::domain::scheduling::{BandStatus, ConfessionBand, ConfessionStatus};

use super::diesel_helpers::{TxError, collect_rows, map_diesel_error, map_pool_error};
use super::models::BandRow;
use super::pool::{DbPool, PoolError};
use super::schema::{confession_bands, confessions};

#[derive(Clone)]
pub struct DieselConfessionBandRepository {
    pool: DbPool,
}

impl DieselConfessionBandRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

type BandTxError = TxError<ConfessionBandRepositoryError>;

fn pool_error(error: PoolError) -> ConfessionBandRepositoryError {
    map_pool_error(error, ConfessionBandRepositoryError::connection)
}

fn diesel_error(error: diesel::result::Error) -> ConfessionBandRepositoryError {
    map_diesel_error(
        error,
        ConfessionBandRepositoryError::query,
        ConfessionBandRepositoryError::connection,
    )
}

/// Lock and load a band inside a transaction.
async fn lock_band(
    conn: &mut AsyncPgConnection,
    id: Uuid,
) -> Result<Option<ConfessionBand>, BandTxError> {
    let row: Option<BandRow> = confession_bands::table
        .filter(confession_bands::id.eq(id))
        .select(BandRow::as_select())
        .for_update()
        .first(conn)
        .await
        .optional()?;
    row.map(BandRow::into_domain)
        .transpose()
        .map_err(|msg| TxError::Port(ConfessionBandRepositoryError::query(msg)))
}

async fn store_band(
    conn: &mut AsyncPgConnection,
    band: &ConfessionBand,
) -> Result<(), diesel::result::Error> {
    diesel::update(confession_bands::table.filter(confession_bands::id.eq(band.id())))
        .set(BandRow::from(band))
        .execute(conn)
        .await
        .map(|_| ())
}

#[async_trait]
impl ConfessionBandRepository for DieselConfessionBandRepository {
    async fn create_series(
        &self,
        bands: &[ConfessionBand],
    ) -> Result<(), ConfessionBandRepositoryError> {
        let rows: Vec<BandRow> = bands.iter().map(BandRow::from).collect();
        let mut pooled = self.pool.get().await.map_err(pool_error)?;
        let conn: &mut AsyncPgConnection = &mut pooled;
        conn.transaction::<(), diesel::result::Error, _>(|tx| {
            async move {
                diesel::insert_into(confession_bands::table)
                    .values(&rows)
                    .execute(tx)
                    .await?;
                Ok(())
            }
            .scope_boxed()
        })
        .await
        .map_err(diesel_error)
    }

    async fn find_by_id(
        &self,
        id: Uuid,
    ) -> Result<Option<ConfessionBand>, ConfessionBandRepositoryError> {
        let mut conn = self.pool.get().await.map_err(pool_error)?;
        let row: Option<BandRow> = confession_bands::table
            .filter(confession_bands::id.eq(id))
            .select(BandRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(diesel_error)?;
        row.map(BandRow::into_domain)
            .transpose()
            .map_err(ConfessionBandRepositoryError::query)
    }

    async fn list(
        &self,
        filter: ScheduleFilter<BandStatus>,
    ) -> Result<Vec<ConfessionBand>, ConfessionBandRepositoryError> {
        let mut conn = self.pool.get().await.map_err(pool_error)?;
        let mut query = confession_bands::table
            .select(BandRow::as_select())
            .order_by(confession_bands::start_time.asc())
            .into_boxed();
        if let Some(priest_id) = filter.priest_id {
            query = query.filter(confession_bands::priest_id.eq(*priest_id.as_uuid()));
        }
        if let Some(parish_id) = filter.parish_id {
            query = query.filter(confession_bands::parish_id.eq(parish_id));
        }
        if let Some(from) = filter.from {
            query = query.filter(confession_bands::start_time.ge(from));
        }
        if let Some(to) = filter.to {
            query = query.filter(confession_bands::start_time.le(to));
        }
        if let Some(status) = filter.status {
            query = query.filter(confession_bands::status.eq(status.as_str()));
        }
        let rows: Vec<BandRow> = query.load(&mut conn).await.map_err(diesel_error)?;
        collect_rows(rows, BandRow::into_domain, ConfessionBandRepositoryError::query)
    }

    async fn update_capacity(
        &self,
        id: Uuid,
        capacity: u32,
        now: DateTime<Utc>,
    ) -> Result<Option<ConfessionBand>, ConfessionBandRepositoryError> {
        let mut pooled = self.pool.get().await.map_err(pool_error)?;
        let conn: &mut AsyncPgConnection = &mut pooled;
        conn.transaction::<Option<ConfessionBand>, BandTxError, _>(|tx| {
            async move {
                let Some(band) = lock_band(tx, id).await? else {
                    return Ok(None);
                };
                let resized = band.with_capacity(capacity, now).map_err(|reason| {
                    TxError::Port(ConfessionBandRepositoryError::invalid(reason))
                })?;
                store_band(tx, &resized).await?;
                Ok(Some(resized))
            }
            .scope_boxed()
        })
        .await
        .map_err(|err| err.into_port(diesel_error))
    }

    async fn cancel(
        &self,
        id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<Option<BandCancellation>, ConfessionBandRepositoryError> {
        let mut pooled = self.pool.get().await.map_err(pool_error)?;
        let conn: &mut AsyncPgConnection = &mut pooled;
        conn.transaction::<Option<BandCancellation>, BandTxError, _>(|tx| {
            async move {
                let Some(band) = lock_band(tx, id).await? else {
                    return Ok(None);
                };
                let cancelled = band.cancelled(now).map_err(|reason| {
                    TxError::Port(ConfessionBandRepositoryError::invalid(reason))
                })?;
                store_band(tx, &cancelled).await?;

                let cancelled_bookings = diesel::update(
                    confessions::table
                        .filter(confessions::band_id.eq(id))
                        .filter(confessions::status.eq(ConfessionStatus::Booked.as_str())),
                )
                .set((
                    confessions::status.eq(ConfessionStatus::Cancelled.as_str()),
                    confessions::updated_at.eq(now),
                ))
                .execute(tx)
                .await?;

                Ok(Some(BandCancellation {
                    band: cancelled,
                    cancelled_bookings: u64::try_from(cancelled_bookings).unwrap_or(u64::MAX),
                }))
            }
            .scope_boxed()
        })
        .await
        .map_err(|err| err.into_port(diesel_error))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::scheduling::SchedulingValidationError;

    #[test]
    fn port_failures_survive_the_transaction_wrapper() {
        let err: BandTxError = TxError::Port(ConfessionBandRepositoryError::invalid(
            SchedulingValidationError::BandCancelled,
        ));
        assert_eq!(
            err.into_port(diesel_error),
            ConfessionBandRepositoryError::Invalid {
                reason: SchedulingValidationError::BandCancelled
            }
        );
    }
}
