//! PostgreSQL-backed [`ConfessionSlotRepository`].

use async_trait::async_trait;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;
use uuid::Uuid;

use crate::domain::UserId;
use crate::domain::ports::{
    ConfessionSlotRepository, ConfessionSlotRepositoryError, ScheduleFilter,
};
use crate::domain::scheduling::{ConfessionSlot, SlotStatus, TimeWindow};

use super::diesel_helpers::{
    collect_rows, is_foreign_key_violation, map_diesel_error, map_pool_error,
};
use super::models::SlotRow;
use super::pool::{DbPool, PoolError};
use super::schema::confession_slots;

#[derive(Clone)]
pub struct DieselConfessionSlotRepository {
    pool: DbPool,
}

impl DieselConfessionSlotRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn pool_error(error: PoolError) -> ConfessionSlotRepositoryError {
    map_pool_error(error, ConfessionSlotRepositoryError::connection)
}

fn diesel_error(error: diesel::result::Error) -> ConfessionSlotRepositoryError {
    map_diesel_error(
        error,
        ConfessionSlotRepositoryError::query,
        ConfessionSlotRepositoryError::connection,
    )
}

#[async_trait]
impl ConfessionSlotRepository for DieselConfessionSlotRepository {
    async fn create(&self, slot: &ConfessionSlot) -> Result<(), ConfessionSlotRepositoryError> {
        let mut conn = self.pool.get().await.map_err(pool_error)?;
        diesel::insert_into(confession_slots::table)
            .values(SlotRow::from(slot))
            .execute(&mut conn)
            .await
            .map(|_| ())
            .map_err(diesel_error)
    }

    async fn find_by_id(
        &self,
        id: Uuid,
    ) -> Result<Option<ConfessionSlot>, ConfessionSlotRepositoryError> {
        let mut conn = self.pool.get().await.map_err(pool_error)?;
        let row: Option<SlotRow> = confession_slots::table
            .filter(confession_slots::id.eq(id))
            .select(SlotRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(diesel_error)?;
        row.map(SlotRow::into_domain)
            .transpose()
            .map_err(ConfessionSlotRepositoryError::query)
    }

    async fn list(
        &self,
        filter: ScheduleFilter<SlotStatus>,
    ) -> Result<Vec<ConfessionSlot>, ConfessionSlotRepositoryError> {
        let mut conn = self.pool.get().await.map_err(pool_error)?;
        let mut query = confession_slots::table
            .select(SlotRow::as_select())
            .order_by(confession_slots::start_time.asc())
            .into_boxed();
        if let Some(priest_id) = filter.priest_id {
            query = query.filter(confession_slots::priest_id.eq(*priest_id.as_uuid()));
        }
        if let Some(parish_id) = filter.parish_id {
            query = query.filter(confession_slots::parish_id.eq(parish_id));
        }
        if let Some(from) = filter.from {
            query = query.filter(confession_slots::start_time.ge(from));
        }
        if let Some(to) = filter.to {
            query = query.filter(confession_slots::start_time.le(to));
        }
        if let Some(status) = filter.status {
            query = query.filter(confession_slots::status.eq(status.as_str()));
        }
        let rows: Vec<SlotRow> = query.load(&mut conn).await.map_err(diesel_error)?;
        collect_rows(rows, SlotRow::into_domain, ConfessionSlotRepositoryError::query)
    }

    async fn has_overlap(
        &self,
        priest_id: UserId,
        window: TimeWindow,
        exclude: Option<Uuid>,
    ) -> Result<bool, ConfessionSlotRepositoryError> {
        let mut conn = self.pool.get().await.map_err(pool_error)?;
        let mut query = confession_slots::table
            .filter(confession_slots::priest_id.eq(*priest_id.as_uuid()))
            .filter(confession_slots::status.ne(SlotStatus::Completed.as_str()))
            .filter(confession_slots::start_time.lt(window.end()))
            .filter(confession_slots::end_time.gt(window.start()))
            .select(confession_slots::id)
            .into_boxed();
        if let Some(excluded) = exclude {
            query = query.filter(confession_slots::id.ne(excluded));
        }
        let hit: Option<Uuid> = query
            .first(&mut conn)
            .await
            .optional()
            .map_err(diesel_error)?;
        Ok(hit.is_some())
    }

    async fn update_available(
        &self,
        slot: &ConfessionSlot,
    ) -> Result<bool, ConfessionSlotRepositoryError> {
        let mut conn = self.pool.get().await.map_err(pool_error)?;
        let still_available = confession_slots::table
            .filter(confession_slots::id.eq(slot.id()))
            .filter(confession_slots::status.eq(SlotStatus::Available.as_str()));
        let updated = diesel::update(still_available)
            .set(SlotRow::from(slot))
            .execute(&mut conn)
            .await
            .map_err(diesel_error)?;
        Ok(updated > 0)
    }

    async fn delete(&self, id: Uuid) -> Result<(), ConfessionSlotRepositoryError> {
        let mut conn = self.pool.get().await.map_err(pool_error)?;
        diesel::delete(confession_slots::table.filter(confession_slots::id.eq(id)))
            .execute(&mut conn)
            .await
            .map(|_| ())
            .map_err(|err| {
                if is_foreign_key_violation(&err) {
                    ConfessionSlotRepositoryError::referenced()
                } else {
                    diesel_error(err)
                }
            })
    }
}
