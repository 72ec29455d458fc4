//! PostgreSQL-backed [`ConfessionRepository`].
//!
//! Booking, cancellation and completion each run in one transaction. The
//! target slot or band is read `FOR UPDATE`, the matching
//! `scheduling::plan_*` function decides the outcome, and the plan is
//! written before the lock is released. Two bookings racing for the last
//! seat therefore see each other's writes.
//!
//! Locks are always taken target first, then confessions, the same order a
//! band cancellation uses.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use diesel_async::scoped_futures::ScopedFutureExt;
use diesel_async::{AsyncConnection, AsyncPgConnection, RunQueryDsl};
use tracing::debug;
use uuid::Uuid;

use crate::domain::UserId;
use crate::domain::ports::{ConfessionRepository, ConfessionRepositoryError};
use crate::domain::scheduling::{
    BookableTarget, BookingContext, BookingPlan, BookingRejection, BookingRequest, BookingTarget,
    Confession, ConfessionStatus, TargetUpdate, plan_booking, plan_cancellation, plan_completion,
};

use super::diesel_helpers::{TxError, collect_rows, map_diesel_error, map_pool_error};
use super::models::{BandRow, ConfessionRow, SlotRow};
use super::pool::{DbPool, PoolError};
use super::schema::{confession_bands, confession_slots, confessions};

#[derive(Clone)]
pub struct DieselConfessionRepository {
    pool: DbPool,
}

impl DieselConfessionRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

type ConfessionTxError = TxError<ConfessionRepositoryError>;

fn pool_error(error: PoolError) -> ConfessionRepositoryError {
    map_pool_error(error, ConfessionRepositoryError::connection)
}

fn diesel_error(error: diesel::result::Error) -> ConfessionRepositoryError {
    map_diesel_error(
        error,
        ConfessionRepositoryError::query,
        ConfessionRepositoryError::connection,
    )
}

fn invalid_row(message: String) -> ConfessionTxError {
    TxError::Port(ConfessionRepositoryError::query(message))
}

fn rejected(reason: BookingRejection) -> ConfessionTxError {
    TxError::Port(ConfessionRepositoryError::rejected(reason))
}

/// Lock the slot or band row a confession points at.
async fn lock_target(
    conn: &mut AsyncPgConnection,
    target: BookingTarget,
) -> Result<BookableTarget, ConfessionTxError> {
    let locked = match target {
        BookingTarget::Slot(id) => {
            let row: Option<SlotRow> = confession_slots::table
                .filter(confession_slots::id.eq(id))
                .select(SlotRow::as_select())
                .for_update()
                .first(conn)
                .await
                .optional()?;
            row.map(|row| row.into_domain().map(BookableTarget::Slot))
        }
        BookingTarget::Band(id) => {
            let row: Option<BandRow> = confession_bands::table
                .filter(confession_bands::id.eq(id))
                .select(BandRow::as_select())
                .for_update()
                .first(conn)
                .await
                .optional()?;
            row.map(|row| row.into_domain().map(BookableTarget::Band))
        }
    };
    match locked {
        Some(target) => target.map_err(invalid_row),
        None => Err(TxError::Port(ConfessionRepositoryError::target_not_found())),
    }
}

/// Booked confessions on the target, read under the target lock.
async fn booking_context(
    conn: &mut AsyncPgConnection,
    target: BookingTarget,
    faithful_id: UserId,
) -> Result<BookingContext, diesel::result::Error> {
    let booked = confessions::table
        .select(confessions::faithful_id)
        .filter(confessions::status.eq(ConfessionStatus::Booked.as_str()))
        .into_boxed();
    let on_target = match target {
        BookingTarget::Slot(id) => booked.filter(confessions::slot_id.eq(id)),
        BookingTarget::Band(id) => booked.filter(confessions::band_id.eq(id)),
    };
    let holders: Vec<Uuid> = on_target.load(conn).await?;
    Ok(BookingContext {
        caller_has_booking: holders.contains(faithful_id.as_uuid()),
        active_bookings: u32::try_from(holders.len()).unwrap_or(u32::MAX),
    })
}

/// Target of a confession, read without locking. A confession never changes
/// target, so the value can pick the row to lock first.
async fn confession_target(
    conn: &mut AsyncPgConnection,
    id: Uuid,
) -> Result<BookingTarget, ConfessionTxError> {
    let row: Option<ConfessionRow> = confessions::table
        .filter(confessions::id.eq(id))
        .select(ConfessionRow::as_select())
        .first(conn)
        .await
        .optional()?;
    match row {
        Some(row) => row
            .into_domain()
            .map(|confession| confession.target())
            .map_err(invalid_row),
        None => Err(TxError::Port(ConfessionRepositoryError::confession_not_found())),
    }
}

async fn lock_confession(
    conn: &mut AsyncPgConnection,
    id: Uuid,
) -> Result<Confession, ConfessionTxError> {
    let row: Option<ConfessionRow> = confessions::table
        .filter(confessions::id.eq(id))
        .select(ConfessionRow::as_select())
        .for_update()
        .first(conn)
        .await
        .optional()?;
    match row {
        Some(row) => row.into_domain().map_err(invalid_row),
        None => Err(TxError::Port(ConfessionRepositoryError::confession_not_found())),
    }
}

async fn store_target(
    conn: &mut AsyncPgConnection,
    update: &TargetUpdate,
) -> Result<(), diesel::result::Error> {
    match update {
        TargetUpdate::Slot(slot) => {
            diesel::update(confession_slots::table.filter(confession_slots::id.eq(slot.id())))
                .set(SlotRow::from(slot))
                .execute(conn)
                .await?;
        }
        TargetUpdate::Band(band) => {
            diesel::update(confession_bands::table.filter(confession_bands::id.eq(band.id())))
                .set(BandRow::from(band))
                .execute(conn)
                .await?;
        }
        TargetUpdate::Unchanged => {}
    }
    Ok(())
}

/// Persist a cancellation or completion plan for an existing confession.
async fn store_transition(
    conn: &mut AsyncPgConnection,
    plan: &BookingPlan,
) -> Result<(), diesel::result::Error> {
    let confession = &plan.confession;
    diesel::update(confessions::table.filter(confessions::id.eq(confession.id())))
        .set((
            confessions::status.eq(confession.status().as_str()),
            confessions::updated_at.eq(confession.updated_at()),
        ))
        .execute(conn)
        .await?;
    store_target(conn, &plan.target).await
}

impl DieselConfessionRepository {
    /// Lock a confession's target and then the confession, plan with
    /// `planner`, store the plan.
    async fn transition(
        &self,
        id: Uuid,
        now: DateTime<Utc>,
        planner: fn(Confession, BookableTarget, DateTime<Utc>) -> Result<BookingPlan, BookingRejection>,
    ) -> Result<Confession, ConfessionRepositoryError> {
        let mut pooled = self.pool.get().await.map_err(pool_error)?;
        let conn: &mut AsyncPgConnection = &mut pooled;
        conn.transaction::<Confession, ConfessionTxError, _>(|tx| {
            async move {
                let expected = confession_target(tx, id).await?;
                let target = lock_target(tx, expected).await?;
                let confession = lock_confession(tx, id).await?;
                if confession.target() != expected {
                    return Err(invalid_row(format!("confession {id} changed target")));
                }
                let plan = planner(confession, target, now).map_err(rejected)?;
                store_transition(tx, &plan).await?;
                Ok(plan.confession)
            }
            .scope_boxed()
        })
        .await
        .map_err(|err| err.into_port(diesel_error))
    }
}

#[async_trait]
impl ConfessionRepository for DieselConfessionRepository {
    async fn book(
        &self,
        request: &BookingRequest,
        now: DateTime<Utc>,
    ) -> Result<Confession, ConfessionRepositoryError> {
        let mut pooled = self.pool.get().await.map_err(pool_error)?;
        let conn: &mut AsyncPgConnection = &mut pooled;
        let booked = conn
            .transaction::<Confession, ConfessionTxError, _>(|tx| {
                async move {
                    let target = lock_target(tx, request.target()).await?;
                    let context =
                        booking_context(tx, request.target(), request.faithful_id()).await?;
                    let plan = plan_booking(request, target, context, now).map_err(rejected)?;
                    diesel::insert_into(confessions::table)
                        .values(ConfessionRow::from(&plan.confession))
                        .execute(tx)
                        .await?;
                    store_target(tx, &plan.target).await?;
                    Ok(plan.confession)
                }
                .scope_boxed()
            })
            .await
            .map_err(|err| err.into_port(diesel_error))?;
        debug!(confession_id = %booked.id(), "booking committed");
        Ok(booked)
    }

    async fn cancel(
        &self,
        id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<Confession, ConfessionRepositoryError> {
        self.transition(id, now, plan_cancellation).await
    }

    async fn complete(
        &self,
        id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<Confession, ConfessionRepositoryError> {
        self.transition(id, now, plan_completion).await
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Confession>, ConfessionRepositoryError> {
        let mut conn = self.pool.get().await.map_err(pool_error)?;
        let row: Option<ConfessionRow> = confessions::table
            .filter(confessions::id.eq(id))
            .select(ConfessionRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(diesel_error)?;
        row.map(ConfessionRow::into_domain)
            .transpose()
            .map_err(ConfessionRepositoryError::query)
    }

    async fn list_for_faithful(
        &self,
        faithful_id: UserId,
    ) -> Result<Vec<Confession>, ConfessionRepositoryError> {
        let mut conn = self.pool.get().await.map_err(pool_error)?;
        let rows: Vec<ConfessionRow> = confessions::table
            .filter(confessions::faithful_id.eq(*faithful_id.as_uuid()))
            .select(ConfessionRow::as_select())
            .order_by(confessions::scheduled_time.desc())
            .load(&mut conn)
            .await
            .map_err(diesel_error)?;
        collect_rows(rows, ConfessionRow::into_domain, ConfessionRepositoryError::query)
    }

    async fn list_for_priest(
        &self,
        priest_id: UserId,
        status: Option<ConfessionStatus>,
    ) -> Result<Vec<Confession>, ConfessionRepositoryError> {
        let mut conn = self.pool.get().await.map_err(pool_error)?;
        let mut query = confessions::table
            .filter(confessions::priest_id.eq(*priest_id.as_uuid()))
            .select(ConfessionRow::as_select())
            .order_by(confessions::scheduled_time.asc())
            .into_boxed();
        if let Some(status) = status {
            query = query.filter(confessions::status.eq(status.as_str()));
        }
        let rows: Vec<ConfessionRow> = query.load(&mut conn).await.map_err(diesel_error)?;
        collect_rows(rows, ConfessionRow::into_domain, ConfessionRepositoryError::query)
    }
}
