//! PostgreSQL-backed [`ParishRepository`].

use async_trait::async_trait;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;
use uuid::Uuid;

use crate::domain::Parish;
use crate::domain::ports::{ParishRepository, ParishRepositoryError};

use super::diesel_helpers::{collect_rows, map_diesel_error, map_pool_error};
use super::models::{ParishRow, ParishUpdate};
use super::pool::{DbPool, PoolError};
use super::schema::parishes;

#[derive(Clone)]
pub struct DieselParishRepository {
    pool: DbPool,
}

impl DieselParishRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn pool_error(error: PoolError) -> ParishRepositoryError {
    map_pool_error(error, ParishRepositoryError::connection)
}

fn diesel_error(error: diesel::result::Error) -> ParishRepositoryError {
    map_diesel_error(
        error,
        ParishRepositoryError::query,
        ParishRepositoryError::connection,
    )
}

#[async_trait]
impl ParishRepository for DieselParishRepository {
    async fn create(&self, parish: &Parish) -> Result<(), ParishRepositoryError> {
        let mut conn = self.pool.get().await.map_err(pool_error)?;
        diesel::insert_into(parishes::table)
            .values(ParishRow::from(parish))
            .execute(&mut conn)
            .await
            .map(|_| ())
            .map_err(diesel_error)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Parish>, ParishRepositoryError> {
        let mut conn = self.pool.get().await.map_err(pool_error)?;
        let row: Option<ParishRow> = parishes::table
            .filter(parishes::id.eq(id))
            .select(ParishRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(diesel_error)?;
        row.map(ParishRow::into_domain)
            .transpose()
            .map_err(ParishRepositoryError::query)
    }

    async fn list_active(
        &self,
        diocese_id: Option<Uuid>,
    ) -> Result<Vec<Parish>, ParishRepositoryError> {
        let mut conn = self.pool.get().await.map_err(pool_error)?;
        let mut query = parishes::table
            .filter(parishes::active.eq(true))
            .select(ParishRow::as_select())
            .order_by(parishes::name.asc())
            .into_boxed();
        if let Some(diocese_id) = diocese_id {
            query = query.filter(parishes::diocese_id.eq(diocese_id));
        }
        let rows: Vec<ParishRow> = query.load(&mut conn).await.map_err(diesel_error)?;
        collect_rows(rows, ParishRow::into_domain, ParishRepositoryError::query)
    }

    async fn count_active_in_diocese(
        &self,
        diocese_id: Uuid,
    ) -> Result<u64, ParishRepositoryError> {
        let mut conn = self.pool.get().await.map_err(pool_error)?;
        let count: i64 = parishes::table
            .filter(parishes::diocese_id.eq(diocese_id))
            .filter(parishes::active.eq(true))
            .count()
            .get_result(&mut conn)
            .await
            .map_err(diesel_error)?;
        Ok(u64::try_from(count).unwrap_or_default())
    }

    async fn save(&self, parish: &Parish) -> Result<(), ParishRepositoryError> {
        let mut conn = self.pool.get().await.map_err(pool_error)?;
        let updated = diesel::update(parishes::table.filter(parishes::id.eq(parish.id())))
            .set(ParishUpdate::from(ParishRow::from(parish)))
            .execute(&mut conn)
            .await
            .map_err(diesel_error)?;
        if updated == 0 {
            return Err(ParishRepositoryError::query(format!(
                "parish {} not found for update",
                parish.id()
            )));
        }
        Ok(())
    }
}
