//! PostgreSQL-backed [`DioceseRepository`].

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use diesel_async::RunQueryDsl;
use uuid::Uuid;

use crate::domain::{Diocese, UserId};
use crate::domain::ports::{DioceseRepository, DioceseRepositoryError};

use super::diesel_helpers::{collect_rows, map_diesel_error, map_pool_error};
use super::models::{DioceseRow, DioceseUpdate};
use super::pool::{DbPool, PoolError};
use super::schema::dioceses;

#[derive(Clone)]
pub struct DieselDioceseRepository {
    pool: DbPool,
}

impl DieselDioceseRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn pool_error(error: PoolError) -> DioceseRepositoryError {
    map_pool_error(error, DioceseRepositoryError::connection)
}

fn diesel_error(error: diesel::result::Error) -> DioceseRepositoryError {
    map_diesel_error(
        error,
        DioceseRepositoryError::query,
        DioceseRepositoryError::connection,
    )
}

#[async_trait]
impl DioceseRepository for DieselDioceseRepository {
    async fn create(&self, diocese: &Diocese) -> Result<(), DioceseRepositoryError> {
        let mut conn = self.pool.get().await.map_err(pool_error)?;
        diesel::insert_into(dioceses::table)
            .values(DioceseRow::from(diocese))
            .execute(&mut conn)
            .await
            .map(|_| ())
            .map_err(diesel_error)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Diocese>, DioceseRepositoryError> {
        let mut conn = self.pool.get().await.map_err(pool_error)?;
        let row: Option<DioceseRow> = dioceses::table
            .filter(dioceses::id.eq(id))
            .select(DioceseRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(diesel_error)?;
        row.map(DioceseRow::into_domain)
            .transpose()
            .map_err(DioceseRepositoryError::query)
    }

    async fn list_active(&self) -> Result<Vec<Diocese>, DioceseRepositoryError> {
        let mut conn = self.pool.get().await.map_err(pool_error)?;
        let rows: Vec<DioceseRow> = dioceses::table
            .filter(dioceses::active.eq(true))
            .select(DioceseRow::as_select())
            .order_by(dioceses::name.asc())
            .load(&mut conn)
            .await
            .map_err(diesel_error)?;
        collect_rows(rows, DioceseRow::into_domain, DioceseRepositoryError::query)
    }

    async fn save(&self, diocese: &Diocese) -> Result<(), DioceseRepositoryError> {
        let mut conn = self.pool.get().await.map_err(pool_error)?;
        let updated = diesel::update(dioceses::table.filter(dioceses::id.eq(diocese.id())))
            .set(DioceseUpdate::from(diocese))
            .execute(&mut conn)
            .await
            .map_err(diesel_error)?;
        if updated == 0 {
            return Err(DioceseRepositoryError::query(format!(
                "diocese {} not found for update",
                diocese.id()
            )));
        }
        Ok(())
    }

    async fn release_bishop(
        &self,
        bishop_id: UserId,
        keep: Option<Uuid>,
        now: DateTime<Utc>,
    ) -> Result<(), DioceseRepositoryError> {
        let mut conn = self.pool.get().await.map_err(pool_error)?;
        let headed = dioceses::table.filter(dioceses::bishop_id.eq(*bishop_id.as_uuid()));
        let release = (
            dioceses::bishop_id.eq(None::<Uuid>),
            dioceses::updated_at.eq(now),
        );
        let result = match keep {
            Some(keep) => {
                diesel::update(headed.filter(dioceses::id.ne(keep)))
                    .set(release)
                    .execute(&mut conn)
                    .await
            }
            None => diesel::update(headed).set(release).execute(&mut conn).await,
        };
        result.map(|_| ()).map_err(diesel_error)
    }
}
