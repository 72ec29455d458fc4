//! PostgreSQL-backed [`PriestRequestRepository`].

use async_trait::async_trait;
use diesel::prelude::*;
use diesel_async::scoped_futures::ScopedFutureExt;
use diesel_async::{AsyncConnection, AsyncPgConnection, RunQueryDsl};
use uuid::Uuid;

use crate::domain::ports::{
    PriestRequestRepository, PriestRequestRepositoryError, RequestAcceptance, RequestScope,
};
use crate::domain::{PriestParishHistory, PriestParishRequest, RequestStatus, UserId};

use super::diesel_helpers::{collect_rows, map_diesel_error, map_pool_error, unique_violation};
use super::diesel_invite_repository::replace_active_history;
use super::models::{HistoryRow, PriestRequestRow};
use super::pool::{DbPool, PoolError};
use super::schema::{parishes, priest_parish_history, priest_parish_requests, users};

#[derive(Clone)]
pub struct DieselPriestRequestRepository {
    pool: DbPool,
}

impl DieselPriestRequestRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn pool_error(error: PoolError) -> PriestRequestRepositoryError {
    map_pool_error(error, PriestRequestRepositoryError::connection)
}

fn diesel_error(error: diesel::result::Error) -> PriestRequestRepositoryError {
    map_diesel_error(
        error,
        PriestRequestRepositoryError::query,
        PriestRequestRepositoryError::connection,
    )
}

/// Write the reviewer fields, but only over a row that is still pending.
async fn store_review(
    conn: &mut AsyncPgConnection,
    request: &PriestParishRequest,
) -> Result<bool, diesel::result::Error> {
    let updated = diesel::update(
        priest_parish_requests::table
            .filter(priest_parish_requests::id.eq(request.id()))
            .filter(priest_parish_requests::status.eq(RequestStatus::Pending.as_str())),
    )
    .set((
        priest_parish_requests::status.eq(request.status().as_str()),
        priest_parish_requests::reviewed_by.eq(request.reviewed_by().map(|id| *id.as_uuid())),
        priest_parish_requests::reviewed_at.eq(request.reviewed_at()),
    ))
    .execute(conn)
    .await?;
    Ok(updated > 0)
}

#[async_trait]
impl PriestRequestRepository for DieselPriestRequestRepository {
    async fn create(
        &self,
        request: &PriestParishRequest,
    ) -> Result<(), PriestRequestRepositoryError> {
        let mut conn = self.pool.get().await.map_err(pool_error)?;
        diesel::insert_into(priest_parish_requests::table)
            .values(PriestRequestRow::from(request))
            .execute(&mut conn)
            .await
            .map(|_| ())
            .map_err(|err| match unique_violation(&err) {
                Some(_) => PriestRequestRepositoryError::duplicate_pending(),
                None => diesel_error(err),
            })
    }

    async fn find_by_id(
        &self,
        id: Uuid,
    ) -> Result<Option<PriestParishRequest>, PriestRequestRepositoryError> {
        let mut conn = self.pool.get().await.map_err(pool_error)?;
        let row: Option<PriestRequestRow> = priest_parish_requests::table
            .filter(priest_parish_requests::id.eq(id))
            .select(PriestRequestRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(diesel_error)?;
        row.map(PriestRequestRow::into_domain)
            .transpose()
            .map_err(PriestRequestRepositoryError::query)
    }

    async fn list(
        &self,
        scope: RequestScope,
        status: Option<RequestStatus>,
    ) -> Result<Vec<PriestParishRequest>, PriestRequestRepositoryError> {
        let mut conn = self.pool.get().await.map_err(pool_error)?;
        let mut query = priest_parish_requests::table
            .select(PriestRequestRow::as_select())
            .order_by(priest_parish_requests::created_at.desc())
            .into_boxed();

        query = match scope {
            RequestScope::All => query,
            RequestScope::Priest(priest_id) => {
                query.filter(priest_parish_requests::priest_id.eq(*priest_id.as_uuid()))
            }
            RequestScope::Parish(parish_id) => {
                query.filter(priest_parish_requests::parish_id.eq(parish_id))
            }
            RequestScope::Diocese(diocese_id) => query.filter(
                priest_parish_requests::parish_id.eq_any(
                    parishes::table
                        .filter(parishes::diocese_id.eq(diocese_id))
                        .select(parishes::id),
                ),
            ),
        };
        if let Some(status) = status {
            query = query.filter(priest_parish_requests::status.eq(status.as_str()));
        }

        let rows: Vec<PriestRequestRow> = query.load(&mut conn).await.map_err(diesel_error)?;
        collect_rows(
            rows,
            PriestRequestRow::into_domain,
            PriestRequestRepositoryError::query,
        )
    }

    async fn reject(
        &self,
        request: &PriestParishRequest,
    ) -> Result<bool, PriestRequestRepositoryError> {
        let mut pooled = self.pool.get().await.map_err(pool_error)?;
        let conn: &mut AsyncPgConnection = &mut pooled;
        store_review(conn, request).await.map_err(diesel_error)
    }

    async fn accept(
        &self,
        acceptance: &RequestAcceptance,
    ) -> Result<bool, PriestRequestRepositoryError> {
        let mut pooled = self.pool.get().await.map_err(pool_error)?;
        let conn: &mut AsyncPgConnection = &mut pooled;
        conn.transaction::<bool, diesel::result::Error, _>(|tx| {
            async move {
                let request = &acceptance.request;
                let locked: Option<Uuid> = priest_parish_requests::table
                    .filter(priest_parish_requests::id.eq(request.id()))
                    .select(priest_parish_requests::id)
                    .for_update()
                    .first(tx)
                    .await
                    .optional()?;
                if locked.is_none() || !store_review(tx, request).await? {
                    return Ok(false);
                }

                replace_active_history(tx, &acceptance.history).await?;

                diesel::update(users::table.filter(users::id.eq(request.priest_id().as_uuid())))
                    .set((
                        users::parish_id.eq(Some(request.parish_id())),
                        users::diocese_id.eq(Some(acceptance.diocese_id)),
                        users::updated_at.eq(acceptance.now),
                    ))
                    .execute(tx)
                    .await?;
                Ok(true)
            }
            .scope_boxed()
        })
        .await
        .map_err(diesel_error)
    }

    async fn history(
        &self,
        priest_id: UserId,
    ) -> Result<Vec<PriestParishHistory>, PriestRequestRepositoryError> {
        let mut conn = self.pool.get().await.map_err(pool_error)?;
        let rows: Vec<HistoryRow> = priest_parish_history::table
            .filter(priest_parish_history::priest_id.eq(*priest_id.as_uuid()))
            .select(HistoryRow::as_select())
            .order_by(priest_parish_history::start_date.desc())
            .load(&mut conn)
            .await
            .map_err(diesel_error)?;
        Ok(rows.into_iter().map(PriestParishHistory::from).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pool_failures_map_to_connection() {
        let err = pool_error(PoolError::build("bad url"));
        assert!(matches!(
            err,
            PriestRequestRepositoryError::Connection { .. }
        ));
    }
}
