//! PostgreSQL-backed [`InviteRepository`].
//!
//! Acceptance and invite registration lock the invite row and apply the
//! whole [`InviteGrant`] in one transaction. A grant against an invite that
//! is no longer pending writes nothing and reports `false`.

use async_trait::async_trait;
use diesel::prelude::*;
use diesel_async::scoped_futures::ScopedFutureExt;
use diesel_async::{AsyncConnection, AsyncPgConnection, RunQueryDsl};
use tracing::debug;
use uuid::Uuid;

use crate::domain::ports::{InviteGrant, InviteRepository, InviteRepositoryError};
use crate::domain::{Invite, InviteStatus, PriestParishHistory, User, UserId, UserRole};

use super::diesel_helpers::{
    TxError, collect_rows, map_diesel_error, map_pool_error, unique_violation,
};
use super::models::{HistoryRow, InviteRow, NewUserRow, UserUpdate};
use super::pool::{DbPool, PoolError};
use super::schema::{dioceses, invites, priest_parish_history, users};

#[derive(Clone)]
pub struct DieselInviteRepository {
    pool: DbPool,
}

impl DieselInviteRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn pool_error(error: PoolError) -> InviteRepositoryError {
    map_pool_error(error, InviteRepositoryError::connection)
}

fn diesel_error(error: diesel::result::Error) -> InviteRepositoryError {
    map_diesel_error(
        error,
        InviteRepositoryError::query,
        InviteRepositoryError::connection,
    )
}

/// Lock the invite and report whether it is still pending.
async fn lock_pending(
    conn: &mut AsyncPgConnection,
    invite_id: Uuid,
) -> Result<bool, diesel::result::Error> {
    let status: Option<String> = invites::table
        .filter(invites::id.eq(invite_id))
        .select(invites::status)
        .for_update()
        .first(conn)
        .await
        .optional()?;
    Ok(status.as_deref() == Some(InviteStatus::Pending.as_str()))
}

/// Close any active assignment of the priest, then open `entry`.
pub(super) async fn replace_active_history(
    conn: &mut AsyncPgConnection,
    entry: &PriestParishHistory,
) -> Result<(), diesel::result::Error> {
    diesel::update(
        priest_parish_history::table
            .filter(priest_parish_history::priest_id.eq(entry.priest_id().as_uuid()))
            .filter(priest_parish_history::active.eq(true)),
    )
    .set((
        priest_parish_history::active.eq(false),
        priest_parish_history::end_date.eq(Some(entry.start_date())),
    ))
    .execute(conn)
    .await?;

    diesel::insert_into(priest_parish_history::table)
        .values(HistoryRow::from(entry))
        .execute(conn)
        .await?;
    Ok(())
}

/// Keep `dioceses.bishop_id` in step with the granted role.
///
/// The user stops heading every diocese but the one a bishop grant assigns,
/// and takes that diocese when its head is vacant.
async fn sync_diocese_head(
    conn: &mut AsyncPgConnection,
    user: &User,
) -> Result<(), diesel::result::Error> {
    let user_id = *user.id().as_uuid();
    let now = user.updated_at();
    let kept = match user.role() {
        UserRole::Bishop => user.diocese_id(),
        _ => None,
    };
    let headed = dioceses::table.filter(dioceses::bishop_id.eq(user_id));
    let release = (
        dioceses::bishop_id.eq(None::<Uuid>),
        dioceses::updated_at.eq(now),
    );
    match kept {
        Some(diocese_id) => {
            diesel::update(headed.filter(dioceses::id.ne(diocese_id)))
                .set(release)
                .execute(conn)
                .await?;
            diesel::update(
                dioceses::table
                    .filter(dioceses::id.eq(diocese_id))
                    .filter(dioceses::bishop_id.is_null()),
            )
            .set((
                dioceses::bishop_id.eq(Some(user_id)),
                dioceses::updated_at.eq(now),
            ))
            .execute(conn)
            .await?;
        }
        None => {
            diesel::update(headed).set(release).execute(conn).await?;
        }
    }
    Ok(())
}

/// Apply the grant to an already-inserted user and mark the invite accepted.
async fn apply_grant(
    conn: &mut AsyncPgConnection,
    grant: &InviteGrant,
) -> Result<(), diesel::result::Error> {
    diesel::update(users::table.filter(users::id.eq(grant.user.id().as_uuid())))
        .set(UserUpdate::from(&grant.user))
        .execute(conn)
        .await?;
    sync_diocese_head(conn, &grant.user).await?;
    if let Some(entry) = &grant.history {
        replace_active_history(conn, entry).await?;
    }
    diesel::update(invites::table.filter(invites::id.eq(grant.invite_id)))
        .set(invites::status.eq(InviteStatus::Accepted.as_str()))
        .execute(conn)
        .await?;
    Ok(())
}

#[async_trait]
impl InviteRepository for DieselInviteRepository {
    async fn create(&self, invite: &Invite) -> Result<(), InviteRepositoryError> {
        let mut conn = self.pool.get().await.map_err(pool_error)?;
        diesel::insert_into(invites::table)
            .values(InviteRow::from(invite))
            .execute(&mut conn)
            .await
            .map(|_| ())
            .map_err(diesel_error)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Invite>, InviteRepositoryError> {
        let mut conn = self.pool.get().await.map_err(pool_error)?;
        let row: Option<InviteRow> = invites::table
            .filter(invites::id.eq(id))
            .select(InviteRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(diesel_error)?;
        row.map(InviteRow::into_domain)
            .transpose()
            .map_err(InviteRepositoryError::query)
    }

    async fn find_by_digest(&self, digest: &str) -> Result<Option<Invite>, InviteRepositoryError> {
        let mut conn = self.pool.get().await.map_err(pool_error)?;
        let row: Option<InviteRow> = invites::table
            .filter(invites::token_digest.eq(digest))
            .select(InviteRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(diesel_error)?;
        row.map(InviteRow::into_domain)
            .transpose()
            .map_err(InviteRepositoryError::query)
    }

    async fn list(
        &self,
        invited_by: Option<UserId>,
    ) -> Result<Vec<Invite>, InviteRepositoryError> {
        let mut conn = self.pool.get().await.map_err(pool_error)?;
        let mut query = invites::table
            .select(InviteRow::as_select())
            .order_by(invites::created_at.desc())
            .into_boxed();
        if let Some(inviter) = invited_by {
            query = query.filter(invites::invited_by.eq(*inviter.as_uuid()));
        }
        let rows: Vec<InviteRow> = query.load(&mut conn).await.map_err(diesel_error)?;
        collect_rows(rows, InviteRow::into_domain, InviteRepositoryError::query)
    }

    async fn transition(
        &self,
        id: Uuid,
        from: InviteStatus,
        to: InviteStatus,
    ) -> Result<bool, InviteRepositoryError> {
        let mut conn = self.pool.get().await.map_err(pool_error)?;
        let updated = diesel::update(
            invites::table
                .filter(invites::id.eq(id))
                .filter(invites::status.eq(from.as_str())),
        )
        .set(invites::status.eq(to.as_str()))
        .execute(&mut conn)
        .await
        .map_err(diesel_error)?;
        debug!(invite_id = %id, %from, %to, applied = updated > 0, "invite transition");
        Ok(updated > 0)
    }

    async fn accept(&self, grant: &InviteGrant) -> Result<bool, InviteRepositoryError> {
        let mut pooled = self.pool.get().await.map_err(pool_error)?;
        let conn: &mut AsyncPgConnection = &mut pooled;
        conn.transaction::<bool, diesel::result::Error, _>(|tx| {
            async move {
                if !lock_pending(tx, grant.invite_id).await? {
                    return Ok(false);
                }
                apply_grant(tx, grant).await?;
                Ok(true)
            }
            .scope_boxed()
        })
        .await
        .map_err(diesel_error)
    }

    async fn register(
        &self,
        grant: &InviteGrant,
        password_hash: &str,
    ) -> Result<bool, InviteRepositoryError> {
        let mut pooled = self.pool.get().await.map_err(pool_error)?;
        let conn: &mut AsyncPgConnection = &mut pooled;
        let email = grant.user.email().as_ref().to_owned();
        conn.transaction::<bool, TxError<InviteRepositoryError>, _>(|tx| {
            async move {
                if !lock_pending(tx, grant.invite_id).await? {
                    return Ok(false);
                }
                diesel::insert_into(users::table)
                    .values(NewUserRow::new(&grant.user, password_hash))
                    .execute(tx)
                    .await
                    .map_err(|err| match unique_violation(&err) {
                        Some(_) => TxError::Port(InviteRepositoryError::duplicate_email(email)),
                        None => TxError::Diesel(err),
                    })?;
                apply_grant(tx, grant).await?;
                Ok(true)
            }
            .scope_boxed()
        })
        .await
        .map_err(|err| err.into_port(diesel_error))
    }
}
