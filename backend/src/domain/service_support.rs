//! Helpers shared by the domain services.

use std::fmt::Display;

use tracing::warn;
use uuid::Uuid;

use crate::domain::auth::forbidden;
use crate::domain::ports::UserRepository;
use crate::domain::scheduling::{BookingRejection, SchedulingValidationError};
use crate::domain::{Actor, CallerScope, Error, User, UserId, UserRole};

/// Load the caller's stored record and derive its scope.
///
/// A caller whose account vanished or was deactivated after the token was
/// issued gets `401 Unauthorized`.
pub(crate) async fn load_scope<U>(users: &U, actor: &Actor) -> Result<CallerScope, Error>
where
    U: UserRepository + ?Sized,
{
    let user = load_caller(users, actor).await?;
    CallerScope::from_user(&user)
}

/// The caller as currently stored.
///
/// Role checks run against this actor, not the token's, so a demotion or
/// deactivation applies before the token expires.
pub(crate) async fn load_actor<U>(users: &U, actor: &Actor) -> Result<Actor, Error>
where
    U: UserRepository + ?Sized,
{
    load_scope(users, actor).await.map(|scope| scope.actor())
}

/// Load the caller's stored record; `401` when it no longer exists.
pub(crate) async fn load_caller<U>(users: &U, actor: &Actor) -> Result<User, Error>
where
    U: UserRepository + ?Sized,
{
    let user_id = actor.user_id();
    users.find_by_id(&user_id).await?.ok_or_else(|| {
        warn!(user_id = %user_id, "token subject no longer exists");
        Error::unauthorized("account no longer exists")
    })
}

/// Fetch a user that must exist; `404` otherwise.
pub(crate) async fn require_user<U>(users: &U, id: UserId) -> Result<User, Error>
where
    U: UserRepository + ?Sized,
{
    users
        .find_by_id(&id)
        .await?
        .ok_or_else(|| Error::not_found(format!("user {id} not found")))
}

/// Scope of a priest together with the parish they are assigned to.
///
/// Non-priests get `403`; an unassigned priest gets `400`.
pub(crate) async fn load_assigned_priest<U>(
    users: &U,
    actor: &Actor,
    action: &str,
) -> Result<(CallerScope, Uuid), Error>
where
    U: UserRepository + ?Sized,
{
    let scope = load_scope(users, actor).await?;
    if scope.role() != UserRole::Priest {
        return Err(forbidden(action));
    }
    let parish_id = scope
        .parish_id()
        .ok_or_else(|| Error::invalid_request("priest has no parish assignment"))?;
    Ok((scope, parish_id))
}

/// Allow the owning priest or an admin.
///
/// `caller` must come from [`load_actor`] so the stored role is checked.
pub(crate) fn ensure_owner_or_admin(
    caller: &Actor,
    priest_id: UserId,
    action: &str,
) -> Result<(), Error> {
    if caller.is_admin() || caller.is(priest_id) {
        Ok(())
    } else {
        Err(forbidden(action))
    }
}

/// Domain validation failure as `400`.
pub(crate) fn invalid(err: impl Display) -> Error {
    Error::invalid_request(err.to_string())
}

/// Scheduling validation failure as `400`, tagging the ambiguous target case.
pub(crate) fn invalid_schedule(err: SchedulingValidationError) -> Error {
    match err {
        SchedulingValidationError::AmbiguousTarget => {
            Error::rule_violation("ambiguous_target", err.to_string())
        }
        other => invalid(other),
    }
}

/// Booking rule violation as `400` with its detail code.
pub(crate) fn booking_rejected(rejection: BookingRejection) -> Error {
    Error::rule_violation(rejection.code(), rejection.to_string())
}
