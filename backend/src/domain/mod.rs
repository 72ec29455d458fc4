//! Domain primitives, aggregates and use-case services.
//!
//! Purpose: define the strongly typed ConfesApp entities, the ports that
//! connect them to adapters, and the services that enforce authorisation and
//! business rules. Nothing here knows about HTTP or SQL.
//!
//! Public surface:
//! - `Error` / `ErrorCode`: transport-agnostic error payload.
//! - Entities: `User`, `Diocese`, `Parish`, `Invite`, `PriestParishRequest`,
//!   `ConfessionSlot`, `ConfessionBand`, `Confession`.
//! - `Actor` / `CallerScope`: who is calling and what they may reach.
//! - `*ServiceImpl`: driving-port implementations wired by the server.

pub mod access;
pub mod auth;
pub mod directory;
pub mod error;
pub mod invite;
pub mod ports;
pub mod priest_assignment;
pub mod scheduling;
pub(crate) mod text_enum;
pub mod trace_id;
pub mod user;

mod account_service;
mod bands_service;
mod confessions_service;
mod directory_service;
mod invites_service;
mod priest_requests_service;
mod service_support;
mod slots_service;
mod users_service;

#[cfg(test)]
pub(crate) mod test_support;

pub use self::access::CallerScope;
pub use self::account_service::AccountServiceImpl;
pub use self::auth::{
    Actor, CredentialsValidationError, LoginCredentials, NewPassword, PASSWORD_MAX, PASSWORD_MIN,
};
pub use self::bands_service::ConfessionBandsServiceImpl;
pub use self::confessions_service::ConfessionsServiceImpl;
pub use self::directory::{
    Diocese, DioceseChanges, DioceseDraft, DirectoryValidationError, GeoPoint, Parish,
    ParishChanges, ParishDraft,
};
pub use self::directory_service::{DiocesesServiceImpl, ParishesServiceImpl};
pub use self::error::{Error, ErrorCode, ErrorValidationError};
pub use self::invite::{
    DEFAULT_INVITE_TTL_DAYS, Invite, InviteDraft, InviteStateError, InviteStatus, InviteToken,
    InviteValidationError, MAX_INVITE_TTL_DAYS,
};
pub use self::invites_service::InvitesServiceImpl;
pub use self::priest_assignment::{
    PriestParishHistory, PriestParishRequest, PriestParishRequestDraft, PriestRequestError,
    RequestStatus,
};
pub use self::priest_requests_service::PriestRequestsServiceImpl;
pub use self::slots_service::ConfessionSlotsServiceImpl;
pub use self::trace_id::{TRACE_ID_HEADER, TraceId};
pub use self::user::{
    Email, PersonName, ProfileChanges, User, UserDraft, UserId, UserRole, UserValidationError,
};
pub use self::users_service::UsersServiceImpl;

/// Convenient API result alias.
///
/// # Examples
/// ```
/// use actix_web::HttpResponse;
/// use confesapp::domain::{ApiResult, Error};
///
/// fn handler() -> ApiResult<HttpResponse> {
///     Err(Error::forbidden("nope"))
/// }
/// ```
pub type ApiResult<T> = Result<T, Error>;
