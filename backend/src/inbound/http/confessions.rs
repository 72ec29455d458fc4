//! Booking endpoints.
//!
//! ```text
//! POST /api/v1/confessions {"bandId":"...","notes":"..."}
//! GET /api/v1/confessions/mine
//! GET /api/v1/confessions/priest?status=booked
//! GET /api/v1/confessions/{id}
//! POST /api/v1/confessions/{id}/cancel
//! POST /api/v1/confessions/{id}/complete
//! ```
//!
//! Booking rule violations are `400` with a `details.code` such as
//! `band_full` or `duplicate_booking`.

use actix_web::{HttpResponse, get, post, web};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use crate::domain::Error;
use crate::domain::ports::BookConfession;
use crate::domain::scheduling::{Confession, ConfessionStatus};
use crate::inbound::http::ApiResult;
use crate::inbound::http::auth::Authenticated;
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::{FieldName, parse_optional_enum};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ConfessionResponse {
    pub id: Uuid,
    pub faithful_id: Uuid,
    pub priest_id: Uuid,
    /// Set for slot bookings.
    pub slot_id: Option<Uuid>,
    /// Set for band bookings.
    pub band_id: Option<Uuid>,
    pub scheduled_time: DateTime<Utc>,
    pub status: ConfessionStatus,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&Confession> for ConfessionResponse {
    fn from(confession: &Confession) -> Self {
        let target = confession.target();
        Self {
            id: confession.id(),
            faithful_id: *confession.faithful_id().as_uuid(),
            priest_id: *confession.priest_id().as_uuid(),
            slot_id: target.slot_id(),
            band_id: target.band_id(),
            scheduled_time: confession.scheduled_time(),
            status: confession.status(),
            notes: confession.notes().map(str::to_owned),
            created_at: confession.created_at(),
            updated_at: confession.updated_at(),
        }
    }
}

/// Exactly one of `slotId` or `bandId`.
#[derive(Debug, Default, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BookConfessionRequest {
    pub slot_id: Option<Uuid>,
    pub band_id: Option<Uuid>,
    pub notes: Option<String>,
}

impl From<BookConfessionRequest> for BookConfession {
    fn from(value: BookConfessionRequest) -> Self {
        Self {
            slot_id: value.slot_id,
            band_id: value.band_id,
            notes: value.notes,
        }
    }
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct PriestConfessionsQuery {
    /// `booked`, `completed` or `cancelled`.
    pub status: Option<String>,
}

fn to_responses(confessions: &[Confession]) -> Vec<ConfessionResponse> {
    confessions.iter().map(ConfessionResponse::from).collect()
}

/// Book a slot or a place in a band.
#[utoipa::path(
    post,
    path = "/api/v1/confessions",
    request_body = BookConfessionRequest,
    responses(
        (status = 201, description = "Confession booked", body = ConfessionResponse),
        (status = 400, description = "Booking rule violated", body = Error),
        (status = 401, description = "Unauthorised", body = Error),
        (status = 404, description = "Target not found", body = Error)
    ),
    tags = ["confessions"],
    operation_id = "bookConfession"
)]
#[post("/confessions")]
pub async fn book_confession(
    state: web::Data<HttpState>,
    Authenticated(actor): Authenticated,
    payload: web::Json<BookConfessionRequest>,
) -> ApiResult<HttpResponse> {
    let confession = state
        .confessions
        .book(&actor, payload.into_inner().into())
        .await?;
    Ok(HttpResponse::Created().json(ConfessionResponse::from(&confession)))
}

/// The caller's bookings, newest scheduled first.
#[utoipa::path(
    get,
    path = "/api/v1/confessions/mine",
    responses(
        (status = 200, description = "Bookings", body = [ConfessionResponse]),
        (status = 401, description = "Unauthorised", body = Error)
    ),
    tags = ["confessions"],
    operation_id = "myConfessions"
)]
#[get("/confessions/mine")]
pub async fn list_mine(
    state: web::Data<HttpState>,
    Authenticated(actor): Authenticated,
) -> ApiResult<web::Json<Vec<ConfessionResponse>>> {
    let confessions = state.confessions.list_mine(&actor).await?;
    Ok(web::Json(to_responses(&confessions)))
}

/// Confessions heard by the calling priest.
#[utoipa::path(
    get,
    path = "/api/v1/confessions/priest",
    params(PriestConfessionsQuery),
    responses(
        (status = 200, description = "Bookings", body = [ConfessionResponse]),
        (status = 400, description = "Invalid request", body = Error),
        (status = 401, description = "Unauthorised", body = Error),
        (status = 403, description = "Forbidden", body = Error)
    ),
    tags = ["confessions"],
    operation_id = "priestConfessions"
)]
#[get("/confessions/priest")]
pub async fn list_for_priest(
    state: web::Data<HttpState>,
    Authenticated(actor): Authenticated,
    query: web::Query<PriestConfessionsQuery>,
) -> ApiResult<web::Json<Vec<ConfessionResponse>>> {
    let status =
        parse_optional_enum::<ConfessionStatus>(query.status.as_deref(), FieldName::new("status"))?;
    let confessions = state.confessions.list_for_priest(&actor, status).await?;
    Ok(web::Json(to_responses(&confessions)))
}

#[utoipa::path(
    get,
    path = "/api/v1/confessions/{id}",
    params(("id" = Uuid, Path, description = "Confession identifier")),
    responses(
        (status = 200, description = "Booking", body = ConfessionResponse),
        (status = 401, description = "Unauthorised", body = Error),
        (status = 403, description = "Forbidden", body = Error),
        (status = 404, description = "Not found", body = Error)
    ),
    tags = ["confessions"],
    operation_id = "getConfession"
)]
#[get("/confessions/{id}")]
pub async fn get_confession(
    state: web::Data<HttpState>,
    Authenticated(actor): Authenticated,
    path: web::Path<Uuid>,
) -> ApiResult<web::Json<ConfessionResponse>> {
    let confession = state.confessions.get(&actor, path.into_inner()).await?;
    Ok(web::Json(ConfessionResponse::from(&confession)))
}

/// Cancel before the scheduled time and release the place.
#[utoipa::path(
    post,
    path = "/api/v1/confessions/{id}/cancel",
    params(("id" = Uuid, Path, description = "Confession identifier")),
    responses(
        (status = 200, description = "Cancelled booking", body = ConfessionResponse),
        (status = 400, description = "Not booked or already started", body = Error),
        (status = 401, description = "Unauthorised", body = Error),
        (status = 403, description = "Forbidden", body = Error),
        (status = 404, description = "Not found", body = Error)
    ),
    tags = ["confessions"],
    operation_id = "cancelConfession"
)]
#[post("/confessions/{id}/cancel")]
pub async fn cancel_confession(
    state: web::Data<HttpState>,
    Authenticated(actor): Authenticated,
    path: web::Path<Uuid>,
) -> ApiResult<web::Json<ConfessionResponse>> {
    let confession = state.confessions.cancel(&actor, path.into_inner()).await?;
    Ok(web::Json(ConfessionResponse::from(&confession)))
}

/// Mark a booking heard, at or after its scheduled time.
#[utoipa::path(
    post,
    path = "/api/v1/confessions/{id}/complete",
    params(("id" = Uuid, Path, description = "Confession identifier")),
    responses(
        (status = 200, description = "Completed booking", body = ConfessionResponse),
        (status = 400, description = "Not booked or not yet started", body = Error),
        (status = 401, description = "Unauthorised", body = Error),
        (status = 403, description = "Forbidden", body = Error),
        (status = 404, description = "Not found", body = Error)
    ),
    tags = ["confessions"],
    operation_id = "completeConfession"
)]
#[post("/confessions/{id}/complete")]
pub async fn complete_confession(
    state: web::Data<HttpState>,
    Authenticated(actor): Authenticated,
    path: web::Path<Uuid>,
) -> ApiResult<web::Json<ConfessionResponse>> {
    let confession = state
        .confessions
        .complete(&actor, path.into_inner())
        .await?;
    Ok(web::Json(ConfessionResponse::from(&confession)))
}
