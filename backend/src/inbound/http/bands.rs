//! Confession band endpoints.
//!
//! ```text
//! GET /api/v1/confession-bands?parishId=...&status=available
//! POST /api/v1/confession-bands {"startTime":"...","endTime":"...","capacity":10,"recurrence":"weekly","recurrenceUntil":"..."}
//! GET /api/v1/confession-bands/{id}
//! PUT /api/v1/confession-bands/{id}/capacity {"capacity":12}
//! POST /api/v1/confession-bands/{id}/cancel
//! ```

use actix_web::{HttpResponse, get, post, put, web};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::domain::Error;
use crate::domain::ports::NewBandSeries;
use crate::domain::scheduling::{BandStatus, ConfessionBand, Recurrence};
use crate::inbound::http::ApiResult;
use crate::inbound::http::auth::Authenticated;
use crate::inbound::http::schemas::ScheduleQuery;
use crate::inbound::http::state::HttpState;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BandResponse {
    pub id: Uuid,
    pub priest_id: Uuid,
    pub parish_id: Uuid,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub capacity: u32,
    pub booked_count: u32,
    /// `capacity - bookedCount`.
    pub remaining: u32,
    pub status: BandStatus,
    pub recurrence: Recurrence,
    pub recurrence_until: Option<DateTime<Utc>>,
    pub series_id: Option<Uuid>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&ConfessionBand> for BandResponse {
    fn from(band: &ConfessionBand) -> Self {
        Self {
            id: band.id(),
            priest_id: *band.priest_id().as_uuid(),
            parish_id: band.parish_id(),
            start_time: band.start_time(),
            end_time: band.end_time(),
            capacity: band.capacity(),
            booked_count: band.booked_count(),
            remaining: band.remaining(),
            status: band.status(),
            recurrence: band.recurrence(),
            recurrence_until: band.recurrence_until(),
            series_id: band.series_id(),
            notes: band.notes().map(str::to_owned),
            created_at: band.created_at(),
            updated_at: band.updated_at(),
        }
    }
}

fn default_recurrence() -> Recurrence {
    Recurrence::None
}

#[derive(Debug, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateBandRequest {
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    /// 1 to 50.
    pub capacity: u32,
    #[serde(default = "default_recurrence")]
    pub recurrence: Recurrence,
    /// Last day a recurring series may start on, inclusive.
    pub recurrence_until: Option<DateTime<Utc>>,
    pub notes: Option<String>,
}

impl From<CreateBandRequest> for NewBandSeries {
    fn from(value: CreateBandRequest) -> Self {
        Self {
            start_time: value.start_time,
            end_time: value.end_time,
            capacity: value.capacity,
            recurrence: value.recurrence,
            recurrence_until: value.recurrence_until,
            notes: value.notes,
        }
    }
}

#[derive(Debug, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CapacityRequest {
    pub capacity: u32,
}

/// Create a band, or one band per occurrence of a recurring series.
#[utoipa::path(
    post,
    path = "/api/v1/confession-bands",
    request_body = CreateBandRequest,
    responses(
        (status = 201, description = "Bands created in start order", body = [BandResponse]),
        (status = 400, description = "Invalid request", body = Error),
        (status = 401, description = "Unauthorised", body = Error),
        (status = 403, description = "Forbidden", body = Error)
    ),
    tags = ["confession-bands"],
    operation_id = "createBands"
)]
#[post("/confession-bands")]
pub async fn create_bands(
    state: web::Data<HttpState>,
    Authenticated(actor): Authenticated,
    payload: web::Json<CreateBandRequest>,
) -> ApiResult<HttpResponse> {
    let bands = state
        .bands
        .create(&actor, payload.into_inner().into())
        .await?;
    let body: Vec<BandResponse> = bands.iter().map(BandResponse::from).collect();
    Ok(HttpResponse::Created().json(body))
}

#[utoipa::path(
    get,
    path = "/api/v1/confession-bands",
    params(ScheduleQuery),
    responses(
        (status = 200, description = "Bands ordered by start time", body = [BandResponse]),
        (status = 400, description = "Invalid request", body = Error),
        (status = 401, description = "Unauthorised", body = Error)
    ),
    tags = ["confession-bands"],
    operation_id = "listBands"
)]
#[get("/confession-bands")]
pub async fn list_bands(
    state: web::Data<HttpState>,
    _caller: Authenticated,
    query: web::Query<ScheduleQuery>,
) -> ApiResult<web::Json<Vec<BandResponse>>> {
    let filter = query.into_inner().into_filter::<BandStatus>()?;
    let bands = state.bands.list(filter).await?;
    Ok(web::Json(bands.iter().map(BandResponse::from).collect()))
}

#[utoipa::path(
    get,
    path = "/api/v1/confession-bands/{id}",
    params(("id" = Uuid, Path, description = "Band identifier")),
    responses(
        (status = 200, description = "Band", body = BandResponse),
        (status = 401, description = "Unauthorised", body = Error),
        (status = 404, description = "Not found", body = Error)
    ),
    tags = ["confession-bands"],
    operation_id = "getBand"
)]
#[get("/confession-bands/{id}")]
pub async fn get_band(
    state: web::Data<HttpState>,
    _caller: Authenticated,
    path: web::Path<Uuid>,
) -> ApiResult<web::Json<BandResponse>> {
    let band = state.bands.get(path.into_inner()).await?;
    Ok(web::Json(BandResponse::from(&band)))
}

/// Resize a band; never below its current bookings.
#[utoipa::path(
    put,
    path = "/api/v1/confession-bands/{id}/capacity",
    params(("id" = Uuid, Path, description = "Band identifier")),
    request_body = CapacityRequest,
    responses(
        (status = 200, description = "Updated band", body = BandResponse),
        (status = 400, description = "Capacity out of range or band cancelled", body = Error),
        (status = 401, description = "Unauthorised", body = Error),
        (status = 403, description = "Forbidden", body = Error),
        (status = 404, description = "Not found", body = Error)
    ),
    tags = ["confession-bands"],
    operation_id = "updateBandCapacity"
)]
#[put("/confession-bands/{id}/capacity")]
pub async fn update_capacity(
    state: web::Data<HttpState>,
    Authenticated(actor): Authenticated,
    path: web::Path<Uuid>,
    payload: web::Json<CapacityRequest>,
) -> ApiResult<web::Json<BandResponse>> {
    let band = state
        .bands
        .update_capacity(&actor, path.into_inner(), payload.capacity)
        .await?;
    Ok(web::Json(BandResponse::from(&band)))
}

/// Cancel a band and every booking on it.
#[utoipa::path(
    post,
    path = "/api/v1/confession-bands/{id}/cancel",
    params(("id" = Uuid, Path, description = "Band identifier")),
    responses(
        (status = 200, description = "Cancelled band", body = BandResponse),
        (status = 401, description = "Unauthorised", body = Error),
        (status = 403, description = "Forbidden", body = Error),
        (status = 404, description = "Not found", body = Error)
    ),
    tags = ["confession-bands"],
    operation_id = "cancelBand"
)]
#[post("/confession-bands/{id}/cancel")]
pub async fn cancel_band(
    state: web::Data<HttpState>,
    Authenticated(actor): Authenticated,
    path: web::Path<Uuid>,
) -> ApiResult<web::Json<BandResponse>> {
    let band = state.bands.cancel(&actor, path.into_inner()).await?;
    Ok(web::Json(BandResponse::from(&band)))
}
