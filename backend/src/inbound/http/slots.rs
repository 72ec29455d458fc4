//! Confession slot endpoints.
//!
//! ```text
//! GET /api/v1/confession-slots?priestId=...&from=2026-04-02T00:00:00Z&status=available
//! POST /api/v1/confession-slots {"startTime":"...","endTime":"...","notes":"..."}
//! GET|PATCH|DELETE /api/v1/confession-slots/{id}
//! ```

use actix_web::{HttpResponse, delete, get, patch, post, web};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::domain::Error;
use crate::domain::ports::NewSlot;
use crate::domain::scheduling::{ConfessionSlot, SlotChanges, SlotStatus};
use crate::inbound::http::ApiResult;
use crate::inbound::http::auth::Authenticated;
use crate::inbound::http::schemas::ScheduleQuery;
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::nullable;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SlotResponse {
    pub id: Uuid,
    pub priest_id: Uuid,
    pub parish_id: Uuid,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub status: SlotStatus,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&ConfessionSlot> for SlotResponse {
    fn from(slot: &ConfessionSlot) -> Self {
        Self {
            id: slot.id(),
            priest_id: *slot.priest_id().as_uuid(),
            parish_id: slot.parish_id(),
            start_time: slot.start_time(),
            end_time: slot.end_time(),
            status: slot.status(),
            notes: slot.notes().map(str::to_owned),
            created_at: slot.created_at(),
            updated_at: slot.updated_at(),
        }
    }
}

#[derive(Debug, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateSlotRequest {
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub notes: Option<String>,
}

impl From<CreateSlotRequest> for NewSlot {
    fn from(value: CreateSlotRequest) -> Self {
        Self {
            start_time: value.start_time,
            end_time: value.end_time,
            notes: value.notes,
        }
    }
}

/// Partial update; `notes: null` clears the notes.
#[derive(Debug, Default, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct UpdateSlotRequest {
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "nullable")]
    #[schema(value_type = Option<String>)]
    pub notes: Option<Option<String>>,
}

impl From<UpdateSlotRequest> for SlotChanges {
    fn from(value: UpdateSlotRequest) -> Self {
        Self {
            start_time: value.start_time,
            end_time: value.end_time,
            notes: value.notes,
        }
    }
}

/// Publish a slot at the caller's parish. Priests only.
#[utoipa::path(
    post,
    path = "/api/v1/confession-slots",
    request_body = CreateSlotRequest,
    responses(
        (status = 201, description = "Slot created", body = SlotResponse),
        (status = 400, description = "Invalid or overlapping window", body = Error),
        (status = 401, description = "Unauthorised", body = Error),
        (status = 403, description = "Forbidden", body = Error)
    ),
    tags = ["confession-slots"],
    operation_id = "createSlot"
)]
#[post("/confession-slots")]
pub async fn create_slot(
    state: web::Data<HttpState>,
    Authenticated(actor): Authenticated,
    payload: web::Json<CreateSlotRequest>,
) -> ApiResult<HttpResponse> {
    let slot = state
        .slots
        .create(&actor, payload.into_inner().into())
        .await?;
    Ok(HttpResponse::Created().json(SlotResponse::from(&slot)))
}

/// Slots ordered by start time.
#[utoipa::path(
    get,
    path = "/api/v1/confession-slots",
    params(ScheduleQuery),
    responses(
        (status = 200, description = "Slots", body = [SlotResponse]),
        (status = 400, description = "Invalid request", body = Error),
        (status = 401, description = "Unauthorised", body = Error)
    ),
    tags = ["confession-slots"],
    operation_id = "listSlots"
)]
#[get("/confession-slots")]
pub async fn list_slots(
    state: web::Data<HttpState>,
    _caller: Authenticated,
    query: web::Query<ScheduleQuery>,
) -> ApiResult<web::Json<Vec<SlotResponse>>> {
    let filter = query.into_inner().into_filter::<SlotStatus>()?;
    let slots = state.slots.list(filter).await?;
    Ok(web::Json(slots.iter().map(SlotResponse::from).collect()))
}

#[utoipa::path(
    get,
    path = "/api/v1/confession-slots/{id}",
    params(("id" = Uuid, Path, description = "Slot identifier")),
    responses(
        (status = 200, description = "Slot", body = SlotResponse),
        (status = 401, description = "Unauthorised", body = Error),
        (status = 404, description = "Not found", body = Error)
    ),
    tags = ["confession-slots"],
    operation_id = "getSlot"
)]
#[get("/confession-slots/{id}")]
pub async fn get_slot(
    state: web::Data<HttpState>,
    _caller: Authenticated,
    path: web::Path<Uuid>,
) -> ApiResult<web::Json<SlotResponse>> {
    let slot = state.slots.get(path.into_inner()).await?;
    Ok(web::Json(SlotResponse::from(&slot)))
}

/// Move or annotate an available slot.
#[utoipa::path(
    patch,
    path = "/api/v1/confession-slots/{id}",
    params(("id" = Uuid, Path, description = "Slot identifier")),
    request_body = UpdateSlotRequest,
    responses(
        (status = 200, description = "Updated slot", body = SlotResponse),
        (status = 400, description = "Invalid request", body = Error),
        (status = 401, description = "Unauthorised", body = Error),
        (status = 403, description = "Forbidden", body = Error),
        (status = 404, description = "Not found", body = Error)
    ),
    tags = ["confession-slots"],
    operation_id = "updateSlot"
)]
#[patch("/confession-slots/{id}")]
pub async fn update_slot(
    state: web::Data<HttpState>,
    Authenticated(actor): Authenticated,
    path: web::Path<Uuid>,
    payload: web::Json<UpdateSlotRequest>,
) -> ApiResult<web::Json<SlotResponse>> {
    let slot = state
        .slots
        .update(&actor, path.into_inner(), payload.into_inner().into())
        .await?;
    Ok(web::Json(SlotResponse::from(&slot)))
}

/// Delete a slot that has never been booked.
#[utoipa::path(
    delete,
    path = "/api/v1/confession-slots/{id}",
    params(("id" = Uuid, Path, description = "Slot identifier")),
    responses(
        (status = 204, description = "Slot deleted"),
        (status = 400, description = "Slot is booked or referenced", body = Error),
        (status = 401, description = "Unauthorised", body = Error),
        (status = 403, description = "Forbidden", body = Error),
        (status = 404, description = "Not found", body = Error)
    ),
    tags = ["confession-slots"],
    operation_id = "deleteSlot"
)]
#[delete("/confession-slots/{id}")]
pub async fn delete_slot(
    state: web::Data<HttpState>,
    Authenticated(actor): Authenticated,
    path: web::Path<Uuid>,
) -> ApiResult<HttpResponse> {
    state.slots.delete(&actor, path.into_inner()).await?;
    Ok(HttpResponse::NoContent().finish())
}
