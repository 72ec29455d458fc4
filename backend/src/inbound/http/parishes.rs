//! Parish administration endpoints.
//!
//! ```text
//! GET /api/v1/parishes?dioceseId=...
//! POST /api/v1/parishes {"dioceseId":"...","name":"San Damiano","latitude":43.06,"longitude":12.62}
//! GET|PATCH|DELETE /api/v1/parishes/{id}
//! ```

use actix_web::{HttpResponse, delete, get, patch, post, web};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use crate::domain::ports::NewParish;
use crate::domain::{Error, Parish, ParishChanges};
use crate::inbound::http::ApiResult;
use crate::inbound::http::auth::Authenticated;
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::{
    FieldName, nullable, parse_location, parse_optional_uuid,
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ParishResponse {
    pub id: Uuid,
    pub diocese_id: Uuid,
    #[schema(example = "San Damiano")]
    pub name: String,
    pub address: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&Parish> for ParishResponse {
    fn from(parish: &Parish) -> Self {
        let location = parish.location();
        Self {
            id: parish.id(),
            diocese_id: parish.diocese_id(),
            name: parish.name().to_owned(),
            address: parish.address().map(str::to_owned),
            latitude: location.map(|point| point.latitude()),
            longitude: location.map(|point| point.longitude()),
            active: parish.is_active(),
            created_at: parish.created_at(),
            updated_at: parish.updated_at(),
        }
    }
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct ParishListQuery {
    /// Restrict to one diocese.
    pub diocese_id: Option<String>,
}

/// Coordinates are optional but must be supplied together.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateParishRequest {
    pub diocese_id: Uuid,
    pub name: String,
    pub address: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

impl TryFrom<CreateParishRequest> for NewParish {
    type Error = Error;

    fn try_from(value: CreateParishRequest) -> Result<Self, Self::Error> {
        Ok(Self {
            location: parse_location(value.latitude, value.longitude)?,
            diocese_id: value.diocese_id,
            name: value.name,
            address: value.address,
        })
    }
}

/// Partial update; `address: null` clears the address.
#[derive(Debug, Default, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct UpdateParishRequest {
    pub name: Option<String>,
    #[serde(default, deserialize_with = "nullable")]
    #[schema(value_type = Option<String>)]
    pub address: Option<Option<String>>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

impl TryFrom<UpdateParishRequest> for ParishChanges {
    type Error = Error;

    fn try_from(value: UpdateParishRequest) -> Result<Self, Self::Error> {
        Ok(Self {
            location: parse_location(value.latitude, value.longitude)?,
            name: value.name,
            address: value.address,
        })
    }
}

#[utoipa::path(
    post,
    path = "/api/v1/parishes",
    request_body = CreateParishRequest,
    responses(
        (status = 201, description = "Parish created", body = ParishResponse),
        (status = 400, description = "Invalid request", body = Error),
        (status = 401, description = "Unauthorised", body = Error),
        (status = 403, description = "Forbidden", body = Error),
        (status = 404, description = "Diocese not found", body = Error)
    ),
    tags = ["parishes"],
    operation_id = "createParish"
)]
#[post("/parishes")]
pub async fn create_parish(
    state: web::Data<HttpState>,
    Authenticated(actor): Authenticated,
    payload: web::Json<CreateParishRequest>,
) -> ApiResult<HttpResponse> {
    let new_parish = NewParish::try_from(payload.into_inner())?;
    let parish = state.parishes.create(&actor, new_parish).await?;
    Ok(HttpResponse::Created().json(ParishResponse::from(&parish)))
}

/// Active parishes, optionally within one diocese.
#[utoipa::path(
    get,
    path = "/api/v1/parishes",
    params(ParishListQuery),
    responses(
        (status = 200, description = "Parishes", body = [ParishResponse]),
        (status = 400, description = "Invalid request", body = Error),
        (status = 401, description = "Unauthorised", body = Error)
    ),
    tags = ["parishes"],
    operation_id = "listParishes"
)]
#[get("/parishes")]
pub async fn list_parishes(
    state: web::Data<HttpState>,
    Authenticated(actor): Authenticated,
    query: web::Query<ParishListQuery>,
) -> ApiResult<web::Json<Vec<ParishResponse>>> {
    let diocese_id =
        parse_optional_uuid(query.diocese_id.as_deref(), FieldName::new("dioceseId"))?;
    let parishes = state.parishes.list(&actor, diocese_id).await?;
    Ok(web::Json(parishes.iter().map(ParishResponse::from).collect()))
}

#[utoipa::path(
    get,
    path = "/api/v1/parishes/{id}",
    params(("id" = Uuid, Path, description = "Parish identifier")),
    responses(
        (status = 200, description = "Parish", body = ParishResponse),
        (status = 401, description = "Unauthorised", body = Error),
        (status = 404, description = "Not found", body = Error)
    ),
    tags = ["parishes"],
    operation_id = "getParish"
)]
#[get("/parishes/{id}")]
pub async fn get_parish(
    state: web::Data<HttpState>,
    Authenticated(actor): Authenticated,
    path: web::Path<Uuid>,
) -> ApiResult<web::Json<ParishResponse>> {
    let parish = state.parishes.get(&actor, path.into_inner()).await?;
    Ok(web::Json(ParishResponse::from(&parish)))
}

#[utoipa::path(
    patch,
    path = "/api/v1/parishes/{id}",
    params(("id" = Uuid, Path, description = "Parish identifier")),
    request_body = UpdateParishRequest,
    responses(
        (status = 200, description = "Updated parish", body = ParishResponse),
        (status = 400, description = "Invalid request", body = Error),
        (status = 401, description = "Unauthorised", body = Error),
        (status = 403, description = "Forbidden", body = Error),
        (status = 404, description = "Not found", body = Error)
    ),
    tags = ["parishes"],
    operation_id = "updateParish"
)]
#[patch("/parishes/{id}")]
pub async fn update_parish(
    state: web::Data<HttpState>,
    Authenticated(actor): Authenticated,
    path: web::Path<Uuid>,
    payload: web::Json<UpdateParishRequest>,
) -> ApiResult<web::Json<ParishResponse>> {
    let changes = ParishChanges::try_from(payload.into_inner())?;
    let parish = state
        .parishes
        .update(&actor, path.into_inner(), changes)
        .await?;
    Ok(web::Json(ParishResponse::from(&parish)))
}

#[utoipa::path(
    delete,
    path = "/api/v1/parishes/{id}",
    params(("id" = Uuid, Path, description = "Parish identifier")),
    responses(
        (status = 204, description = "Parish deactivated"),
        (status = 401, description = "Unauthorised", body = Error),
        (status = 403, description = "Forbidden", body = Error),
        (status = 404, description = "Not found", body = Error)
    ),
    tags = ["parishes"],
    operation_id = "deleteParish"
)]
#[delete("/parishes/{id}")]
pub async fn delete_parish(
    state: web::Data<HttpState>,
    Authenticated(actor): Authenticated,
    path: web::Path<Uuid>,
) -> ApiResult<HttpResponse> {
    state.parishes.delete(&actor, path.into_inner()).await?;
    Ok(HttpResponse::NoContent().finish())
}
