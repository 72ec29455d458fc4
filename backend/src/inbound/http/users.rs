//! User administration endpoints.
//!
//! ```text
//! GET /api/v1/users?role=priest&parishId=...
//! GET /api/v1/users/{id}
//! PATCH /api/v1/users/{id} {"firstName":"Maria","phone":null}
//! PUT /api/v1/users/{id}/role {"role":"parish_staff","parishId":"..."}
//! DELETE /api/v1/users/{id}
//! ```

use actix_web::{HttpResponse, delete, get, patch, put, web};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use crate::domain::ports::{RoleAssignment, UserListFilter};
use crate::domain::{Error, ProfileChanges, UserId, UserRole};
use crate::inbound::http::ApiResult;
use crate::inbound::http::auth::Authenticated;
use crate::inbound::http::schemas::UserResponse;
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::{
    FieldName, nullable, parse_optional_enum, parse_optional_name, parse_optional_uuid,
    parse_phone,
};

/// Query string accepted by `GET /users`.
#[derive(Debug, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct UserListQuery {
    /// Only users holding this role.
    pub role: Option<String>,
    /// Only users attached to this parish.
    pub parish_id: Option<String>,
}

impl TryFrom<UserListQuery> for UserListFilter {
    type Error = Error;

    fn try_from(query: UserListQuery) -> Result<Self, Self::Error> {
        Ok(Self {
            role: parse_optional_enum::<UserRole>(query.role.as_deref(), FieldName::new("role"))?,
            parish_id: parse_optional_uuid(query.parish_id.as_deref(), FieldName::new("parishId"))?,
        })
    }
}

/// Partial profile update. Absent fields are untouched; `phone: null` clears
/// the number.
#[derive(Debug, Default, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ProfileUpdateRequest {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    #[serde(default, deserialize_with = "nullable")]
    #[schema(value_type = Option<String>)]
    pub phone: Option<Option<String>>,
}

impl TryFrom<ProfileUpdateRequest> for ProfileChanges {
    type Error = Error;

    fn try_from(value: ProfileUpdateRequest) -> Result<Self, Self::Error> {
        let phone = match value.phone {
            None => None,
            Some(raw) => Some(parse_phone(raw.as_deref())?),
        };
        Ok(Self {
            first_name: parse_optional_name(value.first_name.as_deref(), "firstName")?,
            last_name: parse_optional_name(value.last_name.as_deref(), "lastName")?,
            phone,
        })
    }
}

/// New role with the diocese or parish it is scoped to.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RoleChangeRequest {
    pub role: UserRole,
    pub diocese_id: Option<Uuid>,
    pub parish_id: Option<Uuid>,
}

impl From<RoleChangeRequest> for RoleAssignment {
    fn from(value: RoleChangeRequest) -> Self {
        Self {
            role: value.role,
            diocese_id: value.diocese_id,
            parish_id: value.parish_id,
        }
    }
}

/// List the users the caller may administer.
#[utoipa::path(
    get,
    path = "/api/v1/users",
    params(UserListQuery),
    responses(
        (status = 200, description = "Users", body = [UserResponse]),
        (status = 400, description = "Invalid request", body = Error),
        (status = 401, description = "Unauthorised", body = Error),
        (status = 403, description = "Forbidden", body = Error),
        (status = 500, description = "Internal server error", body = Error)
    ),
    tags = ["users"],
    operation_id = "listUsers"
)]
#[get("/users")]
pub async fn list_users(
    state: web::Data<HttpState>,
    Authenticated(actor): Authenticated,
    query: web::Query<UserListQuery>,
) -> ApiResult<web::Json<Vec<UserResponse>>> {
    let filter = UserListFilter::try_from(query.into_inner())?;
    let users = state.users.list(&actor, filter).await?;
    Ok(web::Json(users.iter().map(UserResponse::from).collect()))
}

/// Fetch one user.
#[utoipa::path(
    get,
    path = "/api/v1/users/{id}",
    params(("id" = Uuid, Path, description = "User identifier")),
    responses(
        (status = 200, description = "User", body = UserResponse),
        (status = 401, description = "Unauthorised", body = Error),
        (status = 403, description = "Forbidden", body = Error),
        (status = 404, description = "Not found", body = Error)
    ),
    tags = ["users"],
    operation_id = "getUser"
)]
#[get("/users/{id}")]
pub async fn get_user(
    state: web::Data<HttpState>,
    Authenticated(actor): Authenticated,
    path: web::Path<Uuid>,
) -> ApiResult<web::Json<UserResponse>> {
    let user = state
        .users
        .get(&actor, UserId::from_uuid(path.into_inner()))
        .await?;
    Ok(web::Json(UserResponse::from(&user)))
}

/// Update names or phone number.
#[utoipa::path(
    patch,
    path = "/api/v1/users/{id}",
    params(("id" = Uuid, Path, description = "User identifier")),
    request_body = ProfileUpdateRequest,
    responses(
        (status = 200, description = "Updated user", body = UserResponse),
        (status = 400, description = "Invalid request", body = Error),
        (status = 401, description = "Unauthorised", body = Error),
        (status = 403, description = "Forbidden", body = Error),
        (status = 404, description = "Not found", body = Error)
    ),
    tags = ["users"],
    operation_id = "updateUser"
)]
#[patch("/users/{id}")]
pub async fn update_user(
    state: web::Data<HttpState>,
    Authenticated(actor): Authenticated,
    path: web::Path<Uuid>,
    payload: web::Json<ProfileUpdateRequest>,
) -> ApiResult<web::Json<UserResponse>> {
    let changes = ProfileChanges::try_from(payload.into_inner())?;
    let user = state
        .users
        .update_profile(&actor, UserId::from_uuid(path.into_inner()), changes)
        .await?;
    Ok(web::Json(UserResponse::from(&user)))
}

/// Change a user's role and its scope.
#[utoipa::path(
    put,
    path = "/api/v1/users/{id}/role",
    params(("id" = Uuid, Path, description = "User identifier")),
    request_body = RoleChangeRequest,
    responses(
        (status = 200, description = "Updated user", body = UserResponse),
        (status = 400, description = "Invalid request", body = Error),
        (status = 401, description = "Unauthorised", body = Error),
        (status = 403, description = "Forbidden", body = Error),
        (status = 404, description = "Not found", body = Error)
    ),
    tags = ["users"],
    operation_id = "changeUserRole"
)]
#[put("/users/{id}/role")]
pub async fn change_role(
    state: web::Data<HttpState>,
    Authenticated(actor): Authenticated,
    path: web::Path<Uuid>,
    payload: web::Json<RoleChangeRequest>,
) -> ApiResult<web::Json<UserResponse>> {
    let user = state
        .users
        .change_role(
            &actor,
            UserId::from_uuid(path.into_inner()),
            payload.into_inner().into(),
        )
        .await?;
    Ok(web::Json(UserResponse::from(&user)))
}

/// Soft-delete an account.
#[utoipa::path(
    delete,
    path = "/api/v1/users/{id}",
    params(("id" = Uuid, Path, description = "User identifier")),
    responses(
        (status = 204, description = "User deactivated"),
        (status = 401, description = "Unauthorised", body = Error),
        (status = 403, description = "Forbidden", body = Error),
        (status = 404, description = "Not found", body = Error)
    ),
    tags = ["users"],
    operation_id = "deactivateUser"
)]
#[delete("/users/{id}")]
pub async fn deactivate_user(
    state: web::Data<HttpState>,
    Authenticated(actor): Authenticated,
    path: web::Path<Uuid>,
) -> ApiResult<HttpResponse> {
    state
        .users
        .deactivate(&actor, UserId::from_uuid(path.into_inner()))
        .await?;
    Ok(HttpResponse::NoContent().finish())
}
