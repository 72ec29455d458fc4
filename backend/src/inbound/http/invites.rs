//! Invitation endpoints.
//!
//! ```text
//! POST /api/v1/invites {"email":"don.luca@example.org","role":"priest","parishId":"..."}
//! GET /api/v1/invites
//! GET /api/v1/invites/token/{token}
//! POST /api/v1/invites/token/{token}/accept
//! POST /api/v1/invites/token/{token}/register {"password":"...","firstName":"Luca","lastName":"Bianchi"}
//! POST /api/v1/invites/{id}/revoke
//! ```
//!
//! The plaintext token appears only in the create response. Lookups by token
//! answer `404` for malformed and unknown tokens alike.

use actix_web::{HttpResponse, get, post, web};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::domain::ports::{InviteRegistration, NewInvite};
use crate::domain::{Error, Invite, InviteStatus, InviteToken, UserRole};
use crate::inbound::http::ApiResult;
use crate::inbound::http::auth::{Authenticated, TokenCodec};
use crate::inbound::http::schemas::{AuthResponse, UserResponse};
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::{parse_email, parse_name, parse_new_password, parse_phone};

/// Invite without its token.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct InviteResponse {
    pub id: Uuid,
    pub email: String,
    pub role: UserRole,
    pub parish_id: Option<Uuid>,
    pub diocese_id: Option<Uuid>,
    pub invited_by: Uuid,
    pub status: InviteStatus,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl From<&Invite> for InviteResponse {
    fn from(invite: &Invite) -> Self {
        Self {
            id: invite.id(),
            email: invite.email().to_string(),
            role: invite.role(),
            parish_id: invite.parish_id(),
            diocese_id: invite.diocese_id(),
            invited_by: *invite.invited_by().as_uuid(),
            status: invite.status(),
            expires_at: invite.expires_at(),
            created_at: invite.created_at(),
        }
    }
}

/// Create response: the invite plus the token to hand to the invitee.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct IssuedInviteResponse {
    #[serde(flatten)]
    pub invite: InviteResponse,
    /// 64 hex characters. Not retrievable later.
    pub token: String,
}

#[derive(Debug, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateInviteRequest {
    pub email: String,
    pub role: UserRole,
    pub parish_id: Option<Uuid>,
    pub diocese_id: Option<Uuid>,
    /// Lifetime in days, 1 to 30. Defaults to 7.
    pub ttl_days: Option<i64>,
}

impl TryFrom<CreateInviteRequest> for NewInvite {
    type Error = Error;

    fn try_from(value: CreateInviteRequest) -> Result<Self, Self::Error> {
        Ok(Self {
            email: parse_email(&value.email)?,
            role: value.role,
            parish_id: value.parish_id,
            diocese_id: value.diocese_id,
            ttl_days: value.ttl_days,
        })
    }
}

#[derive(Debug, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct InviteRegisterRequest {
    pub password: String,
    pub first_name: String,
    pub last_name: String,
    #[serde(default)]
    pub phone: Option<String>,
}

impl TryFrom<InviteRegisterRequest> for InviteRegistration {
    type Error = Error;

    fn try_from(value: InviteRegisterRequest) -> Result<Self, Self::Error> {
        Ok(Self {
            password: parse_new_password(&value.password)?,
            first_name: parse_name(&value.first_name, "firstName")?,
            last_name: parse_name(&value.last_name, "lastName")?,
            phone: parse_phone(value.phone.as_deref())?,
        })
    }
}

fn parse_token(raw: &str) -> Result<InviteToken, Error> {
    InviteToken::parse(raw).map_err(|_| Error::not_found("invite not found"))
}

/// Issue an invite for priest, parish staff or bishop.
#[utoipa::path(
    post,
    path = "/api/v1/invites",
    request_body = CreateInviteRequest,
    responses(
        (status = 201, description = "Invite issued", body = IssuedInviteResponse),
        (status = 400, description = "Invalid request", body = Error),
        (status = 401, description = "Unauthorised", body = Error),
        (status = 403, description = "Forbidden", body = Error)
    ),
    tags = ["invites"],
    operation_id = "createInvite"
)]
#[post("/invites")]
pub async fn create_invite(
    state: web::Data<HttpState>,
    Authenticated(actor): Authenticated,
    payload: web::Json<CreateInviteRequest>,
) -> ApiResult<HttpResponse> {
    let new_invite = NewInvite::try_from(payload.into_inner())?;
    let issued = state.invites.create(&actor, new_invite).await?;
    Ok(HttpResponse::Created().json(IssuedInviteResponse {
        invite: InviteResponse::from(&issued.invite),
        token: issued.token.expose().to_owned(),
    }))
}

/// Invites visible to the caller.
#[utoipa::path(
    get,
    path = "/api/v1/invites",
    responses(
        (status = 200, description = "Invites", body = [InviteResponse]),
        (status = 401, description = "Unauthorised", body = Error),
        (status = 403, description = "Forbidden", body = Error)
    ),
    tags = ["invites"],
    operation_id = "listInvites"
)]
#[get("/invites")]
pub async fn list_invites(
    state: web::Data<HttpState>,
    Authenticated(actor): Authenticated,
) -> ApiResult<web::Json<Vec<InviteResponse>>> {
    let invites = state.invites.list(&actor).await?;
    Ok(web::Json(invites.iter().map(InviteResponse::from).collect()))
}

/// Public lookup used by the invite landing page.
#[utoipa::path(
    get,
    path = "/api/v1/invites/token/{token}",
    params(("token" = String, Path, description = "Invite token")),
    responses(
        (status = 200, description = "Usable invite", body = InviteResponse),
        (status = 404, description = "Unknown token", body = Error),
        (status = 409, description = "Invite no longer usable", body = Error)
    ),
    tags = ["invites"],
    operation_id = "inspectInvite",
    security([])
)]
#[get("/invites/token/{token}")]
pub async fn inspect_invite(
    state: web::Data<HttpState>,
    path: web::Path<String>,
) -> ApiResult<web::Json<InviteResponse>> {
    let token = parse_token(&path)?;
    let invite = state.invites.inspect(&token).await?;
    Ok(web::Json(InviteResponse::from(&invite)))
}

/// Take the invited role on an existing account.
#[utoipa::path(
    post,
    path = "/api/v1/invites/token/{token}/accept",
    params(("token" = String, Path, description = "Invite token")),
    responses(
        (status = 200, description = "Updated account", body = UserResponse),
        (status = 401, description = "Unauthorised", body = Error),
        (status = 403, description = "Invite addressed to another email", body = Error),
        (status = 404, description = "Unknown token", body = Error),
        (status = 409, description = "Invite no longer usable", body = Error)
    ),
    tags = ["invites"],
    operation_id = "acceptInvite"
)]
#[post("/invites/token/{token}/accept")]
pub async fn accept_invite(
    state: web::Data<HttpState>,
    Authenticated(actor): Authenticated,
    path: web::Path<String>,
) -> ApiResult<web::Json<UserResponse>> {
    let token = parse_token(&path)?;
    let user = state.invites.accept(&actor, &token).await?;
    Ok(web::Json(UserResponse::from(&user)))
}

/// Create an account for the invited email and sign it in.
#[utoipa::path(
    post,
    path = "/api/v1/invites/token/{token}/register",
    params(("token" = String, Path, description = "Invite token")),
    request_body = InviteRegisterRequest,
    responses(
        (status = 201, description = "Account created", body = AuthResponse),
        (status = 400, description = "Invalid request", body = Error),
        (status = 404, description = "Unknown token", body = Error),
        (status = 409, description = "Invite unusable or email taken", body = Error)
    ),
    tags = ["invites"],
    operation_id = "registerWithInvite",
    security([])
)]
#[post("/invites/token/{token}/register")]
pub async fn register_with_invite(
    state: web::Data<HttpState>,
    tokens: web::Data<TokenCodec>,
    path: web::Path<String>,
    payload: web::Json<InviteRegisterRequest>,
) -> ApiResult<HttpResponse> {
    let token = parse_token(&path)?;
    let registration = InviteRegistration::try_from(payload.into_inner())?;
    let user = state.invites.register(&token, registration).await?;
    let issued = tokens.issue(&user)?;
    Ok(HttpResponse::Created().json(AuthResponse::new(issued, &user)))
}

/// Revoke a pending invite.
#[utoipa::path(
    post,
    path = "/api/v1/invites/{id}/revoke",
    params(("id" = Uuid, Path, description = "Invite identifier")),
    responses(
        (status = 200, description = "Revoked invite", body = InviteResponse),
        (status = 401, description = "Unauthorised", body = Error),
        (status = 403, description = "Forbidden", body = Error),
        (status = 404, description = "Not found", body = Error),
        (status = 409, description = "Invite is not pending", body = Error)
    ),
    tags = ["invites"],
    operation_id = "revokeInvite"
)]
#[post("/invites/{id}/revoke")]
pub async fn revoke_invite(
    state: web::Data<HttpState>,
    Authenticated(actor): Authenticated,
    path: web::Path<Uuid>,
) -> ApiResult<web::Json<InviteResponse>> {
    let invite = state.invites.revoke(&actor, path.into_inner()).await?;
    Ok(web::Json(InviteResponse::from(&invite)))
}
