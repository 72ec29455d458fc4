//! Priest parish request endpoints.
//!
//! ```text
//! POST /api/v1/priest-requests {"parishId":"...","message":"..."}
//! GET /api/v1/priest-requests?status=pending
//! POST /api/v1/priest-requests/{id}/accept
//! POST /api/v1/priest-requests/{id}/reject
//! GET /api/v1/priests/{id}/history
//! ```

use actix_web::{HttpResponse, get, post, web};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use crate::domain::{Error, PriestParishHistory, PriestParishRequest, RequestStatus, UserId};
use crate::inbound::http::ApiResult;
use crate::inbound::http::auth::Authenticated;
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::{FieldName, parse_optional_enum};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PriestRequestResponse {
    pub id: Uuid,
    pub priest_id: Uuid,
    pub parish_id: Uuid,
    pub message: Option<String>,
    pub status: RequestStatus,
    pub reviewed_by: Option<Uuid>,
    pub reviewed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl From<&PriestParishRequest> for PriestRequestResponse {
    fn from(request: &PriestParishRequest) -> Self {
        Self {
            id: request.id(),
            priest_id: *request.priest_id().as_uuid(),
            parish_id: request.parish_id(),
            message: request.message().map(str::to_owned),
            status: request.status(),
            reviewed_by: request.reviewed_by().map(|id| *id.as_uuid()),
            reviewed_at: request.reviewed_at(),
            created_at: request.created_at(),
        }
    }
}

/// One assignment period in a priest's history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntryResponse {
    pub id: Uuid,
    pub priest_id: Uuid,
    pub parish_id: Uuid,
    pub start_date: DateTime<Utc>,
    pub end_date: Option<DateTime<Utc>>,
    pub active: bool,
}

impl From<&PriestParishHistory> for HistoryEntryResponse {
    fn from(entry: &PriestParishHistory) -> Self {
        Self {
            id: entry.id(),
            priest_id: *entry.priest_id().as_uuid(),
            parish_id: entry.parish_id(),
            start_date: entry.start_date(),
            end_date: entry.end_date(),
            active: entry.is_active(),
        }
    }
}

#[derive(Debug, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreatePriestRequestRequest {
    pub parish_id: Uuid,
    /// Up to 1000 characters.
    pub message: Option<String>,
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct PriestRequestListQuery {
    /// `pending`, `accepted` or `rejected`.
    pub status: Option<String>,
}

/// Ask to join a parish. Priests only.
#[utoipa::path(
    post,
    path = "/api/v1/priest-requests",
    request_body = CreatePriestRequestRequest,
    responses(
        (status = 201, description = "Request filed", body = PriestRequestResponse),
        (status = 400, description = "Invalid request", body = Error),
        (status = 401, description = "Unauthorised", body = Error),
        (status = 403, description = "Forbidden", body = Error),
        (status = 404, description = "Parish not found", body = Error),
        (status = 409, description = "A pending request already exists", body = Error)
    ),
    tags = ["priest-requests"],
    operation_id = "createPriestRequest"
)]
#[post("/priest-requests")]
pub async fn create_priest_request(
    state: web::Data<HttpState>,
    Authenticated(actor): Authenticated,
    payload: web::Json<CreatePriestRequestRequest>,
) -> ApiResult<HttpResponse> {
    let CreatePriestRequestRequest { parish_id, message } = payload.into_inner();
    let request = state
        .priest_requests
        .create(&actor, parish_id, message)
        .await?;
    Ok(HttpResponse::Created().json(PriestRequestResponse::from(&request)))
}

/// Requests the caller may see or review.
#[utoipa::path(
    get,
    path = "/api/v1/priest-requests",
    params(PriestRequestListQuery),
    responses(
        (status = 200, description = "Requests", body = [PriestRequestResponse]),
        (status = 400, description = "Invalid request", body = Error),
        (status = 401, description = "Unauthorised", body = Error),
        (status = 403, description = "Forbidden", body = Error)
    ),
    tags = ["priest-requests"],
    operation_id = "listPriestRequests"
)]
#[get("/priest-requests")]
pub async fn list_priest_requests(
    state: web::Data<HttpState>,
    Authenticated(actor): Authenticated,
    query: web::Query<PriestRequestListQuery>,
) -> ApiResult<web::Json<Vec<PriestRequestResponse>>> {
    let status =
        parse_optional_enum::<RequestStatus>(query.status.as_deref(), FieldName::new("status"))?;
    let requests = state.priest_requests.list(&actor, status).await?;
    Ok(web::Json(
        requests.iter().map(PriestRequestResponse::from).collect(),
    ))
}

/// Accept a pending request and move the priest to the parish.
#[utoipa::path(
    post,
    path = "/api/v1/priest-requests/{id}/accept",
    params(("id" = Uuid, Path, description = "Request identifier")),
    responses(
        (status = 200, description = "Accepted request", body = PriestRequestResponse),
        (status = 401, description = "Unauthorised", body = Error),
        (status = 403, description = "Forbidden", body = Error),
        (status = 404, description = "Not found", body = Error),
        (status = 409, description = "Already reviewed", body = Error)
    ),
    tags = ["priest-requests"],
    operation_id = "acceptPriestRequest"
)]
#[post("/priest-requests/{id}/accept")]
pub async fn accept_priest_request(
    state: web::Data<HttpState>,
    Authenticated(actor): Authenticated,
    path: web::Path<Uuid>,
) -> ApiResult<web::Json<PriestRequestResponse>> {
    let request = state
        .priest_requests
        .accept(&actor, path.into_inner())
        .await?;
    Ok(web::Json(PriestRequestResponse::from(&request)))
}

#[utoipa::path(
    post,
    path = "/api/v1/priest-requests/{id}/reject",
    params(("id" = Uuid, Path, description = "Request identifier")),
    responses(
        (status = 200, description = "Rejected request", body = PriestRequestResponse),
        (status = 401, description = "Unauthorised", body = Error),
        (status = 403, description = "Forbidden", body = Error),
        (status = 404, description = "Not found", body = Error),
        (status = 409, description = "Already reviewed", body = Error)
    ),
    tags = ["priest-requests"],
    operation_id = "rejectPriestRequest"
)]
#[post("/priest-requests/{id}/reject")]
pub async fn reject_priest_request(
    state: web::Data<HttpState>,
    Authenticated(actor): Authenticated,
    path: web::Path<Uuid>,
) -> ApiResult<web::Json<PriestRequestResponse>> {
    let request = state
        .priest_requests
        .reject(&actor, path.into_inner())
        .await?;
    Ok(web::Json(PriestRequestResponse::from(&request)))
}

/// A priest's assignments, newest first.
#[utoipa::path(
    get,
    path = "/api/v1/priests/{id}/history",
    params(("id" = Uuid, Path, description = "Priest user identifier")),
    responses(
        (status = 200, description = "Assignment history", body = [HistoryEntryResponse]),
        (status = 401, description = "Unauthorised", body = Error),
        (status = 403, description = "Forbidden", body = Error),
        (status = 404, description = "Not found", body = Error)
    ),
    tags = ["priest-requests"],
    operation_id = "priestHistory"
)]
#[get("/priests/{id}/history")]
pub async fn priest_history(
    state: web::Data<HttpState>,
    Authenticated(actor): Authenticated,
    path: web::Path<Uuid>,
) -> ApiResult<web::Json<Vec<HistoryEntryResponse>>> {
    let history = state
        .priest_requests
        .history(&actor, UserId::from_uuid(path.into_inner()))
        .await?;
    Ok(web::Json(history.iter().map(HistoryEntryResponse::from).collect()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::test_support::{UserBuilder, fixed_now};
    use crate::domain::{PriestParishRequestDraft, UserRole};
    use crate::inbound::http::test_utils::{MockServices, bearer_for, detail_code, test_app};
    use actix_web::http::StatusCode;
    use actix_web::test;
    use serde_json::{Value, json};

    fn request_for(priest_id: UserId, parish_id: Uuid, status: RequestStatus) -> PriestParishRequest {
        PriestParishRequest::new(PriestParishRequestDraft {
            id: Uuid::new_v4(),
            priest_id,
            parish_id,
            message: Some("I would like to serve at San Damiano".to_owned()),
            status,
            reviewed_by: None,
            reviewed_at: None,
            created_at: fixed_now(),
        })
        .expect("valid request")
    }

    #[actix_web::test]
    async fn create_files_request_for_parish() {
        let priest = UserBuilder::new(UserRole::Priest).build();
        let parish_id = Uuid::new_v4();
        let request = request_for(priest.id(), parish_id, RequestStatus::Pending);
        let mut services = MockServices::default();
        services
            .priest_requests
            .expect_create()
            .withf(move |_, parish, message| *parish == parish_id && message.is_some())
            .return_once(move |_, _, _| Ok(request));
        let app = test::init_service(test_app(services)).await;

        let response = test::call_service(
            &app,
            test::TestRequest::post()
                .uri("/api/v1/priest-requests")
                .insert_header(bearer_for(&priest))
                .set_json(json!({
                    "parishId": parish_id,
                    "message": "I would like to serve at San Damiano"
                }))
                .to_request(),
        )
        .await;
        assert_eq!(response.status(), StatusCode::CREATED);
        let body: Value = test::read_body_json(response).await;
        assert_eq!(body["status"], "pending");
        assert_eq!(body["priestId"], priest.id().to_string());
    }

    #[actix_web::test]
    async fn duplicate_pending_request_is_conflict() {
        let priest = UserBuilder::new(UserRole::Priest).build();
        let mut services = MockServices::default();
        services
            .priest_requests
            .expect_create()
            .return_once(|_, _, _| Err(Error::conflict("a pending request already exists")));
        let app = test::init_service(test_app(services)).await;

        let response = test::call_service(
            &app,
            test::TestRequest::post()
                .uri("/api/v1/priest-requests")
                .insert_header(bearer_for(&priest))
                .set_json(json!({"parishId": Uuid::new_v4()}))
                .to_request(),
        )
        .await;
        assert_eq!(response.status(), StatusCode::CONFLICT);
    }

    #[actix_web::test]
    async fn list_parses_status_filter() {
        let staff = UserBuilder::new(UserRole::ParishStaff).build();
        let mut services = MockServices::default();
        services
            .priest_requests
            .expect_list()
            .withf(|_, status| *status == Some(RequestStatus::Pending))
            .return_once(|_, _| Ok(Vec::new()));
        let app = test::init_service(test_app(services)).await;

        let response = test::call_service(
            &app,
            test::TestRequest::get()
                .uri("/api/v1/priest-requests?status=pending")
                .insert_header(bearer_for(&staff))
                .to_request(),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[actix_web::test]
    async fn list_rejects_unknown_status() {
        let staff = UserBuilder::new(UserRole::ParishStaff).build();
        let mut services = MockServices::default();
        services.priest_requests.expect_list().times(0);
        let app = test::init_service(test_app(services)).await;

        let response = test::call_service(
            &app,
            test::TestRequest::get()
                .uri("/api/v1/priest-requests?status=approved")
                .insert_header(bearer_for(&staff))
                .to_request(),
        )
        .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body: Value = test::read_body_json(response).await;
        assert_eq!(detail_code(&body), Some("invalid_value"));
    }

    #[actix_web::test]
    async fn accept_returns_reviewed_request() {
        let staff = UserBuilder::new(UserRole::ParishStaff).build();
        let pending = request_for(UserId::random(), Uuid::new_v4(), RequestStatus::Pending);
        let request_id = pending.id();
        let accepted = pending
            .reviewed(RequestStatus::Accepted, staff.id(), fixed_now())
            .expect("pending request");
        let mut services = MockServices::default();
        services
            .priest_requests
            .expect_accept()
            .withf(move |_, id| *id == request_id)
            .return_once(move |_, _| Ok(accepted));
        let app = test::init_service(test_app(services)).await;

        let response = test::call_service(
            &app,
            test::TestRequest::post()
                .uri(&format!("/api/v1/priest-requests/{request_id}/accept"))
                .insert_header(bearer_for(&staff))
                .to_request(),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);
        let body: Value = test::read_body_json(response).await;
        assert_eq!(body["status"], "accepted");
        assert_eq!(body["reviewedBy"], staff.id().to_string());
    }

    #[actix_web::test]
    async fn history_lists_assignments() {
        let bishop = UserBuilder::new(UserRole::Bishop).build();
        let priest_id = UserId::random();
        let entry = PriestParishHistory::open(priest_id, Uuid::new_v4(), fixed_now());
        let mut services = MockServices::default();
        services
            .priest_requests
            .expect_history()
            .withf(move |_, id| *id == priest_id)
            .return_once(move |_, _| Ok(vec![entry]));
        let app = test::init_service(test_app(services)).await;

        let response = test::call_service(
            &app,
            test::TestRequest::get()
                .uri(&format!("/api/v1/priests/{priest_id}/history"))
                .insert_header(bearer_for(&bishop))
                .to_request(),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);
        let body: Value = test::read_body_json(response).await;
        assert_eq!(body[0]["active"], true);
        assert_eq!(body[0]["endDate"], Value::Null);
    }
}
