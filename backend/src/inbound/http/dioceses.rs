//! Diocese administration endpoints.
//!
//! ```text
//! GET /api/v1/dioceses
//! POST /api/v1/dioceses {"name":"Diocese of Assisi","bishopId":"..."}
//! GET|PATCH|DELETE /api/v1/dioceses/{id}
//! ```

use actix_web::{HttpResponse, delete, get, patch, post, web};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::domain::ports::NewDiocese;
use crate::domain::{Diocese, DioceseChanges, Error, UserId};
use crate::inbound::http::ApiResult;
use crate::inbound::http::auth::Authenticated;
use crate::inbound::http::state::HttpState;

/// Diocese as returned to clients.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DioceseResponse {
    pub id: Uuid,
    #[schema(example = "Diocese of Assisi")]
    pub name: String,
    pub bishop_id: Option<Uuid>,
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&Diocese> for DioceseResponse {
    fn from(diocese: &Diocese) -> Self {
        Self {
            id: diocese.id(),
            name: diocese.name().to_owned(),
            bishop_id: diocese.bishop_id().map(|id| *id.as_uuid()),
            active: diocese.is_active(),
            created_at: diocese.created_at(),
            updated_at: diocese.updated_at(),
        }
    }
}

#[derive(Debug, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateDioceseRequest {
    pub name: String,
    pub bishop_id: Option<Uuid>,
}

#[derive(Debug, Default, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct UpdateDioceseRequest {
    pub name: Option<String>,
    pub bishop_id: Option<Uuid>,
}

/// Create a diocese. Admin only.
#[utoipa::path(
    post,
    path = "/api/v1/dioceses",
    request_body = CreateDioceseRequest,
    responses(
        (status = 201, description = "Diocese created", body = DioceseResponse),
        (status = 400, description = "Invalid request", body = Error),
        (status = 401, description = "Unauthorised", body = Error),
        (status = 403, description = "Forbidden", body = Error)
    ),
    tags = ["dioceses"],
    operation_id = "createDiocese"
)]
#[post("/dioceses")]
pub async fn create_diocese(
    state: web::Data<HttpState>,
    Authenticated(actor): Authenticated,
    payload: web::Json<CreateDioceseRequest>,
) -> ApiResult<HttpResponse> {
    let CreateDioceseRequest { name, bishop_id } = payload.into_inner();
    let diocese = state
        .dioceses
        .create(
            &actor,
            NewDiocese {
                name,
                bishop_id: bishop_id.map(UserId::from_uuid),
            },
        )
        .await?;
    Ok(HttpResponse::Created().json(DioceseResponse::from(&diocese)))
}

/// Active dioceses.
#[utoipa::path(
    get,
    path = "/api/v1/dioceses",
    responses(
        (status = 200, description = "Dioceses", body = [DioceseResponse]),
        (status = 401, description = "Unauthorised", body = Error)
    ),
    tags = ["dioceses"],
    operation_id = "listDioceses"
)]
#[get("/dioceses")]
pub async fn list_dioceses(
    state: web::Data<HttpState>,
    Authenticated(actor): Authenticated,
) -> ApiResult<web::Json<Vec<DioceseResponse>>> {
    let dioceses = state.dioceses.list(&actor).await?;
    Ok(web::Json(dioceses.iter().map(DioceseResponse::from).collect()))
}

#[utoipa::path(
    get,
    path = "/api/v1/dioceses/{id}",
    params(("id" = Uuid, Path, description = "Diocese identifier")),
    responses(
        (status = 200, description = "Diocese", body = DioceseResponse),
        (status = 401, description = "Unauthorised", body = Error),
        (status = 404, description = "Not found", body = Error)
    ),
    tags = ["dioceses"],
    operation_id = "getDiocese"
)]
#[get("/dioceses/{id}")]
pub async fn get_diocese(
    state: web::Data<HttpState>,
    Authenticated(actor): Authenticated,
    path: web::Path<Uuid>,
) -> ApiResult<web::Json<DioceseResponse>> {
    let diocese = state.dioceses.get(&actor, path.into_inner()).await?;
    Ok(web::Json(DioceseResponse::from(&diocese)))
}

/// Rename a diocese or assign its bishop.
#[utoipa::path(
    patch,
    path = "/api/v1/dioceses/{id}",
    params(("id" = Uuid, Path, description = "Diocese identifier")),
    request_body = UpdateDioceseRequest,
    responses(
        (status = 200, description = "Updated diocese", body = DioceseResponse),
        (status = 400, description = "Invalid request", body = Error),
        (status = 401, description = "Unauthorised", body = Error),
        (status = 403, description = "Forbidden", body = Error),
        (status = 404, description = "Not found", body = Error)
    ),
    tags = ["dioceses"],
    operation_id = "updateDiocese"
)]
#[patch("/dioceses/{id}")]
pub async fn update_diocese(
    state: web::Data<HttpState>,
    Authenticated(actor): Authenticated,
    path: web::Path<Uuid>,
    payload: web::Json<UpdateDioceseRequest>,
) -> ApiResult<web::Json<DioceseResponse>> {
    let UpdateDioceseRequest { name, bishop_id } = payload.into_inner();
    let changes = DioceseChanges {
        name,
        bishop_id: bishop_id.map(UserId::from_uuid),
    };
    let diocese = state
        .dioceses
        .update(&actor, path.into_inner(), changes)
        .await?;
    Ok(web::Json(DioceseResponse::from(&diocese)))
}

/// Deactivate a diocese with no active parishes.
#[utoipa::path(
    delete,
    path = "/api/v1/dioceses/{id}",
    params(("id" = Uuid, Path, description = "Diocese identifier")),
    responses(
        (status = 204, description = "Diocese deactivated"),
        (status = 401, description = "Unauthorised", body = Error),
        (status = 403, description = "Forbidden", body = Error),
        (status = 404, description = "Not found", body = Error),
        (status = 409, description = "Diocese still has parishes", body = Error)
    ),
    tags = ["dioceses"],
    operation_id = "deleteDiocese"
)]
#[delete("/dioceses/{id}")]
pub async fn delete_diocese(
    state: web::Data<HttpState>,
    Authenticated(actor): Authenticated,
    path: web::Path<Uuid>,
) -> ApiResult<HttpResponse> {
    state.dioceses.delete(&actor, path.into_inner()).await?;
    Ok(HttpResponse::NoContent().finish())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::UserRole;
    use crate::domain::test_support::{UserBuilder, sample_diocese};
    use crate::inbound::http::test_utils::{MockServices, bearer_for, detail_code, test_app};
    use actix_web::http::StatusCode;
    use actix_web::test;
    use serde_json::{Value, json};

    #[actix_web::test]
    async fn create_returns_created_diocese() {
        let admin = UserBuilder::new(UserRole::Admin).build();
        let bishop = UserId::random();
        let diocese = sample_diocese(Some(bishop));
        let mut services = MockServices::default();
        let created = diocese.clone();
        services
            .dioceses
            .expect_create()
            .withf(move |_, new| new.name == "Diocese of Assisi" && new.bishop_id == Some(bishop))
            .return_once(move |_, _| Ok(created));
        let app = test::init_service(test_app(services)).await;

        let response = test::call_service(
            &app,
            test::TestRequest::post()
                .uri("/api/v1/dioceses")
                .insert_header(bearer_for(&admin))
                .set_json(json!({"name": "Diocese of Assisi", "bishopId": bishop.as_uuid()}))
                .to_request(),
        )
        .await;
        assert_eq!(response.status(), StatusCode::CREATED);
        let body: Value = test::read_body_json(response).await;
        assert_eq!(body["id"], diocese.id().to_string());
        assert_eq!(body["bishopId"], bishop.to_string());
        assert_eq!(body["active"], true);
    }

    #[actix_web::test]
    async fn get_with_malformed_id_is_invalid_path() {
        let admin = UserBuilder::new(UserRole::Admin).build();
        let mut services = MockServices::default();
        services.dioceses.expect_get().times(0);
        let app = test::init_service(test_app(services)).await;

        let response = test::call_service(
            &app,
            test::TestRequest::get()
                .uri("/api/v1/dioceses/assisi")
                .insert_header(bearer_for(&admin))
                .to_request(),
        )
        .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body: Value = test::read_body_json(response).await;
        assert_eq!(detail_code(&body), Some("invalid_path"));
    }

    #[actix_web::test]
    async fn delete_with_parishes_is_conflict() {
        let admin = UserBuilder::new(UserRole::Admin).build();
        let mut services = MockServices::default();
        services
            .dioceses
            .expect_delete()
            .return_once(|_, _| Err(Error::conflict("diocese still has 2 active parishes")));
        let app = test::init_service(test_app(services)).await;

        let response = test::call_service(
            &app,
            test::TestRequest::delete()
                .uri(&format!("/api/v1/dioceses/{}", Uuid::new_v4()))
                .insert_header(bearer_for(&admin))
                .to_request(),
        )
        .await;
        assert_eq!(response.status(), StatusCode::CONFLICT);
    }

    #[actix_web::test]
    async fn list_requires_authentication() {
        let app = test::init_service(test_app(MockServices::default())).await;
        let response = test::call_service(
            &app,
            test::TestRequest::get().uri("/api/v1/dioceses").to_request(),
        )
        .await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }
}
