//! Registration, login and the caller's own profile.
//!
//! ```text
//! POST /api/v1/auth/register {"email":"ana@example.org","password":"...","firstName":"Ana","lastName":"Rossi"}
//! POST /api/v1/auth/login {"email":"ana@example.org","password":"..."}
//! GET /api/v1/users/me
//! ```

use actix_web::{HttpResponse, get, post, web};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::info;

use crate::domain::ports::Registration;
use crate::domain::{CredentialsValidationError, Error, LoginCredentials};
use crate::inbound::http::ApiResult;
use crate::inbound::http::auth::{Authenticated, TokenCodec};
use crate::inbound::http::schemas::{AuthResponse, UserResponse};
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::{parse_email, parse_name, parse_new_password, parse_phone};

/// Self-registration body. New accounts are `faithful`.
#[derive(Debug, Deserialize, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    pub first_name: String,
    pub last_name: String,
    #[serde(default)]
    pub phone: Option<String>,
}

impl TryFrom<RegisterRequest> for Registration {
    type Error = Error;

    fn try_from(value: RegisterRequest) -> Result<Self, Self::Error> {
        Ok(Self {
            email: parse_email(&value.email)?,
            password: parse_new_password(&value.password)?,
            first_name: parse_name(&value.first_name, "firstName")?,
            last_name: parse_name(&value.last_name, "lastName")?,
            phone: parse_phone(value.phone.as_deref())?,
        })
    }
}

/// Login body.
#[derive(Debug, Deserialize, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

impl TryFrom<LoginRequest> for LoginCredentials {
    type Error = CredentialsValidationError;

    fn try_from(value: LoginRequest) -> Result<Self, Self::Error> {
        Self::try_from_parts(&value.email, &value.password)
    }
}

fn map_login_validation_error(err: CredentialsValidationError) -> Error {
    let (field, code) = match err {
        CredentialsValidationError::InvalidEmail => ("email", "invalid_email"),
        _ => ("password", "empty_password"),
    };
    Error::invalid_request(err.to_string()).with_details(json!({ "field": field, "code": code }))
}

/// Create a faithful account and sign it in.
#[utoipa::path(
    post,
    path = "/api/v1/auth/register",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "Account created", body = AuthResponse),
        (status = 400, description = "Invalid request", body = Error),
        (status = 409, description = "Email already registered", body = Error),
        (status = 500, description = "Internal server error", body = Error)
    ),
    tags = ["auth"],
    operation_id = "register",
    security([])
)]
#[post("/auth/register")]
pub async fn register(
    state: web::Data<HttpState>,
    tokens: web::Data<TokenCodec>,
    payload: web::Json<RegisterRequest>,
) -> ApiResult<HttpResponse> {
    let registration = Registration::try_from(payload.into_inner())?;
    let user = state.accounts.register(registration).await?;
    let issued = tokens.issue(&user)?;
    Ok(HttpResponse::Created().json(AuthResponse::new(issued, &user)))
}

/// Verify credentials and return a bearer token.
///
/// Unknown email, wrong password and deactivated accounts all produce the
/// same `401` so the endpoint does not reveal which accounts exist.
#[utoipa::path(
    post,
    path = "/api/v1/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login success", body = AuthResponse),
        (status = 400, description = "Invalid request", body = Error),
        (status = 401, description = "Invalid credentials", body = Error),
        (status = 500, description = "Internal server error", body = Error)
    ),
    tags = ["auth"],
    operation_id = "login",
    security([])
)]
#[post("/auth/login")]
pub async fn login(
    state: web::Data<HttpState>,
    tokens: web::Data<TokenCodec>,
    payload: web::Json<LoginRequest>,
) -> ApiResult<web::Json<AuthResponse>> {
    let credentials =
        LoginCredentials::try_from(payload.into_inner()).map_err(map_login_validation_error)?;
    let user = state.accounts.login(&credentials).await?;
    let issued = tokens.issue(&user)?;
    info!(user_id = %user.id(), "issued bearer token");
    Ok(web::Json(AuthResponse::new(issued, &user)))
}

/// Return the authenticated caller's profile.
#[utoipa::path(
    get,
    path = "/api/v1/users/me",
    responses(
        (status = 200, description = "Current user", body = UserResponse),
        (status = 401, description = "Unauthorised", body = Error),
        (status = 500, description = "Internal server error", body = Error)
    ),
    tags = ["users"],
    operation_id = "currentUser"
)]
#[get("/users/me")]
pub async fn current_user(
    state: web::Data<HttpState>,
    Authenticated(actor): Authenticated,
) -> ApiResult<web::Json<UserResponse>> {
    let user = state.accounts.current_user(&actor).await?;
    Ok(web::Json(UserResponse::from(&user)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::test_support::UserBuilder;
    use crate::domain::{ErrorCode, UserRole};
    use crate::inbound::http::test_utils::{MockServices, bearer_for, detail_code, test_app};
    use actix_web::http::StatusCode;
    use actix_web::test;
    use rstest::rstest;
    use serde_json::{Value, json};

    #[actix_web::test]
    async fn register_returns_token_and_faithful_user() {
        let user = UserBuilder::new(UserRole::Faithful)
            .email("ana@example.org")
            .build();
        let mut services = MockServices::default();
        let created = user.clone();
        services
            .accounts
            .expect_register()
            .withf(|registration| {
                registration.email.as_ref() == "ana@example.org"
                    && registration.phone.as_deref() == Some("+39 075 812 2201")
            })
            .times(1)
            .return_once(move |_| Ok(created));
        let app = test::init_service(test_app(services)).await;

        let response = test::call_service(
            &app,
            test::TestRequest::post()
                .uri("/api/v1/auth/register")
                .set_json(json!({
                    "email": " Ana@Example.org ",
                    "password": "correct horse",
                    "firstName": "Ana",
                    "lastName": "Rossi",
                    "phone": "+39 075 812 2201"
                }))
                .to_request(),
        )
        .await;
        assert_eq!(response.status(), StatusCode::CREATED);
        let body: Value = test::read_body_json(response).await;
        assert!(body["token"].as_str().is_some_and(|token| !token.is_empty()));
        assert_eq!(body["user"]["role"], "faithful");
        assert_eq!(body["user"]["email"], "ana@example.org");
    }

    #[rstest]
    #[case(json!({"email": "nope", "password": "correct horse", "firstName": "A", "lastName": "B"}), "email", "invalid_email")]
    #[case(json!({"email": "a@b.org", "password": "short", "firstName": "A", "lastName": "B"}), "password", "invalid_password")]
    #[case(json!({"email": "a@b.org", "password": "correct horse", "firstName": " ", "lastName": "B"}), "firstName", "invalid_name")]
    #[case(json!({"email": "a@b.org", "password": "correct horse", "firstName": "A", "lastName": "B", "phone": "call me"}), "phone", "invalid_phone")]
    #[actix_web::test]
    async fn register_rejects_invalid_fields(
        #[case] body: Value,
        #[case] field: &str,
        #[case] code: &str,
    ) {
        let mut services = MockServices::default();
        services.accounts.expect_register().times(0);
        let app = test::init_service(test_app(services)).await;

        let response = test::call_service(
            &app,
            test::TestRequest::post()
                .uri("/api/v1/auth/register")
                .set_json(body)
                .to_request(),
        )
        .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body: Value = test::read_body_json(response).await;
        assert_eq!(body["details"]["field"], field);
        assert_eq!(detail_code(&body), Some(code));
    }

    #[actix_web::test]
    async fn register_reports_taken_email_as_conflict() {
        let mut services = MockServices::default();
        services
            .accounts
            .expect_register()
            .return_once(|_| Err(Error::conflict("email ana@example.org is already registered")));
        let app = test::init_service(test_app(services)).await;

        let response = test::call_service(
            &app,
            test::TestRequest::post()
                .uri("/api/v1/auth/register")
                .set_json(json!({
                    "email": "ana@example.org",
                    "password": "correct horse",
                    "firstName": "Ana",
                    "lastName": "Rossi"
                }))
                .to_request(),
        )
        .await;
        assert_eq!(response.status(), StatusCode::CONFLICT);
    }

    #[actix_web::test]
    async fn login_rejects_wrong_credentials_with_unauthorised_status() {
        let mut services = MockServices::default();
        services
            .accounts
            .expect_login()
            .return_once(|_| Err(Error::unauthorized("invalid email or password")));
        let app = test::init_service(test_app(services)).await;

        let response = test::call_service(
            &app,
            test::TestRequest::post()
                .uri("/api/v1/auth/login")
                .set_json(LoginRequest {
                    email: "ana@example.org".into(),
                    password: "wrong-password".into(),
                })
                .to_request(),
        )
        .await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        let body: Value = test::read_body_json(response).await;
        assert_eq!(body["code"], "unauthorized");
    }

    #[actix_web::test]
    async fn login_with_blank_password_is_field_error() {
        let mut services = MockServices::default();
        services.accounts.expect_login().times(0);
        let app = test::init_service(test_app(services)).await;

        let response = test::call_service(
            &app,
            test::TestRequest::post()
                .uri("/api/v1/auth/login")
                .set_json(LoginRequest {
                    email: "ana@example.org".into(),
                    password: String::new(),
                })
                .to_request(),
        )
        .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body: Value = test::read_body_json(response).await;
        assert_eq!(body["details"]["field"], "password");
    }

    #[actix_web::test]
    async fn current_user_requires_bearer_token() {
        let app = test::init_service(test_app(MockServices::default())).await;
        let response = test::call_service(
            &app,
            test::TestRequest::get().uri("/api/v1/users/me").to_request(),
        )
        .await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[actix_web::test]
    async fn current_user_returns_camel_case_profile() {
        let user = UserBuilder::new(UserRole::Priest).build();
        let user_id = user.id();
        let mut services = MockServices::default();
        let returned = user.clone();
        services
            .accounts
            .expect_current_user()
            .withf(move |actor| actor.user_id() == user_id)
            .return_once(move |_| Ok(returned));
        let app = test::init_service(test_app(services)).await;

        let response = test::call_service(
            &app,
            test::TestRequest::get()
                .uri("/api/v1/users/me")
                .insert_header(bearer_for(&user))
                .to_request(),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);
        let body: Value = test::read_body_json(response).await;
        assert_eq!(body["id"], user_id.to_string());
        assert_eq!(body["lastName"], "User");
    }

    #[actix_web::test]
    async fn deactivated_caller_is_unauthorised() {
        let user = UserBuilder::new(UserRole::Faithful).build();
        let mut services = MockServices::default();
        services
            .accounts
            .expect_current_user()
            .return_once(|_| Err(Error::unauthorized("account is inactive")));
        let app = test::init_service(test_app(services)).await;

        let response = test::call_service(
            &app,
            test::TestRequest::get()
                .uri("/api/v1/users/me")
                .insert_header(bearer_for(&user))
                .to_request(),
        )
        .await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        let body: Value = test::read_body_json(response).await;
        assert_eq!(body["code"], serde_json::to_value(ErrorCode::Unauthorized).expect("code"));
    }
}
