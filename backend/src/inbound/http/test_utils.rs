//! Test helpers for inbound HTTP components.

use std::sync::Arc;

use actix_web::dev::{ServiceFactory, ServiceRequest, ServiceResponse};
use actix_web::http::header::AUTHORIZATION;
use actix_web::{App, web};
use chrono::Duration;
use serde_json::Value;

use crate::domain::User;
use crate::domain::ports::{
    MockAccountService, MockConfessionBandsService, MockConfessionSlotsService,
    MockConfessionsService, MockDiocesesService, MockInvitesService, MockParishesService,
    MockPriestRequestsService, MockUsersService,
};
use crate::domain::test_support::FixtureClock;

use super::auth::TokenCodec;
use super::error::configure_extractors;
use super::routes::configure_api;
use super::state::HttpState;
use super::token_config::TokenKey;

/// One mock per driving port. Unset expectations panic when called.
#[derive(Default)]
pub struct MockServices {
    pub accounts: MockAccountService,
    pub users: MockUsersService,
    pub dioceses: MockDiocesesService,
    pub parishes: MockParishesService,
    pub invites: MockInvitesService,
    pub priest_requests: MockPriestRequestsService,
    pub slots: MockConfessionSlotsService,
    pub bands: MockConfessionBandsService,
    pub confessions: MockConfessionsService,
}

impl MockServices {
    pub fn into_state(self) -> HttpState {
        HttpState {
            accounts: Arc::new(self.accounts),
            users: Arc::new(self.users),
            dioceses: Arc::new(self.dioceses),
            parishes: Arc::new(self.parishes),
            invites: Arc::new(self.invites),
            priest_requests: Arc::new(self.priest_requests),
            slots: Arc::new(self.slots),
            bands: Arc::new(self.bands),
            confessions: Arc::new(self.confessions),
        }
    }
}

/// Codec with a fixed key and the fixture clock.
pub fn test_codec() -> TokenCodec {
    TokenCodec::new(
        &TokenKey::from_bytes(b"handler-tests-signing-key".to_vec()),
        Duration::minutes(30),
        Arc::new(FixtureClock::default()),
    )
}

/// `Authorization` header carrying a token for `user`.
pub fn bearer_for(user: &User) -> (actix_web::http::header::HeaderName, String) {
    let issued = test_codec().issue(user).expect("token issued");
    (AUTHORIZATION, format!("Bearer {}", issued.token))
}

/// App with the full API mounted over mock services.
pub fn test_app(
    services: MockServices,
) -> App<
    impl ServiceFactory<
        ServiceRequest,
        Config = (),
        Response = ServiceResponse,
        Error = actix_web::Error,
        InitError = (),
    >,
> {
    App::new()
        .app_data(web::Data::new(services.into_state()))
        .app_data(web::Data::new(test_codec()))
        .configure(configure_extractors)
        .service(web::scope("/api/v1").configure(configure_api))
}

/// `details.code` of an error body.
pub fn detail_code(body: &Value) -> Option<&str> {
    body.get("details")?.get("code")?.as_str()
}
