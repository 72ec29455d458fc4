//! Shared harness for HTTP integration tests.
//!
//! Real domain services and HTTP handlers run over in-memory repositories so
//! flows can be driven end to end without PostgreSQL.

pub mod in_memory;

use std::sync::Arc;

use actix_web::dev::{ServiceFactory, ServiceRequest, ServiceResponse};
use actix_web::{App, web};
use chrono::{DateTime, Duration, TimeZone, Utc};
use confesapp::Trace;
use confesapp::domain::ports::PasswordHasher;
use confesapp::domain::{
    AccountServiceImpl, ConfessionBandsServiceImpl, ConfessionSlotsServiceImpl,
    ConfessionsServiceImpl, DiocesesServiceImpl, InvitesServiceImpl, ParishesServiceImpl,
    PriestRequestsServiceImpl, UsersServiceImpl,
};
use confesapp::inbound::http::auth::TokenCodec;
use confesapp::inbound::http::error::configure_extractors;
use confesapp::inbound::http::routes::configure_api;
use confesapp::inbound::http::state::HttpState;
use confesapp::inbound::http::token_config::TokenKey;
use confesapp::outbound::security::Argon2PasswordHasher;

use in_memory::{InMemoryStore, SharedClock, Unplugged};

/// Wednesday 1 April 2026, 10:00 UTC.
pub fn start_of_test() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 4, 1, 10, 0, 0)
        .single()
        .expect("valid timestamp")
}

/// Everything a flow test needs to reach behind the HTTP surface.
pub struct Harness {
    pub store: InMemoryStore,
    pub clock: SharedClock,
    pub hasher: Arc<Argon2PasswordHasher>,
    state: HttpState,
    codec: web::Data<TokenCodec>,
}

impl Harness {
    pub fn new() -> Self {
        let store = InMemoryStore::default();
        let clock = SharedClock::at(start_of_test());
        let hasher = Arc::new(Argon2PasswordHasher::new());
        let dyn_hasher: Arc<dyn PasswordHasher> = hasher.clone();
        let dyn_clock: Arc<dyn mockable::Clock> = Arc::new(clock.clone());
        let repo = Arc::new(store.clone());
        let unplugged = Arc::new(Unplugged);

        let state = HttpState {
            accounts: Arc::new(AccountServiceImpl::new(
                repo.clone(),
                dyn_hasher.clone(),
                dyn_clock.clone(),
            )),
            users: Arc::new(UsersServiceImpl::new(
                repo.clone(),
                unplugged.clone(),
                unplugged.clone(),
                dyn_clock.clone(),
            )),
            dioceses: Arc::new(DiocesesServiceImpl::new(
                unplugged.clone(),
                unplugged.clone(),
                repo.clone(),
                dyn_clock.clone(),
            )),
            parishes: Arc::new(ParishesServiceImpl::new(
                unplugged.clone(),
                unplugged.clone(),
                repo.clone(),
                dyn_clock.clone(),
            )),
            invites: Arc::new(InvitesServiceImpl::new(
                unplugged.clone(),
                repo.clone(),
                unplugged.clone(),
                unplugged.clone(),
                dyn_hasher,
                dyn_clock.clone(),
            )),
            priest_requests: Arc::new(PriestRequestsServiceImpl::new(
                unplugged.clone(),
                repo.clone(),
                unplugged,
                dyn_clock.clone(),
            )),
            slots: Arc::new(ConfessionSlotsServiceImpl::new(
                repo.clone(),
                repo.clone(),
                dyn_clock.clone(),
            )),
            bands: Arc::new(ConfessionBandsServiceImpl::new(
                repo.clone(),
                repo.clone(),
                dyn_clock.clone(),
            )),
            confessions: Arc::new(ConfessionsServiceImpl::new(
                repo.clone(),
                repo,
                dyn_clock.clone(),
            )),
        };
        let codec = web::Data::new(TokenCodec::new(
            &TokenKey::from_bytes(b"booking-flow-integration-signing-key".to_vec()),
            Duration::hours(12),
            dyn_clock,
        ));

        Self {
            store,
            clock,
            hasher,
            state,
            codec,
        }
    }

    /// The full `/api/v1` surface, wired the way the server wires it.
    pub fn app(
        &self,
    ) -> App<
        impl ServiceFactory<
            ServiceRequest,
            Config = (),
            Response = ServiceResponse,
            Error = actix_web::Error,
            InitError = (),
        > + use<>,
    > {
        App::new()
            .app_data(web::Data::new(self.state.clone()))
            .app_data(self.codec.clone())
            .configure(configure_extractors)
            .wrap(Trace)
            .service(web::scope("/api/v1").configure(configure_api))
    }
}
