//! Build the HTTP state from PostgreSQL repositories and the domain services.

use std::sync::Arc;

use mockable::Clock;

use crate::domain::ports::PasswordHasher;
use crate::domain::{
    AccountServiceImpl, ConfessionBandsServiceImpl, ConfessionSlotsServiceImpl,
    ConfessionsServiceImpl, DiocesesServiceImpl, InvitesServiceImpl, ParishesServiceImpl,
    PriestRequestsServiceImpl, UsersServiceImpl,
};
use crate::inbound::http::state::HttpState;
use crate::outbound::persistence::{
    DbPool, DieselConfessionBandRepository, DieselConfessionRepository,
    DieselConfessionSlotRepository, DieselDioceseRepository, DieselInviteRepository,
    DieselParishRepository, DieselPriestRequestRepository, DieselUserRepository,
};

/// One repository instance per port, shared by every service that reads it.
struct Repositories {
    users: Arc<DieselUserRepository>,
    dioceses: Arc<DieselDioceseRepository>,
    parishes: Arc<DieselParishRepository>,
    invites: Arc<DieselInviteRepository>,
    requests: Arc<DieselPriestRequestRepository>,
    slots: Arc<DieselConfessionSlotRepository>,
    bands: Arc<DieselConfessionBandRepository>,
    confessions: Arc<DieselConfessionRepository>,
}

impl Repositories {
    fn new(pool: &DbPool) -> Self {
        Self {
            users: Arc::new(DieselUserRepository::new(pool.clone())),
            dioceses: Arc::new(DieselDioceseRepository::new(pool.clone())),
            parishes: Arc::new(DieselParishRepository::new(pool.clone())),
            invites: Arc::new(DieselInviteRepository::new(pool.clone())),
            requests: Arc::new(DieselPriestRequestRepository::new(pool.clone())),
            slots: Arc::new(DieselConfessionSlotRepository::new(pool.clone())),
            bands: Arc::new(DieselConfessionBandRepository::new(pool.clone())),
            confessions: Arc::new(DieselConfessionRepository::new(pool.clone())),
        }
    }
}

/// Wire every driving port onto its Diesel-backed service.
pub(crate) fn build_http_state(
    pool: &DbPool,
    hasher: Arc<dyn PasswordHasher>,
    clock: Arc<dyn Clock>,
) -> HttpState {
    let repos = Repositories::new(pool);
    HttpState {
        accounts: Arc::new(AccountServiceImpl::new(
            repos.users.clone(),
            hasher.clone(),
            clock.clone(),
        )),
        users: Arc::new(UsersServiceImpl::new(
            repos.users.clone(),
            repos.parishes.clone(),
            repos.dioceses.clone(),
            clock.clone(),
        )),
        dioceses: Arc::new(DiocesesServiceImpl::new(
            repos.dioceses.clone(),
            repos.parishes.clone(),
            repos.users.clone(),
            clock.clone(),
        )),
        parishes: Arc::new(ParishesServiceImpl::new(
            repos.parishes.clone(),
            repos.dioceses.clone(),
            repos.users.clone(),
            clock.clone(),
        )),
        invites: Arc::new(InvitesServiceImpl::new(
            repos.invites,
            repos.users.clone(),
            repos.parishes.clone(),
            repos.dioceses,
            hasher,
            clock.clone(),
        )),
        priest_requests: Arc::new(PriestRequestsServiceImpl::new(
            repos.requests,
            repos.users.clone(),
            repos.parishes,
            clock.clone(),
        )),
        slots: Arc::new(ConfessionSlotsServiceImpl::new(
            repos.slots,
            repos.users.clone(),
            clock.clone(),
        )),
        bands: Arc::new(ConfessionBandsServiceImpl::new(
            repos.bands,
            repos.users.clone(),
            clock.clone(),
        )),
        confessions: Arc::new(ConfessionsServiceImpl::new(
            repos.confessions,
            repos.users,
            clock,
        )),
    }
}
