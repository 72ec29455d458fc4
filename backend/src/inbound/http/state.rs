//! Shared HTTP adapter state.
//!
//! HTTP handlers accept this state via `actix_web::web::Data` so they only
//! depend on domain ports (use-cases) and remain testable without I/O.

use std::sync::Arc;

use crate::domain::ports::{
    AccountService, ConfessionBandsService, ConfessionSlotsService, ConfessionsService,
    DiocesesService, InvitesService, ParishesService, PriestRequestsService, UsersService,
};

/// Dependency bundle for HTTP handlers.
///
/// # Examples
/// ```no_run
/// # use confesapp::inbound::http::state::HttpState;
/// # fn build() -> HttpState { unimplemented!() }
/// let state = build();
/// let _accounts = state.accounts.clone();
/// ```
#[derive(Clone)]
pub struct HttpState {
    pub accounts: Arc<dyn AccountService>,
    pub users: Arc<dyn UsersService>,
    pub dioceses: Arc<dyn DiocesesService>,
    pub parishes: Arc<dyn ParishesService>,
    pub invites: Arc<dyn InvitesService>,
    pub priest_requests: Arc<dyn PriestRequestsService>,
    pub slots: Arc<dyn ConfessionSlotsService>,
    pub bands: Arc<dyn ConfessionBandsService>,
    pub confessions: Arc<dyn ConfessionsService>,
}
