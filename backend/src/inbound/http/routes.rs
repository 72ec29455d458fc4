//! Mounts every `/api/v1` handler.
//!
//! Literal segments (`/users/me`, `/confessions/mine`, `/confessions/priest`)
//! are registered before the `{id}` routes they would otherwise match.

use actix_web::web;

use super::{
    accounts, bands, confessions, dioceses, invites, parishes, priest_requests, slots, users,
};

/// Register the API services on a scope or app.
///
/// # Examples
/// ```no_run
/// use actix_web::{App, web};
/// use confesapp::inbound::http::routes::configure_api;
///
/// let _app = App::new().service(web::scope("/api/v1").configure(configure_api));
/// ```
pub fn configure_api(cfg: &mut web::ServiceConfig) {
    cfg.service(accounts::register)
        .service(accounts::login)
        .service(accounts::current_user)
        .service(users::list_users)
        .service(users::get_user)
        .service(users::update_user)
        .service(users::change_role)
        .service(users::deactivate_user)
        .service(dioceses::list_dioceses)
        .service(dioceses::create_diocese)
        .service(dioceses::get_diocese)
        .service(dioceses::update_diocese)
        .service(dioceses::delete_diocese)
        .service(parishes::list_parishes)
        .service(parishes::create_parish)
        .service(parishes::get_parish)
        .service(parishes::update_parish)
        .service(parishes::delete_parish)
        .service(invites::list_invites)
        .service(invites::create_invite)
        .service(invites::inspect_invite)
        .service(invites::accept_invite)
        .service(invites::register_with_invite)
        .service(invites::revoke_invite)
        .service(priest_requests::list_priest_requests)
        .service(priest_requests::create_priest_request)
        .service(priest_requests::accept_priest_request)
        .service(priest_requests::reject_priest_request)
        .service(priest_requests::priest_history)
        .service(slots::list_slots)
        .service(slots::create_slot)
        .service(slots::get_slot)
        .service(slots::update_slot)
        .service(slots::delete_slot)
        .service(bands::list_bands)
        .service(bands::create_bands)
        .service(bands::get_band)
        .service(bands::update_capacity)
        .service(bands::cancel_band)
        .service(confessions::book_confession)
        .service(confessions::list_mine)
        .service(confessions::list_for_priest)
        .service(confessions::get_confession)
        .service(confessions::cancel_confession)
        .service(confessions::complete_confession);
}
