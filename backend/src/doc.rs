//! OpenAPI documentation configuration.
//!
//! [`ApiDoc`] collects every `/api/v1` path, the health probes and the
//! request/response schemas they reference. Operations require the
//! `BearerAuth` scheme unless they opt out with `security([])`.
//!
//! Swagger UI serves the document in debug builds; `openapi-dump` prints it.

use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::domain::{Error, ErrorCode};

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi
            .components
            .get_or_insert_with(utoipa::openapi::Components::default);

        components.add_security_scheme(
            "BearerAuth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .description(Some(
                        "HS256 token returned by /api/v1/auth/login and both registration routes.",
                    ))
                    .build(),
            ),
        );
    }
}

/// OpenAPI document for the ConfesApp REST API.
#[derive(OpenApi)]
#[openapi(
    modifiers(&SecurityAddon),
    info(
        title = "ConfesApp API",
        description = "Confession scheduling for dioceses, parishes, priests and the faithful."
    ),
    servers(
        (url = "/", description = "Relative to the deployment base URL")
    ),
    security(("BearerAuth" = [])),
    paths(
        crate::inbound::http::accounts::register,
        crate::inbound::http::accounts::login,
        crate::inbound::http::accounts::current_user,
        crate::inbound::http::users::list_users,
        crate::inbound::http::users::get_user,
        crate::inbound::http::users::update_user,
        crate::inbound::http::users::change_role,
        crate::inbound::http::users::deactivate_user,
        crate::inbound::http::dioceses::list_dioceses,
        crate::inbound::http::dioceses::create_diocese,
        crate::inbound::http::dioceses::get_diocese,
        crate::inbound::http::dioceses::update_diocese,
        crate::inbound::http::dioceses::delete_diocese,
        crate::inbound::http::parishes::list_parishes,
        crate::inbound::http::parishes::create_parish,
        crate::inbound::http::parishes::get_parish,
        crate::inbound::http::parishes::update_parish,
        crate::inbound::http::parishes::delete_parish,
        crate::inbound::http::invites::list_invites,
        crate::inbound::http::invites::create_invite,
        crate::inbound::http::invites::inspect_invite,
        crate::inbound::http::invites::accept_invite,
        crate::inbound::http::invites::register_with_invite,
        crate::inbound::http::invites::revoke_invite,
        crate::inbound::http::priest_requests::list_priest_requests,
        crate::inbound::http::priest_requests::create_priest_request,
        crate::inbound::http::priest_requests::accept_priest_request,
        crate::inbound::http::priest_requests::reject_priest_request,
        crate::inbound::http::priest_requests::priest_history,
        crate::inbound::http::slots::list_slots,
        crate::inbound::http::slots::create_slot,
        crate::inbound::http::slots::get_slot,
        crate::inbound::http::slots::update_slot,
        crate::inbound::http::slots::delete_slot,
        crate::inbound::http::bands::list_bands,
        crate::inbound::http::bands::create_bands,
        crate::inbound::http::bands::get_band,
        crate::inbound::http::bands::update_capacity,
        crate::inbound::http::bands::cancel_band,
        crate::inbound::http::confessions::book_confession,
        crate::inbound::http::confessions::list_mine,
        crate::inbound::http::confessions::list_for_priest,
        crate::inbound::http::confessions::get_confession,
        crate::inbound::http::confessions::cancel_confession,
        crate::inbound::http::confessions::complete_confession,
        crate::inbound::http::health::ready,
        crate::inbound::http::health::live,
    ),
    components(schemas(Error, ErrorCode)),
    tags(
        (name = "auth", description = "Registration and login"),
        (name = "users", description = "Accounts and roles"),
        (name = "dioceses", description = "Diocese directory"),
        (name = "parishes", description = "Parish directory"),
        (name = "invites", description = "Role invitations"),
        (name = "priest-requests", description = "Priest parish assignment requests"),
        (name = "confession-slots", description = "Single-booking windows"),
        (name = "confession-bands", description = "Multi-booking windows and series"),
        (name = "confessions", description = "Bookings"),
        (name = "health", description = "Endpoints for health checks")
    )
)]
pub struct ApiDoc;
