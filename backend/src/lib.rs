//! ConfesApp backend: confession scheduling for dioceses, parishes, priests
//! and the faithful.
//!
//! The crate follows a hexagonal layout. [`domain`] holds entities, ports
//! and services; [`inbound`] adapts HTTP onto the driving ports; [`outbound`]
//! implements the driven ports on PostgreSQL and Argon2; [`server`] wires
//! them together.

pub mod doc;
pub mod domain;
pub mod inbound;
pub mod middleware;
pub mod outbound;
pub mod server;

/// Public OpenAPI surface used by Swagger UI and tooling.
pub use doc::ApiDoc;
pub use middleware::Trace;
