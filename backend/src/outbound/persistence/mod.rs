//! PostgreSQL adapters for the driven ports, built on Diesel.
//!
//! Row structs (`models`) and table definitions (`schema`) stay private to
//! this module; repositories translate them to domain entities and map
//! Diesel failures onto each port's error enum. Connections come from a
//! `bb8` pool through `diesel-async`.
//!
//! ```ignore
//! use confesapp::outbound::persistence::{DbPool, DieselUserRepository, PoolConfig};
//!
//! let pool = DbPool::new(PoolConfig::new("postgres://localhost/confesapp")).await?;
//! let users = DieselUserRepository::new(pool);
//! ```

pub(crate) mod diesel_helpers;
mod diesel_confession_band_repository;
mod diesel_confession_repository;
mod diesel_confession_slot_repository;
mod diesel_diocese_repository;
mod diesel_invite_repository;
mod diesel_parish_repository;
mod diesel_priest_request_repository;
mod diesel_user_repository;
mod migrations;
mod models;
mod pool;
mod readiness_probe;
mod schema;

pub use diesel_confession_band_repository::DieselConfessionBandRepository;
pub use diesel_confession_repository::DieselConfessionRepository;
pub use diesel_confession_slot_repository::DieselConfessionSlotRepository;
pub use diesel_diocese_repository::DieselDioceseRepository;
pub use diesel_invite_repository::DieselInviteRepository;
pub use diesel_parish_repository::DieselParishRepository;
pub use diesel_priest_request_repository::DieselPriestRequestRepository;
pub use diesel_user_repository::DieselUserRepository;
pub use migrations::{MigrationError, run_migrations};
pub use pool::{DbPool, PoolConfig, PoolError};
pub use readiness_probe::DieselReadinessProbe;
