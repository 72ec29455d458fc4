//! Outbound adapters implementing the driven ports.
//!
//! - **persistence**: PostgreSQL repositories on Diesel, plus migrations and
//!   the readiness probe
//! - **security**: Argon2 password hashing
//!
//! Adapters translate between domain types and their infrastructure
//! representation. They hold no business rules.

pub mod persistence;
pub mod security;
