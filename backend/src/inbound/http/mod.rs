//! HTTP inbound adapter exposing the `/api/v1` REST endpoints.

pub mod accounts;
pub mod auth;
pub mod bands;
pub mod confessions;
pub mod dioceses;
pub mod error;
pub mod health;
pub mod invites;
pub mod parishes;
pub mod priest_requests;
pub mod routes;
pub mod schemas;
pub mod slots;
pub mod state;
#[cfg(test)]
pub mod test_utils;
pub mod token_config;
pub mod users;
pub mod validation;

pub use error::ApiResult;
