//! Response bodies shared by several handler modules.
//!
//! Domain entities keep their fields private and do not derive `Serialize`.
//! These DTOs are the JSON shape clients see; every field is camelCase.

use std::fmt::Display;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use crate::domain::ports::ScheduleFilter;
use crate::domain::{Error, User, UserId, UserRole};

use super::auth::IssuedToken;
use super::validation::{
    FieldName, parse_optional_enum, parse_optional_rfc3339_timestamp, parse_optional_uuid,
};

/// Public view of a user account. The password hash never leaves the
/// persistence layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    #[schema(example = "3fa85f64-5717-4562-b3fc-2c963f66afa6")]
    pub id: Uuid,
    #[schema(example = "maria@example.org")]
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub phone: Option<String>,
    pub role: UserRole,
    pub diocese_id: Option<Uuid>,
    pub parish_id: Option<Uuid>,
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&User> for UserResponse {
    fn from(user: &User) -> Self {
        Self {
            id: *user.id().as_uuid(),
            email: user.email().to_string(),
            first_name: user.first_name().to_owned(),
            last_name: user.last_name().to_owned(),
            phone: user.phone().map(str::to_owned),
            role: user.role(),
            diocese_id: user.diocese_id(),
            parish_id: user.parish_id(),
            active: user.is_active(),
            created_at: user.created_at(),
            updated_at: user.updated_at(),
        }
    }
}

/// Bearer token returned by login and both registration paths.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AuthResponse {
    /// HS256 JWT for the `Authorization: Bearer` header.
    pub token: String,
    pub expires_at: DateTime<Utc>,
    pub user: UserResponse,
}

impl AuthResponse {
    pub fn new(issued: IssuedToken, user: &User) -> Self {
        Self {
            token: issued.token,
            expires_at: issued.expires_at,
            user: UserResponse::from(user),
        }
    }
}

/// Query string shared by the slot and band listings.
#[derive(Debug, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct ScheduleQuery {
    pub priest_id: Option<String>,
    pub parish_id: Option<String>,
    /// Earliest start time, RFC 3339, inclusive.
    pub from: Option<String>,
    /// Latest start time, RFC 3339, inclusive.
    pub to: Option<String>,
    pub status: Option<String>,
}

impl ScheduleQuery {
    /// Parse every present parameter, naming the first bad one.
    pub fn into_filter<S>(self) -> Result<ScheduleFilter<S>, Error>
    where
        S: FromStr,
        S::Err: Display,
    {
        Ok(ScheduleFilter {
            priest_id: parse_optional_uuid(self.priest_id.as_deref(), FieldName::new("priestId"))?
                .map(UserId::from_uuid),
            parish_id: parse_optional_uuid(self.parish_id.as_deref(), FieldName::new("parishId"))?,
            from: parse_optional_rfc3339_timestamp(self.from.as_deref(), FieldName::new("from"))?,
            to: parse_optional_rfc3339_timestamp(self.to.as_deref(), FieldName::new("to"))?,
            status: parse_optional_enum(self.status.as_deref(), FieldName::new("status"))?,
        })
    }
}
