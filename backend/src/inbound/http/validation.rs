//! Shared validation helpers for inbound HTTP adapters.
//!
//! Request bodies and query strings are parsed here into domain values. Every
//! failure is an `invalid_request` whose `details` name the offending `field`
//! and a stable `code`.

use std::fmt::Display;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer};
use serde_json::json;
use uuid::Uuid;

use crate::domain::user::normalise_phone;
use crate::domain::{
    CredentialsValidationError, DirectoryValidationError, Email, Error, GeoPoint, NewPassword,
    PersonName, UserValidationError,
};

/// Validation error codes for HTTP request failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ErrorCode {
    InvalidUuid,
    InvalidTimestamp,
    InvalidValue,
    InvalidEmail,
    InvalidPassword,
    InvalidName,
    InvalidPhone,
    InvalidLocation,
}

impl ErrorCode {
    fn as_str(self) -> &'static str {
        match self {
            ErrorCode::InvalidUuid => "invalid_uuid",
            ErrorCode::InvalidTimestamp => "invalid_timestamp",
            ErrorCode::InvalidValue => "invalid_value",
            ErrorCode::InvalidEmail => "invalid_email",
            ErrorCode::InvalidPassword => "invalid_password",
            ErrorCode::InvalidName => "invalid_name",
            ErrorCode::InvalidPhone => "invalid_phone",
            ErrorCode::InvalidLocation => "invalid_location",
        }
    }
}

/// Newtype wrapper for HTTP field names to provide type safety.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct FieldName(&'static str);

impl FieldName {
    pub(crate) const fn new(name: &'static str) -> Self {
        Self(name)
    }

    fn as_str(&self) -> &'static str {
        self.0
    }
}

/// Builder for validation errors with field context.
struct ValidationError {
    field: &'static str,
    message: String,
}

impl ValidationError {
    fn new(field: FieldName, message: impl Into<String>) -> Self {
        Self {
            field: field.as_str(),
            message: message.into(),
        }
    }

    fn with_code(self, code: ErrorCode) -> Error {
        Error::invalid_request(self.message).with_details(json!({
            "field": self.field,
            "code": code.as_str(),
        }))
    }

    fn with_value(self, code: ErrorCode, value: impl Into<String>) -> Error {
        Error::invalid_request(self.message).with_details(json!({
            "field": self.field,
            "value": value.into(),
            "code": code.as_str(),
        }))
    }
}

pub(crate) fn field_error(field: FieldName, code: ErrorCode, message: impl Display) -> Error {
    ValidationError::new(field, message.to_string()).with_code(code)
}

pub(crate) fn parse_uuid(value: &str, field: FieldName) -> Result<Uuid, Error> {
    Uuid::parse_str(value).map_err(|_| {
        let name = field.as_str();
        ValidationError::new(field, format!("{name} must be a valid UUID"))
            .with_value(ErrorCode::InvalidUuid, value)
    })
}

pub(crate) fn parse_optional_uuid(
    value: Option<&str>,
    field: FieldName,
) -> Result<Option<Uuid>, Error> {
    value.map(|raw| parse_uuid(raw, field)).transpose()
}

pub(crate) fn parse_rfc3339_timestamp(
    value: &str,
    field: FieldName,
) -> Result<DateTime<Utc>, Error> {
    DateTime::parse_from_rfc3339(value)
        .map(|timestamp| timestamp.with_timezone(&Utc))
        .map_err(|_| {
            let name = field.as_str();
            ValidationError::new(field, format!("{name} must be an RFC 3339 timestamp"))
                .with_value(ErrorCode::InvalidTimestamp, value)
        })
}

pub(crate) fn parse_optional_rfc3339_timestamp(
    value: Option<&str>,
    field: FieldName,
) -> Result<Option<DateTime<Utc>>, Error> {
    value
        .map(|raw| parse_rfc3339_timestamp(raw, field))
        .transpose()
}

/// Parse an optional text enum (status, role) from a query parameter.
pub(crate) fn parse_optional_enum<T>(value: Option<&str>, field: FieldName) -> Result<Option<T>, Error>
where
    T: FromStr,
    T::Err: Display,
{
    value
        .map(|raw| {
            raw.parse::<T>().map_err(|err| {
                ValidationError::new(field, err.to_string()).with_value(ErrorCode::InvalidValue, raw)
            })
        })
        .transpose()
}

pub(crate) fn parse_email(value: &str) -> Result<Email, Error> {
    Email::new(value).map_err(|err| {
        field_error(FieldName::new("email"), ErrorCode::InvalidEmail, err)
    })
}

pub(crate) fn parse_name(value: &str, field: &'static str) -> Result<PersonName, Error> {
    PersonName::new(value, field)
        .map_err(|err| field_error(FieldName::new(field), ErrorCode::InvalidName, err))
}

pub(crate) fn parse_optional_name(
    value: Option<&str>,
    field: &'static str,
) -> Result<Option<PersonName>, Error> {
    value.map(|raw| parse_name(raw, field)).transpose()
}

pub(crate) fn parse_phone(value: Option<&str>) -> Result<Option<String>, Error> {
    normalise_phone(value).map_err(|err: UserValidationError| {
        field_error(FieldName::new("phone"), ErrorCode::InvalidPhone, err)
    })
}

pub(crate) fn parse_new_password(value: &str) -> Result<NewPassword, Error> {
    NewPassword::new(value).map_err(|err: CredentialsValidationError| {
        field_error(FieldName::new("password"), ErrorCode::InvalidPassword, err)
    })
}

pub(crate) fn parse_location(
    latitude: Option<f64>,
    longitude: Option<f64>,
) -> Result<Option<GeoPoint>, Error> {
    GeoPoint::from_parts(latitude, longitude).map_err(|err: DirectoryValidationError| {
        let field = match err {
            DirectoryValidationError::LongitudeOutOfRange { .. } => "longitude",
            _ => "latitude",
        };
        field_error(FieldName::new(field), ErrorCode::InvalidLocation, err)
    })
}

/// Deserialise a field where `null` and absence mean different things:
/// absent is `None`, `null` is `Some(None)`.
pub(crate) fn nullable<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}
