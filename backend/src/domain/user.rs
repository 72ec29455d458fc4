//! User accounts, roles and profile values.

use std::fmt;
use std::sync::OnceLock;

use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::text_enum::text_enum;

/// Maximum length of a first or last name.
pub const NAME_MAX: usize = 100;
/// Maximum length of a phone number once trimmed.
pub const PHONE_MAX: usize = 32;

/// Validation errors for user values.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum UserValidationError {
    #[error("user id must not be empty")]
    EmptyId,
    #[error("user id must be a valid UUID")]
    InvalidId,
    #[error("email must be a valid address")]
    InvalidEmail,
    #[error("{field} must not be empty")]
    EmptyName { field: &'static str },
    #[error("{field} must be at most {max} characters")]
    NameTooLong { field: &'static str, max: usize },
    #[error("phone may contain digits, spaces, dashes, parentheses and a leading plus")]
    InvalidPhone,
}

/// Stable user identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(Uuid);

impl UserId {
    /// Parse a [`UserId`] from its string form.
    pub fn new(id: impl AsRef<str>) -> Result<Self, UserValidationError> {
        let id = id.as_ref();
        if id.is_empty() {
            return Err(UserValidationError::EmptyId);
        }
        Uuid::parse_str(id)
            .map(Self)
            .map_err(|_| UserValidationError::InvalidId)
    }

    /// Wrap an existing UUID.
    pub const fn from_uuid(id: Uuid) -> Self {
        Self(id)
    }

    /// Generate a new random [`UserId`].
    pub fn random() -> Self {
        Self(Uuid::new_v4())
    }

    /// Access the underlying UUID.
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

static EMAIL_RE: OnceLock<Regex> = OnceLock::new();

fn email_regex() -> &'static Regex {
    EMAIL_RE.get_or_init(|| {
        Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$")
            .unwrap_or_else(|error| panic!("email regex failed to compile: {error}"))
    })
}

/// Lower-cased, trimmed email address.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Email(String);

impl Email {
    /// Normalise and validate an email address.
    ///
    /// # Examples
    /// ```
    /// use confesapp::domain::Email;
    ///
    /// let email = Email::new("  Maria@Example.org ").unwrap();
    /// assert_eq!(email.as_ref(), "maria@example.org");
    /// ```
    pub fn new(raw: impl AsRef<str>) -> Result<Self, UserValidationError> {
        let normalised = raw.as_ref().trim().to_lowercase();
        if normalised.len() > 254 || !email_regex().is_match(&normalised) {
            return Err(UserValidationError::InvalidEmail);
        }
        Ok(Self(normalised))
    }
}

impl AsRef<str> for Email {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for Email {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<Email> for String {
    fn from(value: Email) -> Self {
        value.0
    }
}

impl TryFrom<String> for Email {
    type Error = UserValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

/// Trimmed personal name (first or last).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersonName(String);

impl PersonName {
    /// Validate a name for the given field label.
    pub fn new(raw: impl AsRef<str>, field: &'static str) -> Result<Self, UserValidationError> {
        let trimmed = raw.as_ref().trim();
        if trimmed.is_empty() {
            return Err(UserValidationError::EmptyName { field });
        }
        if trimmed.chars().count() > NAME_MAX {
            return Err(UserValidationError::NameTooLong {
                field,
                max: NAME_MAX,
            });
        }
        Ok(Self(trimmed.to_owned()))
    }
}

impl AsRef<str> for PersonName {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}

/// Validate an optional phone number, mapping blank input to `None`.
pub fn normalise_phone(raw: Option<&str>) -> Result<Option<String>, UserValidationError> {
    let Some(value) = raw.map(str::trim).filter(|value| !value.is_empty()) else {
        return Ok(None);
    };
    let body = value.strip_prefix('+').unwrap_or(value);
    let valid_chars = body
        .chars()
        .all(|c| c.is_ascii_digit() || matches!(c, ' ' | '-' | '(' | ')'));
    let digits = body.chars().filter(char::is_ascii_digit).count();
    if !valid_chars || digits < 6 || value.len() > PHONE_MAX {
        return Err(UserValidationError::InvalidPhone);
    }
    Ok(Some(value.to_owned()))
}

text_enum! {
    /// Role granted to a user account.
    pub enum UserRole, parse error ParseUserRoleError ("user role") {
        /// Parishioner booking confessions.
        Faithful => "faithful",
        Priest => "priest",
        Bishop => "bishop",
        Admin => "admin",
        /// Parish coordinator.
        ParishStaff => "parish_staff",
    }
}

/// Input payload for [`User::new`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserDraft {
    pub id: UserId,
    pub email: Email,
    pub first_name: PersonName,
    pub last_name: PersonName,
    pub phone: Option<String>,
    pub role: UserRole,
    pub diocese_id: Option<Uuid>,
    pub parish_id: Option<Uuid>,
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Profile fields a user (or an admin) may change.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProfileChanges {
    pub first_name: Option<PersonName>,
    pub last_name: Option<PersonName>,
    /// `Some(None)` clears the phone number.
    pub phone: Option<Option<String>>,
}

/// Application user.
///
/// ## Invariants
/// - `email` is lower-cased and unique across accounts.
/// - `phone`, when present, passed [`normalise_phone`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    id: UserId,
    email: Email,
    first_name: PersonName,
    last_name: PersonName,
    phone: Option<String>,
    role: UserRole,
    diocese_id: Option<Uuid>,
    parish_id: Option<Uuid>,
    active: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl User {
    /// Validate and construct a user.
    pub fn new(draft: UserDraft) -> Result<Self, UserValidationError> {
        Self::try_from(draft)
    }

    pub fn id(&self) -> UserId {
        self.id
    }
    pub fn email(&self) -> &Email {
        &self.email
    }
    pub fn first_name(&self) -> &str {
        self.first_name.as_ref()
    }
    pub fn last_name(&self) -> &str {
        self.last_name.as_ref()
    }
    pub fn phone(&self) -> Option<&str> {
        self.phone.as_deref()
    }
    pub fn role(&self) -> UserRole {
        self.role
    }
    pub fn diocese_id(&self) -> Option<Uuid> {
        self.diocese_id
    }
    pub fn parish_id(&self) -> Option<Uuid> {
        self.parish_id
    }
    pub fn is_active(&self) -> bool {
        self.active
    }
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Full display name.
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name(), self.last_name())
    }

    /// Apply profile changes.
    #[must_use]
    pub fn with_profile(mut self, changes: ProfileChanges, now: DateTime<Utc>) -> Self {
        if let Some(first_name) = changes.first_name {
            self.first_name = first_name;
        }
        if let Some(last_name) = changes.last_name {
            self.last_name = last_name;
        }
        if let Some(phone) = changes.phone {
            self.phone = phone;
        }
        self.updated_at = now;
        self
    }

    /// Replace the role and its diocese/parish association.
    #[must_use]
    pub fn with_role(
        mut self,
        role: UserRole,
        diocese_id: Option<Uuid>,
        parish_id: Option<Uuid>,
        now: DateTime<Utc>,
    ) -> Self {
        self.role = role;
        self.diocese_id = diocese_id;
        self.parish_id = parish_id;
        self.updated_at = now;
        self
    }

    /// Move the user to a parish, keeping the role.
    #[must_use]
    pub fn with_parish(mut self, diocese_id: Uuid, parish_id: Uuid, now: DateTime<Utc>) -> Self {
        self.diocese_id = Some(diocese_id);
        self.parish_id = Some(parish_id);
        self.updated_at = now;
        self
    }

    /// Soft-delete the account.
    #[must_use]
    pub fn deactivated(mut self, now: DateTime<Utc>) -> Self {
        self.active = false;
        self.updated_at = now;
        self
    }
}

impl TryFrom<UserDraft> for User {
    type Error = UserValidationError;

    fn try_from(draft: UserDraft) -> Result<Self, Self::Error> {
        let phone = normalise_phone(draft.phone.as_deref())?;
        Ok(Self {
            id: draft.id,
            email: draft.email,
            first_name: draft.first_name,
            last_name: draft.last_name,
            phone,
            role: draft.role,
            diocese_id: draft.diocese_id,
            parish_id: draft.parish_id,
            active: draft.active,
            created_at: draft.created_at,
            updated_at: draft.updated_at,
        })
    }
}
