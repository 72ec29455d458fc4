//! Authentication primitives and the authenticated caller.
//!
//! Inbound adapters turn raw strings into these types before talking to a
//! port, and turn a verified bearer token into an [`Actor`].

use zeroize::Zeroizing;

use super::{Email, Error, UserId, UserRole};

/// Minimum accepted password length in characters.
pub const PASSWORD_MIN: usize = 8;
/// Maximum accepted password length in characters.
pub const PASSWORD_MAX: usize = 128;

/// Domain error returned when credential payload values are invalid.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CredentialsValidationError {
    /// Email was missing or malformed.
    #[error("email must be a valid address")]
    InvalidEmail,
    /// Password was blank.
    #[error("password must not be empty")]
    EmptyPassword,
    /// Password is shorter than [`PASSWORD_MIN`].
    #[error("password must be at least {min} characters")]
    PasswordTooShort { min: usize },
    /// Password is longer than [`PASSWORD_MAX`].
    #[error("password must be at most {max} characters")]
    PasswordTooLong { max: usize },
}

/// Validated login credentials used by the account service.
///
/// ## Invariants
/// - `email` is normalised by [`Email::new`].
/// - `password` is non-empty; caller whitespace is preserved.
///
/// # Examples
/// ```
/// use confesapp::domain::LoginCredentials;
///
/// let creds = LoginCredentials::try_from_parts("Ana@Example.org", "password").unwrap();
/// assert_eq!(creds.email().as_ref(), "ana@example.org");
/// assert_eq!(creds.password(), "password");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginCredentials {
    email: Email,
    password: Zeroizing<String>,
}

impl LoginCredentials {
    /// Construct credentials from raw email/password inputs.
    pub fn try_from_parts(email: &str, password: &str) -> Result<Self, CredentialsValidationError> {
        let email = Email::new(email).map_err(|_| CredentialsValidationError::InvalidEmail)?;
        if password.is_empty() {
            return Err(CredentialsValidationError::EmptyPassword);
        }
        Ok(Self {
            email,
            password: Zeroizing::new(password.to_owned()),
        })
    }

    pub fn email(&self) -> &Email {
        &self.email
    }

    pub fn password(&self) -> &str {
        self.password.as_str()
    }
}

/// Password chosen at registration, checked against the length policy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewPassword(Zeroizing<String>);

impl NewPassword {
    /// Validate a new password.
    pub fn new(raw: &str) -> Result<Self, CredentialsValidationError> {
        let length = raw.chars().count();
        if length == 0 {
            return Err(CredentialsValidationError::EmptyPassword);
        }
        if length < PASSWORD_MIN {
            return Err(CredentialsValidationError::PasswordTooShort { min: PASSWORD_MIN });
        }
        if length > PASSWORD_MAX {
            return Err(CredentialsValidationError::PasswordTooLong { max: PASSWORD_MAX });
        }
        Ok(Self(Zeroizing::new(raw.to_owned())))
    }

    pub fn expose(&self) -> &str {
        self.0.as_str()
    }
}

/// Authenticated caller as asserted by a verified bearer token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Actor {
    user_id: UserId,
    role: UserRole,
}

impl Actor {
    pub const fn new(user_id: UserId, role: UserRole) -> Self {
        Self { user_id, role }
    }

    pub fn user_id(&self) -> UserId {
        self.user_id
    }

    pub fn role(&self) -> UserRole {
        self.role
    }

    pub fn is_admin(&self) -> bool {
        self.role == UserRole::Admin
    }

    /// Whether the actor is the given user.
    pub fn is(&self, user_id: UserId) -> bool {
        self.user_id == user_id
    }

    /// Require one of `roles`, otherwise `403 Forbidden`.
    ///
    /// # Examples
    /// ```
    /// use confesapp::domain::{Actor, ErrorCode, UserId, UserRole};
    ///
    /// let actor = Actor::new(UserId::random(), UserRole::Faithful);
    /// let err = actor.require_role(&[UserRole::Priest], "create slots").unwrap_err();
    /// assert_eq!(err.code(), ErrorCode::Forbidden);
    /// ```
    pub fn require_role(&self, roles: &[UserRole], action: &str) -> Result<(), Error> {
        if roles.contains(&self.role) {
            Ok(())
        } else {
            Err(forbidden(action))
        }
    }
}

/// Standard `403 Forbidden` for an action the caller may not perform.
pub fn forbidden(action: &str) -> Error {
    Error::forbidden(format!("not permitted to {action}"))
}
