//! Caller scope derived from the stored user record.
//!
//! Bearer tokens carry only the user id and role. Decisions that depend on
//! the caller's diocese or parish use a [`CallerScope`] built from the current
//! row so a reassignment takes effect without reissuing tokens.

use uuid::Uuid;

use super::{Actor, Error, User, UserId, UserRole};

/// Actor together with its current diocese and parish.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CallerScope {
    actor: Actor,
    diocese_id: Option<Uuid>,
    parish_id: Option<Uuid>,
}

impl CallerScope {
    /// Build the scope from the caller's stored record.
    ///
    /// The stored role wins over the token role. Inactive users are rejected
    /// with `401 Unauthorized`.
    pub fn from_user(user: &User) -> Result<Self, Error> {
        if !user.is_active() {
            return Err(Error::unauthorized("account is inactive"));
        }
        Ok(Self {
            actor: Actor::new(user.id(), user.role()),
            diocese_id: user.diocese_id(),
            parish_id: user.parish_id(),
        })
    }

    pub fn actor(&self) -> Actor {
        self.actor
    }

    pub fn user_id(&self) -> UserId {
        self.actor.user_id()
    }

    pub fn role(&self) -> UserRole {
        self.actor.role()
    }

    pub fn diocese_id(&self) -> Option<Uuid> {
        self.diocese_id
    }

    pub fn parish_id(&self) -> Option<Uuid> {
        self.parish_id
    }

    /// Caller is a bishop assigned to `diocese_id`.
    pub fn is_bishop_of(&self, diocese_id: Uuid) -> bool {
        self.role() == UserRole::Bishop && self.diocese_id == Some(diocese_id)
    }

    /// Caller is parish staff assigned to `parish_id`.
    pub fn is_staff_of(&self, parish_id: Uuid) -> bool {
        self.role() == UserRole::ParishStaff && self.parish_id == Some(parish_id)
    }
}
