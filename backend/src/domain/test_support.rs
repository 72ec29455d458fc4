//! Shared builders and a fixed clock for domain unit tests.

use chrono::{DateTime, Local, TimeZone, Utc};
use mockable::Clock;
use uuid::Uuid;

use super::ports::MockUserRepository;
use super::{
    Actor, Diocese, DioceseDraft, Email, Parish, ParishDraft, PersonName, User, UserDraft, UserId,
    UserRole,
};

/// Instant used as "now" across service tests.
pub fn fixed_now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 4, 1, 10, 0, 0)
        .single()
        .expect("valid fixture timestamp")
}

/// Clock frozen at a single instant.
#[derive(Debug, Clone, Copy)]
pub struct FixtureClock(pub DateTime<Utc>);

impl Default for FixtureClock {
    fn default() -> Self {
        Self(fixed_now())
    }
}

impl Clock for FixtureClock {
    fn local(&self) -> DateTime<Local> {
        self.0.with_timezone(&Local)
    }

    fn utc(&self) -> DateTime<Utc> {
        self.0
    }
}

/// Builder for [`User`] records with sensible defaults.
pub struct UserBuilder {
    draft: UserDraft,
}

impl UserBuilder {
    pub fn new(role: UserRole) -> Self {
        let id = UserId::random();
        let now = fixed_now();
        Self {
            draft: UserDraft {
                id,
                email: Email::new(format!("{}@example.org", id.as_uuid().simple()))
                    .expect("valid email"),
                first_name: PersonName::new("Test", "firstName").expect("valid name"),
                last_name: PersonName::new("User", "lastName").expect("valid name"),
                phone: None,
                role,
                diocese_id: None,
                parish_id: None,
                active: true,
                created_at: now,
                updated_at: now,
            },
        }
    }

    pub fn email(mut self, email: &str) -> Self {
        self.draft.email = Email::new(email).expect("valid email");
        self
    }

    pub fn diocese(mut self, diocese_id: Uuid) -> Self {
        self.draft.diocese_id = Some(diocese_id);
        self
    }

    pub fn parish(mut self, diocese_id: Uuid, parish_id: Uuid) -> Self {
        self.draft.diocese_id = Some(diocese_id);
        self.draft.parish_id = Some(parish_id);
        self
    }

    pub fn build(self) -> User {
        User::new(self.draft).expect("valid user")
    }
}

/// Actor matching a built user.
pub fn actor_for(user: &User) -> Actor {
    Actor::new(user.id(), user.role())
}

/// User repository resolving ids against `users`; unknown ids are absent.
pub fn users_returning(users: Vec<User>) -> MockUserRepository {
    let mut repo = MockUserRepository::new();
    repo.expect_find_by_id()
        .returning(move |id| Ok(users.iter().find(|user| user.id() == *id).cloned()));
    repo
}

/// Active diocese, optionally headed by `bishop_id`.
pub fn sample_diocese(bishop_id: Option<UserId>) -> Diocese {
    diocese_with(Uuid::new_v4(), bishop_id)
}

/// Active diocese with a fixed id.
pub fn diocese_with(id: Uuid, bishop_id: Option<UserId>) -> Diocese {
    let now = fixed_now();
    Diocese::new(DioceseDraft {
        id,
        name: "Diocese of Assisi".to_owned(),
        bishop_id,
        active: true,
        created_at: now,
        updated_at: now,
    })
    .expect("valid diocese")
}

/// Active parish in `diocese_id`.
pub fn sample_parish(diocese_id: Uuid) -> Parish {
    let now = fixed_now();
    Parish::new(ParishDraft {
        id: Uuid::new_v4(),
        diocese_id,
        name: "San Damiano".to_owned(),
        address: Some("Via San Damiano 7".to_owned()),
        location: None,
        active: true,
        created_at: now,
        updated_at: now,
    })
    .expect("valid parish")
}
