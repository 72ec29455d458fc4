//! Tests for the invite service.

use std::sync::Arc;

use chrono::Duration;
use rstest::rstest;

use super::*;
use crate::domain::ports::{
    MockDioceseRepository, MockInviteRepository, MockParishRepository, MockPasswordHasher,
    MockUserRepository,
};
use crate::domain::test_support::{
    FixtureClock, UserBuilder, actor_for, fixed_now, sample_diocese, sample_parish,
    users_returning,
};
use crate::domain::{Email, ErrorCode, NewPassword, PersonName};

type Service = InvitesServiceImpl<
    MockInviteRepository,
    MockUserRepository,
    MockParishRepository,
    MockDioceseRepository,
>;

struct Repos {
    invites: MockInviteRepository,
    users: MockUserRepository,
    parishes: MockParishRepository,
    dioceses: MockDioceseRepository,
    hasher: MockPasswordHasher,
}

impl Repos {
    fn new() -> Self {
        Self {
            invites: MockInviteRepository::new(),
            users: MockUserRepository::new(),
            parishes: MockParishRepository::new(),
            dioceses: MockDioceseRepository::new(),
            hasher: MockPasswordHasher::new(),
        }
    }

    fn knowing(mut self, known: Vec<User>) -> Self {
        self.users = users_returning(known);
        self
    }

    fn with_parish(mut self, parish: Parish) -> Self {
        self.parishes
            .expect_find_by_id()
            .returning(move |_| Ok(Some(parish.clone())));
        self
    }

    fn with_invite(mut self, invite: Invite) -> Self {
        let by_digest = invite.clone();
        self.invites
            .expect_find_by_digest()
            .returning(move |_| Ok(Some(by_digest.clone())));
        self.invites
            .expect_find_by_id()
            .returning(move |_| Ok(Some(invite.clone())));
        self
    }

    fn service(self) -> Service {
        InvitesServiceImpl::new(
            Arc::new(self.invites),
            Arc::new(self.users),
            Arc::new(self.parishes),
            Arc::new(self.dioceses),
            Arc::new(self.hasher),
            Arc::new(FixtureClock::default()),
        )
    }
}

fn stored_invite(
    email: &str,
    role: UserRole,
    parish: Option<&Parish>,
    invited_by: UserId,
    expires_at: chrono::DateTime<Utc>,
) -> Invite {
    Invite::new(InviteDraft {
        id: Uuid::new_v4(),
        token_digest: InviteToken::generate().digest(),
        email: Email::new(email).expect("valid email"),
        role,
        parish_id: parish.map(Parish::id),
        diocese_id: parish.map(Parish::diocese_id),
        invited_by,
        status: InviteStatus::Pending,
        expires_at,
        created_at: fixed_now() - Duration::days(1),
    })
    .expect("valid invite")
}

fn new_invite(role: UserRole, parish_id: Option<Uuid>) -> NewInvite {
    NewInvite {
        email: Email::new("don.matteo@example.org").expect("valid email"),
        role,
        parish_id,
        diocese_id: None,
        ttl_days: None,
    }
}

#[tokio::test]
async fn bishop_invites_priest_into_own_diocese() {
    let diocese = sample_diocese(None);
    let parish = sample_parish(diocese.id());
    let parish_id = parish.id();
    let diocese_id = parish.diocese_id();
    let bishop = UserBuilder::new(UserRole::Bishop)
        .diocese(diocese_id)
        .build();
    let mut repos = Repos::new().knowing(vec![bishop.clone()]).with_parish(parish);
    repos
        .invites
        .expect_create()
        .withf(move |invite| {
            invite.diocese_id() == Some(diocese_id) && invite.status() == InviteStatus::Pending
        })
        .times(1)
        .return_once(|_| Ok(()));

    let issued = repos
        .service()
        .create(&actor_for(&bishop), new_invite(UserRole::Priest, Some(parish_id)))
        .await
        .expect("invite issued");
    assert_eq!(issued.invite.token_digest(), issued.token.digest());
    assert_eq!(
        issued.invite.expires_at(),
        fixed_now() + Duration::days(crate::domain::DEFAULT_INVITE_TTL_DAYS)
    );
}

#[rstest]
#[case(UserRole::Bishop, UserRole::Bishop)]
#[case(UserRole::Bishop, UserRole::Admin)]
#[case(UserRole::ParishStaff, UserRole::ParishStaff)]
#[case(UserRole::Priest, UserRole::Priest)]
#[case(UserRole::Faithful, UserRole::Priest)]
#[tokio::test]
async fn roles_cannot_issue_invites_beyond_their_reach(
    #[case] caller_role: UserRole,
    #[case] invited: UserRole,
) {
    let parish = sample_parish(Uuid::new_v4());
    let caller = UserBuilder::new(caller_role)
        .parish(parish.diocese_id(), parish.id())
        .build();
    let parish_id = parish.id();
    let mut repos = Repos::new().knowing(vec![caller.clone()]).with_parish(parish);
    repos.invites.expect_create().times(0);

    let err = repos
        .service()
        .create(&actor_for(&caller), new_invite(invited, Some(parish_id)))
        .await
        .expect_err("forbidden");
    assert_eq!(err.code(), ErrorCode::Forbidden);
}

#[tokio::test]
async fn parish_staff_cannot_invite_into_another_parish() {
    let parish = sample_parish(Uuid::new_v4());
    let staff = UserBuilder::new(UserRole::ParishStaff)
        .parish(parish.diocese_id(), Uuid::new_v4())
        .build();
    let parish_id = parish.id();
    let repos = Repos::new().knowing(vec![staff.clone()]).with_parish(parish);

    let err = repos
        .service()
        .create(&actor_for(&staff), new_invite(UserRole::Priest, Some(parish_id)))
        .await
        .expect_err("forbidden");
    assert_eq!(err.code(), ErrorCode::Forbidden);
}

#[tokio::test]
async fn mismatched_diocese_is_rejected() {
    let admin = UserBuilder::new(UserRole::Admin).build();
    let parish = sample_parish(Uuid::new_v4());
    let mut invite = new_invite(UserRole::Priest, Some(parish.id()));
    invite.diocese_id = Some(Uuid::new_v4());
    let repos = Repos::new().knowing(vec![admin.clone()]).with_parish(parish);

    let err = repos
        .service()
        .create(&actor_for(&admin), invite)
        .await
        .expect_err("invalid");
    assert_eq!(err.code(), ErrorCode::InvalidRequest);
}

#[tokio::test]
async fn lapsed_invite_is_marked_expired() {
    let invite = stored_invite(
        "late@example.org",
        UserRole::ParishStaff,
        Some(&sample_parish(Uuid::new_v4())),
        UserId::random(),
        fixed_now() - Duration::minutes(1),
    );
    let invite_id = invite.id();
    let mut repos = Repos::new().with_invite(invite);
    repos
        .invites
        .expect_transition()
        .withf(move |id, from, to| {
            *id == invite_id && *from == InviteStatus::Pending && *to == InviteStatus::Expired
        })
        .times(1)
        .return_once(|_, _, _| Ok(true));

    let err = repos
        .service()
        .inspect(&InviteToken::generate())
        .await
        .expect_err("expired");
    assert_eq!(err.code(), ErrorCode::InvalidRequest);
    assert_eq!(err.message(), "invite has expired");
}

#[tokio::test]
async fn unknown_token_is_not_found() {
    let mut repos = Repos::new();
    repos
        .invites
        .expect_find_by_digest()
        .return_once(|_| Ok(None));

    let err = repos
        .service()
        .inspect(&InviteToken::generate())
        .await
        .expect_err("not found");
    assert_eq!(err.code(), ErrorCode::NotFound);
}

#[tokio::test]
async fn accept_requires_matching_email() {
    let me = UserBuilder::new(UserRole::Faithful)
        .email("someone.else@example.org")
        .build();
    let invite = stored_invite(
        "don.matteo@example.org",
        UserRole::Priest,
        Some(&sample_parish(Uuid::new_v4())),
        UserId::random(),
        fixed_now() + Duration::days(3),
    );
    let mut repos = Repos::new().knowing(vec![me.clone()]).with_invite(invite);
    repos.invites.expect_accept().times(0);

    let err = repos
        .service()
        .accept(&actor_for(&me), &InviteToken::generate())
        .await
        .expect_err("forbidden");
    assert_eq!(err.code(), ErrorCode::Forbidden);
}

#[tokio::test]
async fn accepting_priest_invite_opens_assignment() {
    let parish = sample_parish(Uuid::new_v4());
    let parish_id = parish.id();
    let me = UserBuilder::new(UserRole::Faithful)
        .email("Don.Matteo@example.org")
        .build();
    let invite = stored_invite(
        "don.matteo@example.org",
        UserRole::Priest,
        Some(&parish),
        UserId::random(),
        fixed_now() + Duration::days(3),
    );
    let mut repos = Repos::new().knowing(vec![me.clone()]).with_invite(invite);
    repos
        .invites
        .expect_accept()
        .withf(move |grant| {
            grant
                .history
                .as_ref()
                .is_some_and(|history| history.parish_id() == parish_id && history.is_active())
        })
        .times(1)
        .return_once(|_| Ok(true));

    let user = repos
        .service()
        .accept(&actor_for(&me), &InviteToken::generate())
        .await
        .expect("accept succeeds");
    assert_eq!(user.role(), UserRole::Priest);
    assert_eq!(user.parish_id(), Some(parish_id));
}

#[tokio::test]
async fn accept_losing_the_race_is_invalid() {
    let me = UserBuilder::new(UserRole::Faithful)
        .email("don.matteo@example.org")
        .build();
    let invite = stored_invite(
        "don.matteo@example.org",
        UserRole::ParishStaff,
        Some(&sample_parish(Uuid::new_v4())),
        UserId::random(),
        fixed_now() + Duration::days(3),
    );
    let mut repos = Repos::new().knowing(vec![me.clone()]).with_invite(invite);
    repos.invites.expect_accept().return_once(|_| Ok(false));

    let err = repos
        .service()
        .accept(&actor_for(&me), &InviteToken::generate())
        .await
        .expect_err("invalid");
    assert_eq!(err.code(), ErrorCode::InvalidRequest);
}

fn registration() -> InviteRegistration {
    InviteRegistration {
        password: NewPassword::new("correct horse battery").expect("valid password"),
        first_name: PersonName::new("Matteo", "firstName").expect("valid name"),
        last_name: PersonName::new("Minna", "lastName").expect("valid name"),
        phone: None,
    }
}

#[tokio::test]
async fn register_creates_user_with_invited_role() {
    let invite = stored_invite(
        "staff@example.org",
        UserRole::ParishStaff,
        Some(&sample_parish(Uuid::new_v4())),
        UserId::random(),
        fixed_now() + Duration::days(3),
    );
    let mut repos = Repos::new().with_invite(invite);
    repos
        .hasher
        .expect_hash()
        .return_once(|_| Ok("$argon2id$stub".to_owned()));
    repos
        .invites
        .expect_register()
        .withf(|grant, hash| grant.history.is_none() && hash == "$argon2id$stub")
        .times(1)
        .return_once(|_, _| Ok(true));

    let user = repos
        .service()
        .register(&InviteToken::generate(), registration())
        .await
        .expect("register succeeds");
    assert_eq!(user.role(), UserRole::ParishStaff);
    assert_eq!(user.email().as_ref(), "staff@example.org");
}

#[tokio::test]
async fn register_with_taken_email_conflicts() {
    let invite = stored_invite(
        "taken@example.org",
        UserRole::ParishStaff,
        Some(&sample_parish(Uuid::new_v4())),
        UserId::random(),
        fixed_now() + Duration::days(3),
    );
    let mut repos = Repos::new().with_invite(invite);
    repos
        .hasher
        .expect_hash()
        .return_once(|_| Ok("hash".to_owned()));
    repos.invites.expect_register().return_once(|_, _| {
        Err(InviteRepositoryError::duplicate_email("taken@example.org"))
    });

    let err = repos
        .service()
        .register(&InviteToken::generate(), registration())
        .await
        .expect_err("conflict");
    assert_eq!(err.code(), ErrorCode::Conflict);
}

#[tokio::test]
async fn only_inviter_or_admin_revokes() {
    let stranger = UserBuilder::new(UserRole::Bishop).build();
    let invite = stored_invite(
        "x@example.org",
        UserRole::ParishStaff,
        Some(&sample_parish(Uuid::new_v4())),
        UserId::random(),
        fixed_now() + Duration::days(3),
    );
    let mut repos = Repos::new()
        .knowing(vec![stranger.clone()])
        .with_invite(invite);
    repos.invites.expect_transition().times(0);

    let err = repos
        .service()
        .revoke(&actor_for(&stranger), Uuid::new_v4())
        .await
        .expect_err("forbidden");
    assert_eq!(err.code(), ErrorCode::Forbidden);
}

#[tokio::test]
async fn inviter_revokes_pending_invite() {
    let inviter = UserBuilder::new(UserRole::ParishStaff).build();
    let invite = stored_invite(
        "x@example.org",
        UserRole::Priest,
        Some(&sample_parish(Uuid::new_v4())),
        inviter.id(),
        fixed_now() + Duration::days(3),
    );
    let invite_id = invite.id();
    let mut repos = Repos::new()
        .knowing(vec![inviter.clone()])
        .with_invite(invite);
    repos
        .invites
        .expect_transition()
        .withf(move |id, _, to| *id == invite_id && *to == InviteStatus::Revoked)
        .return_once(|_, _, _| Ok(true));

    let revoked = repos
        .service()
        .revoke(&actor_for(&inviter), invite_id)
        .await
        .expect("revoke succeeds");
    assert_eq!(revoked.status(), InviteStatus::Revoked);
}

#[tokio::test]
async fn accepted_invite_cannot_be_revoked() {
    let admin = UserBuilder::new(UserRole::Admin).build();
    let invite = stored_invite(
        "x@example.org",
        UserRole::ParishStaff,
        Some(&sample_parish(Uuid::new_v4())),
        UserId::random(),
        fixed_now() + Duration::days(3),
    )
    .with_status(InviteStatus::Accepted);
    let mut repos = Repos::new()
        .knowing(vec![admin.clone()])
        .with_invite(invite);
    repos.invites.expect_transition().times(0);

    let err = repos
        .service()
        .revoke(&actor_for(&admin), Uuid::new_v4())
        .await
        .expect_err("invalid");
    assert_eq!(err.code(), ErrorCode::InvalidRequest);
}

#[rstest]
#[case(UserRole::Admin, None)]
#[case(UserRole::Bishop, Some(()))]
#[tokio::test]
async fn list_scopes_to_inviter_unless_admin(#[case] role: UserRole, #[case] scoped: Option<()>) {
    let caller = UserBuilder::new(role).build();
    let caller_id = caller.id();
    let mut repos = Repos::new().knowing(vec![caller.clone()]);
    repos
        .invites
        .expect_list()
        .withf(move |invited_by| *invited_by == scoped.map(|()| caller_id))
        .return_once(|_| Ok(Vec::new()));

    let listed = repos
        .service()
        .list(&actor_for(&caller))
        .await
        .expect("list succeeds");
    assert!(listed.is_empty());
}

#[tokio::test]
async fn demoted_admin_lists_only_own_invites() {
    let admin = UserBuilder::new(UserRole::Admin).build();
    let admin_id = admin.id();
    let actor = actor_for(&admin);
    let demoted = admin.with_role(UserRole::ParishStaff, None, None, fixed_now());
    let mut repos = Repos::new().knowing(vec![demoted]);
    repos
        .invites
        .expect_list()
        .withf(move |invited_by| *invited_by == Some(admin_id))
        .return_once(|_| Ok(Vec::new()));

    repos
        .service()
        .list(&actor)
        .await
        .expect("list succeeds");
}

#[tokio::test]
async fn deactivated_inviter_cannot_revoke() {
    let inviter = UserBuilder::new(UserRole::ParishStaff).build();
    let actor = actor_for(&inviter);
    let invite = stored_invite(
        "x@example.org",
        UserRole::Priest,
        Some(&sample_parish(Uuid::new_v4())),
        inviter.id(),
        fixed_now() + Duration::days(3),
    );
    let invite_id = invite.id();
    let mut repos = Repos::new()
        .knowing(vec![inviter.deactivated(fixed_now())])
        .with_invite(invite);
    repos.invites.expect_transition().times(0);

    let err = repos
        .service()
        .revoke(&actor, invite_id)
        .await
        .expect_err("unauthorized");
    assert_eq!(err.code(), ErrorCode::Unauthorized);
}
