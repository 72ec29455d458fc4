//! Tests for the confession slot service.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use rstest::rstest;

use super::*;
use crate::domain::ports::{MockConfessionSlotRepository, MockUserRepository};
use crate::domain::test_support::{
    FixtureClock, UserBuilder, actor_for, fixed_now, users_returning,
};
use crate::domain::{ErrorCode, User, UserRole};

type Service = ConfessionSlotsServiceImpl<MockConfessionSlotRepository, MockUserRepository>;

fn service(slots: MockConfessionSlotRepository, users: MockUserRepository) -> Service {
    ConfessionSlotsServiceImpl::new(
        Arc::new(slots),
        Arc::new(users),
        Arc::new(FixtureClock::default()),
    )
}

fn assigned_priest() -> User {
    UserBuilder::new(UserRole::Priest)
        .parish(Uuid::new_v4(), Uuid::new_v4())
        .build()
}

fn new_slot(start: DateTime<Utc>, hours: i64) -> NewSlot {
    NewSlot {
        start_time: start,
        end_time: start + Duration::hours(hours),
        notes: None,
    }
}

fn stored_slot(priest_id: UserId, status: SlotStatus) -> ConfessionSlot {
    let start = fixed_now() + Duration::days(2);
    ConfessionSlot::new(ConfessionSlotDraft {
        id: Uuid::new_v4(),
        priest_id,
        parish_id: Uuid::new_v4(),
        window: TimeWindow::new(start, start + Duration::hours(1)).expect("valid window"),
        status,
        notes: None,
        created_at: fixed_now(),
        updated_at: fixed_now(),
    })
    .expect("valid slot")
}

fn slots_returning(slot: ConfessionSlot) -> MockConfessionSlotRepository {
    let mut slots = MockConfessionSlotRepository::new();
    slots
        .expect_find_by_id()
        .returning(move |_| Ok(Some(slot.clone())));
    slots
}

#[tokio::test]
async fn priest_creates_slot_in_assigned_parish() {
    let priest = assigned_priest();
    let parish_id = priest.parish_id();
    let mut slots = MockConfessionSlotRepository::new();
    slots
        .expect_has_overlap()
        .withf(|_, _, exclude| exclude.is_none())
        .return_once(|_, _, _| Ok(false));
    slots.expect_create().times(1).return_once(|_| Ok(()));

    let created = service(slots, users_returning(vec![priest.clone()]))
        .create(&actor_for(&priest), new_slot(fixed_now() + Duration::days(1), 2))
        .await
        .expect("create succeeds");
    assert_eq!(Some(created.parish_id()), parish_id);
    assert_eq!(created.priest_id(), priest.id());
    assert!(created.is_available());
}

#[tokio::test]
async fn unassigned_priest_cannot_create_slot() {
    let priest = UserBuilder::new(UserRole::Priest).build();
    let mut slots = MockConfessionSlotRepository::new();
    slots.expect_create().times(0);

    let err = service(slots, users_returning(vec![priest.clone()]))
        .create(&actor_for(&priest), new_slot(fixed_now() + Duration::days(1), 1))
        .await
        .expect_err("invalid");
    assert_eq!(err.code(), ErrorCode::InvalidRequest);
}

#[rstest]
#[case(UserRole::Faithful)]
#[case(UserRole::Admin)]
#[tokio::test]
async fn only_priests_create_slots(#[case] role: UserRole) {
    let caller = UserBuilder::new(role).build();
    let err = service(MockConfessionSlotRepository::new(), users_returning(vec![caller.clone()]))
        .create(&actor_for(&caller), new_slot(fixed_now() + Duration::days(1), 1))
        .await
        .expect_err("forbidden");
    assert_eq!(err.code(), ErrorCode::Forbidden);
}

#[rstest]
#[case::in_the_past(fixed_now() - Duration::hours(1), 1)]
#[case::starting_now(fixed_now(), 1)]
#[case::too_long(fixed_now() + Duration::days(1), 5)]
#[case::empty(fixed_now() + Duration::days(1), 0)]
#[tokio::test]
async fn slot_time_rules_are_enforced(#[case] start: DateTime<Utc>, #[case] hours: i64) {
    let priest = assigned_priest();
    let mut slots = MockConfessionSlotRepository::new();
    slots.expect_create().times(0);

    let err = service(slots, users_returning(vec![priest.clone()]))
        .create(&actor_for(&priest), new_slot(start, hours))
        .await
        .expect_err("invalid");
    assert_eq!(err.code(), ErrorCode::InvalidRequest);
}

#[tokio::test]
async fn overlapping_slot_is_rejected() {
    let priest = assigned_priest();
    let mut slots = MockConfessionSlotRepository::new();
    slots
        .expect_has_overlap()
        .return_once(|_, _, _| Ok(true));
    slots.expect_create().times(0);

    let err = service(slots, users_returning(vec![priest.clone()]))
        .create(&actor_for(&priest), new_slot(fixed_now() + Duration::days(1), 1))
        .await
        .expect_err("overlap");
    assert_eq!(err.code(), ErrorCode::InvalidRequest);
}

#[tokio::test]
async fn booked_slot_cannot_be_updated() {
    let priest = assigned_priest();
    let slot = stored_slot(priest.id(), SlotStatus::Booked);
    let slot_id = slot.id();
    let mut slots = slots_returning(slot);
    slots.expect_update_available().times(0);

    let err = service(slots, users_returning(vec![priest.clone()]))
        .update(&actor_for(&priest), slot_id, SlotChanges::default())
        .await
        .expect_err("invalid");
    assert_eq!(err.code(), ErrorCode::InvalidRequest);
}

#[tokio::test]
async fn moving_slot_checks_overlap_excluding_itself() {
    let priest = assigned_priest();
    let slot = stored_slot(priest.id(), SlotStatus::Available);
    let slot_id = slot.id();
    let new_start = slot.start_time() + Duration::hours(3);
    let mut slots = slots_returning(slot);
    slots
        .expect_has_overlap()
        .withf(move |_, _, exclude| *exclude == Some(slot_id))
        .return_once(|_, _, _| Ok(false));
    slots.expect_update_available().times(1).return_once(|_| Ok(true));

    let updated = service(slots, users_returning(vec![priest.clone()]))
        .update(
            &actor_for(&priest),
            slot_id,
            SlotChanges {
                start_time: Some(new_start),
                end_time: Some(new_start + Duration::hours(1)),
                notes: None,
            },
        )
        .await
        .expect("update succeeds");
    assert_eq!(updated.start_time(), new_start);
}

#[tokio::test]
async fn notes_only_update_skips_overlap_check() {
    let priest = assigned_priest();
    let slot = stored_slot(priest.id(), SlotStatus::Available);
    let slot_id = slot.id();
    let mut slots = slots_returning(slot);
    slots.expect_has_overlap().times(0);
    slots.expect_update_available().times(1).return_once(|_| Ok(true));

    let updated = service(slots, users_returning(vec![priest.clone()]))
        .update(
            &actor_for(&priest),
            slot_id,
            SlotChanges {
                notes: Some(Some("Side chapel".to_owned())),
                ..SlotChanges::default()
            },
        )
        .await
        .expect("update succeeds");
    assert_eq!(updated.notes(), Some("Side chapel"));
}

#[tokio::test]
async fn other_priest_cannot_delete_slot() {
    let owner = assigned_priest();
    let other = assigned_priest();
    let slot = stored_slot(owner.id(), SlotStatus::Available);
    let slot_id = slot.id();
    let mut slots = slots_returning(slot);
    slots.expect_delete().times(0);

    let err = service(slots, users_returning(vec![other.clone()]))
        .delete(&actor_for(&other), slot_id)
        .await
        .expect_err("forbidden");
    assert_eq!(err.code(), ErrorCode::Forbidden);
}

#[tokio::test]
async fn booked_slot_cannot_be_deleted() {
    let priest = assigned_priest();
    let slot = stored_slot(priest.id(), SlotStatus::Booked);
    let slot_id = slot.id();
    let mut slots = slots_returning(slot);
    slots.expect_delete().times(0);

    let err = service(slots, users_returning(vec![priest.clone()]))
        .delete(&actor_for(&priest), slot_id)
        .await
        .expect_err("invalid");
    assert_eq!(err.code(), ErrorCode::InvalidRequest);
}

#[tokio::test]
async fn referenced_slot_delete_is_invalid() {
    let admin = UserBuilder::new(UserRole::Admin).build();
    let slot = stored_slot(UserId::random(), SlotStatus::Available);
    let slot_id = slot.id();
    let mut slots = slots_returning(slot);
    slots
        .expect_delete()
        .return_once(|_| Err(ConfessionSlotRepositoryError::Referenced));

    let err = service(slots, users_returning(vec![admin.clone()]))
        .delete(&actor_for(&admin), slot_id)
        .await
        .expect_err("invalid");
    assert_eq!(err.code(), ErrorCode::InvalidRequest);
}

#[tokio::test]
async fn missing_slot_is_not_found() {
    let mut slots = MockConfessionSlotRepository::new();
    slots.expect_find_by_id().return_once(|_| Ok(None));

    let err = service(slots, MockUserRepository::new())
        .get(Uuid::new_v4())
        .await
        .expect_err("not found");
    assert_eq!(err.code(), ErrorCode::NotFound);
}

#[tokio::test]
async fn slot_booked_during_update_is_left_untouched() {
    let priest = assigned_priest();
    let available = stored_slot(priest.id(), SlotStatus::Available);
    let slot_id = available.id();
    let booked = available
        .clone()
        .with_status(SlotStatus::Booked, fixed_now());
    let mut reads = vec![booked, available];
    let mut slots = MockConfessionSlotRepository::new();
    slots
        .expect_find_by_id()
        .times(2)
        .returning(move |_| Ok(reads.pop()));
    slots
        .expect_update_available()
        .times(1)
        .return_once(|_| Ok(false));

    let err = service(slots, users_returning(vec![priest.clone()]))
        .update(
            &actor_for(&priest),
            slot_id,
            SlotChanges {
                notes: Some(Some("Side chapel".to_owned())),
                ..SlotChanges::default()
            },
        )
        .await
        .expect_err("invalid");
    assert_eq!(err.code(), ErrorCode::InvalidRequest);
    assert_eq!(
        err.message(),
        "only available slots can be updated; this one is booked"
    );
}

#[tokio::test]
async fn demoted_admin_token_cannot_delete_foreign_slot() {
    let admin = UserBuilder::new(UserRole::Admin).build();
    let actor = actor_for(&admin);
    let demoted = admin.with_role(UserRole::Faithful, None, None, fixed_now());
    let slot = stored_slot(UserId::random(), SlotStatus::Available);
    let slot_id = slot.id();
    let mut slots = slots_returning(slot);
    slots.expect_delete().times(0);

    let err = service(slots, users_returning(vec![demoted]))
        .delete(&actor, slot_id)
        .await
        .expect_err("forbidden");
    assert_eq!(err.code(), ErrorCode::Forbidden);
}
