//! In-memory implementations of the driven ports used by the booking flow.
//!
//! One store backs users, slots, bands and confessions so a booking sees the
//! same target state the slot and band services wrote. Bookings run the
//! domain planners under the store lock, mirroring the row locks the
//! PostgreSQL adapter takes.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::{DateTime, Duration, Local, Utc};
use mockable::Clock;
use uuid::Uuid;

use confesapp::domain::ports::{
    BandCancellation, ConfessionBandRepository, ConfessionBandRepositoryError,
    ConfessionRepository, ConfessionRepositoryError, ConfessionSlotRepository,
    ConfessionSlotRepositoryError, DioceseRepository, DioceseRepositoryError, InviteGrant,
    InviteRepository, InviteRepositoryError, ParishRepository, ParishRepositoryError,
    PriestRequestRepository, PriestRequestRepositoryError, RequestAcceptance, RequestScope,
    ScheduleFilter, StoredCredentials, UserListFilter, UserRepository, UserRepositoryError,
    UserScope,
};
use confesapp::domain::scheduling::{
    BandStatus, BookableTarget, BookingContext, BookingPlan, BookingRejection, BookingRequest,
    BookingTarget, Confession, ConfessionBand, ConfessionSlot, ConfessionStatus, SlotStatus,
    TargetUpdate, TimeWindow, plan_booking, plan_cancellation, plan_completion,
};
use confesapp::domain::{
    Diocese, Email, Invite, InviteStatus, Parish, PriestParishHistory, PriestParishRequest,
    RequestStatus, User, UserId,
};

/// Clock the test can move forward.
#[derive(Debug, Clone)]
pub struct SharedClock(Arc<Mutex<DateTime<Utc>>>);

impl SharedClock {
    pub fn at(now: DateTime<Utc>) -> Self {
        Self(Arc::new(Mutex::new(now)))
    }

    pub fn advance(&self, by: Duration) {
        let mut now = self.0.lock().expect("clock lock");
        *now += by;
    }
}

impl Clock for SharedClock {
    fn local(&self) -> DateTime<Local> {
        self.utc().with_timezone(&Local)
    }

    fn utc(&self) -> DateTime<Utc> {
        *self.0.lock().expect("clock lock")
    }
}

#[derive(Default)]
struct Tables {
    users: HashMap<UserId, (User, String)>,
    slots: HashMap<Uuid, ConfessionSlot>,
    bands: HashMap<Uuid, ConfessionBand>,
    confessions: HashMap<Uuid, Confession>,
}

impl Tables {
    fn target(&self, target: BookingTarget) -> Option<BookableTarget> {
        match target {
            BookingTarget::Slot(id) => self.slots.get(&id).cloned().map(BookableTarget::Slot),
            BookingTarget::Band(id) => self.bands.get(&id).cloned().map(BookableTarget::Band),
        }
    }

    fn store_target(&mut self, update: TargetUpdate) {
        match update {
            TargetUpdate::Slot(slot) => {
                self.slots.insert(slot.id(), slot);
            }
            TargetUpdate::Band(band) => {
                self.bands.insert(band.id(), band);
            }
            TargetUpdate::Unchanged => {}
        }
    }

    fn store_plan(&mut self, plan: BookingPlan) -> Confession {
        self.store_target(plan.target);
        self.confessions
            .insert(plan.confession.id(), plan.confession.clone());
        plan.confession
    }

    fn booked_on(&self, target: BookingTarget) -> impl Iterator<Item = &Confession> {
        self.confessions.values().filter(move |confession| {
            confession.target() == target && confession.status() == ConfessionStatus::Booked
        })
    }
}

/// Shared tables for every in-memory repository.
#[derive(Clone, Default)]
pub struct InMemoryStore(Arc<Mutex<Tables>>);

impl InMemoryStore {
    fn tables(&self) -> MutexGuard<'_, Tables> {
        self.0.lock().expect("store lock")
    }

    /// Insert a user directly, as an administrator or invite would have.
    pub fn seed_user(&self, user: User, password_hash: String) {
        self.tables().users.insert(user.id(), (user, password_hash));
    }

    pub fn slot(&self, id: Uuid) -> Option<ConfessionSlot> {
        self.tables().slots.get(&id).cloned()
    }

    pub fn band(&self, id: Uuid) -> Option<ConfessionBand> {
        self.tables().bands.get(&id).cloned()
    }
}

#[async_trait]
impl UserRepository for InMemoryStore {
    async fn create(&self, user: &User, password_hash: &str) -> Result<(), UserRepositoryError> {
        let mut tables = self.tables();
        if tables
            .users
            .values()
            .any(|(existing, _)| existing.email() == user.email())
        {
            return Err(UserRepositoryError::duplicate_email(user.email().as_ref()));
        }
        tables
            .users
            .insert(user.id(), (user.clone(), password_hash.to_owned()));
        Ok(())
    }

    async fn find_by_id(&self, id: &UserId) -> Result<Option<User>, UserRepositoryError> {
        Ok(self.tables().users.get(id).map(|(user, _)| user.clone()))
    }

    async fn find_credentials(
        &self,
        email: &Email,
    ) -> Result<Option<StoredCredentials>, UserRepositoryError> {
        Ok(self
            .tables()
            .users
            .values()
            .find(|(user, _)| user.email() == email)
            .map(|(user, hash)| StoredCredentials {
                user: user.clone(),
                password_hash: hash.clone(),
            }))
    }

    async fn list(
        &self,
        scope: UserScope,
        filter: UserListFilter,
    ) -> Result<Vec<User>, UserRepositoryError> {
        Ok(self
            .tables()
            .users
            .values()
            .map(|(user, _)| user)
            .filter(|user| match scope {
                UserScope::All => true,
                UserScope::Diocese(id) => user.diocese_id() == Some(id),
                UserScope::Parish(id) => user.parish_id() == Some(id),
            })
            .filter(|user| filter.role.is_none_or(|role| user.role() == role))
            .filter(|user| filter.parish_id.is_none_or(|id| user.parish_id() == Some(id)))
            .cloned()
            .collect())
    }

    async fn save(&self, user: &User) -> Result<(), UserRepositoryError> {
        let mut tables = self.tables();
        let Some(entry) = tables.users.get_mut(&user.id()) else {
            return Err(UserRepositoryError::query("user not found for update"));
        };
        entry.0 = user.clone();
        Ok(())
    }
}

fn within<S: PartialEq + Copy>(
    filter: &ScheduleFilter<S>,
    priest_id: UserId,
    parish_id: Uuid,
    start: DateTime<Utc>,
    status: S,
) -> bool {
    filter.priest_id.is_none_or(|id| id == priest_id)
        && filter.parish_id.is_none_or(|id| id == parish_id)
        && filter.status.is_none_or(|wanted| wanted == status)
        && filter.admits_start(start)
}

#[async_trait]
impl ConfessionSlotRepository for InMemoryStore {
    async fn create(&self, slot: &ConfessionSlot) -> Result<(), ConfessionSlotRepositoryError> {
        self.tables().slots.insert(slot.id(), slot.clone());
        Ok(())
    }

    async fn find_by_id(
        &self,
        id: Uuid,
    ) -> Result<Option<ConfessionSlot>, ConfessionSlotRepositoryError> {
        Ok(self.slot(id))
    }

    async fn list(
        &self,
        filter: ScheduleFilter<SlotStatus>,
    ) -> Result<Vec<ConfessionSlot>, ConfessionSlotRepositoryError> {
        let mut slots: Vec<ConfessionSlot> = self
            .tables()
            .slots
            .values()
            .filter(|slot| {
                within(
                    &filter,
                    slot.priest_id(),
                    slot.parish_id(),
                    slot.start_time(),
                    slot.status(),
                )
            })
            .cloned()
            .collect();
        slots.sort_by_key(ConfessionSlot::start_time);
        Ok(slots)
    }

    async fn has_overlap(
        &self,
        priest_id: UserId,
        window: TimeWindow,
        exclude: Option<Uuid>,
    ) -> Result<bool, ConfessionSlotRepositoryError> {
        Ok(self.tables().slots.values().any(|slot| {
            slot.priest_id() == priest_id
                && Some(slot.id()) != exclude
                && slot.status() != SlotStatus::Completed
                && slot.window().overlaps(&window)
        }))
    }

    async fn update_available(
        &self,
        slot: &ConfessionSlot,
    ) -> Result<bool, ConfessionSlotRepositoryError> {
        let mut tables = self.tables();
        match tables.slots.get_mut(&slot.id()) {
            Some(stored) if stored.status() == SlotStatus::Available => {
                *stored = slot.clone();
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn delete(&self, id: Uuid) -> Result<(), ConfessionSlotRepositoryError> {
        let mut tables = self.tables();
        if tables
            .confessions
            .values()
            .any(|confession| confession.target() == BookingTarget::Slot(id))
        {
            return Err(ConfessionSlotRepositoryError::referenced());
        }
        tables.slots.remove(&id);
        Ok(())
    }
}

#[async_trait]
impl ConfessionBandRepository for InMemoryStore {
    async fn create_series(
        &self,
        bands: &[ConfessionBand],
    ) -> Result<(), ConfessionBandRepositoryError> {
        let mut tables = self.tables();
        for band in bands {
            tables.bands.insert(band.id(), band.clone());
        }
        Ok(())
    }

    async fn find_by_id(
        &self,
        id: Uuid,
    ) -> Result<Option<ConfessionBand>, ConfessionBandRepositoryError> {
        Ok(self.band(id))
    }

    async fn list(
        &self,
        filter: ScheduleFilter<BandStatus>,
    ) -> Result<Vec<ConfessionBand>, ConfessionBandRepositoryError> {
        let mut bands: Vec<ConfessionBand> = self
            .tables()
            .bands
            .values()
            .filter(|band| {
                within(
                    &filter,
                    band.priest_id(),
                    band.parish_id(),
                    band.start_time(),
                    band.status(),
                )
            })
            .cloned()
            .collect();
        bands.sort_by_key(ConfessionBand::start_time);
        Ok(bands)
    }

    async fn update_capacity(
        &self,
        id: Uuid,
        capacity: u32,
        now: DateTime<Utc>,
    ) -> Result<Option<ConfessionBand>, ConfessionBandRepositoryError> {
        let mut tables = self.tables();
        let Some(band) = tables.bands.get(&id).cloned() else {
            return Ok(None);
        };
        let resized = band
            .with_capacity(capacity, now)
            .map_err(ConfessionBandRepositoryError::invalid)?;
        tables.bands.insert(id, resized.clone());
        Ok(Some(resized))
    }

    async fn cancel(
        &self,
        id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<Option<BandCancellation>, ConfessionBandRepositoryError> {
        let mut tables = self.tables();
        let Some(band) = tables.bands.get(&id).cloned() else {
            return Ok(None);
        };
        let cancelled = band
            .cancelled(now)
            .map_err(ConfessionBandRepositoryError::invalid)?;
        tables.bands.insert(id, cancelled.clone());

        let mut cancelled_bookings = 0;
        for confession in tables.confessions.values_mut() {
            if confession.target() == BookingTarget::Band(id)
                && confession.status() == ConfessionStatus::Booked
            {
                *confession = confession
                    .clone()
                    .with_status(ConfessionStatus::Cancelled, now);
                cancelled_bookings += 1;
            }
        }
        Ok(Some(BandCancellation {
            band: cancelled,
            cancelled_bookings,
        }))
    }
}

type Planner =
    fn(Confession, BookableTarget, DateTime<Utc>) -> Result<BookingPlan, BookingRejection>;

impl InMemoryStore {
    fn transition(
        &self,
        id: Uuid,
        now: DateTime<Utc>,
        planner: Planner,
    ) -> Result<Confession, ConfessionRepositoryError> {
        let mut tables = self.tables();
        let confession = tables
            .confessions
            .get(&id)
            .cloned()
            .ok_or_else(ConfessionRepositoryError::confession_not_found)?;
        let target = tables
            .target(confession.target())
            .ok_or_else(ConfessionRepositoryError::target_not_found)?;
        let plan = planner(confession, target, now).map_err(ConfessionRepositoryError::rejected)?;
        Ok(tables.store_plan(plan))
    }
}

#[async_trait]
impl ConfessionRepository for InMemoryStore {
    async fn book(
        &self,
        request: &BookingRequest,
        now: DateTime<Utc>,
    ) -> Result<Confession, ConfessionRepositoryError> {
        let mut tables = self.tables();
        let target = tables
            .target(request.target())
            .ok_or_else(ConfessionRepositoryError::target_not_found)?;
        let context = BookingContext {
            caller_has_booking: tables
                .booked_on(request.target())
                .any(|confession| confession.faithful_id() == request.faithful_id()),
            active_bookings: u32::try_from(tables.booked_on(request.target()).count())
                .expect("booking count fits u32"),
        };
        let plan = plan_booking(request, target, context, now)
            .map_err(ConfessionRepositoryError::rejected)?;
        Ok(tables.store_plan(plan))
    }

    async fn cancel(
        &self,
        id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<Confession, ConfessionRepositoryError> {
        self.transition(id, now, plan_cancellation)
    }

    async fn complete(
        &self,
        id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<Confession, ConfessionRepositoryError> {
        self.transition(id, now, plan_completion)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Confession>, ConfessionRepositoryError> {
        Ok(self.tables().confessions.get(&id).cloned())
    }

    async fn list_for_faithful(
        &self,
        faithful_id: UserId,
    ) -> Result<Vec<Confession>, ConfessionRepositoryError> {
        let mut mine: Vec<Confession> = self
            .tables()
            .confessions
            .values()
            .filter(|confession| confession.faithful_id() == faithful_id)
            .cloned()
            .collect();
        mine.sort_by_key(|confession| std::cmp::Reverse(confession.scheduled_time()));
        Ok(mine)
    }

    async fn list_for_priest(
        &self,
        priest_id: UserId,
        status: Option<ConfessionStatus>,
    ) -> Result<Vec<Confession>, ConfessionRepositoryError> {
        let mut theirs: Vec<Confession> = self
            .tables()
            .confessions
            .values()
            .filter(|confession| confession.priest_id() == priest_id)
            .filter(|confession| status.is_none_or(|wanted| confession.status() == wanted))
            .cloned()
            .collect();
        theirs.sort_by_key(Confession::scheduled_time);
        Ok(theirs)
    }
}

/// Directory, invite and request ports the booking flow never reaches.
#[derive(Debug, Clone, Copy)]
pub struct Unplugged;

const UNPLUGGED: &str = "not wired in this test";

#[async_trait]
impl DioceseRepository for Unplugged {
    async fn create(&self, _diocese: &Diocese) -> Result<(), DioceseRepositoryError> {
        Err(DioceseRepositoryError::connection(UNPLUGGED))
    }

    async fn find_by_id(&self, _id: Uuid) -> Result<Option<Diocese>, DioceseRepositoryError> {
        Err(DioceseRepositoryError::connection(UNPLUGGED))
    }

    async fn list_active(&self) -> Result<Vec<Diocese>, DioceseRepositoryError> {
        Err(DioceseRepositoryError::connection(UNPLUGGED))
    }

    async fn save(&self, _diocese: &Diocese) -> Result<(), DioceseRepositoryError> {
        Err(DioceseRepositoryError::connection(UNPLUGGED))
    }

    async fn release_bishop(
        &self,
        _bishop_id: UserId,
        _keep: Option<Uuid>,
        _now: DateTime<Utc>,
    ) -> Result<(), DioceseRepositoryError> {
        Err(DioceseRepositoryError::connection(UNPLUGGED))
    }
}

#[async_trait]
impl ParishRepository for Unplugged {
    async fn create(&self, _parish: &Parish) -> Result<(), ParishRepositoryError> {
        Err(ParishRepositoryError::connection(UNPLUGGED))
    }

    async fn find_by_id(&self, _id: Uuid) -> Result<Option<Parish>, ParishRepositoryError> {
        Err(ParishRepositoryError::connection(UNPLUGGED))
    }

    async fn list_active(
        &self,
        _diocese_id: Option<Uuid>,
    ) -> Result<Vec<Parish>, ParishRepositoryError> {
        Err(ParishRepositoryError::connection(UNPLUGGED))
    }

    async fn count_active_in_diocese(
        &self,
        _diocese_id: Uuid,
    ) -> Result<u64, ParishRepositoryError> {
        Err(ParishRepositoryError::connection(UNPLUGGED))
    }

    async fn save(&self, _parish: &Parish) -> Result<(), ParishRepositoryError> {
        Err(ParishRepositoryError::connection(UNPLUGGED))
    }
}

#[async_trait]
impl InviteRepository for Unplugged {
    async fn create(&self, _invite: &Invite) -> Result<(), InviteRepositoryError> {
        Err(InviteRepositoryError::connection(UNPLUGGED))
    }

    async fn find_by_id(&self, _id: Uuid) -> Result<Option<Invite>, InviteRepositoryError> {
        Err(InviteRepositoryError::connection(UNPLUGGED))
    }

    async fn find_by_digest(
        &self,
        _digest: &str,
    ) -> Result<Option<Invite>, InviteRepositoryError> {
        Err(InviteRepositoryError::connection(UNPLUGGED))
    }

    async fn list(
        &self,
        _invited_by: Option<UserId>,
    ) -> Result<Vec<Invite>, InviteRepositoryError> {
        Err(InviteRepositoryError::connection(UNPLUGGED))
    }

    async fn transition(
        &self,
        _id: Uuid,
        _from: InviteStatus,
        _to: InviteStatus,
    ) -> Result<bool, InviteRepositoryError> {
        Err(InviteRepositoryError::connection(UNPLUGGED))
    }

    async fn accept(&self, _grant: &InviteGrant) -> Result<bool, InviteRepositoryError> {
        Err(InviteRepositoryError::connection(UNPLUGGED))
    }

    async fn register(
        &self,
        _grant: &InviteGrant,
        _password_hash: &str,
    ) -> Result<bool, InviteRepositoryError> {
        Err(InviteRepositoryError::connection(UNPLUGGED))
    }
}

#[async_trait]
impl PriestRequestRepository for Unplugged {
    async fn create(
        &self,
        _request: &PriestParishRequest,
    ) -> Result<(), PriestRequestRepositoryError> {
        Err(PriestRequestRepositoryError::connection(UNPLUGGED))
    }

    async fn find_by_id(
        &self,
        _id: Uuid,
    ) -> Result<Option<PriestParishRequest>, PriestRequestRepositoryError> {
        Err(PriestRequestRepositoryError::connection(UNPLUGGED))
    }

    async fn list(
        &self,
        _scope: RequestScope,
        _status: Option<RequestStatus>,
    ) -> Result<Vec<PriestParishRequest>, PriestRequestRepositoryError> {
        Err(PriestRequestRepositoryError::connection(UNPLUGGED))
    }

    async fn reject(
        &self,
        _request: &PriestParishRequest,
    ) -> Result<bool, PriestRequestRepositoryError> {
        Err(PriestRequestRepositoryError::connection(UNPLUGGED))
    }

    async fn accept(
        &self,
        _acceptance: &RequestAcceptance,
    ) -> Result<bool, PriestRequestRepositoryError> {
        Err(PriestRequestRepositoryError::connection(UNPLUGGED))
    }

    async fn history(
        &self,
        _priest_id: UserId,
    ) -> Result<Vec<PriestParishHistory>, PriestRequestRepositoryError> {
        Err(PriestRequestRepositoryError::connection(UNPLUGGED))
    }
}
