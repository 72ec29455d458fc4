//! Internal Diesel row structs and their conversions to domain entities.
//!
//! Rows never leave the persistence layer. Conversions back into the domain
//! re-run entity validation, so a row that violates a domain rule surfaces
//! as a query error instead of a half-valid entity.

use std::str::FromStr;

use chrono::{DateTime, Utc};
use diesel::prelude::*;
use uuid::Uuid;

use crate::domain::scheduling::{
    BookingTarget, Confession, ConfessionBand, ConfessionBandDraft, ConfessionDraft,
    ConfessionSlot, ConfessionSlotDraft, TimeWindow,
};
use crate::domain::{
    Diocese, DioceseDraft, Email, GeoPoint, Invite, InviteDraft, Parish, ParishDraft, PersonName,
    PriestParishHistory, PriestParishRequest, PriestParishRequestDraft, User, UserDraft, UserId,
};

use super::schema::{
    confession_bands, confession_slots, confessions, dioceses, invites, parishes,
    priest_parish_history, priest_parish_requests, users,
};

fn parse_column<T>(value: &str, column: &'static str) -> Result<T, String>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    value
        .parse()
        .map_err(|err| format!("invalid {column} column: {err}"))
}

fn invalid_row(table: &'static str, id: Uuid, err: impl std::fmt::Display) -> String {
    format!("stored {table} row {id} is invalid: {err}")
}

/// Domain counts are `u32`; the columns are `INTEGER` with CHECK constraints.
pub(crate) fn count_from_db(value: i32, column: &'static str) -> Result<u32, String> {
    u32::try_from(value).map_err(|_| format!("negative {column} column: {value}"))
}

pub(crate) fn count_to_db(value: u32) -> i32 {
    i32::try_from(value).unwrap_or(i32::MAX)
}

// ---------------------------------------------------------------------------
// Users
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = users)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct UserRow {
    pub id: Uuid,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub phone: Option<String>,
    pub role: String,
    pub diocese_id: Option<Uuid>,
    pub parish_id: Option<Uuid>,
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl UserRow {
    pub(crate) fn into_domain(self) -> Result<User, String> {
        let id = self.id;
        let invalid = |err: crate::domain::UserValidationError| invalid_row("users", id, err);
        User::new(UserDraft {
            id: UserId::from_uuid(self.id),
            email: Email::new(&self.email).map_err(invalid)?,
            first_name: PersonName::new(&self.first_name, "firstName").map_err(invalid)?,
            last_name: PersonName::new(&self.last_name, "lastName").map_err(invalid)?,
            phone: self.phone,
            role: parse_column(&self.role, "users.role")?,
            diocese_id: self.diocese_id,
            parish_id: self.parish_id,
            active: self.active,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
        .map_err(invalid)
    }
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = users)]
pub(crate) struct NewUserRow<'a> {
    pub id: Uuid,
    pub email: &'a str,
    pub password_hash: &'a str,
    pub first_name: &'a str,
    pub last_name: &'a str,
    pub phone: Option<&'a str>,
    pub role: &'a str,
    pub diocese_id: Option<Uuid>,
    pub parish_id: Option<Uuid>,
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl<'a> NewUserRow<'a> {
    pub(crate) fn new(user: &'a User, password_hash: &'a str) -> Self {
        Self {
            id: *user.id().as_uuid(),
            email: user.email().as_ref(),
            password_hash,
            first_name: user.first_name(),
            last_name: user.last_name(),
            phone: user.phone(),
            role: user.role().as_str(),
            diocese_id: user.diocese_id(),
            parish_id: user.parish_id(),
            active: user.is_active(),
            created_at: user.created_at(),
            updated_at: user.updated_at(),
        }
    }
}

/// Every mutable user column; `None` clears nullable ones.
#[derive(Debug, Clone, AsChangeset)]
#[diesel(table_name = users)]
#[diesel(treat_none_as_null = true)]
pub(crate) struct UserUpdate<'a> {
    pub first_name: &'a str,
    pub last_name: &'a str,
    pub phone: Option<&'a str>,
    pub role: &'a str,
    pub diocese_id: Option<Uuid>,
    pub parish_id: Option<Uuid>,
    pub active: bool,
    pub updated_at: DateTime<Utc>,
}

impl<'a> From<&'a User> for UserUpdate<'a> {
    fn from(user: &'a User) -> Self {
        Self {
            first_name: user.first_name(),
            last_name: user.last_name(),
            phone: user.phone(),
            role: user.role().as_str(),
            diocese_id: user.diocese_id(),
            parish_id: user.parish_id(),
            active: user.is_active(),
            updated_at: user.updated_at(),
        }
    }
}

// ---------------------------------------------------------------------------
// Dioceses and parishes
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Queryable, Selectable, Insertable)]
#[diesel(table_name = dioceses)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct DioceseRow {
    pub id: Uuid,
    pub name: String,
    pub bishop_id: Option<Uuid>,
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl DioceseRow {
    pub(crate) fn into_domain(self) -> Result<Diocese, String> {
        let id = self.id;
        Diocese::new(DioceseDraft {
            id: self.id,
            name: self.name,
            bishop_id: self.bishop_id.map(UserId::from_uuid),
            active: self.active,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
        .map_err(|err| invalid_row("dioceses", id, err))
    }
}

impl From<&Diocese> for DioceseRow {
    fn from(diocese: &Diocese) -> Self {
        Self {
            id: diocese.id(),
            name: diocese.name().to_owned(),
            bishop_id: diocese.bishop_id().map(|id| *id.as_uuid()),
            active: diocese.is_active(),
            created_at: diocese.created_at(),
            updated_at: diocese.updated_at(),
        }
    }
}

#[derive(Debug, Clone, AsChangeset)]
#[diesel(table_name = dioceses)]
#[diesel(treat_none_as_null = true)]
pub(crate) struct DioceseUpdate<'a> {
    pub name: &'a str,
    pub bishop_id: Option<Uuid>,
    pub active: bool,
    pub updated_at: DateTime<Utc>,
}

impl<'a> From<&'a Diocese> for DioceseUpdate<'a> {
    fn from(diocese: &'a Diocese) -> Self {
        Self {
            name: diocese.name(),
            bishop_id: diocese.bishop_id().map(|id| *id.as_uuid()),
            active: diocese.is_active(),
            updated_at: diocese.updated_at(),
        }
    }
}

#[derive(Debug, Clone, Queryable, Selectable, Insertable)]
#[diesel(table_name = parishes)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct ParishRow {
    pub id: Uuid,
    pub diocese_id: Uuid,
    pub name: String,
    pub address: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ParishRow {
    pub(crate) fn into_domain(self) -> Result<Parish, String> {
        let id = self.id;
        let invalid = |err| invalid_row("parishes", id, err);
        Parish::new(ParishDraft {
            id: self.id,
            diocese_id: self.diocese_id,
            name: self.name,
            address: self.address,
            location: GeoPoint::from_parts(self.latitude, self.longitude).map_err(invalid)?,
            active: self.active,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
        .map_err(invalid)
    }
}

impl From<&Parish> for ParishRow {
    fn from(parish: &Parish) -> Self {
        Self {
            id: parish.id(),
            diocese_id: parish.diocese_id(),
            name: parish.name().to_owned(),
            address: parish.address().map(str::to_owned),
            latitude: parish.location().map(|point| point.latitude()),
            longitude: parish.location().map(|point| point.longitude()),
            active: parish.is_active(),
            created_at: parish.created_at(),
            updated_at: parish.updated_at(),
        }
    }
}

#[derive(Debug, Clone, AsChangeset)]
#[diesel(table_name = parishes)]
#[diesel(treat_none_as_null = true)]
pub(crate) struct ParishUpdate {
    pub name: String,
    pub address: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub active: bool,
    pub updated_at: DateTime<Utc>,
}

impl From<ParishRow> for ParishUpdate {
    fn from(row: ParishRow) -> Self {
        Self {
            name: row.name,
            address: row.address,
            latitude: row.latitude,
            longitude: row.longitude,
            active: row.active,
            updated_at: row.updated_at,
        }
    }
}

// ---------------------------------------------------------------------------
// Invites
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Queryable, Selectable, Insertable)]
#[diesel(table_name = invites)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct InviteRow {
    pub id: Uuid,
    pub token_digest: String,
    pub email: String,
    pub role: String,
    pub parish_id: Option<Uuid>,
    pub diocese_id: Option<Uuid>,
    pub invited_by: Uuid,
    pub status: String,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl InviteRow {
    pub(crate) fn into_domain(self) -> Result<Invite, String> {
        let id = self.id;
        Invite::new(InviteDraft {
            id: self.id,
            token_digest: self.token_digest,
            email: Email::new(&self.email).map_err(|err| invalid_row("invites", id, err))?,
            role: parse_column(&self.role, "invites.role")?,
            parish_id: self.parish_id,
            diocese_id: self.diocese_id,
            invited_by: UserId::from_uuid(self.invited_by),
            status: parse_column(&self.status, "invites.status")?,
            expires_at: self.expires_at,
            created_at: self.created_at,
        })
        .map_err(|err| invalid_row("invites", id, err))
    }
}

impl From<&Invite> for InviteRow {
    fn from(invite: &Invite) -> Self {
        Self {
            id: invite.id(),
            token_digest: invite.token_digest().to_owned(),
            email: invite.email().as_ref().to_owned(),
            role: invite.role().as_str().to_owned(),
            parish_id: invite.parish_id(),
            diocese_id: invite.diocese_id(),
            invited_by: *invite.invited_by().as_uuid(),
            status: invite.status().as_str().to_owned(),
            expires_at: invite.expires_at(),
            created_at: invite.created_at(),
        }
    }
}

// ---------------------------------------------------------------------------
// Priest requests and history
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Queryable, Selectable, Insertable)]
#[diesel(table_name = priest_parish_requests)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct PriestRequestRow {
    pub id: Uuid,
    pub priest_id: Uuid,
    pub parish_id: Uuid,
    pub message: Option<String>,
    pub status: String,
    pub reviewed_by: Option<Uuid>,
    pub reviewed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl PriestRequestRow {
    pub(crate) fn into_domain(self) -> Result<PriestParishRequest, String> {
        let id = self.id;
        PriestParishRequest::new(PriestParishRequestDraft {
            id: self.id,
            priest_id: UserId::from_uuid(self.priest_id),
            parish_id: self.parish_id,
            message: self.message,
            status: parse_column(&self.status, "priest_parish_requests.status")?,
            reviewed_by: self.reviewed_by.map(UserId::from_uuid),
            reviewed_at: self.reviewed_at,
            created_at: self.created_at,
        })
        .map_err(|err| invalid_row("priest_parish_requests", id, err))
    }
}

impl From<&PriestParishRequest> for PriestRequestRow {
    fn from(request: &PriestParishRequest) -> Self {
        Self {
            id: request.id(),
            priest_id: *request.priest_id().as_uuid(),
            parish_id: request.parish_id(),
            message: request.message().map(str::to_owned),
            status: request.status().as_str().to_owned(),
            reviewed_by: request.reviewed_by().map(|id| *id.as_uuid()),
            reviewed_at: request.reviewed_at(),
            created_at: request.created_at(),
        }
    }
}

#[derive(Debug, Clone, Queryable, Selectable, Insertable)]
#[diesel(table_name = priest_parish_history)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct HistoryRow {
    pub id: Uuid,
    pub priest_id: Uuid,
    pub parish_id: Uuid,
    pub start_date: DateTime<Utc>,
    pub end_date: Option<DateTime<Utc>>,
    pub active: bool,
}

impl From<HistoryRow> for PriestParishHistory {
    fn from(row: HistoryRow) -> Self {
        Self::restore(
            row.id,
            UserId::from_uuid(row.priest_id),
            row.parish_id,
            row.start_date,
            row.end_date,
            row.active,
        )
    }
}

impl From<&PriestParishHistory> for HistoryRow {
    fn from(entry: &PriestParishHistory) -> Self {
        Self {
            id: entry.id(),
            priest_id: *entry.priest_id().as_uuid(),
            parish_id: entry.parish_id(),
            start_date: entry.start_date(),
            end_date: entry.end_date(),
            active: entry.is_active(),
        }
    }
}

// ---------------------------------------------------------------------------
// Scheduling
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Queryable, Selectable, Insertable, AsChangeset)]
#[diesel(table_name = confession_slots)]
#[diesel(check_for_backend(diesel::pg::Pg))]
#[diesel(treat_none_as_null = true)]
pub(crate) struct SlotRow {
    pub id: Uuid,
    pub priest_id: Uuid,
    pub parish_id: Uuid,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub status: String,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl SlotRow {
    pub(crate) fn into_domain(self) -> Result<ConfessionSlot, String> {
        let id = self.id;
        let invalid = |err| invalid_row("confession_slots", id, err);
        ConfessionSlot::new(ConfessionSlotDraft {
            id: self.id,
            priest_id: UserId::from_uuid(self.priest_id),
            parish_id: self.parish_id,
            window: TimeWindow::new(self.start_time, self.end_time).map_err(invalid)?,
            status: parse_column(&self.status, "confession_slots.status")?,
            notes: self.notes,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
        .map_err(invalid)
    }
}

impl From<&ConfessionSlot> for SlotRow {
    fn from(slot: &ConfessionSlot) -> Self {
        Self {
            id: slot.id(),
            priest_id: *slot.priest_id().as_uuid(),
            parish_id: slot.parish_id(),
            start_time: slot.start_time(),
            end_time: slot.end_time(),
            status: slot.status().as_str().to_owned(),
            notes: slot.notes().map(str::to_owned),
            created_at: slot.created_at(),
            updated_at: slot.updated_at(),
        }
    }
}

#[derive(Debug, Clone, Queryable, Selectable, Insertable, AsChangeset)]
#[diesel(table_name = confession_bands)]
#[diesel(check_for_backend(diesel::pg::Pg))]
#[diesel(treat_none_as_null = true)]
pub(crate) struct BandRow {
    pub id: Uuid,
    pub priest_id: Uuid,
    pub parish_id: Uuid,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub capacity: i32,
    pub booked_count: i32,
    pub status: String,
    pub recurrence: String,
    pub recurrence_until: Option<DateTime<Utc>>,
    pub series_id: Option<Uuid>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl BandRow {
    pub(crate) fn into_domain(self) -> Result<ConfessionBand, String> {
        let id = self.id;
        let invalid = |err| invalid_row("confession_bands", id, err);
        ConfessionBand::new(ConfessionBandDraft {
            id: self.id,
            priest_id: UserId::from_uuid(self.priest_id),
            parish_id: self.parish_id,
            window: TimeWindow::new(self.start_time, self.end_time).map_err(invalid)?,
            capacity: count_from_db(self.capacity, "confession_bands.capacity")?,
            booked_count: count_from_db(self.booked_count, "confession_bands.booked_count")?,
            status: parse_column(&self.status, "confession_bands.status")?,
            recurrence: parse_column(&self.recurrence, "confession_bands.recurrence")?,
            recurrence_until: self.recurrence_until,
            series_id: self.series_id,
            notes: self.notes,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
        .map_err(invalid)
    }
}

impl From<&ConfessionBand> for BandRow {
    fn from(band: &ConfessionBand) -> Self {
        Self {
            id: band.id(),
            priest_id: *band.priest_id().as_uuid(),
            parish_id: band.parish_id(),
            start_time: band.start_time(),
            end_time: band.end_time(),
            capacity: count_to_db(band.capacity()),
            booked_count: count_to_db(band.booked_count()),
            status: band.status().as_str().to_owned(),
            recurrence: band.recurrence().as_str().to_owned(),
            recurrence_until: band.recurrence_until(),
            series_id: band.series_id(),
            notes: band.notes().map(str::to_owned),
            created_at: band.created_at(),
            updated_at: band.updated_at(),
        }
    }
}

#[derive(Debug, Clone, Queryable, Selectable, Insertable)]
#[diesel(table_name = confessions)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct ConfessionRow {
    pub id: Uuid,
    pub faithful_id: Uuid,
    pub priest_id: Uuid,
    pub slot_id: Option<Uuid>,
    pub band_id: Option<Uuid>,
    pub scheduled_time: DateTime<Utc>,
    pub status: String,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ConfessionRow {
    pub(crate) fn into_domain(self) -> Result<Confession, String> {
        let id = self.id;
        let invalid = |err| invalid_row("confessions", id, err);
        Confession::new(ConfessionDraft {
            id: self.id,
            faithful_id: UserId::from_uuid(self.faithful_id),
            priest_id: UserId::from_uuid(self.priest_id),
            target: BookingTarget::from_parts(self.slot_id, self.band_id).map_err(invalid)?,
            scheduled_time: self.scheduled_time,
            status: parse_column(&self.status, "confessions.status")?,
            notes: self.notes,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
        .map_err(invalid)
    }
}

impl From<&Confession> for ConfessionRow {
    fn from(confession: &Confession) -> Self {
        let target = confession.target();
        Self {
            id: confession.id(),
            faithful_id: *confession.faithful_id().as_uuid(),
            priest_id: *confession.priest_id().as_uuid(),
            slot_id: target.slot_id(),
            band_id: target.band_id(),
            scheduled_time: confession.scheduled_time(),
            status: confession.status().as_str().to_owned(),
            notes: confession.notes().map(str::to_owned),
            created_at: confession.created_at(),
            updated_at: confession.updated_at(),
        }
    }
}
