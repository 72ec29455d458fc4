//! Domain ports and supporting types for the hexagonal boundary.
//!
//! Driven ports (`*Repository`, [`PasswordHasher`]) are implemented by
//! outbound adapters. Driving ports (`*Service`) are implemented by the
//! domain services and called by inbound adapters.

mod macros;
pub(crate) use macros::define_port_error;

mod account_service;
mod confession_band_repository;
mod confession_repository;
mod confession_slot_repository;
mod diocese_repository;
mod directory_service;
mod invite_repository;
mod invites_service;
mod parish_repository;
mod password_hasher;
mod priest_request_repository;
mod priest_requests_service;
mod readiness_probe;
mod schedule_filter;
mod scheduling_service;
mod user_repository;
mod users_service;

#[cfg(test)]
pub use account_service::MockAccountService;
pub use account_service::{AccountService, Registration};
#[cfg(test)]
pub use confession_band_repository::MockConfessionBandRepository;
pub use confession_band_repository::{
    BandCancellation, ConfessionBandRepository, ConfessionBandRepositoryError,
};
#[cfg(test)]
pub use confession_repository::MockConfessionRepository;
pub use confession_repository::{ConfessionRepository, ConfessionRepositoryError};
#[cfg(test)]
pub use confession_slot_repository::MockConfessionSlotRepository;
pub use confession_slot_repository::{ConfessionSlotRepository, ConfessionSlotRepositoryError};
#[cfg(test)]
pub use diocese_repository::MockDioceseRepository;
pub use diocese_repository::{DioceseRepository, DioceseRepositoryError};
#[cfg(test)]
pub use directory_service::{MockDiocesesService, MockParishesService};
pub use directory_service::{DiocesesService, NewDiocese, NewParish, ParishesService};
#[cfg(test)]
pub use invite_repository::MockInviteRepository;
pub use invite_repository::{InviteGrant, InviteRepository, InviteRepositoryError};
#[cfg(test)]
pub use invites_service::MockInvitesService;
pub use invites_service::{InviteRegistration, InvitesService, IssuedInvite, NewInvite};
#[cfg(test)]
pub use parish_repository::MockParishRepository;
pub use parish_repository::{ParishRepository, ParishRepositoryError};
#[cfg(test)]
pub use password_hasher::MockPasswordHasher;
pub use password_hasher::{PasswordHashError, PasswordHasher};
#[cfg(test)]
pub use priest_request_repository::MockPriestRequestRepository;
pub use priest_request_repository::{
    PriestRequestRepository, PriestRequestRepositoryError, RequestAcceptance, RequestScope,
};
#[cfg(test)]
pub use priest_requests_service::MockPriestRequestsService;
pub use priest_requests_service::PriestRequestsService;
#[cfg(test)]
pub use readiness_probe::MockReadinessProbe;
pub use readiness_probe::{ReadinessProbe, ReadinessProbeError};
pub use schedule_filter::ScheduleFilter;
#[cfg(test)]
pub use scheduling_service::{
    MockConfessionBandsService, MockConfessionSlotsService, MockConfessionsService,
};
pub use scheduling_service::{
    BookConfession, ConfessionBandsService, ConfessionSlotsService, ConfessionsService,
    NewBandSeries, NewSlot,
};
#[cfg(test)]
pub use user_repository::MockUserRepository;
pub use user_repository::{
    StoredCredentials, UserListFilter, UserRepository, UserRepositoryError, UserScope,
};
#[cfg(test)]
pub use users_service::MockUsersService;
pub use users_service::{RoleAssignment, UsersService};
