//! Port for parish persistence.

use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::Parish;

use super::define_port_error;

define_port_error! {
    /// Persistence errors raised by parish repository adapters.
    pub enum ParishRepositoryError ("parish repository") {}
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ParishRepository: Send + Sync {
    async fn create(&self, parish: &Parish) -> Result<(), ParishRepositoryError>;

    /// Fetch a parish, including soft-deleted rows.
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Parish>, ParishRepositoryError>;

    /// Active parishes ordered by name, optionally within one diocese.
    async fn list_active(
        &self,
        diocese_id: Option<Uuid>,
    ) -> Result<Vec<Parish>, ParishRepositoryError>;

    /// Number of active parishes in a diocese.
    async fn count_active_in_diocese(&self, diocese_id: Uuid)
    -> Result<u64, ParishRepositoryError>;

    async fn save(&self, parish: &Parish) -> Result<(), ParishRepositoryError>;
}
