//! Port for diocese persistence.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::{Diocese, UserId};

use super::define_port_error;

define_port_error! {
    /// Persistence errors raised by diocese repository adapters.
    pub enum DioceseRepositoryError ("diocese repository") {}
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait DioceseRepository: Send + Sync {
    async fn create(&self, diocese: &Diocese) -> Result<(), DioceseRepositoryError>;

    /// Fetch a diocese, including soft-deleted rows.
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Diocese>, DioceseRepositoryError>;

    /// Active dioceses ordered by name.
    async fn list_active(&self) -> Result<Vec<Diocese>, DioceseRepositoryError>;

    async fn save(&self, diocese: &Diocese) -> Result<(), DioceseRepositoryError>;

    /// Clear `bishop_id` on every diocese headed by `bishop_id` except `keep`.
    async fn release_bishop(
        &self,
        bishop_id: UserId,
        keep: Option<Uuid>,
        now: DateTime<Utc>,
    ) -> Result<(), DioceseRepositoryError>;
}
