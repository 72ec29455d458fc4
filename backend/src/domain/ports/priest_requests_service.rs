//! Driving port for priest parish requests.

use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::{
    Actor, Error, PriestParishHistory, PriestParishRequest, RequestStatus, UserId,
};

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PriestRequestsService: Send + Sync {
    async fn create(
        &self,
        actor: &Actor,
        parish_id: Uuid,
        message: Option<String>,
    ) -> Result<PriestParishRequest, Error>;

    async fn list(
        &self,
        actor: &Actor,
        status: Option<RequestStatus>,
    ) -> Result<Vec<PriestParishRequest>, Error>;

    async fn accept(&self, actor: &Actor, id: Uuid) -> Result<PriestParishRequest, Error>;

    async fn reject(&self, actor: &Actor, id: Uuid) -> Result<PriestParishRequest, Error>;

    async fn history(
        &self,
        actor: &Actor,
        priest_id: UserId,
    ) -> Result<Vec<PriestParishHistory>, Error>;
}
