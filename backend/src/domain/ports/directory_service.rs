//! Driving ports for dioceses and parishes.

use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::{
    Actor, Diocese, DioceseChanges, Error, GeoPoint, Parish, ParishChanges, UserId,
};

/// Payload for creating a diocese.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewDiocese {
    pub name: String,
    pub bishop_id: Option<UserId>,
}

/// Payload for creating a parish.
#[derive(Debug, Clone, PartialEq)]
pub struct NewParish {
    pub diocese_id: Uuid,
    pub name: String,
    pub address: Option<String>,
    pub location: Option<GeoPoint>,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait DiocesesService: Send + Sync {
    async fn create(&self, actor: &Actor, diocese: NewDiocese) -> Result<Diocese, Error>;

    async fn list(&self, actor: &Actor) -> Result<Vec<Diocese>, Error>;

    async fn get(&self, actor: &Actor, id: Uuid) -> Result<Diocese, Error>;

    async fn update(
        &self,
        actor: &Actor,
        id: Uuid,
        changes: DioceseChanges,
    ) -> Result<Diocese, Error>;

    /// Soft delete; refused while active parishes remain.
    async fn delete(&self, actor: &Actor, id: Uuid) -> Result<(), Error>;
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ParishesService: Send + Sync {
    async fn create(&self, actor: &Actor, parish: NewParish) -> Result<Parish, Error>;

    async fn list(&self, actor: &Actor, diocese_id: Option<Uuid>) -> Result<Vec<Parish>, Error>;

    async fn get(&self, actor: &Actor, id: Uuid) -> Result<Parish, Error>;

    async fn update(
        &self,
        actor: &Actor,
        id: Uuid,
        changes: ParishChanges,
    ) -> Result<Parish, Error>;

    async fn delete(&self, actor: &Actor, id: Uuid) -> Result<(), Error>;
}
