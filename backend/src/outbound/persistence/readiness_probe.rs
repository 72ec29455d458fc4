//! Database readiness probe backing `/health/ready`.

use async_trait::async_trait;
use diesel_async::RunQueryDsl;

use crate::domain::ports::{ReadinessProbe, ReadinessProbeError};

use super::diesel_helpers::map_pool_error;
use super::pool::DbPool;

#[derive(Clone)]
pub struct DieselReadinessProbe {
    pool: DbPool,
}

impl DieselReadinessProbe {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ReadinessProbe for DieselReadinessProbe {
    async fn check(&self) -> Result<(), ReadinessProbeError> {
        let mut conn = self
            .pool
            .get()
            .await
            .map_err(|err| map_pool_error(err, ReadinessProbeError::connection))?;
        diesel::sql_query("SELECT 1")
            .execute(&mut conn)
            .await
            .map(|_| ())
            .map_err(|err| ReadinessProbeError::connection(err.to_string()))
    }
}
