//! Port for checking that backing services can take traffic.

use async_trait::async_trait;

use super::define_port_error;

define_port_error! {
    /// Failure reported by a readiness probe.
    pub enum ReadinessProbeError ("database") {}
}

/// Cheap round trip to a dependency the API cannot serve without.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ReadinessProbe: Send + Sync {
    async fn check(&self) -> Result<(), ReadinessProbeError>;
}
