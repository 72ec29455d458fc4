//! Embedded PostgreSQL for repository integration suites.
//!
//! Every test gets its own database on one shared cluster, migrated with the
//! same embedded migrations the server applies at startup. Set
//! `SKIP_TEST_CLUSTER=1` where the cluster cannot start.

use std::time::Duration;

use confesapp::outbound::persistence::{DbPool, PoolConfig, run_migrations};
use pg_embedded_setup_unpriv::{ClusterHandle, TemporaryDatabase};
use tokio::runtime::Runtime;
use uuid::Uuid;

const CLUSTER_RETRIES: usize = 5;
const CLUSTER_RETRY_DELAY: Duration = Duration::from_millis(500);

/// Migrated database with a pool bound to it.
///
/// Fields drop in order, so connections close before the database goes.
pub struct MigratedDatabase {
    pub pool: DbPool,
    pub runtime: Runtime,
    _database: TemporaryDatabase,
}

impl MigratedDatabase {
    /// Run `future` to completion on the suite's runtime.
    pub fn block_on<F: std::future::Future>(&self, future: F) -> F::Output {
        self.runtime.block_on(future)
    }
}

fn shared_cluster() -> Result<&'static ClusterHandle, String> {
    let mut last_error = String::new();
    for attempt in 1..=CLUSTER_RETRIES {
        match pg_embedded_setup_unpriv::test_support::shared_cluster_handle() {
            Ok(handle) => return Ok(handle),
            Err(error) => {
                last_error = format!("cluster: attempt {attempt}/{CLUSTER_RETRIES}: {error:?}");
            }
        }
        if attempt < CLUSTER_RETRIES {
            std::thread::sleep(CLUSTER_RETRY_DELAY);
        }
    }
    Err(last_error)
}

/// Provision a fresh database and apply all migrations to it.
pub fn migrated_database() -> Result<MigratedDatabase, String> {
    let runtime = Runtime::new().map_err(|err| err.to_string())?;
    let cluster = shared_cluster()?;
    let name = format!("confesapp_test_{}", Uuid::new_v4().simple());
    let database = cluster
        .temporary_database(name.as_str())
        .map_err(|err| format!("create database {name}: {err:?}"))?;
    let url = database.url().to_string();

    let pool = runtime.block_on(async {
        run_migrations(url.as_str())
            .await
            .map_err(|err| format!("migrations: {err}"))?;
        let config = PoolConfig::new(url.as_str())
            .with_max_size(4)
            .with_min_idle(Some(1));
        DbPool::new(config).await.map_err(|err| err.to_string())
    })?;

    Ok(MigratedDatabase {
        pool,
        runtime,
        _database: database,
    })
}

/// True when `SKIP_TEST_CLUSTER` is "1", "true" or "yes" (any case).
pub fn should_skip_test_cluster() -> bool {
    std::env::var("SKIP_TEST_CLUSTER")
        .map(|value| matches!(value.to_lowercase().as_str(), "1" | "true" | "yes"))
        .unwrap_or(false)
}

/// Skip marker when `SKIP_TEST_CLUSTER` is set; panic otherwise.
pub fn handle_cluster_setup_failure<T>(reason: impl std::fmt::Display) -> Option<T> {
    if should_skip_test_cluster() {
        eprintln!("SKIP-TEST-CLUSTER: {reason}");
        None
    } else {
        panic!("Test cluster setup failed: {reason}. Set SKIP_TEST_CLUSTER=1 to skip.");
    }
}
