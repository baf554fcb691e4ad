//! Identity updater configuration loaded via OrthoConfig.
//!
//! Values come from CLI arguments, `USERS_UPDATER_*` environment variables
//! and configuration files, and are turned into explicit construction-time
//! parameters for the coordinator and the persistence adapters.

use std::time::Duration;

use ortho_config::OrthoConfig;
use serde::Deserialize;

use crate::domain::{DEFAULT_UPDATE_TIMEOUT, UsersUpdaterConfig};
use crate::outbound::persistence::PoolConfig;

/// Configuration for the identity update coordinator and its adapters.
#[derive(Debug, Clone, Deserialize, OrthoConfig)]
#[ortho_config(prefix = "USERS_UPDATER")]
pub struct UsersUpdaterSettings {
    /// Ledger network version whose blocks lock a graffiti.
    #[ortho_config(default = 0)]
    pub network_version: i32,
    /// Default per-update deadline in milliseconds.
    pub timeout_ms: Option<u64>,
    /// PostgreSQL connection string.
    pub database_url: Option<String>,
    /// Optional cap on pooled database connections.
    pub pool_max_size: Option<u32>,
}

impl UsersUpdaterSettings {
    /// Deadline applied to updates without an explicit one.
    pub fn update_timeout(&self) -> Duration {
        self.timeout_ms
            .map(Duration::from_millis)
            .unwrap_or(DEFAULT_UPDATE_TIMEOUT)
    }

    /// Coordinator settings derived from this configuration.
    pub fn updater_config(&self) -> UsersUpdaterConfig {
        UsersUpdaterConfig::new(self.update_timeout())
    }

    /// Pool settings, when a database URL is configured.
    pub fn pool_config(&self) -> Option<PoolConfig> {
        let config = PoolConfig::new(self.database_url.as_deref()?);
        Some(match self.pool_max_size {
            Some(max_size) => config.with_max_size(max_size),
            None => config,
        })
    }
}
