use async_trait::async_trait;
use serde::Deserialize;
use std::fmt;
use std::sync::Arc;

use crate::domain::driver::Driver;
use crate::domain::mysql::MySqlEngine;
use crate::domain::postgres::PostgresEngine;
use crate::domain::sqlite::SqliteEngine;
use crate::error::BackupError;
use crate::services::config::{BackupSettings, ConnectionProfile};

/// Supported database engines, resolved from a connection profile's
/// `type` field. Dispatch happens once, at driver construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EngineKind {
    MySql,
    PostgreSql,
    Sqlite,
}

impl fmt::Display for EngineKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            EngineKind::MySql => "mysql",
            EngineKind::PostgreSql => "postgresql",
            EngineKind::Sqlite => "sqlite",
        };
        f.write_str(name)
    }
}

/// Per-engine command construction and lifecycle hooks.
///
/// The four hooks are overridable with no-op defaults; the `before_*`
/// pair may veto the operation by returning `Ok(false)`. Engines that
/// allocate transient credential material do so in their before-hooks
/// and release it in [`Engine::discard_credentials`], which the driver
/// calls on every exit path.
#[async_trait]
pub trait Engine: Send {
    fn kind(&self) -> EngineKind;

    async fn before_export(&mut self) -> Result<bool, BackupError> {
        Ok(true)
    }

    async fn after_export(&mut self) -> Result<(), BackupError> {
        Ok(())
    }

    async fn before_import(&mut self) -> Result<bool, BackupError> {
        Ok(true)
    }

    async fn after_import(&mut self) -> Result<(), BackupError> {
        Ok(())
    }

    /// Renders the escaped base dump invocation, without compression or
    /// redirection.
    fn base_export_command(&self) -> Result<String, BackupError>;

    /// Renders the escaped base restore invocation.
    fn base_import_command(&self) -> Result<String, BackupError>;

    /// Extra environment for the spawned pipeline (e.g. `PGPASSWORD`).
    fn command_env(&self) -> Vec<(String, String)> {
        Vec::new()
    }

    /// Drops transient credential material. Idempotent; the driver calls
    /// this whether the operation succeeded, failed or was vetoed.
    fn discard_credentials(&mut self) {}
}

/// Builds the driver for a profile's engine.
pub fn create(profile: ConnectionProfile, settings: Arc<BackupSettings>) -> Driver {
    let engine: Box<dyn Engine> = match profile.driver {
        EngineKind::MySql => Box::new(MySqlEngine::new(profile, settings.clone())),
        EngineKind::PostgreSql => Box::new(PostgresEngine::new(profile, settings.clone())),
        EngineKind::Sqlite => Box::new(SqliteEngine::new(profile, settings.clone())),
    };
    Driver::new(engine, settings)
}
