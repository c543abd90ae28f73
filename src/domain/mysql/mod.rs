pub mod authfile;

use async_trait::async_trait;
use std::path::Path;
use std::sync::Arc;
use tempfile::NamedTempFile;
use tracing::debug;

use crate::domain::factory::{Engine, EngineKind};
use crate::error::BackupError;
use crate::services::config::{BackupSettings, ConnectionProfile};
use crate::utils::text::shell_quote;

/// MySQL driver backed by `mysqldump` / `mysql`.
///
/// Credentials travel through a transient defaults-file written by the
/// before-hooks; the command line carries only the binary, the
/// `--defaults-extra-file` path, an optional port and the database name.
/// At most one auth handle is live per engine instance.
pub struct MySqlEngine {
    profile: ConnectionProfile,
    settings: Arc<BackupSettings>,
    auth: Option<NamedTempFile>,
}

impl MySqlEngine {
    pub fn new(profile: ConnectionProfile, settings: Arc<BackupSettings>) -> Self {
        Self {
            profile,
            settings,
            auth: None,
        }
    }

    fn auth_path(&self) -> Result<&Path, BackupError> {
        self.auth
            .as_ref()
            .map(|file| file.path())
            .ok_or_else(|| {
                BackupError::Io(std::io::Error::other("mysql auth file not initialized"))
            })
    }

    fn client_command(&self, binary: &str) -> Result<String, BackupError> {
        let bin = self.settings.binaries.locate(binary)?;
        let auth = self.auth_path()?;
        let mut command = format!(
            "{} --defaults-extra-file={}",
            shell_quote(&bin.to_string_lossy()),
            shell_quote(&auth.to_string_lossy())
        );
        if let Some(port) = self.profile.port {
            command.push_str(&format!(" --port={port}"));
        }
        command.push(' ');
        command.push_str(&shell_quote(&self.profile.database));
        Ok(command)
    }
}

#[async_trait]
impl Engine for MySqlEngine {
    fn kind(&self) -> EngineKind {
        EngineKind::MySql
    }

    async fn before_export(&mut self) -> Result<bool, BackupError> {
        self.auth = Some(authfile::write(authfile::EXPORT_TEMPLATE, &self.profile)?);
        debug!("Wrote mysqldump auth file for {}", self.profile.name);
        Ok(true)
    }

    async fn before_import(&mut self) -> Result<bool, BackupError> {
        self.auth = Some(authfile::write(authfile::IMPORT_TEMPLATE, &self.profile)?);
        debug!("Wrote mysql client auth file for {}", self.profile.name);
        Ok(true)
    }

    fn base_export_command(&self) -> Result<String, BackupError> {
        self.client_command("mysqldump")
    }

    fn base_import_command(&self) -> Result<String, BackupError> {
        self.client_command("mysql")
    }

    fn discard_credentials(&mut self) {
        // NamedTempFile unlinks on drop; taking an empty slot is a no-op
        self.auth.take();
    }
}
