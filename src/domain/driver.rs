use std::path::Path;
use std::sync::Arc;

use tracing::{debug, info};

use crate::domain::command;
use crate::domain::compression::CompressionKind;
use crate::domain::factory::{Engine, EngineKind};
use crate::error::BackupError;
use crate::services::config::BackupSettings;
use crate::utils::process;

/// Executes export/import operations for one engine.
///
/// Owns the operation lifecycle: extension validation, before-hook (which
/// may veto), command composition, subprocess execution, permission fixup
/// and after-hook. Credential material allocated by a before-hook is
/// released on every exit path. One operation at a time per driver; the
/// `&mut self` receivers make concurrent use on a shared instance a
/// compile error rather than a runtime hazard.
pub struct Driver {
    engine: Box<dyn Engine>,
    settings: Arc<BackupSettings>,
}

impl Driver {
    pub fn new(engine: Box<dyn Engine>, settings: Arc<BackupSettings>) -> Self {
        Self { engine, settings }
    }

    pub fn kind(&self) -> EngineKind {
        self.engine.kind()
    }

    /// Dumps the database into `target`.
    ///
    /// Returns `Ok(false)` when the before-hook vetoed the operation: no
    /// command ran, no file was created, the after-hook did not fire.
    pub async fn export(&mut self, target: &Path) -> Result<bool, BackupError> {
        let compression = resolve_target(target)?;
        debug!("Starting {} export to {}", self.kind(), target.display());

        let proceed = match self.engine.before_export().await {
            Ok(proceed) => proceed,
            Err(e) => {
                self.engine.discard_credentials();
                return Err(e);
            }
        };
        if !proceed {
            info!("Export vetoed by before-hook, nothing performed");
            self.engine.discard_credentials();
            return Ok(false);
        }

        let result = self.run_export(target, compression).await;
        self.engine.discard_credentials();
        result?;

        self.engine.after_export().await?;
        info!("Export finished: {}", target.display());
        Ok(true)
    }

    /// Loads the database from `source`, symmetric to [`Driver::export`].
    pub async fn import(&mut self, source: &Path) -> Result<bool, BackupError> {
        let compression = resolve_target(source)?;
        debug!("Starting {} import from {}", self.kind(), source.display());

        let proceed = match self.engine.before_import().await {
            Ok(proceed) => proceed,
            Err(e) => {
                self.engine.discard_credentials();
                return Err(e);
            }
        };
        if !proceed {
            info!("Import vetoed by before-hook, nothing performed");
            self.engine.discard_credentials();
            return Ok(false);
        }

        let result = self.run_import(source, compression).await;
        self.engine.discard_credentials();
        result?;

        self.engine.after_import().await?;
        info!("Import finished: {}", source.display());
        Ok(true)
    }

    async fn run_export(
        &mut self,
        target: &Path,
        compression: CompressionKind,
    ) -> Result<(), BackupError> {
        let base = self.engine.base_export_command()?;
        let compressor = self.compressor_binary(compression)?;
        let command = command::export_pipeline(
            &base,
            target,
            compressor.as_deref(),
            self.settings.suppress_stderr,
        );

        self.run_checked(&command).await?;
        self.apply_file_mode(target)
    }

    async fn run_import(
        &mut self,
        source: &Path,
        compression: CompressionKind,
    ) -> Result<(), BackupError> {
        let base = self.engine.base_import_command()?;
        let decompressor = self.compressor_binary(compression)?;
        let command = command::import_pipeline(&base, source, decompressor.as_deref());

        self.run_checked(&command).await
    }

    async fn run_checked(&self, command: &str) -> Result<(), BackupError> {
        let output = process::run(command, &self.engine.command_env(), self.settings.timeout())
            .await?;
        if !output.success() {
            return Err(BackupError::ExecutionFailed(output.stderr.trim().to_string()));
        }
        Ok(())
    }

    fn compressor_binary(
        &self,
        compression: CompressionKind,
    ) -> Result<Option<std::path::PathBuf>, BackupError> {
        match compression.binary() {
            Some(name) => Ok(Some(self.settings.binaries.locate(name)?)),
            None => Ok(None),
        }
    }

    #[cfg(unix)]
    fn apply_file_mode(&self, target: &Path) -> Result<(), BackupError> {
        if let Some(mode) = self.settings.file_mode {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(target, std::fs::Permissions::from_mode(mode))?;
        }
        Ok(())
    }

    #[cfg(not(unix))]
    fn apply_file_mode(&self, _target: &Path) -> Result<(), BackupError> {
        Ok(())
    }
}

/// Validates the filename against the backup extension grammar.
fn resolve_target(path: &Path) -> Result<CompressionKind, BackupError> {
    let filename = path
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| BackupError::InvalidExtension(path.display().to_string()))?;
    CompressionKind::resolve(filename)
}
