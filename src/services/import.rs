use anyhow::Result;
use chrono::Local;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;

use crate::domain::compression::CompressionKind;
use crate::domain::factory;
use crate::error::BackupError;
use crate::services::config::{BackupSettings, ConnectionProfile};
use crate::utils::filename::expand_pattern;

/// One import invocation; built fresh per call.
#[derive(Debug, Clone)]
pub struct ImportOptions {
    /// Backup filename, absolute or relative to the target directory.
    /// Tokens are expanded before validation.
    pub filename: String,
}

/// User-facing import orchestration: resolve and validate the source
/// file, then drive the engine.
pub struct ImportService {
    settings: Arc<BackupSettings>,
}

impl ImportService {
    pub fn new(settings: Arc<BackupSettings>) -> Self {
        Self { settings }
    }

    /// Runs one import. `Ok(false)` means a before-hook vetoed the
    /// operation and nothing was performed.
    pub async fn run(&self, profile: &ConnectionProfile, options: ImportOptions) -> Result<bool> {
        let name = expand_pattern(&options.filename, &profile.database, &profile.host, Local::now());
        CompressionKind::resolve(&name)?;

        let source = if Path::new(&name).is_absolute() {
            PathBuf::from(&name)
        } else {
            self.settings.target_dir.join(&name)
        };
        if !source.is_file() {
            return Err(BackupError::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("backup file not found: {}", source.display()),
            ))
            .into());
        }

        let mut driver = factory::create(profile.clone(), self.settings.clone());
        info!("Importing {} from {}", profile.name, source.display());
        let performed = driver.import(&source).await?;
        if !performed {
            info!("No operation performed for {}", profile.name);
        }
        Ok(performed)
    }
}
