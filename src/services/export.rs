use anyhow::{Context, Result};
use chrono::Local;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

use crate::domain::compression::CompressionKind;
use crate::domain::factory;
use crate::error::BackupError;
use crate::services::config::{BackupSettings, ConnectionProfile};
use crate::services::mailer::Mailer;
use crate::services::manager::BackupManager;
use crate::utils::filename::expand_pattern;

/// One export invocation, built fresh per call — nothing is retained on
/// the service between operations.
#[derive(Debug, Clone)]
pub struct ExportOptions {
    /// Filename pattern; may carry `{$DATABASE}`-style tokens.
    pub pattern: String,
    /// Explicit compression selection. Appends the matching extension
    /// when the pattern does not already carry one.
    pub compression: Option<CompressionKind>,
    /// Retention count to rotate to after a successful export.
    pub keep: Option<usize>,
    /// Mail the finished artifact to this address.
    pub email_to: Option<String>,
}

/// User-facing export orchestration: resolve the target filename, drive
/// the engine, then apply rotation and email side effects.
pub struct ExportService {
    settings: Arc<BackupSettings>,
}

impl ExportService {
    pub fn new(settings: Arc<BackupSettings>) -> Self {
        Self { settings }
    }

    /// Runs one export. `Ok(None)` means a before-hook vetoed the
    /// operation and nothing was performed.
    pub async fn run(
        &self,
        profile: &ConnectionProfile,
        options: ExportOptions,
    ) -> Result<Option<PathBuf>> {
        let filename = resolve_filename(&options.pattern, options.compression, profile)?;
        std::fs::create_dir_all(&self.settings.target_dir).with_context(|| {
            format!(
                "Failed to create target directory {}",
                self.settings.target_dir.display()
            )
        })?;
        let target = self.settings.target_dir.join(&filename);

        let mut driver = factory::create(profile.clone(), self.settings.clone());
        info!("Exporting {} ({}) to {filename}", profile.name, driver.kind());
        if !driver.export(&target).await? {
            info!("No operation performed for {}", profile.name);
            return Ok(None);
        }

        if let Some(keep) = options.keep {
            let deleted = BackupManager::new(self.settings.clone()).rotate(keep)?;
            if !deleted.is_empty() {
                info!("Rotated out: {}", deleted.join(", "));
            }
        }

        if let Some(recipient) = &options.email_to {
            let email = self
                .settings
                .email
                .clone()
                .context("Email delivery requested but [settings.email] is not configured")?;
            Mailer::new(email).send(&target, recipient).await?;
        }

        Ok(Some(target))
    }
}

/// Expands pattern tokens, reconciles the explicit compression selection
/// with the filename, and validates the result against the extension
/// grammar. Substitution happens exactly once, before validation.
///
/// An extension-less pattern takes the selected kind's extension (plain
/// `.sql` when nothing is selected); a pattern that already carries a
/// recognized extension must agree with the selection.
pub fn resolve_filename(
    pattern: &str,
    compression: Option<CompressionKind>,
    profile: &ConnectionProfile,
) -> Result<String, BackupError> {
    let mut name = expand_pattern(pattern, &profile.database, &profile.host, Local::now());

    match (CompressionKind::from_filename(&name), compression) {
        (None, selected) => {
            name.push_str(selected.unwrap_or(CompressionKind::None).extension());
        }
        (Some(kind), Some(selected)) if kind != selected => {
            return Err(BackupError::InvalidArgument(format!(
                "filename {name} implies {} but {} was requested",
                kind.extension(),
                selected.extension()
            )));
        }
        _ => {}
    }

    CompressionKind::resolve(&name)?;
    Ok(name)
}
