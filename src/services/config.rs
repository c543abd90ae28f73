use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::info;

use crate::domain::factory::EngineKind;
use crate::error::BackupError;

/// One configured database connection.
///
/// For SQLite, `database` is the filesystem path of the database file and
/// host/port/credentials are ignored. The core only ever reads a profile.
#[derive(Debug, Deserialize, Clone)]
pub struct ConnectionProfile {
    pub name: String,
    #[serde(rename = "type")]
    pub driver: EngineKind,
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default)]
    pub port: Option<u16>,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: Option<String>,
    pub database: String,
}

fn default_host() -> String {
    "localhost".to_string()
}

/// Paths of the client and compressor binaries the drivers shell out to.
///
/// Explicitly configured paths must exist; unconfigured tools are looked
/// up on `$PATH` under their conventional name. Either way a miss is
/// [`BackupError::BinaryNotFound`] and fatal for the operation.
#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct Binaries {
    pub mysql: Option<PathBuf>,
    pub mysqldump: Option<PathBuf>,
    pub pg_dump: Option<PathBuf>,
    pub pg_restore: Option<PathBuf>,
    pub sqlite3: Option<PathBuf>,
    pub gzip: Option<PathBuf>,
    pub bzip2: Option<PathBuf>,
}

impl Binaries {
    pub fn locate(&self, name: &str) -> Result<PathBuf, BackupError> {
        let configured = match name {
            "mysql" => &self.mysql,
            "mysqldump" => &self.mysqldump,
            "pg_dump" => &self.pg_dump,
            "pg_restore" => &self.pg_restore,
            "sqlite3" => &self.sqlite3,
            "gzip" => &self.gzip,
            "bzip2" => &self.bzip2,
            other => {
                return Err(BackupError::BinaryNotFound(other.to_string()));
            }
        };

        match configured {
            Some(path) if path.is_file() => Ok(path.clone()),
            Some(path) => Err(BackupError::BinaryNotFound(format!(
                "{name} (configured as {})",
                path.display()
            ))),
            None => which::which(name)
                .map_err(|_| BackupError::BinaryNotFound(name.to_string())),
        }
    }
}

/// SMTP delivery settings for mailing finished artifacts.
#[derive(Debug, Deserialize, Clone)]
pub struct EmailSettings {
    pub smtp_host: String,
    #[serde(default = "default_smtp_port")]
    pub smtp_port: u16,
    #[serde(default)]
    pub smtp_username: Option<String>,
    #[serde(default)]
    pub smtp_password: Option<String>,
    pub from: String,
}

fn default_smtp_port() -> u16 {
    587
}

/// Operational settings shared by the drivers and the backup manager.
#[derive(Debug, Deserialize, Clone)]
pub struct BackupSettings {
    /// Directory where backup artifacts are written and rotated.
    pub target_dir: PathBuf,
    /// Subprocess timeout; absent means wait indefinitely.
    #[serde(default)]
    pub timeout_secs: Option<u64>,
    /// Mode applied to a fresh export on unix (TOML octal, e.g. 0o600).
    #[serde(default)]
    pub file_mode: Option<u32>,
    /// Append `2>/dev/null` to composed export commands.
    #[serde(default)]
    pub suppress_stderr: bool,
    #[serde(default)]
    pub binaries: Binaries,
    #[serde(default)]
    pub email: Option<EmailSettings>,
}

impl BackupSettings {
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct BackupConfig {
    pub settings: BackupSettings,
    #[serde(default)]
    pub connections: Vec<ConnectionProfile>,
}

impl BackupConfig {
    /// Loads a config file, picking the parser from the file extension.
    pub fn load(path: &Path) -> Result<Self> {
        info!("Loading config from: {}", path.display());

        if !path.exists() {
            bail!("Config file not found: {}", path.display());
        }

        let extension = path
            .extension()
            .and_then(|s| s.to_str())
            .context("Failed to determine config file extension")?;

        let mut file = File::open(path)
            .with_context(|| format!("Failed to open config file {}", path.display()))?;
        let mut contents = String::new();
        file.read_to_string(&mut contents)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;

        let config: BackupConfig = match extension {
            "json" => serde_json::from_str(&contents).context("JSON parsing error")?,
            "toml" => toml::from_str(&contents).context("TOML parsing error")?,
            _ => bail!("Unsupported config file format. Use .json or .toml"),
        };

        info!("{} connection(s) loaded", config.connections.len());

        Ok(config)
    }

    pub fn connection(&self, name: &str) -> Result<&ConnectionProfile> {
        self.connections
            .iter()
            .find(|c| c.name == name)
            .with_context(|| format!("No connection named '{name}' in config"))
    }
}
