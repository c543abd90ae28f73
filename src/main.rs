use anyhow::{Context, Result};
use chrono::{DateTime, Local};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use backupsmith::domain::compression::CompressionKind;
use backupsmith::services::config::BackupConfig;
use backupsmith::services::export::{ExportOptions, ExportService};
use backupsmith::services::import::{ImportOptions, ImportService};
use backupsmith::services::mailer::Mailer;
use backupsmith::services::manager::BackupManager;
use backupsmith::settings::CONFIG;
use backupsmith::utils;

#[derive(Parser)]
#[command(name = "backupsmith", version, about = "Database backup/restore via native client tools")]
struct Cli {
    /// Config file (.toml or .json)
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Export a database to a backup file
    Export {
        /// Connection name from the config file
        connection: String,

        /// Filename pattern; supports {$DATABASE}, {$DATETIME}, {$HOSTNAME}, {$TIMESTAMP}.
        /// The extension matching --compression is appended when the pattern has none.
        #[arg(short, long, default_value = "backup_{$DATABASE}_{$DATETIME}")]
        filename: String,

        /// Compression: none, gzip or bzip2
        #[arg(long)]
        compression: Option<String>,

        /// Keep only the N newest backups afterwards
        #[arg(long)]
        keep: Option<usize>,

        /// Mail the finished backup to this address
        #[arg(long)]
        email: Option<String>,
    },

    /// Import a backup file into a database
    Import {
        /// Connection name from the config file
        connection: String,

        /// Backup filename, absolute or relative to the target directory
        filename: String,
    },

    /// List backup artifacts in the target directory
    List,

    /// Keep only the N newest backups, delete the rest
    Rotate { keep: usize },

    /// Mail an existing backup artifact
    Send { filename: String, recipient: String },
}

#[tokio::main]
async fn main() -> Result<()> {
    utils::logging::init_logger();

    let cli = Cli::parse();
    let config_path = cli
        .config
        .unwrap_or_else(|| PathBuf::from(&CONFIG.config_file));
    let config = BackupConfig::load(&config_path)?;
    let settings = Arc::new(config.settings.clone());

    match cli.command {
        Commands::Export {
            connection,
            filename,
            compression,
            keep,
            email,
        } => {
            let profile = config.connection(&connection)?;
            let compression = compression
                .as_deref()
                .map(CompressionKind::from_name)
                .transpose()?;
            let options = ExportOptions {
                pattern: filename,
                compression,
                keep,
                email_to: email,
            };
            match ExportService::new(settings).run(profile, options).await? {
                Some(path) => println!("{}", path.display()),
                None => println!("no operation performed"),
            }
        }

        Commands::Import { connection, filename } => {
            let profile = config.connection(&connection)?;
            let performed = ImportService::new(settings)
                .run(profile, ImportOptions { filename })
                .await?;
            if performed {
                println!("import finished");
            } else {
                println!("no operation performed");
            }
        }

        Commands::List => {
            for artifact in BackupManager::new(settings).index()? {
                let modified: DateTime<Local> = artifact.modified.into();
                println!(
                    "{:>12}  {}  {}",
                    artifact.size,
                    modified.format("%Y-%m-%d %H:%M:%S"),
                    artifact.filename
                );
            }
        }

        Commands::Rotate { keep } => {
            for deleted in BackupManager::new(settings).rotate(keep)? {
                println!("deleted {deleted}");
            }
        }

        Commands::Send { filename, recipient } => {
            let email = settings
                .email
                .clone()
                .context("[settings.email] is not configured")?;
            let file = if Path::new(&filename).is_absolute() {
                PathBuf::from(&filename)
            } else {
                settings.target_dir.join(&filename)
            };
            Mailer::new(email).send(&file, &recipient).await?;
            println!("sent {} to {recipient}", file.display());
        }
    }

    Ok(())
}
