use dotenvy::dotenv;
use once_cell::sync::Lazy;
use std::env;

#[derive(Debug)]
pub struct Settings {
    pub app_version: String,
    pub config_file: String,
    pub log: String,
}

impl Settings {
    fn from_env() -> Self {
        dotenv().ok();

        Self {
            app_version: env!("CARGO_PKG_VERSION").to_string(),
            config_file: env::var("BACKUPSMITH_CONFIG")
                .unwrap_or_else(|_| "backupsmith.toml".into()),
            log: env::var("BACKUPSMITH_LOG").unwrap_or_else(|_| "info".into()),
        }
    }
}

pub static CONFIG: Lazy<Settings> = Lazy::new(Settings::from_env);
