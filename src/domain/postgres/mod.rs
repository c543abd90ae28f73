use async_trait::async_trait;
use std::sync::Arc;

use crate::domain::factory::{Engine, EngineKind};
use crate::error::BackupError;
use crate::services::config::{BackupSettings, ConnectionProfile};
use crate::utils::text::shell_quote;

/// PostgreSQL driver backed by `pg_dump` / `pg_restore` in custom format.
///
/// The connection URI deliberately omits the password: embedding it would
/// require percent-encoding and would leak it into the process argument
/// list. The password rides in `PGPASSWORD` on the spawned pipeline
/// instead.
pub struct PostgresEngine {
    profile: ConnectionProfile,
    settings: Arc<BackupSettings>,
}

impl PostgresEngine {
    pub fn new(profile: ConnectionProfile, settings: Arc<BackupSettings>) -> Self {
        Self { profile, settings }
    }

    fn connection_uri(&self) -> String {
        let mut uri = String::from("postgresql://");
        if !self.profile.username.is_empty() {
            uri.push_str(&self.profile.username);
            uri.push('@');
        }
        uri.push_str(&self.profile.host);
        if let Some(port) = self.profile.port {
            uri.push_str(&format!(":{port}"));
        }
        uri.push('/');
        uri.push_str(&self.profile.database);
        uri
    }
}

#[async_trait]
impl Engine for PostgresEngine {
    fn kind(&self) -> EngineKind {
        EngineKind::PostgreSql
    }

    fn base_export_command(&self) -> Result<String, BackupError> {
        let pg_dump = self.settings.binaries.locate("pg_dump")?;
        Ok(format!(
            "{} --dbname={} --format=c -b",
            shell_quote(&pg_dump.to_string_lossy()),
            shell_quote(&self.connection_uri())
        ))
    }

    fn base_import_command(&self) -> Result<String, BackupError> {
        let pg_restore = self.settings.binaries.locate("pg_restore")?;
        Ok(format!(
            "{} --dbname={} --format=c -c -e",
            shell_quote(&pg_restore.to_string_lossy()),
            shell_quote(&self.connection_uri())
        ))
    }

    fn command_env(&self) -> Vec<(String, String)> {
        match &self.profile.password {
            Some(password) => vec![("PGPASSWORD".to_string(), password.clone())],
            None => Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::config::Binaries;
    use std::path::Path;

    fn engine(dir: &Path, password: Option<&str>) -> PostgresEngine {
        let pg_dump = dir.join("pg_dump");
        let pg_restore = dir.join("pg_restore");
        std::fs::write(&pg_dump, "#!/bin/sh\n").unwrap();
        std::fs::write(&pg_restore, "#!/bin/sh\n").unwrap();

        let profile = ConnectionProfile {
            name: "pg".to_string(),
            driver: EngineKind::PostgreSql,
            host: "db.example.com".to_string(),
            port: Some(5433),
            username: "app".to_string(),
            password: password.map(str::to_string),
            database: "appdb".to_string(),
        };
        let settings = Arc::new(BackupSettings {
            target_dir: dir.to_path_buf(),
            timeout_secs: None,
            file_mode: None,
            suppress_stderr: false,
            binaries: Binaries {
                pg_dump: Some(pg_dump),
                pg_restore: Some(pg_restore),
                ..Binaries::default()
            },
            email: None,
        });
        PostgresEngine::new(profile, settings)
    }

    #[test]
    fn export_command_uses_custom_format_uri() {
        let dir = tempfile::tempdir().unwrap();
        let command = engine(dir.path(), Some("p@ss:w/rd"))
            .base_export_command()
            .unwrap();
        assert!(command.contains("--dbname=postgresql://app@db.example.com:5433/appdb"));
        assert!(command.ends_with("--format=c -b"));
    }

    #[test]
    fn import_command_cleans_and_stops_on_error() {
        let dir = tempfile::tempdir().unwrap();
        let command = engine(dir.path(), None).base_import_command().unwrap();
        assert!(command.contains("pg_restore"));
        assert!(command.ends_with("--format=c -c -e"));
    }

    #[test]
    fn password_stays_out_of_the_command_line() {
        let dir = tempfile::tempdir().unwrap();
        let e = engine(dir.path(), Some("p@ss:w/rd"));
        let command = e.base_export_command().unwrap();
        assert!(!command.contains("p@ss:w/rd"));
        assert_eq!(
            e.command_env(),
            vec![("PGPASSWORD".to_string(), "p@ss:w/rd".to_string())]
        );
    }

    #[test]
    fn no_password_means_no_extra_env() {
        let dir = tempfile::tempdir().unwrap();
        assert!(engine(dir.path(), None).command_env().is_empty());
    }
}
