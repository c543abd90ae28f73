use async_trait::async_trait;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info};

use crate::domain::factory::{Engine, EngineKind};
use crate::error::BackupError;
use crate::services::config::{BackupSettings, ConnectionProfile};
use crate::utils::text::shell_quote;

/// SQLite driver backed by the `sqlite3` shell.
///
/// Export streams `.dump` output; import replays SQL on stdin. Import is
/// destructive by design: the before-hook drops every user table and
/// cycles the connection so the dump's schema applies to a clean file.
/// The veto decision happens before the wipe — a vetoing override never
/// destroys data.
pub struct SqliteEngine {
    profile: ConnectionProfile,
    settings: Arc<BackupSettings>,
}

impl SqliteEngine {
    pub fn new(profile: ConnectionProfile, settings: Arc<BackupSettings>) -> Self {
        Self { profile, settings }
    }

    fn base_command(&self) -> Result<String, BackupError> {
        let sqlite3 = self.settings.binaries.locate("sqlite3")?;
        Ok(format!(
            "{} {}",
            shell_quote(&sqlite3.to_string_lossy()),
            shell_quote(&self.profile.database)
        ))
    }
}

#[async_trait]
impl Engine for SqliteEngine {
    fn kind(&self) -> EngineKind {
        EngineKind::Sqlite
    }

    async fn before_import(&mut self) -> Result<bool, BackupError> {
        let database = self.profile.database.clone();
        info!("Wiping sqlite schema at {database} before import");
        tokio::task::spawn_blocking(move || wipe_tables(Path::new(&database)))
            .await
            .map_err(|e| BackupError::Io(std::io::Error::other(e)))??;
        Ok(true)
    }

    fn base_export_command(&self) -> Result<String, BackupError> {
        Ok(format!("{} .dump", self.base_command()?))
    }

    fn base_import_command(&self) -> Result<String, BackupError> {
        self.base_command()
    }
}

/// Drops all user tables, then closes the connection so the import runs
/// against a fresh handle. A failure here is a hard error, never a veto.
fn wipe_tables(database: &Path) -> Result<(), BackupError> {
    let conn = rusqlite::Connection::open(database).map_err(wipe_error)?;
    conn.execute_batch("PRAGMA foreign_keys = OFF;")
        .map_err(wipe_error)?;

    let tables: Vec<String> = {
        let mut stmt = conn
            .prepare("SELECT name FROM sqlite_master WHERE type = 'table' AND name NOT LIKE 'sqlite_%'")
            .map_err(wipe_error)?;
        let rows = stmt
            .query_map([], |row| row.get::<_, String>(0))
            .map_err(wipe_error)?;
        rows.collect::<Result<_, _>>().map_err(wipe_error)?
    };

    for table in &tables {
        debug!("Dropping table {table}");
        let quoted = table.replace('"', "\"\"");
        conn.execute_batch(&format!("DROP TABLE IF EXISTS \"{quoted}\";"))
            .map_err(wipe_error)?;
    }

    conn.close().map_err(|(_, e)| wipe_error(e))?;
    Ok(())
}

fn wipe_error(e: rusqlite::Error) -> BackupError {
    BackupError::ExecutionFailed(format!("sqlite schema wipe failed: {e}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn engine(dir: &Path, database: &Path) -> SqliteEngine {
        let sqlite3 = dir.join("sqlite3");
        std::fs::write(&sqlite3, "#!/bin/sh\n").unwrap();
        let profile = ConnectionProfile {
            name: "local".to_string(),
            driver: EngineKind::Sqlite,
            host: "localhost".to_string(),
            port: None,
            username: String::new(),
            password: None,
            database: database.to_string_lossy().into_owned(),
        };
        let settings = Arc::new(BackupSettings {
            target_dir: dir.to_path_buf(),
            timeout_secs: None,
            file_mode: None,
            suppress_stderr: false,
            binaries: crate::services::config::Binaries {
                sqlite3: Some(sqlite3),
                ..Default::default()
            },
            email: None,
        });
        SqliteEngine::new(profile, settings)
    }

    #[test]
    fn export_command_dumps_the_database_file() {
        let dir = tempfile::tempdir().unwrap();
        let db = dir.path().join("app data.sqlite");
        let e = engine(dir.path(), &db);
        let command = e.base_export_command().unwrap();
        assert!(command.ends_with(" .dump"));
        assert!(command.contains("'") && command.contains("app data.sqlite"));
    }

    #[test]
    fn import_command_is_the_bare_shell() {
        let dir = tempfile::tempdir().unwrap();
        let db = dir.path().join("app.sqlite");
        let e = engine(dir.path(), &db);
        assert!(!e.base_import_command().unwrap().contains(".dump"));
    }

    #[test]
    fn wipe_drops_every_user_table() {
        let dir = tempfile::tempdir().unwrap();
        let db = dir.path().join("app.sqlite");
        let conn = rusqlite::Connection::open(&db).unwrap();
        conn.execute_batch(
            "CREATE TABLE users (id INTEGER PRIMARY KEY, name TEXT);
             CREATE TABLE posts (id INTEGER PRIMARY KEY, user_id INTEGER REFERENCES users(id));
             INSERT INTO users (name) VALUES ('a'), ('b');",
        )
        .unwrap();
        drop(conn);

        wipe_tables(&db).unwrap();

        let conn = rusqlite::Connection::open(&db).unwrap();
        let count: i64 = conn
            .query_row(
                "SELECT count(*) FROM sqlite_master WHERE type = 'table' AND name NOT LIKE 'sqlite_%'",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(count, 0);
    }

    #[tokio::test]
    async fn before_import_wipes_and_does_not_veto() {
        let dir = tempfile::tempdir().unwrap();
        let db = dir.path().join("app.sqlite");
        rusqlite::Connection::open(&db)
            .unwrap()
            .execute_batch("CREATE TABLE t (x);")
            .unwrap();

        let mut e = engine(dir.path(), &db);
        assert!(e.before_import().await.unwrap());

        let conn = rusqlite::Connection::open(&db).unwrap();
        let count: i64 = conn
            .query_row(
                "SELECT count(*) FROM sqlite_master WHERE type = 'table'",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(count, 0);
    }
}
