use std::path::PathBuf;
use std::sync::Arc;
use std::time::SystemTime;

use tracing::{debug, info};

use crate::domain::compression::CompressionKind;
use crate::error::BackupError;
use crate::services::config::BackupSettings;

/// One backup file in the target directory, described entirely from
/// filesystem metadata at listing time.
#[derive(Debug, Clone)]
pub struct BackupArtifact {
    pub filename: String,
    pub compression: CompressionKind,
    pub size: u64,
    pub modified: SystemTime,
}

impl BackupArtifact {
    pub fn extension(&self) -> &'static str {
        self.compression.extension()
    }
}

/// Filesystem bookkeeping over the backup target directory: listing,
/// deletion and retention rotation. Nothing is cached; every call
/// re-reads the directory.
pub struct BackupManager {
    settings: Arc<BackupSettings>,
}

impl BackupManager {
    pub fn new(settings: Arc<BackupSettings>) -> Self {
        Self { settings }
    }

    /// Lists backup artifacts, oldest first.
    ///
    /// Files that do not match the backup extension grammar are skipped,
    /// not reported as errors.
    pub fn index(&self) -> Result<Vec<BackupArtifact>, BackupError> {
        let mut artifacts = Vec::new();
        for entry in std::fs::read_dir(&self.settings.target_dir)? {
            let entry = entry?;
            let metadata = entry.metadata()?;
            if !metadata.is_file() {
                continue;
            }
            let filename = match entry.file_name().into_string() {
                Ok(name) => name,
                Err(_) => continue,
            };
            let Some(compression) = CompressionKind::from_filename(&filename) else {
                continue;
            };
            artifacts.push(BackupArtifact {
                filename,
                compression,
                size: metadata.len(),
                modified: metadata.modified()?,
            });
        }
        artifacts.sort_by_key(|a| a.modified);
        Ok(artifacts)
    }

    /// Deletes one artifact by name.
    pub fn delete(&self, filename: &str) -> Result<(), BackupError> {
        let path = self.artifact_path(filename)?;
        std::fs::remove_file(&path)?;
        info!("Deleted backup {}", path.display());
        Ok(())
    }

    /// Keeps the `keep` most recently modified backups and deletes the
    /// rest, returning the deleted filenames. `keep == 0` is rejected
    /// before anything is touched.
    pub fn rotate(&self, keep: usize) -> Result<Vec<String>, BackupError> {
        if keep == 0 {
            return Err(BackupError::InvalidArgument(
                "rotation count must be positive".to_string(),
            ));
        }

        let artifacts = self.index()?;
        if artifacts.len() <= keep {
            debug!("Rotation keeps all {} backup(s)", artifacts.len());
            return Ok(Vec::new());
        }

        let surplus = artifacts.len() - keep;
        let mut deleted = Vec::with_capacity(surplus);
        for artifact in &artifacts[..surplus] {
            self.delete(&artifact.filename)?;
            deleted.push(artifact.filename.clone());
        }
        info!("Rotation removed {} backup(s), kept {keep}", deleted.len());
        Ok(deleted)
    }

    fn artifact_path(&self, filename: &str) -> Result<PathBuf, BackupError> {
        if filename.contains(std::path::MAIN_SEPARATOR) || filename.contains('/') {
            return Err(BackupError::InvalidArgument(format!(
                "artifact name must not contain path separators: {filename}"
            )));
        }
        Ok(self.settings.target_dir.join(filename))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::config::Binaries;
    use std::fs;
    use std::path::Path;
    use std::time::Duration;

    fn manager(dir: &Path) -> BackupManager {
        BackupManager::new(Arc::new(BackupSettings {
            target_dir: dir.to_path_buf(),
            timeout_secs: None,
            file_mode: None,
            suppress_stderr: false,
            binaries: Binaries::default(),
            email: None,
        }))
    }

    fn touch(dir: &Path, name: &str, age: Duration) {
        let path = dir.join(name);
        fs::write(&path, name).unwrap();
        let mtime = SystemTime::now() - age;
        fs::File::options()
            .write(true)
            .open(&path)
            .unwrap()
            .set_modified(mtime)
            .unwrap();
    }

    #[test]
    fn index_skips_non_backup_files_and_sorts_by_mtime() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "b.sql.gz", Duration::from_secs(10));
        touch(dir.path(), "a.sql", Duration::from_secs(100));
        touch(dir.path(), "c.sql.bz2", Duration::from_secs(1));
        touch(dir.path(), "notes.txt", Duration::from_secs(5));
        fs::create_dir(dir.path().join("sub.sql")).unwrap();

        let artifacts = manager(dir.path()).index().unwrap();
        let names: Vec<_> = artifacts.iter().map(|a| a.filename.as_str()).collect();
        assert_eq!(names, vec!["a.sql", "b.sql.gz", "c.sql.bz2"]);
        assert_eq!(artifacts[1].compression, CompressionKind::Gzip);
        assert_eq!(artifacts[0].extension(), ".sql");
        assert_eq!(artifacts[0].size, "a.sql".len() as u64);
    }

    #[test]
    fn rotate_keeps_the_newest_k() {
        let dir = tempfile::tempdir().unwrap();
        for (name, age) in [
            ("old1.sql", 400),
            ("old2.sql", 300),
            ("new1.sql", 200),
            ("new2.sql", 100),
            ("new3.sql", 10),
        ] {
            touch(dir.path(), name, Duration::from_secs(age));
        }

        let deleted = manager(dir.path()).rotate(3).unwrap();
        assert_eq!(deleted, vec!["old1.sql", "old2.sql"]);

        let remaining = manager(dir.path()).index().unwrap();
        let names: Vec<_> = remaining.iter().map(|a| a.filename.as_str()).collect();
        assert_eq!(names, vec!["new1.sql", "new2.sql", "new3.sql"]);
    }

    #[test]
    fn rotate_with_enough_room_deletes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "only.sql", Duration::from_secs(1));
        assert!(manager(dir.path()).rotate(5).unwrap().is_empty());
        assert_eq!(manager(dir.path()).index().unwrap().len(), 1);
    }

    #[test]
    fn rotate_zero_is_rejected_before_any_deletion() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "keep.sql", Duration::from_secs(1));
        assert!(matches!(
            manager(dir.path()).rotate(0),
            Err(BackupError::InvalidArgument(_))
        ));
        assert!(dir.path().join("keep.sql").exists());
    }

    #[test]
    fn delete_refuses_path_traversal() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            manager(dir.path()).delete("../etc/passwd.sql"),
            Err(BackupError::InvalidArgument(_))
        ));
    }

    #[test]
    fn delete_missing_artifact_is_an_io_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            manager(dir.path()).delete("gone.sql"),
            Err(BackupError::Io(_))
        ));
    }
}
