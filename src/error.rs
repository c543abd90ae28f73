use std::time::Duration;

use thiserror::Error;

/// Failure taxonomy for backup and restore operations.
///
/// Everything here is fatal for the operation it occurs in; the only
/// non-error "did not run" outcome is the hook veto, which surfaces as
/// `Ok(false)` from the driver, never as a variant of this enum.
#[derive(Debug, Error)]
pub enum BackupError {
    /// The filename does not end in `.sql`, `.sql.gz` or `.sql.bz2`.
    #[error("invalid backup file extension: {0}")]
    InvalidExtension(String),

    /// A required client or compressor binary could not be located.
    #[error("required binary not found: {0}")]
    BinaryNotFound(String),

    /// The subprocess exited non-zero; carries trimmed stderr.
    #[error("command failed: {0}")]
    ExecutionFailed(String),

    /// The subprocess exceeded the configured timeout and was killed.
    #[error("command timed out after {elapsed:?}: {command}")]
    TimedOut { command: String, elapsed: Duration },

    /// Auth-file or target-file creation/permission failure.
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    /// Rejected before any side effect occurred.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
}

pub type Result<T> = std::result::Result<T, BackupError>;
