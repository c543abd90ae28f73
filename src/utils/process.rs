use std::process::Stdio;
use std::time::{Duration, Instant};

use tokio::process::Command;
use tracing::debug;

use crate::error::BackupError;

/// Captured result of a finished subprocess.
#[derive(Debug)]
pub struct ProcessOutput {
    pub exit_code: i32,
    pub stdout: String,
    pub stderr: String,
}

impl ProcessOutput {
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }
}

/// Runs a composed shell command and captures its output.
///
/// The command string is handed to `sh -c` verbatim: escaping is entirely
/// the command builder's responsibility, the runner performs no
/// sanitization of its own. With a timeout set, an overrunning child is
/// killed and the failure surfaces as [`BackupError::TimedOut`], distinct
/// from a plain non-zero exit.
pub async fn run(
    command: &str,
    envs: &[(String, String)],
    timeout: Option<Duration>,
) -> Result<ProcessOutput, BackupError> {
    debug!("Running command: {}", command);

    let mut cmd = Command::new("sh");
    cmd.arg("-c")
        .arg(command)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        // dropping the wait future on timeout must take the child with it
        .kill_on_drop(true);
    for (key, value) in envs {
        cmd.env(key, value);
    }

    let started = Instant::now();
    let child = cmd.spawn()?;

    let output = match timeout {
        Some(limit) => match tokio::time::timeout(limit, child.wait_with_output()).await {
            Ok(result) => result?,
            Err(_) => {
                return Err(BackupError::TimedOut {
                    command: command.to_string(),
                    elapsed: started.elapsed(),
                });
            }
        },
        None => child.wait_with_output().await?,
    };

    Ok(ProcessOutput {
        exit_code: output.status.code().unwrap_or(-1),
        stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
        stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
    })
}
