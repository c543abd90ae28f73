use std::io::Write;

use tempfile::NamedTempFile;

use crate::services::config::ConnectionProfile;

/// Defaults-file read by `mysqldump` during export.
pub const EXPORT_TEMPLATE: &str = "[mysqldump]\nuser = \"{{USER}}\"\npassword = \"{{PASSWORD}}\"\nhost = \"{{HOST}}\"\n";

/// Defaults-file read by the `mysql` client during import.
pub const IMPORT_TEMPLATE: &str = "[client]\nuser = \"{{USER}}\"\npassword = \"{{PASSWORD}}\"\nhost = \"{{HOST}}\"\n";

/// Writes the rendered credential template into a fresh temp file.
///
/// The password only ever lives in this file, never on a command line.
/// `NamedTempFile` gives a unique per-call name (safe across concurrent
/// drivers), is created 0600 on unix, and unlinks the file when the
/// handle drops — so releasing the handle is the deletion, and releasing
/// a handle that is already gone is a no-op.
pub fn write(template: &str, profile: &ConnectionProfile) -> std::io::Result<NamedTempFile> {
    let rendered = render(template, profile);
    let mut file = tempfile::Builder::new()
        .prefix("backupsmith-auth-")
        .suffix(".cnf")
        .tempfile()?;
    file.write_all(rendered.as_bytes())?;
    file.flush()?;
    Ok(file)
}

fn render(template: &str, profile: &ConnectionProfile) -> String {
    template
        .replace("{{USER}}", &profile.username)
        .replace("{{PASSWORD}}", profile.password.as_deref().unwrap_or(""))
        .replace("{{HOST}}", &profile.host)
}
