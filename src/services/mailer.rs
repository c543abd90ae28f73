use anyhow::{Context, Result};
use lettre::message::header::ContentType;
use lettre::message::{Attachment, MultiPart, SinglePart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{Message, SmtpTransport, Transport};
use std::path::{Path, PathBuf};
use tracing::info;

use crate::services::config::EmailSettings;

/// Mails a finished backup artifact as an attachment over SMTP.
///
/// Failures propagate as-is; delivery is never retried.
pub struct Mailer {
    email: EmailSettings,
}

impl Mailer {
    pub fn new(email: EmailSettings) -> Self {
        Self { email }
    }

    pub async fn send(&self, file: &Path, recipient: &str) -> Result<()> {
        let email = self.email.clone();
        let file: PathBuf = file.to_path_buf();
        let recipient = recipient.to_string();

        tokio::task::spawn_blocking(move || send_blocking(&email, &file, &recipient)).await??;
        Ok(())
    }
}

fn send_blocking(email: &EmailSettings, file: &Path, recipient: &str) -> Result<()> {
    let message = build_message(email, file, recipient)?;

    let mut builder = SmtpTransport::relay(&email.smtp_host)
        .with_context(|| format!("Failed to set up SMTP relay {}", email.smtp_host))?
        .port(email.smtp_port);
    if let (Some(user), Some(password)) = (&email.smtp_username, &email.smtp_password) {
        builder = builder.credentials(Credentials::new(user.clone(), password.clone()));
    }

    builder
        .build()
        .send(&message)
        .with_context(|| format!("Failed to send backup to {recipient}"))?;
    info!("Mailed {} to {recipient}", file.display());
    Ok(())
}

fn build_message(email: &EmailSettings, file: &Path, recipient: &str) -> Result<Message> {
    let filename = file
        .file_name()
        .and_then(|n| n.to_str())
        .with_context(|| format!("Invalid attachment path {}", file.display()))?
        .to_string();
    let bytes = std::fs::read(file)
        .with_context(|| format!("Failed to read backup file {}", file.display()))?;

    let content_type = ContentType::parse("application/octet-stream")
        .context("Failed to build attachment content type")?;
    let attachment = Attachment::new(filename.clone()).body(bytes, content_type);

    let message = Message::builder()
        .from(email.from.parse().context("Invalid sender address")?)
        .to(recipient.parse().context("Invalid recipient address")?)
        .subject(format!("Database backup: {filename}"))
        .multipart(
            MultiPart::mixed()
                .singlepart(
                    SinglePart::builder()
                        .header(ContentType::TEXT_PLAIN)
                        .body(format!("Backup file {filename} attached.\r\n")),
                )
                .singlepart(attachment),
        )
        .context("Failed to build backup mail")?;
    Ok(message)
}
