// backuptool/src/notify/mod.rs
use chrono::Local;
use lettre::message::Mailbox;
use lettre::message::header::ContentType;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{Message, SmtpTransport, Transport};

use crate::config::{BackupConfig, Encryption, MailSettings};
use crate::errors::{BackupError, Result};
use crate::utils::logger::Logger;

/// Outcome of the notification stage. None of these fail the run: the
/// artifacts are already on disk whether or not the summary mail goes out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotifyResult {
    Sent,
    Skipped,
    Failed,
}

/// What the media stage left behind, for the summary message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MediaOutcome {
    Archived(std::path::PathBuf),
    Failed,
}

/// Mail dispatch seam. Production uses [`SmtpMailer`]; tests substitute a
/// recording stub.
pub trait Mailer {
    fn send(&self, to: &Mailbox, subject: &str, html_body: &str) -> Result<()>;
}

/// Composes the HTML summary for one run.
pub fn compose_message(config: &BackupConfig, dump_size: &str, media: &MediaOutcome) -> String {
    let media_line = match media {
        MediaOutcome::Archived(path) => {
            format!("Media files backed up to: {}", path.display())
        }
        MediaOutcome::Failed => {
            "Media file backup FAILED. See the backup log for details.".to_string()
        }
    };

    format!(
        "<h1>{} Backup</h1><br>Backup of database <b>{}</b> completed.<br>Dump size: <b>{}</b>.<br>{}<br>{}",
        config.site_name,
        config.db_name,
        dump_size,
        Local::now().format("%d.%m.%Y %H:%M:%S"),
        media_line
    )
}

/// Validates the administrator address and dispatches the summary.
///
/// A malformed address skips delivery entirely; a transport failure is
/// logged with the transport's diagnostic. Both are non-fatal.
pub fn notify(
    config: &BackupConfig,
    html_body: &str,
    logger: &mut Logger,
    mailer: &dyn Mailer,
) -> Result<NotifyResult> {
    let mailbox: Mailbox = match config.admin_email.parse() {
        Ok(mb) => mb,
        Err(_) => {
            let err = BackupError::InvalidAddress(config.admin_email.clone());
            logger.log(&format!(
                "ERROR: Invalid email address provided for backup notification. {}",
                err
            ))?;
            return Ok(NotifyResult::Skipped);
        }
    };

    let subject = format!("DB Backup [{}]", Local::now().format("%d.%m.%Y %H:%M"));
    match mailer.send(&mailbox, &subject, html_body) {
        Ok(()) => {
            logger.log("Mail sent successfully.")?;
            Ok(NotifyResult::Sent)
        }
        Err(e) => {
            logger.log(&format!("ERROR: Email could not be sent. {}", e))?;
            Ok(NotifyResult::Failed)
        }
    }
}

/// SMTP transport built from the configured mail settings.
pub struct SmtpMailer {
    settings: MailSettings,
}

impl SmtpMailer {
    pub fn new(settings: MailSettings) -> Self {
        SmtpMailer { settings }
    }

    fn transport(&self) -> Result<SmtpTransport> {
        let builder = match self.settings.encryption {
            Encryption::Tls => SmtpTransport::relay(&self.settings.host)
                .map_err(|e| BackupError::TransportFailed(e.to_string()))?,
            Encryption::StartTls => SmtpTransport::starttls_relay(&self.settings.host)
                .map_err(|e| BackupError::TransportFailed(e.to_string()))?,
            Encryption::None => SmtpTransport::builder_dangerous(&self.settings.host),
        };

        let mut builder = builder.port(self.settings.port);
        if !self.settings.username.is_empty() {
            builder = builder.credentials(Credentials::new(
                self.settings.username.clone(),
                self.settings.password.clone(),
            ));
        }
        Ok(builder.build())
    }

    fn sender(&self) -> Result<Mailbox> {
        // Prefer the SMTP login as the From address when it looks like one.
        let candidate = if self.settings.username.contains('@') {
            self.settings.username.clone()
        } else {
            format!("backup@{}", self.settings.host)
        };
        candidate
            .parse()
            .map_err(|_| BackupError::TransportFailed(format!("invalid sender address {:?}", candidate)))
    }
}

impl Mailer for SmtpMailer {
    fn send(&self, to: &Mailbox, subject: &str, html_body: &str) -> Result<()> {
        let message = Message::builder()
            .from(self.sender()?)
            .to(to.clone())
            .subject(subject)
            .header(ContentType::TEXT_HTML)
            .body(html_body.to_string())
            .map_err(|e| BackupError::TransportFailed(e.to_string()))?;

        self.transport()?
            .send(&message)
            .map(|_| ())
            .map_err(|e| BackupError::TransportFailed(e.to_string()))
    }
}
