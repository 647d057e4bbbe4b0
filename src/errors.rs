use thiserror::Error;

/// Failure taxonomy for one backup run.
///
/// `Config`, `Io`, `DumpFailed` and `CompressionFailed` are fatal and abort
/// the run before the media stage. `ArchiveFailed`, `InvalidAddress` and
/// `TransportFailed` only degrade the outcome; the orchestrator logs them and
/// carries on. Error strings must never contain credentials in cleartext.
#[derive(Error, Debug)]
pub enum BackupError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Database dump failed: {0}")]
    DumpFailed(String),

    #[error("Dump compression failed: {0}")]
    CompressionFailed(String),

    #[error("Media archive failed: {0}")]
    ArchiveFailed(String),

    #[error("Invalid notification address: {0}")]
    InvalidAddress(String),

    #[error("Mail transport failed: {0}")]
    TransportFailed(String),
}

impl BackupError {
    /// Whether this failure must abort the run before the media stage.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            BackupError::Config(_)
                | BackupError::Io(_)
                | BackupError::DumpFailed(_)
                | BackupError::CompressionFailed(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, BackupError>;
