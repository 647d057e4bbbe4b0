// backuptool/src/backup/db_dump.rs
use flate2::Compression;
use flate2::write::GzEncoder;
use std::ffi::OsString;
use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use crate::config::BackupConfig;
use crate::errors::{BackupError, Result};
use crate::utils::find_mysqldump_executable;
use crate::utils::logger::Logger;

const REDACTED: &str = "--password=********";

/// Outcome of the dump stage for one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DumpResult {
    /// A compressed dump for this date already exists; nothing was written.
    Skipped { compressed_path: PathBuf },
    /// A fresh dump was created and compressed.
    Created { compressed_path: PathBuf },
}

impl DumpResult {
    pub fn compressed_path(&self) -> &Path {
        match self {
            DumpResult::Skipped { compressed_path } => compressed_path,
            DumpResult::Created { compressed_path } => compressed_path,
        }
    }
}

/// Produces the compressed database dump for one run.
///
/// The dump utility is invoked with an argument array and never through a
/// shell, so configuration values cannot smuggle commands in. The password
/// appears only in the child's argv; every logged rendition of the command is
/// redacted.
pub struct DatabaseDumpStage {
    mysqldump_bin: PathBuf,
}

impl DatabaseDumpStage {
    /// Locates mysqldump in PATH.
    pub fn locate() -> Result<Self> {
        Ok(DatabaseDumpStage {
            mysqldump_bin: find_mysqldump_executable()?,
        })
    }

    /// Uses an explicit dump binary instead of searching PATH.
    pub fn with_command(mysqldump_bin: PathBuf) -> Self {
        DatabaseDumpStage { mysqldump_bin }
    }

    /// Dumps the configured database to `dump_path` and gzips it in place.
    ///
    /// Idempotent per calendar day: if `<dump_path>.gz` already exists the
    /// stage skips without touching it, so a same-day re-run never overwrites
    /// an earlier dump.
    pub fn dump(
        &self,
        config: &BackupConfig,
        dump_path: &Path,
        logger: &mut Logger,
    ) -> Result<DumpResult> {
        let compressed_path = gz_path(dump_path);
        if compressed_path.exists() {
            logger.log("Backup file already exists. Skipping creation.")?;
            return Ok(DumpResult::Skipped { compressed_path });
        }

        let dump_file = File::create(dump_path)?;
        let args = dump_args(config);

        let output = Command::new(&self.mysqldump_bin)
            .args(&args)
            .stdout(Stdio::from(dump_file))
            .stderr(Stdio::piped())
            .output()?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            logger.log(&format!(
                "ERROR: Failed to create MySQL dump. Command: {} (exit: {}). {}",
                redacted_command(&self.mysqldump_bin, &args),
                output.status,
                stderr.trim()
            ))?;
            // Don't leave a truncated dump behind.
            let _ = fs::remove_file(dump_path);
            return Err(BackupError::DumpFailed(format!(
                "mysqldump exited with {}: {}",
                output.status,
                stderr.trim()
            )));
        }

        self.compress_in_place(dump_path, &compressed_path)?;
        logger.log(&format!(
            "Database dump created at {}",
            compressed_path.display()
        ))?;

        Ok(DumpResult::Created { compressed_path })
    }

    /// Gzips the raw dump and removes it, matching in-place `gzip` semantics.
    fn compress_in_place(&self, dump_path: &Path, compressed_path: &Path) -> Result<()> {
        let mut raw = File::open(dump_path)?;
        let mut encoder = GzEncoder::new(File::create(compressed_path)?, Compression::default());
        io::copy(&mut raw, &mut encoder)?;
        encoder
            .finish()
            .map_err(|e| BackupError::CompressionFailed(e.to_string()))?;

        if !compressed_path.exists() {
            return Err(BackupError::CompressionFailed(format!(
                "expected compressed dump at {}",
                compressed_path.display()
            )));
        }

        fs::remove_file(dump_path)?;
        Ok(())
    }
}

fn dump_args(config: &BackupConfig) -> Vec<OsString> {
    vec![
        format!("--user={}", config.db_user).into(),
        format!("--password={}", config.db_password).into(),
        "--single-transaction".into(),
        "--allow-keywords".into(),
        "--complete-insert".into(),
        "--insert-ignore".into(),
        "--routines".into(),
        "--events".into(),
        "--force".into(),
        config.db_name.clone().into(),
    ]
}

/// Command line as logged: the password argument is replaced wholesale.
fn redacted_command(bin: &Path, args: &[OsString]) -> String {
    let mut parts = vec![bin.display().to_string()];
    for arg in args {
        let s = arg.to_string_lossy();
        if s.starts_with("--password=") {
            parts.push(REDACTED.to_string());
        } else {
            parts.push(s.into_owned());
        }
    }
    parts.join(" ")
}

fn gz_path(dump_path: &Path) -> PathBuf {
    let mut os: OsString = dump_path.as_os_str().to_owned();
    os.push(".gz");
    PathBuf::from(os)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{BackupConfig, Encryption, MailSettings};
    use tempfile::TempDir;

    fn test_config(dir: &Path) -> BackupConfig {
        BackupConfig {
            site_name: "Example Shop".to_string(),
            db_name: "shop".to_string(),
            db_user: "shop".to_string(),
            db_password: "hunter2-secret".to_string(),
            upload_root: dir.join("uploads"),
            backup_root: dir.join("uploads/backups"),
            log_file: dir.join("uploads/logs/backup.log"),
            admin_email: "admin@example.com".to_string(),
            mail: MailSettings {
                host: "smtp.example.com".to_string(),
                username: String::new(),
                password: String::new(),
                port: 587,
                encryption: Encryption::StartTls,
            },
            schedule_interval_hours: 168,
        }
    }

    #[test]
    fn test_existing_compressed_dump_is_skipped() -> Result<()> {
        let dir = TempDir::new()?;
        let dump_path = dir.path().join("shop_03_05_2024.sql");
        fs::write(gz_path(&dump_path), b"earlier dump")?;

        let mut logger = Logger::open(&dir.path().join("run.log"))?;
        // A binary that would fail if invoked proves the stage never ran it.
        let stage = DatabaseDumpStage::with_command(PathBuf::from("false"));
        let result = stage.dump(&test_config(dir.path()), &dump_path, &mut logger)?;

        assert!(matches!(result, DumpResult::Skipped { .. }));
        assert_eq!(fs::read(gz_path(&dump_path))?, b"earlier dump");
        assert!(logger.lines().iter().any(|l| l.contains("already exists")));
        Ok(())
    }

    #[test]
    fn test_successful_dump_is_compressed_in_place() -> Result<()> {
        let dir = TempDir::new()?;
        let dump_path = dir.path().join("shop_03_05_2024.sql");

        let mut logger = Logger::open(&dir.path().join("run.log"))?;
        // `true` exits 0 with empty stdout, standing in for mysqldump.
        let stage = DatabaseDumpStage::with_command(PathBuf::from("true"));
        let result = stage.dump(&test_config(dir.path()), &dump_path, &mut logger)?;

        assert!(matches!(result, DumpResult::Created { .. }));
        assert!(gz_path(&dump_path).exists());
        assert!(!dump_path.exists(), "raw dump should be removed after gzip");
        Ok(())
    }

    #[test]
    fn test_failed_dump_is_fatal_and_redacted() -> Result<()> {
        let dir = TempDir::new()?;
        let dump_path = dir.path().join("shop_03_05_2024.sql");

        let mut logger = Logger::open(&dir.path().join("run.log"))?;
        let stage = DatabaseDumpStage::with_command(PathBuf::from("false"));
        let err = stage
            .dump(&test_config(dir.path()), &dump_path, &mut logger)
            .unwrap_err();

        assert!(matches!(err, BackupError::DumpFailed(_)));
        assert!(!dump_path.exists(), "partial dump should be cleaned up");
        assert!(!gz_path(&dump_path).exists());
        let joined = logger.lines().join("\n");
        assert!(joined.contains("Failed to create MySQL dump"));
        assert!(joined.contains(REDACTED));
        assert!(
            !joined.contains("hunter2-secret"),
            "password must never reach the log"
        );
        Ok(())
    }

    #[test]
    fn test_gz_path_appends_suffix() {
        assert_eq!(
            gz_path(Path::new("/tmp/shop_03_05_2024.sql")),
            PathBuf::from("/tmp/shop_03_05_2024.sql.gz")
        );
    }
}
