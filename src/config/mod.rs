// backuptool/src/config/mod.rs
use anyhow::{Context, Result};
use serde::Deserialize;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

const DEFAULT_SCHEDULE_INTERVAL_HOURS: u64 = 168; // weekly

// Structs for deserializing config.json
#[derive(Debug, Clone, Deserialize)]
pub struct JsonMailSettings {
    pub host: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
    pub port: Option<u16>,
    pub encryption: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawJsonConfig {
    pub site_name: Option<String>,
    pub db_name: Option<String>,
    pub db_user: Option<String>,
    pub db_password: Option<String>,
    pub upload_root: Option<PathBuf>,
    pub backup_root: Option<PathBuf>,
    pub log_file: Option<PathBuf>,
    pub admin_email: Option<String>,
    pub mail: Option<JsonMailSettings>,
    pub schedule_interval_hours: Option<u64>,
}

// Application's internal configuration structs
#[derive(Debug, Clone)]
pub struct MailSettings {
    pub host: String,
    pub username: String,
    pub password: String,
    pub port: u16,
    pub encryption: Encryption,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Encryption {
    None,
    StartTls,
    Tls,
}

/// Everything one backup run needs. Loaded once at job start, read-only after.
#[derive(Debug, Clone)]
pub struct BackupConfig {
    pub site_name: String,
    pub db_name: String,
    pub db_user: String,
    pub db_password: String,
    pub upload_root: PathBuf,
    pub backup_root: PathBuf,
    pub log_file: PathBuf,
    pub admin_email: String,
    pub mail: MailSettings,
    pub schedule_interval_hours: u64,
}

impl BackupConfig {
    pub fn load_from_json(config_path: &Path) -> Result<Self> {
        let config_content = fs::read_to_string(config_path)
            .with_context(|| format!("Failed to read config file at {}", config_path.display()))?;
        let raw: RawJsonConfig = serde_json::from_str(&config_content).with_context(|| {
            format!(
                "Failed to parse JSON from config file at {}",
                config_path.display()
            )
        })?;
        Self::from_raw(raw)
    }

    pub fn from_raw(raw: RawJsonConfig) -> Result<Self> {
        let db_name = raw
            .db_name
            .filter(|s| !s.is_empty())
            .context("db_name must be set in config.json")?;

        if db_name.contains(|c: char| !c.is_alphanumeric() && c != '_' && c != '-') {
            anyhow::bail!("Invalid character in db_name: {:?}", db_name);
        }

        // The dump utility logs in as the database owner unless told otherwise.
        let db_user = raw.db_user.filter(|s| !s.is_empty()).unwrap_or_else(|| db_name.clone());

        // Secrets may live in the environment instead of config.json.
        let db_password = match raw.db_password.filter(|s| !s.is_empty()) {
            Some(p) => p,
            None => env::var("DB_PASSWORD")
                .context("db_password must be set in config.json or via the DB_PASSWORD environment variable")?,
        };

        let backup_root = raw
            .backup_root
            .filter(|p| !p.as_os_str().is_empty())
            .context("backup_root must be set in config.json")?;
        let upload_root = raw
            .upload_root
            .filter(|p| !p.as_os_str().is_empty())
            .context("upload_root must be set in config.json")?;
        let log_file = raw
            .log_file
            .filter(|p| !p.as_os_str().is_empty())
            .context("log_file must be set in config.json")?;
        let admin_email = raw
            .admin_email
            .filter(|s| !s.is_empty())
            .context("admin_email must be set in config.json")?;
        let site_name = raw.site_name.filter(|s| !s.is_empty()).unwrap_or_else(|| db_name.clone());

        let mail_raw = raw.mail.context("mail settings must be set in config.json")?;
        let mail = MailSettings {
            host: mail_raw
                .host
                .filter(|s| !s.is_empty())
                .context("mail.host must be set in config.json")?,
            username: mail_raw.username.unwrap_or_default(),
            password: mail_raw.password.unwrap_or_default(),
            port: mail_raw.port.unwrap_or(587),
            encryption: parse_encryption(mail_raw.encryption.as_deref())?,
        };

        Ok(BackupConfig {
            site_name,
            db_name,
            db_user,
            db_password,
            upload_root,
            backup_root,
            log_file,
            admin_email,
            mail,
            schedule_interval_hours: raw
                .schedule_interval_hours
                .unwrap_or(DEFAULT_SCHEDULE_INTERVAL_HOURS),
        })
    }
}

fn parse_encryption(value: Option<&str>) -> Result<Encryption> {
    match value {
        None => Ok(Encryption::StartTls),
        Some(s) => match s.to_ascii_lowercase().as_str() {
            "none" => Ok(Encryption::None),
            "starttls" => Ok(Encryption::StartTls),
            "tls" | "ssl" => Ok(Encryption::Tls),
            other => Err(anyhow::anyhow!(
                "mail.encryption must be one of 'none', 'starttls', 'tls' (got {:?})",
                other
            )),
        },
    }
}
