// backuptool/src/backup/paths.rs
use chrono::NaiveDate;
use std::fs;
use std::path::{Path, PathBuf};

use crate::errors::Result;

/// Canonical artifact locations for one run date.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackupPaths {
    pub directory: PathBuf,
    pub dump_path: PathBuf,
    pub media_path: PathBuf,
}

/// Computes the dated backup directory and the canonical file names for the
/// dump and the media archive, creating the directory (and parents) if absent.
///
/// Layout: `<backup_root>/<YYYY-MM-DD>/<db_name>_<MM_DD_YYYY>.sql` and
/// `<backup_root>/<YYYY-MM-DD>/media_<MM_DD_YYYY>.tar.gz`. Directory creation
/// is idempotent; any other I/O failure aborts the run.
pub fn plan_for(backup_root: &Path, db_name: &str, date: NaiveDate) -> Result<BackupPaths> {
    let directory = backup_root.join(date.format("%Y-%m-%d").to_string());
    fs::create_dir_all(&directory)?;

    let file_stamp = date.format("%m_%d_%Y");
    let dump_path = directory.join(format!("{}_{}.sql", db_name, file_stamp));
    let media_path = directory.join(format!("media_{}.tar.gz", file_stamp));

    Ok(BackupPaths {
        directory,
        dump_path,
        media_path,
    })
}
