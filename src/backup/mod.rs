pub(crate) mod db_dump;
mod logic;
pub(crate) mod media;
pub(crate) mod paths;
pub(crate) mod size;

pub use logic::{BackupJob, RunOutcome};

use crate::config::BackupConfig;
use crate::errors::Result;

/// Public entry point for one backup run against the live configuration.
pub fn run_backup_flow(config: BackupConfig) -> Result<RunOutcome> {
    BackupJob::new(config)?.run()
}
