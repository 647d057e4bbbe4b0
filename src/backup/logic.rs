// backuptool/src/backup/logic.rs
use chrono::{Local, NaiveDate};

use crate::backup::db_dump::{DatabaseDumpStage, DumpResult};
use crate::backup::{media, paths, size};
use crate::config::BackupConfig;
use crate::errors::Result;
use crate::notify::{self, Mailer, MediaOutcome, SmtpMailer};
use crate::utils::lock::RunLock;
use crate::utils::logger::Logger;

/// How one invocation of the job ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    Completed,
    Aborted,
}

/// Record of one execution. Created at orchestration start, filled in by the
/// stages, dropped when the run ends; the log file and the artifacts are the
/// only persisted traces.
#[derive(Debug)]
pub struct BackupRun {
    pub date: NaiveDate,
    pub dump: Option<DumpResult>,
    pub dump_size: String,
    pub media: Option<MediaOutcome>,
    pub message: String,
}

impl BackupRun {
    fn new(date: NaiveDate) -> Self {
        BackupRun {
            date,
            dump: None,
            dump_size: String::new(),
            media: None,
            message: String::new(),
        }
    }
}

/// The backup job: sequences plan → dump → size → media → notify.
///
/// Built explicitly from a [`BackupConfig`]; the trigger adapter (CLI or
/// schedule loop) owns one and calls [`BackupJob::run`] per firing. Dump
/// failure aborts before the media stage; a failed media archive or a failed
/// mail only degrade the summary. The media stage runs even when the dump was
/// skipped for the day, so a mid-day re-run refreshes the media archive
/// without ever rewriting the dump.
pub struct BackupJob {
    config: BackupConfig,
    dump_stage: DatabaseDumpStage,
    mailer: Box<dyn Mailer>,
}

impl BackupJob {
    pub fn new(config: BackupConfig) -> Result<Self> {
        let mailer = Box::new(SmtpMailer::new(config.mail.clone()));
        Ok(BackupJob {
            dump_stage: DatabaseDumpStage::locate()?,
            config,
            mailer,
        })
    }

    /// Assembles a job from explicit stages; used by tests to substitute the
    /// dump binary and the mail transport.
    pub fn with_stages(
        config: BackupConfig,
        dump_stage: DatabaseDumpStage,
        mailer: Box<dyn Mailer>,
    ) -> Self {
        BackupJob {
            config,
            dump_stage,
            mailer,
        }
    }

    /// Runs the job for today.
    pub fn run(&self) -> Result<RunOutcome> {
        self.run_for_date(Local::now().date_naive())
    }

    /// Runs the job for an explicit date. Every failure is caught here and
    /// converted into a logged outcome; only being unable to open the log
    /// file at all surfaces as an error.
    pub fn run_for_date(&self, date: NaiveDate) -> Result<RunOutcome> {
        let mut logger = Logger::open(&self.config.log_file)?;
        logger.log("Starting backup run.")?;

        let _lock = match RunLock::acquire(&self.config.backup_root) {
            Ok(lock) => lock,
            Err(e) => {
                logger.log(&format!("Backup run denied: {}", e))?;
                return Ok(RunOutcome::Aborted);
            }
        };

        match self.execute(date, &mut logger) {
            Ok(run) => {
                let dump_note = match run.dump {
                    Some(DumpResult::Skipped { .. }) => "dump skipped, already existed",
                    Some(DumpResult::Created { .. }) => "dump created",
                    None => "no dump",
                };
                logger.log(&format!(
                    "Backup run for {} completed ({}).",
                    run.date, dump_note
                ))?;
                Ok(RunOutcome::Completed)
            }
            Err(e) => {
                logger.log(&format!("Backup generation failed. {}", e))?;
                Ok(RunOutcome::Aborted)
            }
        }
    }

    fn execute(&self, date: NaiveDate, logger: &mut Logger) -> Result<BackupRun> {
        let mut run = BackupRun::new(date);

        let paths = paths::plan_for(&self.config.backup_root, &self.config.db_name, date)?;
        logger.log(&format!(
            "Backup directory ready at {}",
            paths.directory.display()
        ))?;

        let dump = self.dump_stage.dump(&self.config, &paths.dump_path, logger)?;
        run.dump_size = size::dump_size_of(dump.compressed_path(), logger)?;
        run.dump = Some(dump);

        // The media archive is refreshed even when the dump was skipped.
        run.media = Some(
            match media::archive(&self.config.upload_root, &paths.media_path, logger) {
                Ok(path) => MediaOutcome::Archived(path),
                Err(e) if !e.is_fatal() => MediaOutcome::Failed,
                Err(e) => return Err(e),
            },
        );

        run.message = notify::compose_message(
            &self.config,
            &run.dump_size,
            run.media.as_ref().unwrap_or(&MediaOutcome::Failed),
        );
        notify::notify(&self.config, &run.message, logger, self.mailer.as_ref())?;

        Ok(run)
    }
}
