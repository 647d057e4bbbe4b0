// backuptool/src/utils/logger.rs
use chrono::Local;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::errors::Result;

/// Append-only run log.
///
/// Every line is written as `[YYYY-MM-DD HH:MM:SS] message` to the configured
/// log file; the lines of the current run are also kept in memory, in write
/// order, so the orchestrator can inspect what a run produced.
pub struct Logger {
    path: PathBuf,
    lines: Vec<String>,
}

impl Logger {
    /// Opens a logger against `path`, creating the parent directory on demand.
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                fs::create_dir_all(parent)?;
            }
        }
        Ok(Logger {
            path: path.to_path_buf(),
            lines: Vec::new(),
        })
    }

    /// Appends one timestamped line to the log file.
    pub fn log(&mut self, message: &str) -> Result<()> {
        let timestamp = Local::now().format("[%Y-%m-%d %H:%M:%S]");
        let line = format!("{} {}", timestamp, message);

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        writeln!(file, "{}", line)?;

        println!("{}", message);
        self.lines.push(line);
        Ok(())
    }

    /// Lines written during this run, in order.
    pub fn lines(&self) -> &[String] {
        &self.lines
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_log_appends_timestamped_lines() -> Result<()> {
        let dir = TempDir::new()?;
        let log_path = dir.path().join("logs/backup-script.log");

        let mut logger = Logger::open(&log_path)?;
        logger.log("first message")?;
        logger.log("second message")?;

        let contents = std::fs::read_to_string(&log_path)?;
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].ends_with("first message"));
        assert!(lines[1].ends_with("second message"));
        // [YYYY-MM-DD HH:MM:SS] prefix
        assert!(lines[0].starts_with('['));
        assert_eq!(&lines[0][20..22], "] ");
        Ok(())
    }

    #[test]
    fn test_open_creates_log_directory() -> Result<()> {
        let dir = TempDir::new()?;
        let log_path = dir.path().join("a/b/c/backup.log");
        let mut logger = Logger::open(&log_path)?;
        logger.log("hello")?;
        assert!(log_path.exists());
        Ok(())
    }

    #[test]
    fn test_lines_are_kept_in_order() -> Result<()> {
        let dir = TempDir::new()?;
        let mut logger = Logger::open(&dir.path().join("run.log"))?;
        logger.log("one")?;
        logger.log("two")?;
        logger.log("three")?;
        let suffixes: Vec<&str> = logger
            .lines()
            .iter()
            .map(|l| l.splitn(3, ' ').nth(2).unwrap())
            .collect();
        assert_eq!(suffixes, vec!["one", "two", "three"]);
        Ok(())
    }
}
