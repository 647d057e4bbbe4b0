// backuptool/src/backup/size.rs
use std::fs;
use std::path::Path;

use crate::errors::Result;
use crate::utils::logger::Logger;

const UNITS: &[&str] = &["Bytes", "KB", "MB", "GB", "TB"];

/// Formats a byte count with the largest unit whose magnitude is >= 1,
/// rounded to two decimal places. Zero is special-cased: log2(0) has no
/// answer, and "0 Bytes" is what a reader expects anyway.
pub fn format_size(bytes: u64) -> String {
    if bytes == 0 {
        return "0 Bytes".to_string();
    }

    let exponent = ((bytes as f64).log2() / 10.0).floor() as usize;
    let exponent = exponent.min(UNITS.len() - 1);
    let value = bytes as f64 / 1024f64.powi(exponent as i32);
    let rounded = (value * 100.0).round() / 100.0;

    format!("{} {}", trim_decimals(rounded), UNITS[exponent])
}

/// Reads the size of the compressed dump artifact and formats it.
/// An unreadable file is logged and reported as "Unknown size" rather than
/// failing the run.
pub fn dump_size_of(compressed_path: &Path, logger: &mut Logger) -> Result<String> {
    match fs::metadata(compressed_path) {
        Ok(meta) => {
            let formatted = format_size(meta.len());
            logger.log(&format!("Dump size: {}", formatted))?;
            Ok(formatted)
        }
        Err(e) => {
            logger.log(&format!(
                "ERROR: Could not calculate file size for {}: {}",
                compressed_path.display(),
                e
            ))?;
            Ok("Unknown size".to_string())
        }
    }
}

fn trim_decimals(value: f64) -> String {
    let s = format!("{:.2}", value);
    let s = s.trim_end_matches('0').trim_end_matches('.');
    s.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_zero_bytes() {
        assert_eq!(format_size(0), "0 Bytes");
    }

    #[test]
    fn test_exact_unit_boundaries() {
        assert_eq!(format_size(1), "1 Bytes");
        assert_eq!(format_size(1024), "1 KB");
        assert_eq!(format_size(1024 * 1024), "1 MB");
        assert_eq!(format_size(1024 * 1024 * 1024), "1 GB");
        assert_eq!(format_size(1024u64.pow(4)), "1 TB");
    }

    #[test]
    fn test_fractional_values_round_to_two_decimals() {
        assert_eq!(format_size(1536), "1.5 KB");
        assert_eq!(format_size(1023), "1023 Bytes");
        assert_eq!(format_size(1_500_000), "1.43 MB");
    }

    #[test]
    fn test_just_below_a_boundary_stays_in_lower_unit() {
        assert_eq!(format_size(1024 * 1024 - 1), "1024 KB");
    }

    #[test]
    fn test_missing_file_reports_unknown_size() -> Result<()> {
        let dir = TempDir::new()?;
        let mut logger = Logger::open(&dir.path().join("run.log"))?;
        let size = dump_size_of(&dir.path().join("nope.sql.gz"), &mut logger)?;
        assert_eq!(size, "Unknown size");
        assert!(
            logger
                .lines()
                .iter()
                .any(|l| l.contains("Could not calculate file size"))
        );
        Ok(())
    }

    #[test]
    fn test_readable_file_logs_its_size() -> Result<()> {
        let dir = TempDir::new()?;
        std::fs::write(dir.path().join("dump.sql.gz"), vec![0u8; 2048])?;
        let mut logger = Logger::open(&dir.path().join("run.log"))?;
        let size = dump_size_of(&dir.path().join("dump.sql.gz"), &mut logger)?;
        assert_eq!(size, "2 KB");
        assert!(logger.lines().iter().any(|l| l.contains("Dump size: 2 KB")));
        Ok(())
    }
}
