// backuptool/src/backup/media.rs
use flate2::Compression;
use flate2::write::GzEncoder;
use std::ffi::OsStr;
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use tar::Builder;
use walkdir::WalkDir;

use crate::errors::{BackupError, Result};
use crate::utils::logger::Logger;

/// Bundles the media tree into one compressed archive.
///
/// The upload-storage convention names media year/month directories with
/// purely numeric names; only those immediate children of the upload root are
/// archived. Everything else (the backups directory itself, logs, dotfiles)
/// is excluded, so a prior backup never ends up inside a new one. Paths in
/// the archive are relative to the upload root.
pub fn archive(upload_root: &Path, media_path: &Path, logger: &mut Logger) -> Result<PathBuf> {
    match build_archive(upload_root, media_path) {
        Ok(path) => {
            logger.log(&format!("Directories backed up to: {}", path.display()))?;
            Ok(path)
        }
        Err(e) => {
            logger.log(&format!("Failed to backup directories. {}", e))?;
            let _ = fs::remove_file(media_path);
            Err(BackupError::ArchiveFailed(e.to_string()))
        }
    }
}

fn build_archive(upload_root: &Path, media_path: &Path) -> std::io::Result<PathBuf> {
    let selected = numeric_children(upload_root)?;

    let archive_file = File::create(media_path)?;
    let enc = GzEncoder::new(archive_file, Compression::default());
    let mut tar_builder = Builder::new(enc);

    for dir in &selected {
        for entry in WalkDir::new(dir) {
            let entry = entry.map_err(std::io::Error::other)?;
            let path = entry.path();
            let name = path
                .strip_prefix(upload_root)
                .map_err(std::io::Error::other)?;

            if entry.file_type().is_dir() {
                tar_builder.append_dir(name, path)?;
            } else if entry.file_type().is_file() {
                tar_builder.append_path_with_name(path, name)?;
            }
        }
    }

    let encoder = tar_builder.into_inner()?;
    encoder.finish()?;

    Ok(media_path.to_path_buf())
}

/// Immediate children of the upload root with purely numeric names, sorted
/// for a stable archive layout.
fn numeric_children(upload_root: &Path) -> std::io::Result<Vec<PathBuf>> {
    let mut dirs = Vec::new();
    for entry in fs::read_dir(upload_root)? {
        let entry = entry?;
        if entry.file_type()?.is_dir() && is_numeric_name(&entry.file_name()) {
            dirs.push(entry.path());
        }
    }
    dirs.sort();
    Ok(dirs)
}

fn is_numeric_name(name: &OsStr) -> bool {
    match name.to_str() {
        Some(s) => !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit()),
        None => false,
    }
}
