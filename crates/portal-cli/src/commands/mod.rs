//! Command handlers

pub mod account;
pub mod answer;
pub mod config;
pub mod paper;
pub mod status;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use portal_core::DownloadedFile;

/// Write a downloaded file to `target`, or to its stored name in the
/// current directory
pub(crate) fn save_download(file: &DownloadedFile, target: Option<PathBuf>) -> Result<PathBuf> {
    let path = target.unwrap_or_else(|| default_download_path(&file.file_name));
    std::fs::write(&path, &file.bytes)
        .with_context(|| format!("Failed to write file {:?}", path))?;
    Ok(path)
}

/// Stored file names are only trusted for their final component
fn default_download_path(file_name: &str) -> PathBuf {
    Path::new(file_name)
        .file_name()
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("download"))
}
