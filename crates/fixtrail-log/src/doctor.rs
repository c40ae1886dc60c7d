use anyhow::Result;
use std::path::Path;

use crate::config::WriterConfig;

pub fn check_writer_config(cfg: &WriterConfig) -> Result<()> {
    anyhow::ensure!(cfg.poll_interval_ms >= 10, "writer.poll_interval_ms too low");
    anyhow::ensure!(cfg.poll_interval_ms <= 60_000, "writer.poll_interval_ms should be <= 60000");
    Ok(())
}

pub fn check_output_path(path: &Path) -> Result<()> {
    anyhow::ensure!(path.file_name().is_some(), "output.path has no file name");
    anyhow::ensure!(!path.is_dir(), "output.path {} is a directory", path.display());
    // Basic sanity: the parent must already exist, we never create directories
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        anyhow::ensure!(dir.is_dir(), "output directory {} does not exist", dir.display());
    }
    Ok(())
}
