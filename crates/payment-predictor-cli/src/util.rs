use anyhow::{Context, Result};
use chrono::{DateTime, Local};
use std::fs;
use std::path::{Path, PathBuf};

pub fn validate_csv_file(path: &str) -> Result<()> {
    let pb = PathBuf::from(path);

    let ext = pb
        .extension()
        .and_then(|s| s.to_str())
        .map(|s| s.to_lowercase());
    match ext.as_deref() {
        Some("csv") => {}
        _ => anyhow::bail!("File must have a .csv extension: {}", path),
    }

    if !pb.exists() {
        anyhow::bail!("File does not exist: {}", path);
    }

    Ok(())
}

pub fn validate_json_file(path: &str) -> Result<()> {
    let pb = PathBuf::from(path);
    if pb.extension().and_then(|s| s.to_str()) != Some("json") {
        anyhow::bail!("File must have a .json extension: {}", path);
    }
    if !pb.exists() {
        anyhow::bail!("File does not exist: {}", path);
    }
    Ok(())
}

/// Folder name for a run: `Individual{mmddYYYY}` for single customers,
/// `Full{mmddYYYY_HHMMSS}` for full runs.
pub fn run_folder_name(individual: bool, now: &DateTime<Local>) -> String {
    if individual {
        format!("Individual{}", now.format("%m%d%Y"))
    } else {
        format!("Full{}", now.format("%m%d%Y_%H%M%S"))
    }
}

/// Create (if needed) and return the dated output folder under `base`.
pub fn create_run_dir(base: &Path, individual: bool) -> Result<PathBuf> {
    let dir = base.join(run_folder_name(individual, &Local::now()));
    fs::create_dir_all(&dir)
        .with_context(|| format!("Failed to create output folder: {}", dir.display()))?;
    Ok(dir)
}
