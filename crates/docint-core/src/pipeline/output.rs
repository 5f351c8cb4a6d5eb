//! Atomic persistence of the run report.

use std::io::Write;
use std::path::Path;

use tempfile::NamedTempFile;
use tracing::debug;

use crate::error::Result;
use crate::models::report::FinalReport;

/// Replace the file at `path` with the serialized report.
///
/// The report is written to a temporary file in the same directory and then
/// renamed over the target, so readers see either the previous report or the
/// new one in full.
pub fn write_report(path: &Path, report: &FinalReport, pretty: bool) -> Result<()> {
    let json = if pretty {
        serde_json::to_string_pretty(report)?
    } else {
        serde_json::to_string(report)?
    };

    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(dir)?;

    let mut file = NamedTempFile::new_in(dir)?;
    file.write_all(json.as_bytes())?;
    file.write_all(b"\n")?;
    file.as_file().sync_all()?;
    file.persist(path).map_err(|e| e.error)?;

    debug!("Wrote report to {}", path.display());
    Ok(())
}

/// Read a previously written report.
pub fn read_report(path: &Path) -> Result<FinalReport> {
    let content = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&content)?)
}
