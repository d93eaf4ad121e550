use std::path::{Path, PathBuf};

use morphex_core::ExportSnapshot;

use crate::error::Result;

/// `morphex_<mode>_<participant>_<UTC time>.json`
pub fn export_file_name(snapshot: &ExportSnapshot) -> String {
    let participant: String = snapshot
        .participant_id
        .as_deref()
        .unwrap_or("anonymous")
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '-' || *c == '_')
        .collect();
    format!(
        "morphex_{}_{}_{}.json",
        snapshot.mode.as_str(),
        if participant.is_empty() { "anonymous" } else { &participant },
        snapshot.timestamp.format("%Y%m%dT%H%M%SZ"),
    )
}

/// Writes the snapshot as pretty JSON into `dir`, creating it if needed.
pub async fn write_snapshot(dir: &Path, snapshot: &ExportSnapshot) -> Result<PathBuf> {
    tokio::fs::create_dir_all(dir).await?;
    let path = dir.join(export_file_name(snapshot));
    let body = serde_json::to_vec_pretty(snapshot)?;
    tokio::fs::write(&path, body).await?;
    Ok(path)
}
