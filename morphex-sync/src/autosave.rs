use std::path::PathBuf;
use std::sync::Arc;

use morphex_core::{ExportSnapshot, Mode, SaveKind, SaveOutcome};
use tracing::{debug, error, info, warn};

use crate::client::Collector;
use crate::config::SyncConfig;
use crate::error::Result;
use crate::export::write_snapshot;

/// Pushes snapshots to the collector.
///
/// Every call is independent: no queue, no ordering between calls. Each
/// snapshot is a full replacement so whichever arrives last wins.
pub struct AutosaveChannel<C> {
    collector: Arc<C>,
    export_dir: PathBuf,
}

impl<C: Collector> AutosaveChannel<C> {
    pub fn new(collector: Arc<C>, config: &SyncConfig) -> Self {
        Self {
            collector,
            export_dir: config.export_dir.clone(),
        }
    }

    pub async fn save(&self, kind: SaveKind, snapshot: &ExportSnapshot) -> SaveOutcome {
        match (snapshot.mode, kind) {
            (Mode::Demo, SaveKind::Partial) => {
                debug!("demo mode, partial save skipped");
                SaveOutcome::Skipped
            }
            (Mode::Demo, SaveKind::Final) => match self.export_local(snapshot).await {
                Ok(path) => SaveOutcome::ExportedLocally { path },
                Err(err) => {
                    error!(error = %err, "local export failed");
                    SaveOutcome::Failed {
                        reason: err.to_string(),
                    }
                }
            },
            (Mode::Production, _) => match self.collector.save_data(snapshot).await {
                Ok(response) => {
                    debug!(
                        ?kind,
                        trials = snapshot.experiment_data.len(),
                        participant_id = ?response.participant_id,
                        "snapshot stored"
                    );
                    SaveOutcome::Stored {
                        participant_id: response.participant_id,
                    }
                }
                Err(err) => {
                    match kind {
                        SaveKind::Partial => warn!(error = %err, "autosave failed"),
                        SaveKind::Final => error!(error = %err, "final save failed"),
                    }
                    SaveOutcome::Failed {
                        reason: err.to_string(),
                    }
                }
            },
        }
    }

    /// Writes the snapshot to the export directory, whatever the mode.
    pub async fn export_local(&self, snapshot: &ExportSnapshot) -> Result<PathBuf> {
        let path = write_snapshot(&self.export_dir, snapshot).await?;
        info!(path = %path.display(), mode = snapshot.mode.as_str(), "snapshot exported");
        Ok(path)
    }
}
