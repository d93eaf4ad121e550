use std::sync::Arc;
use std::time::Duration;

use morphex_core::{GeneratedStimuli, MorphRequest, STIMULUS_SET_SIZE, StimulusSet, StimulusSource};
use tokio::time;
use tracing::{info, warn};

use crate::client::Collector;
use crate::config::SyncConfig;
use crate::error::{Result, SyncError};

/// Produces the stimulus block, live if possible, demo otherwise.
///
/// Never fails: any collector error, timeout or unusable payload turns into
/// a demo block after `fallback_delay`.
pub struct StimulusProvider<C> {
    collector: Arc<C>,
    morph_timeout: Duration,
    fallback_delay: Duration,
}

impl<C: Collector> StimulusProvider<C> {
    pub fn new(collector: Arc<C>, config: &SyncConfig) -> Self {
        Self {
            collector,
            morph_timeout: config.morph_timeout(),
            fallback_delay: config.fallback_delay(),
        }
    }

    pub async fn generate(&self, request: &MorphRequest) -> GeneratedStimuli {
        match self.fetch_live(request).await {
            Ok(stimuli) => {
                if stimuli.len() != STIMULUS_SET_SIZE {
                    warn!(
                        count = stimuli.len(),
                        expected = STIMULUS_SET_SIZE,
                        "morph service returned an unusual block size, using it as is"
                    );
                }
                info!(count = stimuli.len(), "live stimuli received");
                GeneratedStimuli {
                    stimuli,
                    source: StimulusSource::Live,
                }
            }
            Err(err) => {
                warn!(error = %err, "stimulus generation failed, switching to demo block");
                time::sleep(self.fallback_delay).await;
                let stimuli = StimulusSet::demo(&mut rand::rng());
                GeneratedStimuli {
                    stimuli,
                    source: StimulusSource::Fallback {
                        reason: err.to_string(),
                    },
                }
            }
        }
    }

    /// Dropping the request future on timeout aborts the call in flight.
    async fn fetch_live(&self, request: &MorphRequest) -> Result<StimulusSet> {
        let images = time::timeout(self.morph_timeout, self.collector.merge_faces(request))
            .await
            .map_err(|_| SyncError::Timeout(self.morph_timeout))??;
        StimulusSet::new(images).map_err(|e| SyncError::Malformed(e.to_string()))
    }
}
