//! Snapshot and wire types shared between the state machine and the collector client.

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::phase::{ExperimentPhase, Phase};
use crate::session::{ConditionGroup, Gender, Mode, Photo, Questionnaire, Session};
use crate::stimulus::{Stimulus, StimulusSet};
use crate::trial::TrialRecord;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenderInfo {
    #[serde(rename = "self")]
    pub self_gender: Gender,
    #[serde(rename = "partner")]
    pub partner_gender: Gender,
}

/// Full experiment state pushed to the collector. Each snapshot replaces
/// the previous one, so saves may arrive out of order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportSnapshot {
    pub participant_id: Option<String>,
    pub timestamp: DateTime<Utc>,
    pub condition_group: ConditionGroup,
    pub gender_info: GenderInfo,
    pub user_profile: String,
    pub pre_questionnaire: Questionnaire,
    pub experiment_data: Vec<TrialRecord>,
    pub mode: Mode,
    pub is_complete: bool,
}

impl ExportSnapshot {
    pub fn capture(session: &Session, phase: ExperimentPhase, timestamp: DateTime<Utc>) -> Self {
        Self {
            participant_id: session.session_id().map(str::to_string),
            timestamp,
            condition_group: session.condition(),
            gender_info: GenderInfo {
                self_gender: session.self_gender,
                partner_gender: session.partner_gender,
            },
            user_profile: session.profile_text.clone(),
            pre_questionnaire: session.questionnaire.clone(),
            experiment_data: session.trials().to_vec(),
            mode: session.mode(),
            is_complete: phase.is_terminal(),
        }
    }

    /// Compares everything except the capture time.
    pub fn same_content(&self, other: &Self) -> bool {
        Self {
            timestamp: other.timestamp,
            ..self.clone()
        } == *other
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MorphRequest {
    pub self_image: Photo,
    pub partner_image: Photo,
    pub self_gender: Gender,
    pub partner_gender: Gender,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MorphResponse {
    pub images: Vec<Stimulus>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SaveResponse {
    #[serde(default)]
    pub participant_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum StimulusSource {
    Live,
    Fallback { reason: String },
}

/// Result of the processing step, whichever path produced it.
#[derive(Debug, Clone, PartialEq)]
pub struct GeneratedStimuli {
    pub stimuli: StimulusSet,
    pub source: StimulusSource,
}

impl GeneratedStimuli {
    pub fn is_fallback(&self) -> bool {
        matches!(self.source, StimulusSource::Fallback { .. })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SaveKind {
    /// Best-effort autosave; failures are only logged.
    Partial,
    /// Participant-initiated save at the end; failures are shown and retryable.
    Final,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SaveOutcome {
    Stored { participant_id: Option<String> },
    ExportedLocally { path: PathBuf },
    Skipped,
    Failed { reason: String },
}

/// Participant-visible indicator, driven by final saves only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SaveStatus {
    #[default]
    Idle,
    Saving,
    Saved,
    Error,
}
