use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::stimulus::{Stimulus, StimulusKind};

/// Sub-step of a single trial
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrialStep {
    #[default]
    Card,
    Rating,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    Like,
    Dislike,
    Superlike,
}

impl std::str::FromStr for Action {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "like" => Ok(Self::Like),
            "dislike" => Ok(Self::Dislike),
            "superlike" => Ok(Self::Superlike),
            other => Err(CoreError::UnknownAction(other.to_string())),
        }
    }
}

/// A point on the 1–7 rating scale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct Rating(u8);

impl Rating {
    pub const MIN: u8 = 1;
    pub const MAX: u8 = 7;
    pub const NEUTRAL: Rating = Rating(4);

    pub fn new(value: u8) -> Result<Self, CoreError> {
        if (Self::MIN..=Self::MAX).contains(&value) {
            Ok(Self(value))
        } else {
            Err(CoreError::RatingOutOfRange(value))
        }
    }

    pub fn value(self) -> u8 {
        self.0
    }
}

impl Default for Rating {
    fn default() -> Self {
        Self::NEUTRAL
    }
}

impl TryFrom<u8> for Rating {
    type Error = CoreError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Rating> for u8 {
    fn from(rating: Rating) -> Self {
        rating.0
    }
}

/// Trial data captured when the card is answered, before the ratings exist.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingTrial {
    pub trial_index: usize,
    pub stimulus_id: String,
    pub stimulus_type: StimulusKind,
    pub ratio_level: f64,
    pub source_db_image: Option<String>,
    pub source_upload_image: Option<String>,
    pub action: Action,
    pub reaction_time_ms: u64,
}

impl PendingTrial {
    /// Copies everything needed from the presented stimulus so later index
    /// changes cannot leak into the record.
    pub fn capture(position: usize, stimulus: &Stimulus, action: Action, reaction_time_ms: u64) -> Self {
        Self {
            trial_index: position + 1,
            stimulus_id: stimulus.id.clone(),
            stimulus_type: stimulus.kind,
            ratio_level: stimulus.ratio_level(),
            source_db_image: stimulus.source_db.clone(),
            source_upload_image: stimulus.source_upload.clone(),
            action,
            reaction_time_ms,
        }
    }

    pub fn complete(self, desirability: Rating, willingness: Rating) -> TrialRecord {
        TrialRecord {
            trial_index: self.trial_index,
            stimulus_id: self.stimulus_id,
            stimulus_type: self.stimulus_type,
            ratio_level: self.ratio_level,
            source_db_image: self.source_db_image,
            source_upload_image: self.source_upload_image,
            action: self.action,
            reaction_time_ms: self.reaction_time_ms,
            rating_desirability: desirability,
            rating_willingness: willingness,
        }
    }
}

/// Recorded result per trial
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrialRecord {
    pub trial_index: usize,
    pub stimulus_id: String,
    pub stimulus_type: StimulusKind,
    pub ratio_level: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_db_image: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_upload_image: Option<String>,
    pub action: Action,
    pub reaction_time_ms: u64,
    pub rating_desirability: Rating,
    pub rating_willingness: Rating,
}
