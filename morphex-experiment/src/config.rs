use morphex_core::QUESTIONNAIRE_SIZE;
use serde::Deserialize;

use crate::content::PRE_QUESTIONS;
use crate::error::ConfigError;

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ExperimentConfig {
    /// Seconds the writing task stays locked in `profile`.
    pub profile_countdown_secs: u32,
    /// Wording of the pre-questionnaire items; the count is fixed.
    pub questionnaire_items: Vec<String>,
}

impl ExperimentConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        let found = self.questionnaire_items.len();
        if found != QUESTIONNAIRE_SIZE {
            return Err(ConfigError::QuestionnaireSize {
                found,
                expected: QUESTIONNAIRE_SIZE,
            });
        }
        Ok(())
    }
}

impl Default for ExperimentConfig {
    fn default() -> Self {
        Self {
            profile_countdown_secs: 600,
            questionnaire_items: PRE_QUESTIONS.iter().map(|q| q.to_string()).collect(),
        }
    }
}
