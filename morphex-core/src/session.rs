use std::collections::BTreeMap;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::trial::{Rating, TrialRecord};

/// Writing-task variant, drawn once per session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConditionGroup {
    Relationship,
    Grocery,
}

impl ConditionGroup {
    /// Fair coin flip.
    pub fn draw<R: Rng + ?Sized>(rng: &mut R) -> Self {
        if rng.random_bool(0.5) {
            Self::Relationship
        } else {
            Self::Grocery
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Gender {
    Male,
    Female,
}

impl std::str::FromStr for Gender {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "male" | "m" => Ok(Self::Male),
            "female" | "f" => Ok(Self::Female),
            other => Err(CoreError::UnknownGender(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Mode {
    #[default]
    Production,
    Demo,
}

impl Mode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Production => "production",
            Self::Demo => "demo",
        }
    }
}

/// Encoded image handed over by the capture step, usually a `data:` URI.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Photo(String);

impl Photo {
    /// Returns `None` for an empty capture.
    pub fn new(encoded: impl Into<String>) -> Option<Self> {
        let encoded = encoded.into();
        if encoded.trim().is_empty() {
            None
        } else {
            Some(Self(encoded))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Debug for Photo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Photo({} bytes)", self.0.len())
    }
}

/// Number of pre-questionnaire items; every one must be answered.
pub const QUESTIONNAIRE_SIZE: usize = 16;

/// Pre-questionnaire answers keyed by 1-based question index.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Questionnaire(BTreeMap<usize, Rating>);

impl Questionnaire {
    /// Stores (or overwrites) the answer for `index`.
    pub fn answer(&mut self, index: usize, value: Rating) -> Result<(), CoreError> {
        if index == 0 || index > QUESTIONNAIRE_SIZE {
            return Err(CoreError::QuestionOutOfRange {
                index,
                count: QUESTIONNAIRE_SIZE,
            });
        }
        self.0.insert(index, value);
        Ok(())
    }

    pub fn get(&self, index: usize) -> Option<Rating> {
        self.0.get(&index).copied()
    }

    pub fn answered(&self) -> usize {
        self.0.len()
    }

    pub fn is_complete(&self) -> bool {
        (1..=QUESTIONNAIRE_SIZE).all(|i| self.0.contains_key(&i))
    }
}

/// One participant's run.
#[derive(Debug, Clone)]
pub struct Session {
    session_id: Option<String>,
    condition: ConditionGroup,
    mode: Mode,
    trials: Vec<TrialRecord>,
    pub self_gender: Gender,
    pub partner_gender: Gender,
    pub self_photo: Option<Photo>,
    pub partner_photo: Option<Photo>,
    pub profile_text: String,
    pub questionnaire: Questionnaire,
}

impl Session {
    pub fn new(condition: ConditionGroup) -> Self {
        Self {
            session_id: None,
            condition,
            mode: Mode::Production,
            trials: Vec::new(),
            self_gender: Gender::Male,
            partner_gender: Gender::Female,
            self_photo: None,
            partner_photo: None,
            profile_text: String::new(),
            questionnaire: Questionnaire::default(),
        }
    }

    pub fn session_id(&self) -> Option<&str> {
        self.session_id.as_deref()
    }

    /// Keeps the first identifier the collector hands out.
    ///
    /// Returns `true` only when the id was adopted by this call.
    pub fn adopt_session_id(&mut self, id: &str) -> bool {
        if self.session_id.is_some() || id.is_empty() {
            return false;
        }
        self.session_id = Some(id.to_string());
        true
    }

    pub fn condition(&self) -> ConditionGroup {
        self.condition
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// Switches to demo mode for good. Returns `true` on the first switch.
    pub fn enter_demo_mode(&mut self) -> bool {
        let switched = self.mode == Mode::Production;
        self.mode = Mode::Demo;
        switched
    }

    pub fn trials(&self) -> &[TrialRecord] {
        &self.trials
    }

    /// Appends a completed trial. Records are never edited or removed.
    pub fn record_trial(&mut self, record: TrialRecord) {
        self.trials.push(record);
    }
}
