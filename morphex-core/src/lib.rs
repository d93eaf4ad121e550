pub mod error;
pub mod export;
pub mod phase;
pub mod session;
pub mod stimulus;
pub mod trial;

pub use error::CoreError;
pub use export::{
    ExportSnapshot, GenderInfo, GeneratedStimuli, MorphRequest, MorphResponse, SaveKind,
    SaveOutcome, SaveResponse, SaveStatus, StimulusSource,
};
pub use phase::{ExperimentPhase, Phase};
pub use session::{ConditionGroup, Gender, Mode, Photo, QUESTIONNAIRE_SIZE, Questionnaire, Session};
pub use stimulus::{STIMULI_PER_KIND, STIMULUS_SET_SIZE, Stimulus, StimulusKind, StimulusSet};
pub use trial::{Action, PendingTrial, Rating, TrialRecord, TrialStep};
