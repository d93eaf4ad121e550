use morphex_core::{CoreError, ExperimentPhase, TrialStep};
use thiserror::Error;

/// Why an event was rejected. A rejected event leaves the machine untouched.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum TransitionError {
    #[error("event not accepted in phase {actual} (expected {expected})")]
    WrongPhase {
        expected: ExperimentPhase,
        actual: ExperimentPhase,
    },

    #[error("event not accepted during trial step {actual:?}")]
    WrongTrialStep { actual: TrialStep },

    #[error("capture produced no image")]
    EmptyCapture,

    #[error("writing task still locked for {remaining}s")]
    CountdownRunning { remaining: u32 },

    #[error("questionnaire incomplete: {answered}/{required} answered")]
    QuestionnaireIncomplete { answered: usize, required: usize },

    #[error("stimulus block is empty")]
    EmptyStimulusSet,

    #[error("no stimulus at position {0}")]
    MissingStimulus(usize),

    #[error(transparent)]
    Core(#[from] CoreError),
}

/// Rejected experiment configuration.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ConfigError {
    #[error("questionnaire needs exactly {expected} items, found {found}")]
    QuestionnaireSize { found: usize, expected: usize },
}

pub type Result<T> = std::result::Result<T, TransitionError>;
