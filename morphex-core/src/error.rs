use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum CoreError {
    #[error("rating {0} is outside the 1-7 scale")]
    RatingOutOfRange(u8),

    #[error("question index {index} is outside 1..={count}")]
    QuestionOutOfRange { index: usize, count: usize },

    #[error("unknown action: {0}")]
    UnknownAction(String),

    #[error("unknown gender: {0}")]
    UnknownGender(String),

    #[error("stimulus set is empty")]
    EmptyStimulusSet,

    #[error("duplicate stimulus id: {0}")]
    DuplicateStimulus(String),
}
