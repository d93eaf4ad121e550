pub mod config;
pub mod content;
pub mod error;
pub mod state;
pub mod trial;
pub use config::ExperimentConfig;
pub use error::{ConfigError, TransitionError};
pub use state::{Effect, ExperimentEvent, ExperimentStateMachine};
pub use trial::{TrialCompletion, TrialSequencer};
