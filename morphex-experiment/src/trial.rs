use morphex_core::{Action, PendingTrial, Rating, StimulusSet, TrialRecord, TrialStep};
use morphex_timing::Timer;
use tracing::debug;

use crate::error::{Result, TransitionError};

/// Output of a confirmed rating.
#[derive(Debug, Clone, PartialEq)]
pub struct TrialCompletion {
    pub record: TrialRecord,
    /// The last stimulus of the block was just rated.
    pub block_finished: bool,
}

/// Walks a stimulus block, alternating card and rating steps.
#[derive(Debug, Clone)]
pub struct TrialSequencer<Ts> {
    current_index: usize,
    step: TrialStep,
    presented_at: Option<Ts>,
    pending: Option<PendingTrial>,
    desirability: Rating,
    willingness: Rating,
}

impl<Ts: Copy> Default for TrialSequencer<Ts> {
    fn default() -> Self {
        Self {
            current_index: 0,
            step: TrialStep::Card,
            presented_at: None,
            pending: None,
            desirability: Rating::NEUTRAL,
            willingness: Rating::NEUTRAL,
        }
    }
}

impl<Ts: Copy> TrialSequencer<Ts> {
    /// Shows the card for the current index and starts its clock.
    pub fn arm<T: Timer<Timestamp = Ts>>(&mut self, timer: &T) {
        self.step = TrialStep::Card;
        self.presented_at = Some(timer.now());
    }

    pub fn current_index(&self) -> usize {
        self.current_index
    }

    pub fn step(&self) -> TrialStep {
        self.step
    }

    pub fn ratings(&self) -> (Rating, Rating) {
        (self.desirability, self.willingness)
    }

    /// Answers the card. The stub is built from the stimulus on screen right now.
    pub fn submit_action<T: Timer<Timestamp = Ts>>(
        &mut self,
        action: Action,
        stimuli: &StimulusSet,
        timer: &T,
    ) -> Result<&PendingTrial> {
        if self.step != TrialStep::Card {
            return Err(TransitionError::WrongTrialStep { actual: self.step });
        }
        let stimulus = stimuli
            .get(self.current_index)
            .ok_or(TransitionError::MissingStimulus(self.current_index))?;

        let reaction_time_ms = self.presented_at.map_or(0, |ts| timer.elapsed_ms(ts));
        debug!(
            trial = self.current_index + 1,
            stimulus = %stimulus.id,
            ?action,
            reaction_time_ms,
            "card answered"
        );

        self.desirability = Rating::NEUTRAL;
        self.willingness = Rating::NEUTRAL;
        self.step = TrialStep::Rating;
        Ok(&*self.pending.insert(PendingTrial::capture(
            self.current_index,
            stimulus,
            action,
            reaction_time_ms,
        )))
    }

    /// Moves the rating sliders without confirming.
    pub fn adjust(&mut self, desirability: Option<Rating>, willingness: Option<Rating>) -> Result<()> {
        if self.step != TrialStep::Rating {
            return Err(TransitionError::WrongTrialStep { actual: self.step });
        }
        if let Some(d) = desirability {
            self.desirability = d;
        }
        if let Some(w) = willingness {
            self.willingness = w;
        }
        Ok(())
    }

    /// Confirms both ratings and advances to the next card, if any.
    pub fn submit_rating<T: Timer<Timestamp = Ts>>(
        &mut self,
        desirability: Rating,
        willingness: Rating,
        block_len: usize,
        timer: &T,
    ) -> Result<TrialCompletion> {
        if self.step != TrialStep::Rating {
            return Err(TransitionError::WrongTrialStep { actual: self.step });
        }
        let pending = self
            .pending
            .take()
            .ok_or(TransitionError::WrongTrialStep { actual: self.step })?;

        self.desirability = desirability;
        self.willingness = willingness;
        let record = pending.complete(desirability, willingness);

        let block_finished = self.current_index + 1 >= block_len;
        if !block_finished {
            self.current_index += 1;
            self.arm(timer);
        }
        Ok(TrialCompletion {
            record,
            block_finished,
        })
    }
}
