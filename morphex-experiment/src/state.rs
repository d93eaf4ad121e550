use chrono::Utc;
use morphex_core::{
    Action, ConditionGroup, ExperimentPhase, ExportSnapshot, Gender, GeneratedStimuli, Mode,
    MorphRequest, Phase, Photo, QUESTIONNAIRE_SIZE, Rating, SaveKind, SaveOutcome, SaveStatus,
    Session, Stimulus, StimulusSet, TrialStep,
};
use morphex_timing::Timer;
use rand::Rng;
use tracing::{debug, info, warn};

use super::config::ExperimentConfig;
use super::error::{Result, TransitionError};
use super::trial::TrialSequencer;

/// Everything the participant (or an I/O completion) can feed into the machine.
#[derive(Debug, Clone, PartialEq)]
pub enum ExperimentEvent {
    ConfirmGender {
        self_gender: Gender,
        partner_gender: Gender,
    },
    CaptureSelf(Option<Photo>),
    CapturePartner(Option<Photo>),
    StimuliReady(GeneratedStimuli),
    ConfirmInstructions,
    EditProfile(String),
    CountdownTick,
    SubmitProfile,
    AnswerQuestion {
        index: usize,
        value: Rating,
    },
    SubmitQuestionnaire,
    SubmitAction(Action),
    AdjustRating {
        desirability: Option<Rating>,
        willingness: Option<Rating>,
    },
    SubmitRating {
        desirability: Rating,
        willingness: Rating,
    },
    RequestFinalSave,
    SaveCompleted {
        kind: SaveKind,
        outcome: SaveOutcome,
    },
}

/// Side effects requested by a transition, executed by the runtime.
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    Save {
        kind: SaveKind,
        snapshot: ExportSnapshot,
    },
    GenerateStimuli(MorphRequest),
    StartCountdown {
        from_secs: u32,
    },
    CancelCountdown,
}

/// Top-level experiment flow as a reducer.
///
/// `handle_event` either rejects an event without touching any state, or
/// applies it and returns the effects the caller has to run.
pub struct ExperimentStateMachine<T>
where
    T: Timer,
{
    phase: ExperimentPhase,
    session: Session,
    stimuli: Option<StimulusSet>,
    sequencer: TrialSequencer<T::Timestamp>,
    countdown_remaining: u32,
    save_status: SaveStatus,
    config: ExperimentConfig,
    timer: T,
}

impl<T> ExperimentStateMachine<T>
where
    T: Timer,
{
    /// Draws the condition group once; it never changes afterwards.
    pub fn new<R: Rng + ?Sized>(config: ExperimentConfig, timer: T, rng: &mut R) -> Self {
        let condition = ConditionGroup::draw(rng);
        info!(?condition, "experiment condition assigned");
        Self {
            phase: ExperimentPhase::default(),
            session: Session::new(condition),
            stimuli: None,
            sequencer: TrialSequencer::default(),
            countdown_remaining: config.profile_countdown_secs,
            save_status: SaveStatus::Idle,
            config,
            timer,
        }
    }

    pub fn handle_event(&mut self, event: ExperimentEvent) -> Result<Vec<Effect>> {
        use ExperimentEvent::*;
        use ExperimentPhase as P;

        let mut effects = Vec::new();
        match event {
            ConfirmGender {
                self_gender,
                partner_gender,
            } => {
                self.expect(P::GenderSelect)?;
                self.session.self_gender = self_gender;
                self.session.partner_gender = partner_gender;
                self.advance(&mut effects);
            }

            CaptureSelf(photo) => {
                self.expect(P::UploadSelf)?;
                let photo = photo.ok_or(TransitionError::EmptyCapture)?;
                self.session.self_photo = Some(photo);
                self.advance(&mut effects);
            }

            CapturePartner(photo) => {
                self.expect(P::UploadPartner)?;
                let partner_image = photo.ok_or(TransitionError::EmptyCapture)?;
                let self_image = self
                    .session
                    .self_photo
                    .clone()
                    .ok_or(TransitionError::EmptyCapture)?;
                effects.push(Effect::GenerateStimuli(MorphRequest {
                    self_image,
                    partner_image: partner_image.clone(),
                    self_gender: self.session.self_gender,
                    partner_gender: self.session.partner_gender,
                }));
                self.session.partner_photo = Some(partner_image);
                self.advance(&mut effects);
            }

            StimuliReady(generated) => {
                self.expect(P::Processing)?;
                if generated.stimuli.is_empty() {
                    return Err(TransitionError::EmptyStimulusSet);
                }
                if generated.is_fallback() && self.session.enter_demo_mode() {
                    warn!(source = ?generated.source, "morph service unavailable, running in demo mode");
                }
                info!(count = generated.stimuli.len(), "stimulus block ready");
                self.stimuli = Some(generated.stimuli);
                self.advance(&mut effects);
            }

            ConfirmInstructions => {
                self.expect(P::Instructions)?;
                self.advance(&mut effects);
            }

            EditProfile(text) => {
                self.expect(P::Profile)?;
                self.session.profile_text = text;
            }

            CountdownTick => {
                if !self.phase.is_timed() || self.countdown_remaining == 0 {
                    debug!(phase = %self.phase, "stale countdown tick ignored");
                    return Ok(effects);
                }
                self.countdown_remaining -= 1;
                if self.countdown_remaining == 0 {
                    info!("writing task unlocked");
                }
            }

            SubmitProfile => {
                self.expect(P::Profile)?;
                if self.countdown_remaining > 0 {
                    return Err(TransitionError::CountdownRunning {
                        remaining: self.countdown_remaining,
                    });
                }
                self.advance(&mut effects);
            }

            AnswerQuestion { index, value } => {
                self.expect(P::Questionnaire)?;
                self.session
                    .questionnaire
                    .answer(index, value)?;
            }

            SubmitQuestionnaire => {
                self.expect(P::Questionnaire)?;
                if !self.questionnaire_complete() {
                    return Err(TransitionError::QuestionnaireIncomplete {
                        answered: self.session.questionnaire.answered(),
                        required: QUESTIONNAIRE_SIZE,
                    });
                }
                self.advance(&mut effects);
            }

            SubmitAction(action) => {
                self.expect(P::Experiment)?;
                let stimuli = self
                    .stimuli
                    .as_ref()
                    .ok_or(TransitionError::EmptyStimulusSet)?;
                self.sequencer.submit_action(action, stimuli, &self.timer)?;
            }

            AdjustRating {
                desirability,
                willingness,
            } => {
                self.expect(P::Experiment)?;
                self.sequencer.adjust(desirability, willingness)?;
            }

            SubmitRating {
                desirability,
                willingness,
            } => {
                self.expect(P::Experiment)?;
                let total = self.block_len();
                let completion =
                    self.sequencer
                        .submit_rating(desirability, willingness, total, &self.timer)?;
                info!(
                    trial = completion.record.trial_index,
                    total,
                    "trial recorded"
                );
                self.session.record_trial(completion.record);
                if completion.block_finished {
                    self.advance(&mut effects);
                }
                // autosave for the new record, built after the phase settled
                effects.insert(0, self.save_effect(SaveKind::Partial));
            }

            RequestFinalSave => {
                self.expect(P::Finish)?;
                self.save_status = SaveStatus::Saving;
                effects.push(self.save_effect(SaveKind::Final));
            }

            SaveCompleted { kind, outcome } => self.apply_save_outcome(kind, outcome),
        }
        Ok(effects)
    }

    fn expect(&self, expected: ExperimentPhase) -> Result<()> {
        if self.phase == expected {
            Ok(())
        } else {
            Err(TransitionError::WrongPhase {
                expected,
                actual: self.phase,
            })
        }
    }

    fn advance(&mut self, effects: &mut Vec<Effect>) {
        let Some(next) = self.phase.next() else {
            return;
        };
        let prev = self.phase;
        if prev.is_timed() {
            effects.push(Effect::CancelCountdown);
        }
        self.phase = next;
        info!(from = %prev, to = %next, "phase transition");

        if next.is_timed() {
            self.countdown_remaining = self.config.profile_countdown_secs;
            if self.countdown_remaining > 0 {
                effects.push(Effect::StartCountdown {
                    from_secs: self.countdown_remaining,
                });
            }
        }
        if next.is_experiment() {
            self.sequencer = TrialSequencer::default();
            self.sequencer.arm(&self.timer);
        }
        effects.push(self.save_effect(SaveKind::Partial));
    }

    fn apply_save_outcome(&mut self, kind: SaveKind, outcome: SaveOutcome) {
        if let SaveOutcome::Stored {
            participant_id: Some(id),
        } = &outcome
        {
            if self.session.adopt_session_id(id) {
                info!(participant_id = %id, "participant id assigned by collector");
            } else if self.session.session_id() != Some(id.as_str()) {
                debug!(ignored = %id, "keeping first participant id");
            }
        }

        if kind == SaveKind::Final {
            self.save_status = match outcome {
                SaveOutcome::Failed { .. } => SaveStatus::Error,
                _ => SaveStatus::Saved,
            };
        }
    }

    fn save_effect(&self, kind: SaveKind) -> Effect {
        Effect::Save {
            kind,
            snapshot: self.snapshot(),
        }
    }

    /// Fresh export of the current state.
    pub fn snapshot(&self) -> ExportSnapshot {
        ExportSnapshot::capture(&self.session, self.phase, Utc::now())
    }

    /// Returns current phase
    pub fn current_phase(&self) -> ExperimentPhase {
        self.phase
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn config(&self) -> &ExperimentConfig {
        &self.config
    }

    /// The block in use; `None` until generation has finished.
    pub fn stimuli(&self) -> Option<&StimulusSet> {
        self.stimuli.as_ref()
    }

    fn block_len(&self) -> usize {
        self.stimuli.as_ref().map_or(0, StimulusSet::len)
    }

    /// Stimulus on screen, only while a card is shown.
    pub fn current_stimulus(&self) -> Option<&Stimulus> {
        if self.phase.is_experiment() && self.sequencer.step() == TrialStep::Card {
            self.stimuli.as_ref()?.get(self.sequencer.current_index())
        } else {
            None
        }
    }

    pub fn current_trial_step(&self) -> Option<TrialStep> {
        self.phase.is_experiment().then(|| self.sequencer.step())
    }

    pub fn current_ratings(&self) -> (Rating, Rating) {
        self.sequencer.ratings()
    }

    pub fn trial_progress(&self) -> Option<(usize, usize)> {
        self.phase
            .is_experiment()
            .then(|| (self.sequencer.current_index() + 1, self.block_len()))
    }

    pub fn countdown_remaining(&self) -> u32 {
        self.countdown_remaining
    }

    pub fn can_submit_profile(&self) -> bool {
        self.phase.is_timed() && self.countdown_remaining == 0
    }

    pub fn questionnaire_complete(&self) -> bool {
        self.session.questionnaire.is_complete()
    }

    pub fn save_status(&self) -> SaveStatus {
        self.save_status
    }

    /// Demo banner is shown on the instructions page only.
    pub fn show_demo_advisory(&self) -> bool {
        self.phase == ExperimentPhase::Instructions && self.session.mode() == Mode::Demo
    }

    pub fn is_complete(&self) -> bool {
        self.phase.is_terminal()
    }
}
