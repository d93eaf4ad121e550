//! Runtime around the experiment state machine.
//!
//! The app owns the machine and is the only place that mutates it. Console
//! lines, countdown ticks and I/O completions all arrive on one channel and
//! are handled one at a time; saves and stimulus generation run as spawned
//! tasks that report back through the same channel.

use std::ops::ControlFlow;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use morphex_core::{ExperimentPhase, Phase, SaveKind, SaveOutcome, SaveStatus};
use morphex_experiment::{Effect, ExperimentEvent, ExperimentStateMachine, TransitionError};
use morphex_sync::{AutosaveChannel, Collector, StimulusProvider};
use morphex_timing::{Countdown, Timer};
use rand::Rng;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio::task::{JoinHandle, JoinSet};
use tracing::{debug, info, warn};

use crate::config::AppConfig;
use crate::console::{self, Command};

const TICK_PERIOD: Duration = Duration::from_secs(1);

#[derive(Debug)]
pub enum Input {
    Line(String),
    Event(ExperimentEvent),
    /// Console closed.
    Eof,
}

pub struct App<C, T>
where
    T: Timer,
{
    machine: ExperimentStateMachine<T>,
    autosave: Arc<AutosaveChannel<C>>,
    provider: Arc<StimulusProvider<C>>,
    countdown: Option<Countdown>,
    generation: Option<JoinHandle<()>>,
    saves: JoinSet<()>,
    tx: UnboundedSender<Input>,
    rx: UnboundedReceiver<Input>,
}

impl<C, T> App<C, T>
where
    C: Collector + 'static,
    T: Timer,
{
    pub fn new<R: Rng + ?Sized>(config: AppConfig, collector: Arc<C>, timer: T, rng: &mut R) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            machine: ExperimentStateMachine::new(config.experiment, timer, rng),
            autosave: Arc::new(AutosaveChannel::new(collector.clone(), &config.sync)),
            provider: Arc::new(StimulusProvider::new(collector, &config.sync)),
            countdown: None,
            generation: None,
            saves: JoinSet::new(),
            tx,
            rx,
        }
    }

    /// Handle for feeding console input into the loop.
    pub fn sender(&self) -> UnboundedSender<Input> {
        self.tx.clone()
    }

    pub fn machine(&self) -> &ExperimentStateMachine<T> {
        &self.machine
    }

    /// Runs until `quit` or end of input, then waits for saves in flight.
    pub async fn run(&mut self) -> Result<()> {
        println!("{}", console::render(&self.machine));

        while let Some(input) = self.rx.recv().await {
            let before = self.machine.current_phase();
            match input {
                Input::Line(line) => {
                    if self.on_line(&line).await.is_break() {
                        break;
                    }
                }
                Input::Event(event) => self.on_event(event),
                Input::Eof => {
                    debug!("console closed");
                    break;
                }
            }
            if self.machine.current_phase() != before {
                println!("{}", console::render(&self.machine));
            }
        }

        self.shutdown().await;
        Ok(())
    }

    async fn on_line(&mut self, line: &str) -> ControlFlow<()> {
        let command = match console::parse_command(line) {
            Ok(Some(command)) => command,
            Ok(None) => return ControlFlow::Continue(()),
            Err(err) => {
                println!("{err}");
                return ControlFlow::Continue(());
            }
        };

        let event = match command {
            Command::Quit => return ControlFlow::Break(()),
            Command::Help => {
                println!("{}", console::HELP);
                return ControlFlow::Continue(());
            }
            Command::Status => {
                self.print_status();
                return ControlFlow::Continue(());
            }
            Command::Export => {
                match self.autosave.export_local(&self.machine.snapshot()).await {
                    Ok(path) => println!("Data written to {}", path.display()),
                    Err(err) => println!("Export failed: {err}"),
                }
                return ControlFlow::Continue(());
            }
            other => match self.to_event(other) {
                Some(event) => event,
                None => return ControlFlow::Continue(()),
            },
        };

        let phase = self.machine.current_phase();
        if !phase.allows_input() {
            debug!(%phase, "input while waiting for stimuli");
            println!("Still generating your images, please wait.");
            return ControlFlow::Continue(());
        }
        match self.dispatch(event) {
            Ok(()) => {
                // phase changes are rendered by the loop
                if self.machine.current_phase() == phase {
                    println!("{}", console::render(&self.machine));
                }
            }
            Err(TransitionError::EmptyCapture) => debug!("empty capture ignored"),
            Err(err) => println!("{err}"),
        }
        ControlFlow::Continue(())
    }

    /// Resolves the phase-dependent commands into machine events. Console-only
    /// commands have no event.
    fn to_event(&self, command: Command) -> Option<ExperimentEvent> {
        let phase = self.machine.current_phase();
        let event = match command {
            Command::Gender {
                self_gender,
                partner_gender,
            } => ExperimentEvent::ConfirmGender {
                self_gender,
                partner_gender,
            },
            Command::Photo(path) => {
                let photo = console::load_photo(&path);
                if phase == ExperimentPhase::UploadPartner {
                    ExperimentEvent::CapturePartner(photo)
                } else {
                    ExperimentEvent::CaptureSelf(photo)
                }
            }
            Command::Continue => ExperimentEvent::ConfirmInstructions,
            Command::Write(line) => {
                let current = &self.machine.session().profile_text;
                if current.is_empty() {
                    ExperimentEvent::EditProfile(line)
                } else {
                    ExperimentEvent::EditProfile(format!("{current}\n{line}"))
                }
            }
            Command::Submit if phase == ExperimentPhase::Questionnaire => {
                ExperimentEvent::SubmitQuestionnaire
            }
            Command::Submit => ExperimentEvent::SubmitProfile,
            Command::Answer { index, value } => ExperimentEvent::AnswerQuestion { index, value },
            Command::Act(action) => ExperimentEvent::SubmitAction(action),
            Command::Adjust {
                desirability,
                willingness,
            } => ExperimentEvent::AdjustRating {
                desirability,
                willingness,
            },
            Command::Rate(explicit) => {
                let (desirability, willingness) =
                    explicit.unwrap_or_else(|| self.machine.current_ratings());
                ExperimentEvent::SubmitRating {
                    desirability,
                    willingness,
                }
            }
            Command::Save => ExperimentEvent::RequestFinalSave,
            Command::Quit | Command::Help | Command::Status | Command::Export => return None,
        };
        Some(event)
    }

    fn on_event(&mut self, event: ExperimentEvent) {
        let final_save = matches!(
            event,
            ExperimentEvent::SaveCompleted {
                kind: SaveKind::Final,
                ..
            }
        );
        let tick = matches!(event, ExperimentEvent::CountdownTick);

        if let Err(err) = self.dispatch(event) {
            warn!(error = %err, "runtime event rejected");
            return;
        }

        if final_save {
            match self.machine.save_status() {
                SaveStatus::Saved => println!("Your data has been saved. You may close the program."),
                _ => println!("Saving failed, type save to try again."),
            }
        }
        if tick && self.machine.can_submit_profile() {
            println!("{}", console::render(&self.machine));
        }
    }

    fn dispatch(&mut self, event: ExperimentEvent) -> std::result::Result<(), TransitionError> {
        let effects = self.machine.handle_event(event)?;
        for effect in effects {
            self.execute(effect);
        }
        Ok(())
    }

    fn execute(&mut self, effect: Effect) {
        match effect {
            Effect::Save { kind, snapshot } => {
                let autosave = self.autosave.clone();
                let tx = self.tx.clone();
                self.saves.spawn(async move {
                    let outcome = autosave.save(kind, &snapshot).await;
                    if let SaveOutcome::ExportedLocally { path } = &outcome {
                        println!("Data written to {}", path.display());
                    }
                    let _ = tx.send(Input::Event(ExperimentEvent::SaveCompleted { kind, outcome }));
                });
            }
            Effect::GenerateStimuli(request) => {
                let provider = self.provider.clone();
                let tx = self.tx.clone();
                self.generation = Some(tokio::spawn(async move {
                    let generated = provider.generate(&request).await;
                    let _ = tx.send(Input::Event(ExperimentEvent::StimuliReady(generated)));
                }));
            }
            Effect::StartCountdown { from_secs } => {
                self.countdown = Some(Countdown::spawn(
                    from_secs,
                    TICK_PERIOD,
                    self.tx.clone(),
                    || Input::Event(ExperimentEvent::CountdownTick),
                ));
            }
            Effect::CancelCountdown => {
                if let Some(mut countdown) = self.countdown.take() {
                    countdown.cancel();
                }
            }
        }
    }

    fn print_status(&self) {
        let session = self.machine.session();
        println!("{}", console::render(&self.machine));
        println!(
            "phase: {}  condition: {:?}  mode: {}  participant: {}  trials: {}",
            self.machine.current_phase(),
            session.condition(),
            session.mode().as_str(),
            session.session_id().unwrap_or("-"),
            session.trials().len()
        );
    }

    async fn shutdown(&mut self) {
        if let Some(mut countdown) = self.countdown.take() {
            countdown.cancel();
        }
        if let Some(generation) = self.generation.take() {
            generation.abort();
        }
        let pending = self.saves.len();
        if pending > 0 {
            info!(pending, "waiting for saves in flight");
        }
        while self.saves.join_next().await.is_some() {}
        info!(
            phase = %self.machine.current_phase(),
            trials = self.machine.session().trials().len(),
            "session closed"
        );
    }
}
