//! Line-based participant console.
//!
//! One command per line. What a command means can depend on the phase
//! (`photo`, `submit`); the app resolves that, this module only parses and
//! renders.

use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use morphex_core::{
    Action, ExperimentPhase, Gender, Photo, Rating, SaveStatus, StimulusSet, TrialStep,
};
use morphex_experiment::ExperimentStateMachine;
use morphex_experiment::content::{DEMO_ADVISORY, writing_placeholder, writing_prompt};
use morphex_timing::Timer;
use tracing::debug;

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Gender {
        self_gender: Gender,
        partner_gender: Gender,
    },
    Photo(PathBuf),
    Continue,
    Write(String),
    Submit,
    Answer {
        index: usize,
        value: Rating,
    },
    Act(Action),
    Adjust {
        desirability: Option<Rating>,
        willingness: Option<Rating>,
    },
    /// Confirm the rating step, optionally with explicit values.
    Rate(Option<(Rating, Rating)>),
    Save,
    Export,
    Status,
    Help,
    Quit,
}

pub const HELP: &str = "\
commands:
  gender <male|female> <male|female>   your gender, then your partner's
  photo <path>                         upload the requested photo
  next                                 continue past the instructions
  write <text>                         add a line to your text
  answer <n> <1-7>                     answer question n
  submit                               submit the text or the questionnaire
  like | dislike | superlike           react to the image shown
  d <1-7> | w <1-7>                    adjust desirability / willingness
  rate [<d> <w>]                       confirm the ratings
  save                                 send your data
  export                               write your data to a local file
  status                               show where you are
  quit";

/// Parses one input line. Blank lines yield `None`.
pub fn parse_command(line: &str) -> Result<Option<Command>> {
    let line = line.trim();
    let Some(keyword) = line.split_whitespace().next() else {
        return Ok(None);
    };
    let rest = line[keyword.len()..].trim();
    let args: Vec<&str> = rest.split_whitespace().collect();

    let command = match keyword.to_ascii_lowercase().as_str() {
        "gender" => match args.as_slice() {
            [own, partner] => Command::Gender {
                self_gender: own.to_ascii_lowercase().parse()?,
                partner_gender: partner.to_ascii_lowercase().parse()?,
            },
            _ => bail!("usage: gender <male|female> <male|female>"),
        },
        "photo" => {
            if rest.is_empty() {
                bail!("usage: photo <path>");
            }
            Command::Photo(PathBuf::from(rest))
        }
        "next" | "continue" => Command::Continue,
        "write" => Command::Write(rest.to_string()),
        "submit" => Command::Submit,
        "answer" => match args.as_slice() {
            [index, value] => Command::Answer {
                index: index
                    .parse()
                    .with_context(|| format!("not a question number: {index}"))?,
                value: parse_rating(value)?,
            },
            _ => bail!("usage: answer <n> <1-7>"),
        },
        action @ ("like" | "dislike" | "superlike") => Command::Act(action.parse()?),
        "d" => Command::Adjust {
            desirability: Some(single_rating(&args)?),
            willingness: None,
        },
        "w" => Command::Adjust {
            desirability: None,
            willingness: Some(single_rating(&args)?),
        },
        "rate" => match args.as_slice() {
            [] => Command::Rate(None),
            [d, w] => Command::Rate(Some((parse_rating(d)?, parse_rating(w)?))),
            _ => bail!("usage: rate [<d> <w>]"),
        },
        "save" => Command::Save,
        "export" => Command::Export,
        "status" => Command::Status,
        "help" | "?" => Command::Help,
        "quit" | "exit" => Command::Quit,
        other => bail!("unknown command '{other}', type 'help'"),
    };
    Ok(Some(command))
}

fn parse_rating(raw: &str) -> Result<Rating> {
    let value: u8 = raw
        .parse()
        .with_context(|| format!("not a rating: {raw}"))?;
    Ok(Rating::new(value)?)
}

fn single_rating(args: &[&str]) -> Result<Rating> {
    match args {
        [value] => parse_rating(value),
        _ => bail!("expected one value between 1 and 7"),
    }
}

/// Reads an image file into a `data:` URI. Anything unreadable or not
/// recognisable as an image counts as an empty capture.
pub fn load_photo(path: &Path) -> Option<Photo> {
    let bytes = match std::fs::read(path) {
        Ok(bytes) => bytes,
        Err(err) => {
            debug!(path = %path.display(), error = %err, "photo not readable");
            return None;
        }
    };
    if bytes.is_empty() {
        return None;
    }
    match image::guess_format(&bytes) {
        Ok(format) => Photo::new(format!(
            "data:{};base64,{}",
            format.to_mime_type(),
            STANDARD.encode(&bytes)
        )),
        Err(err) => {
            debug!(path = %path.display(), error = %err, "not an image");
            None
        }
    }
}

fn mm_ss(secs: u32) -> String {
    format!("{:02}:{:02}", secs / 60, secs % 60)
}

/// The screen for the current phase, as text.
pub fn render<T: Timer>(machine: &ExperimentStateMachine<T>) -> String {
    let mut out = String::new();
    let session = machine.session();

    // writes to a String cannot fail
    let _ = match machine.current_phase() {
        ExperimentPhase::GenderSelect => writeln!(
            out,
            "Select your gender and your partner's gender:\n  gender <male|female> <male|female>"
        ),
        ExperimentPhase::UploadSelf => {
            writeln!(out, "Upload a clear, front-facing photo of yourself:\n  photo <path>")
        }
        ExperimentPhase::UploadPartner => {
            writeln!(out, "Upload a clear, front-facing photo of your partner:\n  photo <path>")
        }
        ExperimentPhase::Processing => writeln!(out, "Generating your images, please wait..."),
        ExperimentPhase::Instructions => {
            if machine.show_demo_advisory() {
                let _ = writeln!(out, "[{DEMO_ADVISORY}]\n");
            }
            writeln!(
                out,
                "You will see {} faces, one at a time. React to each with like, dislike or \
                 superlike, then rate how desirable the person is and how willing you would \
                 be to meet them, from 1 to 7.\n  next",
                machine.stimuli().map_or(0, StimulusSet::len)
            )
        }
        ExperimentPhase::Profile => {
            let condition = session.condition();
            let _ = writeln!(out, "{}\n", writing_prompt(condition));
            if session.profile_text.is_empty() {
                let _ = writeln!(out, "({})", writing_placeholder(condition));
            } else {
                let _ = writeln!(out, "{}", session.profile_text);
            }
            if machine.can_submit_profile() {
                writeln!(out, "You can now continue:\n  submit")
            } else {
                writeln!(
                    out,
                    "Time remaining {}:\n  write <text>",
                    mm_ss(machine.countdown_remaining())
                )
            }
        }
        ExperimentPhase::Questionnaire => {
            let _ = writeln!(out, "Right now I feel ... (1 = not at all, 7 = very much)");
            for (i, item) in machine.config().questionnaire_items.iter().enumerate() {
                let answer = session
                    .questionnaire
                    .get(i + 1)
                    .map_or_else(|| "-".to_string(), |r| r.value().to_string());
                let _ = writeln!(out, "{:>3}. {item} [{answer}]", i + 1);
            }
            writeln!(out, "  answer <n> <1-7>, then submit")
        }
        ExperimentPhase::Experiment => {
            if let Some((current, total)) = machine.trial_progress() {
                let _ = writeln!(out, "Image {current} of {total}");
            }
            match (machine.current_trial_step(), machine.current_stimulus()) {
                (Some(TrialStep::Card), Some(stimulus)) => writeln!(
                    out,
                    "{}\n{}\n  like | dislike | superlike",
                    stimulus.description, stimulus.url
                ),
                _ => {
                    let (d, w) = machine.current_ratings();
                    writeln!(
                        out,
                        "Desirability {}  Willingness to meet {}\n  d <1-7> | w <1-7> | rate",
                        d.value(),
                        w.value()
                    )
                }
            }
        }
        ExperimentPhase::Finish => {
            let status = match machine.save_status() {
                SaveStatus::Idle => "not sent yet",
                SaveStatus::Saving => "sending...",
                SaveStatus::Saved => "saved",
                SaveStatus::Error => "failed, type save to retry",
            };
            writeln!(
                out,
                "Thank you for taking part!\nYour data: {status}\n  save | export | quit"
            )
        }
    };
    out
}
