use std::time::Duration;

use morphex_core::{
    Action, ExperimentPhase, Gender, GeneratedStimuli, Photo, Rating, STIMULUS_SET_SIZE,
    SaveKind, SaveOutcome, Stimulus, StimulusKind, StimulusSet, StimulusSource,
};
use morphex_experiment::{Effect, ExperimentConfig, ExperimentEvent, ExperimentStateMachine};
use morphex_timing::{ManualTimer, Timer};
use rand::SeedableRng;
use rand::rngs::StdRng;

fn block() -> GeneratedStimuli {
    let stimuli = (0..STIMULUS_SET_SIZE)
        .map(|i| Stimulus {
            id: format!("img_{i:02}"),
            url: format!("/static/morphs/img_{i:02}.jpg"),
            kind: StimulusKind::ALL[i % 3],
            ratio_self: Some(0.4),
            ratio_partner: Some(0.6),
            description: String::new(),
            source_db: None,
            source_upload: None,
        })
        .collect();
    GeneratedStimuli {
        stimuli: StimulusSet::new(stimuli).unwrap(),
        source: StimulusSource::Live,
    }
}

/// Drives a machine up to the first card.
fn at_first_card(timer: ManualTimer) -> ExperimentStateMachine<ManualTimer> {
    let config = ExperimentConfig {
        profile_countdown_secs: 2,
        ..ExperimentConfig::default()
    };
    let mut m = ExperimentStateMachine::new(config, timer, &mut StdRng::seed_from_u64(42));
    let events = [
        ExperimentEvent::ConfirmGender {
            self_gender: Gender::Male,
            partner_gender: Gender::Female,
        },
        ExperimentEvent::CaptureSelf(Photo::new("data:image/png;base64,c2VsZg==")),
        ExperimentEvent::CapturePartner(Photo::new("data:image/png;base64,cGFydG5lcg==")),
        ExperimentEvent::StimuliReady(block()),
        ExperimentEvent::ConfirmInstructions,
        ExperimentEvent::EditProfile("Saturday market run".into()),
        ExperimentEvent::CountdownTick,
        ExperimentEvent::CountdownTick,
        ExperimentEvent::SubmitProfile,
    ];
    for event in events {
        m.handle_event(event).unwrap();
    }
    for index in 1..=16 {
        m.handle_event(ExperimentEvent::AnswerQuestion {
            index,
            value: Rating::new((index % 7 + 1) as u8).unwrap(),
        })
        .unwrap();
    }
    m.handle_event(ExperimentEvent::SubmitQuestionnaire).unwrap();
    assert_eq!(m.current_phase(), ExperimentPhase::Experiment);
    m
}

#[test]
fn complete_block_records_every_stimulus_once_in_order() {
    let timer = ManualTimer::new();
    let mut m = at_first_card(timer.clone());
    let presented: Vec<String> = m.stimuli().unwrap().iter().map(|s| s.id.clone()).collect();

    let mut last_effects = Vec::new();
    for i in 0..STIMULUS_SET_SIZE {
        assert_eq!(m.trial_progress(), Some((i + 1, STIMULUS_SET_SIZE)));
        assert_eq!(m.current_stimulus().map(|s| s.id.clone()), Some(presented[i].clone()));

        timer.advance(Duration::from_millis(300 + i as u64 * 10));
        let action = if i % 2 == 0 { Action::Like } else { Action::Dislike };
        m.handle_event(ExperimentEvent::SubmitAction(action)).unwrap();
        assert!(m.current_stimulus().is_none());

        // time spent on the rating screen must not leak into the next RT
        timer.advance(Duration::from_secs(5));
        last_effects = m
            .handle_event(ExperimentEvent::SubmitRating {
                desirability: Rating::NEUTRAL,
                willingness: Rating::NEUTRAL,
            })
            .unwrap();
    }

    assert_eq!(m.current_phase(), ExperimentPhase::Finish);
    let trials = m.session().trials();
    assert_eq!(trials.len(), STIMULUS_SET_SIZE);
    for (i, record) in trials.iter().enumerate() {
        assert_eq!(record.trial_index, i + 1);
        assert_eq!(record.stimulus_id, presented[i]);
        assert_eq!(record.reaction_time_ms, 300 + i as u64 * 10);
        assert_eq!(record.rating_desirability.value(), 4);
        assert_eq!(
            record.action,
            if i % 2 == 0 { Action::Like } else { Action::Dislike }
        );
    }

    let Some(Effect::Save { snapshot, .. }) = last_effects.last() else {
        panic!("finish must autosave");
    };
    assert!(snapshot.is_complete);
    assert_eq!(snapshot.experiment_data.len(), STIMULUS_SET_SIZE);
    assert_eq!(snapshot.user_profile, "Saturday market run");

    let final_save = m.handle_event(ExperimentEvent::RequestFinalSave).unwrap();
    let [Effect::Save { kind, snapshot }] = final_save.as_slice() else {
        panic!("expected exactly one final save");
    };
    assert_eq!(*kind, SaveKind::Final);
    assert!(snapshot.is_complete);
    let json = serde_json::to_value(snapshot).unwrap();
    assert_eq!(json["experiment_data"].as_array().unwrap().len(), 36);
    assert_eq!(json["is_complete"], true);
}

#[test]
fn first_participant_id_sticks_for_later_snapshots() {
    let timer = ManualTimer::new();
    let mut m = at_first_card(timer);

    m.handle_event(ExperimentEvent::SaveCompleted {
        kind: SaveKind::Partial,
        outcome: SaveOutcome::Stored {
            participant_id: Some("P123".into()),
        },
    })
    .unwrap();
    m.handle_event(ExperimentEvent::SaveCompleted {
        kind: SaveKind::Partial,
        outcome: SaveOutcome::Stored {
            participant_id: None,
        },
    })
    .unwrap();
    m.handle_event(ExperimentEvent::SaveCompleted {
        kind: SaveKind::Partial,
        outcome: SaveOutcome::Stored {
            participant_id: Some("P456".into()),
        },
    })
    .unwrap();

    m.handle_event(ExperimentEvent::SubmitAction(Action::Superlike))
        .unwrap();
    let effects = m
        .handle_event(ExperimentEvent::SubmitRating {
            desirability: Rating::new(7).unwrap(),
            willingness: Rating::new(6).unwrap(),
        })
        .unwrap();
    for effect in effects {
        if let Effect::Save { snapshot, .. } = effect {
            assert_eq!(snapshot.participant_id.as_deref(), Some("P123"));
        }
    }
    assert_eq!(m.snapshot().participant_id.as_deref(), Some("P123"));
}

#[test]
fn back_to_back_snapshots_match_apart_from_timestamp() {
    let timer = ManualTimer::new();
    let m = at_first_card(timer.clone());
    let first = m.snapshot();
    timer.advance(Duration::from_secs(1));
    let second = m.snapshot();
    assert!(first.same_content(&second));
}

#[test]
fn condition_is_fixed_for_the_whole_run() {
    let timer = ManualTimer::new();
    let mut m = at_first_card(timer);
    let condition = m.session().condition();
    while m.current_phase() == ExperimentPhase::Experiment {
        m.handle_event(ExperimentEvent::SubmitAction(Action::Like)).unwrap();
        m.handle_event(ExperimentEvent::SubmitRating {
            desirability: Rating::NEUTRAL,
            willingness: Rating::NEUTRAL,
        })
        .unwrap();
        assert_eq!(m.session().condition(), condition);
    }
    assert_eq!(m.snapshot().condition_group, condition);
}

#[test]
fn reaction_time_is_never_negative_even_without_delay() {
    let timer = ManualTimer::new();
    let mut m = at_first_card(timer.clone());
    let before = timer.now();
    m.handle_event(ExperimentEvent::SubmitAction(Action::Like)).unwrap();
    m.handle_event(ExperimentEvent::SubmitRating {
        desirability: Rating::NEUTRAL,
        willingness: Rating::NEUTRAL,
    })
    .unwrap();
    assert_eq!(timer.elapsed(before), Duration::ZERO);
    assert_eq!(m.session().trials()[0].reaction_time_ms, 0);
}
