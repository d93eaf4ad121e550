#![allow(dead_code)]

use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use chrono::Utc;
use morphex_core::{
    ConditionGroup, ExperimentPhase, ExportSnapshot, MorphRequest, Photo, SaveResponse, Session,
    Stimulus, StimulusKind,
};
use morphex_sync::error::Result;
use morphex_sync::{Collector, SyncError};

/// How the fake answers `merge_faces`.
pub enum Morph {
    Live(Vec<Stimulus>),
    Status(u16),
    Hang,
}

/// In-memory collector that records what it was asked to do.
pub struct FakeCollector {
    pub morph: Morph,
    pub save_ids: Mutex<Vec<Option<String>>>,
    pub fail_saves: bool,
    pub saves: AtomicUsize,
    pub morph_calls: AtomicUsize,
}

impl FakeCollector {
    pub fn new(morph: Morph) -> Self {
        Self {
            morph,
            save_ids: Mutex::new(Vec::new()),
            fail_saves: false,
            saves: AtomicUsize::new(0),
            morph_calls: AtomicUsize::new(0),
        }
    }

    pub fn failing_saves() -> Self {
        Self {
            fail_saves: true,
            ..Self::new(Morph::Status(503))
        }
    }

    /// Queue of ids handed back by successive saves; empty means none.
    pub fn with_save_ids(self, ids: Vec<Option<&str>>) -> Self {
        *self.save_ids.lock().unwrap() = ids.into_iter().rev().map(|i| i.map(String::from)).collect();
        self
    }

    pub fn save_count(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Collector for FakeCollector {
    async fn merge_faces(&self, _request: &MorphRequest) -> Result<Vec<Stimulus>> {
        self.morph_calls.fetch_add(1, Ordering::SeqCst);
        match &self.morph {
            Morph::Live(stimuli) => Ok(stimuli.clone()),
            Morph::Status(code) => Err(SyncError::Status(*code)),
            Morph::Hang => std::future::pending().await,
        }
    }

    async fn save_data(&self, _snapshot: &ExportSnapshot) -> Result<SaveResponse> {
        self.saves.fetch_add(1, Ordering::SeqCst);
        if self.fail_saves {
            return Err(SyncError::Network("connection refused".into()));
        }
        let participant_id = self.save_ids.lock().unwrap().pop().flatten();
        Ok(SaveResponse { participant_id })
    }
}

pub fn request() -> MorphRequest {
    MorphRequest {
        self_image: Photo::new("data:image/jpeg;base64,c2VsZg==").unwrap(),
        partner_image: Photo::new("data:image/jpeg;base64,cGFydG5lcg==").unwrap(),
        self_gender: morphex_core::Gender::Male,
        partner_gender: morphex_core::Gender::Female,
    }
}

pub fn live_stimuli(n: usize) -> Vec<Stimulus> {
    (0..n)
        .map(|i| Stimulus {
            id: format!("srv_{i}"),
            url: format!("/static/out/srv_{i}.jpg"),
            kind: StimulusKind::ALL[i % 3],
            ratio_self: Some(0.5),
            ratio_partner: None,
            description: format!("server image {i}"),
            source_db: Some(format!("db_{i}.jpg")),
            source_upload: None,
        })
        .collect()
}

pub fn snapshot(session: &Session, phase: ExperimentPhase) -> ExportSnapshot {
    ExportSnapshot::capture(session, phase, Utc::now())
}

pub fn session() -> Session {
    Session::new(ConditionGroup::Relationship)
}
