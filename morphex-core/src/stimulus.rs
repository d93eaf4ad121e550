use std::collections::HashSet;

use rand::Rng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Number of stimuli per kind in a generated block.
pub const STIMULI_PER_KIND: usize = 12;
/// Size of a full block: one run of every kind.
pub const STIMULUS_SET_SIZE: usize = STIMULI_PER_KIND * 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StimulusKind {
    SelfMorph,
    PartnerMorph,
    RandomOpposite,
}

impl StimulusKind {
    pub const ALL: [StimulusKind; 3] = [Self::SelfMorph, Self::PartnerMorph, Self::RandomOpposite];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SelfMorph => "self_morph",
            Self::PartnerMorph => "partner_morph",
            Self::RandomOpposite => "random_opposite",
        }
    }
}

/// One image to be judged, as returned by the morph service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stimulus {
    pub id: String,
    pub url: String,
    #[serde(rename = "type")]
    pub kind: StimulusKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ratio_self: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ratio_partner: Option<f64>,
    #[serde(default)]
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_db: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_upload: Option<String>,
}

impl Stimulus {
    /// Blend fraction recorded with a trial.
    ///
    /// Reads the ratio that belongs to the stimulus kind and falls back to
    /// the other one when the service left it out. Random faces have no
    /// blend and always report 0.
    pub fn ratio_level(&self) -> f64 {
        match self.kind {
            StimulusKind::SelfMorph => self.ratio_self.or(self.ratio_partner),
            StimulusKind::PartnerMorph => self.ratio_partner.or(self.ratio_self),
            StimulusKind::RandomOpposite => None,
        }
        .unwrap_or(0.0)
    }
}

/// Ordered, immutable block of stimuli.
///
/// The order is fixed at construction; nothing reshuffles it afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Stimulus>", into = "Vec<Stimulus>")]
pub struct StimulusSet(Vec<Stimulus>);

impl TryFrom<Vec<Stimulus>> for StimulusSet {
    type Error = CoreError;

    fn try_from(stimuli: Vec<Stimulus>) -> Result<Self, Self::Error> {
        Self::new(stimuli)
    }
}

impl From<StimulusSet> for Vec<Stimulus> {
    fn from(set: StimulusSet) -> Self {
        set.0
    }
}

impl StimulusSet {
    /// Validates a non-empty list with unique ids.
    pub fn new(stimuli: Vec<Stimulus>) -> Result<Self, CoreError> {
        if stimuli.is_empty() {
            return Err(CoreError::EmptyStimulusSet);
        }
        let mut ids = HashSet::with_capacity(stimuli.len());
        for stimulus in &stimuli {
            if !ids.insert(stimulus.id.as_str()) {
                return Err(CoreError::DuplicateStimulus(stimulus.id.clone()));
            }
        }
        Ok(Self(stimuli))
    }

    /// Offline stand-in for the morph service: 12 stimuli per kind with
    /// blend ratios stepping 0, 0.2 .. 1.0 twice, in shuffled order.
    pub fn demo<R: Rng + ?Sized>(rng: &mut R) -> Self {
        let mut stimuli = Vec::with_capacity(STIMULUS_SET_SIZE);
        let mut next_id = 1;
        for kind in StimulusKind::ALL {
            for i in 0..STIMULI_PER_KIND {
                let step = i % 6;
                let ratio = step as f64 / 5.0;
                let (prefix, seed, ratio_self, ratio_partner, description) = match kind {
                    StimulusKind::SelfMorph => (
                        "mock_self",
                        "self",
                        Some(ratio),
                        None,
                        format!("Self Morph {}% (Demo)", step * 20),
                    ),
                    StimulusKind::PartnerMorph => (
                        "mock_partner",
                        "partner",
                        None,
                        Some(ratio),
                        format!("Partner Morph {}% (Demo)", step * 20),
                    ),
                    StimulusKind::RandomOpposite => (
                        "mock_random",
                        "random",
                        Some(0.0),
                        None,
                        "Random Face (Demo)".to_string(),
                    ),
                };
                stimuli.push(Stimulus {
                    id: format!("{prefix}_{next_id}"),
                    url: format!("https://api.dicebear.com/7.x/avataaars/svg?seed={seed}{i}"),
                    kind,
                    ratio_self,
                    ratio_partner,
                    description,
                    source_db: None,
                    source_upload: None,
                });
                next_id += 1;
            }
        }
        stimuli.shuffle(rng);
        Self(stimuli)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Stimulus> {
        self.0.get(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Stimulus> {
        self.0.iter()
    }

    pub fn count_of(&self, kind: StimulusKind) -> usize {
        self.0.iter().filter(|s| s.kind == kind).count()
    }

    pub fn ids(&self) -> Vec<&str> {
        self.0.iter().map(|s| s.id.as_str()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stimulus(id: &str, kind: StimulusKind) -> Stimulus {
        Stimulus {
            id: id.to_string(),
            url: format!("https://example.test/{id}.jpg"),
            kind,
            ratio_self: None,
            ratio_partner: None,
            description: String::new(),
            source_db: None,
            source_upload: None,
        }
    }

    #[test]
    fn ratio_level_follows_kind() {
        let mut s = stimulus("a", StimulusKind::SelfMorph);
        s.ratio_self = Some(0.4);
        s.ratio_partner = Some(0.8);
        assert_eq!(s.ratio_level(), 0.4);

        s.kind = StimulusKind::PartnerMorph;
        assert_eq!(s.ratio_level(), 0.8);

        s.ratio_partner = None;
        assert_eq!(s.ratio_level(), 0.4);

        s.kind = StimulusKind::RandomOpposite;
        assert_eq!(s.ratio_level(), 0.0);
    }

    #[test]
    fn deserializing_validates_the_block() {
        assert!(serde_json::from_str::<StimulusSet>("[]").is_err());

        let a = stimulus("a", StimulusKind::SelfMorph);
        let dup = serde_json::to_string(&vec![a.clone(), a.clone()]).unwrap();
        assert!(serde_json::from_str::<StimulusSet>(&dup).is_err());

        let ok = serde_json::to_string(&vec![a, stimulus("b", StimulusKind::RandomOpposite)]).unwrap();
        let set: StimulusSet = serde_json::from_str(&ok).unwrap();
        assert_eq!(set.ids(), vec!["a", "b"]);
        assert_eq!(serde_json::to_string(&set).unwrap(), ok);
    }

    #[test]
    fn demo_block_has_twelve_of_each_kind() {
        let mut rng = rand::rng();
        let set = StimulusSet::demo(&mut rng);
        assert_eq!(set.len(), STIMULUS_SET_SIZE);
        for kind in StimulusKind::ALL {
            assert_eq!(set.count_of(kind), STIMULI_PER_KIND);
        }
        // ids stay unique after the shuffle
        assert!(StimulusSet::new(set.iter().cloned().collect()).is_ok());

        let mut self_ratios: Vec<f64> = set
            .iter()
            .filter(|s| s.kind == StimulusKind::SelfMorph)
            .map(Stimulus::ratio_level)
            .collect();
        self_ratios.sort_by(f64::total_cmp);
        assert_eq!(
            self_ratios,
            vec![0.0, 0.0, 0.2, 0.2, 0.4, 0.4, 0.6, 0.6, 0.8, 0.8, 1.0, 1.0]
        );
        assert!(
            set.iter()
                .filter(|s| s.kind == StimulusKind::RandomOpposite)
                .all(|s| s.ratio_self == Some(0.0))
        );
    }

    #[test]
    fn demo_blocks_differ_only_in_order() {
        let mut rng = rand::rng();
        let a = StimulusSet::demo(&mut rng);
        let orders: Vec<Vec<String>> = (0..5)
            .map(|_| StimulusSet::demo(&mut rng).ids().into_iter().map(String::from).collect())
            .collect();
        let first: Vec<String> = a.ids().into_iter().map(String::from).collect();
        assert!(orders.iter().any(|o| *o != first));

        let mut sorted_a = first.clone();
        sorted_a.sort();
        for order in orders {
            let mut sorted = order;
            sorted.sort();
            assert_eq!(sorted, sorted_a);
        }
    }

    #[test]
    fn rejects_empty_and_duplicate_sets() {
        assert!(matches!(StimulusSet::new(vec![]), Err(CoreError::EmptyStimulusSet)));

        let dup = vec![
            stimulus("x", StimulusKind::SelfMorph),
            stimulus("x", StimulusKind::PartnerMorph),
        ];
        assert!(matches!(
            StimulusSet::new(dup),
            Err(CoreError::DuplicateStimulus(id)) if id == "x"
        ));
    }

    #[test]
    fn parses_service_payload_with_missing_optionals() {
        let json = r#"{"id":"m1","url":"/img/m1.jpg","type":"partner_morph","ratio_partner":0.6}"#;
        let s: Stimulus = serde_json::from_str(json).unwrap();
        assert_eq!(s.kind, StimulusKind::PartnerMorph);
        assert_eq!(s.ratio_level(), 0.6);
        assert!(s.description.is_empty());
    }
}
