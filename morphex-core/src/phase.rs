use serde::{Deserialize, Serialize};

/// Defines experiment phases and behavior
pub trait Phase: Copy + Clone + PartialEq + Send + Sync + std::fmt::Debug + Default {
    fn allows_input(&self) -> bool;
    fn next(&self) -> Option<Self>;

    fn is_timed(&self) -> bool {
        false
    }
    fn is_experiment(&self) -> bool {
        false
    }
    fn is_terminal(&self) -> bool {
        self.next().is_none()
    }
}

#[derive(Copy, Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExperimentPhase {
    #[default]
    GenderSelect,
    UploadSelf,
    UploadPartner,
    Processing,
    Instructions,
    Profile,
    Questionnaire,
    Experiment,
    Finish,
}

impl ExperimentPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::GenderSelect => "gender_select",
            Self::UploadSelf => "upload_self",
            Self::UploadPartner => "upload_partner",
            Self::Processing => "processing",
            Self::Instructions => "instructions",
            Self::Profile => "profile",
            Self::Questionnaire => "questionnaire",
            Self::Experiment => "experiment",
            Self::Finish => "finish",
        }
    }
}

impl std::fmt::Display for ExperimentPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Phase for ExperimentPhase {
    fn allows_input(&self) -> bool {
        // processing waits on the morph service, nothing to click
        !matches!(self, Self::Processing)
    }

    fn next(&self) -> Option<Self> {
        use ExperimentPhase::*;
        Some(match self {
            GenderSelect => UploadSelf,
            UploadSelf => UploadPartner,
            UploadPartner => Processing,
            Processing => Instructions,
            Instructions => Profile,
            Profile => Questionnaire,
            Questionnaire => Experiment,
            Experiment => Finish,
            Finish => return None,
        })
    }

    fn is_timed(&self) -> bool {
        matches!(self, Self::Profile)
    }

    fn is_experiment(&self) -> bool {
        matches!(self, Self::Experiment)
    }
}
