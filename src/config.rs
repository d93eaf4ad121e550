use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use morphex_experiment::ExperimentConfig;
use morphex_sync::SyncConfig;
use serde::Deserialize;
use tracing::{debug, info};

/// Whole-process configuration as read from `morphex.toml`.
///
/// ```toml
/// [experiment]
/// profile_countdown_secs = 600
///
/// [sync]
/// collector_url = "https://collector.example.org"
/// export_dir = "exports"
/// ```
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub experiment: ExperimentConfig,
    pub sync: SyncConfig,
}

/// Values that win over the file when given on the command line or in the
/// environment.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub collector_url: Option<String>,
    pub export_dir: Option<PathBuf>,
    pub countdown_secs: Option<u32>,
}

impl AppConfig {
    /// Reads the TOML file if one is given. A path that was asked for but
    /// does not exist is an error; no path means compiled defaults.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            debug!("no config file given, using defaults");
            return Ok(Self::default());
        };
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let config = Self::parse(&content)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;
        info!(path = %path.display(), "configuration loaded");
        Ok(config)
    }

    pub fn parse(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content)?;
        config.experiment.validate()?;
        Ok(config)
    }

    pub fn apply(mut self, overrides: Overrides) -> Self {
        if let Some(url) = overrides.collector_url {
            self.sync.collector_url = url;
        }
        if let Some(dir) = overrides.export_dir {
            self.sync.export_dir = dir;
        }
        if let Some(secs) = overrides.countdown_secs {
            self.experiment.profile_countdown_secs = secs;
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn empty_file_gives_defaults() {
        let config = AppConfig::parse("").unwrap();
        assert_eq!(config, AppConfig::default());
        assert_eq!(config.experiment.profile_countdown_secs, 600);
        assert_eq!(config.experiment.questionnaire_items.len(), 16);
        assert_eq!(config.sync.morph_timeout_secs, 40);
    }

    #[test]
    fn partial_sections_keep_other_defaults() {
        let config = AppConfig::parse(
            r#"
            [experiment]
            profile_countdown_secs = 30

            [sync]
            collector_url = "https://collector.example.org"
            fallback_delay_ms = 0
            "#,
        )
        .unwrap();

        assert_eq!(config.experiment.profile_countdown_secs, 30);
        assert_eq!(config.experiment.questionnaire_items.len(), 16);
        assert_eq!(config.sync.collector_url, "https://collector.example.org");
        assert_eq!(config.sync.fallback_delay_ms, 0);
        assert_eq!(config.sync.save_timeout_secs, 15);
        assert!(config.sync.skip_proxy_warning);
    }

    #[test]
    fn overrides_beat_the_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[sync]\ncollector_url = \"http://from-file\"").unwrap();

        let config = AppConfig::load(Some(file.path()))
            .unwrap()
            .apply(Overrides {
                collector_url: Some("http://from-cli".into()),
                countdown_secs: Some(5),
                ..Overrides::default()
            });

        assert_eq!(config.sync.collector_url, "http://from-cli");
        assert_eq!(config.experiment.profile_countdown_secs, 5);
        assert_eq!(config.sync.export_dir, PathBuf::from("."));
    }

    #[test]
    fn missing_file_is_an_error() {
        let dir = tempfile::TempDir::new().unwrap();
        let err = AppConfig::load(Some(&dir.path().join("nope.toml"))).unwrap_err();
        assert!(err.to_string().contains("nope.toml"));
    }

    #[test]
    fn questionnaire_must_keep_all_sixteen_items() {
        let err = AppConfig::parse("[experiment]\nquestionnaire_items = []").unwrap_err();
        assert!(err.to_string().contains("exactly 16 items"), "{err}");

        let items = vec!["\"calm\""; 16].join(", ");
        let config = AppConfig::parse(&format!("[experiment]\nquestionnaire_items = [{items}]")).unwrap();
        assert_eq!(config.experiment.questionnaire_items[15], "calm");
    }

    #[test]
    fn unknown_types_are_rejected() {
        assert!(AppConfig::parse("[experiment]\nprofile_countdown_secs = \"ten\"").is_err());
    }
}
