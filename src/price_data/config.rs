use std::fs::File;
use std::path::Path;

use serde::Deserialize;

use crate::error::ForecastError;
use crate::ml_model::model::Architecture;

/// Experiment configuration, read from a json file next to the binary.
/// Everything the run needs is in here; nothing is read from ambient
/// globals or environment variables.
#[derive(Debug, Clone, Deserialize)]
pub struct ExperimentConfig {
    pub csv_path: String,
    #[serde(default = "default_artifact_dir")]
    pub artifact_dir: String,
    #[serde(default = "default_time_steps")]
    pub time_steps: usize,
    #[serde(default = "default_future_steps")]
    pub future_steps: usize,
    /// Fraction of the window samples used for training, the rest is the
    /// held-out test split. Samples are split in order, never shuffled.
    #[serde(default = "default_train_split")]
    pub train_split: f32,
    #[serde(default = "default_architectures")]
    pub architectures: Vec<String>,
}

fn default_artifact_dir() -> String {
    "tmp/stock_forecast".to_string()
}

fn default_time_steps() -> usize {
    15
}

fn default_future_steps() -> usize {
    1
}

fn default_train_split() -> f32 {
    0.8
}

fn default_architectures() -> Vec<String> {
    Architecture::ALL
        .iter()
        .map(|architecture| architecture.to_string())
        .collect()
}

impl ExperimentConfig {
    pub fn load(path: impl AsRef<Path>) -> Result<ExperimentConfig, ForecastError> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|source| ForecastError::OpenFile {
            path: path.display().to_string(),
            source,
        })?;
        let config = serde_json::from_reader(file).map_err(|source| ForecastError::Config {
            path: path.display().to_string(),
            source,
        })?;
        Ok(config)
    }

    /// Resolves the configured architecture tags, failing fast on any tag
    /// outside the supported set.
    pub fn architectures(&self) -> Result<Vec<Architecture>, ForecastError> {
        self.architectures
            .iter()
            .map(|tag| tag.parse::<Architecture>())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_fill_missing_fields() {
        let config: ExperimentConfig =
            serde_json::from_str(r#"{ "csv_path": "data/prices.csv" }"#).unwrap();

        assert_eq!(config.time_steps, 15);
        assert_eq!(config.future_steps, 1);
        assert_eq!(config.train_split, 0.8);
        assert_eq!(config.architectures.len(), 3);
        assert_eq!(config.architectures().unwrap().len(), 3);
    }

    #[test]
    fn unknown_architecture_tag_fails_fast() {
        let config: ExperimentConfig = serde_json::from_str(
            r#"{ "csv_path": "data/prices.csv", "architectures": ["LSTM", "Transformer"] }"#,
        )
        .unwrap();

        let err = config.architectures().unwrap_err();
        match err {
            ForecastError::UnsupportedArchitecture(tag) => assert_eq!(tag, "Transformer"),
            other => panic!("expected UnsupportedArchitecture, got {other:?}"),
        }
    }
}
