pub mod data;
pub mod data_loader;
pub mod inference;
pub mod model;
pub mod training;

use burn::backend::autodiff::Autodiff;
use burn::backend::ndarray::{NdArray, NdArrayDevice};
use burn::module::AutodiffModule;
use burn::optim::AdamConfig;

use crate::error::ForecastError;
use crate::price_data::{config::ExperimentConfig, FEATURES};

use data::WindowBatcher;
use data_loader::{split_ordered, window_series, WindowSample};
use model::{Architecture, Forecast, ModelConfig};
use training::TrainingConfig;

type MyBackend = NdArray;
type MyAutodiffBackend = Autodiff<MyBackend>;

/// Outcome of one architecture: the test error and the per-window flattened
/// predictions, still in scaled units.
#[derive(Debug, Clone)]
pub struct ModelReport {
    pub architecture: Architecture,
    pub mse: f64,
    pub predictions: Vec<Vec<f64>>,
}

/// Everything Reporting needs: the true test targets plus one report per
/// trained model, in the order the models ran.
#[derive(Debug, Clone)]
pub struct ExperimentReport {
    pub test_targets: Vec<Vec<f64>>,
    pub models: Vec<ModelReport>,
}

pub struct ForecastExperiment {
    pub artifact_dir: String,
}

impl ForecastExperiment {
    pub fn new(artifact_dir: String) -> ForecastExperiment {
        ForecastExperiment { artifact_dir }
    }

    /// Windows the scaled series, splits it chronologically, then builds,
    /// trains and evaluates each configured architecture in sequence.
    pub fn run(
        &self,
        config: &ExperimentConfig,
        scaled: Vec<[f64; FEATURES]>,
    ) -> Result<ExperimentReport, ForecastError> {
        let architectures = config.architectures()?;

        let samples = window_series(&scaled, config.time_steps, config.future_steps);
        if samples.is_empty() {
            return Err(ForecastError::SeriesTooShort {
                rows: scaled.len(),
                required: config.time_steps + config.future_steps,
            });
        }

        let (train_samples, test_samples) = split_ordered(&samples, config.train_split);
        if train_samples.is_empty() {
            return Err(ForecastError::EmptyDataset { split: "train" });
        }
        if test_samples.is_empty() {
            return Err(ForecastError::EmptyDataset { split: "test" });
        }
        log::info!(
            "{} window samples: {} train, {} test",
            samples.len(),
            train_samples.len(),
            test_samples.len()
        );

        let device = NdArrayDevice::default();

        let mut models = Vec::with_capacity(architectures.len());
        for architecture in architectures {
            log::info!("training {architecture}");
            let report =
                self.run_architecture(architecture, train_samples, test_samples, config, &device)?;
            log::info!("{architecture} test mse {:.6}", report.mse);
            models.push(report);
        }

        Ok(ExperimentReport {
            test_targets: test_samples
                .iter()
                .map(|sample| sample.target.clone())
                .collect(),
            models,
        })
    }

    fn run_architecture(
        &self,
        architecture: Architecture,
        train_samples: &[WindowSample],
        test_samples: &[WindowSample],
        config: &ExperimentConfig,
        device: &NdArrayDevice,
    ) -> Result<ModelReport, ForecastError> {
        let model_config = ModelConfig::new()
            .with_num_features(FEATURES)
            .with_future_steps(config.future_steps);
        let training_config = TrainingConfig::new(model_config, AdamConfig::new());

        // The three cell types are distinct modules; this match is the one
        // place the closed architecture set meets the generic pipeline.
        match architecture {
            Architecture::SimpleRnn => {
                let model = training_config
                    .model
                    .init_simple_rnn::<MyAutodiffBackend>(device);
                self.train_and_evaluate(architecture, model, train_samples, test_samples, &training_config, device)
            }
            Architecture::Lstm => {
                let model = training_config.model.init_lstm::<MyAutodiffBackend>(device);
                self.train_and_evaluate(architecture, model, train_samples, test_samples, &training_config, device)
            }
            Architecture::Gru => {
                let model = training_config.model.init_gru::<MyAutodiffBackend>(device);
                self.train_and_evaluate(architecture, model, train_samples, test_samples, &training_config, device)
            }
        }
    }

    fn train_and_evaluate<M>(
        &self,
        architecture: Architecture,
        model: M,
        train_samples: &[WindowSample],
        test_samples: &[WindowSample],
        config: &TrainingConfig,
        device: &NdArrayDevice,
    ) -> Result<ModelReport, ForecastError>
    where
        M: AutodiffModule<MyAutodiffBackend> + Forecast<MyAutodiffBackend>,
        M::InnerModule: Forecast<MyBackend>,
    {
        let artifact_dir = format!("{}/{}", self.artifact_dir, architecture.key());

        let trained = training::train::<MyAutodiffBackend, M>(
            &artifact_dir,
            config,
            model,
            train_samples,
            device.clone(),
        )?;

        let batcher = WindowBatcher::<MyBackend>::new(device.clone());
        let evaluation =
            inference::evaluate(&trained.valid(), &batcher, test_samples, config.batch_size);

        Ok(ModelReport {
            architecture,
            mse: evaluation.mse,
            predictions: evaluation.predictions,
        })
    }
}
