use std::sync::Arc;

use burn::{
    config::Config,
    data::dataloader::{DataLoader, DataLoaderBuilder},
    module::{AutodiffModule, Module},
    nn::loss::{MseLoss, Reduction},
    optim::{AdamConfig, GradientsParams, Optimizer},
    record::CompactRecorder,
    tensor::backend::{AutodiffBackend, Backend},
    tensor::ElementConversion,
};

use crate::error::ForecastError;

use super::{
    data::{WindowBatch, WindowBatcher},
    data_loader::{split_tail, ForecastDataset, WindowSample},
    model::{Forecast, ModelConfig},
};

#[derive(Config)]
pub struct TrainingConfig {
    pub model: ModelConfig,
    pub optimizer: AdamConfig,
    #[config(default = 100)]
    pub num_epochs: usize,
    #[config(default = 32)]
    pub batch_size: usize,
    #[config(default = 4)]
    pub num_workers: usize,
    #[config(default = 42)]
    pub seed: u64,
    #[config(default = 1.0e-3)]
    pub learning_rate: f64,
    /// Epochs without validation improvement tolerated before stopping.
    #[config(default = 10)]
    pub patience: usize,
    /// Trailing fraction of the training windows held out for validation.
    #[config(default = 0.1)]
    pub validation_split: f32,
}

fn create_artifact_dir(artifact_dir: &str) {
    std::fs::remove_dir_all(artifact_dir).ok();
    std::fs::create_dir_all(artifact_dir).ok();
}

/// Fits the model with mini-batch Adam on MSE, validating after every epoch
/// against the held-out tail of the training windows. Stops early once the
/// validation loss has not improved for `patience` epochs and returns the
/// best-seen weights, which are also recorded under `artifact_dir`.
pub fn train<B: AutodiffBackend, M>(
    artifact_dir: &str,
    config: &TrainingConfig,
    mut model: M,
    samples: &[WindowSample],
    device: B::Device,
) -> Result<M, ForecastError>
where
    M: AutodiffModule<B> + Forecast<B>,
    M::InnerModule: Forecast<B::InnerBackend>,
{
    let (train_samples, valid_samples) = split_tail(samples, config.validation_split);
    if train_samples.is_empty() {
        return Err(ForecastError::EmptyDataset { split: "train" });
    }
    if valid_samples.is_empty() {
        return Err(ForecastError::EmptyDataset { split: "validation" });
    }

    create_artifact_dir(artifact_dir);
    config.save(format!("{artifact_dir}/config.json"))?;

    B::seed(config.seed);

    let batcher_train = WindowBatcher::<B>::new(device.clone());
    let batcher_valid = WindowBatcher::<B::InnerBackend>::new(device.clone());

    let dataloader_train = DataLoaderBuilder::new(batcher_train)
        .batch_size(config.batch_size)
        .shuffle(config.seed)
        .num_workers(config.num_workers)
        .build(ForecastDataset::new(train_samples.to_vec()));

    let dataloader_valid = DataLoaderBuilder::new(batcher_valid)
        .batch_size(config.batch_size)
        .num_workers(config.num_workers)
        .build(ForecastDataset::new(valid_samples.to_vec()));

    let mut optim = config.optimizer.init::<B, M>();

    let mut best = model.clone();
    let mut best_loss = f64::INFINITY;
    let mut stale_epochs = 0;

    for epoch in 1..=config.num_epochs {
        let mut train_loss = 0.0;
        let mut batches = 0;

        for batch in dataloader_train.iter() {
            let output = model.forward(batch.inputs);
            let loss = MseLoss::new().forward(output, batch.targets, Reduction::Mean);

            let grads = GradientsParams::from_grads(loss.backward(), &model);
            model = optim.step(config.learning_rate, model, grads);

            train_loss += loss.into_scalar().elem::<f64>();
            batches += 1;
        }

        let valid_loss = validation_loss(&model.valid(), &dataloader_valid);
        log::debug!(
            "epoch {epoch}: train mse {:.6}, valid mse {:.6}",
            train_loss / batches.max(1) as f64,
            valid_loss
        );

        if valid_loss < best_loss {
            best_loss = valid_loss;
            best = model.clone();
            stale_epochs = 0;
        } else {
            stale_epochs += 1;
            if stale_epochs >= config.patience {
                log::info!("early stopping after epoch {epoch}, best valid mse {best_loss:.6}");
                break;
            }
        }
    }

    best.clone()
        .save_file(format!("{artifact_dir}/model"), &CompactRecorder::new())
        .map_err(|err| ForecastError::Artifact(err.to_string()))?;

    Ok(best)
}

fn validation_loss<B: Backend, M: Forecast<B>>(
    model: &M,
    dataloader: &Arc<dyn DataLoader<WindowBatch<B>>>,
) -> f64 {
    let mut total = 0.0;
    let mut batches = 0;

    for batch in dataloader.iter() {
        let output = model.forward(batch.inputs);
        let loss = MseLoss::new().forward(output, batch.targets, Reduction::Mean);
        total += loss.into_scalar().elem::<f64>();
        batches += 1;
    }

    total / batches.max(1) as f64
}
