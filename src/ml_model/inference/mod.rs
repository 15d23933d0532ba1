pub mod metric;

use burn::tensor::backend::Backend;

use super::data::WindowBatcher;
use super::data_loader::WindowSample;
use super::model::Forecast;
use burn::data::dataloader::batcher::Batcher;

/// Test-split outcome for one trained model: the scalar error plus every
/// flattened prediction row, in window order, still in scaled units.
#[derive(Debug, Clone)]
pub struct Evaluation {
    pub mse: f64,
    pub predictions: Vec<Vec<f64>>,
}

/// Runs inference over the held-out windows in batches and scores the
/// flattened predictions against the true targets.
pub fn evaluate<B: Backend, M: Forecast<B>>(
    model: &M,
    batcher: &WindowBatcher<B>,
    samples: &[WindowSample],
    batch_size: usize,
) -> Evaluation {
    let mut predictions = Vec::with_capacity(samples.len());

    for chunk in samples.chunks(batch_size.max(1)) {
        let batch = batcher.batch(chunk.to_vec());
        let output = model.forward(batch.inputs);

        let [rows, width] = output.dims();
        let values = output.into_data().convert::<f64>().value;
        for row in 0..rows {
            predictions.push(values[row * width..(row + 1) * width].to_vec());
        }
    }

    let targets: Vec<Vec<f64>> = samples.iter().map(|sample| sample.target.clone()).collect();
    let mse = mean_squared_error(&predictions, &targets);

    Evaluation { mse, predictions }
}

/// Mean of the squared element-wise differences across every prediction row.
pub fn mean_squared_error(predictions: &[Vec<f64>], targets: &[Vec<f64>]) -> f64 {
    let mut total = 0.0;
    let mut count = 0usize;

    for (prediction, target) in predictions.iter().zip(targets.iter()) {
        for (predicted, actual) in prediction.iter().zip(target.iter()) {
            let delta = predicted - actual;
            total += delta * delta;
            count += 1;
        }
    }

    if count == 0 {
        return 0.0;
    }
    total / count as f64
}

#[cfg(test)]
mod tests {
    use burn::backend::ndarray::{NdArray, NdArrayDevice};
    use burn::tensor::Tensor;

    use super::*;
    use crate::price_data::FEATURES;

    #[test]
    fn perfect_predictions_score_zero() {
        let rows = vec![vec![0.5, -1.0, 2.0, 0.0], vec![1.5, 1.0, -2.0, 0.25]];
        assert_eq!(mean_squared_error(&rows, &rows), 0.0);
    }

    #[test]
    fn known_error_is_averaged_over_every_element() {
        let predictions = vec![vec![1.0, 2.0]];
        let targets = vec![vec![0.0, 0.0]];
        assert_eq!(mean_squared_error(&predictions, &targets), 2.5);
    }

    #[test]
    fn no_rows_scores_zero_instead_of_dividing_by_zero() {
        assert_eq!(mean_squared_error(&[], &[]), 0.0);
    }

    /// A model that always predicts zero; against all-zero targets it is the
    /// perfect-prediction stub, so the evaluator must report exactly 0.0.
    struct ZeroModel {
        width: usize,
    }

    impl Forecast<NdArray> for ZeroModel {
        fn forward(&self, windows: Tensor<NdArray, 3>) -> Tensor<NdArray, 2> {
            let [batch, _, _] = windows.dims();
            Tensor::zeros([batch, self.width], &NdArrayDevice::default())
        }
    }

    #[test]
    fn evaluate_on_the_perfect_stub_reports_zero_mse() {
        let samples: Vec<WindowSample> = (0..5)
            .map(|_| WindowSample {
                input: vec![[0.0; FEATURES]; 6],
                target: vec![0.0; FEATURES],
            })
            .collect();

        let batcher = WindowBatcher::<NdArray>::new(NdArrayDevice::default());
        let model = ZeroModel { width: FEATURES };

        let evaluation = evaluate(&model, &batcher, &samples, 2);

        assert_eq!(evaluation.mse, 0.0);
        assert_eq!(evaluation.predictions.len(), 5);
        assert_eq!(evaluation.predictions[0].len(), FEATURES);
    }
}
