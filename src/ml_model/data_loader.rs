use burn::data::dataset::{Dataset, InMemDataset};
use serde::{Deserialize, Serialize};

use crate::price_data::FEATURES;

/// One supervised example: `time_steps` rows of scaled features and the
/// flattened `FEATURES * future_steps` values that immediately follow them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WindowSample {
    pub input: Vec<[f64; FEATURES]>,
    pub target: Vec<f64>,
}

/// Slides a window of `time_steps` inputs plus `future_steps` targets across
/// the series with stride 1. Yields `N - time_steps - future_steps + 1`
/// samples in series order, or nothing when the series is too short.
pub fn window_series(
    series: &[[f64; FEATURES]],
    time_steps: usize,
    future_steps: usize,
) -> Vec<WindowSample> {
    let span = time_steps + future_steps;
    if series.len() < span {
        return Vec::new();
    }

    let count = series.len() - span + 1;
    let mut samples = Vec::with_capacity(count);

    for start in 0..count {
        let input = series[start..start + time_steps].to_vec();
        let target = series[start + time_steps..start + span]
            .iter()
            .flat_map(|row| row.iter().copied())
            .collect();

        samples.push(WindowSample { input, target });
    }

    samples
}

/// Cuts the samples at `ratio`, head for training and tail for test. The
/// order is untouched, so the test split is always the most recent data and
/// nothing from the future leaks into training.
pub fn split_ordered(samples: &[WindowSample], ratio: f32) -> (&[WindowSample], &[WindowSample]) {
    let split = (samples.len() as f32 * ratio) as usize;
    samples.split_at(split.min(samples.len()))
}

/// Holds out the trailing `fraction` of the samples, the slice the trainer
/// validates against between epochs.
pub fn split_tail(samples: &[WindowSample], fraction: f32) -> (&[WindowSample], &[WindowSample]) {
    let holdout = (samples.len() as f32 * fraction) as usize;
    samples.split_at(samples.len() - holdout.min(samples.len()))
}

pub struct ForecastDataset {
    dataset: InMemDataset<WindowSample>,
}

impl ForecastDataset {
    pub fn new(samples: Vec<WindowSample>) -> ForecastDataset {
        ForecastDataset {
            dataset: InMemDataset::new(samples),
        }
    }
}

impl Dataset<WindowSample> for ForecastDataset {
    fn get(&self, index: usize) -> Option<WindowSample> {
        self.dataset.get(index)
    }

    fn len(&self) -> usize {
        self.dataset.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ramp_series(len: usize) -> Vec<[f64; FEATURES]> {
        (0..len)
            .map(|i| {
                let base = i as f64;
                [base, base + 0.25, base + 0.5, base + 0.75]
            })
            .collect()
    }

    #[test]
    fn window_count_matches_the_contract() {
        let series = ramp_series(20);
        let samples = window_series(&series, 15, 1);

        assert_eq!(samples.len(), 5);
    }

    #[test]
    fn first_window_covers_rows_0_through_14_and_targets_row_15() {
        let series = ramp_series(20);
        let samples = window_series(&series, 15, 1);

        let first = &samples[0];
        assert_eq!(first.input.len(), 15);
        assert_eq!(first.input[0], series[0]);
        assert_eq!(first.input[14], series[14]);
        assert_eq!(first.target, series[15].to_vec());
    }

    #[test]
    fn short_series_yields_no_windows() {
        let series = ramp_series(10);
        assert!(window_series(&series, 15, 1).is_empty());
        assert!(window_series(&[], 15, 1).is_empty());
    }

    #[test]
    fn targets_immediately_follow_their_inputs() {
        let series = ramp_series(30);
        let time_steps = 7;
        let samples = window_series(&series, time_steps, 2);

        assert_eq!(samples.len(), 30 - 7 - 2 + 1);
        for (start, sample) in samples.iter().enumerate() {
            assert_eq!(sample.input[time_steps - 1], series[start + time_steps - 1]);
            assert_eq!(sample.target.len(), FEATURES * 2);
            // flattened target row 0 is the row right after the input
            assert_eq!(sample.target[0], series[start + time_steps][0]);
            assert_eq!(sample.target[FEATURES], series[start + time_steps + 1][0]);
        }
    }

    #[test]
    fn ordered_split_preserves_chronology() {
        let series = ramp_series(25);
        let samples = window_series(&series, 5, 1);
        let (train, test) = split_ordered(&samples, 0.8);

        assert_eq!(train.len() + test.len(), samples.len());
        assert_eq!(train.len(), 16);
        // last training input ends before the first test input starts
        assert!(train.last().unwrap().input[0][0] < test.first().unwrap().input[0][0]);
    }

    #[test]
    fn tail_split_takes_the_most_recent_samples() {
        let series = ramp_series(25);
        let samples = window_series(&series, 5, 1);
        let (train, valid) = split_tail(&samples, 0.25);

        assert_eq!(train.len() + valid.len(), samples.len());
        assert_eq!(valid.len(), 5);
        assert!(train.last().unwrap().input[0][0] < valid.first().unwrap().input[0][0]);
    }

    #[test]
    fn dataset_wraps_the_samples() {
        let series = ramp_series(20);
        let samples = window_series(&series, 15, 1);
        let dataset = ForecastDataset::new(samples.clone());

        assert_eq!(dataset.len(), samples.len());
        assert_eq!(dataset.get(0).unwrap().target, samples[0].target);
        assert!(dataset.get(samples.len()).is_none());
    }
}
