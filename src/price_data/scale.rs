use crate::error::ForecastError;

use super::FEATURES;

/// Per-feature standardization to zero mean and unit variance. The fitted
/// mean and standard deviation are kept so predictions can be mapped back
/// into price units for reporting.
#[derive(Debug, Clone, PartialEq)]
pub struct StandardScaler {
    pub mean: [f64; FEATURES],
    pub std: [f64; FEATURES],
}

impl StandardScaler {
    pub fn fit(series: &[[f64; FEATURES]]) -> Result<StandardScaler, ForecastError> {
        if series.is_empty() {
            return Err(ForecastError::EmptySeries);
        }

        let count = series.len() as f64;
        let mut mean = [0.0; FEATURES];
        for row in series {
            for (feature, value) in row.iter().enumerate() {
                mean[feature] += value;
            }
        }
        for value in mean.iter_mut() {
            *value /= count;
        }

        let mut std = [0.0; FEATURES];
        for row in series {
            for (feature, value) in row.iter().enumerate() {
                let delta = value - mean[feature];
                std[feature] += delta * delta;
            }
        }
        for value in std.iter_mut() {
            *value = (*value / count).sqrt();
            // A flat feature would otherwise divide by zero; scaling by one
            // leaves it centered and constant.
            if value.abs() < 1e-12 {
                *value = 1.0;
            }
        }

        Ok(StandardScaler { mean, std })
    }

    pub fn transform(&self, series: &[[f64; FEATURES]]) -> Vec<[f64; FEATURES]> {
        series
            .iter()
            .map(|row| {
                let mut scaled = [0.0; FEATURES];
                for (feature, value) in row.iter().enumerate() {
                    scaled[feature] = (value - self.mean[feature]) / self.std[feature];
                }
                scaled
            })
            .collect()
    }

    pub fn fit_transform(
        series: &[[f64; FEATURES]],
    ) -> Result<(StandardScaler, Vec<[f64; FEATURES]>), ForecastError> {
        let scaler = StandardScaler::fit(series)?;
        let scaled = scaler.transform(series);
        Ok((scaler, scaled))
    }

    /// Maps a single scaled value back into the units of the given feature.
    pub fn inverse(&self, feature: usize, value: f64) -> f64 {
        value * self.std[feature] + self.mean[feature]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_series() -> Vec<[f64; FEATURES]> {
        vec![
            [10.0, 11.0, 9.0, 10.5],
            [10.5, 12.0, 10.0, 11.8],
            [11.2, 12.5, 10.8, 12.1],
            [10.9, 11.9, 10.2, 11.0],
        ]
    }

    #[test]
    fn transform_centers_and_scales_each_feature() {
        let series = sample_series();
        let (_, scaled) = StandardScaler::fit_transform(&series).unwrap();

        for feature in 0..FEATURES {
            let mean: f64 =
                scaled.iter().map(|row| row[feature]).sum::<f64>() / scaled.len() as f64;
            let var: f64 =
                scaled.iter().map(|row| row[feature] * row[feature]).sum::<f64>()
                    / scaled.len() as f64;

            assert!(mean.abs() < 1e-9, "feature {feature} mean {mean}");
            assert!((var - 1.0).abs() < 1e-9, "feature {feature} var {var}");
        }
    }

    #[test]
    fn inverse_round_trips_the_series() {
        let series = sample_series();
        let (scaler, scaled) = StandardScaler::fit_transform(&series).unwrap();

        for (row, scaled_row) in series.iter().zip(scaled.iter()) {
            for feature in 0..FEATURES {
                let restored = scaler.inverse(feature, scaled_row[feature]);
                assert!((restored - row[feature]).abs() < 1e-9);
            }
        }
    }

    #[test]
    fn flat_feature_does_not_divide_by_zero() {
        let series = vec![[1.0, 5.0, 2.0, 3.0], [2.0, 5.0, 2.5, 3.5]];
        let (scaler, scaled) = StandardScaler::fit_transform(&series).unwrap();

        assert_eq!(scaler.std[1], 1.0);
        assert!(scaled.iter().all(|row| row[1].is_finite()));
        assert_eq!(scaled[0][1], 0.0);
    }

    #[test]
    fn empty_series_is_an_error() {
        assert!(StandardScaler::fit(&[]).is_err());
    }
}
