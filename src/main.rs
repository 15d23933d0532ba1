pub mod error;
pub mod ml_model;
pub mod price_data;

use error::ForecastError;
use ml_model::ForecastExperiment;
use price_data::{config::ExperimentConfig, parse, scale::StandardScaler};

fn main() -> Result<(), ForecastError> {
    env_logger::init();

    let config = ExperimentConfig::load("config.json")?;

    let series = parse::load_price_series(&config.csv_path)?;
    match series.span() {
        Some((first, last)) => {
            log::info!("loaded {} trading days, {first} to {last}", series.len())
        }
        None => log::info!("loaded {} trading days", series.len()),
    }

    let (scaler, scaled) = StandardScaler::fit_transform(&series.feature_matrix())?;

    let experiment = ForecastExperiment::new(config.artifact_dir.clone());
    let report = experiment.run(&config, scaled)?;

    for model in &report.models {
        println!("{} MSE: {}", model.architecture, model.mse);
    }

    ml_model::inference::metric::plot_forecasts(
        &report,
        &scaler,
        config.future_steps,
        &config.artifact_dir,
    )?;

    Ok(())
}
