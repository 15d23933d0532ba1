use std::fs;

use plotly::{
    common::{color::NamedColor, Line, Mode, Title},
    Layout, Plot, Scatter,
};

use crate::error::ForecastError;
use crate::ml_model::{ExperimentReport, ModelReport};
use crate::price_data::{scale::StandardScaler, FEATURES, FEATURE_NAMES};

fn trace_color(report: &ModelReport) -> NamedColor {
    use crate::ml_model::model::Architecture;

    match report.architecture {
        Architecture::SimpleRnn => NamedColor::Crimson,
        Architecture::Lstm => NamedColor::RoyalBlue,
        Architecture::Gru => NamedColor::SeaGreen,
    }
}

/// Renders one comparison chart per feature per forecast step: the actual
/// price line in black, one colored line per trained model, all mapped back
/// into price units. Charts land under `<out_dir>/charts` as html files.
pub fn plot_forecasts(
    report: &ExperimentReport,
    scaler: &StandardScaler,
    future_steps: usize,
    out_dir: &str,
) -> Result<(), ForecastError> {
    let chart_dir = format!("{out_dir}/charts");
    fs::create_dir_all(&chart_dir)?;

    let days: Vec<usize> = (0..report.test_targets.len()).collect();

    for step in 0..future_steps {
        for (feature, feature_name) in FEATURE_NAMES.iter().enumerate() {
            let column = step * FEATURES + feature;

            let actual: Vec<f64> = report
                .test_targets
                .iter()
                .map(|row| scaler.inverse(feature, row[column]))
                .collect();

            let mut plot = Plot::new();
            plot.add_trace(
                Scatter::new(days.clone(), actual)
                    .mode(Mode::Lines)
                    .name("Actual")
                    .line(Line::new().color(NamedColor::Black)),
            );

            for model in &report.models {
                let predicted: Vec<f64> = model
                    .predictions
                    .iter()
                    .map(|row| scaler.inverse(feature, row[column]))
                    .collect();

                plot.add_trace(
                    Scatter::new(days.clone(), predicted)
                        .mode(Mode::Lines)
                        .name(model.architecture.to_string().as_str())
                        .line(Line::new().color(trace_color(model))),
                );
            }

            let title = format!("{feature_name} forecast, {} day(s) ahead", step + 1);
            plot.set_layout(Layout::new().title(Title::new(title.as_str())));

            let path = format!(
                "{chart_dir}/{}_step{}.html",
                feature_name.to_lowercase(),
                step + 1
            );
            plot.write_html(&path);
            log::info!("wrote chart {path}");
        }
    }

    Ok(())
}
