use thiserror::Error;

/// Every failure in this experiment is fatal; there is no retry path for a
/// single offline batch job.
#[derive(Debug, Error)]
pub enum ForecastError {
    #[error("could not open {path}: {source}")]
    OpenFile {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed price csv: {0}")]
    Csv(#[from] csv::Error),

    #[error("price csv is missing required column {0:?}")]
    MissingColumn(&'static str),

    #[error("config file {path} could not be parsed: {source}")]
    Config {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("price series has {rows} rows but windowing needs at least {required}")]
    SeriesTooShort { rows: usize, required: usize },

    #[error("{split} split is empty, not enough window samples to proceed")]
    EmptyDataset { split: &'static str },

    #[error("unsupported architecture {0:?}, expected one of SimpleRNN, LSTM, GRU")]
    UnsupportedArchitecture(String),

    #[error("could not persist artifact: {0}")]
    Artifact(String),

    #[error("price series is empty, nothing to scale")]
    EmptySeries,
}
