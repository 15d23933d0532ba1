use std::fs::File;
use std::io::Read;
use std::path::Path;

use chrono::NaiveDate;
use serde::Deserialize;

use crate::error::ForecastError;

use super::{PriceRow, PriceSeries};

/// Columns the experiment cannot run without. Any other column in the file
/// is carried by the csv but ignored here.
const REQUIRED_COLUMNS: [&str; 4] = ["Open", "High", "Low", "Close"];

#[derive(Debug, Deserialize)]
struct CsvRow {
    #[serde(rename = "Date", default)]
    date: Option<String>,
    #[serde(rename = "Open")]
    open: f64,
    #[serde(rename = "High")]
    high: f64,
    #[serde(rename = "Low")]
    low: f64,
    #[serde(rename = "Close")]
    close: f64,
}

pub fn load_price_series(path: impl AsRef<Path>) -> Result<PriceSeries, ForecastError> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|source| ForecastError::OpenFile {
        path: path.display().to_string(),
        source,
    })?;
    read_price_series(file)
}

pub fn read_price_series<R: Read>(reader: R) -> Result<PriceSeries, ForecastError> {
    let mut rdr = csv::Reader::from_reader(reader);

    // Check the header up front so a misnamed column fails with the column
    // name instead of a row-level deserialize error.
    let headers = rdr.headers()?.clone();
    for column in REQUIRED_COLUMNS {
        if !headers.iter().any(|header| header == column) {
            return Err(ForecastError::MissingColumn(column));
        }
    }

    let mut rows = Vec::new();
    for result in rdr.deserialize() {
        let record: CsvRow = result?;

        // Dates come in whatever format the vendor used; a date that does
        // not parse only costs us the log span, not the run.
        let date = record
            .date
            .as_deref()
            .and_then(|raw| NaiveDate::parse_from_str(raw, "%Y-%m-%d").ok());

        rows.push(PriceRow {
            date,
            open: record.open,
            high: record.high,
            low: record.low,
            close: record.close,
        });
    }

    Ok(PriceSeries::new(rows))
}
