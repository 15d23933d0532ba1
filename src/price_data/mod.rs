pub mod config;
pub mod parse;
pub mod scale;

use chrono::NaiveDate;

/// Number of price features carried per trading day: Open, High, Low, Close.
pub const FEATURES: usize = 4;

/// Feature names in column order, used for chart titles and log output.
pub const FEATURE_NAMES: [&str; FEATURES] = ["Open", "High", "Low", "Close"];

#[derive(Debug, Clone, Copy)]
pub struct PriceRow {
    pub date: Option<NaiveDate>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
}

impl PriceRow {
    pub fn features(&self) -> [f64; FEATURES] {
        [self.open, self.high, self.low, self.close]
    }
}

/// An ordered series of trading days. The windowing logic assumes the rows
/// are chronological and contiguous, which is the order they appear in the
/// source csv.
#[derive(Debug, Clone)]
pub struct PriceSeries {
    pub rows: Vec<PriceRow>,
}

impl PriceSeries {
    pub fn new(rows: Vec<PriceRow>) -> PriceSeries {
        PriceSeries { rows }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn feature_matrix(&self) -> Vec<[f64; FEATURES]> {
        self.rows.iter().map(|row| row.features()).collect()
    }

    /// First and last dated rows, when the csv carried a Date column.
    pub fn span(&self) -> Option<(NaiveDate, NaiveDate)> {
        let mut dates = self.rows.iter().filter_map(|row| row.date);
        let first = dates.next()?;
        let last = dates.last().unwrap_or(first);
        Some((first, last))
    }
}
