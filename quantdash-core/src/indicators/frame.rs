//! Indicator frame: a series plus row-aligned derived columns.

use super::engine::IndicatorParams;
use crate::domain::{Bar, Series};
use chrono::NaiveDate;
use serde::Serialize;

/// Derived columns, in output order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IndicatorColumn {
    SmaFast,
    SmaSlow,
    BollingerUpper,
    BollingerLower,
    Rsi,
    DailyReturn,
    AnnualVolatility,
}

impl IndicatorColumn {
    pub const ALL: [IndicatorColumn; 7] = [
        IndicatorColumn::SmaFast,
        IndicatorColumn::SmaSlow,
        IndicatorColumn::BollingerUpper,
        IndicatorColumn::BollingerLower,
        IndicatorColumn::Rsi,
        IndicatorColumn::DailyReturn,
        IndicatorColumn::AnnualVolatility,
    ];

    pub fn name(self) -> &'static str {
        match self {
            IndicatorColumn::SmaFast => "sma_fast",
            IndicatorColumn::SmaSlow => "sma_slow",
            IndicatorColumn::BollingerUpper => "bollinger_upper",
            IndicatorColumn::BollingerLower => "bollinger_lower",
            IndicatorColumn::Rsi => "rsi",
            IndicatorColumn::DailyReturn => "daily_return",
            IndicatorColumn::AnnualVolatility => "annual_volatility",
        }
    }

    fn index(self) -> usize {
        self as usize
    }
}

/// One output row. Missing cells serialize as `null`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IndicatorRow {
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: Option<u64>,
    pub sma_fast: Option<f64>,
    pub sma_slow: Option<f64>,
    pub bollinger_upper: Option<f64>,
    pub bollinger_lower: Option<f64>,
    pub rsi: Option<f64>,
    pub daily_return: Option<f64>,
    pub annual_volatility: Option<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct IndicatorFrame {
    series: Series,
    params: IndicatorParams,
    columns: Vec<Vec<Option<f64>>>,
}

impl IndicatorFrame {
    /// `columns` must be in [`IndicatorColumn::ALL`] order, each as long as the series.
    pub(crate) fn new(series: Series, params: IndicatorParams, columns: Vec<Vec<Option<f64>>>) -> Self {
        debug_assert_eq!(columns.len(), IndicatorColumn::ALL.len());
        debug_assert!(columns.iter().all(|c| c.len() == series.len()));
        Self {
            series,
            params,
            columns,
        }
    }

    pub fn series(&self) -> &Series {
        &self.series
    }

    pub fn symbol(&self) -> &str {
        self.series.symbol()
    }

    pub fn params(&self) -> &IndicatorParams {
        &self.params
    }

    pub fn len(&self) -> usize {
        self.series.len()
    }

    pub fn is_empty(&self) -> bool {
        self.series.is_empty()
    }

    pub fn bars(&self) -> &[Bar] {
        self.series.bars()
    }

    pub fn column(&self, column: IndicatorColumn) -> &[Option<f64>] {
        &self.columns[column.index()]
    }

    /// `None` for a warm-up cell or an out-of-range row.
    pub fn value(&self, column: IndicatorColumn, row: usize) -> Option<f64> {
        self.column(column).get(row).copied().flatten()
    }

    pub fn row(&self, index: usize) -> Option<IndicatorRow> {
        let bar = self.series.bars().get(index)?;
        let cell = |column| self.value(column, index);
        Some(IndicatorRow {
            date: bar.date,
            open: bar.open,
            high: bar.high,
            low: bar.low,
            close: bar.close,
            volume: bar.volume,
            sma_fast: cell(IndicatorColumn::SmaFast),
            sma_slow: cell(IndicatorColumn::SmaSlow),
            bollinger_upper: cell(IndicatorColumn::BollingerUpper),
            bollinger_lower: cell(IndicatorColumn::BollingerLower),
            rsi: cell(IndicatorColumn::Rsi),
            daily_return: cell(IndicatorColumn::DailyReturn),
            annual_volatility: cell(IndicatorColumn::AnnualVolatility),
        })
    }

    /// Rows in ascending date order.
    pub fn rows(&self) -> impl DoubleEndedIterator<Item = IndicatorRow> + '_ {
        (0..self.len()).filter_map(move |i| self.row(i))
    }

    pub fn last_row(&self) -> Option<IndicatorRow> {
        self.len().checked_sub(1).and_then(|i| self.row(i))
    }

    /// BLAKE3 hex digest of the symbol, the bars and every derived cell.
    /// Floats are hashed by bit pattern.
    pub fn fingerprint(&self) -> String {
        let mut hasher = blake3::Hasher::new();
        hasher.update(self.symbol().as_bytes());
        for bar in self.series.bars() {
            hasher.update(bar.date.to_string().as_bytes());
            for price in [bar.open, bar.high, bar.low, bar.close] {
                hasher.update(&price.to_bits().to_le_bytes());
            }
            hasher.update(&bar.volume.unwrap_or(u64::MAX).to_le_bytes());
        }
        for column in &self.columns {
            for cell in column {
                match cell {
                    Some(v) => {
                        hasher.update(&[1]);
                        hasher.update(&v.to_bits().to_le_bytes());
                    }
                    None => {
                        hasher.update(&[0]);
                    }
                }
            }
        }
        hasher.finalize().to_hex().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::engine::{compute, SmaWindows};
    use crate::indicators::make_series;

    #[test]
    fn column_names_are_stable() {
        let names: Vec<_> = IndicatorColumn::ALL.iter().map(|c| c.name()).collect();
        assert_eq!(
            names,
            vec![
                "sma_fast",
                "sma_slow",
                "bollinger_upper",
                "bollinger_lower",
                "rsi",
                "daily_return",
                "annual_volatility"
            ]
        );
    }

    #[test]
    fn rows_serialize_missing_cells_as_null() {
        let frame = compute(&make_series(&[10.0, 11.0]), SmaWindows::SHORT).unwrap();
        let json = serde_json::to_value(frame.row(1).unwrap()).unwrap();
        assert!(json["sma_fast"].is_null());
        assert!(json["daily_return"].is_number());
        assert_eq!(json["date"], "2024-01-03");
    }

    #[test]
    fn fingerprint_is_deterministic_and_sensitive() {
        let closes: Vec<f64> = (0..40).map(|i| 100.0 + (i % 5) as f64).collect();
        let a = compute(&make_series(&closes), SmaWindows::SHORT).unwrap();
        let b = compute(&make_series(&closes), SmaWindows::SHORT).unwrap();
        assert_eq!(a.fingerprint(), b.fingerprint());

        let mut moved = closes.clone();
        moved[39] += 0.01;
        let c = compute(&make_series(&moved), SmaWindows::SHORT).unwrap();
        assert_ne!(a.fingerprint(), c.fingerprint());
    }

    #[test]
    fn out_of_range_row_is_none() {
        let frame = compute(&make_series(&[10.0]), SmaWindows::SHORT).unwrap();
        assert!(frame.row(1).is_none());
        assert_eq!(frame.value(IndicatorColumn::Rsi, 5), None);
        assert_eq!(frame.rows().count(), 1);
    }
}
