//! Bar and Series: the canonical daily price schema.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// OHLCV bar for a single trading day.
///
/// Dates are naive calendar dates; any provider time zone has already been
/// stripped by the normalizer. Volume is optional because some sources
/// (indices, FX) publish none.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub volume: Option<u64>,
}

impl Bar {
    /// Returns true if any OHLC field is NaN (void bar).
    pub fn is_void(&self) -> bool {
        self.open.is_nan() || self.high.is_nan() || self.low.is_nan() || self.close.is_nan()
    }

    /// OHLC sanity check: finite positive prices, `low <= open,close <= high`.
    pub fn is_sane(&self) -> bool {
        if self.is_void() {
            return false;
        }
        let prices = [self.open, self.high, self.low, self.close];
        if prices.iter().any(|p| !p.is_finite() || *p <= 0.0) {
            return false;
        }
        self.high >= self.low
            && self.high >= self.open
            && self.high >= self.close
            && self.low <= self.open
            && self.low <= self.close
    }
}

/// Violations of the [`Series`] invariant.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SeriesError {
    #[error("bar {index} ({date}) is not after the previous bar ({previous})")]
    NotAscending {
        index: usize,
        previous: NaiveDate,
        date: NaiveDate,
    },

    #[error("bar {index} ({date}) violates OHLC ordering or has non-positive prices")]
    InsaneBar { index: usize, date: NaiveDate },
}

/// Ordered bars for one symbol.
///
/// Invariant: dates strictly increase and every bar is sane. The only way to
/// build a non-empty series is [`Series::new`], which checks both.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct Series {
    symbol: String,
    bars: Vec<Bar>,
}

impl Series {
    pub fn new(symbol: impl Into<String>, bars: Vec<Bar>) -> Result<Self, SeriesError> {
        for (index, bar) in bars.iter().enumerate() {
            if !bar.is_sane() {
                return Err(SeriesError::InsaneBar {
                    index,
                    date: bar.date,
                });
            }
            if index > 0 && bars[index - 1].date >= bar.date {
                return Err(SeriesError::NotAscending {
                    index,
                    previous: bars[index - 1].date,
                    date: bar.date,
                });
            }
        }
        Ok(Self {
            symbol: symbol.into(),
            bars,
        })
    }

    pub fn empty(symbol: impl Into<String>) -> Self {
        Self {
            symbol: symbol.into(),
            bars: Vec::new(),
        }
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn bars(&self) -> &[Bar] {
        &self.bars
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    pub fn first(&self) -> Option<&Bar> {
        self.bars.first()
    }

    pub fn last(&self) -> Option<&Bar> {
        self.bars.last()
    }

    /// True if at least one bar carries a volume.
    pub fn has_volume(&self) -> bool {
        self.bars.iter().any(|b| b.volume.is_some())
    }

    /// First and last date, or `None` for an empty series.
    pub fn date_range(&self) -> Option<(NaiveDate, NaiveDate)> {
        Some((self.first()?.date, self.last()?.date))
    }

    /// Bars with `start <= date <= end`, as a new series.
    ///
    /// A sub-slice of a valid series is still valid, so no re-check is needed.
    pub fn within(&self, start: NaiveDate, end: NaiveDate) -> Series {
        let from = self.bars.partition_point(|b| b.date < start);
        let to = self.bars.partition_point(|b| b.date <= end);
        let bars = if from < to {
            self.bars[from..to].to_vec()
        } else {
            Vec::new()
        };
        Series {
            symbol: self.symbol.clone(),
            bars,
        }
    }

    pub fn into_bars(self) -> Vec<Bar> {
        self.bars
    }
}
