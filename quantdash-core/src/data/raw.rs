//! Provider-shaped tabular data, before normalization.
//!
//! A `RawFrame` is deliberately loose: header names and casing are whatever
//! the provider sent, headers may carry more than one level (a field level
//! plus a ticker level), and cells may be text, numbers, or dates with or
//! without a UTC offset.

use crate::domain::Series;
use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime};

/// A single cell.
#[derive(Debug, Clone, PartialEq)]
pub enum RawValue {
    Null,
    Int(i64),
    Float(f64),
    Text(String),
    Date(NaiveDate),
    DateTime(NaiveDateTime),
    ZonedDateTime(DateTime<FixedOffset>),
}

impl RawValue {
    /// Null, NaN, and blank text all count as missing.
    pub fn is_missing(&self) -> bool {
        match self {
            RawValue::Null => true,
            RawValue::Float(v) => v.is_nan(),
            RawValue::Text(s) => s.trim().is_empty(),
            _ => false,
        }
    }
}

impl From<f64> for RawValue {
    fn from(v: f64) -> Self {
        RawValue::Float(v)
    }
}

impl From<i64> for RawValue {
    fn from(v: i64) -> Self {
        RawValue::Int(v)
    }
}

impl From<&str> for RawValue {
    fn from(v: &str) -> Self {
        RawValue::Text(v.to_string())
    }
}

impl From<NaiveDate> for RawValue {
    fn from(v: NaiveDate) -> Self {
        RawValue::Date(v)
    }
}

impl<T: Into<RawValue>> From<Option<T>> for RawValue {
    fn from(v: Option<T>) -> Self {
        v.map_or(RawValue::Null, Into::into)
    }
}

/// One column: a (possibly multi-level) header plus its cells.
#[derive(Debug, Clone, PartialEq)]
pub struct RawColumn {
    header: Vec<String>,
    values: Vec<RawValue>,
}

impl RawColumn {
    /// Column with a flat, single-level header.
    pub fn new(name: impl Into<String>, values: Vec<RawValue>) -> Self {
        Self {
            header: vec![name.into()],
            values,
        }
    }

    /// Column with a grouped header, outermost level first,
    /// e.g. `["Close", "AAPL"]`.
    pub fn nested<I, S>(levels: I, values: Vec<RawValue>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            header: levels.into_iter().map(Into::into).collect(),
            values,
        }
    }

    pub fn header(&self) -> &[String] {
        &self.header
    }

    pub fn is_nested(&self) -> bool {
        self.header.len() > 1
    }

    pub fn values(&self) -> &[RawValue] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Columns in provider order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RawFrame {
    columns: Vec<RawColumn>,
}

impl RawFrame {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_column(mut self, column: RawColumn) -> Self {
        self.columns.push(column);
        self
    }

    pub fn push_column(&mut self, column: RawColumn) {
        self.columns.push(column);
    }

    pub fn columns(&self) -> &[RawColumn] {
        &self.columns
    }

    pub fn width(&self) -> usize {
        self.columns.len()
    }

    /// Row count, taken from the longest column.
    pub fn height(&self) -> usize {
        self.columns.iter().map(RawColumn::len).max().unwrap_or(0)
    }

    /// No columns or no rows: the provider had nothing for the request.
    pub fn is_empty(&self) -> bool {
        self.height() == 0
    }
}

/// Canonical frame for a series: `date, open, high, low, close` and
/// `volume` when any bar has one.
impl From<&Series> for RawFrame {
    fn from(series: &Series) -> Self {
        let bars = series.bars();
        let price = |f: fn(&crate::domain::Bar) -> f64| -> Vec<RawValue> {
            bars.iter().map(|b| RawValue::Float(f(b))).collect()
        };

        let mut frame = RawFrame::new()
            .with_column(RawColumn::new(
                "date",
                bars.iter().map(|b| RawValue::Date(b.date)).collect(),
            ))
            .with_column(RawColumn::new("open", price(|b| b.open)))
            .with_column(RawColumn::new("high", price(|b| b.high)))
            .with_column(RawColumn::new("low", price(|b| b.low)))
            .with_column(RawColumn::new("close", price(|b| b.close)));

        if series.has_volume() {
            frame.push_column(RawColumn::new(
                "volume",
                bars.iter()
                    .map(|b| b.volume.map_or(RawValue::Null, |v| RawValue::Int(v as i64)))
                    .collect(),
            ));
        }
        frame
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Bar;

    #[test]
    fn missing_cells() {
        assert!(RawValue::Null.is_missing());
        assert!(RawValue::Float(f64::NAN).is_missing());
        assert!(RawValue::Text("  ".into()).is_missing());
        assert!(!RawValue::Float(0.0).is_missing());
        assert!(!RawValue::Text("0".into()).is_missing());
    }

    #[test]
    fn option_conversion() {
        assert_eq!(RawValue::from(None::<f64>), RawValue::Null);
        assert_eq!(RawValue::from(Some(2.5)), RawValue::Float(2.5));
    }

    #[test]
    fn empty_frame_has_no_rows() {
        assert!(RawFrame::new().is_empty());
        let frame = RawFrame::new().with_column(RawColumn::new("close", vec![]));
        assert!(frame.is_empty());
        assert_eq!(frame.width(), 1);
    }

    #[test]
    fn nested_header_levels_are_kept_in_order() {
        let col = RawColumn::nested(["Close", "AAPL"], vec![RawValue::Float(1.0)]);
        assert!(col.is_nested());
        assert_eq!(col.header(), ["Close".to_string(), "AAPL".to_string()]);
    }

    #[test]
    fn series_to_frame_skips_volume_when_absent() {
        let bar = Bar {
            date: NaiveDate::from_ymd_opt(2024, 1, 2).unwrap(),
            open: 10.0,
            high: 11.0,
            low: 9.0,
            close: 10.5,
            volume: None,
        };
        let series = Series::new("X", vec![bar]).unwrap();
        let frame = RawFrame::from(&series);
        assert_eq!(frame.width(), 5);
        assert_eq!(frame.height(), 1);
    }
}
