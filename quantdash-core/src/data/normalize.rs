//! Series normalizer: provider frame in, canonical [`Series`] out.
//!
//! Steps, in order:
//! 1. Flatten headers: the first header level naming a known field wins, so
//!    `("Close", "AAPL")`, `("AAPL", "Close")` and `"close"` all map to close.
//! 2. Map fields case-insensitively; `date`/`datetime`/`timestamp` → date.
//!    Unknown columns (`Adj Close`, `Dividends`, ...) are dropped.
//! 3. Parse cells. Zone-aware timestamps keep their exchange-local calendar
//!    date. Unparseable cells fail the whole frame; nothing is coerced.
//! 4. Drop void rows (missing OHLC) and insane rows (OHLC ordering broken).
//! 5. Stable sort by date, keep the first of any duplicate dates.

use super::provider::DataError;
use super::raw::{RawColumn, RawFrame, RawValue};
use crate::domain::{Bar, Series};
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use tracing::{debug, warn};

/// Canonical columns, in output order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    Date,
    Open,
    High,
    Low,
    Close,
    Volume,
}

impl Field {
    const COUNT: usize = 6;

    fn name(self) -> &'static str {
        match self {
            Field::Date => "date",
            Field::Open => "open",
            Field::High => "high",
            Field::Low => "low",
            Field::Close => "close",
            Field::Volume => "volume",
        }
    }

    fn from_header(level: &str) -> Option<Field> {
        match level.trim().to_ascii_lowercase().as_str() {
            "date" | "datetime" | "timestamp" => Some(Field::Date),
            "open" => Some(Field::Open),
            "high" => Some(Field::High),
            "low" => Some(Field::Low),
            "close" => Some(Field::Close),
            "volume" => Some(Field::Volume),
            _ => None,
        }
    }
}

fn field_of(column: &RawColumn) -> Option<Field> {
    column
        .header()
        .iter()
        .find_map(|level| Field::from_header(level))
}

/// What the normalizer threw away.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NormalizeReport {
    pub input_rows: usize,
    /// Rows with a missing open/high/low/close (holidays, halted days).
    pub void_rows: usize,
    /// Rows whose prices break `low <= open,close <= high` or are not positive.
    pub insane_rows: usize,
    /// Later rows sharing a date with an earlier one.
    pub duplicate_rows: usize,
    /// Headers of columns that map to no canonical field.
    pub dropped_columns: Vec<String>,
}

impl NormalizeReport {
    pub fn dropped_rows(&self) -> usize {
        self.void_rows + self.insane_rows + self.duplicate_rows
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Normalized {
    pub series: Series,
    pub report: NormalizeReport,
}

/// Normalize a provider frame into a canonical series for `symbol`.
pub fn normalize(symbol: &str, raw: &RawFrame) -> Result<Series, DataError> {
    normalize_with_report(symbol, raw).map(|n| n.series)
}

/// Like [`normalize`], also returning what was dropped.
pub fn normalize_with_report(symbol: &str, raw: &RawFrame) -> Result<Normalized, DataError> {
    let mut report = NormalizeReport::default();
    if raw.is_empty() {
        debug!(symbol, "empty provider frame");
        return Ok(Normalized {
            series: Series::empty(symbol),
            report,
        });
    }

    let height = raw.height();
    report.input_rows = height;

    let mut slots: [Option<&RawColumn>; Field::COUNT] = [None; Field::COUNT];
    for column in raw.columns() {
        if column.len() != height {
            return Err(DataError::RaggedColumns {
                column: column.header().join("/"),
                expected: height,
                actual: column.len(),
            });
        }
        match field_of(column) {
            Some(field) => {
                let slot = &mut slots[field as usize];
                if slot.is_some() {
                    return Err(DataError::AmbiguousField {
                        field: field.name(),
                    });
                }
                *slot = Some(column);
            }
            None => report.dropped_columns.push(column.header().join("/")),
        }
    }

    let required = |field: Field| {
        slots[field as usize].ok_or(DataError::MissingField {
            field: field.name(),
        })
    };
    let dates = required(Field::Date)?;
    let opens = required(Field::Open)?;
    let highs = required(Field::High)?;
    let lows = required(Field::Low)?;
    let closes = required(Field::Close)?;
    let volumes = slots[Field::Volume as usize];

    let mut bars = Vec::with_capacity(height);
    for row in 0..height {
        let date = parse_date(&dates.values()[row], row)?;
        let open = parse_price(&opens.values()[row], Field::Open, row)?;
        let high = parse_price(&highs.values()[row], Field::High, row)?;
        let low = parse_price(&lows.values()[row], Field::Low, row)?;
        let close = parse_price(&closes.values()[row], Field::Close, row)?;
        let volume = match volumes {
            Some(col) => parse_volume(&col.values()[row], row)?,
            None => None,
        };

        let (Some(open), Some(high), Some(low), Some(close)) = (open, high, low, close) else {
            report.void_rows += 1;
            continue;
        };

        let bar = Bar {
            date,
            open,
            high,
            low,
            close,
            volume,
        };
        if !bar.is_sane() {
            report.insane_rows += 1;
            continue;
        }
        bars.push(bar);
    }

    bars.sort_by_key(|b| b.date);
    let before_dedup = bars.len();
    bars.dedup_by_key(|b| b.date);
    report.duplicate_rows = before_dedup - bars.len();

    if report.dropped_rows() > 0 {
        warn!(
            symbol,
            void = report.void_rows,
            insane = report.insane_rows,
            duplicates = report.duplicate_rows,
            "dropped rows during normalization"
        );
    }

    let series = Series::new(symbol, bars)?;
    debug!(
        symbol,
        rows = series.len(),
        dropped_columns = ?report.dropped_columns,
        "normalized provider frame"
    );
    Ok(Normalized { series, report })
}

fn malformed(field: Field, row: usize, reason: impl Into<String>) -> DataError {
    DataError::MalformedCell {
        field: field.name(),
        row,
        reason: reason.into(),
    }
}

/// Integer cells are Unix seconds (UTC).
fn parse_date(value: &RawValue, row: usize) -> Result<NaiveDate, DataError> {
    match value {
        RawValue::Date(d) => Ok(*d),
        RawValue::DateTime(dt) => Ok(dt.date()),
        RawValue::ZonedDateTime(dt) => Ok(dt.naive_local().date()),
        RawValue::Int(secs) => DateTime::from_timestamp(*secs, 0)
            .map(|dt| dt.date_naive())
            .ok_or_else(|| malformed(Field::Date, row, format!("timestamp out of range: {secs}"))),
        RawValue::Text(s) => parse_date_text(s.trim())
            .ok_or_else(|| malformed(Field::Date, row, format!("not a date: '{s}'"))),
        RawValue::Null | RawValue::Float(_) => {
            Err(malformed(Field::Date, row, "missing or non-date value"))
        }
    }
}

fn parse_date_text(s: &str) -> Option<NaiveDate> {
    if let Ok(d) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return Some(d);
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.naive_local().date());
    }
    if let Ok(dt) = DateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%:z") {
        return Some(dt.naive_local().date());
    }
    ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
        .map(|dt| dt.date())
}

fn parse_price(value: &RawValue, field: Field, row: usize) -> Result<Option<f64>, DataError> {
    if value.is_missing() {
        return Ok(None);
    }
    match value {
        RawValue::Float(v) => Ok(Some(*v)),
        RawValue::Int(v) => Ok(Some(*v as f64)),
        RawValue::Text(s) => match s.trim().parse::<f64>() {
            Ok(v) if v.is_nan() => Ok(None),
            Ok(v) => Ok(Some(v)),
            Err(_) => Err(malformed(field, row, format!("not a number: '{s}'"))),
        },
        _ => Err(malformed(field, row, "expected a number, found a date")),
    }
}

/// Float volumes (pandas stores them that way once a NaN appears) are rounded.
fn parse_volume(value: &RawValue, row: usize) -> Result<Option<u64>, DataError> {
    if value.is_missing() {
        return Ok(None);
    }
    let v = match value {
        RawValue::Int(i) => *i as f64,
        RawValue::Float(f) => *f,
        RawValue::Text(s) => s
            .trim()
            .parse::<f64>()
            .map_err(|_| malformed(Field::Volume, row, format!("not a number: '{s}'")))?,
        _ => return Err(malformed(Field::Volume, row, "expected a number, found a date")),
    };
    if !v.is_finite() || v < 0.0 {
        return Err(malformed(
            Field::Volume,
            row,
            format!("must be a non-negative number, got {v}"),
        ));
    }
    Ok(Some(v.round() as u64))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{FixedOffset, TimeZone};

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn floats(values: &[f64]) -> Vec<RawValue> {
        values.iter().map(|v| RawValue::Float(*v)).collect()
    }

    fn texts(values: &[&str]) -> Vec<RawValue> {
        values.iter().map(|v| RawValue::from(*v)).collect()
    }

    /// Three unsorted rows in flat lower-case columns.
    fn flat_frame() -> RawFrame {
        RawFrame::new()
            .with_column(RawColumn::new("date", texts(&["2024-01-04", "2024-01-02", "2024-01-03"])))
            .with_column(RawColumn::new("open", floats(&[12.0, 10.0, 11.0])))
            .with_column(RawColumn::new("high", floats(&[13.0, 11.0, 12.0])))
            .with_column(RawColumn::new("low", floats(&[11.0, 9.0, 10.0])))
            .with_column(RawColumn::new("close", floats(&[12.5, 10.5, 11.5])))
            .with_column(RawColumn::new("volume", floats(&[300.0, 100.0, 200.0])))
    }

    #[test]
    fn empty_frame_is_empty_series() {
        let series = normalize("SPY", &RawFrame::new()).unwrap();
        assert!(series.is_empty());
        assert_eq!(series.symbol(), "SPY");
    }

    #[test]
    fn frame_with_headers_but_no_rows_is_empty_series() {
        let raw = RawFrame::new().with_column(RawColumn::new("Close", vec![]));
        assert!(normalize("SPY", &raw).unwrap().is_empty());
    }

    #[test]
    fn sorts_ascending_by_date() {
        let series = normalize("SPY", &flat_frame()).unwrap();
        let dates: Vec<_> = series.bars().iter().map(|b| b.date).collect();
        assert_eq!(dates, vec![d(2024, 1, 2), d(2024, 1, 3), d(2024, 1, 4)]);
        assert_eq!(series.bars()[0].close, 10.5);
        assert_eq!(series.bars()[0].volume, Some(100));
    }

    #[test]
    fn nested_yfinance_headers_are_flattened() {
        // Shape of a single-ticker yfinance download after reset_index():
        // ("Date", "") plus ("Close", "AAPL"), ("High", "AAPL"), ...
        let raw = RawFrame::new()
            .with_column(RawColumn::nested(["Date", ""], texts(&["2024-01-02", "2024-01-03"])))
            .with_column(RawColumn::nested(["Close", "AAPL"], floats(&[185.6, 184.2])))
            .with_column(RawColumn::nested(["High", "AAPL"], floats(&[188.4, 185.9])))
            .with_column(RawColumn::nested(["Low", "AAPL"], floats(&[183.9, 183.4])))
            .with_column(RawColumn::nested(["Open", "AAPL"], floats(&[187.1, 184.2])))
            .with_column(RawColumn::nested(["Volume", "AAPL"], floats(&[82_488_700.0, 58_414_500.0])));

        let series = normalize("AAPL", &raw).unwrap();
        assert_eq!(series.len(), 2);
        let bar = &series.bars()[0];
        assert_eq!(bar.open, 187.1);
        assert_eq!(bar.high, 188.4);
        assert_eq!(bar.low, 183.9);
        assert_eq!(bar.close, 185.6);
        assert_eq!(bar.volume, Some(82_488_700));
    }

    #[test]
    fn ticker_first_grouping_is_flattened_too() {
        let raw = RawFrame::new()
            .with_column(RawColumn::nested(["Price", "Ticker", "Date"], texts(&["2024-01-02"])))
            .with_column(RawColumn::nested(["AAPL", "Open"], floats(&[10.0])))
            .with_column(RawColumn::nested(["AAPL", "High"], floats(&[11.0])))
            .with_column(RawColumn::nested(["AAPL", "Low"], floats(&[9.0])))
            .with_column(RawColumn::nested(["AAPL", "Close"], floats(&[10.5])));
        let series = normalize("AAPL", &raw).unwrap();
        assert_eq!(series.len(), 1);
        assert_eq!(series.bars()[0].volume, None);
    }

    #[test]
    fn two_tickers_under_one_field_is_ambiguous() {
        let raw = RawFrame::new()
            .with_column(RawColumn::new("Date", texts(&["2024-01-02"])))
            .with_column(RawColumn::nested(["Close", "AAPL"], floats(&[10.0])))
            .with_column(RawColumn::nested(["Close", "MSFT"], floats(&[20.0])));
        let err = normalize("AAPL", &raw).unwrap_err();
        assert!(matches!(err, DataError::AmbiguousField { field: "close" }));
    }

    #[test]
    fn header_matching_ignores_case_and_whitespace() {
        let raw = RawFrame::new()
            .with_column(RawColumn::new(" Datetime ", texts(&["2024-01-02"])))
            .with_column(RawColumn::new("OPEN", floats(&[10.0])))
            .with_column(RawColumn::new("High", floats(&[11.0])))
            .with_column(RawColumn::new("low", floats(&[9.0])))
            .with_column(RawColumn::new("Close", floats(&[10.5])));
        assert_eq!(normalize("X", &raw).unwrap().len(), 1);
    }

    #[test]
    fn extra_columns_are_dropped_and_reported() {
        let raw = flat_frame()
            .with_column(RawColumn::new("Adj Close", floats(&[1.0, 2.0, 3.0])))
            .with_column(RawColumn::new("Dividends", floats(&[0.0, 0.0, 0.0])));
        let out = normalize_with_report("SPY", &raw).unwrap();
        assert_eq!(out.series.len(), 3);
        assert_eq!(out.report.dropped_columns, vec!["Adj Close", "Dividends"]);
    }

    #[test]
    fn missing_volume_column_is_not_an_error() {
        let raw = RawFrame::new()
            .with_column(RawColumn::new("date", texts(&["2024-01-02"])))
            .with_column(RawColumn::new("open", floats(&[10.0])))
            .with_column(RawColumn::new("high", floats(&[11.0])))
            .with_column(RawColumn::new("low", floats(&[9.0])))
            .with_column(RawColumn::new("close", floats(&[10.5])));
        let series = normalize("X", &raw).unwrap();
        assert_eq!(series.bars()[0].volume, None);
        assert!(!series.has_volume());
    }

    #[test]
    fn missing_close_column_is_malformed() {
        let raw = RawFrame::new()
            .with_column(RawColumn::new("date", texts(&["2024-01-02"])))
            .with_column(RawColumn::new("open", floats(&[10.0])))
            .with_column(RawColumn::new("high", floats(&[11.0])))
            .with_column(RawColumn::new("low", floats(&[9.0])));
        let err = normalize("X", &raw).unwrap_err();
        assert!(matches!(err, DataError::MissingField { field: "close" }));
        assert_eq!(err.kind(), super::super::provider::ErrorKind::MalformedInput);
    }

    #[test]
    fn unparseable_price_is_malformed_not_zero() {
        let raw = RawFrame::new()
            .with_column(RawColumn::new("date", texts(&["2024-01-02", "2024-01-03"])))
            .with_column(RawColumn::new("open", texts(&["10", "abc"])))
            .with_column(RawColumn::new("high", texts(&["11", "12"])))
            .with_column(RawColumn::new("low", texts(&["9", "10"])))
            .with_column(RawColumn::new("close", texts(&["10.5", "11"])));
        let err = normalize("X", &raw).unwrap_err();
        assert!(matches!(
            err,
            DataError::MalformedCell {
                field: "open",
                row: 1,
                ..
            }
        ));
    }

    #[test]
    fn negative_volume_is_malformed() {
        let raw = flat_frame();
        let mut columns: Vec<RawColumn> = raw.columns().to_vec();
        columns[5] = RawColumn::new("volume", floats(&[1.0, -5.0, 3.0]));
        let raw = columns.into_iter().fold(RawFrame::new(), RawFrame::with_column);
        let err = normalize("X", &raw).unwrap_err();
        assert!(matches!(err, DataError::MalformedCell { field: "volume", .. }));
    }

    #[test]
    fn ragged_columns_are_rejected() {
        let raw = flat_frame().with_column(RawColumn::new("extra", floats(&[1.0])));
        let err = normalize("X", &raw).unwrap_err();
        assert!(matches!(
            err,
            DataError::RaggedColumns {
                expected: 3,
                actual: 1,
                ..
            }
        ));
    }

    #[test]
    fn void_rows_are_dropped() {
        let raw = RawFrame::new()
            .with_column(RawColumn::new("date", texts(&["2024-01-02", "2024-01-03"])))
            .with_column(RawColumn::new("open", vec![RawValue::Float(10.0), RawValue::Null]))
            .with_column(RawColumn::new("high", floats(&[11.0, f64::NAN])))
            .with_column(RawColumn::new("low", floats(&[9.0, f64::NAN])))
            .with_column(RawColumn::new("close", texts(&["10.5", ""])));
        let out = normalize_with_report("X", &raw).unwrap();
        assert_eq!(out.series.len(), 1);
        assert_eq!(out.report.void_rows, 1);
    }

    #[test]
    fn insane_rows_are_dropped() {
        let raw = RawFrame::new()
            .with_column(RawColumn::new("date", texts(&["2024-01-02", "2024-01-03"])))
            .with_column(RawColumn::new("open", floats(&[10.0, 10.0])))
            .with_column(RawColumn::new("high", floats(&[11.0, 8.0])))
            .with_column(RawColumn::new("low", floats(&[9.0, 9.0])))
            .with_column(RawColumn::new("close", floats(&[10.5, 10.0])));
        let out = normalize_with_report("X", &raw).unwrap();
        assert_eq!(out.series.len(), 1);
        assert_eq!(out.report.insane_rows, 1);
    }

    #[test]
    fn duplicate_dates_keep_first_occurrence() {
        let raw = RawFrame::new()
            .with_column(RawColumn::new("date", texts(&["2024-01-02", "2024-01-03", "2024-01-02"])))
            .with_column(RawColumn::new("open", floats(&[10.0, 11.0, 50.0])))
            .with_column(RawColumn::new("high", floats(&[11.0, 12.0, 51.0])))
            .with_column(RawColumn::new("low", floats(&[9.0, 10.0, 49.0])))
            .with_column(RawColumn::new("close", floats(&[10.5, 11.5, 50.5])));
        let out = normalize_with_report("X", &raw).unwrap();
        assert_eq!(out.series.len(), 2);
        assert_eq!(out.series.bars()[0].open, 10.0);
        assert_eq!(out.report.duplicate_rows, 1);
    }

    #[test]
    fn zone_aware_timestamps_keep_exchange_local_date() {
        // 23:30 in New York is already the next day in UTC.
        let ny = FixedOffset::west_opt(5 * 3600).unwrap();
        let late = ny.with_ymd_and_hms(2024, 1, 2, 23, 30, 0).unwrap();
        let raw = RawFrame::new()
            .with_column(RawColumn::new(
                "Datetime",
                vec![
                    RawValue::ZonedDateTime(late),
                    RawValue::from("2024-01-03 00:00:00-05:00"),
                ],
            ))
            .with_column(RawColumn::new("Open", floats(&[10.0, 10.0])))
            .with_column(RawColumn::new("High", floats(&[11.0, 11.0])))
            .with_column(RawColumn::new("Low", floats(&[9.0, 9.0])))
            .with_column(RawColumn::new("Close", floats(&[10.5, 10.5])));
        let series = normalize("X", &raw).unwrap();
        assert_eq!(series.bars()[0].date, d(2024, 1, 2));
        assert_eq!(series.bars()[1].date, d(2024, 1, 3));
    }

    #[test]
    fn epoch_seconds_are_utc_dates() {
        let raw = RawFrame::new()
            .with_column(RawColumn::new("timestamp", vec![RawValue::Int(1_704_205_800)]))
            .with_column(RawColumn::new("open", floats(&[10.0])))
            .with_column(RawColumn::new("high", floats(&[11.0])))
            .with_column(RawColumn::new("low", floats(&[9.0])))
            .with_column(RawColumn::new("close", floats(&[10.5])));
        let series = normalize("X", &raw).unwrap();
        assert_eq!(series.bars()[0].date, d(2024, 1, 2));
    }

    #[test]
    fn normalize_is_idempotent() {
        let once = normalize("SPY", &flat_frame()).unwrap();
        let twice = normalize("SPY", &RawFrame::from(&once)).unwrap();
        assert_eq!(once, twice);
    }
}
