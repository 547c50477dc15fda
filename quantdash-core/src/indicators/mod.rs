//! Indicator engine and the individual indicator columns.
//!
//! Every column implements [`Indicator`]: full bar history in, one optional
//! value per bar out. `None` marks the warm-up rows of a rolling window and is
//! never replaced by a fabricated number.

pub mod bollinger;
pub mod engine;
pub mod frame;
pub mod returns;
pub mod rolling;
pub mod rsi;
pub mod sma;
pub mod volatility;

pub use bollinger::{Bollinger, BollingerBand};
pub use engine::{compute, IndicatorEngine, IndicatorParams, ParamError, SmaWindows};
pub use frame::{IndicatorColumn, IndicatorFrame, IndicatorRow};
pub use returns::DailyReturn;
pub use rolling::{RollingWindow, StdDevKind};
pub use rsi::Rsi;
pub use sma::Sma;
pub use volatility::AnnualVolatility;

use crate::domain::Bar;

/// A derived column.
///
/// # Look-ahead contamination guard
/// The value at bar t may only depend on bars `0..=t`. Every indicator must
/// pass the truncated-vs-full series test.
pub trait Indicator: Send + Sync {
    /// Human-readable name (e.g., "sma_20", "rsi_14").
    fn name(&self) -> &str;

    /// Number of leading bars that are always `None`.
    fn lookback(&self) -> usize;

    /// Same length as `bars`.
    fn compute(&self, bars: &[Bar]) -> Vec<Option<f64>>;
}

/// Bars from close prices for tests: open = previous close, high/low about
/// one point outside the body, volume 1000, consecutive calendar days.
#[cfg(test)]
pub fn make_bars(closes: &[f64]) -> Vec<Bar> {
    let base_date = chrono::NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();
    closes
        .iter()
        .enumerate()
        .map(|(i, &close)| {
            let open = if i == 0 { close } else { closes[i - 1] };
            let body_low = open.min(close);
            Bar {
                date: base_date + chrono::Duration::days(i as i64),
                open,
                high: open.max(close) + 1.0,
                low: (body_low - 1.0).max(body_low * 0.5),
                close,
                volume: Some(1000),
            }
        })
        .collect()
}

#[cfg(test)]
pub fn make_series(closes: &[f64]) -> crate::domain::Series {
    crate::domain::Series::new("TEST", make_bars(closes)).unwrap()
}

/// Assert two f64 values are approximately equal (within epsilon).
#[cfg(test)]
pub fn assert_approx(actual: f64, expected: f64, epsilon: f64) {
    assert!(
        (actual - expected).abs() < epsilon,
        "assert_approx failed: actual={actual}, expected={expected}, diff={}, epsilon={epsilon}",
        (actual - expected).abs()
    );
}

/// Unwrap a defined cell and compare it.
#[cfg(test)]
pub fn assert_cell(actual: Option<f64>, expected: f64, epsilon: f64) {
    match actual {
        Some(v) => assert_approx(v, expected, epsilon),
        None => panic!("expected {expected}, got None"),
    }
}

/// Default epsilon for indicator tests.
#[cfg(test)]
pub const DEFAULT_EPSILON: f64 = 1e-10;
