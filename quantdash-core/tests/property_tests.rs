//! Property tests for indicator and normalizer invariants.
//!
//! Uses proptest to verify:
//! 1. Row alignment: every column is exactly as long as the series
//! 2. Bounds: RSI stays in [0, 100], lower band <= SMA <= upper band,
//!    band width is twice the multiplier times the sample std-dev
//! 3. Rolling accumulator: the running mean matches a direct recompute
//! 4. Normalization: shuffled input with duplicates yields ascending dates

use chrono::NaiveDate;
use proptest::prelude::*;
use quantdash_core::data::{normalize, RawColumn, RawFrame, RawValue};
use quantdash_core::domain::{Bar, Series};
use quantdash_core::indicators::{compute, IndicatorColumn, RollingWindow, SmaWindows};

// ── Strategies (proptest) ────────────────────────────────────────────

fn arb_closes(max_len: usize) -> impl Strategy<Value = Vec<f64>> {
    prop::collection::vec(1.0..1000.0_f64, 0..max_len)
        .prop_map(|v| v.into_iter().map(|p| (p * 100.0).round() / 100.0).collect())
}

fn series_from_closes(closes: &[f64]) -> Series {
    let base = NaiveDate::from_ymd_opt(2020, 1, 1).unwrap();
    let bars = closes
        .iter()
        .enumerate()
        .map(|(i, &close)| {
            let open = if i == 0 { close } else { closes[i - 1] };
            Bar {
                date: base + chrono::Duration::days(i as i64),
                open,
                high: open.max(close) * 1.01,
                low: open.min(close) * 0.99,
                close,
                volume: Some(1_000),
            }
        })
        .collect();
    Series::new("PROP", bars).unwrap()
}

// ── 1. Row alignment ─────────────────────────────────────────────────

proptest! {
    #[test]
    fn columns_align_with_bars(closes in arb_closes(120)) {
        let frame = compute(&series_from_closes(&closes), SmaWindows::SHORT).unwrap();
        prop_assert_eq!(frame.len(), closes.len());
        for column in IndicatorColumn::ALL {
            prop_assert_eq!(frame.column(column).len(), closes.len());
        }
        prop_assert_eq!(frame.rows().count(), closes.len());
    }
}

// ── 2. Bounds ────────────────────────────────────────────────────────

proptest! {
    #[test]
    fn rsi_is_bounded(closes in arb_closes(120)) {
        let frame = compute(&series_from_closes(&closes), SmaWindows::SHORT).unwrap();
        for value in frame.column(IndicatorColumn::Rsi).iter().flatten() {
            prop_assert!((0.0..=100.0).contains(value), "rsi out of range: {}", value);
        }
    }

    #[test]
    fn bands_bracket_the_fast_sma(closes in arb_closes(120)) {
        let frame = compute(&series_from_closes(&closes), SmaWindows::SHORT).unwrap();
        for i in 0..frame.len() {
            let (Some(lower), Some(mid), Some(upper)) = (
                frame.value(IndicatorColumn::BollingerLower, i),
                frame.value(IndicatorColumn::SmaFast, i),
                frame.value(IndicatorColumn::BollingerUpper, i),
            ) else {
                continue;
            };
            prop_assert!(lower <= mid + 1e-9 && mid <= upper + 1e-9);
        }
    }

    #[test]
    fn band_width_is_twice_multiplier_std_dev(closes in arb_closes(120)) {
        let fast = SmaWindows::SHORT.fast;
        let multiplier = 2.0;
        let frame = compute(&series_from_closes(&closes), SmaWindows::SHORT).unwrap();
        for i in 0..frame.len() {
            let upper = frame.value(IndicatorColumn::BollingerUpper, i);
            let lower = frame.value(IndicatorColumn::BollingerLower, i);
            if i + 1 < fast {
                prop_assert!(upper.is_none() && lower.is_none());
                continue;
            }
            let window = &closes[i + 1 - fast..=i];
            let mean = window.iter().sum::<f64>() / fast as f64;
            let var = window.iter().map(|c| (c - mean).powi(2)).sum::<f64>() / (fast - 1) as f64;
            let expected = 2.0 * multiplier * var.sqrt();
            let width = upper.unwrap() - lower.unwrap();
            let scale = window.iter().fold(1.0_f64, |m, c| m.max(c.abs()));
            prop_assert!(
                (width - expected).abs() <= 1e-9 * scale,
                "band width at {}: {} vs {}", i, width, expected
            );
        }
    }

    #[test]
    fn volatility_is_non_negative(closes in arb_closes(120)) {
        let frame = compute(&series_from_closes(&closes), SmaWindows::SHORT).unwrap();
        for value in frame.column(IndicatorColumn::AnnualVolatility).iter().flatten() {
            prop_assert!(*value >= 0.0);
        }
    }
}

// ── 3. Rolling accumulator ───────────────────────────────────────────

proptest! {
    #[test]
    fn rolling_mean_matches_recompute(
        values in prop::collection::vec(-1e6..1e6_f64, 1..300),
        capacity in 1usize..40,
    ) {
        let mut window = RollingWindow::new(capacity);
        for (i, &v) in values.iter().enumerate() {
            window.push(v);
            if i + 1 < capacity {
                prop_assert!(window.mean().is_none());
                continue;
            }
            let slice = &values[i + 1 - capacity..=i];
            let expected = slice.iter().sum::<f64>() / capacity as f64;
            let actual = window.mean().unwrap();
            prop_assert!(
                (actual - expected).abs() <= 1e-6,
                "mean drift at {}: {} vs {}", i, actual, expected
            );
        }
    }
}

// ── 4. Normalization ─────────────────────────────────────────────────

proptest! {
    #[test]
    fn normalize_sorts_and_dedups(
        offsets in prop::collection::vec(0i64..60, 1..80),
    ) {
        let base = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let dates: Vec<RawValue> = offsets
            .iter()
            .map(|&d| RawValue::Date(base + chrono::Duration::days(d)))
            .collect();
        let price = || offsets.iter().map(|_| RawValue::Float(10.0)).collect::<Vec<_>>();
        let frame = RawFrame::new()
            .with_column(RawColumn::new("Date", dates))
            .with_column(RawColumn::new("Open", price()))
            .with_column(RawColumn::new("High", price()))
            .with_column(RawColumn::new("Low", price()))
            .with_column(RawColumn::new("Close", price()));

        let series = normalize("PROP", &frame).unwrap();
        let mut unique = offsets.clone();
        unique.sort_unstable();
        unique.dedup();
        prop_assert_eq!(series.len(), unique.len());
        for pair in series.bars().windows(2) {
            prop_assert!(pair[0].date < pair[1].date);
        }
    }
}
