//! Deterministic synthetic prices for offline runs and tests.
//!
//! A weekday random walk from 100.0, seeded from the BLAKE3 hash of the
//! symbol: the same symbol and start date always give the same bars.

use super::provider::{DataError, DataProvider, DataSource};
use super::raw::RawFrame;
use crate::domain::{Bar, Series};
use chrono::{Datelike, NaiveDate, Weekday};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

#[derive(Debug, Clone, Copy, Default)]
pub struct SyntheticProvider;

impl SyntheticProvider {
    pub fn new() -> Self {
        Self
    }

    pub fn bars(symbol: &str, start: NaiveDate, end: NaiveDate) -> Vec<Bar> {
        let seed: [u8; 32] = *blake3::hash(symbol.as_bytes()).as_bytes();
        let mut rng = StdRng::from_seed(seed);
        let mut price = 100.0_f64;

        start
            .iter_days()
            .take_while(|day| *day <= end)
            .filter(|day| !matches!(day.weekday(), Weekday::Sat | Weekday::Sun))
            .map(|date| {
                let daily_return: f64 = rng.gen_range(-0.03..0.03);
                let open = price;
                let close = price * (1.0 + daily_return);
                let high = open.max(close) * (1.0 + rng.gen_range(0.0..0.01));
                let low = open.min(close) * (1.0 - rng.gen_range(0.0..0.01));
                let volume = rng.gen_range(500_000..5_000_000u64);
                price = close;
                Bar {
                    date,
                    open,
                    high,
                    low,
                    close,
                    volume: Some(volume),
                }
            })
            .collect()
    }
}

impl DataProvider for SyntheticProvider {
    fn name(&self) -> &str {
        "synthetic"
    }

    fn source(&self) -> DataSource {
        DataSource::Synthetic
    }

    fn fetch(&self, symbol: &str, start: NaiveDate, end: NaiveDate) -> Result<RawFrame, DataError> {
        let series = Series::new(symbol, Self::bars(symbol, start, end))?;
        Ok(RawFrame::from(&series))
    }
}
