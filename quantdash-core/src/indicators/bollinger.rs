//! Bollinger Bands: moving average +/- a multiple of the rolling std-dev.
//!
//! Upper and lower bands are separate instances over the same window as the
//! fast SMA, so the middle band is the `sma_fast` column itself.
//! Lookback: period - 1.

use super::rolling::{RollingWindow, StdDevKind};
use super::Indicator;
use crate::domain::Bar;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BollingerBand {
    Upper,
    Lower,
}

#[derive(Debug, Clone)]
pub struct Bollinger {
    period: usize,
    multiplier: f64,
    band: BollingerBand,
    kind: StdDevKind,
    name: String,
}

impl Bollinger {
    fn new(period: usize, multiplier: f64, band: BollingerBand, kind: StdDevKind) -> Self {
        assert!(
            period > kind.ddof(),
            "Bollinger period must exceed the std-dev degrees of freedom"
        );
        let side = match band {
            BollingerBand::Upper => "upper",
            BollingerBand::Lower => "lower",
        };
        Self {
            period,
            multiplier,
            band,
            kind,
            name: format!("bollinger_{side}_{period}_{multiplier}"),
        }
    }

    pub fn upper(period: usize, multiplier: f64, kind: StdDevKind) -> Self {
        Self::new(period, multiplier, BollingerBand::Upper, kind)
    }

    pub fn lower(period: usize, multiplier: f64, kind: StdDevKind) -> Self {
        Self::new(period, multiplier, BollingerBand::Lower, kind)
    }
}

impl Indicator for Bollinger {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        self.period - 1
    }

    fn compute(&self, bars: &[Bar]) -> Vec<Option<f64>> {
        let mut window = RollingWindow::new(self.period);
        bars.iter()
            .map(|bar| {
                window.push(bar.close);
                let mean = window.mean()?;
                let width = self.multiplier * window.std_dev(self.kind)?;
                Some(match self.band {
                    BollingerBand::Upper => mean + width,
                    BollingerBand::Lower => mean - width,
                })
            })
            .collect()
    }
}
