//! Annualized rolling volatility of daily returns, in percent.
//!
//! `std_dev(daily_return, window) * sqrt(periods_per_year) * 100`.
//! Lookback: window (returns start at bar 1).

use super::returns::daily_returns;
use super::rolling::{RollingWindow, StdDevKind};
use super::Indicator;
use crate::domain::Bar;

#[derive(Debug, Clone)]
pub struct AnnualVolatility {
    window: usize,
    periods_per_year: f64,
    kind: StdDevKind,
    name: String,
}

impl AnnualVolatility {
    pub fn new(window: usize, periods_per_year: f64, kind: StdDevKind) -> Self {
        assert!(
            window > kind.ddof(),
            "volatility window must exceed the std-dev degrees of freedom"
        );
        Self {
            window,
            periods_per_year,
            kind,
            name: format!("annual_volatility_{window}"),
        }
    }
}

impl Indicator for AnnualVolatility {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        self.window
    }

    fn compute(&self, bars: &[Bar]) -> Vec<Option<f64>> {
        let scale = self.periods_per_year.sqrt() * 100.0;
        let mut window = RollingWindow::new(self.window);
        daily_returns(bars)
            .map(|ret| {
                window.push(ret?);
                window.std_dev(self.kind).map(|sd| sd * scale)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::{assert_cell, make_bars};

    #[test]
    fn undefined_through_row_20_for_window_21() {
        let closes: Vec<f64> = (0..30).map(|i| 100.0 + (i % 3) as f64).collect();
        let result = AnnualVolatility::new(21, 252.0, StdDevKind::Sample).compute(&make_bars(&closes));
        assert!(result[..21].iter().all(Option::is_none));
        assert!(result[21..].iter().all(Option::is_some));
    }

    #[test]
    fn constant_growth_has_zero_volatility() {
        // Each close 1% above the previous one
        let closes: Vec<f64> = (0..6).map(|i| 100.0 * 1.01_f64.powi(i)).collect();
        let result = AnnualVolatility::new(3, 252.0, StdDevKind::Sample).compute(&make_bars(&closes));
        assert_cell(result[3], 0.0, 1e-9);
    }

    #[test]
    fn alternating_returns_scale_by_sqrt_periods() {
        // Returns +10%, -10%, +10%: sample sd of (0.1, -0.1, 0.1)
        let bars = make_bars(&[100.0, 110.0, 99.0, 108.9]);
        let result = AnnualVolatility::new(3, 252.0, StdDevKind::Sample).compute(&bars);
        let mean: f64 = 0.1 / 3.0;
        let ss = 2.0 * (0.1 - mean).powi(2) + (-0.1 - mean).powi(2);
        let expected = (ss / 2.0).sqrt() * 252.0_f64.sqrt() * 100.0;
        assert_cell(result[3], expected, 1e-8);
    }
}
