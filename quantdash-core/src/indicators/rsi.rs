//! Relative Strength Index (RSI).
//!
//! Simple rolling means of gains and losses over the last `period` close-to-close
//! changes: RSI = 100 - 100 / (1 + avg_gain / avg_loss).
//! Bar 0 has no prior close and counts as a zero gain and a zero loss, so the
//! first value lands at bar `period - 1`.
//! Lookback: period - 1.
//! A window with no losses reads 100, including a flat one.

use super::rolling::RollingWindow;
use super::Indicator;
use crate::domain::Bar;

#[derive(Debug, Clone)]
pub struct Rsi {
    period: usize,
    name: String,
}

impl Rsi {
    pub fn new(period: usize) -> Self {
        assert!(period >= 1, "RSI period must be >= 1");
        Self {
            period,
            name: format!("rsi_{period}"),
        }
    }
}

impl Indicator for Rsi {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        self.period - 1
    }

    fn compute(&self, bars: &[Bar]) -> Vec<Option<f64>> {
        let mut gains = RollingWindow::new(self.period);
        let mut losses = RollingWindow::new(self.period);

        let mut result = Vec::with_capacity(bars.len());
        let mut prev_close: Option<f64> = None;
        for bar in bars {
            let delta = prev_close.map_or(0.0, |prev| bar.close - prev);
            gains.push(delta.max(0.0));
            losses.push((-delta).max(0.0));
            result.push(rsi_value(&gains, &losses));
            prev_close = Some(bar.close);
        }
        result
    }
}

fn rsi_value(gains: &RollingWindow, losses: &RollingWindow) -> Option<f64> {
    let avg_gain = gains.mean()?.max(0.0);
    if losses.is_all_zero() {
        return Some(100.0);
    }
    let avg_loss = losses.mean()?.max(0.0);
    if avg_loss == 0.0 {
        return Some(100.0);
    }
    Some(100.0 - 100.0 / (1.0 + avg_gain / avg_loss))
}
