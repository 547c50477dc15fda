//! Daily return: fractional close-to-close change.
//! Lookback: 1.

use super::Indicator;
use crate::domain::Bar;

#[derive(Debug, Clone, Default)]
pub struct DailyReturn;

impl DailyReturn {
    pub fn new() -> Self {
        Self
    }
}

/// `close[t] / close[t-1] - 1`. Closes are positive in a valid series, so the
/// ratio is always defined after the first bar.
pub(crate) fn daily_returns(bars: &[Bar]) -> impl Iterator<Item = Option<f64>> + '_ {
    std::iter::once(None).take(bars.len().min(1)).chain(
        bars.windows(2)
            .map(|pair| Some(pair[1].close / pair[0].close - 1.0)),
    )
}

impl Indicator for DailyReturn {
    fn name(&self) -> &str {
        "daily_return"
    }

    fn lookback(&self) -> usize {
        1
    }

    fn compute(&self, bars: &[Bar]) -> Vec<Option<f64>> {
        daily_returns(bars).collect()
    }
}
