//! Indicator engine: one validated parameter set, one pass per column.
//!
//! `compute` is a pure function of the series and the parameters. The input is
//! never mutated and identical inputs give bit-identical frames.

use super::bollinger::Bollinger;
use super::frame::{IndicatorColumn, IndicatorFrame};
use super::returns::DailyReturn;
use super::rolling::StdDevKind;
use super::rsi::Rsi;
use super::sma::Sma;
use super::volatility::AnnualVolatility;
use super::Indicator;
use crate::domain::Series;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

/// Fast/slow SMA window pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SmaWindows {
    pub fast: usize,
    pub slow: usize,
}

impl SmaWindows {
    /// 20/50 days.
    pub const STANDARD: SmaWindows = SmaWindows { fast: 20, slow: 50 };
    /// 7/21 days.
    pub const SHORT: SmaWindows = SmaWindows { fast: 7, slow: 21 };

    pub fn new(fast: usize, slow: usize) -> Self {
        Self { fast, slow }
    }
}

impl Default for SmaWindows {
    fn default() -> Self {
        Self::STANDARD
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IndicatorParams {
    pub windows: SmaWindows,
    pub rsi_period: usize,
    pub volatility_window: usize,
    /// Bollinger half-width in standard deviations.
    pub band_multiplier: f64,
    pub std_dev: StdDevKind,
    /// Trading days per year used to annualize volatility.
    pub periods_per_year: f64,
}

impl Default for IndicatorParams {
    fn default() -> Self {
        Self {
            windows: SmaWindows::STANDARD,
            rsi_period: 14,
            volatility_window: 21,
            band_multiplier: 2.0,
            std_dev: StdDevKind::Sample,
            periods_per_year: 252.0,
        }
    }
}

impl IndicatorParams {
    pub fn with_windows(windows: SmaWindows) -> Self {
        Self {
            windows,
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<(), ParamError> {
        let SmaWindows { fast, slow } = self.windows;
        for (name, window) in [
            ("fast", fast),
            ("slow", slow),
            ("rsi_period", self.rsi_period),
            ("volatility_window", self.volatility_window),
        ] {
            if window == 0 {
                return Err(ParamError::ZeroWindow { name });
            }
        }
        if fast >= slow {
            return Err(ParamError::WindowOrder { fast, slow });
        }
        for (name, window) in [("fast", fast), ("volatility_window", self.volatility_window)] {
            if window <= self.std_dev.ddof() {
                return Err(ParamError::TooShortForStdDev {
                    name,
                    window,
                    kind: self.std_dev,
                });
            }
        }
        if !self.band_multiplier.is_finite() || self.band_multiplier < 0.0 {
            return Err(ParamError::BandMultiplier(self.band_multiplier));
        }
        if !self.periods_per_year.is_finite() || self.periods_per_year <= 0.0 {
            return Err(ParamError::PeriodsPerYear(self.periods_per_year));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ParamError {
    #[error("window '{name}' must be at least 1")]
    ZeroWindow { name: &'static str },

    #[error("fast window ({fast}) must be shorter than slow window ({slow})")]
    WindowOrder { fast: usize, slow: usize },

    #[error("window '{name}' = {window} is too short for a {kind:?} standard deviation")]
    TooShortForStdDev {
        name: &'static str,
        window: usize,
        kind: StdDevKind,
    },

    #[error("band multiplier must be a non-negative number, got {0}")]
    BandMultiplier(f64),

    #[error("periods per year must be positive, got {0}")]
    PeriodsPerYear(f64),
}

pub struct IndicatorEngine {
    params: IndicatorParams,
    /// In [`IndicatorColumn::ALL`] order.
    indicators: Vec<Box<dyn Indicator>>,
}

impl std::fmt::Debug for IndicatorEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IndicatorEngine")
            .field("params", &self.params)
            .field(
                "indicators",
                &self.indicators.iter().map(|i| i.name()).collect::<Vec<_>>(),
            )
            .finish()
    }
}

impl IndicatorEngine {
    pub fn new(params: IndicatorParams) -> Result<Self, ParamError> {
        params.validate()?;
        let p = &params;
        let indicators: Vec<Box<dyn Indicator>> = IndicatorColumn::ALL
            .iter()
            .map(|column| -> Box<dyn Indicator> {
                match column {
                    IndicatorColumn::SmaFast => Box::new(Sma::new(p.windows.fast)),
                    IndicatorColumn::SmaSlow => Box::new(Sma::new(p.windows.slow)),
                    IndicatorColumn::BollingerUpper => {
                        Box::new(Bollinger::upper(p.windows.fast, p.band_multiplier, p.std_dev))
                    }
                    IndicatorColumn::BollingerLower => {
                        Box::new(Bollinger::lower(p.windows.fast, p.band_multiplier, p.std_dev))
                    }
                    IndicatorColumn::Rsi => Box::new(Rsi::new(p.rsi_period)),
                    IndicatorColumn::DailyReturn => Box::new(DailyReturn::new()),
                    IndicatorColumn::AnnualVolatility => Box::new(AnnualVolatility::new(
                        p.volatility_window,
                        p.periods_per_year,
                        p.std_dev,
                    )),
                }
            })
            .collect();
        Ok(Self { params, indicators })
    }

    pub fn params(&self) -> &IndicatorParams {
        &self.params
    }

    /// Lookback of each column, in [`IndicatorColumn::ALL`] order.
    pub fn lookbacks(&self) -> Vec<(IndicatorColumn, usize)> {
        IndicatorColumn::ALL
            .iter()
            .zip(&self.indicators)
            .map(|(column, indicator)| (*column, indicator.lookback()))
            .collect()
    }

    pub fn compute(&self, series: &Series) -> IndicatorFrame {
        let bars = series.bars();
        let columns = self
            .indicators
            .iter()
            .map(|indicator| indicator.compute(bars))
            .collect();
        debug!(
            symbol = series.symbol(),
            rows = bars.len(),
            fast = self.params.windows.fast,
            slow = self.params.windows.slow,
            "computed indicators"
        );
        IndicatorFrame::new(series.clone(), self.params.clone(), columns)
    }
}

/// Indicators with default parameters and the given SMA windows.
pub fn compute(series: &Series, windows: SmaWindows) -> Result<IndicatorFrame, ParamError> {
    Ok(IndicatorEngine::new(IndicatorParams::with_windows(windows))?.compute(series))
}
