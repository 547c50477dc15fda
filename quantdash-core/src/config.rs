//! Analysis configuration, loaded from TOML.
//!
//! Every field has a default, so an empty file is a valid config. Dates are
//! quoted `YYYY-MM-DD` strings (`start = "2024-01-02"`).
//!
//! ```toml
//! symbols = ["PETR4.SA", "AAPL"]
//! start = "2024-01-02"
//! profile = "short"
//!
//! [indicators]
//! rsi_period = 14
//! std_dev = "population"
//!
//! [cache]
//! ttl_secs = 600
//! ```

use crate::data::DEFAULT_TTL;
use crate::indicators::{IndicatorParams, ParamError, SmaWindows, StdDevKind};
use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error(transparent)]
    Params(#[from] ParamError),

    #[error("unknown window profile '{0}' (expected 'standard' or 'short')")]
    UnknownProfile(String),

    #[error("start date {start} is after end date {end}")]
    InvalidRange { start: NaiveDate, end: NaiveDate },
}

/// Named SMA window pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WindowProfile {
    /// 20/50
    #[default]
    Standard,
    /// 7/21
    Short,
}

impl WindowProfile {
    pub fn windows(self) -> SmaWindows {
        match self {
            WindowProfile::Standard => SmaWindows::STANDARD,
            WindowProfile::Short => SmaWindows::SHORT,
        }
    }
}

impl FromStr for WindowProfile {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "standard" => Ok(WindowProfile::Standard),
            "short" => Ok(WindowProfile::Short),
            _ => Err(ConfigError::UnknownProfile(s.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IndicatorSettings {
    pub rsi_period: usize,
    pub volatility_window: usize,
    pub band_multiplier: f64,
    pub std_dev: StdDevKind,
    pub periods_per_year: f64,
}

impl Default for IndicatorSettings {
    fn default() -> Self {
        let p = IndicatorParams::default();
        Self {
            rsi_period: p.rsi_period,
            volatility_window: p.volatility_window,
            band_multiplier: p.band_multiplier,
            std_dev: p.std_dev,
            periods_per_year: p.periods_per_year,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheSettings {
    pub ttl_secs: u64,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            ttl_secs: DEFAULT_TTL.as_secs(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    pub symbols: Vec<String>,
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
    /// Range length when `start` is not given.
    pub lookback_days: u64,
    pub profile: WindowProfile,
    /// Overrides the profile's fast window.
    pub fast: Option<usize>,
    /// Overrides the profile's slow window.
    pub slow: Option<usize>,
    pub indicators: IndicatorSettings,
    pub cache: CacheSettings,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            symbols: Vec::new(),
            start: None,
            end: None,
            lookback_days: 365,
            profile: WindowProfile::Standard,
            fast: None,
            slow: None,
            indicators: IndicatorSettings::default(),
            cache: CacheSettings::default(),
        }
    }
}

impl AnalysisConfig {
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    pub fn windows(&self) -> SmaWindows {
        let profile = self.profile.windows();
        SmaWindows::new(
            self.fast.unwrap_or(profile.fast),
            self.slow.unwrap_or(profile.slow),
        )
    }

    /// Validated indicator parameters.
    pub fn indicator_params(&self) -> Result<IndicatorParams, ConfigError> {
        let s = &self.indicators;
        let params = IndicatorParams {
            windows: self.windows(),
            rsi_period: s.rsi_period,
            volatility_window: s.volatility_window,
            band_multiplier: s.band_multiplier,
            std_dev: s.std_dev,
            periods_per_year: s.periods_per_year,
        };
        params.validate()?;
        Ok(params)
    }

    /// Inclusive range: `end` defaults to `today`, `start` to `lookback_days`
    /// before `end`.
    pub fn date_range(&self, today: NaiveDate) -> Result<(NaiveDate, NaiveDate), ConfigError> {
        let end = self.end.unwrap_or(today);
        let start = match self.start {
            Some(start) => start,
            None => end
                .checked_sub_days(Days::new(self.lookback_days))
                .unwrap_or(NaiveDate::MIN),
        };
        if start > end {
            return Err(ConfigError::InvalidRange { start, end });
        }
        Ok((start, end))
    }

    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.cache.ttl_secs)
    }
}
