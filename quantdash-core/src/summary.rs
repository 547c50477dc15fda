//! Point-in-time facts about an indicator frame, for display.

use crate::indicators::{IndicatorColumn, IndicatorFrame};
use chrono::NaiveDate;
use serde::Serialize;
use std::fmt;

/// Latest close against the fast SMA.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Trend {
    Up,
    Down,
    /// Fast SMA still warming up.
    Unknown,
}

impl Trend {
    pub fn from_close(close: f64, sma_fast: Option<f64>) -> Self {
        match sma_fast {
            Some(sma) if close > sma => Trend::Up,
            Some(_) => Trend::Down,
            None => Trend::Unknown,
        }
    }
}

impl fmt::Display for Trend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Trend::Up => "up",
            Trend::Down => "down",
            Trend::Unknown => "unknown",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RsiZone {
    Overbought,
    Neutral,
    Oversold,
}

impl RsiZone {
    pub const OVERBOUGHT: f64 = 70.0;
    pub const OVERSOLD: f64 = 30.0;

    pub fn classify(rsi: f64) -> Self {
        if rsi >= Self::OVERBOUGHT {
            RsiZone::Overbought
        } else if rsi <= Self::OVERSOLD {
            RsiZone::Oversold
        } else {
            RsiZone::Neutral
        }
    }
}

impl fmt::Display for RsiZone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            RsiZone::Overbought => "overbought",
            RsiZone::Neutral => "neutral",
            RsiZone::Oversold => "oversold",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Snapshot {
    pub symbol: String,
    pub date: NaiveDate,
    pub close: f64,
    /// Close minus the prior close; 0 with a single row.
    pub change: f64,
    /// `change` as a percentage of the prior close; 0 when there is no
    /// usable prior close.
    pub change_pct: f64,
    pub rsi: Option<f64>,
    pub rsi_zone: Option<RsiZone>,
    /// Percent, annualized.
    pub annual_volatility: Option<f64>,
    pub trend: Trend,
    pub period_high: f64,
    pub period_low: f64,
    pub rows: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Summary {
    NoData { symbol: String },
    Ready(Snapshot),
}

impl Summary {
    pub fn symbol(&self) -> &str {
        match self {
            Summary::NoData { symbol } => symbol,
            Summary::Ready(snapshot) => &snapshot.symbol,
        }
    }

    pub fn snapshot(&self) -> Option<&Snapshot> {
        match self {
            Summary::Ready(snapshot) => Some(snapshot),
            Summary::NoData { .. } => None,
        }
    }
}

pub fn summarize(frame: &IndicatorFrame) -> Summary {
    let bars = frame.bars();
    let Some(last) = bars.last() else {
        return Summary::NoData {
            symbol: frame.symbol().to_string(),
        };
    };
    let latest = bars.len() - 1;

    let (change, change_pct) = match latest.checked_sub(1).map(|i| bars[i].close) {
        Some(prev) => {
            let change = last.close - prev;
            let pct = if prev != 0.0 { change / prev * 100.0 } else { 0.0 };
            (change, pct)
        }
        None => (0.0, 0.0),
    };

    let rsi = frame.value(IndicatorColumn::Rsi, latest);
    Summary::Ready(Snapshot {
        symbol: frame.symbol().to_string(),
        date: last.date,
        close: last.close,
        change,
        change_pct,
        rsi,
        rsi_zone: rsi.map(RsiZone::classify),
        annual_volatility: frame.value(IndicatorColumn::AnnualVolatility, latest),
        trend: Trend::from_close(last.close, frame.value(IndicatorColumn::SmaFast, latest)),
        period_high: bars.iter().map(|b| b.high).fold(f64::NEG_INFINITY, f64::max),
        period_low: bars.iter().map(|b| b.low).fold(f64::INFINITY, f64::min),
        rows: bars.len(),
    })
}
