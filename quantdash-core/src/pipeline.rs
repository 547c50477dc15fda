//! End-to-end analysis: provider → normalizer → fetch cache → indicators → summary.

use crate::data::{Clock, DataError, DataProvider, FetchCache, SystemClock};
use crate::indicators::{IndicatorEngine, IndicatorFrame, IndicatorParams, ParamError};
use crate::summary::{summarize, Summary};
use chrono::NaiveDate;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::info;

/// Wall-clock cost of one analysis. A cache hit makes `fetch` near zero.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Timings {
    pub fetch: Duration,
    pub compute: Duration,
    pub rows: usize,
}

impl Timings {
    /// `None` when the compute step was too fast to measure.
    pub fn rows_per_sec(&self) -> Option<f64> {
        let secs = self.compute.as_secs_f64();
        (secs > 0.0).then(|| self.rows as f64 / secs)
    }
}

#[derive(Debug, Clone)]
pub struct Analysis {
    pub frame: IndicatorFrame,
    pub summary: Summary,
    pub timings: Timings,
}

pub struct Pipeline<C: Clock = SystemClock> {
    provider: Arc<dyn DataProvider>,
    cache: FetchCache<C>,
    engine: IndicatorEngine,
}

impl Pipeline<SystemClock> {
    pub fn new(provider: Arc<dyn DataProvider>, params: IndicatorParams) -> Result<Self, ParamError> {
        Self::with_cache(provider, FetchCache::new(), params)
    }
}

impl<C: Clock> Pipeline<C> {
    pub fn with_cache(
        provider: Arc<dyn DataProvider>,
        cache: FetchCache<C>,
        params: IndicatorParams,
    ) -> Result<Self, ParamError> {
        Ok(Self {
            provider,
            cache,
            engine: IndicatorEngine::new(params)?,
        })
    }

    pub fn provider(&self) -> &dyn DataProvider {
        self.provider.as_ref()
    }

    pub fn cache(&self) -> &FetchCache<C> {
        &self.cache
    }

    pub fn params(&self) -> &IndicatorParams {
        self.engine.params()
    }

    /// An empty fetch is not an error: it yields `Summary::NoData`.
    pub fn analyze(&self, symbol: &str, start: NaiveDate, end: NaiveDate) -> Result<Analysis, DataError> {
        let fetch_started = Instant::now();
        let series = self
            .cache
            .get_or_fetch_from(self.provider.as_ref(), symbol, start, end)?;
        let fetch = fetch_started.elapsed();

        let compute_started = Instant::now();
        let frame = self.engine.compute(&series);
        let summary = summarize(&frame);
        let compute = compute_started.elapsed();

        let timings = Timings {
            fetch,
            compute,
            rows: frame.len(),
        };
        info!(
            symbol,
            source = self.provider.name(),
            rows = timings.rows,
            fetch_ms = fetch.as_millis() as u64,
            compute_us = compute.as_micros() as u64,
            "analysis complete"
        );
        Ok(Analysis {
            frame,
            summary,
            timings,
        })
    }
}
