//! QuantDash core: price ingestion, TTL fetch cache, technical indicators,
//! summaries and file export.
//!
//! - Data providers (Yahoo Finance, CSV directory, synthetic) behind one trait
//! - Header normalization into a validated daily [`domain::Series`]
//! - Per-key single-flight fetch cache with a configurable TTL
//! - Rolling indicators: SMA pair, Bollinger bands, RSI, returns, volatility
//! - Latest-row summary and Parquet/CSV export

pub mod config;
pub mod data;
pub mod domain;
pub mod export;
pub mod indicators;
pub mod pipeline;
pub mod summary;

#[cfg(test)]
mod tests {
    use super::*;

    /// Compile-time check: everything shared across threads is Send + Sync.
    #[allow(dead_code)]
    fn assert_send_sync() {
        fn require_send<T: Send>() {}
        fn require_sync<T: Sync>() {}

        // Domain types
        require_send::<domain::Bar>();
        require_sync::<domain::Bar>();
        require_send::<domain::Series>();
        require_sync::<domain::Series>();
        require_send::<domain::Catalog>();
        require_sync::<domain::Catalog>();

        // Data layer
        require_send::<data::RawFrame>();
        require_sync::<data::RawFrame>();
        require_send::<data::FetchCache>();
        require_sync::<data::FetchCache>();
        require_send::<data::FetchCache<data::ManualClock>>();
        require_sync::<data::FetchCache<data::ManualClock>>();
        require_send::<data::CircuitBreaker>();
        require_sync::<data::CircuitBreaker>();
        require_send::<data::YahooProvider>();
        require_sync::<data::YahooProvider>();
        require_send::<data::CsvProvider>();
        require_sync::<data::CsvProvider>();
        require_send::<data::DataError>();
        require_sync::<data::DataError>();

        // Indicators and results
        require_send::<indicators::IndicatorEngine>();
        require_sync::<indicators::IndicatorEngine>();
        require_send::<indicators::IndicatorFrame>();
        require_sync::<indicators::IndicatorFrame>();
        require_send::<summary::Summary>();
        require_sync::<summary::Summary>();
        require_send::<pipeline::Pipeline>();
        require_sync::<pipeline::Pipeline>();
    }

    /// Providers are usable as trait objects behind `Arc`.
    #[test]
    fn providers_are_object_safe() {
        fn _check(provider: std::sync::Arc<dyn data::DataProvider>) -> bool {
            provider.is_available()
        }
    }
}
