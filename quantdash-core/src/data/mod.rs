//! Data ingestion: providers, normalization, and the fetch cache

pub mod circuit_breaker;
pub mod clock;
pub mod csv_source;
pub mod fetch_cache;
pub mod normalize;
pub mod provider;
pub mod raw;
pub mod synthetic;
pub mod yahoo;

pub use circuit_breaker::CircuitBreaker;
pub use clock::{Clock, ManualClock, SystemClock};
pub use csv_source::CsvProvider;
pub use fetch_cache::{CacheKey, CacheStats, FetchCache, DEFAULT_TTL};
pub use normalize::{normalize, normalize_with_report, NormalizeReport, Normalized};
pub use provider::{DataError, DataProvider, DataSource, ErrorKind};
pub use raw::{RawColumn, RawFrame, RawValue};
pub use synthetic::SyntheticProvider;
pub use yahoo::YahooProvider;
