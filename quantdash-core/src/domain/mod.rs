//! Domain types for QuantDash

pub mod bar;
pub mod catalog;

pub use bar::{Bar, Series, SeriesError};
pub use catalog::Catalog;
