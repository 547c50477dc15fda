//! Symbol catalog: display names for the tickers offered by default.
//!
//! Stored as a TOML table of `SYMBOL = "Display name"`. Unknown symbols are
//! still analyzable; they just have no display name.

use crate::config::ConfigError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Catalog {
    pub instruments: BTreeMap<String, String>,
}

impl Catalog {
    /// Load a catalog from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&content)
    }

    /// Parse a catalog from a TOML string.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    /// Brazilian blue chips plus US mega caps.
    pub fn default_catalog() -> Self {
        let instruments = [
            ("PETR4.SA", "Petrobras"),
            ("VALE3.SA", "Vale"),
            ("ITUB4.SA", "Itaú Unibanco"),
            ("BBAS3.SA", "Banco do Brasil"),
            ("WEGE3.SA", "WEG"),
            ("MGLU3.SA", "Magazine Luiza"),
            ("AAPL", "Apple"),
            ("MSFT", "Microsoft"),
            ("GOOGL", "Google"),
            ("NVDA", "Nvidia"),
        ]
        .into_iter()
        .map(|(sym, name)| (sym.to_string(), name.to_string()))
        .collect();

        Self { instruments }
    }

    pub fn display_name(&self, symbol: &str) -> Option<&str> {
        self.instruments.get(symbol).map(|s| s.as_str())
    }

    /// `"AAPL - Apple"`, or just the symbol when it is not in the catalog.
    pub fn label(&self, symbol: &str) -> String {
        match self.display_name(symbol) {
            Some(name) => format!("{symbol} - {name}"),
            None => symbol.to_string(),
        }
    }

    pub fn symbols(&self) -> impl Iterator<Item = &str> {
        self.instruments.keys().map(|s| s.as_str())
    }

    pub fn len(&self) -> usize {
        self.instruments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instruments.is_empty()
    }

    /// Serialize the catalog to TOML.
    pub fn to_toml(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }
}

impl Default for Catalog {
    fn default() -> Self {
        Self::default_catalog()
    }
}
