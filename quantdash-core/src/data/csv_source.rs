//! CSV file provider.
//!
//! Reads `{dir}/{SYMBOL}.csv`. The first `header_rows` lines form a grouped
//! header, so a pandas export of a multi-index frame (`Price`, `Ticker`,
//! `Date` rows) loads without preprocessing. Cells are handed to the
//! normalizer as text.

use super::provider::{DataError, DataProvider, DataSource};
use super::raw::{RawColumn, RawFrame, RawValue};
use chrono::NaiveDate;
use std::io::{ErrorKind, Read};
use std::path::{Path, PathBuf};
use tracing::debug;

#[derive(Debug, Clone)]
pub struct CsvProvider {
    dir: PathBuf,
    header_rows: usize,
}

impl CsvProvider {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            header_rows: 1,
        }
    }

    /// Number of header lines; values below 1 are treated as 1.
    pub fn with_header_rows(mut self, header_rows: usize) -> Self {
        self.header_rows = header_rows.max(1);
        self
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path_for(&self, symbol: &str) -> PathBuf {
        self.dir.join(format!("{symbol}.csv"))
    }

    /// Parse CSV text from any reader into a provider frame.
    pub fn read_frame<R: Read>(&self, reader: R) -> Result<RawFrame, DataError> {
        let mut rdr = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(reader);

        let mut headers: Vec<Vec<String>> = Vec::new();
        let mut cells: Vec<Vec<RawValue>> = Vec::new();

        for (line, record) in rdr.records().enumerate() {
            let record = record.map_err(|e| DataError::SourceRead(e.to_string()))?;
            if line < self.header_rows {
                if headers.len() < record.len() {
                    headers.resize_with(record.len(), || vec![String::new(); line]);
                }
                for (col, level) in headers.iter_mut().enumerate() {
                    level.push(record.get(col).unwrap_or_default().to_string());
                }
                continue;
            }
            if cells.is_empty() {
                cells.resize_with(headers.len(), Vec::new);
            }
            // Short rows leave their columns short; the normalizer reports them.
            for (col, cell) in record.iter().enumerate().take(headers.len()) {
                cells[col].push(if cell.is_empty() {
                    RawValue::Null
                } else {
                    RawValue::Text(cell.to_string())
                });
            }
        }

        cells.resize_with(headers.len(), Vec::new);
        Ok(headers
            .into_iter()
            .zip(cells)
            .fold(RawFrame::new(), |frame, (levels, values)| {
                frame.with_column(RawColumn::nested(levels, values))
            }))
    }
}

fn is_plain_symbol(symbol: &str) -> bool {
    !symbol.is_empty()
        && !symbol.contains(['/', '\\'])
        && !symbol.contains("..")
}

impl DataProvider for CsvProvider {
    fn name(&self) -> &str {
        "csv_file"
    }

    fn source(&self) -> DataSource {
        DataSource::CsvFile
    }

    /// Returns the whole file; the fetch cache restricts it to the range.
    fn fetch(&self, symbol: &str, start: NaiveDate, end: NaiveDate) -> Result<RawFrame, DataError> {
        if !is_plain_symbol(symbol) {
            return Err(DataError::SymbolNotFound {
                symbol: symbol.to_string(),
            });
        }
        let path = self.path_for(symbol);
        let file = std::fs::File::open(&path).map_err(|e| match e.kind() {
            ErrorKind::NotFound => DataError::SymbolNotFound {
                symbol: symbol.to_string(),
            },
            _ => DataError::SourceRead(format!("{}: {e}", path.display())),
        })?;
        let frame = self.read_frame(file)?;
        debug!(symbol, path = %path.display(), rows = frame.height(), %start, %end, "read csv");
        Ok(frame)
    }

    fn is_available(&self) -> bool {
        self.dir.is_dir()
    }
}
