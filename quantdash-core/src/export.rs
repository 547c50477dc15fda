//! File export of a computed indicator frame: Polars `DataFrame`, Parquet, CSV.
//!
//! Column order is `date, open, high, low, close, volume` followed by the
//! indicator columns. Missing cells are Polars nulls or empty CSV fields.

use crate::indicators::{IndicatorColumn, IndicatorFrame};
use chrono::Datelike;
use polars::prelude::{Column, DataFrame, DataType, ParquetWriter, PolarsError};
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::info;

/// `NaiveDate::num_days_from_ce` of 1970-01-01.
const UNIX_EPOCH_DAYS_FROM_CE: i32 = 719_163;

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("polars: {0}")]
    Polars(#[from] PolarsError),

    #[error("csv: {0}")]
    Csv(#[from] csv::Error),

    #[error("failed to write {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

pub fn to_dataframe(frame: &IndicatorFrame) -> Result<DataFrame, ExportError> {
    let bars = frame.bars();
    let dates: Vec<i32> = bars
        .iter()
        .map(|b| b.date.num_days_from_ce() - UNIX_EPOCH_DAYS_FROM_CE)
        .collect();
    let prices = |f: fn(&crate::domain::Bar) -> f64| -> Vec<f64> { bars.iter().map(f).collect() };
    let volumes: Vec<Option<u64>> = bars.iter().map(|b| b.volume).collect();

    let mut columns = vec![
        Column::new("date".into(), dates).cast(&DataType::Date)?,
        Column::new("open".into(), prices(|b| b.open)),
        Column::new("high".into(), prices(|b| b.high)),
        Column::new("low".into(), prices(|b| b.low)),
        Column::new("close".into(), prices(|b| b.close)),
        Column::new("volume".into(), volumes),
    ];
    for column in IndicatorColumn::ALL {
        columns.push(Column::new(column.name().into(), frame.column(column).to_vec()));
    }
    Ok(DataFrame::new(columns)?)
}

pub fn write_parquet(frame: &IndicatorFrame, path: &Path) -> Result<(), ExportError> {
    let mut df = to_dataframe(frame)?;
    let file = File::create(path).map_err(|source| ExportError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    ParquetWriter::new(file).finish(&mut df)?;
    info!(symbol = frame.symbol(), rows = frame.len(), path = %path.display(), "wrote parquet");
    Ok(())
}

/// Write the frame as CSV with a header row.
pub fn write_csv<W: Write>(frame: &IndicatorFrame, writer: W) -> Result<(), ExportError> {
    let mut wtr = csv::Writer::from_writer(writer);

    let mut header = vec!["date", "open", "high", "low", "close", "volume"];
    header.extend(IndicatorColumn::ALL.iter().map(|c| c.name()));
    wtr.write_record(&header)?;

    let cell = |v: Option<f64>| v.map(|x| x.to_string()).unwrap_or_default();
    for row in frame.rows() {
        wtr.write_record([
            row.date.to_string(),
            row.open.to_string(),
            row.high.to_string(),
            row.low.to_string(),
            row.close.to_string(),
            row.volume.map(|v| v.to_string()).unwrap_or_default(),
            cell(row.sma_fast),
            cell(row.sma_slow),
            cell(row.bollinger_upper),
            cell(row.bollinger_lower),
            cell(row.rsi),
            cell(row.daily_return),
            cell(row.annual_volatility),
        ])?;
    }
    wtr.flush().map_err(csv::Error::from)?;
    Ok(())
}

pub fn write_csv_file(frame: &IndicatorFrame, path: &Path) -> Result<(), ExportError> {
    let file = File::create(path).map_err(|source| ExportError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    write_csv(frame, file)?;
    info!(symbol = frame.symbol(), rows = frame.len(), path = %path.display(), "wrote csv");
    Ok(())
}
