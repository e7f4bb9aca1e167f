//! CSV candle adapter.
//!
//! Input header: `date,open,high,low,close,volume[,correlated_rate]`, dates as `YYYY-MM-DD`.
//! The adapter points either at one file or at a directory of `<SYMBOL>.csv` files.

use crate::domain::candle::{validate_series, Candle};
use crate::domain::error::StratlabError;
use crate::domain::indicator::IndicatorKey;
use crate::ports::data_port::DataPort;
use chrono::NaiveDate;
use serde::Deserialize;
use std::io;
use std::path::PathBuf;

#[derive(Debug, Deserialize)]
struct CandleRow {
    date: NaiveDate,
    open: f64,
    high: f64,
    low: f64,
    close: f64,
    volume: f64,
    #[serde(default)]
    correlated_rate: Option<f64>,
}

impl From<CandleRow> for Candle {
    fn from(row: CandleRow) -> Self {
        let candle = Candle::new(row.date, row.open, row.high, row.low, row.close, row.volume);
        match row.correlated_rate {
            Some(rate) => candle.with_correlated_rate(rate),
            None => candle,
        }
    }
}

#[derive(Debug)]
pub struct CsvAdapter {
    path: PathBuf,
}

impl CsvAdapter {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    fn csv_path(&self, symbol: &str) -> PathBuf {
        if self.path.is_dir() {
            self.path.join(format!("{}.csv", symbol))
        } else {
            self.path.clone()
        }
    }
}

/// Parses candles from any CSV source, in file order.
pub fn read_candles<R: io::Read>(reader: R) -> Result<Vec<Candle>, StratlabError> {
    let mut rdr = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);
    let mut candles = Vec::new();
    for row in rdr.deserialize::<CandleRow>() {
        let row = row.map_err(|e| StratlabError::Data {
            reason: format!("CSV parse error: {}", e),
        })?;
        candles.push(row.into());
    }
    Ok(candles)
}

/// Writes candles with one column per indicator key; undefined values are left empty.
pub fn write_candles<W: io::Write>(
    writer: W,
    candles: &[Candle],
    keys: &[IndicatorKey],
) -> Result<(), StratlabError> {
    let to_err = |e: csv::Error| StratlabError::Data {
        reason: format!("CSV write error: {}", e),
    };
    let mut wtr = csv::Writer::from_writer(writer);

    let mut header: Vec<String> = ["date", "open", "high", "low", "close", "volume"]
        .iter()
        .map(|s| s.to_string())
        .collect();
    header.extend(keys.iter().map(IndicatorKey::to_string));
    wtr.write_record(&header).map_err(to_err)?;

    for candle in candles {
        let mut record = vec![
            candle.date.format("%Y-%m-%d").to_string(),
            candle.open.to_string(),
            candle.high.to_string(),
            candle.low.to_string(),
            candle.close.to_string(),
            candle.volume.to_string(),
        ];
        record.extend(
            keys.iter()
                .map(|k| candle.indicator(k).map(|v| v.to_string()).unwrap_or_default()),
        );
        wtr.write_record(&record).map_err(to_err)?;
    }
    wtr.flush()?;
    Ok(())
}

impl DataPort for CsvAdapter {
    fn fetch_candles(
        &self,
        symbol: &str,
        start_date: Option<NaiveDate>,
        end_date: Option<NaiveDate>,
    ) -> Result<Vec<Candle>, StratlabError> {
        let path = self.csv_path(symbol);
        let file = std::fs::File::open(&path).map_err(|e| StratlabError::Data {
            reason: format!("failed to read {}: {}", path.display(), e),
        })?;

        let mut candles: Vec<Candle> = read_candles(file)?
            .into_iter()
            .filter(|c| start_date.is_none_or(|start| c.date >= start))
            .filter(|c| end_date.is_none_or(|end| c.date <= end))
            .collect();

        candles.sort_by_key(|c| c.date);
        validate_series(&candles)?;

        if candles.is_empty() {
            return Err(StratlabError::NoData {
                symbol: symbol.to_string(),
            });
        }
        tracing::debug!(symbol, path = %path.display(), bars = candles.len(), "loaded candles");
        Ok(candles)
    }
}
