//! JSON report adapter implementing ReportPort.
//!
//! Writes the strategy alongside the full result so a report is self-describing.

use crate::domain::backtest::BacktestResult;
use crate::domain::error::StratlabError;
use crate::domain::strategy::Strategy;
use crate::ports::report_port::ReportPort;
use serde::Serialize;
use std::fs;

#[derive(Serialize)]
struct Report<'a> {
    strategy: &'a Strategy,
    result: &'a BacktestResult,
}

#[derive(Debug, Default, Clone, Copy)]
pub struct JsonReportAdapter;

impl JsonReportAdapter {
    pub fn render(result: &BacktestResult, strategy: &Strategy) -> Result<String, StratlabError> {
        Ok(serde_json::to_string_pretty(&Report { strategy, result })?)
    }
}

impl ReportPort for JsonReportAdapter {
    fn write(
        &self,
        result: &BacktestResult,
        strategy: &Strategy,
        output_path: &str,
    ) -> Result<(), StratlabError> {
        let json = Self::render(result, strategy)?;
        fs::write(output_path, json).map_err(|e| StratlabError::Report {
            path: output_path.to_string(),
            reason: e.to_string(),
        })?;
        tracing::info!(path = output_path, "report written");
        Ok(())
    }
}
