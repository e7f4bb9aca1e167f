//! Strategy persistence as JSON files.

use crate::domain::error::StratlabError;
use crate::domain::strategy::Strategy;
use crate::ports::strategy_port::StrategyPort;
use std::fs;
use std::path::Path;

#[derive(Debug, Default, Clone, Copy)]
pub struct JsonStrategyAdapter;

impl JsonStrategyAdapter {
    /// Decodes and validates one strategy document.
    pub fn parse(json: &str) -> Result<Strategy, StratlabError> {
        let strategy: Strategy = serde_json::from_str(json)?;
        strategy.validate()?;
        Ok(strategy)
    }

    pub fn to_json(strategy: &Strategy) -> Result<String, StratlabError> {
        Ok(serde_json::to_string_pretty(strategy)?)
    }
}

impl StrategyPort for JsonStrategyAdapter {
    fn load(&self, path: &Path) -> Result<Strategy, StratlabError> {
        let json = fs::read_to_string(path)?;
        let strategy = Self::parse(&json)?;
        tracing::debug!(path = %path.display(), strategy = %strategy.id, "loaded strategy");
        Ok(strategy)
    }

    fn save(&self, strategy: &Strategy, path: &Path) -> Result<(), StratlabError> {
        fs::write(path, Self::to_json(strategy)?)?;
        Ok(())
    }
}
