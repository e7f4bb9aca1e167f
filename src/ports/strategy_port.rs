//! Strategy persistence port trait.

use crate::domain::error::StratlabError;
use crate::domain::strategy::Strategy;
use std::path::Path;

pub trait StrategyPort {
    /// Loads and validates a strategy.
    fn load(&self, path: &Path) -> Result<Strategy, StratlabError>;

    fn save(&self, strategy: &Strategy, path: &Path) -> Result<(), StratlabError>;
}
