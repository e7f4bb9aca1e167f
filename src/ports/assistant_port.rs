//! Strategy assistant capability.
//!
//! Code generation and analysis live behind this trait so the engine never depends on
//! whichever service (or offline renderer) provides them.

use crate::domain::error::StratlabError;
use crate::domain::strategy::Strategy;

pub trait AssistantPort {
    /// Source text implementing the strategy.
    fn generate_code(&self, strategy: &Strategy) -> Result<String, StratlabError>;

    /// Human-readable commentary on the strategy.
    fn analyze(&self, strategy: &Strategy) -> Result<String, StratlabError>;
}
