//! Domain error types.

/// Top-level error type for stratlab.
#[derive(Debug, thiserror::Error)]
pub enum StratlabError {
    #[error("config parse error in {file}: {reason}")]
    ConfigParse { file: String, reason: String },

    #[error("missing config key [{section}] {key}")]
    ConfigMissing { section: String, key: String },

    #[error("invalid config value [{section}] {key}: {reason}")]
    ConfigInvalid {
        section: String,
        key: String,
        reason: String,
    },

    #[error("malformed strategy document: {0}")]
    StrategyFormat(#[from] serde_json::Error),

    #[error("invalid strategy{}: {reason}", .node_id.as_ref().map(|id| format!(" (node {id})")).unwrap_or_default())]
    StrategyInvalid {
        reason: String,
        node_id: Option<String>,
    },

    #[error("duplicate node id '{0}' in strategy tree")]
    DuplicateNodeId(String),

    #[error("candle data error: {reason}")]
    Data { reason: String },

    #[error("candles out of order at {date}: dates must be strictly increasing")]
    UnsortedCandles { date: chrono::NaiveDate },

    #[error("no candles for {symbol}")]
    NoData { symbol: String },

    #[error("failed to write report to {path}: {reason}")]
    Report { path: String, reason: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl StratlabError {
    pub fn invalid(reason: impl Into<String>) -> Self {
        StratlabError::StrategyInvalid {
            reason: reason.into(),
            node_id: None,
        }
    }

    pub fn invalid_node(node_id: &str, reason: impl Into<String>) -> Self {
        StratlabError::StrategyInvalid {
            reason: reason.into(),
            node_id: Some(node_id.to_string()),
        }
    }

    /// Process exit status for this error family.
    pub fn exit_status(&self) -> u8 {
        match self {
            StratlabError::Io(_) | StratlabError::Report { .. } => 1,
            StratlabError::ConfigParse { .. }
            | StratlabError::ConfigMissing { .. }
            | StratlabError::ConfigInvalid { .. } => 2,
            StratlabError::StrategyFormat(_)
            | StratlabError::StrategyInvalid { .. }
            | StratlabError::DuplicateNodeId(_) => 4,
            StratlabError::Data { .. }
            | StratlabError::UnsortedCandles { .. }
            | StratlabError::NoData { .. } => 5,
        }
    }
}

impl From<&StratlabError> for std::process::ExitCode {
    fn from(err: &StratlabError) -> Self {
        std::process::ExitCode::from(err.exit_status())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_node_message_includes_id() {
        let err = StratlabError::invalid_node("c1", "missing period");
        assert_eq!(err.to_string(), "invalid strategy (node c1): missing period");
    }

    #[test]
    fn invalid_message_without_node() {
        let err = StratlabError::invalid("stop_loss_pct must be non-negative");
        assert_eq!(
            err.to_string(),
            "invalid strategy: stop_loss_pct must be non-negative"
        );
    }

    #[test]
    fn exit_status_by_family() {
        let cases = [
            (StratlabError::Io(std::io::Error::other("x")), 1),
            (
                StratlabError::ConfigMissing {
                    section: "backtest".into(),
                    key: "initial_equity".into(),
                },
                2,
            ),
            (StratlabError::DuplicateNodeId("a".into()), 4),
            (
                StratlabError::NoData {
                    symbol: "BTC".into(),
                },
                5,
            ),
        ];
        for (err, expected) in cases {
            assert_eq!(err.exit_status(), expected, "{err}");
        }
    }
}
