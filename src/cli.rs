//! CLI definition and dispatch.
//!
//! Status and diagnostics go through `tracing` (stderr); command output goes to stdout.

use clap::{Parser, Subcommand};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use crate::adapters::csv_adapter::{write_candles, CsvAdapter};
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::adapters::json_report_adapter::JsonReportAdapter;
use crate::adapters::json_strategy_adapter::JsonStrategyAdapter;
use crate::adapters::plain_text_assistant::PlainTextAssistant;
use crate::domain::backtest::{run_backtest_with, BacktestResult};
use crate::domain::config_validation::{date_range, load_backtest_config, validate_backtest_config};
use crate::domain::error::StratlabError;
use crate::domain::indicator::engine::augment_with;
use crate::domain::indicator::{IndicatorKey, IndicatorKind, PriceField};
use crate::domain::strategy::{sample_strategy, Strategy};
use crate::ports::assistant_port::AssistantPort;
use crate::ports::config_port::ConfigPort;
use crate::ports::data_port::DataPort;
use crate::ports::report_port::ReportPort;
use crate::ports::strategy_port::StrategyPort;

#[derive(Parser, Debug)]
#[command(name = "stratlab", about = "Rule-based strategy backtester", version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run a strategy over a candle CSV
    Backtest {
        #[arg(short, long)]
        strategy: PathBuf,
        /// Candle CSV file, or a directory of <SYMBOL>.csv files
        #[arg(short, long)]
        data: Option<PathBuf>,
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// Write the JSON report here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Override the strategy's symbol
        #[arg(long)]
        symbol: Option<String>,
    },
    /// Load and validate a strategy, then print its trees
    Validate {
        #[arg(short, long)]
        strategy: PathBuf,
    },
    /// Print a candle CSV augmented with indicators
    Indicators {
        #[arg(short, long)]
        data: PathBuf,
        /// KIND[:PERIOD[:SOURCE]] or a key such as SMA_20
        #[arg(short, long = "indicator", required = true)]
        indicators: Vec<String>,
        #[arg(long, default_value_t = crate::domain::indicator::DEFAULT_PIVOT_BLOCK)]
        pivot_block: usize,
        /// Selects `<data>/<SYMBOL>.csv` when `--data` is a directory
        #[arg(long)]
        symbol: Option<String>,
    },
    /// Print the demonstration strategy as JSON
    Sample {
        #[arg(long, default_value = "SPY")]
        symbol: String,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Describe a strategy in plain text
    Describe {
        #[arg(short, long)]
        strategy: PathBuf,
        /// Print pseudo-code instead of the structural analysis
        #[arg(long)]
        code: bool,
    },
}

pub fn run(cli: Cli) -> ExitCode {
    let outcome = match cli.command {
        Command::Backtest {
            strategy,
            data,
            config,
            output,
            symbol,
        } => run_backtest_command(
            &strategy,
            data.as_deref(),
            config.as_deref(),
            output.as_deref(),
            symbol.as_deref(),
        ),
        Command::Validate { strategy } => run_validate(&strategy),
        Command::Indicators {
            data,
            indicators,
            pivot_block,
            symbol,
        } => run_indicators(&data, &indicators, pivot_block, symbol.as_deref()),
        Command::Sample { symbol, output } => run_sample(&symbol, output.as_deref()),
        Command::Describe { strategy, code } => run_describe(&strategy, code),
    };

    match outcome {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{e}");
            (&e).into()
        }
    }
}

pub fn load_config(path: Option<&Path>) -> Result<FileConfigAdapter, StratlabError> {
    match path {
        Some(p) => {
            tracing::info!(path = %p.display(), "loading config");
            FileConfigAdapter::from_file(p)
        }
        None => Ok(FileConfigAdapter::empty()),
    }
}

/// CLI flag first, then `[data] path`.
pub fn resolve_data_path(
    cli_path: Option<&Path>,
    config: &dyn ConfigPort,
) -> Result<PathBuf, StratlabError> {
    if let Some(p) = cli_path {
        return Ok(p.to_path_buf());
    }
    config
        .get_string("data", "path")
        .filter(|s| !s.trim().is_empty())
        .map(PathBuf::from)
        .ok_or_else(|| StratlabError::ConfigMissing {
            section: "data".to_string(),
            key: "path".to_string(),
        })
}

/// Config, candles, engine: everything `backtest` does short of writing output.
pub fn run_pipeline(
    strategy: &Strategy,
    data: &dyn DataPort,
    config: &dyn ConfigPort,
) -> Result<BacktestResult, StratlabError> {
    let bt_config = load_backtest_config(config)?;
    let (start, end) = date_range(config)?;

    let candles = data.fetch_candles(&strategy.symbol, start, end)?;
    tracing::info!(symbol = %strategy.symbol, bars = candles.len(), "candles loaded");

    Ok(run_backtest_with(strategy, &candles, &bt_config))
}

fn run_backtest_command(
    strategy_path: &Path,
    data_path: Option<&Path>,
    config_path: Option<&Path>,
    output_path: Option<&Path>,
    symbol: Option<&str>,
) -> Result<(), StratlabError> {
    let config = load_config(config_path)?;
    validate_backtest_config(&config)?;
    let mut strategy = JsonStrategyAdapter.load(strategy_path)?;
    if let Some(s) = symbol {
        strategy.symbol = s.to_string();
    }
    let data = CsvAdapter::new(resolve_data_path(data_path, &config)?);

    let result = run_pipeline(&strategy, &data, &config)?;
    print_summary(&result);

    match output_path {
        Some(path) => JsonReportAdapter.write(&result, &strategy, &path.display().to_string()),
        None => {
            let json = JsonReportAdapter::render(&result, &strategy)?;
            writeln!(io::stdout(), "{json}")?;
            Ok(())
        }
    }
}

fn print_summary(result: &BacktestResult) {
    let m = &result.metrics;
    tracing::info!(
        trades = m.total_trades,
        win_rate = %format!("{:.1}%", m.win_rate * 100.0),
        total_return = %format!("{:.2}%", m.total_return * 100.0),
        max_drawdown = %format!("{:.2}%", m.max_drawdown * 100.0),
        sharpe = %format!("{:.2}", m.sharpe_ratio),
        "summary"
    );
}

fn run_validate(strategy_path: &Path) -> Result<(), StratlabError> {
    let strategy = JsonStrategyAdapter.load(strategy_path)?;
    let mut out = io::stdout().lock();

    writeln!(out, "Strategy {} ({}) on {}", strategy.id, strategy.name, strategy.symbol)?;
    writeln!(out, "Entry: {}", strategy.entry)?;
    writeln!(out, "Exit:  {}", strategy.exit)?;
    let keys: Vec<String> = strategy
        .indicator_configs()
        .iter()
        .map(|k| k.to_string())
        .collect();
    writeln!(out, "Indicators: {}", keys.join(", "))?;
    writeln!(out, "OK")?;
    Ok(())
}

/// Parses `KIND[:PERIOD[:SOURCE]]` (e.g. `ema:10:high`) or a key string (`EMA_10_HIGH`).
pub fn parse_indicator_spec(spec: &str) -> Result<IndicatorKey, StratlabError> {
    let unknown = || StratlabError::invalid(format!("unknown indicator '{spec}'"));
    if !spec.contains(':') {
        return spec.parse().map_err(|_| unknown());
    }

    let mut parts = spec.split(':').map(|p| p.trim().to_uppercase());
    let kind_name = parts.next().unwrap_or_default();
    let kind = IndicatorKind::ALL
        .into_iter()
        .find(|k| k.name() == kind_name)
        .ok_or_else(unknown)?;
    let period = match parts.next() {
        Some(p) => Some(p.parse::<usize>().map_err(|_| unknown())?),
        None => None,
    };
    let source = match parts.next().as_deref() {
        None | Some("CLOSE") => PriceField::Close,
        Some("OPEN") => PriceField::Open,
        Some("HIGH") => PriceField::High,
        Some("LOW") => PriceField::Low,
        Some("VOLUME") => PriceField::Volume,
        Some(_) => return Err(unknown()),
    };
    if parts.next().is_some() {
        return Err(unknown());
    }
    Ok(IndicatorKey::new(kind, period, source))
}

fn run_indicators(
    data_path: &Path,
    specs: &[String],
    pivot_block: usize,
    symbol: Option<&str>,
) -> Result<(), StratlabError> {
    let keys = specs
        .iter()
        .map(|s| parse_indicator_spec(s))
        .collect::<Result<Vec<_>, _>>()?;

    let symbol = match symbol {
        Some(s) => s,
        None if data_path.is_dir() => {
            return Err(StratlabError::Data {
                reason: format!(
                    "{} is a directory; pass --symbol to pick a file",
                    data_path.display()
                ),
            });
        }
        None => "",
    };
    let candles = CsvAdapter::new(data_path.to_path_buf()).fetch_candles(symbol, None, None)?;
    let augmented = augment_with(&candles, &keys, pivot_block);
    write_candles(io::stdout().lock(), &augmented, &keys)
}

fn run_sample(symbol: &str, output: Option<&Path>) -> Result<(), StratlabError> {
    let strategy = sample_strategy(symbol);
    match output {
        Some(path) => JsonStrategyAdapter.save(&strategy, path),
        None => {
            writeln!(io::stdout(), "{}", JsonStrategyAdapter::to_json(&strategy)?)?;
            Ok(())
        }
    }
}

fn run_describe(strategy_path: &Path, code: bool) -> Result<(), StratlabError> {
    let strategy = JsonStrategyAdapter.load(strategy_path)?;
    let assistant = PlainTextAssistant;
    let text = if code {
        assistant.generate_code(&strategy)?
    } else {
        assistant.analyze(&strategy)?
    };
    write!(io::stdout(), "{text}")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_colon_specs() {
        assert_eq!(
            parse_indicator_spec("sma:20").unwrap(),
            IndicatorKey::computed(IndicatorKind::Sma, 20)
        );
        assert_eq!(
            parse_indicator_spec("EMA:10:high").unwrap(),
            IndicatorKey::new(IndicatorKind::Ema, Some(10), PriceField::High)
        );
        assert_eq!(
            parse_indicator_spec("pivot:7").unwrap(),
            IndicatorKey::computed(IndicatorKind::Pivot, 7)
        );
    }

    #[test]
    fn parses_key_specs() {
        assert_eq!(
            parse_indicator_spec("RSI_14").unwrap(),
            IndicatorKey::computed(IndicatorKind::Rsi, 14)
        );
        assert_eq!(
            parse_indicator_spec("PREV_CLOSE").unwrap(),
            IndicatorKey::plain(IndicatorKind::PrevClose)
        );
    }

    #[test]
    fn rejects_bad_specs() {
        assert!(parse_indicator_spec("macd:12").is_err());
        assert!(parse_indicator_spec("sma:x").is_err());
        assert!(parse_indicator_spec("sma:5:mid").is_err());
        assert!(parse_indicator_spec("sma:5:high:1").is_err());
    }

    #[test]
    fn data_path_prefers_cli() {
        let config = FileConfigAdapter::from_string("[data]\npath = from_config.csv\n").unwrap();
        let p = resolve_data_path(Some(Path::new("cli.csv")), &config).unwrap();
        assert_eq!(p, PathBuf::from("cli.csv"));

        let p = resolve_data_path(None, &config).unwrap();
        assert_eq!(p, PathBuf::from("from_config.csv"));
    }

    #[test]
    fn data_path_missing_is_config_error() {
        let err = resolve_data_path(None, &FileConfigAdapter::empty()).unwrap_err();
        assert!(matches!(err, StratlabError::ConfigMissing { .. }));
    }

    #[test]
    fn cli_parses_backtest() {
        let cli = Cli::try_parse_from([
            "stratlab", "backtest", "-s", "s.json", "-d", "c.csv", "--symbol", "QQQ",
        ])
        .unwrap();
        match cli.command {
            Command::Backtest { strategy, data, symbol, .. } => {
                assert_eq!(strategy, PathBuf::from("s.json"));
                assert_eq!(data, Some(PathBuf::from("c.csv")));
                assert_eq!(symbol.as_deref(), Some("QQQ"));
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn cli_indicators_requires_one() {
        assert!(Cli::try_parse_from(["stratlab", "indicators", "-d", "c.csv"]).is_err());
        let cli = Cli::try_parse_from([
            "stratlab", "indicators", "-d", "c.csv", "-i", "sma:5", "-i", "RSI_14",
        ])
        .unwrap();
        match cli.command {
            Command::Indicators { indicators, pivot_block, symbol, .. } => {
                assert_eq!(indicators, vec!["sma:5", "RSI_14"]);
                assert_eq!(pivot_block, 5);
                assert_eq!(symbol, None);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn backtest_rejects_config_before_reading_strategy() {
        let dir = tempfile::TempDir::new().unwrap();
        let ini = dir.path().join("stratlab.ini");
        std::fs::write(&ini, "[backtest]\nstart_date = 2024-02-01\nend_date = 2024-01-01\n")
            .unwrap();

        let err = run_backtest_command(
            &dir.path().join("missing.json"),
            None,
            Some(&ini),
            None,
            None,
        )
        .unwrap_err();
        assert!(matches!(err, StratlabError::ConfigInvalid { ref key, .. } if key == "start_date"));
    }

    #[test]
    fn indicators_on_directory_need_symbol() {
        let dir = tempfile::TempDir::new().unwrap();
        let candles: Vec<_> = (0..3)
            .map(|i| {
                crate::domain::candle::Candle::new(
                    chrono::NaiveDate::from_ymd_opt(2024, 1, 1 + i).unwrap(),
                    10.0,
                    11.0,
                    9.0,
                    10.0,
                    100.0,
                )
            })
            .collect();
        let file = std::fs::File::create(dir.path().join("QQQ.csv")).unwrap();
        write_candles(file, &candles, &[]).unwrap();
        let specs = vec!["sma:2".to_string()];

        let err = run_indicators(dir.path(), &specs, 5, None).unwrap_err();
        assert!(matches!(err, StratlabError::Data { .. }));
        assert_eq!(err.exit_status(), 5);

        assert!(run_indicators(dir.path(), &specs, 5, Some("QQQ")).is_ok());
    }
}
