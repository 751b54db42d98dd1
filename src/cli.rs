//! CLI definition and dispatch.

use chrono::{Local, NaiveDate};
use clap::{ArgGroup, Parser, Subcommand};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::{info, warn};

use crate::adapters::csv_adapter::{CsvAdapter, read_profiles};
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::adapters::sqlite_adapter::SqliteAdapter;
use crate::domain::alert::{AlertKind, PriceAlert};
use crate::domain::analytics::beta::beta_for_ticker;
use crate::domain::analytics::correlation::correlation_for_tickers;
use crate::domain::analytics::fundamental::fundamental_analysis;
use crate::domain::analytics::portfolio::{parse_holdings, portfolio_metrics};
use crate::domain::analytics::sector::sector_comparison;
use crate::domain::analytics::{
    AnalyticsConfig, DEFAULT_MARKET_TICKER, DEFAULT_MIN_OBSERVATIONS, DEFAULT_RISK_FREE_RATE,
};
use crate::domain::batch::{calculate_for_all, calculate_for_ticker};
use crate::domain::config_validation::{
    parse_indicator_types, validate_analytics_config, validate_indicator_config,
    validate_storage_config,
};
use crate::domain::error::MarketlensError;
use crate::domain::indicator::IndicatorType;
use crate::domain::indicator::plan::{default_plan, filter_plan};
use crate::domain::tickers::{normalize_ticker, parse_tickers};
use crate::ports::config_port::ConfigPort;
use crate::ports::data_port::PriceDataPort;
use crate::ports::stock_port::StockInfoPort;

#[derive(Parser, Debug)]
#[command(name = "marketlens", about = "Technical indicators and risk analytics")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Load price CSVs (and optionally instrument profiles) into the database
    Import {
        #[arg(short, long)]
        config: PathBuf,
        /// Directory of <TICKER>.csv files
        #[arg(long)]
        dir: PathBuf,
        #[arg(long)]
        ticker: Option<String>,
        #[arg(long)]
        profiles: Option<PathBuf>,
    },
    /// Compute and store indicators
    #[command(group(ArgGroup::new("target").required(true).args(["ticker", "all"])))]
    Calculate {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(long)]
        ticker: Option<String>,
        #[arg(long)]
        all: bool,
        #[arg(long)]
        days: Option<i64>,
        /// Comma-separated indicator codes, e.g. SMA,RSI
        #[arg(long)]
        types: Option<String>,
        #[arg(long)]
        as_of: Option<NaiveDate>,
        #[arg(long)]
        workers: Option<usize>,
    },
    /// Beta against the configured market ticker
    Beta {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(long)]
        ticker: String,
        #[arg(long)]
        as_of: Option<NaiveDate>,
    },
    /// Pairwise return correlations
    Correlation {
        #[arg(short, long)]
        config: PathBuf,
        /// Comma-separated tickers
        #[arg(long)]
        tickers: String,
        #[arg(long)]
        as_of: Option<NaiveDate>,
    },
    /// Portfolio risk metrics
    Portfolio {
        #[arg(short, long)]
        config: PathBuf,
        /// TICKER:QTY[:BUY_PRICE] entries separated by commas
        #[arg(long)]
        holdings: String,
        #[arg(long)]
        as_of: Option<NaiveDate>,
    },
    /// Rule-based fundamental score
    Fundamentals {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(long)]
        ticker: String,
    },
    /// Compare an instrument with its sector peers
    Sector {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(long)]
        ticker: String,
        #[arg(long)]
        as_of: Option<NaiveDate>,
    },
    /// Evaluate a price alert against the stored profile
    Alert {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(long)]
        ticker: String,
        /// above, below, change-up or change-down
        #[arg(long)]
        kind: AlertKind,
        #[arg(long)]
        threshold: f64,
    },
    /// Show stored data range for instrument(s)
    Info {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(long)]
        ticker: Option<String>,
    },
}

pub fn run(cli: Cli) -> ExitCode {
    let result = match cli.command {
        Command::Import {
            config,
            dir,
            ticker,
            profiles,
        } => run_import(&config, &dir, ticker.as_deref(), profiles.as_deref()),
        Command::Calculate {
            config,
            ticker,
            all: _,
            days,
            types,
            as_of,
            workers,
        } => run_calculate(
            &config,
            ticker.as_deref(),
            days,
            types.as_deref(),
            as_of,
            workers,
        ),
        Command::Beta {
            config,
            ticker,
            as_of,
        } => run_beta(&config, &ticker, as_of),
        Command::Correlation {
            config,
            tickers,
            as_of,
        } => run_correlation(&config, &tickers, as_of),
        Command::Portfolio {
            config,
            holdings,
            as_of,
        } => run_portfolio(&config, &holdings, as_of),
        Command::Fundamentals { config, ticker } => run_fundamentals(&config, &ticker),
        Command::Sector {
            config,
            ticker,
            as_of,
        } => run_sector(&config, &ticker, as_of),
        Command::Alert {
            config,
            ticker,
            kind,
            threshold,
        } => run_alert(&config, &ticker, kind, threshold),
        Command::Info { config, ticker } => run_info(&config, ticker.as_deref()),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            (&e).into()
        }
    }
}

/// Loads the INI file and validates every section.
pub fn load_config(path: &Path) -> Result<FileConfigAdapter, MarketlensError> {
    let config = FileConfigAdapter::from_file(path).map_err(|e| MarketlensError::ConfigParse {
        file: path.display().to_string(),
        reason: e.to_string(),
    })?;
    validate_storage_config(&config)?;
    validate_indicator_config(&config)?;
    validate_analytics_config(&config)?;
    Ok(config)
}

pub fn build_analytics_config(config: &dyn ConfigPort) -> AnalyticsConfig {
    let defaults = AnalyticsConfig::default();
    AnalyticsConfig {
        market_ticker: config
            .get_string("analytics", "market_ticker")
            .and_then(|t| normalize_ticker(&t))
            .unwrap_or_else(|| DEFAULT_MARKET_TICKER.to_string()),
        risk_free_rate: config.get_double("analytics", "risk_free_rate", DEFAULT_RISK_FREE_RATE),
        beta_days: config.get_int("analytics", "beta_days", defaults.beta_days),
        correlation_days: config.get_int("analytics", "correlation_days", defaults.correlation_days),
        volatility_days: config.get_int("analytics", "volatility_days", defaults.volatility_days),
        min_observations: config.get_int(
            "analytics",
            "min_observations",
            DEFAULT_MIN_OBSERVATIONS as i64,
        ) as usize,
    }
}

/// The default plan, narrowed by `--types` or `[indicators] types`.
pub fn resolve_plan(
    types_override: Option<&str>,
    config: &dyn ConfigPort,
) -> Result<Vec<IndicatorType>, MarketlensError> {
    let kinds = match types_override {
        Some(t) => parse_indicator_types(t)?,
        None => match config.get_string("indicators", "types") {
            Some(t) => parse_indicator_types(&t)?,
            None => Vec::new(),
        },
    };
    Ok(filter_plan(default_plan(), &kinds))
}

fn open_store(config: &dyn ConfigPort) -> Result<SqliteAdapter, MarketlensError> {
    let store = SqliteAdapter::from_config(config)?;
    store.initialize_schema()?;
    Ok(store)
}

fn ticker_arg(raw: &str) -> Result<String, MarketlensError> {
    normalize_ticker(raw).ok_or_else(|| MarketlensError::InvalidArgument {
        reason: format!("invalid ticker '{raw}'"),
    })
}

fn today() -> NaiveDate {
    Local::now().date_naive()
}

fn print_json<T: Serialize>(value: &T) -> Result<(), MarketlensError> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[derive(Debug, Serialize)]
struct ImportSummary {
    profiles: usize,
    tickers: Vec<ImportedTicker>,
}

#[derive(Debug, Serialize)]
struct ImportedTicker {
    ticker: String,
    bars_read: usize,
    bars_inserted: usize,
}

fn run_import(
    config_path: &Path,
    dir: &Path,
    ticker: Option<&str>,
    profiles_path: Option<&Path>,
) -> Result<(), MarketlensError> {
    let config = load_config(config_path)?;
    let store = open_store(&config)?;

    let mut profiles = 0;
    if let Some(path) = profiles_path {
        for profile in read_profiles(path)? {
            store.upsert_stock(&profile)?;
            profiles += 1;
        }
        info!(profiles, path = %path.display(), "profiles imported");
    }

    let source = CsvAdapter::new(dir.to_path_buf());
    let files = match ticker {
        Some(t) => vec![ticker_arg(t)?],
        None => source.list_tickers()?,
    };

    let mut tickers = Vec::with_capacity(files.len());
    for file_ticker in files {
        let Some(ticker) = normalize_ticker(&file_ticker) else {
            warn!(file = %file_ticker, "file name is not a ticker, skipping");
            continue;
        };
        let series = source.read_series(&file_ticker)?;
        let inserted = store.insert_bars(&ticker, series.bars())?;
        info!(ticker = %ticker, read = series.len(), inserted, "bars imported");
        tickers.push(ImportedTicker {
            ticker,
            bars_read: series.len(),
            bars_inserted: inserted,
        });
    }

    print_json(&ImportSummary { profiles, tickers })
}

fn run_calculate(
    config_path: &Path,
    ticker: Option<&str>,
    days: Option<i64>,
    types: Option<&str>,
    as_of: Option<NaiveDate>,
    workers: Option<usize>,
) -> Result<(), MarketlensError> {
    let config = load_config(config_path)?;
    let days = days.unwrap_or_else(|| config.get_int("indicators", "days", 365));
    if days <= 0 {
        return Err(MarketlensError::InvalidArgument {
            reason: "--days must be positive".into(),
        });
    }
    let workers = workers.unwrap_or_else(|| config.get_int("indicators", "workers", 4) as usize);
    if workers == 0 {
        return Err(MarketlensError::InvalidArgument {
            reason: "--workers must be at least 1".into(),
        });
    }
    let plan = resolve_plan(types, &config)?;
    let as_of = as_of.unwrap_or_else(today);
    let store = open_store(&config)?;

    match ticker {
        Some(t) => {
            let report = calculate_for_ticker(&store, &store, &ticker_arg(t)?, as_of, days, &plan)?;
            print_json(&report)
        }
        None => {
            let summary = calculate_for_all(&store, &store, as_of, days, &plan, workers)?;
            print_json(&summary)
        }
    }
}

#[derive(Debug, Serialize)]
struct BetaOutput {
    ticker: String,
    market_ticker: String,
    as_of: NaiveDate,
    beta: f64,
}

fn run_beta(
    config_path: &Path,
    ticker: &str,
    as_of: Option<NaiveDate>,
) -> Result<(), MarketlensError> {
    let config = load_config(config_path)?;
    let analytics = build_analytics_config(&config);
    let store = open_store(&config)?;
    let ticker = ticker_arg(ticker)?;
    let as_of = as_of.unwrap_or_else(today);

    let beta = beta_for_ticker(&store, &ticker, &analytics, as_of)?;
    print_json(&BetaOutput {
        ticker,
        market_ticker: analytics.market_ticker,
        as_of,
        beta,
    })
}

fn run_correlation(
    config_path: &Path,
    tickers: &str,
    as_of: Option<NaiveDate>,
) -> Result<(), MarketlensError> {
    let config = load_config(config_path)?;
    let analytics = build_analytics_config(&config);
    let store = open_store(&config)?;
    let tickers = parse_tickers(tickers)?;

    let matrix = correlation_for_tickers(&store, &tickers, &analytics, as_of.unwrap_or_else(today))?;
    print_json(&matrix)
}

fn run_portfolio(
    config_path: &Path,
    holdings: &str,
    as_of: Option<NaiveDate>,
) -> Result<(), MarketlensError> {
    let config = load_config(config_path)?;
    let analytics = build_analytics_config(&config);
    let store = open_store(&config)?;
    let holdings = parse_holdings(holdings)?;

    let metrics = portfolio_metrics(
        &store,
        &store,
        &holdings,
        &analytics,
        as_of.unwrap_or_else(today),
    )?;
    print_json(&metrics)
}

fn run_fundamentals(config_path: &Path, ticker: &str) -> Result<(), MarketlensError> {
    let config = load_config(config_path)?;
    let store = open_store(&config)?;
    let analysis = fundamental_analysis(&store, &store, &ticker_arg(ticker)?)?;
    print_json(&analysis)
}

fn run_sector(
    config_path: &Path,
    ticker: &str,
    as_of: Option<NaiveDate>,
) -> Result<(), MarketlensError> {
    let config = load_config(config_path)?;
    let store = open_store(&config)?;
    let ticker = ticker_arg(ticker)?;

    match sector_comparison(&store, &store, &ticker, as_of.unwrap_or_else(today))? {
        Some(comparison) => print_json(&comparison),
        None => {
            eprintln!("{ticker}: no sector recorded");
            Ok(())
        }
    }
}

#[derive(Debug, Serialize)]
struct AlertOutput {
    #[serde(flatten)]
    alert: PriceAlert,
    current_price: Option<f64>,
    change_percent: Option<f64>,
    triggered: bool,
}

fn run_alert(
    config_path: &Path,
    ticker: &str,
    kind: AlertKind,
    threshold: f64,
) -> Result<(), MarketlensError> {
    let config = load_config(config_path)?;
    let store = open_store(&config)?;
    let ticker = ticker_arg(ticker)?;

    let profile = store.stock_profile(&ticker)?;
    let mut alert = PriceAlert::new(ticker, kind, threshold);
    let triggered = alert.check(&profile);
    print_json(&AlertOutput {
        alert,
        current_price: profile.current_price,
        change_percent: profile.price_change_percent(),
        triggered,
    })
}

fn run_info(config_path: &Path, ticker: Option<&str>) -> Result<(), MarketlensError> {
    let config = load_config(config_path)?;
    let store = open_store(&config)?;

    let tickers = match ticker {
        Some(t) => vec![ticker_arg(t)?],
        None => store.list_tickers()?,
    };

    for t in &tickers {
        match store.get_data_range(t)? {
            Some((min_date, max_date, count)) => {
                println!("{t}: {count} bars, {min_date} to {max_date}");
            }
            None => eprintln!("{t}: no data found"),
        }
    }
    Ok(())
}
