//! CLI definition and dispatch.
//!
//! Progress and diagnostics go to stderr; order lines and command results
//! go to stdout.

use chrono::{NaiveDateTime, Utc};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;

use crate::adapters::csv_calendar_adapter::CsvCalendarAdapter;
use crate::adapters::csv_market_data_adapter::{CsvMarketDataAdapter, TIMESTAMP_FORMAT};
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::adapters::paper_executor::PaperExecutor;
use crate::domain::config_validation::{
    build_cycle_settings, build_instrument_table, build_trading_params, parse_number,
    required_string, validate_all,
};
use crate::domain::cycle::{
    run_cycle, CyclePorts, CycleReport, CycleSettings, InstrumentOutcome,
};
use crate::domain::decision::{OrderIntent, TradingParams};
use crate::domain::error::NewstraderError;
use crate::domain::event::{base_impact, score_event, EconomicEvent, Importance};
use crate::domain::indicator_helpers::{analyze_series, CompleteRow};
use crate::domain::instrument::InstrumentTable;
use crate::domain::market_state::classify;
use crate::domain::ohlcv::BarSeries;
use crate::ports::config_port::ConfigPort;
use crate::ports::market_data_port::MarketDataPort;

#[derive(Parser, Debug)]
#[command(name = "newstrader", about = "News-driven technical trading signals")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run one analysis cycle
    Run {
        #[arg(short, long)]
        config: PathBuf,
        /// Restrict the cycle to one configured instrument
        #[arg(short, long)]
        instrument: Option<String>,
        /// Decide without submitting orders
        #[arg(long)]
        dry_run: bool,
        /// Cycle time as "YYYY-MM-DD HH:MM:SS" (defaults to now, UTC)
        #[arg(long)]
        at: Option<String>,
    },
    /// Validate a configuration file
    Validate {
        #[arg(short, long)]
        config: PathBuf,
    },
    /// Show the latest indicators and market state for an instrument
    State {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(short, long)]
        instrument: String,
    },
    /// Score one economic release against an instrument
    Score {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(short, long)]
        instrument: String,
        #[arg(long)]
        event: String,
        #[arg(long, allow_hyphen_values = true)]
        actual: f64,
        #[arg(long, allow_hyphen_values = true)]
        forecast: f64,
        /// Calendar importance: low, medium or high
        #[arg(long, default_value = "high")]
        importance: Importance,
    },
}

pub fn run(cli: Cli) -> ExitCode {
    match cli.command {
        Command::Run {
            config,
            instrument,
            dry_run,
            at,
        } => run_trading_cycle(&config, instrument.as_deref(), dry_run, at.as_deref()),
        Command::Validate { config } => run_validate(&config),
        Command::State { config, instrument } => run_state(&config, &instrument),
        Command::Score {
            config,
            instrument,
            event,
            actual,
            forecast,
            importance,
        } => run_score(&config, &instrument, &event, actual, forecast, importance),
    }
}

fn fail(err: NewstraderError) -> ExitCode {
    eprintln!("error: {err}");
    (&err).into()
}

pub fn load_config(path: &PathBuf) -> Result<FileConfigAdapter, ExitCode> {
    FileConfigAdapter::from_file(path).map_err(fail)
}

pub fn parse_cycle_time(at: Option<&str>) -> Result<NaiveDateTime, NewstraderError> {
    match at {
        None => Ok(Utc::now().naive_utc()),
        Some(s) => NaiveDateTime::parse_from_str(s.trim(), TIMESTAMP_FORMAT).map_err(|e| {
            NewstraderError::invalid("cli", "at", format!("invalid time '{}': {}", s, e))
        }),
    }
}

/// The whole table, or just `instrument` when given.
pub fn select_instruments(
    table: InstrumentTable,
    instrument: Option<&str>,
) -> Result<InstrumentTable, NewstraderError> {
    match instrument {
        None => Ok(table),
        Some(symbol) => {
            let profile = table.get(symbol)?.clone();
            InstrumentTable::new(vec![profile])
        }
    }
}

pub fn trading_setup(
    config: &dyn ConfigPort,
    instrument: Option<&str>,
) -> Result<(InstrumentTable, TradingParams, CycleSettings), NewstraderError> {
    Ok((
        select_instruments(build_instrument_table(config)?, instrument)?,
        build_trading_params(config)?,
        build_cycle_settings(config)?,
    ))
}

pub fn build_market_data(config: &dyn ConfigPort) -> Result<CsvMarketDataAdapter, NewstraderError> {
    Ok(CsvMarketDataAdapter::new(PathBuf::from(required_string(
        config, "data", "path",
    )?)))
}

pub fn build_calendar(config: &dyn ConfigPort) -> Result<CsvCalendarAdapter, NewstraderError> {
    Ok(CsvCalendarAdapter::new(PathBuf::from(required_string(
        config, "calendar", "path",
    )?)))
}

pub fn build_executor(config: &dyn ConfigPort) -> Result<PaperExecutor, NewstraderError> {
    Ok(PaperExecutor::new(parse_number(config, "account", "equity", 0.0)?))
}

fn run_trading_cycle(
    config_path: &PathBuf,
    instrument: Option<&str>,
    dry_run: bool,
    at: Option<&str>,
) -> ExitCode {
    eprintln!("Loading config from {}", config_path.display());
    let adapter = match load_config(config_path) {
        Ok(a) => a,
        Err(code) => return code,
    };
    if let Err(e) = validate_all(&adapter) {
        return fail(e);
    }
    let now = match parse_cycle_time(at) {
        Ok(t) => t,
        Err(e) => return fail(e),
    };

    let adapters = build_market_data(&adapter).and_then(|market| {
        Ok((market, build_calendar(&adapter)?, build_executor(&adapter)?))
    });
    let (market, calendar, executor) = match adapters {
        Ok(a) => a,
        Err(e) => return fail(e),
    };
    let ports = CyclePorts {
        market: &market,
        calendar: &calendar,
        executor: &executor,
    };

    run_cycle_pipeline(&adapter, &ports, instrument, dry_run, now)
}

/// Validated config plus ports to one printed cycle. Split from the file
/// loading so tests can drive it with mock ports.
pub fn run_cycle_pipeline(
    config: &dyn ConfigPort,
    ports: &CyclePorts<'_>,
    instrument: Option<&str>,
    dry_run: bool,
    now: NaiveDateTime,
) -> ExitCode {
    let (table, params, mut settings) = match trading_setup(config, instrument) {
        Ok(s) => s,
        Err(e) => return fail(e),
    };
    settings.dry_run = dry_run;

    eprintln!(
        "Running {}cycle at {} for {}",
        if dry_run { "dry-run " } else { "" },
        now.format(TIMESTAMP_FORMAT),
        table.symbols().join(", ")
    );

    match run_cycle(ports, &table, &params, &settings, now) {
        Ok(report) => {
            print_cycle_report(&report);
            ExitCode::SUCCESS
        }
        Err(e) => fail(e),
    }
}

fn print_cycle_report(report: &CycleReport) {
    eprintln!("\n=== Cycle Results ({} events) ===", report.events);
    for instrument in &report.instruments {
        eprintln!("{:<10} {}", instrument.symbol, instrument.outcome);
        for evaluation in &instrument.evaluations {
            eprintln!(
                "           {}: {} {:.3}",
                evaluation.event, evaluation.impact.direction, evaluation.impact.strength
            );
        }
        match &instrument.outcome {
            InstrumentOutcome::Planned { order } => println!("PLANNED {}", order_line(order)),
            InstrumentOutcome::Submitted { order, .. } => println!("ORDER {}", order_line(order)),
            _ => {}
        }
    }
    eprintln!(
        "\n{} submitted, {} failed, {} instruments",
        report.submitted(),
        report.failed(),
        report.instruments.len()
    );
}

pub fn order_line(order: &OrderIntent) -> String {
    format!(
        "{} {} {} entry={} sl={} tp={} hold={}h",
        order.symbol,
        order.direction,
        order.volume,
        order.entry_price,
        order.stop_loss,
        order.take_profit,
        order.hold_hours
    )
}

fn run_validate(config_path: &PathBuf) -> ExitCode {
    eprintln!("Validating config: {}", config_path.display());
    let adapter = match load_config(config_path) {
        Ok(a) => a,
        Err(code) => return code,
    };
    if let Err(e) = validate_all(&adapter) {
        return fail(e);
    }
    let (table, params, settings) = match trading_setup(&adapter, None) {
        Ok(v) => v,
        Err(e) => return fail(e),
    };

    eprintln!("\nInstruments:");
    for profile in table.iter() {
        let correlations: Vec<String> = profile
            .correlations
            .iter()
            .map(|(factor, c)| format!("{factor}:{c}"))
            .collect();
        eprintln!(
            "  {:<10} pip={} contract={} step={} max_spread={} [{}]",
            profile.symbol,
            profile.pip_value,
            profile.contract_size,
            profile.base_volume,
            profile.max_spread,
            correlations.join(", ")
        );
    }
    eprintln!("\nTrading:");
    eprintln!("  timeframe:           {} x {} bars", settings.timeframe, settings.bar_count);
    eprintln!("  risk_percent:        {}", params.risk_percent);
    eprintln!("  min_impact_strength: {}", params.min_impact_strength);
    eprintln!("  stop_atr_multiple:   {}", params.stop_atr_multiple);
    eprintln!("  reward_risk:         {}", params.reward_risk);
    eprintln!("  combine_events:      {}", settings.combine_events);
    eprintln!("\nConfiguration is valid.");
    ExitCode::SUCCESS
}

fn run_state(config_path: &PathBuf, symbol: &str) -> ExitCode {
    let adapter = match load_config(config_path) {
        Ok(a) => a,
        Err(code) => return code,
    };
    let market = match build_market_data(&adapter) {
        Ok(m) => m,
        Err(e) => return fail(e),
    };
    match state_report(&adapter, &market, symbol) {
        Ok(lines) => {
            for line in lines {
                println!("{line}");
            }
            ExitCode::SUCCESS
        }
        Err(e) => fail(e),
    }
}

/// Latest complete indicator row and the classified state, one line each.
pub fn state_report(
    config: &dyn ConfigPort,
    market: &dyn MarketDataPort,
    symbol: &str,
) -> Result<Vec<String>, NewstraderError> {
    let table = build_instrument_table(config)?;
    let profile = table.get(symbol)?;
    let settings = build_cycle_settings(config)?;

    let bars = market.fetch_bars(&profile.symbol, settings.timeframe, settings.bar_count)?;
    let series = BarSeries::new(profile.symbol.as_str(), bars)?;
    let row = analyze_series(&series)?;
    let state = classify(&row);

    Ok(vec![
        format!(
            "{} {} @ {}",
            profile.symbol,
            settings.timeframe,
            row.timestamp.format(TIMESTAMP_FORMAT)
        ),
        row_line(&row),
        state.to_string(),
    ])
}

fn row_line(row: &CompleteRow) -> String {
    format!(
        "close={} sma20={:.5} sma50={:.5} rsi14={:.2} atr14={:.5} \
         bb=[{:.5}, {:.5}] macd={:.5} signal={:.5}",
        row.close,
        row.sma20,
        row.sma50,
        row.rsi14,
        row.atr14,
        row.lower_band,
        row.upper_band,
        row.macd,
        row.macd_signal
    )
}

fn run_score(
    config_path: &PathBuf,
    symbol: &str,
    event: &str,
    actual: f64,
    forecast: f64,
    importance: Importance,
) -> ExitCode {
    let adapter = match load_config(config_path) {
        Ok(a) => a,
        Err(code) => return code,
    };
    match score_report(&adapter, symbol, event, actual, forecast, importance) {
        Ok(lines) => {
            for line in lines {
                println!("{line}");
            }
            ExitCode::SUCCESS
        }
        Err(e) => fail(e),
    }
}

/// Category, base impact and instrument-adjusted impact for one release.
pub fn score_report(
    config: &dyn ConfigPort,
    symbol: &str,
    name: &str,
    actual: f64,
    forecast: f64,
    importance: Importance,
) -> Result<Vec<String>, NewstraderError> {
    let table = build_instrument_table(config)?;
    let profile = table.get(symbol)?;
    let event = EconomicEvent {
        name: name.to_string(),
        country: String::new(),
        importance,
        actual: Some(actual),
        forecast: Some(forecast),
        scheduled: Utc::now().naive_utc(),
    };

    let base = base_impact(&event);
    let adjusted = score_event(&event, profile);
    let category = match base.category {
        Some(c) => {
            let rule = c.rule();
            let coefficient = profile
                .correlation(rule.factor)
                .map(|v| v.to_string())
                .unwrap_or_else(|| "none".to_string());
            format!("category={} factor={} correlation={}", c, rule.factor, coefficient)
        }
        None => "category=none".to_string(),
    };
    let surprise = base
        .surprise
        .map(|s| format!("{s:.6}"))
        .unwrap_or_else(|| "n/a".to_string());

    Ok(vec![
        format!("{name} ({actual} vs {forecast}, {importance}) surprise={surprise}"),
        category,
        format!("base     {} {:.4} hold={}h", base.direction, base.strength, base.hold_hours),
        format!(
            "{:<8} {} {:.4} hold={}h",
            profile.symbol, adjusted.direction, adjusted.strength, adjusted.hold_hours
        ),
    ])
}
