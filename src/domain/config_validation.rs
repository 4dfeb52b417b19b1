//! Configuration validation and typed construction.
//!
//! Every key is checked before a cycle runs. Numeric keys are parsed
//! strictly: a present but non-numeric value is an error, never a silent
//! fallback to the default.

use crate::domain::cycle::CycleSettings;
use crate::domain::decision::TradingParams;
use crate::domain::error::NewstraderError;
use crate::domain::event::Importance;
use crate::domain::indicator_helpers::MIN_ANALYSIS_BARS;
use crate::domain::instrument::{
    default_currencies, parse_correlations, InstrumentProfile, InstrumentTable,
};
use crate::ports::config_port::ConfigPort;
use crate::ports::market_data_port::Timeframe;
use std::str::FromStr;

pub const DEFAULT_BAR_COUNT: usize = 100;
pub const DEFAULT_WINDOW_HOURS: i64 = 168;
/// One leap year.
pub const MAX_WINDOW_HOURS: i64 = 8784;

pub fn validate_trading_config(config: &dyn ConfigPort) -> Result<(), NewstraderError> {
    build_trading_params(config)?;
    build_cycle_settings(config)?;
    Ok(())
}

pub fn validate_instruments(config: &dyn ConfigPort) -> Result<(), NewstraderError> {
    build_instrument_table(config).map(|_| ())
}

/// Paths and account keys the CLI adapters need.
pub fn validate_sources(config: &dyn ConfigPort) -> Result<(), NewstraderError> {
    required_string(config, "data", "path")?;
    required_string(config, "calendar", "path")?;
    let equity = parse_number(config, "account", "equity", 0.0)?;
    if !(equity > 0.0) {
        return Err(NewstraderError::invalid(
            "account",
            "equity",
            "equity must be positive",
        ));
    }
    Ok(())
}

pub fn validate_all(config: &dyn ConfigPort) -> Result<(), NewstraderError> {
    validate_trading_config(config)?;
    validate_instruments(config)?;
    validate_sources(config)?;
    Ok(())
}

pub fn build_trading_params(config: &dyn ConfigPort) -> Result<TradingParams, NewstraderError> {
    let defaults = TradingParams::default();
    let risk_percent = parse_number(config, "trading", "risk_percent", defaults.risk_percent)?;
    if !(risk_percent > 0.0 && risk_percent <= 1.0) {
        return Err(NewstraderError::invalid(
            "trading",
            "risk_percent",
            "risk_percent must be between 0 and 1",
        ));
    }

    let min_impact_strength = parse_number(
        config,
        "trading",
        "min_impact_strength",
        defaults.min_impact_strength,
    )?;
    if !(0.0..=1.0).contains(&min_impact_strength) {
        return Err(NewstraderError::invalid(
            "trading",
            "min_impact_strength",
            "min_impact_strength must be between 0 and 1",
        ));
    }

    let stop_atr_multiple = parse_number(
        config,
        "trading",
        "stop_atr_multiple",
        defaults.stop_atr_multiple,
    )?;
    if !(stop_atr_multiple > 0.0) {
        return Err(NewstraderError::invalid(
            "trading",
            "stop_atr_multiple",
            "stop_atr_multiple must be positive",
        ));
    }

    let reward_risk = parse_number(config, "trading", "reward_risk", defaults.reward_risk)?;
    if !(reward_risk > 0.0) {
        return Err(NewstraderError::invalid(
            "trading",
            "reward_risk",
            "reward_risk must be positive",
        ));
    }

    Ok(TradingParams {
        risk_percent,
        min_impact_strength,
        stop_atr_multiple,
        reward_risk,
    })
}

pub fn build_cycle_settings(config: &dyn ConfigPort) -> Result<CycleSettings, NewstraderError> {
    let timeframe = match config.get_string("trading", "timeframe") {
        Some(s) => Timeframe::from_str(&s)
            .map_err(|reason| NewstraderError::invalid("trading", "timeframe", reason))?,
        None => Timeframe::H1,
    };

    let bar_count = parse_number(config, "trading", "bar_count", DEFAULT_BAR_COUNT as f64)?;
    if !(bar_count.fract() == 0.0 && bar_count >= MIN_ANALYSIS_BARS as f64) {
        return Err(NewstraderError::invalid(
            "trading",
            "bar_count",
            format!("bar_count must be an integer of at least {MIN_ANALYSIS_BARS}"),
        ));
    }

    let lookback_hours = parse_hours(config, "lookback_hours")?;
    let lookahead_hours = parse_hours(config, "lookahead_hours")?;

    let countries = config
        .get_string("calendar", "countries")
        .map(|s| split_list(&s))
        .unwrap_or_default();

    let min_importance = match config.get_string("calendar", "min_importance") {
        Some(s) => s
            .parse::<Importance>()
            .map_err(|reason| NewstraderError::invalid("calendar", "min_importance", reason))?,
        None => Importance::Low,
    };

    Ok(CycleSettings {
        timeframe,
        bar_count: bar_count as usize,
        lookback_hours,
        lookahead_hours,
        countries,
        min_importance,
        combine_events: parse_bool(config, "trading", "combine_events", false)?,
        dry_run: false,
    })
}

pub fn build_instrument_table(config: &dyn ConfigPort) -> Result<InstrumentTable, NewstraderError> {
    let symbols = config
        .get_string("trading", "instruments")
        .map(|s| split_list(&s))
        .unwrap_or_default();
    if symbols.is_empty() {
        return Err(NewstraderError::missing("trading", "instruments"));
    }

    let profiles = symbols
        .iter()
        .map(|symbol| build_profile(config, symbol))
        .collect::<Result<Vec<_>, _>>()?;
    InstrumentTable::new(profiles)
}

fn build_profile(
    config: &dyn ConfigPort,
    symbol: &str,
) -> Result<InstrumentProfile, NewstraderError> {
    let section = format!("instrument.{symbol}");
    let required = |key: &str| -> Result<f64, NewstraderError> {
        match config.get_string(&section, key) {
            None => Err(NewstraderError::missing(&section, key)),
            Some(_) => parse_number(config, &section, key, 0.0),
        }
    };

    let correlations = match config.get_string(&section, "correlations") {
        Some(s) => parse_correlations(&s)
            .map_err(|reason| NewstraderError::invalid(&section, "correlations", reason))?,
        None => Default::default(),
    };

    let currencies = match config.get_string(&section, "currencies") {
        Some(s) => split_list(&s).into_iter().map(|c| c.to_uppercase()).collect(),
        None => default_currencies(symbol),
    };

    let profile = InstrumentProfile {
        symbol: symbol.to_string(),
        pip_value: required("pip_value")?,
        contract_size: parse_number(config, &section, "contract_size", 1.0)?,
        base_volume: required("base_volume")?,
        max_spread: required("max_spread")?,
        currencies,
        correlations,
    };
    profile.validate()?;
    Ok(profile)
}

pub fn required_string(
    config: &dyn ConfigPort,
    section: &str,
    key: &str,
) -> Result<String, NewstraderError> {
    match config.get_string(section, key) {
        Some(s) if !s.trim().is_empty() => Ok(s.trim().to_string()),
        _ => Err(NewstraderError::missing(section, key)),
    }
}

/// Absent keys yield `default`; present keys must parse as a finite number.
pub fn parse_number(
    config: &dyn ConfigPort,
    section: &str,
    key: &str,
    default: f64,
) -> Result<f64, NewstraderError> {
    match config.get_string(section, key) {
        None => Ok(default),
        Some(raw) => match raw.trim().parse::<f64>() {
            Ok(v) if v.is_finite() => Ok(v),
            _ => Err(NewstraderError::invalid(
                section,
                key,
                format!("'{}' is not a number", raw.trim()),
            )),
        },
    }
}

fn parse_bool(
    config: &dyn ConfigPort,
    section: &str,
    key: &str,
    default: bool,
) -> Result<bool, NewstraderError> {
    match config.get_string(section, key) {
        None => Ok(default),
        Some(raw) => match raw.trim().to_lowercase().as_str() {
            "true" | "yes" | "1" => Ok(true),
            "false" | "no" | "0" => Ok(false),
            other => Err(NewstraderError::invalid(
                section,
                key,
                format!("'{other}' is not a boolean"),
            )),
        },
    }
}

fn parse_hours(config: &dyn ConfigPort, key: &str) -> Result<i64, NewstraderError> {
    let hours = parse_number(config, "calendar", key, DEFAULT_WINDOW_HOURS as f64)?;
    if !(hours.fract() == 0.0 && (0.0..=MAX_WINDOW_HOURS as f64).contains(&hours)) {
        return Err(NewstraderError::invalid(
            "calendar",
            key,
            format!("{key} must be a whole number between 0 and {MAX_WINDOW_HOURS}"),
        ));
    }
    Ok(hours as i64)
}

fn split_list(s: &str) -> Vec<String> {
    s.split(',')
        .map(|item| item.trim().to_string())
        .filter(|item| !item.is_empty())
        .collect()
}
