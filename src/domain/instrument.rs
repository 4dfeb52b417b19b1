//! Tradable instrument profiles and the ordered instrument table.
//!
//! Profiles are validated once when the table is built; lookups never
//! re-check them.

use crate::domain::error::NewstraderError;
use crate::domain::event::EconomicEvent;
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq)]
pub struct InstrumentProfile {
    pub symbol: String,
    /// Minimum quote increment.
    pub pip_value: f64,
    /// Units of the underlying per 1.0 volume.
    pub contract_size: f64,
    /// Volume step; sized orders are rounded down to a multiple of this.
    pub base_volume: f64,
    /// Largest acceptable spread, in points.
    pub max_spread: f64,
    /// Currencies whose calendar events move this instrument. Empty means
    /// every event is relevant.
    pub currencies: Vec<String>,
    /// Factor name (e.g. "USD", "SPX") to coefficient in [-1, 1].
    pub correlations: BTreeMap<String, f64>,
}

impl InstrumentProfile {
    pub fn correlation(&self, factor: &str) -> Option<f64> {
        self.correlations.get(factor).copied()
    }

    /// Whether `event` was released for one of this instrument's currencies.
    /// The calendar may report either a country or a currency code.
    pub fn is_relevant(&self, event: &EconomicEvent) -> bool {
        if self.currencies.is_empty() {
            return true;
        }
        let country = event.country.trim();
        let currency = currency_for_country(country);
        self.currencies.iter().any(|c| {
            c.eq_ignore_ascii_case(country)
                || currency.is_some_and(|code| c.eq_ignore_ascii_case(code))
        })
    }

    pub fn validate(&self) -> Result<(), NewstraderError> {
        let section = format!("instrument.{}", self.symbol);
        if self.symbol.trim().is_empty() {
            return Err(NewstraderError::invalid("trading", "instruments", "empty symbol"));
        }
        let positive = [
            ("pip_value", self.pip_value),
            ("contract_size", self.contract_size),
            ("base_volume", self.base_volume),
        ];
        for (key, value) in positive {
            if !(value.is_finite() && value > 0.0) {
                return Err(NewstraderError::invalid(
                    &section,
                    key,
                    format!("{key} must be positive"),
                ));
            }
        }
        if !(self.max_spread.is_finite() && self.max_spread >= 0.0) {
            return Err(NewstraderError::invalid(
                &section,
                "max_spread",
                "max_spread must be non-negative",
            ));
        }
        for (factor, coefficient) in &self.correlations {
            if !(coefficient.is_finite() && (-1.0..=1.0).contains(coefficient)) {
                return Err(NewstraderError::invalid(
                    &section,
                    "correlations",
                    format!("{factor} coefficient {coefficient} outside [-1, 1]"),
                ));
            }
        }
        Ok(())
    }
}

/// The supported instruments, in configured order.
#[derive(Debug, Clone, Default)]
pub struct InstrumentTable {
    profiles: Vec<InstrumentProfile>,
}

impl InstrumentTable {
    pub fn new(profiles: Vec<InstrumentProfile>) -> Result<Self, NewstraderError> {
        for (i, profile) in profiles.iter().enumerate() {
            profile.validate()?;
            if profiles[..i].iter().any(|p| p.symbol == profile.symbol) {
                return Err(NewstraderError::invalid(
                    "trading",
                    "instruments",
                    format!("duplicate instrument {}", profile.symbol),
                ));
            }
        }
        Ok(Self { profiles })
    }

    pub fn get(&self, symbol: &str) -> Result<&InstrumentProfile, NewstraderError> {
        self.profiles
            .iter()
            .find(|p| p.symbol == symbol)
            .ok_or_else(|| NewstraderError::UnknownInstrument {
                symbol: symbol.to_string(),
            })
    }

    pub fn iter(&self) -> impl Iterator<Item = &InstrumentProfile> {
        self.profiles.iter()
    }

    pub fn symbols(&self) -> Vec<&str> {
        self.profiles.iter().map(|p| p.symbol.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.profiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.profiles.is_empty()
    }
}

const COUNTRY_CURRENCIES: [(&str, &str); 12] = [
    ("US", "USD"),
    ("EU", "EUR"),
    ("EZ", "EUR"),
    ("DE", "EUR"),
    ("UK", "GBP"),
    ("GB", "GBP"),
    ("JP", "JPY"),
    ("AU", "AUD"),
    ("CA", "CAD"),
    ("CH", "CHF"),
    ("NZ", "NZD"),
    ("CN", "CNH"),
];

const METALS: [&str; 4] = ["XAU", "XAG", "XPT", "XPD"];

pub fn currency_for_country(country: &str) -> Option<&'static str> {
    COUNTRY_CURRENCIES
        .iter()
        .find(|(code, _)| code.eq_ignore_ascii_case(country))
        .map(|(_, currency)| *currency)
}

/// Currencies implied by a six-letter pair symbol such as `EURUSD`.
///
/// Metal legs are dropped, so `XAUUSD` yields only USD. Any other symbol
/// shape yields nothing and the instrument sees every event.
pub fn default_currencies(symbol: &str) -> Vec<String> {
    if symbol.len() != 6 || !symbol.chars().all(|c| c.is_ascii_alphabetic()) {
        return Vec::new();
    }
    let upper = symbol.to_uppercase();
    [&upper[..3], &upper[3..]]
        .into_iter()
        .filter(|leg| !METALS.contains(leg))
        .map(str::to_string)
        .collect()
}

/// Parses `USD:-0.9, SPX:0.3` into a factor map.
pub fn parse_correlations(input: &str) -> Result<BTreeMap<String, f64>, String> {
    let mut map = BTreeMap::new();
    for token in input.split(',') {
        let token = token.trim();
        if token.is_empty() {
            continue;
        }
        let (factor, value) = token
            .split_once(':')
            .ok_or_else(|| format!("expected FACTOR:COEFFICIENT, got '{token}'"))?;
        let factor = factor.trim().to_uppercase();
        if factor.is_empty() {
            return Err(format!("missing factor name in '{token}'"));
        }
        let value: f64 = value
            .trim()
            .parse()
            .map_err(|_| format!("invalid coefficient in '{token}'"))?;
        if map.insert(factor.clone(), value).is_some() {
            return Err(format!("duplicate factor {factor}"));
        }
    }
    Ok(map)
}
