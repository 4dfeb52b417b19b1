//! One analysis cycle over the configured instruments.
//!
//! The calendar is read once per cycle. Each instrument is then analysed on
//! its own: a data failure halts that instrument only, and at most one order
//! per instrument is submitted. Events whose country does not touch one of
//! the instrument's currencies are ignored for that instrument. Executor
//! rejections are reported verbatim and never retried.

use crate::domain::decision::{decide, Decision, NoTradeReason, OrderIntent, TradingParams};
use crate::domain::error::NewstraderError;
use crate::domain::event::{
    combine_impacts, score_event, EconomicEvent, ImpactAssessment, Importance,
};
use crate::domain::indicator_helpers::analyze_series;
use crate::domain::instrument::{InstrumentProfile, InstrumentTable};
use crate::domain::market_state::{classify, MarketState};
use crate::domain::ohlcv::BarSeries;
use crate::ports::calendar_port::{CalendarPort, EventFilter};
use crate::ports::execution_port::ExecutionPort;
use crate::ports::market_data_port::{MarketDataPort, Timeframe};
use chrono::{Duration, NaiveDateTime};
use std::fmt;

/// Label used for the evaluation when events are combined.
pub const COMBINED_LABEL: &str = "combined events";

#[derive(Debug, Clone, PartialEq)]
pub struct CycleSettings {
    pub timeframe: Timeframe,
    pub bar_count: usize,
    pub lookback_hours: i64,
    pub lookahead_hours: i64,
    /// Empty means every country.
    pub countries: Vec<String>,
    /// Events below this importance are not read.
    pub min_importance: Importance,
    /// Fold all events into one impact instead of evaluating each.
    pub combine_events: bool,
    /// Decide but never submit.
    pub dry_run: bool,
}

impl CycleSettings {
    /// Calendar window around `now`. Offsets past the representable range
    /// saturate at the earliest or latest timestamp.
    pub fn event_filter(&self, now: NaiveDateTime) -> EventFilter {
        let start = Duration::try_hours(self.lookback_hours)
            .and_then(|d| now.checked_sub_signed(d))
            .unwrap_or(NaiveDateTime::MIN);
        let end = Duration::try_hours(self.lookahead_hours)
            .and_then(|d| now.checked_add_signed(d))
            .unwrap_or(NaiveDateTime::MAX);
        EventFilter {
            start,
            end,
            countries: self.countries.clone(),
            min_importance: self.min_importance,
        }
    }
}

/// The ports one cycle talks to.
pub struct CyclePorts<'a> {
    pub market: &'a dyn MarketDataPort,
    pub calendar: &'a dyn CalendarPort,
    pub executor: &'a dyn ExecutionPort,
}

/// One event (or the combined set) scored and decided for an instrument.
#[derive(Debug, Clone, PartialEq)]
pub struct EventEvaluation {
    pub event: String,
    pub impact: ImpactAssessment,
    pub decision: Decision,
}

#[derive(Debug, Clone, PartialEq)]
pub enum InstrumentOutcome {
    /// Not enough history to classify.
    Skipped { reason: String },
    /// Port or data failure for this instrument.
    Failed { reason: String },
    NoEvents,
    NoTrade { reason: NoTradeReason },
    /// Dry run: the order that would have been sent.
    Planned { order: OrderIntent },
    Submitted { order: OrderIntent, ticket: Option<u64> },
    Rejected { order: OrderIntent, reason: String },
}

#[derive(Debug, Clone, PartialEq)]
pub struct InstrumentReport {
    pub symbol: String,
    pub state: Option<MarketState>,
    pub evaluations: Vec<EventEvaluation>,
    pub outcome: InstrumentOutcome,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CycleReport {
    pub at: NaiveDateTime,
    pub events: usize,
    pub instruments: Vec<InstrumentReport>,
}

impl CycleReport {
    pub fn submitted(&self) -> usize {
        self.instruments
            .iter()
            .filter(|r| matches!(r.outcome, InstrumentOutcome::Submitted { .. }))
            .count()
    }

    pub fn failed(&self) -> usize {
        self.instruments
            .iter()
            .filter(|r| matches!(r.outcome, InstrumentOutcome::Failed { .. }))
            .count()
    }
}

/// Runs one cycle. Errors only when the calendar or the account equity
/// cannot be read; everything else is reported per instrument.
pub fn run_cycle(
    ports: &CyclePorts<'_>,
    instruments: &InstrumentTable,
    params: &TradingParams,
    settings: &CycleSettings,
    now: NaiveDateTime,
) -> Result<CycleReport, NewstraderError> {
    let filter = settings.event_filter(now);
    let events = ports.calendar.upcoming_events(&filter)?;
    let equity = ports.executor.account_equity()?;
    log::info!(
        "cycle at {}: {} instruments, {} events, equity {:.2}",
        now,
        instruments.len(),
        events.len(),
        equity
    );

    let reports = instruments
        .iter()
        .map(|profile| {
            let report = evaluate_instrument(ports, profile, &events, equity, params, settings);
            log_outcome(&report);
            report
        })
        .collect();

    Ok(CycleReport {
        at: now,
        events: events.len(),
        instruments: reports,
    })
}

pub fn evaluate_instrument(
    ports: &CyclePorts<'_>,
    profile: &InstrumentProfile,
    events: &[EconomicEvent],
    equity: f64,
    params: &TradingParams,
    settings: &CycleSettings,
) -> InstrumentReport {
    let mut report = InstrumentReport {
        symbol: profile.symbol.clone(),
        state: None,
        evaluations: Vec::new(),
        outcome: InstrumentOutcome::NoEvents,
    };

    let state = match load_state(ports.market, profile, settings) {
        Ok(state) => state,
        Err(err @ NewstraderError::InsufficientData { .. }) => {
            report.outcome = InstrumentOutcome::Skipped {
                reason: err.to_string(),
            };
            return report;
        }
        Err(err) => {
            report.outcome = InstrumentOutcome::Failed {
                reason: err.to_string(),
            };
            return report;
        }
    };
    log::debug!("{} state: {}", profile.symbol, state);
    report.state = Some(state.clone());

    let relevant: Vec<EconomicEvent> = events
        .iter()
        .filter(|event| profile.is_relevant(event))
        .cloned()
        .collect();
    if relevant.is_empty() {
        return report;
    }

    let quote = match ports.market.quote(&profile.symbol) {
        Ok(q) => q,
        Err(err) => {
            report.outcome = InstrumentOutcome::Failed {
                reason: err.to_string(),
            };
            return report;
        }
    };

    for (label, impact) in candidate_impacts(&relevant, profile, settings.combine_events) {
        let decision = decide(&state, &impact, profile, &quote, equity, params);
        let order = decision.order().cloned();
        report.evaluations.push(EventEvaluation {
            event: label,
            impact,
            decision,
        });
        if let Some(order) = order {
            report.outcome = execute(ports.executor, order, settings.dry_run);
            return report;
        }
    }

    if let Some(reason) = strongest_rejection(&report.evaluations) {
        report.outcome = InstrumentOutcome::NoTrade { reason };
    }
    report
}

fn load_state(
    market: &dyn MarketDataPort,
    profile: &InstrumentProfile,
    settings: &CycleSettings,
) -> Result<MarketState, NewstraderError> {
    let bars = market.fetch_bars(&profile.symbol, settings.timeframe, settings.bar_count)?;
    let series = BarSeries::new(profile.symbol.as_str(), bars)?;
    let row = analyze_series(&series)?;
    Ok(classify(&row))
}

/// Per-event impacts in calendar order, or the single combined impact.
fn candidate_impacts(
    events: &[EconomicEvent],
    profile: &InstrumentProfile,
    combine: bool,
) -> Vec<(String, ImpactAssessment)> {
    let scored = events
        .iter()
        .map(|event| (event.name.clone(), score_event(event, profile)));
    if combine {
        let impacts: Vec<ImpactAssessment> = scored.map(|(_, impact)| impact).collect();
        vec![(COMBINED_LABEL.to_string(), combine_impacts(&impacts))]
    } else {
        scored.collect()
    }
}

fn strongest_rejection(evaluations: &[EventEvaluation]) -> Option<NoTradeReason> {
    evaluations
        .iter()
        .filter(|e| e.decision.reason().is_some())
        .max_by(|a, b| a.impact.strength.total_cmp(&b.impact.strength))
        .and_then(|e| e.decision.reason().cloned())
}

fn execute(executor: &dyn ExecutionPort, order: OrderIntent, dry_run: bool) -> InstrumentOutcome {
    if dry_run {
        return InstrumentOutcome::Planned { order };
    }
    match executor.submit(&order) {
        Ok(report) if report.accepted => InstrumentOutcome::Submitted {
            order,
            ticket: report.ticket,
        },
        Ok(report) => InstrumentOutcome::Rejected {
            order,
            reason: report
                .rejection_reason
                .unwrap_or_else(|| "rejected without reason".to_string()),
        },
        Err(err) => InstrumentOutcome::Failed {
            reason: err.to_string(),
        },
    }
}

fn log_outcome(report: &InstrumentReport) {
    match &report.outcome {
        InstrumentOutcome::Failed { .. } | InstrumentOutcome::Rejected { .. } => {
            log::warn!("{}: {}", report.symbol, report.outcome)
        }
        InstrumentOutcome::Skipped { .. } | InstrumentOutcome::NoEvents => {
            log::debug!("{}: {}", report.symbol, report.outcome)
        }
        _ => log::info!("{}: {}", report.symbol, report.outcome),
    }
}

impl fmt::Display for InstrumentOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InstrumentOutcome::Skipped { reason } => write!(f, "skipped: {}", reason),
            InstrumentOutcome::Failed { reason } => write!(f, "failed: {}", reason),
            InstrumentOutcome::NoEvents => write!(f, "no events"),
            InstrumentOutcome::NoTrade { reason } => write!(f, "no trade: {}", reason),
            InstrumentOutcome::Planned { order } => write!(f, "planned {}", order),
            InstrumentOutcome::Submitted { order, ticket } => match ticket {
                Some(t) => write!(f, "submitted #{} {}", t, order),
                None => write!(f, "submitted {}", order),
            },
            InstrumentOutcome::Rejected { order, reason } => {
                write!(f, "rejected {}: {}", order, reason)
            }
        }
    }
}
