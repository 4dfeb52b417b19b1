//! Trade decision: fuses market state and event impact into an order intent.
//!
//! Checks run in a fixed order and the first failure is reported:
//! impact strength, directional agreement, spread, then sizing.

use crate::domain::direction::Direction;
use crate::domain::event::ImpactAssessment;
use crate::domain::instrument::InstrumentProfile;
use crate::domain::market_state::{MacdSignal, MarketState, Trend};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TradingParams {
    /// Fraction of equity at risk per trade.
    pub risk_percent: f64,
    pub min_impact_strength: f64,
    pub stop_atr_multiple: f64,
    /// Target distance as a multiple of stop distance.
    pub reward_risk: f64,
}

impl Default for TradingParams {
    fn default() -> Self {
        Self {
            risk_percent: 0.02,
            min_impact_strength: 0.6,
            stop_atr_multiple: 2.0,
            reward_risk: 2.0,
        }
    }
}

/// Live prices for one instrument. `spread` is in points.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Quote {
    pub bid: f64,
    pub ask: f64,
    pub spread: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct OrderIntent {
    pub symbol: String,
    pub direction: Direction,
    pub volume: f64,
    pub entry_price: f64,
    pub stop_loss: f64,
    pub take_profit: f64,
    pub hold_hours: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub enum NoTradeReason {
    WeakImpact {
        strength: f64,
        threshold: f64,
    },
    ConflictingSignals {
        impact: Direction,
        trend: Trend,
        macd: MacdSignal,
    },
    SpreadTooHigh {
        spread: f64,
        max_spread: f64,
    },
    PositionTooSmall {
        volume: f64,
        base_volume: f64,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub enum Decision {
    Trade(OrderIntent),
    NoTrade(NoTradeReason),
}

impl Decision {
    pub fn order(&self) -> Option<&OrderIntent> {
        match self {
            Decision::Trade(order) => Some(order),
            Decision::NoTrade(_) => None,
        }
    }

    pub fn reason(&self) -> Option<&NoTradeReason> {
        match self {
            Decision::Trade(_) => None,
            Decision::NoTrade(reason) => Some(reason),
        }
    }
}

pub fn decide(
    state: &MarketState,
    impact: &ImpactAssessment,
    profile: &InstrumentProfile,
    quote: &Quote,
    equity: f64,
    params: &TradingParams,
) -> Decision {
    // NaN and negative strengths fall through to the rejection.
    if !(impact.strength >= params.min_impact_strength && impact.strength >= 0.0) {
        return Decision::NoTrade(NoTradeReason::WeakImpact {
            strength: impact.strength,
            threshold: params.min_impact_strength,
        });
    }

    let direction = match agreed_direction(impact.direction, state.trend, state.macd_signal) {
        Some(d) => d,
        None => {
            return Decision::NoTrade(NoTradeReason::ConflictingSignals {
                impact: impact.direction,
                trend: state.trend,
                macd: state.macd_signal,
            });
        }
    };

    if !(quote.spread <= profile.max_spread) {
        return Decision::NoTrade(NoTradeReason::SpreadTooHigh {
            spread: quote.spread,
            max_spread: profile.max_spread,
        });
    }

    let stop_distance = params.stop_atr_multiple * state.atr;
    let volume = position_volume(equity, params.risk_percent, stop_distance, profile);
    if !(volume > 0.0) {
        return Decision::NoTrade(NoTradeReason::PositionTooSmall {
            volume,
            base_volume: profile.base_volume,
        });
    }

    let target_distance = params.reward_risk * stop_distance;
    let (entry_price, stop_loss, take_profit) = match direction {
        Direction::Buy => (
            quote.ask,
            quote.ask - stop_distance,
            quote.ask + target_distance,
        ),
        _ => (
            quote.bid,
            quote.bid + stop_distance,
            quote.bid - target_distance,
        ),
    };

    Decision::Trade(OrderIntent {
        symbol: profile.symbol.clone(),
        direction,
        volume,
        entry_price,
        stop_loss,
        take_profit,
        hold_hours: impact.hold_hours,
    })
}

/// Buy or Sell when all three agree; None otherwise (Neutral never agrees).
pub fn agreed_direction(impact: Direction, trend: Trend, macd: MacdSignal) -> Option<Direction> {
    let trend = trend.direction();
    let macd = macd.direction();
    if impact != Direction::Neutral && impact == trend && trend == macd {
        Some(impact)
    } else {
        None
    }
}

/// Volume risking `risk_percent` of equity over `stop_distance`, rounded
/// down to the instrument's volume step. Zero when nothing can be sized.
pub fn position_volume(
    equity: f64,
    risk_percent: f64,
    stop_distance: f64,
    profile: &InstrumentProfile,
) -> f64 {
    let risk_budget = equity * risk_percent;
    let loss_per_volume = stop_distance * profile.contract_size;
    if !(risk_budget > 0.0 && loss_per_volume > 0.0) {
        return 0.0;
    }
    let raw = risk_budget / loss_per_volume;
    // The small nudge keeps exact multiples from flooring one step short.
    let steps = (raw / profile.base_volume + 1e-9).floor();
    steps * profile.base_volume
}

impl fmt::Display for NoTradeReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NoTradeReason::WeakImpact {
                strength,
                threshold,
            } => write!(f, "impact too weak ({:.2} < {:.2})", strength, threshold),
            NoTradeReason::ConflictingSignals { impact, trend, macd } => write!(
                f,
                "conflicting signals (impact {}, trend {}, macd {})",
                impact, trend, macd
            ),
            NoTradeReason::SpreadTooHigh { spread, max_spread } => {
                write!(f, "spread too high ({} > {})", spread, max_spread)
            }
            NoTradeReason::PositionTooSmall {
                volume,
                base_volume,
            } => write!(
                f,
                "position too small ({} below step {})",
                volume, base_volume
            ),
        }
    }
}

impl fmt::Display for OrderIntent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {} @ {} sl={} tp={}",
            self.direction,
            self.volume,
            self.symbol,
            self.entry_price,
            self.stop_loss,
            self.take_profit
        )
    }
}
