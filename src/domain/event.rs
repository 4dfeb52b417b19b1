//! Economic event classification and impact scoring.
//!
//! An event name is matched against an ordered rule table (first match
//! wins). The matched category decides which macro factor drives the impact
//! and how sharply the surprise is scaled. The base impact is then adjusted
//! per instrument by its correlation to that factor.
//!
//! Scheduled importance scales the result: a low-importance release moves
//! strength less than a high one with the same surprise.

use crate::domain::direction::Direction;
use crate::domain::instrument::InstrumentProfile;
use chrono::NaiveDateTime;
use std::fmt;
use std::str::FromStr;

pub const DEFAULT_HOLD_HOURS: u32 = 24;

/// Floor for the surprise denominator when the forecast is zero.
pub const SURPRISE_EPSILON: f64 = 1e-6;

/// Calendar importance, ordered Low < Medium < High.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub enum Importance {
    Low,
    Medium,
    #[default]
    High,
}

impl Importance {
    /// Multiplier applied to the impact strength.
    pub fn weight(self) -> f64 {
        match self {
            Importance::Low => 0.3,
            Importance::Medium => 0.6,
            Importance::High => 1.0,
        }
    }
}

impl FromStr for Importance {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "low" => Ok(Importance::Low),
            "medium" => Ok(Importance::Medium),
            "high" => Ok(Importance::High),
            other => Err(format!("unknown importance '{other}'")),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct EconomicEvent {
    pub name: String,
    /// Country or currency code as the calendar reports it ("US", "EUR").
    pub country: String,
    pub importance: Importance,
    pub actual: Option<f64>,
    pub forecast: Option<f64>,
    pub scheduled: NaiveDateTime,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventCategory {
    RatePolicy,
    Inflation,
    EconomicHealth,
}

/// How one category is recognised and scored.
#[derive(Debug, Clone, Copy)]
pub struct CategoryRule {
    pub category: EventCategory,
    pub keywords: &'static [&'static str],
    pub factor: &'static str,
    /// Multiplier from normalized surprise to strength before clamping.
    pub sensitivity: f64,
    pub hold_hours: u32,
}

/// Evaluated top to bottom.
pub const CATEGORY_RULES: [CategoryRule; 3] = [
    CategoryRule {
        category: EventCategory::RatePolicy,
        keywords: &["fed", "fomc"],
        factor: "USD",
        sensitivity: 10.0,
        hold_hours: 48,
    },
    CategoryRule {
        category: EventCategory::Inflation,
        keywords: &["cpi", "pce"],
        factor: "USD",
        sensitivity: 4.5,
        hold_hours: DEFAULT_HOLD_HOURS,
    },
    CategoryRule {
        category: EventCategory::EconomicHealth,
        keywords: &["pmi"],
        factor: "SPX",
        sensitivity: 25.0,
        hold_hours: DEFAULT_HOLD_HOURS,
    },
];

impl EventCategory {
    pub fn rule(self) -> &'static CategoryRule {
        match self {
            EventCategory::RatePolicy => &CATEGORY_RULES[0],
            EventCategory::Inflation => &CATEGORY_RULES[1],
            EventCategory::EconomicHealth => &CATEGORY_RULES[2],
        }
    }
}

pub fn classify_event(name: &str) -> Option<EventCategory> {
    let lower = name.to_lowercase();
    CATEGORY_RULES
        .iter()
        .find(|rule| rule.keywords.iter().any(|k| lower.contains(k)))
        .map(|rule| rule.category)
}

#[derive(Debug, Clone, PartialEq)]
pub struct ImpactAssessment {
    pub direction: Direction,
    /// Non-negative; a negative value is invalid and never trades.
    pub strength: f64,
    pub hold_hours: u32,
    pub category: Option<EventCategory>,
    /// (actual - forecast) / max(|forecast|, ε), when both were known.
    pub surprise: Option<f64>,
}

impl ImpactAssessment {
    pub fn neutral() -> Self {
        Self {
            direction: Direction::Neutral,
            strength: 0.0,
            hold_hours: DEFAULT_HOLD_HOURS,
            category: None,
            surprise: None,
        }
    }

    pub fn is_actionable(&self) -> bool {
        self.direction != Direction::Neutral && self.strength > 0.0
    }
}

pub fn normalized_surprise(actual: f64, forecast: f64) -> f64 {
    (actual - forecast) / forecast.abs().max(SURPRISE_EPSILON)
}

/// Impact of an event on its driving factor, before any instrument view.
///
/// A beat is bullish for the factor in every category: hawkish rates and hot
/// inflation lift USD, a strong PMI lifts equities. Strength is the clamped
/// scaled surprise times the importance weight.
pub fn base_impact(event: &EconomicEvent) -> ImpactAssessment {
    let category = match classify_event(&event.name) {
        Some(c) => c,
        None => return ImpactAssessment::neutral(),
    };
    let rule = category.rule();
    let mut impact = ImpactAssessment {
        hold_hours: rule.hold_hours,
        category: Some(category),
        ..ImpactAssessment::neutral()
    };

    let (actual, forecast) = match (event.actual, event.forecast) {
        (Some(a), Some(f)) if a.is_finite() && f.is_finite() => (a, f),
        _ => return impact,
    };

    let surprise = normalized_surprise(actual, forecast);
    impact.surprise = Some(surprise);
    impact.direction = if surprise > 0.0 {
        Direction::Buy
    } else if surprise < 0.0 {
        Direction::Sell
    } else {
        return impact;
    };
    impact.strength =
        (surprise.abs() * rule.sensitivity).clamp(0.0, 1.0) * event.importance.weight();
    impact
}

/// Re-expresses a factor impact for an instrument.
///
/// A missing or zero coefficient leaves the impact unchanged. A negative one
/// flips the direction. Strength is scaled by |coefficient|.
pub fn adjust_for_correlation(
    impact: &ImpactAssessment,
    coefficient: Option<f64>,
) -> ImpactAssessment {
    let coefficient = match coefficient {
        Some(c) if c != 0.0 => c,
        _ => return impact.clone(),
    };
    if impact.direction == Direction::Neutral {
        return impact.clone();
    }

    let direction = if coefficient < 0.0 {
        impact.direction.flipped()
    } else {
        impact.direction
    };
    ImpactAssessment {
        direction,
        strength: impact.strength * coefficient.abs(),
        ..impact.clone()
    }
}

/// Scores one event for one instrument.
pub fn score_event(event: &EconomicEvent, profile: &InstrumentProfile) -> ImpactAssessment {
    let base = base_impact(event);
    let coefficient = base
        .category
        .and_then(|c| profile.correlation(c.rule().factor));
    adjust_for_correlation(&base, coefficient)
}

/// Folds several impacts on one instrument into one.
///
/// Signed strengths are summed and squashed with `tanh`. Neutral inputs are
/// ignored; the result is neutral if nothing remains or the sum is zero.
pub fn combine_impacts(impacts: &[ImpactAssessment]) -> ImpactAssessment {
    let relevant: Vec<&ImpactAssessment> =
        impacts.iter().filter(|i| i.is_actionable()).collect();
    if relevant.is_empty() {
        return ImpactAssessment::neutral();
    }

    let total: f64 = relevant
        .iter()
        .map(|i| i.direction.sign() * i.strength)
        .sum();
    let squashed = total.tanh();
    let direction = if squashed > 0.0 {
        Direction::Buy
    } else if squashed < 0.0 {
        Direction::Sell
    } else {
        return ImpactAssessment::neutral();
    };

    let category = relevant[0].category;
    let same_category = relevant.iter().all(|i| i.category == category);

    ImpactAssessment {
        direction,
        strength: squashed.abs(),
        hold_hours: relevant
            .iter()
            .map(|i| i.hold_hours)
            .max()
            .unwrap_or(DEFAULT_HOLD_HOURS),
        category: if same_category { category } else { None },
        surprise: None,
    }
}

impl fmt::Display for Importance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Importance::Low => write!(f, "low"),
            Importance::Medium => write!(f, "medium"),
            Importance::High => write!(f, "high"),
        }
    }
}

impl fmt::Display for EventCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EventCategory::RatePolicy => write!(f, "rate policy"),
            EventCategory::Inflation => write!(f, "inflation"),
            EventCategory::EconomicHealth => write!(f, "economic health"),
        }
    }
}
