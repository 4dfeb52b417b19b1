//! Economic calendar port trait.

use crate::domain::error::NewstraderError;
use crate::domain::event::{EconomicEvent, Importance};
use chrono::NaiveDateTime;

/// Window, countries and least importance of interest. An empty country
/// list matches all.
#[derive(Debug, Clone, PartialEq)]
pub struct EventFilter {
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
    pub countries: Vec<String>,
    pub min_importance: Importance,
}

impl EventFilter {
    pub fn matches(&self, event: &EconomicEvent) -> bool {
        event.scheduled >= self.start
            && event.scheduled <= self.end
            && event.importance >= self.min_importance
            && (self.countries.is_empty()
                || self
                    .countries
                    .iter()
                    .any(|c| c.eq_ignore_ascii_case(&event.country)))
    }
}

pub trait CalendarPort {
    /// Events inside the filter, oldest first. Empty means nothing to evaluate.
    fn upcoming_events(
        &self,
        filter: &EventFilter,
    ) -> Result<Vec<EconomicEvent>, NewstraderError>;
}
