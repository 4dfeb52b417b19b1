//! CSV economic calendar adapter.
//!
//! Columns: `name,country,scheduled,actual,forecast[,importance]`. Empty
//! `actual` or `forecast` cells mean the value is not known yet. A missing
//! or empty `importance` cell reads as high.

use crate::adapters::csv_market_data_adapter::TIMESTAMP_FORMAT;
use crate::domain::error::NewstraderError;
use crate::domain::event::{EconomicEvent, Importance};
use crate::ports::calendar_port::{CalendarPort, EventFilter};
use chrono::NaiveDateTime;
use csv::StringRecord;
use std::fs;
use std::path::PathBuf;

pub struct CsvCalendarAdapter {
    path: PathBuf,
}

impl CsvCalendarAdapter {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    fn parse_record(
        &self,
        record: &StringRecord,
        line: usize,
    ) -> Result<EconomicEvent, NewstraderError> {
        let cell = |index: usize| record.get(index).map(str::trim).unwrap_or("");
        let error = |reason: String| NewstraderError::Calendar {
            reason: format!("{} line {}: {}", self.path.display(), line, reason),
        };

        let name = cell(0);
        if name.is_empty() {
            return Err(error("missing event name".into()));
        }
        let scheduled = NaiveDateTime::parse_from_str(cell(2), TIMESTAMP_FORMAT)
            .map_err(|e| error(format!("invalid scheduled time '{}': {}", cell(2), e)))?;
        let optional = |index: usize, label: &str| -> Result<Option<f64>, NewstraderError> {
            let raw = cell(index);
            if raw.is_empty() {
                return Ok(None);
            }
            raw.parse()
                .map(Some)
                .map_err(|_| error(format!("invalid {} value '{}'", label, raw)))
        };

        let importance = match cell(5) {
            "" => Importance::default(),
            raw => raw.parse::<Importance>().map_err(error)?,
        };

        Ok(EconomicEvent {
            name: name.to_string(),
            country: cell(1).to_string(),
            importance,
            scheduled,
            actual: optional(3, "actual")?,
            forecast: optional(4, "forecast")?,
        })
    }
}

impl CalendarPort for CsvCalendarAdapter {
    fn upcoming_events(
        &self,
        filter: &EventFilter,
    ) -> Result<Vec<EconomicEvent>, NewstraderError> {
        let content = fs::read_to_string(&self.path).map_err(|e| NewstraderError::Calendar {
            reason: format!("failed to read {}: {}", self.path.display(), e),
        })?;

        let mut rdr = csv::ReaderBuilder::new()
            .flexible(true)
            .from_reader(content.as_bytes());
        let mut events = Vec::new();

        for (i, result) in rdr.records().enumerate() {
            let record = result.map_err(|e| NewstraderError::Calendar {
                reason: format!("CSV parse error: {}", e),
            })?;
            // +2: header line and 1-based numbering
            let event = self.parse_record(&record, i + 2)?;
            if filter.matches(&event) {
                events.push(event);
            }
        }

        events.sort_by_key(|e| e.scheduled);
        log::debug!(
            "{} calendar events between {} and {}",
            events.len(),
            filter.start,
            filter.end
        );
        Ok(events)
    }
}
