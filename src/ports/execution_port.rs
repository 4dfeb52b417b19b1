//! Order execution port trait.

use crate::domain::decision::OrderIntent;
use crate::domain::error::NewstraderError;

/// Broker answer to one submission. A rejection is reported, never retried.
#[derive(Debug, Clone, PartialEq)]
pub struct ExecutionReport {
    pub accepted: bool,
    pub ticket: Option<u64>,
    pub rejection_reason: Option<String>,
}

impl ExecutionReport {
    pub fn accepted(ticket: u64) -> Self {
        Self {
            accepted: true,
            ticket: Some(ticket),
            rejection_reason: None,
        }
    }

    pub fn rejected(reason: impl Into<String>) -> Self {
        Self {
            accepted: false,
            ticket: None,
            rejection_reason: Some(reason.into()),
        }
    }
}

pub trait ExecutionPort {
    /// Err is reserved for transport failures; broker refusals come back as
    /// a rejected report.
    fn submit(&self, order: &OrderIntent) -> Result<ExecutionReport, NewstraderError>;

    fn account_equity(&self) -> Result<f64, NewstraderError>;
}
