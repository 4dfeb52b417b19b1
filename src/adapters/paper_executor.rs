//! In-memory order executor for dry runs and tests.
//!
//! Accepts well-formed orders, assigns sequential tickets and keeps every
//! accepted order. Nothing leaves the process.

use crate::domain::decision::OrderIntent;
use crate::domain::direction::Direction;
use crate::domain::error::NewstraderError;
use crate::ports::execution_port::{ExecutionPort, ExecutionReport};
use std::cell::RefCell;

pub struct PaperExecutor {
    equity: f64,
    orders: RefCell<Vec<OrderIntent>>,
}

impl PaperExecutor {
    pub fn new(equity: f64) -> Self {
        Self {
            equity,
            orders: RefCell::new(Vec::new()),
        }
    }

    pub fn orders(&self) -> Vec<OrderIntent> {
        self.orders.borrow().clone()
    }

    fn check(order: &OrderIntent) -> Result<(), String> {
        if !(order.volume > 0.0) {
            return Err(format!("invalid volume {}", order.volume));
        }
        let levels_ok = match order.direction {
            Direction::Buy => {
                order.stop_loss < order.entry_price && order.entry_price < order.take_profit
            }
            Direction::Sell => {
                order.stop_loss > order.entry_price && order.entry_price > order.take_profit
            }
            Direction::Neutral => return Err("order has no direction".to_string()),
        };
        if !levels_ok {
            return Err(format!(
                "invalid stops for {}: sl={} entry={} tp={}",
                order.direction, order.stop_loss, order.entry_price, order.take_profit
            ));
        }
        Ok(())
    }
}

impl ExecutionPort for PaperExecutor {
    fn submit(&self, order: &OrderIntent) -> Result<ExecutionReport, NewstraderError> {
        if let Err(reason) = Self::check(order) {
            log::warn!("paper executor rejected {}: {}", order.symbol, reason);
            return Ok(ExecutionReport::rejected(reason));
        }
        let mut orders = self.orders.borrow_mut();
        orders.push(order.clone());
        let ticket = orders.len() as u64;
        log::info!("paper order #{} filled: {}", ticket, order);
        Ok(ExecutionReport::accepted(ticket))
    }

    fn account_equity(&self) -> Result<f64, NewstraderError> {
        Ok(self.equity)
    }
}
