//! Equal-weight dollar allocation over the selected slots of a scorecard.

use crate::domain::error::FaaError;
use crate::domain::scoring::{MetricRecord, Scorecard};

/// Key used for literal, zero-return cash.
pub const CASH_KEY: &str = "CASH";

/// Where a selected slot's money actually goes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Placement {
    Symbol(String),
    CashProxy(String),
    Cash,
}

impl Placement {
    pub fn for_record(record: &MetricRecord, cash_proxy: &str) -> Self {
        if record.hold_cash {
            Placement::Cash
        } else if record.cash_replacement {
            Placement::CashProxy(cash_proxy.to_string())
        } else {
            Placement::Symbol(record.symbol.clone())
        }
    }

    /// The instrument held, or `None` for literal cash.
    pub fn instrument(&self) -> Option<&str> {
        match self {
            Placement::Symbol(s) | Placement::CashProxy(s) => Some(s),
            Placement::Cash => None,
        }
    }

    pub fn key(&self) -> &str {
        self.instrument().unwrap_or(CASH_KEY)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AllocationLine {
    pub key: String,
    pub amount: f64,
}

/// Dollar amounts per effective position, in first-appearance order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Allocation {
    pub lines: Vec<AllocationLine>,
}

impl Allocation {
    pub fn get(&self, key: &str) -> Option<f64> {
        self.lines.iter().find(|l| l.key == key).map(|l| l.amount)
    }

    pub fn total(&self) -> f64 {
        self.lines.iter().map(|l| l.amount).sum()
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

/// Placements of every selected slot, in universe order. Collapsed slots
/// appear once per slot.
pub fn placements(scorecard: &Scorecard) -> Vec<Placement> {
    scorecard
        .selected()
        .map(|r| Placement::for_record(r, &scorecard.cash_proxy))
        .collect()
}

/// Splits `amount` equally across the selected slots and sums slots that
/// collapse onto the same position. Amounts are rounded to cents after
/// summing.
pub fn allocate(scorecard: &Scorecard, amount: f64) -> Result<Allocation, FaaError> {
    if !amount.is_finite() || amount <= 0.0 {
        return Err(FaaError::InvalidAmount { amount });
    }

    let slots = placements(scorecard);
    if slots.is_empty() {
        return Err(FaaError::NoSelection);
    }

    let per_slot = amount / slots.len() as f64;
    let mut lines: Vec<AllocationLine> = Vec::new();
    for placement in &slots {
        let key = placement.key();
        match lines.iter_mut().find(|l| l.key == key) {
            Some(line) => line.amount += per_slot,
            None => lines.push(AllocationLine {
                key: key.to_string(),
                amount: per_slot,
            }),
        }
    }

    for line in &mut lines {
        line.amount = round_cents(line.amount);
    }

    Ok(Allocation { lines })
}

fn round_cents(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
