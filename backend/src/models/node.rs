//! Node (obligation) model
//!
//! A node is one interest-bearing obligation being paid down. Each node has:
//! - Outstanding balance (mutated every period by the engine)
//! - Annualized accrual rate and minimum payment (fixed for the node's lifetime)
//! - Optional payment cadence and target date
//!
//! # Critical Invariants
//!
//! 1. `balance >= 0` at every period boundary: payments are capped at the
//!    outstanding balance
//! 2. A settled node (`balance == 0`) accrues nothing and receives nothing

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that can occur during node operations
#[derive(Debug, Clone, Error, PartialEq)]
pub enum NodeError {
    #[error("Payment amount must be non-negative and finite, got {amount}")]
    InvalidPayment { amount: f64 },
}

/// Payment frequency rule attached to a node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Cadence {
    /// Due on every period
    #[default]
    EveryPeriod,
    /// Due on even period indices only (2, 4, 6, ...)
    #[serde(alias = "alternate")]
    EveryOtherPeriod,
}

impl Cadence {
    /// Whether a node with this cadence is due on `period` (1-based)
    ///
    /// # Example
    /// ```
    /// use repayment_simulator_core_rs::Cadence;
    ///
    /// assert!(Cadence::EveryPeriod.is_due(1));
    /// assert!(!Cadence::EveryOtherPeriod.is_due(1));
    /// assert!(Cadence::EveryOtherPeriod.is_due(2));
    /// ```
    pub fn is_due(self, period: usize) -> bool {
        match self {
            Cadence::EveryPeriod => true,
            Cadence::EveryOtherPeriod => period % 2 == 0,
        }
    }
}

/// One obligation in the ledger
///
/// # Example
/// ```
/// use repayment_simulator_core_rs::Node;
///
/// let mut node = Node::new("NODE_A".to_string(), 1200.0, 0.12, 100.0);
/// let accrued = node.accrue(12);
/// assert!((accrued - 12.0).abs() < 1e-9);
///
/// let paid = node.pay(5000.0).unwrap();
/// assert!((paid - 1212.0).abs() < 1e-9);
/// assert!(node.is_settled());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    /// Unique node identifier (e.g., "NODE_A")
    id: String,

    /// Outstanding amount; zero is the terminal state
    balance: f64,

    /// Annualized accrual rate (0.15 = 15% per year)
    accrual_rate: f64,

    /// Paid before any avalanche distribution when the node is due
    min_payment: f64,

    cadence: Cadence,

    /// Only used by the post-run audit
    target_date: Option<NaiveDate>,
}

impl Node {
    /// Create a node due every period with no target date
    pub fn new(id: String, balance: f64, accrual_rate: f64, min_payment: f64) -> Self {
        Self {
            id,
            balance,
            accrual_rate,
            min_payment,
            cadence: Cadence::EveryPeriod,
            target_date: None,
        }
    }

    pub fn with_cadence(mut self, cadence: Cadence) -> Self {
        self.cadence = cadence;
        self
    }

    pub fn with_target_date(mut self, target_date: Option<NaiveDate>) -> Self {
        self.target_date = target_date;
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn balance(&self) -> f64 {
        self.balance
    }

    pub fn accrual_rate(&self) -> f64 {
        self.accrual_rate
    }

    pub fn min_payment(&self) -> f64 {
        self.min_payment
    }

    pub fn cadence(&self) -> Cadence {
        self.cadence
    }

    pub fn target_date(&self) -> Option<NaiveDate> {
        self.target_date
    }

    /// Whether the node has been fully paid down
    pub fn is_settled(&self) -> bool {
        self.balance <= 0.0
    }

    /// Apply one period of accrual and return the amount added
    ///
    /// Settled nodes accrue nothing.
    pub fn accrue(&mut self, periods_per_year: u32) -> f64 {
        if self.is_settled() {
            return 0.0;
        }
        let amount = self.balance * self.accrual_rate / f64::from(periods_per_year);
        self.balance += amount;
        amount
    }

    /// Pay up to `amount` against the balance and return what was actually paid
    ///
    /// The payment is capped at the outstanding balance, so the balance never
    /// goes negative.
    ///
    /// # Errors
    /// Returns `NodeError::InvalidPayment` for negative or non-finite amounts.
    pub fn pay(&mut self, amount: f64) -> Result<f64, NodeError> {
        if !amount.is_finite() || amount < 0.0 {
            return Err(NodeError::InvalidPayment { amount });
        }
        let paid = amount.min(self.balance.max(0.0));
        self.balance -= paid;
        Ok(paid)
    }

    /// Overwrite the balance when restoring from a checkpoint
    pub(crate) fn restore_balance(&mut self, balance: f64) {
        self.balance = balance;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pay_exact_balance_leaves_zero() {
        let mut node = Node::new("N".to_string(), 250.5, 0.0, 0.0);
        let paid = node.pay(250.5).unwrap();
        assert_eq!(paid, 250.5);
        assert_eq!(node.balance(), 0.0);
    }

    #[test]
    fn test_settled_node_does_not_accrue() {
        let mut node = Node::new("N".to_string(), 0.0, 0.5, 10.0);
        assert_eq!(node.accrue(12), 0.0);
        assert_eq!(node.balance(), 0.0);
    }
}
