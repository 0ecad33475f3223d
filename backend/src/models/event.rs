//! Event logging for simulation auditing.
//!
//! This module defines the Event enum which captures every balance change
//! during a run. Events enable:
//! - Auditing (verify the avalanche order was respected)
//! - Conservation checks (payments versus accrual per node)
//! - Debugging (understand what happened and when)
//!
//! # Example
//!
//! ```rust
//! use repayment_simulator_core_rs::Event;
//!
//! let event = Event::AvalanchePayment {
//!     period: 3,
//!     node_id: "NODE_A".to_string(),
//!     amount: 4_500.0,
//! };
//!
//! assert_eq!(event.period(), 3);
//! assert_eq!(event.node_id(), Some("NODE_A"));
//! ```

use serde::{Deserialize, Serialize};

/// Simulation event capturing a state change.
///
/// Events are logged in the order they occur within a period.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event_type", rename_all = "snake_case")]
pub enum Event {
    /// Accrual added to a node's balance
    Accrual {
        period: usize,
        node_id: String,
        amount: f64,
    },

    /// Minimum payment applied to a due node
    MinimumPayment {
        period: usize,
        node_id: String,
        amount: f64,
    },

    /// Leftover capacity directed to a node
    AvalanchePayment {
        period: usize,
        node_id: String,
        amount: f64,
    },

    /// Node balance reached zero
    NodeCleared { period: usize, node_id: String },

    /// Every node settled
    RunCompleted { period: usize, total_accrual: f64 },

    /// Safety bound reached with balance outstanding
    RunAborted {
        period: usize,
        remaining_balance: f64,
    },
}

impl Event {
    /// Period the event occurred in
    pub fn period(&self) -> usize {
        match self {
            Event::Accrual { period, .. }
            | Event::MinimumPayment { period, .. }
            | Event::AvalanchePayment { period, .. }
            | Event::NodeCleared { period, .. }
            | Event::RunCompleted { period, .. }
            | Event::RunAborted { period, .. } => *period,
        }
    }

    /// Node the event refers to, if any
    pub fn node_id(&self) -> Option<&str> {
        match self {
            Event::Accrual { node_id, .. }
            | Event::MinimumPayment { node_id, .. }
            | Event::AvalanchePayment { node_id, .. }
            | Event::NodeCleared { node_id, .. } => Some(node_id),
            Event::RunCompleted { .. } | Event::RunAborted { .. } => None,
        }
    }
}

/// Append-only event log
#[derive(Debug, Clone, Default)]
pub struct EventLog {
    events: Vec<Event>,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn log(&mut self, event: Event) {
        self.events.push(event);
    }

    pub fn events(&self) -> &[Event] {
        &self.events
    }

    /// Events for one period, in occurrence order
    pub fn events_at_period(&self, period: usize) -> Vec<&Event> {
        self.events.iter().filter(|e| e.period() == period).collect()
    }

    /// Events referring to one node, in occurrence order
    pub fn events_for_node(&self, node_id: &str) -> Vec<&Event> {
        self.events
            .iter()
            .filter(|e| e.node_id() == Some(node_id))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}
