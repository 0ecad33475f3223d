//! Node Ledger
//!
//! Holds every obligation of a run in avalanche priority order.
//!
//! # Critical Invariants
//!
//! 1. **Priority Order**: nodes are sorted by `accrual_rate` descending, ties
//!    keeping input order. The order is fixed at construction and never changes.
//! 2. **Single Writer**: only the engine mutates balances (`nodes_mut` is
//!    crate-private).

use crate::models::node::Node;

/// Ordered collection of nodes
///
/// # Example
///
/// ```rust
/// use repayment_simulator_core_rs::{Ledger, Node};
///
/// let ledger = Ledger::new(vec![
///     Node::new("LOW".to_string(), 5_000.0, 0.05, 200.0),
///     Node::new("HIGH".to_string(), 20_000.0, 0.15, 500.0),
/// ]);
///
/// assert_eq!(ledger.num_nodes(), 2);
/// assert_eq!(ledger.nodes()[0].id(), "HIGH");
/// assert_eq!(ledger.total_balance(), 25_000.0);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Ledger {
    nodes: Vec<Node>,
}

impl Ledger {
    /// Build a ledger and fix its priority order
    ///
    /// `Vec::sort_by` is stable, so nodes with equal rates keep their input order.
    pub fn new(mut nodes: Vec<Node>) -> Self {
        nodes.sort_by(|a, b| b.accrual_rate().total_cmp(&a.accrual_rate()));
        Self { nodes }
    }

    /// Build a ledger in exactly the given order, bypassing the priority sort
    #[cfg(test)]
    pub(crate) fn from_ordered(nodes: Vec<Node>) -> Self {
        Self { nodes }
    }

    /// Nodes in priority order
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub(crate) fn nodes_mut(&mut self) -> &mut [Node] {
        &mut self.nodes
    }

    /// Get reference to a node by ID
    pub fn get_node(&self, id: &str) -> Option<&Node> {
        self.nodes.iter().find(|n| n.id() == id)
    }

    pub fn num_nodes(&self) -> usize {
        self.nodes.len()
    }

    /// Node IDs in priority order
    pub fn node_ids(&self) -> Vec<String> {
        self.nodes.iter().map(|n| n.id().to_string()).collect()
    }

    /// Sum of all outstanding balances
    pub fn total_balance(&self) -> f64 {
        self.nodes.iter().map(|n| n.balance()).sum()
    }

    /// Whether every node has been paid down
    pub fn all_settled(&self) -> bool {
        self.nodes.iter().all(|n| n.is_settled())
    }
}
