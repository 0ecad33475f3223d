//! Domain models for the repayment simulator

pub mod event;
pub mod ledger;
pub mod node;

// Re-exports
pub use event::{Event, EventLog};
pub use ledger::Ledger;
pub use node::{Cadence, Node, NodeError};
