//! Repayment Simulator Core - Rust Engine
//!
//! Deterministic simulation of paying down interest-bearing obligations
//! ("nodes") against a fixed capacity per period, using the avalanche
//! strategy: leftover capacity always goes to the highest accrual rate first.
//!
//! # Architecture
//!
//! - **core**: Period clock and calendar dates
//! - **models**: Domain types (Node, Ledger, Event)
//! - **orchestrator**: Main simulation loop and checkpoints
//! - **audit**: Post-run verdicts against target dates
//! - **config**: JSON configuration loader and first-run bootstrap
//!
//! # Critical Invariants
//!
//! 1. Balances are never negative at a period boundary
//! 2. Ledger priority order is fixed at construction
//! 3. No randomness and no wall-clock reads inside the engine

// Module declarations
pub mod audit;
pub mod config;
pub mod core;
pub mod models;
pub mod orchestrator;

// Re-exports for convenience
pub use audit::{NodeAudit, Verdict};
pub use core::time::{PeriodClock, PeriodMode};
pub use models::{
    event::{Event, EventLog},
    ledger::Ledger,
    node::{Cadence, Node, NodeError},
};
pub use orchestrator::{
    CadencePolicy, ConfigError, EngineState, HistorySample, NodeConfig, NodeTotals, Orchestrator,
    PeriodResult, RunOutcome, RunResult, SimulationConfig, SimulationError,
};

// FFI module (when feature enabled)
#[cfg(feature = "pyo3")]
pub mod ffi;

// PyO3 exports (when feature enabled)
#[cfg(feature = "pyo3")]
use pyo3::prelude::*;

#[cfg(feature = "pyo3")]
#[pymodule]
fn repayment_simulator_core_rs(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_class::<ffi::orchestrator::PySimulator>()?;
    Ok(())
}
