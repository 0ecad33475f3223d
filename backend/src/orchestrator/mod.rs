//! Orchestrator - main simulation loop
//!
//! Advances the ledger period by period until it completes or aborts.
//!
//! See `engine.rs` for full implementation.

pub mod checkpoint;
pub mod engine;


// Re-export main types for convenience
pub use engine::{
    CadencePolicy, ConfigError, EngineState, HistorySample, NodeConfig, NodeTotals, Orchestrator,
    PeriodResult, RunOutcome, RunResult, SimulationConfig, SimulationError,
};

// Re-export checkpoint types
pub use checkpoint::{compute_config_hash, EngineSnapshot, NodeSnapshot};
