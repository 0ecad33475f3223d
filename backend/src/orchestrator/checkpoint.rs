//! Checkpoint - Save/Load Simulation State
//!
//! Enables serialization and deserialization of a live run so that a caller
//! can stop between periods and resume later.
//!
//! # Critical Invariants
//!
//! - **Determinism**: a resumed run finishes exactly like an uninterrupted one
//! - **Ledger Order**: snapshot nodes appear in the ledger's priority order
//! - **Non-negative Balances**: every saved balance is finite and >= 0
//! - **Config Matching**: state can only be loaded with a matching config

use crate::models::node::Node;
use crate::orchestrator::engine::{EngineState, HistorySample, NodeTotals, SimulationError};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

// ============================================================================
// Snapshot Structures
// ============================================================================

/// Complete engine state snapshot
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineSnapshot {
    /// Periods executed so far
    pub current_period: usize,

    pub state: EngineState,

    pub starting_balance: f64,

    pub total_accrual: f64,

    /// Node balances in ledger order
    pub nodes: Vec<NodeSnapshot>,

    /// Per-node flows in ledger order
    pub node_totals: Vec<NodeTotals>,

    pub history: Vec<HistorySample>,

    /// SHA256 hash of original config (for validation)
    pub config_hash: String,
}

/// Node balance snapshot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeSnapshot {
    pub id: String,
    pub balance: f64,
}

impl From<&Node> for NodeSnapshot {
    fn from(node: &Node) -> Self {
        NodeSnapshot {
            id: node.id().to_string(),
            balance: node.balance(),
        }
    }
}

// ============================================================================
// Config Hashing
// ============================================================================

/// Compute deterministic SHA256 hash of config
///
/// This hash is used to verify that a checkpoint's config matches the config
/// used to restore it, and is reported with every run result.
///
/// Uses canonical JSON serialization with sorted keys so that the hash does
/// not depend on field or map ordering.
pub fn compute_config_hash<T: Serialize>(config: &T) -> Result<String, SimulationError> {
    use serde_json::Value;
    use std::collections::BTreeMap;

    let value = serde_json::to_value(config).map_err(|e| {
        SimulationError::SerializationError(format!("Config serialization failed: {}", e))
    })?;

    fn canonicalize(value: Value) -> Value {
        match value {
            Value::Object(map) => {
                let sorted: BTreeMap<String, Value> =
                    map.into_iter().map(|(k, v)| (k, canonicalize(v))).collect();
                Value::Object(sorted.into_iter().collect())
            }
            Value::Array(arr) => Value::Array(arr.into_iter().map(canonicalize).collect()),
            other => other,
        }
    }

    let json = serde_json::to_string(&canonicalize(value)).map_err(|e| {
        SimulationError::SerializationError(format!("Config serialization failed: {}", e))
    })?;

    let mut hasher = Sha256::new();
    hasher.update(json.as_bytes());
    Ok(format!("{:x}", hasher.finalize()))
}

// ============================================================================
// Validation Functions
// ============================================================================

/// Validate snapshot integrity against the ledger it will be restored into
///
/// Checks:
/// - Node IDs match the ledger, in priority order
/// - Balances are finite and non-negative
/// - Per-node totals line up with the nodes
/// - One history sample per executed period, numbered 1..=current_period
/// - The engine state agrees with the balances and the safety bound
pub fn validate_snapshot(
    snapshot: &EngineSnapshot,
    expected_ids: &[String],
    max_periods: usize,
) -> Result<(), SimulationError> {
    let snapshot_ids: Vec<&str> = snapshot.nodes.iter().map(|n| n.id.as_str()).collect();
    if snapshot_ids != expected_ids.iter().map(String::as_str).collect::<Vec<_>>() {
        return Err(SimulationError::StateValidationError(format!(
            "Node order mismatch: snapshot has {:?}, ledger has {:?}",
            snapshot_ids, expected_ids
        )));
    }

    for node in &snapshot.nodes {
        if !node.balance.is_finite() || node.balance < 0.0 {
            return Err(SimulationError::StateValidationError(format!(
                "Node {} has invalid balance {}",
                node.id, node.balance
            )));
        }
    }

    let totals_aligned = snapshot.node_totals.len() == snapshot.nodes.len()
        && snapshot
            .node_totals
            .iter()
            .zip(&snapshot.nodes)
            .all(|(t, n)| t.node_id == n.id);
    if !totals_aligned {
        return Err(SimulationError::StateValidationError(
            "Node totals do not match snapshot nodes".to_string(),
        ));
    }

    if snapshot.history.len() != snapshot.current_period {
        return Err(SimulationError::StateValidationError(format!(
            "History has {} samples for {} periods",
            snapshot.history.len(),
            snapshot.current_period
        )));
    }

    if let Some((i, sample)) = snapshot
        .history
        .iter()
        .enumerate()
        .find(|(i, s)| s.period != i + 1)
    {
        return Err(SimulationError::StateValidationError(format!(
            "History sample {} is numbered period {}",
            i + 1,
            sample.period
        )));
    }

    let all_settled = snapshot.nodes.iter().all(|n| n.balance <= 0.0);
    match snapshot.state {
        EngineState::Completed if !all_settled => {
            return Err(SimulationError::StateValidationError(
                "Completed snapshot has outstanding balance".to_string(),
            ));
        }
        EngineState::Running if all_settled => {
            return Err(SimulationError::StateValidationError(
                "Running snapshot has no outstanding balance".to_string(),
            ));
        }
        EngineState::Running if snapshot.current_period >= max_periods => {
            return Err(SimulationError::StateValidationError(format!(
                "Running snapshot at period {} has reached the safety bound {}",
                snapshot.current_period, max_periods
            )));
        }
        EngineState::Aborted if snapshot.current_period != max_periods || all_settled => {
            return Err(SimulationError::StateValidationError(format!(
                "Aborted snapshot at period {} does not match the safety bound {}",
                snapshot.current_period, max_periods
            )));
        }
        _ => {}
    }

    Ok(())
}
