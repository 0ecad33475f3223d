//! Orchestrator Engine
//!
//! Main simulation loop advancing the ledger one period at a time.
//!
//! # Architecture
//!
//! ```text
//! For each period p (1-based):
//! 1. Due-test every node (cadence policy)
//! 2. Accrue on due, unsettled nodes
//! 3. Apply minimum payments to due, unsettled nodes
//! 4. Distribute leftover capacity in priority order (avalanche)
//! 5. Record a history sample
//! 6. Completed if every node is settled, aborted if p reached the safety bound
//! ```
//!
//! # Example
//!
//! ```rust
//! use chrono::NaiveDate;
//! use repayment_simulator_core_rs::orchestrator::{
//!     CadencePolicy, NodeConfig, Orchestrator, RunOutcome, SimulationConfig,
//! };
//! use repayment_simulator_core_rs::{Cadence, PeriodMode};
//!
//! let config = SimulationConfig {
//!     capacity: 5_000.0,
//!     start_date: NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(),
//!     period_mode: PeriodMode::Monthly,
//!     max_periods: None,
//!     cadence_policy: CadencePolicy::default(),
//!     node_configs: vec![NodeConfig {
//!         id: "NODE_A".to_string(),
//!         balance: 20_000.0,
//!         accrual_rate: 0.15,
//!         min_payment: 500.0,
//!         cadence: Cadence::EveryPeriod,
//!         target_date: None,
//!     }],
//! };
//!
//! let mut orchestrator = Orchestrator::new(config).unwrap();
//! let result = orchestrator.run().unwrap();
//! assert_eq!(result.outcome, RunOutcome::Completed);
//! assert_eq!(result.period_count, 5);
//! ```

use crate::audit::{audit_nodes, NodeAudit};
use crate::core::time::{PeriodClock, PeriodMode};
use crate::models::event::{Event, EventLog};
use crate::models::ledger::Ledger;
use crate::models::node::{Cadence, Node, NodeError};
use crate::orchestrator::checkpoint::{
    compute_config_hash, validate_snapshot, EngineSnapshot, NodeSnapshot,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use thiserror::Error;
use tracing::{debug, info, warn};

// ============================================================================
// Configuration Types
// ============================================================================

/// Complete simulation configuration
///
/// The core never reads the wall clock: callers resolve `start_date` before
/// building the config so that identical configs give identical runs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationConfig {
    /// Capacity available each period
    pub capacity: f64,

    /// Date of period 0
    pub start_date: NaiveDate,

    pub period_mode: PeriodMode,

    /// Safety bound on executed periods; `None` uses the mode's default
    pub max_periods: Option<usize>,

    pub cadence_policy: CadencePolicy,

    /// Per-node configuration, in input order
    pub node_configs: Vec<NodeConfig>,
}

impl SimulationConfig {
    /// Safety bound after applying the per-mode default
    pub fn effective_max_periods(&self) -> usize {
        self.max_periods
            .unwrap_or_else(|| self.period_mode.default_max_periods())
    }
}

/// Per-node configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeConfig {
    pub id: String,
    pub balance: f64,
    pub accrual_rate: f64,
    pub min_payment: f64,
    pub cadence: Cadence,
    pub target_date: Option<NaiveDate>,
}

impl From<&NodeConfig> for Node {
    fn from(config: &NodeConfig) -> Self {
        Node::new(
            config.id.clone(),
            config.balance,
            config.accrual_rate,
            config.min_payment,
        )
        .with_cadence(config.cadence)
        .with_target_date(config.target_date)
    }
}

/// How `EveryOtherPeriod` nodes behave on their off periods
///
/// The two rules are not equivalent and are never mixed within a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CadencePolicy {
    /// Off periods skip accrual, minimum payment and avalanche funds entirely
    #[default]
    SkipOffPeriods,
    /// Accrual and minimum payment apply every period; only avalanche funds
    /// are restricted to due periods
    RestrictExtraOnly,
}

impl CadencePolicy {
    /// Due status of a node with `cadence` on `period`
    fn due_status(self, cadence: Cadence, period: usize) -> DueStatus {
        let due = cadence.is_due(period);
        match self {
            CadencePolicy::SkipOffPeriods => DueStatus {
                core: due,
                extra: due,
            },
            CadencePolicy::RestrictExtraOnly => DueStatus {
                core: true,
                extra: due,
            },
        }
    }
}

/// Which parts of the period loop apply to a node
#[derive(Debug, Clone, Copy)]
struct DueStatus {
    /// Accrual and minimum payment
    core: bool,
    /// Avalanche distribution
    extra: bool,
}

// ============================================================================
// Errors
// ============================================================================

/// Configuration rejected before any ledger mutation
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ConfigError {
    #[error("Must have at least one node")]
    EmptyLedger,

    #[error("Capacity must be non-negative and finite, got {0}")]
    InvalidCapacity(f64),

    #[error("Node id must not be empty")]
    EmptyNodeId,

    #[error("Duplicate node ID: {0}")]
    DuplicateNodeId(String),

    #[error("Node {node_id}: {field} must be non-negative and finite, got {value}")]
    InvalidNodeField {
        node_id: String,
        field: &'static str,
        value: f64,
    },

    #[error("max_periods must be > 0")]
    InvalidSafetyBound,
}

/// Simulation error types
#[derive(Debug, Clone, Error, PartialEq)]
pub enum SimulationError {
    #[error("Invalid config: {0}")]
    InvalidConfig(#[from] ConfigError),

    #[error("Node error: {0}")]
    Node(#[from] NodeError),

    #[error("Simulation already terminated ({0:?})")]
    AlreadyTerminated(EngineState),

    #[error("Simulation is still running")]
    NotTerminated,

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("Deserialization error: {0}")]
    DeserializationError(String),

    #[error("Config mismatch: checkpoint has {expected}, config hashes to {actual}")]
    ConfigMismatch { expected: String, actual: String },

    #[error("State validation error: {0}")]
    StateValidationError(String),
}

// ============================================================================
// Results
// ============================================================================

/// Engine state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EngineState {
    Running,
    /// Every node settled
    Completed,
    /// Safety bound reached with balance outstanding (divergent configuration)
    Aborted,
}

impl EngineState {
    pub fn is_terminal(self) -> bool {
        self != EngineState::Running
    }
}

/// Terminal outcome of a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunOutcome {
    Completed,
    Aborted,
}

/// Total remaining balance at the end of one period
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistorySample {
    pub period: usize,
    pub date: NaiveDate,
    pub total_balance: f64,
}

/// Cumulative flows for one node
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeTotals {
    pub node_id: String,
    pub starting_balance: f64,
    pub accrued: f64,
    pub minimum_paid: f64,
    pub avalanche_paid: f64,
}

impl NodeTotals {
    fn new(node: &Node) -> Self {
        Self {
            node_id: node.id().to_string(),
            starting_balance: node.balance(),
            accrued: 0.0,
            minimum_paid: 0.0,
            avalanche_paid: 0.0,
        }
    }

    /// Minimum plus avalanche payments
    pub fn total_paid(&self) -> f64 {
        self.minimum_paid + self.avalanche_paid
    }
}

/// Result of a single period
#[derive(Debug, Clone, PartialEq)]
pub struct PeriodResult {
    pub period: usize,
    pub date: NaiveDate,
    pub accrual: f64,
    pub minimum_paid: f64,
    pub avalanche_paid: f64,
    /// Capacity left after avalanche distribution (negative when minimums exceed capacity)
    pub remaining_capacity: f64,
    pub total_balance: f64,
    /// Engine state after this period
    pub state: EngineState,
}

/// Immutable record of a finished run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunResult {
    pub outcome: RunOutcome,
    pub period_count: usize,
    pub start_date: NaiveDate,
    /// Date at the end of the last executed period
    pub finish_date: NaiveDate,
    pub starting_balance: f64,
    pub remaining_balance: f64,
    /// Sum of every accrual applied during the run
    pub total_accrual: f64,
    /// One sample per executed period
    pub history: Vec<HistorySample>,
    /// Per-node flows, in ledger order
    pub node_totals: Vec<NodeTotals>,
    /// Per-node verdicts, in ledger order
    pub audits: Vec<NodeAudit>,
    /// SHA256 of the canonical config
    pub config_hash: String,
}

// ============================================================================
// Orchestrator
// ============================================================================

/// Main orchestrator owning the ledger and the period loop
///
/// # Determinism
///
/// There is no randomness and no wall-clock access: the same config always
/// produces the same periods, totals and dates.
pub struct Orchestrator {
    ledger: Ledger,
    clock: PeriodClock,
    capacity: f64,
    max_periods: usize,
    cadence_policy: CadencePolicy,
    state: EngineState,
    starting_balance: f64,
    total_accrual: f64,
    history: Vec<HistorySample>,
    /// Aligned with ledger order
    node_totals: Vec<NodeTotals>,
    event_log: EventLog,
    config_hash: String,
}

impl Orchestrator {
    /// Create new orchestrator from configuration
    ///
    /// # Errors
    ///
    /// * `SimulationError::InvalidConfig` - validation failed; nothing was built
    pub fn new(config: SimulationConfig) -> Result<Self, SimulationError> {
        Self::validate_config(&config)?;

        let config_hash = compute_config_hash(&config)?;
        let nodes: Vec<Node> = config.node_configs.iter().map(Node::from).collect();
        let ledger = Ledger::new(nodes);
        Ok(Self::from_ledger(ledger, &config, config_hash))
    }

    /// Assemble an orchestrator at period 0 around an already-ordered ledger
    pub(crate) fn from_ledger(ledger: Ledger, config: &SimulationConfig, config_hash: String) -> Self {
        let node_totals = ledger.nodes().iter().map(NodeTotals::new).collect();
        let starting_balance = ledger.total_balance();

        let mut orchestrator = Self {
            clock: PeriodClock::new(config.start_date, config.period_mode),
            capacity: config.capacity,
            max_periods: config.effective_max_periods(),
            cadence_policy: config.cadence_policy,
            state: EngineState::Running,
            starting_balance,
            total_accrual: 0.0,
            history: Vec::new(),
            node_totals,
            event_log: EventLog::new(),
            config_hash,
            ledger,
        };

        if orchestrator.ledger.all_settled() {
            orchestrator.state = EngineState::Completed;
            orchestrator.event_log.log(Event::RunCompleted {
                period: 0,
                total_accrual: 0.0,
            });
            info!("ledger has no outstanding balance; nothing to simulate");
        }

        orchestrator
    }

    /// Validate configuration
    pub fn validate_config(config: &SimulationConfig) -> Result<(), ConfigError> {
        if config.node_configs.is_empty() {
            return Err(ConfigError::EmptyLedger);
        }

        if !config.capacity.is_finite() || config.capacity < 0.0 {
            return Err(ConfigError::InvalidCapacity(config.capacity));
        }

        if config.max_periods == Some(0) {
            return Err(ConfigError::InvalidSafetyBound);
        }

        let mut ids = HashSet::new();
        for node in &config.node_configs {
            if node.id.is_empty() {
                return Err(ConfigError::EmptyNodeId);
            }
            if !ids.insert(node.id.as_str()) {
                return Err(ConfigError::DuplicateNodeId(node.id.clone()));
            }
            for (field, value) in [
                ("balance", node.balance),
                ("accrual_rate", node.accrual_rate),
                ("min_payment", node.min_payment),
            ] {
                if !value.is_finite() || value < 0.0 {
                    return Err(ConfigError::InvalidNodeField {
                        node_id: node.id.clone(),
                        field,
                        value,
                    });
                }
            }
        }

        Ok(())
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    /// Periods executed so far
    pub fn current_period(&self) -> usize {
        self.clock.current_period()
    }

    /// Date at the end of the last executed period (start date before any period)
    pub fn current_date(&self) -> NaiveDate {
        self.clock.current_date()
    }

    pub fn state(&self) -> EngineState {
        self.state
    }

    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    pub fn capacity(&self) -> f64 {
        self.capacity
    }

    pub fn max_periods(&self) -> usize {
        self.max_periods
    }

    pub fn total_accrual(&self) -> f64 {
        self.total_accrual
    }

    pub fn history(&self) -> &[HistorySample] {
        &self.history
    }

    pub fn node_totals(&self) -> &[NodeTotals] {
        &self.node_totals
    }

    pub fn event_log(&self) -> &EventLog {
        &self.event_log
    }

    pub fn config_hash(&self) -> &str {
        &self.config_hash
    }

    /// Outstanding balance of one node
    pub fn get_node_balance(&self, node_id: &str) -> Option<f64> {
        self.ledger.get_node(node_id).map(|n| n.balance())
    }

    // ========================================================================
    // Period Loop
    // ========================================================================

    /// Execute one period
    ///
    /// Callers may stop between periods; this is the only cancellation point.
    ///
    /// # Errors
    ///
    /// * `SimulationError::AlreadyTerminated` - the run already completed or aborted
    pub fn step(&mut self) -> Result<PeriodResult, SimulationError> {
        if self.state.is_terminal() {
            return Err(SimulationError::AlreadyTerminated(self.state));
        }

        self.clock.advance_period();
        let period = self.clock.current_period();
        let periods_per_year = self.clock.mode().periods_per_year();

        // STEP 1: DUE-TEST
        let policy = self.cadence_policy;
        let due: Vec<DueStatus> = self
            .ledger
            .nodes()
            .iter()
            .map(|n| policy.due_status(n.cadence(), period))
            .collect();

        // STEP 2: ACCRUAL
        let mut period_accrual = 0.0;
        for (i, node) in self.ledger.nodes_mut().iter_mut().enumerate() {
            if !due[i].core || node.is_settled() {
                continue;
            }
            let amount = node.accrue(periods_per_year);
            period_accrual += amount;
            self.node_totals[i].accrued += amount;
            self.event_log.log(Event::Accrual {
                period,
                node_id: node.id().to_string(),
                amount,
            });
        }
        self.total_accrual += period_accrual;

        // STEP 3: MINIMUM PAYMENTS
        let mut remaining_capacity = self.capacity;
        let mut minimum_paid = 0.0;
        for (i, node) in self.ledger.nodes_mut().iter_mut().enumerate() {
            if !due[i].core || node.is_settled() {
                continue;
            }
            let min_payment = node.min_payment();
            let paid = node.pay(min_payment)?;
            remaining_capacity -= paid;
            minimum_paid += paid;
            self.node_totals[i].minimum_paid += paid;
            if paid > 0.0 {
                self.event_log.log(Event::MinimumPayment {
                    period,
                    node_id: node.id().to_string(),
                    amount: paid,
                });
            }
            if node.is_settled() {
                self.event_log.log(Event::NodeCleared {
                    period,
                    node_id: node.id().to_string(),
                });
            }
        }

        // STEP 4: AVALANCHE DISTRIBUTION (ledger is already in priority order)
        let mut avalanche_paid = 0.0;
        for (i, node) in self.ledger.nodes_mut().iter_mut().enumerate() {
            if remaining_capacity <= 0.0 {
                break;
            }
            if !due[i].extra || node.is_settled() {
                continue;
            }
            let paid = node.pay(remaining_capacity)?;
            remaining_capacity -= paid;
            avalanche_paid += paid;
            self.node_totals[i].avalanche_paid += paid;
            self.event_log.log(Event::AvalanchePayment {
                period,
                node_id: node.id().to_string(),
                amount: paid,
            });
            if node.is_settled() {
                self.event_log.log(Event::NodeCleared {
                    period,
                    node_id: node.id().to_string(),
                });
            }
        }

        // STEP 5: HISTORY SAMPLE
        let date = self.clock.current_date();
        let total_balance = self.ledger.total_balance();
        self.history.push(HistorySample {
            period,
            date,
            total_balance,
        });

        debug!(
            period,
            accrual = period_accrual,
            minimum_paid,
            avalanche_paid,
            total_balance,
            "period complete"
        );

        // STEP 6: TERMINATION
        if self.ledger.all_settled() {
            self.state = EngineState::Completed;
            self.event_log.log(Event::RunCompleted {
                period,
                total_accrual: self.total_accrual,
            });
            info!(
                periods = period,
                total_accrual = self.total_accrual,
                %date,
                "all nodes cleared"
            );
        } else if period >= self.max_periods {
            self.state = EngineState::Aborted;
            self.event_log.log(Event::RunAborted {
                period,
                remaining_balance: total_balance,
            });
            warn!(
                periods = period,
                remaining_balance = total_balance,
                "safety bound reached; accrual exceeds capacity"
            );
        }

        Ok(PeriodResult {
            period,
            date,
            accrual: period_accrual,
            minimum_paid,
            avalanche_paid,
            remaining_capacity,
            total_balance,
            state: self.state,
        })
    }

    /// Run until the engine completes or aborts
    pub fn run(&mut self) -> Result<RunResult, SimulationError> {
        while !self.state.is_terminal() {
            self.step()?;
        }
        self.result()
    }

    /// Build the run result of a terminated engine
    ///
    /// # Errors
    ///
    /// * `SimulationError::NotTerminated` - the engine is still running
    pub fn result(&self) -> Result<RunResult, SimulationError> {
        let outcome = match self.state {
            EngineState::Running => return Err(SimulationError::NotTerminated),
            EngineState::Completed => RunOutcome::Completed,
            EngineState::Aborted => RunOutcome::Aborted,
        };
        let finish_date = self.clock.current_date();

        Ok(RunResult {
            outcome,
            period_count: self.clock.current_period(),
            start_date: self.clock.start_date(),
            finish_date,
            starting_balance: self.starting_balance,
            remaining_balance: self.ledger.total_balance(),
            total_accrual: self.total_accrual,
            history: self.history.clone(),
            node_totals: self.node_totals.clone(),
            audits: audit_nodes(self.ledger.nodes(), finish_date, outcome),
            config_hash: self.config_hash.clone(),
        })
    }
}

impl Orchestrator {
    // ========================================================================
    // Checkpoint / Resume
    // ========================================================================

    /// Serialize the live run to JSON
    ///
    /// The event log is not part of the checkpoint; a restored run starts
    /// with an empty log.
    ///
    /// # Example
    ///
    /// ```rust,ignore
    /// let state_json = orchestrator.save_state()?;
    /// std::fs::write("checkpoint.json", &state_json)?;
    /// ```
    pub fn save_state(&self) -> Result<String, SimulationError> {
        let snapshot = EngineSnapshot {
            current_period: self.clock.current_period(),
            state: self.state,
            starting_balance: self.starting_balance,
            total_accrual: self.total_accrual,
            nodes: self.ledger.nodes().iter().map(NodeSnapshot::from).collect(),
            node_totals: self.node_totals.clone(),
            history: self.history.clone(),
            config_hash: self.config_hash.clone(),
        };

        validate_snapshot(&snapshot, &self.ledger.node_ids(), self.max_periods)?;

        serde_json::to_string(&snapshot).map_err(|e| {
            SimulationError::SerializationError(format!("Failed to serialize state: {}", e))
        })
    }

    /// Restore a run saved with [`Orchestrator::save_state`]
    ///
    /// # Errors
    ///
    /// - `DeserializationError`: JSON is invalid or corrupted
    /// - `ConfigMismatch`: config differs from the one the checkpoint was taken with
    /// - `StateValidationError`: restored state violates ledger invariants
    pub fn load_state(config: SimulationConfig, state_json: &str) -> Result<Self, SimulationError> {
        let snapshot: EngineSnapshot = serde_json::from_str(state_json).map_err(|e| {
            SimulationError::DeserializationError(format!("Failed to parse state JSON: {}", e))
        })?;

        Self::validate_config(&config)?;
        let config_hash = compute_config_hash(&config)?;
        if snapshot.config_hash != config_hash {
            return Err(SimulationError::ConfigMismatch {
                expected: snapshot.config_hash,
                actual: config_hash,
            });
        }

        let nodes: Vec<Node> = config.node_configs.iter().map(Node::from).collect();
        let mut ledger = Ledger::new(nodes);
        let max_periods = config.effective_max_periods();
        validate_snapshot(&snapshot, &ledger.node_ids(), max_periods)?;

        for (node, saved) in ledger.nodes_mut().iter_mut().zip(&snapshot.nodes) {
            node.restore_balance(saved.balance);
        }

        info!(
            period = snapshot.current_period,
            state = ?snapshot.state,
            "restored simulation from checkpoint"
        );

        Ok(Self {
            ledger,
            clock: PeriodClock::at_period(
                config.start_date,
                config.period_mode,
                snapshot.current_period,
            ),
            capacity: config.capacity,
            max_periods,
            cadence_policy: config.cadence_policy,
            state: snapshot.state,
            starting_balance: snapshot.starting_balance,
            total_accrual: snapshot.total_accrual,
            history: snapshot.history,
            node_totals: snapshot.node_totals,
            event_log: EventLog::new(),
            config_hash,
        })
    }
}

impl std::fmt::Debug for Orchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Orchestrator")
            .field("current_period", &self.clock.current_period())
            .field("state", &self.state)
            .field("num_nodes", &self.ledger.num_nodes())
            .field("total_balance", &self.ledger.total_balance())
            .field("total_accrual", &self.total_accrual)
            .field("event_count", &self.event_log.len())
            .finish()
    }
}
