//! PyO3 wrapper for Orchestrator
//!
//! This module provides the Python interface to the Rust engine.

use pyo3::prelude::*;
use pyo3::types::PyDict;

use super::types::{
    engine_state_name, parse_simulation_config, period_result_to_py, run_result_to_py, to_py_err,
};
use crate::orchestrator::Orchestrator as RustOrchestrator;

/// Python wrapper for the Rust engine
///
/// # Example (from Python)
///
/// ```python
/// from repayment_simulator_core_rs import Simulator
///
/// sim = Simulator.new({
///     "capacity": 5000,
///     "start_date": "2025-01-01",
///     "nodes": [
///         {"id": "NODE_A", "balance": 20000, "accrual_rate": 0.15, "min_payment": 500},
///     ],
/// })
/// result = sim.run()
/// print(f"Cleared in {result['period_count']} periods")
/// ```
#[pyclass(name = "Simulator")]
pub struct PySimulator {
    inner: RustOrchestrator,
}

#[pymethods]
impl PySimulator {
    /// Create a new simulator from a configuration dict
    ///
    /// Raises ValueError for missing or invalid configuration.
    #[staticmethod]
    fn new(config: &Bound<'_, PyDict>) -> PyResult<Self> {
        let rust_config = parse_simulation_config(config)?;
        let inner = RustOrchestrator::new(rust_config).map_err(to_py_err)?;
        Ok(PySimulator { inner })
    }

    /// Restore a simulator from `save_state()` output
    #[staticmethod]
    fn load_state(config: &Bound<'_, PyDict>, state_json: &str) -> PyResult<Self> {
        let rust_config = parse_simulation_config(config)?;
        let inner = RustOrchestrator::load_state(rust_config, state_json).map_err(to_py_err)?;
        Ok(PySimulator { inner })
    }

    /// Execute one period and return its summary dict
    fn step(&mut self, py: Python) -> PyResult<Py<PyDict>> {
        let result = self.inner.step().map_err(to_py_err)?;
        period_result_to_py(py, &result)
    }

    /// Run to completion (or abort) and return the run result dict
    fn run(&mut self, py: Python) -> PyResult<Py<PyDict>> {
        let result = self.inner.run().map_err(to_py_err)?;
        run_result_to_py(py, &result)
    }

    fn current_period(&self) -> usize {
        self.inner.current_period()
    }

    /// "running", "completed" or "aborted"
    fn state(&self) -> &'static str {
        engine_state_name(self.inner.state())
    }

    fn total_accrual(&self) -> f64 {
        self.inner.total_accrual()
    }

    fn total_balance(&self) -> f64 {
        self.inner.ledger().total_balance()
    }

    /// Node IDs in avalanche priority order
    fn node_ids(&self) -> Vec<String> {
        self.inner.ledger().node_ids()
    }

    /// Balance of one node, or None if the node does not exist
    fn get_node_balance(&self, node_id: &str) -> Option<f64> {
        self.inner.get_node_balance(node_id)
    }

    /// (ISO date, total balance) per executed period
    fn history(&self) -> Vec<(String, f64)> {
        self.inner
            .history()
            .iter()
            .map(|s| (s.date.to_string(), s.total_balance))
            .collect()
    }

    fn save_state(&self) -> PyResult<String> {
        self.inner.save_state().map_err(to_py_err)
    }
}
