//! Type conversion utilities for FFI boundary
//!
//! Converts between Rust types and PyO3-compatible types (PyDict, PyList, etc.)

use chrono::NaiveDate;
use pyo3::exceptions::{PyRuntimeError, PyValueError};
use pyo3::prelude::*;
use pyo3::types::{PyDict, PyList};
use serde::de::DeserializeOwned;

use crate::audit::{NodeAudit, Verdict};
use crate::orchestrator::{
    EngineState, NodeConfig, Orchestrator, PeriodResult, RunOutcome, RunResult, SimulationConfig,
    SimulationError,
};

// ========================================================================
// PyDict Extraction Helpers
// ========================================================================

/// Extract a required field from a Python dict with clear error messages.
fn extract_required<'py, T: FromPyObject<'py>>(dict: &Bound<'py, PyDict>, key: &str) -> PyResult<T> {
    dict.get_item(key)?
        .ok_or_else(|| PyValueError::new_err(format!("Missing required field '{}'", key)))?
        .extract()
}

/// Extract an optional field; a missing key or `None` both give `None`.
fn extract_optional<'py, T: FromPyObject<'py>>(
    dict: &Bound<'py, PyDict>,
    key: &str,
) -> PyResult<Option<T>> {
    match dict.get_item(key)? {
        Some(value) if !value.is_none() => Ok(Some(value.extract()?)),
        _ => Ok(None),
    }
}

/// Extract a field with a default value if missing.
fn extract_with_default<'py, T: FromPyObject<'py>>(
    dict: &Bound<'py, PyDict>,
    key: &str,
    default: T,
) -> PyResult<T> {
    Ok(extract_optional(dict, key)?.unwrap_or(default))
}

/// Parse a snake_case tag through the type's serde representation
fn parse_tag<T: DeserializeOwned>(field: &str, tag: &str) -> PyResult<T> {
    serde_json::from_value(serde_json::Value::String(tag.to_string()))
        .map_err(|_| PyValueError::new_err(format!("Unknown {} '{}'", field, tag)))
}

fn parse_date(field: &str, value: &str) -> PyResult<NaiveDate> {
    value
        .parse::<NaiveDate>()
        .map_err(|e| PyValueError::new_err(format!("Invalid {} '{}': {}", field, value, e)))
}

/// Map engine errors onto Python exceptions
pub fn to_py_err(err: SimulationError) -> PyErr {
    match err {
        SimulationError::InvalidConfig(e) => PyValueError::new_err(e.to_string()),
        other => PyRuntimeError::new_err(other.to_string()),
    }
}

// ========================================================================
// Configuration Parsers
// ========================================================================

/// Convert Python dict to SimulationConfig
///
/// Missing numeric fields default to 0; a missing `start_date` defaults to
/// today's local date.
pub fn parse_simulation_config(py_config: &Bound<'_, PyDict>) -> PyResult<SimulationConfig> {
    let start_date = match extract_optional::<String>(py_config, "start_date")? {
        Some(s) => parse_date("start_date", &s)?,
        None => chrono::Local::now().date_naive(),
    };

    let period_mode = match extract_optional::<String>(py_config, "period_mode")? {
        Some(tag) => parse_tag("period_mode", &tag)?,
        None => Default::default(),
    };

    let cadence_policy = match extract_optional::<String>(py_config, "cadence_policy")? {
        Some(tag) => parse_tag("cadence_policy", &tag)?,
        None => Default::default(),
    };

    let py_nodes = py_config
        .get_item("nodes")?
        .ok_or_else(|| PyValueError::new_err("Missing required field 'nodes'"))?;
    let py_nodes: Bound<'_, PyList> = py_nodes.downcast_into()?;

    let mut node_configs = Vec::with_capacity(py_nodes.len());
    for py_node in py_nodes.iter() {
        let node_dict: Bound<'_, PyDict> = py_node.downcast_into()?;
        node_configs.push(parse_node_config(&node_dict)?);
    }

    let config = SimulationConfig {
        capacity: extract_with_default(py_config, "capacity", 0.0)?,
        start_date,
        period_mode,
        max_periods: extract_optional(py_config, "max_periods")?,
        cadence_policy,
        node_configs,
    };

    Orchestrator::validate_config(&config).map_err(|e| PyValueError::new_err(e.to_string()))?;
    Ok(config)
}

fn parse_node_config(py_node: &Bound<'_, PyDict>) -> PyResult<NodeConfig> {
    let cadence = match extract_optional::<String>(py_node, "cadence")? {
        Some(tag) => parse_tag("cadence", &tag)?,
        None => Default::default(),
    };
    let target_date = extract_optional::<String>(py_node, "target_date")?
        .map(|s| parse_date("target_date", &s))
        .transpose()?;

    Ok(NodeConfig {
        id: extract_required(py_node, "id")?,
        balance: extract_with_default(py_node, "balance", 0.0)?,
        accrual_rate: extract_with_default(py_node, "accrual_rate", 0.0)?,
        min_payment: extract_with_default(py_node, "min_payment", 0.0)?,
        cadence,
        target_date,
    })
}

// ========================================================================
// Result Converters
// ========================================================================

pub fn engine_state_name(state: EngineState) -> &'static str {
    match state {
        EngineState::Running => "running",
        EngineState::Completed => "completed",
        EngineState::Aborted => "aborted",
    }
}

fn verdict_name(verdict: Verdict) -> &'static str {
    match verdict {
        Verdict::Pass => "PASS",
        Verdict::Fail => "FAIL",
        Verdict::Info => "INFO",
    }
}

/// Convert PeriodResult to Python dict
pub fn period_result_to_py(py: Python, result: &PeriodResult) -> PyResult<Py<PyDict>> {
    let dict = PyDict::new(py);

    dict.set_item("period", result.period)?;
    dict.set_item("date", result.date.to_string())?;
    dict.set_item("accrual", result.accrual)?;
    dict.set_item("minimum_paid", result.minimum_paid)?;
    dict.set_item("avalanche_paid", result.avalanche_paid)?;
    dict.set_item("remaining_capacity", result.remaining_capacity)?;
    dict.set_item("total_balance", result.total_balance)?;
    dict.set_item("state", engine_state_name(result.state))?;

    Ok(dict.into())
}

fn audit_to_py<'py>(py: Python<'py>, audit: &NodeAudit) -> PyResult<Bound<'py, PyDict>> {
    let dict = PyDict::new(py);
    dict.set_item("node_id", &audit.node_id)?;
    dict.set_item("target_date", audit.target_date.map(|d| d.to_string()))?;
    dict.set_item("verdict", verdict_name(audit.verdict))?;
    dict.set_item("days_margin", audit.days_margin)?;
    Ok(dict)
}

/// Convert RunResult to Python dict
pub fn run_result_to_py(py: Python, result: &RunResult) -> PyResult<Py<PyDict>> {
    let dict = PyDict::new(py);

    let outcome = match result.outcome {
        RunOutcome::Completed => "completed",
        RunOutcome::Aborted => "aborted",
    };
    dict.set_item("outcome", outcome)?;
    dict.set_item("period_count", result.period_count)?;
    dict.set_item("start_date", result.start_date.to_string())?;
    dict.set_item("finish_date", result.finish_date.to_string())?;
    dict.set_item("starting_balance", result.starting_balance)?;
    dict.set_item("remaining_balance", result.remaining_balance)?;
    dict.set_item("total_accrual", result.total_accrual)?;
    dict.set_item("config_hash", &result.config_hash)?;

    let history: Vec<(String, f64)> = result
        .history
        .iter()
        .map(|s| (s.date.to_string(), s.total_balance))
        .collect();
    dict.set_item("history", history)?;

    let audits = result
        .audits
        .iter()
        .map(|a| audit_to_py(py, a))
        .collect::<PyResult<Vec<_>>>()?;
    dict.set_item("audits", PyList::new(py, audits)?)?;

    Ok(dict.into())
}
