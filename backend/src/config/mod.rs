//! Configuration loader
//!
//! Reads the JSON configuration file into strongly-typed records. The file
//! keeps the original key names (`monthly_system_capacity`, `active_nodes`,
//! `current_load`, `overhead_factor`, `min_throughput`, `deprecation_date`);
//! the plain names (`capacity`, `nodes`, `balance`, `accrual_rate`,
//! `min_payment`, `target_date`) are accepted as aliases.
//!
//! Missing numeric fields default to 0. Validation happens once, in
//! [`FileConfig::into_simulation_config`], before any ledger is built.

use crate::core::time::PeriodMode;
use crate::models::node::Cadence;
use crate::orchestrator::{CadencePolicy, ConfigError, NodeConfig, Orchestrator, SimulationConfig};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};

/// Location used when no path is given
pub const DEFAULT_CONFIG_PATH: &str = "config/dependencies.json";

/// Errors raised while reading or writing configuration files
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("Failed to access config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to serialize config: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Top-level configuration file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileConfig {
    /// Capacity per period
    #[serde(rename = "monthly_system_capacity", alias = "capacity", default)]
    pub capacity: f64,

    /// Defaults to the caller's "today" when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_date: Option<NaiveDate>,

    #[serde(default)]
    pub period_mode: PeriodMode,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_periods: Option<usize>,

    #[serde(default)]
    pub cadence_policy: CadencePolicy,

    #[serde(rename = "active_nodes", alias = "nodes", default)]
    pub nodes: Vec<FileNodeSpec>,
}

/// One node as written in the configuration file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileNodeSpec {
    #[serde(default)]
    pub id: String,

    #[serde(rename = "current_load", alias = "balance", default)]
    pub balance: f64,

    #[serde(rename = "overhead_factor", alias = "accrual_rate", default)]
    pub accrual_rate: f64,

    #[serde(rename = "min_throughput", alias = "min_payment", default)]
    pub min_payment: f64,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cadence: Option<Cadence>,

    #[serde(
        rename = "deprecation_date",
        alias = "target_date",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub target_date: Option<NaiveDate>,
}

impl FileNodeSpec {
    fn to_node_config(&self) -> NodeConfig {
        NodeConfig {
            id: self.id.clone(),
            balance: self.balance,
            accrual_rate: self.accrual_rate,
            min_payment: self.min_payment,
            cadence: self.cadence.unwrap_or_default(),
            target_date: self.target_date,
        }
    }
}

impl FileConfig {
    /// Parse configuration from a JSON string
    pub fn from_json_str(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Configuration written on first run: two nodes against a capacity of 5000
    pub fn reference_default() -> Self {
        Self {
            capacity: 5_000.0,
            start_date: None,
            period_mode: PeriodMode::Monthly,
            max_periods: None,
            cadence_policy: CadencePolicy::SkipOffPeriods,
            nodes: vec![
                FileNodeSpec {
                    id: "NODE_A".to_string(),
                    balance: 20_000.0,
                    accrual_rate: 0.15,
                    min_payment: 500.0,
                    cadence: None,
                    target_date: None,
                },
                FileNodeSpec {
                    id: "NODE_B".to_string(),
                    balance: 5_000.0,
                    accrual_rate: 0.05,
                    min_payment: 200.0,
                    cadence: None,
                    target_date: None,
                },
            ],
        }
    }

    /// Resolve defaults and validate into an engine configuration
    ///
    /// `today` is used only when the file has no `start_date`.
    ///
    /// # Example
    /// ```
    /// use chrono::NaiveDate;
    /// use repayment_simulator_core_rs::config::FileConfig;
    ///
    /// let file = FileConfig::from_json_str(
    ///     r#"{"monthly_system_capacity": 800, "active_nodes": [{"id": "CARD", "current_load": 1500}]}"#,
    /// ).unwrap();
    /// let today = NaiveDate::from_ymd_opt(2025, 3, 1).unwrap();
    /// let config = file.into_simulation_config(today).unwrap();
    ///
    /// assert_eq!(config.start_date, today);
    /// assert_eq!(config.node_configs[0].accrual_rate, 0.0);
    /// ```
    pub fn into_simulation_config(self, today: NaiveDate) -> Result<SimulationConfig, ConfigError> {
        let config = SimulationConfig {
            capacity: self.capacity,
            start_date: self.start_date.unwrap_or(today),
            period_mode: self.period_mode,
            max_periods: self.max_periods,
            cadence_policy: self.cadence_policy,
            node_configs: self.nodes.iter().map(FileNodeSpec::to_node_config).collect(),
        };
        Orchestrator::validate_config(&config)?;
        Ok(config)
    }
}

/// Read and parse a configuration file
pub fn load_config(path: &Path) -> Result<FileConfig, LoadError> {
    let contents = fs::read_to_string(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let config = FileConfig::from_json_str(&contents).map_err(|source| LoadError::Parse {
        path: path.to_path_buf(),
        source,
    })?;
    debug!(
        path = %path.display(),
        capacity = config.capacity,
        nodes = config.nodes.len(),
        "configuration loaded"
    );
    Ok(config)
}

/// Write the reference configuration if `path` does not exist yet
///
/// Returns `true` when a file was written. An existing file is never touched.
pub fn ensure_default_config(path: &Path) -> Result<bool, LoadError> {
    if path.exists() {
        return Ok(false);
    }

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|source| LoadError::Io {
            path: parent.to_path_buf(),
            source,
        })?;
    }

    let json = serde_json::to_string_pretty(&FileConfig::reference_default())?;
    fs::write(path, json).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    info!(path = %path.display(), "wrote default configuration; edit it with real data");
    Ok(true)
}
