//! Tests for the JSON configuration loader and first-run bootstrap

use chrono::NaiveDate;
use repayment_simulator_core_rs::config::{
    ensure_default_config, load_config, FileConfig, LoadError,
};
use repayment_simulator_core_rs::{Cadence, CadencePolicy, ConfigError, PeriodMode};
use std::fs;
use tempfile::TempDir;

fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 3, 15).unwrap()
}

#[test]
fn test_parses_original_key_names() {
    let json = r#"{
        "monthly_system_capacity": 5000,
        "active_nodes": [
            {"id": "NODE_A", "current_load": 20000, "overhead_factor": 0.15, "min_throughput": 500,
             "deprecation_date": "2025-12-31"},
            {"id": "NODE_B", "current_load": 5000, "overhead_factor": 0.05, "min_throughput": 200}
        ]
    }"#;

    let file = FileConfig::from_json_str(json).unwrap();
    assert_eq!(file.capacity, 5_000.0);
    assert_eq!(file.nodes.len(), 2);
    assert_eq!(file.nodes[0].balance, 20_000.0);
    assert_eq!(file.nodes[0].accrual_rate, 0.15);
    assert_eq!(file.nodes[0].min_payment, 500.0);
    assert_eq!(
        file.nodes[0].target_date,
        NaiveDate::from_ymd_opt(2025, 12, 31)
    );
    assert_eq!(file.nodes[1].target_date, None);
}

#[test]
fn test_parses_plain_aliases() {
    let json = r#"{
        "capacity": 750.5,
        "start_date": "2024-11-30",
        "period_mode": "semi_monthly",
        "max_periods": 90,
        "cadence_policy": "restrict_extra_only",
        "nodes": [
            {"id": "CARD", "balance": 3000, "accrual_rate": 0.24, "min_payment": 60,
             "cadence": "every_other_period", "target_date": "2026-01-01"}
        ]
    }"#;

    let config = FileConfig::from_json_str(json)
        .unwrap()
        .into_simulation_config(today())
        .unwrap();

    assert_eq!(config.capacity, 750.5);
    assert_eq!(config.start_date, NaiveDate::from_ymd_opt(2024, 11, 30).unwrap());
    assert_eq!(config.period_mode, PeriodMode::SemiMonthly);
    assert_eq!(config.max_periods, Some(90));
    assert_eq!(config.cadence_policy, CadencePolicy::RestrictExtraOnly);

    let node = &config.node_configs[0];
    assert_eq!(node.id, "CARD");
    assert_eq!(node.cadence, Cadence::EveryOtherPeriod);
    assert_eq!(node.target_date, NaiveDate::from_ymd_opt(2026, 1, 1));
}

#[test]
fn test_missing_fields_take_defaults() {
    let json = r#"{"monthly_system_capacity": 100, "active_nodes": [{"id": "X", "current_load": 50}]}"#;

    let config = FileConfig::from_json_str(json)
        .unwrap()
        .into_simulation_config(today())
        .unwrap();

    assert_eq!(config.start_date, today());
    assert_eq!(config.period_mode, PeriodMode::Monthly);
    assert_eq!(config.max_periods, None);
    assert_eq!(config.effective_max_periods(), 600);
    assert_eq!(config.cadence_policy, CadencePolicy::SkipOffPeriods);
    assert_eq!(config.node_configs[0].accrual_rate, 0.0);
    assert_eq!(config.node_configs[0].min_payment, 0.0);
    assert_eq!(config.node_configs[0].cadence, Cadence::EveryPeriod);
}

#[test]
fn test_cadence_alias_accepted() {
    let json = r#"{"capacity": 100, "nodes": [{"id": "X", "balance": 50, "cadence": "alternate"}]}"#;
    let file = FileConfig::from_json_str(json).unwrap();
    assert_eq!(file.nodes[0].cadence, Some(Cadence::EveryOtherPeriod));
}

#[test]
fn test_unknown_cadence_rejected() {
    let json = r#"{"capacity": 100, "nodes": [{"id": "X", "balance": 50, "cadence": "weekly"}]}"#;
    assert!(FileConfig::from_json_str(json).is_err());
}

#[test]
fn test_validation_runs_before_engine() {
    let empty = FileConfig::from_json_str(r#"{"capacity": 100}"#).unwrap();
    assert_eq!(
        empty.into_simulation_config(today()).unwrap_err(),
        ConfigError::EmptyLedger
    );

    let negative =
        FileConfig::from_json_str(r#"{"capacity": 100, "nodes": [{"id": "X", "balance": -1}]}"#)
            .unwrap();
    assert!(matches!(
        negative.into_simulation_config(today()),
        Err(ConfigError::InvalidNodeField { field: "balance", .. })
    ));

    let missing_id = FileConfig::from_json_str(r#"{"capacity": 100, "nodes": [{"balance": 10}]}"#)
        .unwrap();
    assert_eq!(
        missing_id.into_simulation_config(today()).unwrap_err(),
        ConfigError::EmptyNodeId
    );
}

#[test]
fn test_reference_default_validates() {
    let config = FileConfig::reference_default()
        .into_simulation_config(today())
        .unwrap();
    assert_eq!(config.capacity, 5_000.0);
    assert_eq!(config.node_configs.len(), 2);
    assert_eq!(config.node_configs[0].id, "NODE_A");
    assert_eq!(config.node_configs[1].id, "NODE_B");
}

#[test]
fn test_ensure_default_config_writes_once() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("config").join("dependencies.json");

    assert!(ensure_default_config(&path).unwrap());
    assert!(path.exists());

    let written = load_config(&path).unwrap();
    assert_eq!(written, FileConfig::reference_default());

    // Existing file is left alone
    fs::write(&path, r#"{"capacity": 1, "nodes": [{"id": "MINE", "balance": 1}]}"#).unwrap();
    assert!(!ensure_default_config(&path).unwrap());
    let kept = load_config(&path).unwrap();
    assert_eq!(kept.nodes[0].id, "MINE");
}

#[test]
fn test_written_default_uses_original_key_names() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("dependencies.json");
    ensure_default_config(&path).unwrap();

    let raw = fs::read_to_string(&path).unwrap();
    assert!(raw.contains("monthly_system_capacity"));
    assert!(raw.contains("active_nodes"));
    assert!(raw.contains("overhead_factor"));
}

#[test]
fn test_load_errors() {
    let dir = TempDir::new().unwrap();

    let missing = dir.path().join("absent.json");
    assert!(matches!(load_config(&missing), Err(LoadError::Io { .. })));

    let broken = dir.path().join("broken.json");
    fs::write(&broken, "{ this is not json").unwrap();
    assert!(matches!(load_config(&broken), Err(LoadError::Parse { .. })));
}
