//! Tests for post-run target-date audits

use chrono::NaiveDate;
use repayment_simulator_core_rs::audit::classify;
use repayment_simulator_core_rs::{
    Cadence, CadencePolicy, NodeConfig, Orchestrator, PeriodMode, RunOutcome, SimulationConfig,
    Verdict,
};

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn node(id: &str, balance: f64, rate: f64, min: f64, target: Option<NaiveDate>) -> NodeConfig {
    NodeConfig {
        id: id.to_string(),
        balance,
        accrual_rate: rate,
        min_payment: min,
        cadence: Cadence::EveryPeriod,
        target_date: target,
    }
}

fn config(capacity: f64, nodes: Vec<NodeConfig>) -> SimulationConfig {
    SimulationConfig {
        capacity,
        start_date: date(2025, 1, 1),
        period_mode: PeriodMode::Monthly,
        max_periods: None,
        cadence_policy: CadencePolicy::SkipOffPeriods,
        node_configs: nodes,
    }
}

#[test]
fn test_classify_on_time_is_pass() {
    let finish = date(2025, 7, 1);
    assert_eq!(
        classify(Some(date(2025, 7, 1)), finish, true),
        (Verdict::Pass, Some(0))
    );
    assert_eq!(
        classify(Some(date(2025, 7, 11)), finish, true),
        (Verdict::Pass, Some(10))
    );
}

#[test]
fn test_classify_late_is_fail() {
    let finish = date(2025, 7, 1);
    assert_eq!(
        classify(Some(date(2025, 6, 30)), finish, true),
        (Verdict::Fail, Some(-1))
    );
}

#[test]
fn test_classify_without_target_is_info() {
    assert_eq!(classify(None, date(2025, 7, 1), true), (Verdict::Info, None));
    assert_eq!(classify(None, date(2025, 7, 1), false), (Verdict::Info, None));
}

#[test]
fn test_classify_unfinished_run_is_fail_even_before_target() {
    assert_eq!(
        classify(Some(date(2099, 1, 1)), date(2030, 1, 1), false),
        (Verdict::Fail, Some((date(2099, 1, 1) - date(2030, 1, 1)).num_days()))
    );
}

#[test]
fn test_audits_use_overall_finish_date() {
    let result = Orchestrator::new(config(
        5_000.0,
        vec![
            node("NODE_A", 20_000.0, 0.15, 500.0, Some(date(2025, 12, 31))),
            node("NODE_B", 5_000.0, 0.05, 200.0, Some(date(2025, 6, 1))),
            node("NODE_C", 0.0, 0.02, 0.0, None),
        ],
    ))
    .unwrap()
    .run()
    .unwrap();

    assert_eq!(result.outcome, RunOutcome::Completed);
    assert_eq!(result.finish_date, date(2025, 7, 1));
    assert_eq!(result.audits.len(), 3);

    let a = &result.audits[0];
    assert_eq!(a.node_id, "NODE_A");
    assert_eq!(a.verdict, Verdict::Pass);
    assert_eq!(a.days_margin, Some(183));

    let b = &result.audits[1];
    assert_eq!(b.node_id, "NODE_B");
    assert_eq!(b.verdict, Verdict::Fail);
    assert_eq!(b.days_margin, Some(-30));

    let c = &result.audits[2];
    assert_eq!(c.node_id, "NODE_C");
    assert_eq!(c.verdict, Verdict::Info);
    assert_eq!(c.target_date, None);
    assert_eq!(c.days_margin, None);
}

#[test]
fn test_aborted_run_fails_every_targeted_node() {
    let mut cfg = config(
        0.0,
        vec![
            node("DEBT", 100.0, 1.0, 0.0, Some(date(2200, 1, 1))),
            node("OTHER", 50.0, 0.5, 0.0, None),
        ],
    );
    cfg.max_periods = Some(12);

    let result = Orchestrator::new(cfg).unwrap().run().unwrap();

    assert_eq!(result.outcome, RunOutcome::Aborted);
    assert_eq!(result.audits[0].verdict, Verdict::Fail);
    assert!(result.audits[0].days_margin.unwrap() > 0);
    assert_eq!(result.audits[1].verdict, Verdict::Info);
}
