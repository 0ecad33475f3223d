//! Property tests for engine invariants over random ledgers
//!
//! - Balances never go negative
//! - Per-node flows balance: start + accrued - paid == end
//! - Avalanche funds never skip an open, due, higher-priority node
//! - Ledger order is a stable sort by accrual rate
//! - Runs are deterministic and respect the safety bound

use chrono::NaiveDate;
use proptest::prelude::*;
use repayment_simulator_core_rs::{
    Cadence, CadencePolicy, Event, NodeConfig, Orchestrator, PeriodMode, RunOutcome,
    SimulationConfig,
};

fn node_strategy() -> impl Strategy<Value = (f64, f64, f64, bool)> {
    (
        0.0..50_000.0_f64,
        // Repeated rates exercise tie ordering
        prop_oneof![Just(0.05), Just(0.15), 0.0..0.4_f64],
        0.0..800.0_f64,
        any::<bool>(),
    )
}

fn config_strategy() -> impl Strategy<Value = SimulationConfig> {
    (
        prop::collection::vec(node_strategy(), 1..=4),
        0.0..6_000.0_f64,
        1_usize..120,
        any::<bool>(),
        any::<bool>(),
    )
        .prop_map(|(nodes, capacity, max_periods, semi_monthly, restrict)| {
            SimulationConfig {
                capacity,
                start_date: NaiveDate::from_ymd_opt(2025, 1, 31).unwrap(),
                period_mode: if semi_monthly {
                    PeriodMode::SemiMonthly
                } else {
                    PeriodMode::Monthly
                },
                max_periods: Some(max_periods),
                cadence_policy: if restrict {
                    CadencePolicy::RestrictExtraOnly
                } else {
                    CadencePolicy::SkipOffPeriods
                },
                node_configs: nodes
                    .into_iter()
                    .enumerate()
                    .map(|(i, (balance, accrual_rate, min_payment, alternate))| NodeConfig {
                        id: format!("N{}", i),
                        balance,
                        accrual_rate,
                        min_payment,
                        cadence: if alternate {
                            Cadence::EveryOtherPeriod
                        } else {
                            Cadence::EveryPeriod
                        },
                        target_date: None,
                    })
                    .collect(),
            }
        })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn balances_stay_non_negative(config in config_strategy()) {
        let mut orchestrator = Orchestrator::new(config).unwrap();
        while !orchestrator.state().is_terminal() {
            orchestrator.step().unwrap();
            for node in orchestrator.ledger().nodes() {
                prop_assert!(node.balance() >= 0.0, "{} went negative", node.id());
            }
        }
    }

    #[test]
    fn per_node_flows_balance(config in config_strategy()) {
        let mut orchestrator = Orchestrator::new(config).unwrap();
        let result = orchestrator.run().unwrap();

        for (totals, node) in result.node_totals.iter().zip(orchestrator.ledger().nodes()) {
            prop_assert_eq!(&totals.node_id, node.id());
            let owed = totals.starting_balance + totals.accrued;
            let drift = owed - totals.total_paid() - node.balance();
            prop_assert!(drift.abs() <= 1e-9 * owed.max(1.0), "{} drifted by {}", node.id(), drift);
        }
    }

    #[test]
    fn avalanche_never_skips_open_higher_priority_node(config in config_strategy()) {
        let mut orchestrator = Orchestrator::new(config).unwrap();

        while !orchestrator.state().is_terminal() {
            let period = orchestrator.step().unwrap().period;
            let nodes = orchestrator.ledger().nodes();

            let funded: Vec<usize> = orchestrator
                .event_log()
                .events_at_period(period)
                .into_iter()
                .filter_map(|e| match e {
                    Event::AvalanchePayment { node_id, .. } => {
                        nodes.iter().position(|n| n.id() == node_id)
                    }
                    _ => None,
                })
                .collect();

            for &j in &funded {
                for higher in &nodes[..j] {
                    if higher.cadence().is_due(period) {
                        prop_assert!(
                            higher.is_settled(),
                            "period {}: {} funded while {} still open",
                            period,
                            nodes[j].id(),
                            higher.id()
                        );
                    }
                }
            }
        }
    }

    #[test]
    fn ledger_order_is_stable_sort_by_rate(config in config_strategy()) {
        let orchestrator = Orchestrator::new(config.clone()).unwrap();
        let nodes = orchestrator.ledger().nodes();
        prop_assert_eq!(nodes.len(), config.node_configs.len());

        // Input position of each ledger entry; also proves the ledger is a permutation
        let input_index: Vec<usize> = nodes
            .iter()
            .map(|n| config.node_configs.iter().position(|c| c.id == n.id()).unwrap())
            .collect();
        let mut seen = input_index.clone();
        seen.sort_unstable();
        seen.dedup();
        prop_assert_eq!(seen.len(), nodes.len());

        for i in 0..nodes.len() {
            for j in (i + 1)..nodes.len() {
                let (earlier, later) = (&nodes[i], &nodes[j]);
                prop_assert!(
                    earlier.accrual_rate() >= later.accrual_rate(),
                    "{} ({}) ahead of {} ({})",
                    earlier.id(),
                    earlier.accrual_rate(),
                    later.id(),
                    later.accrual_rate()
                );
                if earlier.accrual_rate() == later.accrual_rate() {
                    prop_assert!(
                        input_index[i] < input_index[j],
                        "tie between {} and {} reordered",
                        earlier.id(),
                        later.id()
                    );
                }
            }
        }
    }

    #[test]
    fn runs_are_deterministic_and_bounded(config in config_strategy()) {
        let bound = config.effective_max_periods();
        let first = Orchestrator::new(config.clone()).unwrap().run().unwrap();
        let second = Orchestrator::new(config).unwrap().run().unwrap();

        prop_assert_eq!(&first, &second);
        prop_assert!(first.period_count <= bound);
        prop_assert_eq!(first.history.len(), first.period_count);
        match first.outcome {
            RunOutcome::Aborted => {
                prop_assert_eq!(first.period_count, bound);
                prop_assert!(first.remaining_balance > 0.0);
            }
            RunOutcome::Completed => prop_assert_eq!(first.remaining_balance, 0.0),
        }
    }
}
