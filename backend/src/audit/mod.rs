//! Post-run audit against node target dates
//!
//! Compares the run's overall finish date with each node's optional target
//! date. Individual nodes that clear early are not tracked separately: every
//! node is judged against the date the whole ledger was cleared.

use crate::models::node::Node;
use crate::orchestrator::RunOutcome;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Three-way audit classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Verdict {
    /// Finished on or before the target date
    Pass,
    /// Finished after the target date, or never finished
    Fail,
    /// No target date configured
    Info,
}

/// Audit line for one node
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeAudit {
    pub node_id: String,
    pub target_date: Option<NaiveDate>,
    pub verdict: Verdict,
    /// `target_date - finish_date` in days; negative means late
    pub days_margin: Option<i64>,
}

/// Classify a single target date against the finish date
///
/// # Example
/// ```
/// use chrono::NaiveDate;
/// use repayment_simulator_core_rs::audit::{classify, Verdict};
///
/// let finish = NaiveDate::from_ymd_opt(2026, 6, 1).unwrap();
/// let target = NaiveDate::from_ymd_opt(2026, 6, 1).unwrap();
/// assert_eq!(classify(Some(target), finish, true), (Verdict::Pass, Some(0)));
/// assert_eq!(classify(None, finish, true), (Verdict::Info, None));
/// ```
pub fn classify(
    target_date: Option<NaiveDate>,
    finish_date: NaiveDate,
    completed: bool,
) -> (Verdict, Option<i64>) {
    match target_date {
        None => (Verdict::Info, None),
        Some(target) => {
            let margin = (target - finish_date).num_days();
            let verdict = if completed && margin >= 0 {
                Verdict::Pass
            } else {
                Verdict::Fail
            };
            (verdict, Some(margin))
        }
    }
}

/// Audit every node in ledger order
pub fn audit_nodes(nodes: &[Node], finish_date: NaiveDate, outcome: RunOutcome) -> Vec<NodeAudit> {
    let completed = outcome == RunOutcome::Completed;
    nodes
        .iter()
        .map(|node| {
            let (verdict, days_margin) = classify(node.target_date(), finish_date, completed);
            NodeAudit {
                node_id: node.id().to_string(),
                target_date: node.target_date(),
                verdict,
                days_margin,
            }
        })
        .collect()
}
