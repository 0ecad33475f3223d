//! Console report for a finished run
//!
//! All text formatting lives here; the engine only hands over typed values.

use std::fmt;

use repayment_simulator_core_rs::{NodeAudit, RunOutcome, RunResult, Verdict};

const RULE: &str = "----------------------------------";

/// Render the optimization report
pub fn render_report(result: &RunResult) -> String {
    Report(result).to_string()
}

struct Report<'a>(&'a RunResult);

impl fmt::Display for Report<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let result = self.0;

        writeln!(f, "\n--- SYSTEM OPTIMIZATION REPORT ---")?;
        writeln!(f, "Total Iterations (Periods): {}", result.period_count)?;
        // An aborted run never reaches a release date
        if result.outcome == RunOutcome::Completed {
            writeln!(
                f,
                "Projected Release Date:    {}",
                result.finish_date.format("%B %Y")
            )?;
        }
        writeln!(
            f,
            "Total Overhead Waste:      {} units",
            format_thousands(result.total_accrual)
        )?;
        writeln!(f, "{}", RULE)?;

        for audit in &result.audits {
            writeln!(f, "{}", audit_line(audit))?;
        }

        match result.outcome {
            RunOutcome::Completed => writeln!(f, "[SUCCESS] All external dependencies resolved."),
            RunOutcome::Aborted => {
                writeln!(
                    f,
                    "[CRITICAL WARNING] Resource leak detected. Overhead exceeds throughput."
                )?;
                writeln!(
                    f,
                    "Outstanding after {} periods: {} units",
                    result.period_count,
                    format_thousands(result.remaining_balance)
                )
            }
        }
    }
}

fn audit_line(audit: &NodeAudit) -> String {
    match (audit.verdict, audit.target_date, audit.days_margin) {
        (Verdict::Info, _, _) | (_, None, _) | (_, _, None) => {
            format!("[INFO] {}: no target date", audit.node_id)
        }
        (Verdict::Pass, Some(target), Some(margin)) => {
            format!("[PASS] {}: target {} ({} days to spare)", audit.node_id, target, margin)
        }
        (Verdict::Fail, Some(target), Some(margin)) if margin >= 0 => {
            format!("[FAIL] {}: target {} (never cleared)", audit.node_id, target)
        }
        (Verdict::Fail, Some(target), Some(margin)) => {
            format!("[FAIL] {}: target {} ({} days late)", audit.node_id, target, -margin)
        }
    }
}

/// Two decimals with comma thousands separators
fn format_thousands(value: f64) -> String {
    let formatted = format!("{:.2}", value.abs());
    let (int_part, frac_part) = formatted.split_once('.').unwrap_or((formatted.as_str(), "00"));

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, digit) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }

    let sign = if value < 0.0 && formatted != "0.00" { "-" } else { "" };
    format!("{}{}.{}", sign, grouped, frac_part)
}
