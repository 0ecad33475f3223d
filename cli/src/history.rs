//! CSV export of the balance history, for external charting

use std::path::Path;

use anyhow::{Context, Result};
use repayment_simulator_core_rs::HistorySample;

/// Write `period,date,total_balance` rows
pub fn write_history_csv(path: &Path, history: &[HistorySample]) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("Failed to create {}", path.display()))?;
    for sample in history {
        writer.serialize(sample)?;
    }
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn test_history_csv_has_header_and_rows() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("history.csv");
        let history = vec![
            HistorySample {
                period: 1,
                date: NaiveDate::from_ymd_opt(2025, 2, 1).unwrap(),
                total_balance: 1500.5,
            },
            HistorySample {
                period: 2,
                date: NaiveDate::from_ymd_opt(2025, 3, 1).unwrap(),
                total_balance: 0.0,
            },
        ];

        write_history_csv(&path, &history).unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(lines[0], "period,date,total_balance");
        assert_eq!(lines[1], "1,2025-02-01,1500.5");
        assert_eq!(lines.len(), 3);
    }
}
