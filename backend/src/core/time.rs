//! Time management for the simulation
//!
//! The simulation operates in discrete periods. A period is either a calendar
//! month or half of one, depending on the [`PeriodMode`]. This module provides
//! deterministic period advancement and the calendar date of each period end.

use chrono::{Days, Months, NaiveDate};
use serde::{Deserialize, Serialize};

/// Length of one simulation period
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PeriodMode {
    /// One period per calendar month (12 per year)
    #[default]
    Monthly,
    /// Two periods per calendar month (24 per year)
    #[serde(alias = "semimonthly")]
    SemiMonthly,
}

impl PeriodMode {
    /// Number of periods in one year, used to de-annualize accrual rates
    pub fn periods_per_year(self) -> u32 {
        match self {
            PeriodMode::Monthly => 12,
            PeriodMode::SemiMonthly => 24,
        }
    }

    /// Default safety bound: 50 years of monthly periods, 20 years of semi-monthly ones
    pub fn default_max_periods(self) -> usize {
        match self {
            PeriodMode::Monthly => 600,
            PeriodMode::SemiMonthly => 480,
        }
    }
}

/// Manages simulation time in discrete periods
///
/// # Example
/// ```
/// use chrono::NaiveDate;
/// use repayment_simulator_core_rs::{PeriodClock, PeriodMode};
///
/// let start = NaiveDate::from_ymd_opt(2025, 1, 15).unwrap();
/// let mut clock = PeriodClock::new(start, PeriodMode::Monthly);
/// assert_eq!(clock.current_period(), 0);
///
/// clock.advance_period();
/// assert_eq!(clock.current_period(), 1);
/// assert_eq!(clock.current_date(), NaiveDate::from_ymd_opt(2025, 2, 15).unwrap());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PeriodClock {
    /// Date the simulation starts from (period 0)
    start_date: NaiveDate,
    /// Periods elapsed since start
    current_period: usize,
    mode: PeriodMode,
}

impl PeriodClock {
    /// Create a clock positioned at period 0
    pub fn new(start_date: NaiveDate, mode: PeriodMode) -> Self {
        Self {
            start_date,
            current_period: 0,
            mode,
        }
    }

    /// Create a clock positioned at an arbitrary period (checkpoint restore)
    pub fn at_period(start_date: NaiveDate, mode: PeriodMode, period: usize) -> Self {
        Self {
            start_date,
            current_period: period,
            mode,
        }
    }

    /// Advance time by one period
    pub fn advance_period(&mut self) {
        self.current_period += 1;
    }

    /// Periods elapsed since start (0 before the first period runs)
    pub fn current_period(&self) -> usize {
        self.current_period
    }

    pub fn mode(&self) -> PeriodMode {
        self.mode
    }

    pub fn start_date(&self) -> NaiveDate {
        self.start_date
    }

    /// Date at the end of the current period
    pub fn current_date(&self) -> NaiveDate {
        self.date_of(self.current_period)
    }

    /// Date at the end of `period`
    ///
    /// Month arithmetic clamps to the last day of shorter months, so a
    /// January 31st start lands on February 28th (or 29th) after one period.
    /// Dates past chrono's representable range saturate at `NaiveDate::MAX`.
    ///
    /// # Example
    /// ```
    /// use chrono::NaiveDate;
    /// use repayment_simulator_core_rs::{PeriodClock, PeriodMode};
    ///
    /// let start = NaiveDate::from_ymd_opt(2025, 1, 1).unwrap();
    /// let clock = PeriodClock::new(start, PeriodMode::SemiMonthly);
    /// assert_eq!(clock.date_of(1), NaiveDate::from_ymd_opt(2025, 1, 16).unwrap());
    /// assert_eq!(clock.date_of(2), NaiveDate::from_ymd_opt(2025, 2, 1).unwrap());
    /// ```
    pub fn date_of(&self, period: usize) -> NaiveDate {
        let (months, extra_days) = match self.mode {
            PeriodMode::Monthly => (period, 0),
            PeriodMode::SemiMonthly => (period / 2, if period % 2 == 1 { 15 } else { 0 }),
        };

        u32::try_from(months)
            .ok()
            .and_then(|m| self.start_date.checked_add_months(Months::new(m)))
            .and_then(|d| d.checked_add_days(Days::new(extra_days)))
            .unwrap_or(NaiveDate::MAX)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_month_end_clamps() {
        let start = NaiveDate::from_ymd_opt(2024, 1, 31).unwrap();
        let clock = PeriodClock::new(start, PeriodMode::Monthly);
        assert_eq!(clock.date_of(1), NaiveDate::from_ymd_opt(2024, 2, 29).unwrap());
    }

    #[test]
    fn test_far_future_saturates() {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let clock = PeriodClock::new(start, PeriodMode::Monthly);
        assert_eq!(clock.date_of(usize::MAX), NaiveDate::MAX);
    }
}
