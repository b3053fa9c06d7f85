use crate::series::TimeSeries;
use anyhow::{Context, Result, bail};
use chrono::{Datelike, Days, Months, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Calendar granularity of a time series.
///
/// Variants are declared from finest to coarsest, so `Days < Months < Years`.
#[derive(
    Debug, PartialEq, Eq, PartialOrd, Ord, Clone, Copy, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum TimeUnit {
    #[serde(alias = "day", alias = "D")]
    #[value(alias = "day", alias = "D")]
    Days,
    #[serde(alias = "month", alias = "M")]
    #[value(alias = "month", alias = "M")]
    Months,
    #[serde(alias = "year", alias = "Y")]
    #[value(alias = "year", alias = "Y")]
    Years,
}

impl TimeUnit {
    /// Get the date `n` units away from `date`.
    ///
    /// Month and year offsets clamp the day to the end of the target month.
    pub fn offset(self, date: NaiveDate, n: i64) -> Result<NaiveDate> {
        let mag = n.unsigned_abs();
        let new_date = match self {
            TimeUnit::Days => {
                let days = Days::new(mag);
                if n >= 0 {
                    date.checked_add_days(days)
                } else {
                    date.checked_sub_days(days)
                }
            }
            TimeUnit::Months | TimeUnit::Years => {
                let n_months = if self == TimeUnit::Years {
                    mag.checked_mul(12)
                } else {
                    Some(mag)
                };
                let n_months = n_months
                    .and_then(|n_months| u32::try_from(n_months).ok())
                    .with_context(|| format!("offset of {n} {self} is too large"))?;
                let months = Months::new(n_months);
                if n >= 0 {
                    date.checked_add_months(months)
                } else {
                    date.checked_sub_months(months)
                }
            }
        };
        new_date.with_context(|| format!("date {date} offset by {n} {self} is out of range"))
    }

    /// Get one date per period from the period of `start` up to, but excluding,
    /// the period of `end`.
    ///
    /// Dates are `start + k units`, each offset from `start` directly so the day
    /// of month never drifts. The result always holds `start` when `start < end`,
    /// even if both dates fall in the same period, and is empty otherwise.
    pub fn range(self, start: NaiveDate, end: NaiveDate) -> Result<Vec<NaiveDate>> {
        if start >= end {
            return Ok(Vec::new());
        }
        let n_periods = self.periods_between(start, end).max(1);
        (0..n_periods).map(|k| self.offset(start, k)).collect()
    }

    /// Get the calendar distance from `a` to `b` in whole units.
    pub fn periods_between(self, a: NaiveDate, b: NaiveDate) -> i64 {
        let years = i64::from(b.year()) - i64::from(a.year());
        match self {
            TimeUnit::Days => (b - a).num_days(),
            TimeUnit::Months => years * 12 + i64::from(b.month()) - i64::from(a.month()),
            TimeUnit::Years => years,
        }
    }

    /// Check that no two consecutive observations are more than one period apart.
    pub fn check_contiguous(self, series: &TimeSeries) -> Result<()> {
        for (obs_a, obs_b) in series.segments() {
            let n_periods = self.periods_between(obs_a.date, obs_b.date);
            if n_periods > 1 {
                bail!(
                    "there are gaps in the data: {} and {} are {n_periods} {self} apart, \
                     fill the gaps before proceeding",
                    obs_a.date,
                    obs_b.date
                );
            }
        }
        Ok(())
    }
}

impl fmt::Display for TimeUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TimeUnit::Days => "days",
            TimeUnit::Months => "months",
            TimeUnit::Years => "years",
        };
        f.write_str(name)
    }
}
