//! Time series data types.

use anyhow::{Result, bail};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Single observation of a time series.
#[derive(Debug, PartialEq, Clone, Copy, Serialize, Deserialize)]
pub struct Observation {
    /// Observation date.
    pub date: NaiveDate,

    /// Observed value.
    pub value: f64,
}

impl Observation {
    pub fn new(date: NaiveDate, value: f64) -> Self {
        Self { date, value }
    }
}

/// Ordered sequence of observations.
///
/// Dates are strictly increasing once constructed, see [`TimeSeries::new`].
#[derive(Debug, PartialEq, Clone, Default, Serialize, Deserialize)]
pub struct TimeSeries {
    obs_vec: Vec<Observation>,
}

impl TimeSeries {
    /// Create a new `TimeSeries` from observations in any order.
    ///
    /// Observations are sorted by date and exact duplicates are collapsed.
    ///
    /// # Errors
    /// Returns an error if a value is not finite or if the same date
    /// appears with two different values.
    pub fn new(mut obs_vec: Vec<Observation>) -> Result<Self> {
        for obs in &obs_vec {
            check_finite(obs.date, obs.value)?;
        }

        obs_vec.sort_by_key(|obs| obs.date);

        let mut dedup_vec: Vec<Observation> = Vec::with_capacity(obs_vec.len());
        for obs in obs_vec {
            match dedup_vec.last() {
                Some(prev) if prev.date == obs.date => {
                    if prev.value != obs.value {
                        bail!(
                            "date {} appears twice with different values ({} and {})",
                            obs.date,
                            prev.value,
                            obs.value
                        );
                    }
                }
                _ => dedup_vec.push(obs),
            }
        }

        Ok(Self { obs_vec: dedup_vec })
    }

    /// Create a `TimeSeries` from observations already known to be strictly increasing.
    pub(crate) fn from_sorted(obs_vec: Vec<Observation>) -> Self {
        debug_assert!(obs_vec.windows(2).all(|pair| pair[0].date < pair[1].date));
        Self { obs_vec }
    }

    pub fn len(&self) -> usize {
        self.obs_vec.len()
    }

    pub fn is_empty(&self) -> bool {
        self.obs_vec.is_empty()
    }

    pub fn first(&self) -> Option<&Observation> {
        self.obs_vec.first()
    }

    pub fn last(&self) -> Option<&Observation> {
        self.obs_vec.last()
    }

    pub fn observations(&self) -> &[Observation] {
        &self.obs_vec
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Observation> {
        self.obs_vec.iter()
    }

    pub fn dates(&self) -> Vec<NaiveDate> {
        self.obs_vec.iter().map(|obs| obs.date).collect()
    }

    pub fn values(&self) -> Vec<f64> {
        self.obs_vec.iter().map(|obs| obs.value).collect()
    }

    /// Get the observed value on `date`, if any.
    pub fn value_on(&self, date: NaiveDate) -> Option<f64> {
        self.obs_vec
            .binary_search_by_key(&date, |obs| obs.date)
            .ok()
            .map(|idx| self.obs_vec[idx].value)
    }

    /// Get the observations with dates in `start..=end`.
    pub fn window(&self, start: NaiveDate, end: NaiveDate) -> TimeSeries {
        let lo = self.obs_vec.partition_point(|obs| obs.date < start);
        let hi = self.obs_vec.partition_point(|obs| obs.date <= end);
        let obs_vec = if lo < hi {
            self.obs_vec[lo..hi].to_vec()
        } else {
            Vec::new()
        };
        Self { obs_vec }
    }

    /// Consecutive pairs of observations.
    pub(crate) fn segments(&self) -> impl Iterator<Item = (&Observation, &Observation)> {
        self.obs_vec.windows(2).map(|pair| (&pair[0], &pair[1]))
    }
}

pub(crate) fn check_finite(date: NaiveDate, value: f64) -> Result<()> {
    if !value.is_finite() {
        bail!("value must be finite, but is {value} on {date}");
    }
    Ok(())
}

impl<'a> IntoIterator for &'a TimeSeries {
    type Item = &'a Observation;
    type IntoIter = std::slice::Iter<'a, Observation>;

    fn into_iter(self) -> Self::IntoIter {
        self.obs_vec.iter()
    }
}

#[cfg(test)]
pub(crate) fn date(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").expect("invalid test date")
}

#[cfg(test)]
pub(crate) fn series(pairs: &[(&str, f64)]) -> TimeSeries {
    let obs_vec = pairs
        .iter()
        .map(|&(d, v)| Observation::new(date(d), v))
        .collect();
    TimeSeries::new(obs_vec).expect("invalid test series")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_sorts_and_collapses_duplicates() {
        let ts = series(&[
            ("2020-03-01", 3.0),
            ("2020-01-01", 1.0),
            ("2020-02-01", 2.0),
            ("2020-01-01", 1.0),
        ]);
        assert_eq!(
            ts.dates(),
            vec![date("2020-01-01"), date("2020-02-01"), date("2020-03-01")]
        );
        assert_eq!(ts.values(), vec![1.0, 2.0, 3.0]);
    }

    #[test]
    fn new_rejects_conflicting_duplicates() {
        let obs_vec = vec![
            Observation::new(date("2020-01-01"), 1.0),
            Observation::new(date("2020-01-01"), 2.0),
        ];
        let err = TimeSeries::new(obs_vec).unwrap_err();
        assert!(err.to_string().contains("appears twice"));
    }

    #[test]
    fn new_rejects_non_finite_values() {
        let obs_vec = vec![Observation::new(date("2020-01-01"), f64::NAN)];
        assert!(TimeSeries::new(obs_vec).is_err());
    }

    #[test]
    fn window_is_inclusive() {
        let ts = series(&[
            ("2020-01-01", 1.0),
            ("2020-02-01", 2.0),
            ("2020-03-01", 3.0),
            ("2020-04-01", 4.0),
        ]);
        let win = ts.window(date("2020-02-01"), date("2020-03-01"));
        assert_eq!(win.values(), vec![2.0, 3.0]);
        assert!(ts.window(date("2021-01-01"), date("2020-01-01")).is_empty());
    }

    #[test]
    fn value_on_finds_exact_dates_only() {
        let ts = series(&[("2020-01-01", 1.0), ("2020-02-01", 2.0)]);
        assert_eq!(ts.value_on(date("2020-02-01")), Some(2.0));
        assert_eq!(ts.value_on(date("2020-01-15")), None);
    }
}
