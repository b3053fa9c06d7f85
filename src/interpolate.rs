//! Gap filling and frequency conversion.

use crate::rate::RateType;
use crate::series::{Observation, TimeSeries, check_finite};
use crate::units::TimeUnit;
use anyhow::{Context, Result, bail};
use chrono::NaiveDate;
use std::cmp::Ordering;

/// Fill the gaps between consecutive observations.
///
/// Every segment between two observations is split into one step per
/// `time_units` period and filled at a constant per-step rate. Observed
/// values are kept exactly, and filling a complete series returns it unchanged.
pub fn fill_gaps(
    series: &TimeSeries,
    rate_type: RateType,
    time_units: TimeUnit,
) -> Result<TimeSeries> {
    let Some(&last) = series.last() else {
        return Ok(series.clone());
    };

    let mut obs_vec = Vec::with_capacity(series.len());
    for (obs_a, obs_b) in series.segments() {
        let dates = time_units.range(obs_a.date, obs_b.date)?;
        obs_vec.push(*obs_a);
        if dates.len() < 2 {
            continue;
        }

        let segment = || format!("failed to fill from {} to {}", obs_a.date, obs_b.date);
        let rate = rate_type
            .rate(obs_a.value, obs_b.value, dates.len())
            .with_context(segment)?;
        for (n, date) in dates.into_iter().enumerate().skip(1) {
            let value = rate_type.project(obs_a.value, rate, n);
            check_finite(date, value).with_context(segment)?;
            obs_vec.push(Observation::new(date, value));
        }
    }
    obs_vec.push(last);

    log::debug!(
        "filled {} observations into {} ({rate_type}, {time_units})",
        series.len(),
        obs_vec.len()
    );

    Ok(TimeSeries::from_sorted(obs_vec))
}

/// Convert a complete yearly series into a monthly one.
pub fn yearly_to_monthly(series: &TimeSeries, rate_type: RateType) -> Result<TimeSeries> {
    convert(series, rate_type, TimeUnit::Years, TimeUnit::Months)
}

/// Convert a complete monthly series into a daily one.
pub fn monthly_to_daily(series: &TimeSeries, rate_type: RateType) -> Result<TimeSeries> {
    convert(series, rate_type, TimeUnit::Months, TimeUnit::Days)
}

/// Convert a series sampled every `from` period into one sampled every `to` period.
///
/// Converting to a finer unit requires the input to have no gaps at `from`
/// granularity. Converting to a coarser unit samples the series once per `to`
/// period, anchored at the first observation.
pub fn convert(
    series: &TimeSeries,
    rate_type: RateType,
    from: TimeUnit,
    to: TimeUnit,
) -> Result<TimeSeries> {
    match to.cmp(&from) {
        Ordering::Less => {
            from.check_contiguous(series)
                .with_context(|| format!("input is not a complete series in {from}"))?;
            fill_gaps(series, rate_type, to)
        }
        Ordering::Equal => fill_gaps(series, rate_type, to),
        Ordering::Greater => downsample(series, rate_type, to),
    }
}

fn downsample(series: &TimeSeries, rate_type: RateType, to: TimeUnit) -> Result<TimeSeries> {
    let (Some(first), Some(last)) = (series.first(), series.last()) else {
        return Ok(series.clone());
    };

    let mut obs_vec = Vec::new();
    for k in 0.. {
        let date = to.offset(first.date, k)?;
        if date > last.date {
            break;
        }
        let value = value_at(series, rate_type, date)
            .with_context(|| format!("failed to resample {date}"))?;
        obs_vec.push(Observation::new(date, value));
    }

    log::debug!(
        "downsampled {} observations into {} ({rate_type}, {to})",
        series.len(),
        obs_vec.len()
    );

    Ok(TimeSeries::from_sorted(obs_vec))
}

/// Get the value of the series on `date`.
///
/// Observed dates return the observed value. Dates between two observations
/// are interpolated with the closed-form rate model, time measured in days.
///
/// # Errors
/// Returns an error if `date` lies outside the observed range.
pub fn value_at(series: &TimeSeries, rate_type: RateType, date: NaiveDate) -> Result<f64> {
    let obs_vec = series.observations();
    let (Some(first), Some(last)) = (obs_vec.first(), obs_vec.last()) else {
        bail!("series is empty");
    };

    let idx = obs_vec.partition_point(|obs| obs.date < date);
    if let Some(obs) = obs_vec.get(idx) {
        if obs.date == date {
            return Ok(obs.value);
        }
    }
    if idx == 0 || idx == obs_vec.len() {
        bail!(
            "date {date} is outside the series range {} to {}",
            first.date,
            last.date
        );
    }

    let obs_a = &obs_vec[idx - 1];
    let obs_b = &obs_vec[idx];
    let t1 = (obs_b.date - obs_a.date).num_days() as f64;
    let t = (date - obs_a.date).num_days() as f64;
    let value = rate_type.interpolate(obs_a.value, obs_b.value, 0.0, t1, t)?;
    check_finite(date, value)?;
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::series::{date, series};

    const TOL: f64 = 1e-9;

    #[test]
    fn fill_gaps_linear_daily() {
        let ts = series(&[("2020-01-01", 0.0), ("2020-01-05", 8.0), ("2020-01-06", 5.0)]);
        let filled = fill_gaps(&ts, RateType::Linear, TimeUnit::Days).unwrap();
        assert_eq!(filled.len(), 6);
        assert_eq!(filled.values(), vec![0.0, 2.0, 4.0, 6.0, 8.0, 5.0]);
        assert_eq!(filled.last().unwrap().date, date("2020-01-06"));
    }

    #[test]
    fn fill_gaps_exponential_monthly() {
        let ts = series(&[("2020-01-01", 100.0), ("2020-04-01", 133.1)]);
        let filled = fill_gaps(&ts, RateType::Exponential, TimeUnit::Months).unwrap();
        assert_eq!(
            filled.dates(),
            vec![
                date("2020-01-01"),
                date("2020-02-01"),
                date("2020-03-01"),
                date("2020-04-01")
            ]
        );
        let expected = [100.0, 110.0, 121.0, 133.1];
        for (val, exp) in filled.values().iter().zip(expected) {
            assert!((val - exp).abs() < TOL, "{val} != {exp}");
        }
    }

    #[test]
    fn fill_gaps_keeps_short_series() {
        let empty = TimeSeries::default();
        assert!(fill_gaps(&empty, RateType::Linear, TimeUnit::Days).unwrap().is_empty());

        let single = series(&[("2020-01-01", 1.0)]);
        let filled = fill_gaps(&single, RateType::Exponential, TimeUnit::Years).unwrap();
        assert_eq!(filled, single);
    }

    #[test]
    fn fill_gaps_is_idempotent() {
        let ts = series(&[("2020-01-31", 1.0), ("2020-05-31", 5.0), ("2020-07-15", 2.0)]);
        let once = fill_gaps(&ts, RateType::Linear, TimeUnit::Months).unwrap();
        let twice = fill_gaps(&once, RateType::Linear, TimeUnit::Months).unwrap();
        assert_eq!(once, twice);
    }

    #[test]
    fn fill_gaps_rejects_exponential_sign_change() {
        let ts = series(&[("2020-01-01", -1.0), ("2020-01-03", 1.0)]);
        let err = fill_gaps(&ts, RateType::Exponential, TimeUnit::Days).unwrap_err();
        assert!(format!("{err:#}").contains("sign change"));
    }

    #[test]
    fn fill_gaps_rejects_overflowing_values() {
        let ts = series(&[("2020-01-01", -1.5e308), ("2020-01-03", 1.5e308)]);
        let err = fill_gaps(&ts, RateType::Linear, TimeUnit::Days).unwrap_err();
        assert!(format!("{err:#}").contains("from 2020-01-01 to 2020-01-03"));

        let ts = series(&[("2020-01-01", 1e-200), ("2020-01-03", 1e200)]);
        let err = fill_gaps(&ts, RateType::Exponential, TimeUnit::Days).unwrap_err();
        assert!(format!("{err:#}").contains("not finite"));
    }

    #[test]
    fn fill_gaps_keeps_first_observation_of_each_segment() {
        let ts = series(&[("2020-01-01", -1.0e308), ("2020-01-02", 1.0e308)]);
        let filled = fill_gaps(&ts, RateType::Linear, TimeUnit::Days).unwrap();
        assert_eq!(filled, ts);
    }

    #[test]
    fn monthly_to_daily_preserves_month_boundaries() {
        let ts = series(&[("2021-01-01", 31.0), ("2021-02-01", 62.0), ("2021-03-01", 90.0)]);
        let daily = monthly_to_daily(&ts, RateType::Linear).unwrap();
        assert_eq!(daily.len(), 31 + 28 + 1);
        for obs in &ts {
            assert_eq!(daily.value_on(obs.date), Some(obs.value));
        }
        assert_eq!(daily.value_on(date("2021-01-02")), Some(32.0));
        assert_eq!(daily.value_on(date("2021-02-15")), Some(76.0));
    }

    #[test]
    fn monthly_to_daily_requires_complete_months() {
        let ts = series(&[("2021-01-01", 1.0), ("2021-03-01", 3.0)]);
        let err = monthly_to_daily(&ts, RateType::Linear).unwrap_err();
        assert!(format!("{err:#}").contains("gaps"));
    }

    #[test]
    fn yearly_to_monthly_spreads_each_year() {
        let ts = series(&[("2020-01-01", 0.0), ("2021-01-01", 12.0), ("2022-01-01", 36.0)]);
        let monthly = yearly_to_monthly(&ts, RateType::Linear).unwrap();
        assert_eq!(monthly.len(), 25);
        assert_eq!(monthly.value_on(date("2020-07-01")), Some(6.0));
        assert_eq!(monthly.value_on(date("2021-07-01")), Some(24.0));
        assert_eq!(monthly.last().unwrap().value, 36.0);
    }

    #[test]
    fn convert_to_coarser_unit_samples_anchored_dates() {
        let ts = series(&[("2021-01-01", 0.0), ("2021-03-01", 59.0), ("2021-03-20", 78.0)]);
        let monthly = convert(&ts, RateType::Linear, TimeUnit::Days, TimeUnit::Months).unwrap();
        assert_eq!(
            monthly.dates(),
            vec![date("2021-01-01"), date("2021-02-01"), date("2021-03-01")]
        );
        let values = monthly.values();
        assert!((values[1] - 31.0).abs() < TOL);
        assert_eq!(values[2], 59.0);
    }

    #[test]
    fn convert_to_years_clamps_leap_day_anchor() {
        let ts = series(&[
            ("2020-02-29", 100.0),
            ("2022-02-28", 400.0),
            ("2022-03-31", 500.0),
        ]);
        let yearly =
            convert(&ts, RateType::Exponential, TimeUnit::Months, TimeUnit::Years).unwrap();
        assert_eq!(
            yearly.dates(),
            vec![date("2020-02-29"), date("2021-02-28"), date("2022-02-28")]
        );
        let values = yearly.values();
        assert_eq!(values[0], 100.0);
        assert!((values[1] - 200.0).abs() < TOL);
        assert_eq!(values[2], 400.0);
    }

    #[test]
    fn convert_to_months_clamps_month_end_anchor() {
        let ts = series(&[("2021-01-31", 1.0), ("2021-03-31", 8.0)]);
        let monthly =
            convert(&ts, RateType::Exponential, TimeUnit::Days, TimeUnit::Months).unwrap();
        assert_eq!(
            monthly.dates(),
            vec![date("2021-01-31"), date("2021-02-28"), date("2021-03-31")]
        );
        let expected = 8.0_f64.powf(28.0 / 59.0);
        assert!((monthly.values()[1] - expected).abs() < TOL);
    }

    #[test]
    fn value_at_interpolates_between_observations() {
        let ts = series(&[("2020-01-01", 10.0), ("2020-01-11", 20.0)]);
        let v = value_at(&ts, RateType::Linear, date("2020-01-04")).unwrap();
        assert!((v - 13.0).abs() < TOL);
        assert_eq!(value_at(&ts, RateType::Linear, date("2020-01-11")).unwrap(), 20.0);
        assert!(value_at(&ts, RateType::Linear, date("2019-12-31")).is_err());
        assert!(value_at(&ts, RateType::Linear, date("2020-01-12")).is_err());
        assert!(value_at(&TimeSeries::default(), RateType::Linear, date("2020-01-01")).is_err());
    }
}
