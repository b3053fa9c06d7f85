//! Extrapolation beyond a known observation.

use crate::rate::RateType;
use crate::series::{Observation, TimeSeries, check_finite};
use crate::stats::Accumulator;
use crate::units::TimeUnit;
use anyhow::{Context, Result, bail};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Rate fitted over the observations preceding the extrapolation start.
#[derive(Debug, PartialEq, Clone, Copy, Serialize, Deserialize)]
pub struct Fit {
    /// Date the projection starts from.
    pub start_date: NaiveDate,
    /// Observed value on the start date.
    pub start_value: f64,

    /// Mean one-step rate over the fit window.
    pub rate: f64,
    /// Sample standard deviation of the one-step rates.
    pub std_dev: f64,
    /// Number of one-step rates averaged.
    pub n_rates: usize,
}

/// Fit the average one-step rate over the `past_timesteps` periods up to `start_date`.
///
/// # Errors
/// Returns an error if there is no observation on `start_date`, if the fit
/// window has gaps or fewer than two observations, or if a rate is undefined.
pub fn fit_rate(
    series: &TimeSeries,
    rate_type: RateType,
    time_units: TimeUnit,
    start_date: NaiveDate,
    past_timesteps: usize,
) -> Result<Fit> {
    if past_timesteps == 0 {
        bail!("number of past timesteps must be at least 1");
    }
    let start_value = series
        .value_on(start_date)
        .with_context(|| format!("there is no observation on the start date {start_date}"))?;

    let past_timesteps = i64::try_from(past_timesteps).context("too many past timesteps")?;
    let window_start = time_units.offset(start_date, -past_timesteps)?;
    let window = series.window(window_start, start_date);
    time_units
        .check_contiguous(&window)
        .with_context(|| format!("invalid fit window {window_start} to {start_date}"))?;
    if window.len() < 2 {
        bail!(
            "fit window {window_start} to {start_date} must hold at least 2 observations, but holds {}",
            window.len()
        );
    }

    let mut acc = Accumulator::new();
    for (obs_a, obs_b) in window.segments() {
        let rate = rate_type
            .rate(obs_a.value, obs_b.value, 1)
            .with_context(|| format!("failed to compute rate from {} to {}", obs_a.date, obs_b.date))?;
        acc.add(rate);
    }
    let report = acc.report();

    Ok(Fit {
        start_date,
        start_value,
        rate: report.mean,
        std_dev: report.std_dev,
        n_rates: report.n_vals,
    })
}

/// Project a fitted rate `future_timesteps` periods past its start date.
///
/// The result holds `future_timesteps + 1` observations, the first being
/// the start observation itself.
pub fn project(
    fit: &Fit,
    rate_type: RateType,
    time_units: TimeUnit,
    future_timesteps: usize,
) -> Result<TimeSeries> {
    if future_timesteps == 0 {
        bail!("number of future timesteps must be at least 1");
    }

    let n_steps = i64::try_from(future_timesteps).context("too many future timesteps")?;
    let end_date = time_units
        .offset(fit.start_date, n_steps)
        .context("projection ends outside the supported date range")?;
    log::debug!("projecting {future_timesteps} {time_units} from {} to {end_date}", fit.start_date);

    let obs_vec = (0..=n_steps)
        .map(|offset| {
            let date = time_units.offset(fit.start_date, offset)?;
            let value = rate_type.project(fit.start_value, fit.rate, offset as usize);
            check_finite(date, value).context("projected value overflows")?;
            Ok(Observation::new(date, value))
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(TimeSeries::from_sorted(obs_vec))
}

/// Extrapolate the series from `start_date` into the future.
///
/// The per-period rate is averaged over the `past_timesteps` periods up to
/// `start_date`, see [`fit_rate`], and then projected, see [`project`].
pub fn extrapolate(
    series: &TimeSeries,
    rate_type: RateType,
    time_units: TimeUnit,
    start_date: NaiveDate,
    future_timesteps: usize,
    past_timesteps: usize,
) -> Result<TimeSeries> {
    let fit = fit_rate(series, rate_type, time_units, start_date, past_timesteps)
        .context("failed to fit rate")?;
    log::debug!("{fit:?}");
    project(&fit, rate_type, time_units, future_timesteps)
}
