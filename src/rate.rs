use anyhow::{Result, bail};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Rate-of-change model between consecutive observations.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum RateType {
    /// Constant increment per step.
    Linear,
    /// Constant growth factor per step.
    Exponential,
}

impl RateType {
    /// Compute the per-step rate taking `start` to `end` in `steps` steps.
    ///
    /// # Errors
    /// Returns an error if `steps` is zero, if the rate overflows, or, for
    /// exponential rates, if the values are zero or of opposite sign.
    pub fn rate(self, start: f64, end: f64, steps: usize) -> Result<f64> {
        if steps == 0 {
            bail!("number of steps must be at least 1");
        }
        let rate = match self {
            RateType::Linear => (end - start) / steps as f64,
            RateType::Exponential => {
                check_exponential(start, end)?;
                (end / start).powf(1.0 / steps as f64)
            }
        };
        if !rate.is_finite() {
            bail!("{self} rate from {start} to {end} over {steps} steps is not finite");
        }
        Ok(rate)
    }

    /// Project `start` forward by `n` steps at the given per-step rate.
    pub fn project(self, start: f64, rate: f64, n: usize) -> f64 {
        match self {
            RateType::Linear => start + n as f64 * rate,
            RateType::Exponential => start * rate.powf(n as f64),
        }
    }

    /// Interpolate at `t` between `(t0, v0)` and `(t1, v1)`.
    ///
    /// `t` need not lie between `t0` and `t1`, values outside extrapolate.
    pub fn interpolate(self, v0: f64, v1: f64, t0: f64, t1: f64, t: f64) -> Result<f64> {
        if t1 == t0 {
            bail!("interpolation interval must not be empty");
        }
        let frac = (t - t0) / (t1 - t0);
        match self {
            RateType::Linear => Ok(v0 + (v1 - v0) * frac),
            RateType::Exponential => {
                check_exponential(v0, v1)?;
                Ok(v0 * (v1 / v0).powf(frac))
            }
        }
    }
}

fn check_exponential(start: f64, end: f64) -> Result<()> {
    if start == 0.0 || end == 0.0 {
        bail!("exponential rate is undefined for zero values ({start} to {end})");
    }
    if start.signum() != end.signum() {
        bail!("exponential rate is undefined across a sign change ({start} to {end})");
    }
    Ok(())
}

impl fmt::Display for RateType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RateType::Linear => "linear",
            RateType::Exponential => "exponential",
        };
        f.write_str(name)
    }
}
