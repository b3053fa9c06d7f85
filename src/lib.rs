//! Gap filling, frequency conversion and extrapolation of date-indexed time series.
//!
//! A [`TimeSeries`] pairs strictly increasing dates with values. The
//! transforms in [`interpolate`] and [`extrapolate`] take a series and return
//! a new one, stepping through the calendar in [`TimeUnit`]s and changing
//! values at a constant [`RateType`] rate between known observations.

pub mod config;
pub mod extrapolate;
pub mod interpolate;
pub mod io;
pub mod rate;
pub mod runner;
pub mod series;
pub mod stats;
pub mod units;

pub use crate::extrapolate::{Fit, extrapolate, fit_rate};
pub use crate::interpolate::{convert, fill_gaps, monthly_to_daily, value_at, yearly_to_monthly};
pub use crate::rate::RateType;
pub use crate::series::{Observation, TimeSeries};
pub use crate::units::TimeUnit;
