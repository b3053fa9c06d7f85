use crate::io::{Columns, Format};
use crate::rate::RateType;
use crate::units::TimeUnit;
use anyhow::{Context, Result, bail};
use chrono::NaiveDate;
use clap::Subcommand;
use serde::{Deserialize, Serialize};
use std::{
    fmt::Debug,
    fs,
    ops::RangeBounds,
    path::{Path, PathBuf},
};

/// Transformation applied to a time series.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize, Subcommand)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum Operation {
    /// Fill the gaps between observations.
    FillGaps {
        #[arg(long)]
        rate_type: RateType,
        #[arg(long)]
        time_units: TimeUnit,
    },

    /// Convert a complete yearly series into a monthly one.
    YearlyToMonthly {
        #[arg(long)]
        rate_type: RateType,
    },

    /// Convert a complete monthly series into a daily one.
    MonthlyToDaily {
        #[arg(long)]
        rate_type: RateType,
    },

    /// Convert a series between any two time units.
    Convert {
        #[arg(long)]
        rate_type: RateType,
        #[arg(long)]
        from: TimeUnit,
        #[arg(long)]
        to: TimeUnit,
    },

    /// Extrapolate the series past a start date.
    Extrapolate {
        #[arg(long)]
        rate_type: RateType,
        #[arg(long)]
        time_units: TimeUnit,
        #[arg(long)]
        start_date: NaiveDate,
        #[arg(long)]
        future_timesteps: usize,
        #[arg(long)]
        past_timesteps: usize,
    },
}

impl Operation {
    pub fn validate(&self) -> Result<()> {
        if let Operation::Extrapolate {
            future_timesteps,
            past_timesteps,
            ..
        } = *self
        {
            check_num(future_timesteps, 1..=100_000).context("invalid number of future timesteps")?;
            check_num(past_timesteps, 1..=100_000).context("invalid number of past timesteps")?;
        }
        Ok(())
    }
}

/// Job description.
///
/// Loaded from a TOML file and validated before use.
/// See [`Job::from_file`] for loading.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct Job {
    /// Input file.
    pub input: PathBuf,
    /// Output file.
    pub output: PathBuf,

    /// Input format, guessed from the extension if absent.
    #[serde(default)]
    pub input_format: Option<Format>,
    /// Output format, guessed from the extension if absent.
    #[serde(default)]
    pub output_format: Option<Format>,

    /// Name of the date column.
    #[serde(default = "default_date_column")]
    pub date_column: String,
    /// Name of the value column.
    pub value_column: String,

    /// Transformation to apply.
    pub operation: Operation,
}

pub fn default_date_column() -> String {
    "date".to_string()
}

impl Job {
    /// Load a [`Job`] from a file.
    ///
    /// The file must be TOML-encoded and contain a serialized [`Job`].
    /// Relative paths are resolved against the directory of the file.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read, deserialized,
    /// or if the job is invalid.
    pub fn from_file<P: AsRef<Path>>(file: P) -> Result<Self> {
        let file = file.as_ref();
        let contents =
            fs::read_to_string(file).with_context(|| format!("failed to read {file:?}"))?;

        let mut job: Job = toml::from_str(&contents).context("failed to deserialize job")?;

        if let Some(dir) = file.parent() {
            job.input = dir.join(&job.input);
            job.output = dir.join(&job.output);
        }

        job.validate().context("failed to validate job")?;

        Ok(job)
    }

    pub fn validate(&self) -> Result<()> {
        if self.date_column.is_empty() {
            bail!("date column name must not be empty");
        }
        if self.value_column.is_empty() {
            bail!("value column name must not be empty");
        }
        if self.input == self.output {
            bail!("input and output must be different files, but both are {:?}", self.input);
        }
        self.operation.validate().context("invalid operation")?;
        Ok(())
    }

    pub fn columns(&self) -> Columns {
        Columns::new(&self.date_column, &self.value_column)
    }

    pub fn input_format(&self) -> Format {
        self.input_format
            .unwrap_or_else(|| Format::from_path(&self.input))
    }

    pub fn output_format(&self) -> Format {
        self.output_format
            .unwrap_or_else(|| Format::from_path(&self.output))
    }
}

fn check_num<T, R>(num: T, range: R) -> Result<()>
where
    T: PartialOrd + Debug,
    R: RangeBounds<T> + Debug,
{
    if !range.contains(&num) {
        bail!("number must be in the range {range:?}, but is {num:?}");
    }
    Ok(())
}
