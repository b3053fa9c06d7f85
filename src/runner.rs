use crate::config::{Job, Operation};
use crate::extrapolate::{fit_rate, project};
use crate::interpolate::{convert, fill_gaps, monthly_to_daily, yearly_to_monthly};
use crate::io;
use crate::series::TimeSeries;
use anyhow::{Context, Result, bail};
use glob::glob;
use std::path::{Path, PathBuf};

impl Operation {
    /// Apply the operation to a series.
    pub fn apply(&self, series: &TimeSeries) -> Result<TimeSeries> {
        match *self {
            Operation::FillGaps {
                rate_type,
                time_units,
            } => fill_gaps(series, rate_type, time_units),
            Operation::YearlyToMonthly { rate_type } => yearly_to_monthly(series, rate_type),
            Operation::MonthlyToDaily { rate_type } => monthly_to_daily(series, rate_type),
            Operation::Convert {
                rate_type,
                from,
                to,
            } => convert(series, rate_type, from, to),
            Operation::Extrapolate {
                rate_type,
                time_units,
                start_date,
                future_timesteps,
                past_timesteps,
            } => {
                let fit = fit_rate(series, rate_type, time_units, start_date, past_timesteps)
                    .context("failed to fit rate")?;
                log::info!("{fit:#?}");
                project(&fit, rate_type, time_units, future_timesteps)
            }
        }
    }
}

/// Runs jobs.
pub struct Runner {
    job: Job,
}

impl Runner {
    pub fn new(job: Job) -> Result<Self> {
        job.validate().context("failed to validate job")?;
        Ok(Self::from_valid_job(job))
    }

    /// Load and validate a job file.
    pub fn from_file<P: AsRef<Path>>(file: P) -> Result<Self> {
        let job = Job::from_file(file).context("failed to construct job")?;
        Ok(Self::from_valid_job(job))
    }

    fn from_valid_job(job: Job) -> Self {
        log::info!("{job:#?}");
        Self { job }
    }

    pub fn run(&self) -> Result<()> {
        let columns = self.job.columns();

        let input = &self.job.input;
        let series = io::load(input, self.job.input_format(), &columns)
            .context("failed to load input")?;
        log::info!("loaded {} observations from {input:?}", series.len());

        let result = self
            .job
            .operation
            .apply(&series)
            .context("failed to apply operation")?;

        let output = &self.job.output;
        io::save(&result, output, self.job.output_format(), &columns)
            .context("failed to save output")?;
        log::info!("saved {} observations to {output:?}", result.len());

        Ok(())
    }
}

/// Run every `*.toml` job in `jobs_dir`, in file name order.
pub fn run_jobs_dir<P: AsRef<Path>>(jobs_dir: P) -> Result<usize> {
    let job_files = find_job_files(jobs_dir.as_ref()).context("failed to find job files")?;
    if job_files.is_empty() {
        bail!("no job files found in {:?}", jobs_dir.as_ref());
    }

    for file in &job_files {
        let runner =
            Runner::from_file(file).with_context(|| format!("failed to construct runner for {file:?}"))?;
        runner
            .run()
            .with_context(|| format!("failed to run {file:?}"))?;
    }

    Ok(job_files.len())
}

fn find_job_files(jobs_dir: &Path) -> Result<Vec<PathBuf>> {
    let pattern = jobs_dir.join("*.toml");
    let pattern = pattern.to_str().context("pattern is not valid UTF-8")?;
    let mut job_files: Vec<_> = glob(pattern)
        .context("failed to glob job files")?
        .filter_map(Result::ok)
        .filter(|p| p.is_file())
        .collect();
    job_files.sort();
    Ok(job_files)
}
