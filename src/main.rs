use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use imputime::config::{Job, Operation, default_date_column};
use imputime::io::Format;
use imputime::runner::{Runner, run_jobs_dir};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(version, about)]
struct CLI {
    #[arg(long)]
    input: Option<PathBuf>,

    #[arg(long)]
    output: Option<PathBuf>,

    #[arg(long)]
    input_format: Option<Format>,

    #[arg(long)]
    output_format: Option<Format>,

    #[arg(long, default_value_t = default_date_column())]
    date_column: String,

    #[arg(long)]
    value_column: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    #[command(flatten)]
    Operation(Operation),

    /// Run a job file, or every job file in a directory.
    Run {
        #[arg(long, conflicts_with = "jobs_dir", required_unless_present = "jobs_dir")]
        job: Option<PathBuf>,

        #[arg(long)]
        jobs_dir: Option<PathBuf>,
    },
}

fn main() {
    env_logger::Builder::new()
        .format_timestamp_millis()
        .filter_level(log::LevelFilter::Info)
        .parse_default_env()
        .init();

    if let Err(error) = run_cli() {
        log::error!("{error:#?}");
        std::process::exit(1);
    }
}

fn run_cli() -> Result<()> {
    let args = CLI::parse();
    log::info!("{args:#?}");

    match args.command {
        Command::Operation(operation) => {
            let (Some(input), Some(output), Some(value_column)) =
                (args.input, args.output, args.value_column)
            else {
                bail!("--input, --output and --value-column are required");
            };
            let job = Job {
                input,
                output,
                input_format: args.input_format,
                output_format: args.output_format,
                date_column: args.date_column,
                value_column,
                operation,
            };
            let runner = Runner::new(job).context("failed to construct runner")?;
            runner.run()?;
        }
        Command::Run { job, jobs_dir } => match (job, jobs_dir) {
            (Some(job), _) => {
                let runner = Runner::from_file(job).context("failed to construct runner")?;
                runner.run()?;
            }
            (None, Some(jobs_dir)) => {
                let n_jobs = run_jobs_dir(jobs_dir)?;
                log::info!("completed {n_jobs} jobs");
            }
            (None, None) => bail!("either --job or --jobs-dir is required"),
        },
    }

    Ok(())
}
