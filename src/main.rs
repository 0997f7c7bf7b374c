use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use tracing::{error, info};

use stepgen::aggregation::report::{PopulationSummary, StepDistribution, DEFAULT_HISTOGRAM_BINS};
use stepgen::persistence::JsonLinesStore;
use stepgen::{Dataset, GenerationConfig, Result};

#[derive(Parser, Debug)]
#[command(name = "stepgen")]
#[command(about = "Generate synthetic daily step counts and per-day summary statistics")]
struct Args {
    /// JSON config file; flags below override its values
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Number of users to generate
    #[arg(short, long)]
    users: Option<usize>,

    /// Number of days per user
    #[arg(short, long)]
    days: Option<usize>,

    /// First day as milliseconds since the Unix epoch (UTC)
    #[arg(long)]
    start: Option<i64>,

    /// Activity distribution: pooled, male, female or gender_specific
    #[arg(short, long)]
    mode: Option<String>,

    /// Random seed (uses random seed if not specified)
    #[arg(short, long)]
    seed: Option<u64>,

    /// Worker threads (all cores if not specified)
    #[arg(short = 'j', long)]
    threads: Option<usize>,

    /// Step documents per bulk insert
    #[arg(long)]
    batch_size: Option<usize>,

    /// Write users, steps and days as JSON lines into this directory
    #[arg(short, long)]
    out: Option<PathBuf>,

    /// Print the population summary and steps distribution
    #[arg(long)]
    report: bool,
}

impl Args {
    fn to_config(&self) -> Result<GenerationConfig> {
        let mut config = match &self.config {
            Some(path) => GenerationConfig::from_json_file(path)?,
            None => GenerationConfig::default(),
        };

        if let Some(users) = self.users {
            config.n_users = users;
        }
        if let Some(days) = self.days {
            config.n_days = days;
        }
        if let Some(start) = self.start {
            config.start_timestamp_ms = start;
        }
        if let Some(mode) = &self.mode {
            config.distribution_mode = mode.parse()?;
        }
        if let Some(threads) = self.threads {
            config.threads = Some(threads);
        }
        if let Some(batch_size) = self.batch_size {
            config.batch_size = batch_size;
        }
        // Pin the seed so it can be reported and reused.
        config.seed = Some(self.seed.or(config.seed).unwrap_or_else(rand::random));

        config.validate()?;
        Ok(config)
    }
}

fn init_logging() {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "stepgen=info".into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false),
        )
        .init();
}

fn run(args: &Args) -> Result<()> {
    let config = args.to_config()?;
    info!("generating with seed {}", config.seeds().master);

    let dataset = Dataset::generate(&config)?;

    if args.report {
        let summary = PopulationSummary::compute(&dataset.population, &dataset.days);
        println!("{}", summary.report());
        let distribution = StepDistribution::from_population(&dataset.population, DEFAULT_HISTOGRAM_BINS);
        println!("{}", distribution.report());
    }

    if let Some(dir) = &args.out {
        let mut store = JsonLinesStore::open(dir)?;
        let written = dataset.store(&mut store, config.batch_size)?;
        info!(
            "wrote {} users, {} steps and {} days to {}",
            written.users,
            written.steps,
            written.days,
            dir.display(),
        );
    }

    Ok(())
}

fn main() -> ExitCode {
    init_logging();
    let args = Args::parse();

    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", e);
            ExitCode::FAILURE
        }
    }
}
