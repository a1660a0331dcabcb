//! Command-line interface for the lrucache LRU cache.

pub mod replay;
pub mod stress;

use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use lrucache_config::Config;
use tracing::debug;
use tracing_subscriber::EnvFilter;

use crate::stress::{run_stress, StressOptions};

#[derive(Parser, Debug)]
#[command(name = "lrucache")]
#[command(about = "Replay and stress-test a fixed-capacity LRU cache", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Path to a TOML config file (defaults to ./lrucache.toml if present)
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Override the configured cache capacity
    #[arg(long, global = true)]
    pub capacity: Option<usize>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run a script of cache commands, one per line ("-" reads stdin)
    Replay {
        script: PathBuf,

        /// Print the final keys and stats as JSON
        #[arg(long)]
        json: bool,
    },

    /// Hammer a shared cache from concurrent workers and validate it
    Stress {
        /// Number of concurrent workers
        #[arg(long)]
        workers: Option<usize>,

        /// Operations per worker
        #[arg(long)]
        ops: Option<usize>,

        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Print the effective configuration
    Config,
}

/// Parses arguments from the process and runs the selected command.
pub async fn run() -> Result<()> {
    run_with(Cli::parse()).await
}

/// Runs an already-parsed command line.
pub async fn run_with(cli: Cli) -> Result<()> {
    let config = resolve_config(&cli)?;
    init_logging(&config.logging.level, cli.verbose);
    debug!("Effective configuration: {:?}", config);

    match cli.command {
        Commands::Replay { script, json } => {
            let source = read_script(&script)?;
            let (output, summary) = replay::replay(&source, config.cache.capacity)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&summary)?);
            } else {
                for line in output {
                    println!("{}", line);
                }
            }
        }
        Commands::Stress { workers, ops, json } => {
            let options = StressOptions {
                capacity: config.cache.capacity,
                workers: workers.unwrap_or(config.stress.workers),
                ops_per_worker: ops.unwrap_or(config.stress.ops_per_worker),
            };
            if options.workers == 0 {
                bail!("--workers must be at least 1");
            }

            let report = run_stress(options).await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                println!(
                    "{} workers x {} ops: {} resident / {} capacity, {} evictions, hit rate {:.2}, {}ms",
                    report.workers,
                    report.ops_per_worker,
                    report.len,
                    report.capacity,
                    report.stats.evictions,
                    report.stats.hit_rate(),
                    report.elapsed_ms
                );
            }
            if !report.passed() {
                bail!(
                    "stress run failed: {} mismatches, validation: {}",
                    report.mismatches,
                    report.validation_error.as_deref().unwrap_or("ok")
                );
            }
        }
        Commands::Config => {
            print!("{}", config.to_toml()?);
        }
    }

    Ok(())
}

/// Loads configuration and applies command-line overrides.
pub fn resolve_config(cli: &Cli) -> Result<Config> {
    let mut config = Config::load(cli.config.as_deref()).context("Failed to load configuration")?;
    if let Some(capacity) = cli.capacity {
        config = config.with_capacity(capacity);
    }
    config.validate()?;
    Ok(config)
}

/// Installs the global tracing subscriber on stderr. `RUST_LOG` wins over
/// the configured level unless `verbose` is set.
fn init_logging(level: &str, verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level))
    };

    // A subscriber may already be installed (e.g. by a test harness)
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .try_init();
}

fn read_script(path: &Path) -> Result<String> {
    if path == Path::new("-") {
        let mut source = String::new();
        io::stdin()
            .read_to_string(&mut source)
            .context("Failed to read script from stdin")?;
        return Ok(source);
    }
    fs::read_to_string(path).with_context(|| format!("Failed to read script {}", path.display()))
}
