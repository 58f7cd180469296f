use std::io;
use std::path::PathBuf;

use clap::{Parser, Subcommand};

use balsim_cli::commands;
use balsim_cli::{LogFormat, RunOptions};

#[derive(Parser)]
#[command(
    name = "balsim",
    about = "Discrete-cycle load balancer simulation",
    version,
    propagate_version = true,
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a simulation and write its log.
    ///
    /// Cycle budget and server count not given as flags or in the config
    /// file are asked for interactively.
    Run {
        /// Number of servers to start with
        #[arg(short, long)]
        workers: Option<u32>,
        /// Number of cycles to run
        #[arg(short, long)]
        cycles: Option<u32>,
        /// TOML config file with simulation knobs
        #[arg(long)]
        config: Option<PathBuf>,
        /// Seed for reproducible runs
        #[arg(long)]
        seed: Option<u64>,
        /// Log file name inside the log directory (default: log.txt)
        #[arg(short, long)]
        output: Option<String>,
        /// Directory for log files (default: load_balancer_logs)
        #[arg(long)]
        log_dir: Option<PathBuf>,
        /// Log record format
        #[arg(short, long, value_enum, default_value_t = LogFormat::Text)]
        format: LogFormat,
        /// Requeue in-flight work of removed servers instead of dropping it
        #[arg(long)]
        requeue: bool,
    },
    /// Validate a config file and print the resolved settings
    Check {
        #[arg(long)]
        config: PathBuf,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("balsim_cli=info".parse()?)
                .add_directive("balsim_engine=info".parse()?),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            workers,
            cycles,
            config,
            seed,
            output,
            log_dir,
            format,
            requeue,
        } => {
            let opts = RunOptions {
                workers,
                cycles,
                config,
                seed,
                output,
                log_dir,
                format,
                requeue,
            };
            let mut stdin = io::stdin().lock();
            let mut stdout = io::stdout();
            let report = commands::run::run(opts, &mut stdin, &mut stdout).await?;
            println!("{}", serde_json::to_string_pretty(&report)?);
            Ok(())
        }
        Commands::Check { config } => {
            print!("{}", commands::check::check(&config)?);
            Ok(())
        }
    }
}
