//! Command-line interface for pheno-sync
//!
//! ```bash
//! pheno-sync sync --environment production --config /etc/pheno-sync.toml \
//!   --report-file last-sync.json --verbosity 2
//! ```
//!
//! `RUST_LOG` overrides `--verbosity` when set.

use clap::{Args, Parser, Subcommand};
use pheno_sync::{
    describe_schedule, emit_report, run_pass, Config, DestinationOverrides, Environment,
    SyncRequest,
};
use std::path::PathBuf;
use sync_engine::Schedule;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "pheno-sync")]
#[command(about = "Sync genomic study and trait metadata from the phenotype database")]
#[command(long_about = None)]
struct Cli {
    /// 0 = errors, 1 = warnings, 2 = info, 3 = debug
    #[arg(
        long,
        short,
        global = true,
        default_value_t = 1,
        value_parser = clap::value_parser!(u8).range(0..=3)
    )]
    verbosity: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run one import and update pass
    Sync(SyncArgs),

    /// Print the order entity types and relations are processed in
    Schedule,
}

#[derive(Args)]
struct SyncArgs {
    /// Source environment to read from
    #[arg(long, value_enum)]
    environment: Environment,

    /// Path to the TOML config file
    #[arg(long, env = "PHENO_SYNC_CONFIG")]
    config: PathBuf,

    /// Only import new rows (test environment only)
    #[arg(long)]
    import_only: bool,

    /// Only update existing records (test environment only)
    #[arg(long)]
    update_only: bool,

    /// Skip the pre-sync backup
    #[arg(long)]
    no_backup: bool,

    /// Also write the JSON report to this file
    #[arg(long, value_name = "PATH")]
    report_file: Option<PathBuf>,

    /// Destination endpoint, overriding the config file
    #[arg(long, env = "SURREAL_ENDPOINT")]
    surreal_endpoint: Option<String>,

    /// Destination username, overriding the config file
    #[arg(long, env = "SURREAL_USERNAME")]
    surreal_username: Option<String>,

    /// Destination password, overriding the config file
    #[arg(long, env = "SURREAL_PASSWORD", hide_env_values = true)]
    surreal_password: Option<String>,
}

fn verbosity_filter(verbosity: u8) -> &'static str {
    match verbosity {
        0 => "error",
        1 => "warn",
        2 => "info",
        _ => "debug",
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    if let Err(e) = run().await {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
    Ok(())
}

async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Logs go to stderr so stdout carries only the report
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(verbosity_filter(cli.verbosity)));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Sync(args) => run_sync(args).await,
        Commands::Schedule => {
            print!("{}", describe_schedule(&Schedule::standard()));
            Ok(())
        }
    }
}

async fn run_sync(args: SyncArgs) -> anyhow::Result<()> {
    let mut config = Config::from_file(&args.config)?;
    config.apply_overrides(DestinationOverrides {
        endpoint: args.surreal_endpoint,
        username: args.surreal_username,
        password: args.surreal_password,
    });

    let request = SyncRequest {
        environment: args.environment,
        import_only: args.import_only,
        update_only: args.update_only,
        skip_backup: args.no_backup,
    };

    let outcome = run_pass(&config, &request).await?;
    let report = match &outcome {
        Ok(report) => report,
        Err(aborted) => &aborted.report,
    };
    emit_report(report, args.report_file.as_deref())?;
    outcome?;
    Ok(())
}
