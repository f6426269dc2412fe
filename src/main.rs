//! objpulse CLI entry point

use anyhow::{Context, Result};
use objpulse::config::cli::Cli;
use objpulse::config::toml::{parse_toml_file, FileConfig};
use objpulse::config::{cli_convert, validator, RunConfig, RunMode, StoreConfig};
use objpulse::coordinator::{Coordinator, RunReport};
use objpulse::output::{json, text};
use objpulse::store::backend::OpendalStore;
use objpulse::ObjectStore;
use std::process::ExitCode;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

/// Exit status for configuration errors and fatal run errors
const EXIT_FATAL: u8 = 2;

fn main() -> ExitCode {
    let cli = Cli::parse_args();
    init_logging(cli.debug);

    let (run, store) = match load_config(&cli) {
        Ok(config) => config,
        Err(e) => return fatal(&e),
    };

    match run_benchmark(run, store, cli.json) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => fatal(&e),
    }
}

/// Report a fatal error once on stderr, with its context chain
fn fatal(e: &anyhow::Error) -> ExitCode {
    eprintln!("{}", fatal_message(e));
    ExitCode::from(EXIT_FATAL)
}

fn fatal_message(e: &anyhow::Error) -> String {
    format!("error: {:#}", e)
}

/// Logs go to stderr so the report on stdout stays clean
fn init_logging(debug: bool) {
    let filter = std::env::var("RUST_LOG").map_or_else(
        |_| {
            if debug {
                EnvFilter::new("objpulse=debug")
            } else {
                EnvFilter::new("objpulse=info")
            }
        },
        |value| EnvFilter::try_new(value).unwrap_or_else(|_| EnvFilter::new("objpulse=info")),
    );

    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .finish();

    if let Err(err) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set global default subscriber: {}", err);
    }
}

/// CLI over config file over defaults, then validation
fn load_config(cli: &Cli) -> Result<(RunConfig, StoreConfig)> {
    let file = match &cli.config {
        Some(path) => parse_toml_file(path)?,
        None => FileConfig::default(),
    };

    let (run, store) = cli_convert::resolve(cli, &file)?;
    validator::validate(&run, &store)?;
    Ok((run, store))
}

fn run_benchmark(run: RunConfig, store_config: StoreConfig, as_json: bool) -> Result<()> {
    let store: Arc<dyn ObjectStore> = Arc::new(
        OpendalStore::from_config(&store_config).context("Failed to create object store")?,
    );

    info!(endpoint = %display_endpoint(&store_config), "objpulse v{}", env!("CARGO_PKG_VERSION"));
    info!("{}", run);

    let delete_after = run.mode == RunMode::Upload && run.delete_after;
    let bucket = store_config.bucket;
    let coordinator = Coordinator::new(run, store);

    let runtime = tokio::runtime::Runtime::new().context("Failed to create tokio runtime")?;

    runtime.block_on(async {
        match coordinator.run().await? {
            RunReport::Transfer(report) => {
                if as_json {
                    json::print_report(&json::transfer_report(&bucket, &report))?;
                } else {
                    text::print_transfer_report(&report);
                }
            }
            RunReport::Query(report) => {
                if as_json {
                    json::print_report(&json::query_report(&bucket, &report))?;
                } else {
                    text::print_query_report(&report);
                }
            }
        }

        if delete_after {
            // keep stdout a single JSON document
            if as_json {
                eprintln!("cleaning objects...");
            } else {
                println!("cleaning objects...");
            }
            coordinator.cleanup().await;
        }
        Ok::<(), anyhow::Error>(())
    })
}

fn display_endpoint(config: &StoreConfig) -> &str {
    if config.endpoint.is_empty() {
        "aws"
    } else {
        &config.endpoint
    }
}
