//! authflow - account lifecycle checker for HTTP authentication services
//!
//! Exit codes: 0 when every step passed, 1 when any step failed or errored,
//! 2 when the preflight aborted the run.

use authflow::config::ConfigLoader;
use authflow::logging::{init_subscriber, LogFormat};
use authflow::{RunState, Runner, SessionState};
use clap::{Parser, ValueEnum};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

/// authflow - runs the register/login/rotate/logout lifecycle against an auth service
#[derive(Parser, Debug)]
#[command(name = "authflow")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to configuration file (defaults are used when omitted)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Base URL of the service, overrides the configuration
    #[arg(short, long)]
    base_url: Option<String>,

    /// Use this username instead of a randomized one
    #[arg(short, long)]
    username: Option<String>,

    /// Pause between steps in milliseconds, overrides the configuration
    #[arg(long)]
    step_delay_ms: Option<u64>,

    /// Report format printed on stdout
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info")]
    log_level: String,

    /// Log encoding on stderr (text, json)
    #[arg(long, default_value = "text")]
    log_format: LogFormat,
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let args = Args::parse();

    init_subscriber(&args.log_level, args.log_format)?;

    info!("Starting authflow v{}", authflow::VERSION);

    let mut config = ConfigLoader::load_or_default(args.config.as_ref())?;
    if let Some(path) = &args.config {
        info!("Loaded configuration from {:?}", path);
    }
    if let Some(base_url) = args.base_url {
        config.target.base_url = base_url;
    }
    if let Some(delay) = args.step_delay_ms {
        config.run.step_delay_millis = delay;
    }
    config.validate()?;

    let session = match args.username {
        Some(username) => SessionState::new(username),
        None => SessionState::with_random_username(&config.credentials.username_prefix),
    };
    info!(username = %session.username, base_url = %config.target.base_url, "Seeded session");

    let mut runner = Runner::from_config(&config)?;
    let report = runner.run(session).await?;

    match args.format {
        OutputFormat::Text => print!("{}", report.render()),
        OutputFormat::Json => println!("{}", report.to_json()?),
    }

    if config.metrics.enabled {
        match authflow::metrics::write_to(&config.metrics.output) {
            Ok(()) => info!("Wrote metrics to {}", config.metrics.output),
            Err(e) => warn!(error = %e, "Failed to write metrics to {}", config.metrics.output),
        }
    }

    let code = match report.state {
        RunState::Aborted => 2,
        _ if report.is_success() => 0,
        _ => 1,
    };
    Ok(ExitCode::from(code))
}
