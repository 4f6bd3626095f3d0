//! Aurora: console entry point.
//!
//! Startup sequence:
//!   1. Load .env (if present)
//!   2. Load config
//!   3. Resolve effective log level (CLI `-v` flags > env > config)
//!   4. Init logger once
//!   5. Build the LLM provider (`--offline` forces the dummy backend)
//!   6. Spawn Ctrl-C → shutdown signal watcher
//!   7. Run the console until quit, EOF or shutdown

use tokio_util::sync::CancellationToken;
use tracing::info;

use aurora::agents::AgentsState;
use aurora::error::AppError;
use aurora::{comms, config, llm, logger};

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), AppError> {
    // Load .env if present; the file is optional.
    let _ = dotenvy::dotenv();

    let args = parse_cli_args();

    let mut config = config::load(args.config_path.as_deref())?;
    if args.offline {
        config.llm.provider = "dummy".to_string();
    }

    let effective_log_level = args.log_level.unwrap_or(config.log_level.as_str());
    let force_cli_level = args.log_level.is_some();
    logger::init(effective_log_level, force_cli_level, config.log_file.as_deref())?;

    info!(
        app_name = %config.app_name,
        work_dir = %config.work_dir.display(),
        configured_log_level = %config.log_level,
        effective_log_level = %effective_log_level,
        provider = %config.llm.provider,
        "config loaded"
    );

    let provider = llm::providers::build(&config.llm, config.google_api_key.clone())?;
    info!(
        model = provider.model_name(),
        temperature = config.llm.gemini.temperature,
        google_search = config.llm.gemini.google_search,
        "llm provider ready"
    );
    let state = AgentsState::new(&config, provider);

    // Ctrl-C cancels the token; the console watches it.
    let shutdown = CancellationToken::new();
    let ctrlc_token = shutdown.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("ctrl-c received, shutting down");
            ctrlc_token.cancel();
        }
    });

    comms::pty::run_pty(state, &config.app_name, shutdown.clone()).await?;
    shutdown.cancel();

    {
        use std::io::Write as _;
        println!("\nBye :) ...");
        let _ = std::io::stdout().flush();
    }
    Ok(())
}

struct CliArgs {
    log_level: Option<&'static str>,
    offline: bool,
    config_path: Option<String>,
}

fn parse_cli_args() -> CliArgs {
    let mut verbosity = 0u8;
    let mut offline = false;
    let mut config_path = None;

    let mut iter = std::env::args().skip(1);
    while let Some(arg) = iter.next() {
        if arg == "--" {
            break;
        }

        match arg.as_str() {
            "-h" | "--help" => {
                println!("Usage: aurora [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -h, --help                 Print help");
                println!("  -f, --config <PATH>        Path to configuration file (default: config/default.toml)");
                println!("  -v, -vv, -vvv, -vvvv       Increase logging verbosity");
                println!("      --offline              Use the echo provider (no API key needed)");
                println!();
                println!("Environment: GOOGLE_API_KEY, AURORA_LOG_LEVEL, AURORA_WORK_DIR, AURORA_MODEL");
                std::process::exit(0);
            }
            "--offline" => offline = true,
            "-f" | "--config" => {
                if let Some(path) = iter.next() {
                    config_path = Some(path);
                } else {
                    eprintln!("error: -f/--config requires a path argument");
                    std::process::exit(1);
                }
            }
            "--verbose" => verbosity = verbosity.saturating_add(1),
            a if a.starts_with('-') && a.len() > 1 && a.chars().skip(1).all(|c| c == 'v') => {
                verbosity = verbosity.saturating_add((a.len() - 1) as u8);
            }
            other => eprintln!("warning: ignoring unknown argument '{other}'"),
        }
    }

    //   -v     → warn
    //   -vv    → info
    //   -vvv   → debug
    //   -vvvv+ → trace
    let log_level = match verbosity {
        0 => None,
        1 => Some("warn"),
        2 => Some("info"),
        3 => Some("debug"),
        _ => Some("trace"),
    };

    CliArgs { log_level, offline, config_path }
}
