//! AuthGate command line tool
//!
//! Resolves and validates the configuration, then either runs the
//! healthcheck against a running instance or confirms the listen address
//! is free.

use std::path::PathBuf;
use std::process;

use clap::{CommandFactory, Parser};
use log::{error, info};

use authgate_proxy::common::{init_logger, is_listen_address_free, set_log_level, AppError, Result};
use authgate_proxy::config::{self, log_config, Settings, BRANDING};
use authgate_proxy::{healthcheck, APP_NAME, VERSION};

/// AuthGate: single sign-on authentication proxy
#[derive(Parser, Debug)]
#[clap(version = VERSION, about, long_about = None, disable_help_flag = true)]
struct Args {
    /// Path to the configuration file (overridden by AUTHGATE_CONFIG)
    #[clap(long)]
    config: Option<PathBuf>,

    /// Port to listen on, overrides the configured port
    #[clap(long)]
    port: Option<u16>,

    /// Log level (error, warn, info, debug, trace), overrides the configured level
    #[clap(long)]
    loglevel: Option<String>,

    /// Check the health of a running instance and exit 0 (healthy) or 1
    #[clap(long)]
    healthcheck: bool,

    /// Print usage and exit
    #[clap(short, long)]
    help: bool,
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    if args.help {
        println!("{}", Args::command().render_help());
        process::exit(1);
    }

    init_logger(args.loglevel.as_deref().unwrap_or("info"));

    if let Err(e) = run(args).await {
        error!("{}", e);
        process::exit(1);
    }
}

async fn run(args: Args) -> Result<()> {
    info!("Starting {} v{}", APP_NAME, VERSION);

    let snapshot = config::auto_load(args.config.as_deref(), args.port)?;
    configure_log_level(&args, snapshot.settings());

    let snapshot = config::initialize(snapshot)?;
    log_config(&snapshot);

    let settings = snapshot.settings();
    if args.healthcheck {
        return healthcheck::check(&settings.listen, settings.port).await;
    }

    let address = snapshot.listen_address();
    if !is_listen_address_free(&address) {
        return Err(AppError::AddressInUse(address, BRANDING.cc_name));
    }

    info!("{} v{} configured to listen on {}", BRANDING.cc_name, VERSION, address);
    Ok(())
}

/// `--loglevel` wins over the configured level; a healthcheck only reports errors
fn configure_log_level(args: &Args, settings: &Settings) {
    let level = args
        .loglevel
        .as_deref()
        .filter(|level| !level.is_empty())
        .unwrap_or(&settings.log_level);

    if args.healthcheck && !level.eq_ignore_ascii_case("debug") {
        set_log_level("error");
    } else if !level.is_empty() {
        set_log_level(level);
    }
}
