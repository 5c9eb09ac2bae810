//! Entry point for the prompter.
//!
//! Responsibilities here are intentionally minimal:
//! - Parse command-line arguments (a script source, or `--print-config`).
//! - Load user configuration from `conf/config.toml`.
//! - Open the settings store under the cache directory.
//! - Hand everything to the iced front end.

mod app;
mod config;

use crate::app::run_app;
use crate::config::{load_config, serialize_config};
use anyhow::{Context, Result, anyhow};
use prompter_core::{FileStore, Prompter};
use std::env;
use std::path::Path;
use tracing::{debug, error, info, warn};
use tracing_subscriber::{EnvFilter, fmt, prelude::*, reload};

type ReloadHandle = reload::Handle<EnvFilter, tracing_subscriber::Registry>;

fn main() {
    let reload_handle = init_tracing();
    if let Err(err) = run(&reload_handle) {
        error!("{err:?}");
        std::process::exit(1);
    }
}

fn run(reload_handle: &ReloadHandle) -> Result<()> {
    let mut config = load_config(Path::new("conf/config.toml"));
    match parse_args()? {
        Args::PrintConfig => {
            print!("{}", serialize_config(&config)?);
            return Ok(());
        }
        Args::Run(Some(source)) => config.default_script = source,
        Args::Run(None) => {}
    }
    set_log_level(reload_handle, config.log_level.as_filter_str());
    info!(
        source = %config.default_script,
        level = %config.log_level,
        "Starting prompter"
    );

    let store = FileStore::new(Path::new(&config.cache_dir));
    info!(path = %store.path().display(), "Using settings store");
    let prompter = Prompter::new(store, config.default_script.clone());
    install_interrupt_handler();
    run_app(prompter, config).context("Failed to start the GUI")?;
    Ok(())
}

fn install_interrupt_handler() {
    if let Err(err) = ctrlc::set_handler(|| {
        info!("Received Ctrl+C; exiting");
        std::process::exit(130);
    }) {
        warn!("Failed to install Ctrl+C signal handler: {err}");
    }
}

enum Args {
    Run(Option<String>),
    PrintConfig,
}

fn parse_args() -> Result<Args> {
    let mut args = env::args().skip(1);
    let first = args.next();
    if args.next().is_some() {
        return Err(anyhow!("Usage: prompter [--print-config | script-source]"));
    }
    if first.as_deref() == Some("--print-config") {
        return Ok(Args::PrintConfig);
    }
    Ok(Args::Run(first.filter(|s| !s.trim().is_empty())))
}

fn init_tracing() -> ReloadHandle {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"));
    let (filter_layer, handle) = reload::Layer::new(env_filter);
    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(true)
                .with_file(true)
                .with_line_number(true)
                .with_filter(filter_layer),
        )
        .init();
    debug!("Tracing ready; [logging] log_level or RUST_LOG picks the level");
    handle
}

fn set_log_level(handle: &ReloadHandle, level: &str) {
    let parsed = EnvFilter::builder()
        .parse(level)
        .unwrap_or_else(|_| EnvFilter::new("debug"));
    if let Err(err) = handle.modify(|filter| *filter = parsed.clone()) {
        warn!(%level, "Failed to update log level from config: {err}");
    } else {
        info!(%level, "Applied log level from config");
    }
}
