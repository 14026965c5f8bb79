//! # MapBridge Host
//!
//! Headless bridge speaking newline-delimited JSON on stdin/stdout.
//!
//! ## Usage
//!
//! ```bash
//! mapbridge_host --config host.toml < requests.jsonl
//! MAPBRIDGE_LOG=debug mapbridge_host
//! ```

use std::io::{self, BufReader};
use std::process::ExitCode;

use mapbridge::{logging, run_host, HostConfig};

fn main() -> ExitCode {
    // Parse command line arguments (simple parsing, no external deps)
    let args: Vec<String> = std::env::args().collect();
    let mut config_path: Option<String> = None;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--config" | "-c" => {
                if i + 1 < args.len() {
                    config_path = Some(args[i + 1].clone());
                    i += 1;
                }
            }
            "--help" | "-h" => {
                eprintln!("Usage: mapbridge_host [OPTIONS]");
                eprintln!();
                eprintln!("Reads requests from stdin, writes replies and events to stdout.");
                eprintln!();
                eprintln!("Options:");
                eprintln!("  -c, --config <PATH>   TOML configuration file");
                eprintln!("  -h, --help            Show this help");
                eprintln!();
                eprintln!("Environment:");
                eprintln!("  {}          Log filter, overrides log_level", logging::LOG_ENV);
                return ExitCode::SUCCESS;
            }
            other => eprintln!("Ignoring unknown argument {other:?}"),
        }
        i += 1;
    }

    let config = match config_path {
        Some(path) => match HostConfig::load(&path) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("mapbridge_host: {path}: {e}");
                return ExitCode::FAILURE;
            }
        },
        None => HostConfig::default(),
    };

    logging::init(&config.log_level);

    match run_host(&config, BufReader::new(io::stdin()), io::stdout()) {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "Host failed");
            ExitCode::FAILURE
        }
    }
}
