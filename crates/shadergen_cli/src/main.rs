// SPDX-License-Identifier: MIT OR Apache-2.0
//! `shadergen` - legacy toon shader graph generator
//!
//! Builds the shader graph that replaces the legacy toon shader, writes it
//! where the host project expects it, and checks existing graph files.

mod commands;
mod settings;

use commands::CliError;
use std::process::ExitCode;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

fn init_logging() {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("shadergen_cli=info,shadergen_graph=info"));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn main() -> ExitCode {
    init_logging();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let cwd = match std::env::current_dir() {
        Ok(dir) => dir,
        Err(err) => {
            tracing::error!("Cannot determine working directory: {err}");
            return ExitCode::FAILURE;
        }
    };

    match commands::parse(&args).and_then(|command| commands::run(command, &cwd)) {
        Ok(()) => ExitCode::SUCCESS,
        Err(CliError::Usage(message)) => {
            eprintln!("Error: {message}");
            commands::print_usage();
            ExitCode::from(2)
        }
        Err(err) => {
            tracing::error!("{err}");
            ExitCode::FAILURE
        }
    }
}
