// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! wsup: backend supervisor with crash recovery

mod color;
mod commands;
mod exit_error;
mod logging;
mod output;

use anyhow::Result;
use clap::{Parser, Subcommand};
use commands::{breadcrumbs, crash, instance, run};
use exit_error::ExitError;
use logging::Logging;
use output::OutputFormat;

#[derive(Parser)]
#[command(name = "wsup", about = "Supervise the backend server and recover from crashes")]
#[command(version = concat!(env!("CARGO_PKG_VERSION"), " (", env!("WSUP_GIT_HASH"), ")"))]
#[command(styles = color::styles())]
struct Cli {
    /// Output format
    #[arg(short = 'o', long = "output", value_enum, default_value_t, global = true)]
    output: OutputFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the backend and supervise it until shutdown
    Run(run::RunArgs),
    /// Inspect or clear crash evidence
    Crash(crash::CrashArgs),
    /// Data directory arbitration
    Instance(instance::InstanceArgs),
    /// Print recovered breadcrumbs
    Breadcrumbs(breadcrumbs::BreadcrumbArgs),
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let code = match dispatch(cli).await {
        Ok(()) => 0,
        Err(e) => match e.downcast_ref::<ExitError>() {
            Some(exit) => {
                if let Some(message) = &exit.message {
                    eprintln!("Error: {message}");
                }
                exit.code
            }
            None => {
                eprintln!("Error: {e:#}");
                1
            }
        },
    };
    std::process::exit(code);
}

/// Runs the command; the log writer is flushed when this returns.
async fn dispatch(cli: Cli) -> Result<()> {
    let format = cli.output;
    match cli.command {
        Commands::Run(args) => {
            let mut logging = Logging::init("info");
            run::run(args, &mut logging).await
        }
        Commands::Crash(args) => {
            let _logging = Logging::init("warn");
            crash::crash(args, format).await
        }
        Commands::Instance(args) => {
            let _logging = Logging::init("warn");
            instance::instance(args, format).await
        }
        Commands::Breadcrumbs(args) => {
            let _logging = Logging::init("warn");
            breadcrumbs::breadcrumbs(args, format).await
        }
    }
}
