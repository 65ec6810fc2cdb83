//! pom - terminal Pomodoro timer
//!
//! Usage:
//!   pom start [-w MINS] [-b MINS] [-s N] [-p PROFILE] [-t TASK]
//!   pom stats [DAYS]
//!   pom config show | set KEY VALUE
//!   pom profile list | use NAME | add NAME ...
//!   pom theme list | set NAME
//!   pom plugin list | enable NAME | disable NAME | add NAME ...
//!   pom task add TITLE | list | done ID
//!   pom goal set | show
//!   pom export json|csv [FILE]
//!   pom import FILE
//!   pom privacy enable | disable | clear | status

mod cli;

use anyhow::Result;
use clap::Parser;
use pom_core::Paths;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

use cli::Cli;

fn main() -> Result<ExitCode> {
    // Logs go to stderr so they never land on the progress line
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let paths = Paths::new();

    cli::execute(cli.command, &paths)
}
