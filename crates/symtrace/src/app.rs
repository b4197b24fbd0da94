//! The command line application: configuration, the line loop, and error
//! reporting.

use std::fs;
use std::process;

use anyhow::{Context, Result};
use clap::Parser;
use console::style;
use tracing_subscriber::EnvFilter;

use crate::config::{Cli, RunConfig};
use crate::resolve::Resolver;

fn execute() -> Result<()> {
    let cli = Cli::parse();

    // Keep stdout reserved for the rewritten log; diagnostics go to stderr.
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();

    let content = fs::read_to_string(&cli.tracebackfile)
        .with_context(|| format!("failed to read {}", cli.tracebackfile.display()))?;
    let lines: Vec<&str> = content.lines().collect();

    let config = RunConfig::resolve(&cli, &lines)?;
    tracing::debug!(
        arch = %config.arch,
        ndk = %config.ndk_path.display(),
        tool = %config.tool_path.display(),
        "resolved run configuration"
    );

    let resolver = Resolver::new(&config);
    for line in &lines {
        println!("{}", resolver.process_line(line).trim_end());
    }

    Ok(())
}

/// Runs the application and terminates the process.
pub fn main() -> ! {
    match execute() {
        Ok(()) => process::exit(0),
        Err(error) => {
            eprintln!("{}: {}", style("error").red().bold(), error);
            for cause in error.chain().skip(1) {
                eprintln!("{}", style(format!("  caused by {}", cause)).dim());
            }

            process::exit(1);
        }
    }
}
