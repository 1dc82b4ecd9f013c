mod repl;
mod selftest;

use std::io;

use anyhow::Result;
use clap::{Parser, Subcommand};
use expire_map_core::{ExpireMap, ExpireMapConfig};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Tester for the expiring map: interactive session or timed self-test.
#[derive(Debug, Parser)]
#[command(name = "expire-map", version, about)]
struct Cli {
    #[command(subcommand)]
    mode: Option<Mode>,
}

#[derive(Debug, Subcommand)]
enum Mode {
    /// Read put/get/remove commands from stdin (default)
    Interactive,
    /// Run the timed expiry and concurrency scenarios
    Selftest {
        /// Length of one scenario "second" in milliseconds
        #[arg(long, default_value_t = 1000)]
        scale_ms: u64,
    },
}

fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "expire_map=info,expire_map_core=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();

    let cli = Cli::parse();
    let config = ExpireMapConfig::from_env();
    config.validate()?;

    tracing::info!(
        max_reclaim_buckets = config.max_reclaim_buckets,
        max_park_ms = config.max_park.as_millis() as u64,
        "expire map tester"
    );

    match cli.mode.unwrap_or(Mode::Interactive) {
        Mode::Interactive => {
            let map: ExpireMap<u64, u64> = ExpireMap::try_with_config(config)?;
            run_interactive(&map)?;
            let stats = map.shutdown();
            tracing::info!(?stats, "exiting");
        }
        Mode::Selftest { scale_ms } => {
            tracing::info!("🧪 running self-test with {}ms units", scale_ms);
            selftest::run(&config, scale_ms)?;
        }
    }

    Ok(())
}

fn run_interactive(map: &ExpireMap<u64, u64>) -> io::Result<()> {
    let stdin = io::stdin();
    let stdout = io::stdout();
    repl::run_session(map, stdin.lock(), stdout.lock())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_default_mode_is_interactive() {
        let cli = Cli::try_parse_from(["expire-map"]).unwrap();
        assert!(cli.mode.is_none());
    }

    #[test]
    fn test_selftest_scale_flag() {
        let cli = Cli::try_parse_from(["expire-map", "selftest", "--scale-ms", "50"]).unwrap();
        assert!(matches!(cli.mode, Some(Mode::Selftest { scale_ms: 50 })));
    }
}
