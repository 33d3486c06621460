//! doorlinkd
//!
//! Keeps a serial door controller in sync with a credential file and runs the
//! control loop until the link fails. Restarting after a failure is left to
//! the service manager.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use doorlink::override_window::DEFAULT_OVERRIDE_PATH;
use doorlink_core::constants::DEFAULT_BAUD_RATE;
use doorlink::{Controller, ControllerConfig, CredentialSet, FileOverrideSignal, StreamTransport};
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Door access controller daemon.
#[derive(Parser)]
#[command(name = "doorlinkd")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Serial device node, or tcp://host:port for a serial bridge
    port: String,

    /// Serial line speed (ignored for a TCP bridge)
    #[arg(short, long, default_value_t = DEFAULT_BAUD_RATE)]
    baud: u32,

    /// Credential file
    #[arg(short, long, default_value = "cards.dat")]
    cards: PathBuf,

    /// File whose appearance opens the space for N hours
    #[arg(long, default_value = DEFAULT_OVERRIDE_PATH)]
    override_file: PathBuf,

    /// Seconds to wait for any single frame
    #[arg(long, default_value_t = 30)]
    read_timeout_secs: u64,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .init();

    let credentials = CredentialSet::load(&cli.cards)
        .with_context(|| format!("loading credentials from {}", cli.cards.display()))?;
    info!("Loaded {} credentials", credentials.len());

    let config =
        ControllerConfig::default().with_read_timeout(Duration::from_secs(cli.read_timeout_secs));

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("building runtime")?;

    runtime.block_on(async {
        let mut controller = Controller::new(
            StreamTransport::from_port(&cli.port).with_baud_rate(cli.baud),
            credentials,
            FileOverrideSignal::new(&cli.override_file),
            config,
        );

        controller
            .run()
            .await
            .with_context(|| format!("door link on {}", cli.port))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_baud_defaults_to_9600() {
        let cli = Cli::parse_from(["doorlinkd", "/dev/ttyUSB0"]);
        assert_eq!(cli.baud, 9600);
        assert_eq!(cli.cards, PathBuf::from("cards.dat"));
    }

    #[test]
    fn test_baud_override() {
        let cli = Cli::parse_from(["doorlinkd", "--baud", "19200", "tcp://bridge:4001"]);
        assert_eq!(cli.baud, 19200);
        assert_eq!(cli.port, "tcp://bridge:4001");
    }
}
