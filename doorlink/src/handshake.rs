//! Session handshake
//!
//! On first connection the link is reset and left to go quiet so stale output
//! from a device that was mid-conversation is discarded. Every handshake then
//! claims the device address, proves liveness and reconciles credentials.

use doorlink_core::{command::reply, constants::LINK_RESET, Command};
use tokio::time::sleep;
use tracing::{debug, info};

use crate::config::ControllerConfig;
use crate::error::{Error, Result};
use crate::link::Link;
use crate::sync::{CredentialSync, SyncOutcome};

/// Run the handshake, opening the transport first if needed
pub async fn handshake(
    link: &mut Link,
    sync: &CredentialSync,
    config: &ControllerConfig,
) -> Result<SyncOutcome> {
    info!("Resync with {}", link.transport().describe());

    if !link.transport().is_open() {
        open_quiet(link, config).await?;
    }

    link.expect(&Command::ClaimAddress, reply::ADDRESS_CLAIMED, Error::AddressClaimFailed)
        .await?;
    link.heartbeat().await?;

    let outcome = sync.reconcile(link).await?;
    info!(?outcome, "Handshake complete");

    Ok(outcome)
}

/// Open the transport, reset the link and wait for a quiet interval
async fn open_quiet(link: &mut Link, config: &ControllerConfig) -> Result<()> {
    let transport = link.transport_mut();

    transport.open().await?;
    transport.write(LINK_RESET).await?;
    sleep(config.settle_period).await;

    loop {
        let discarded = transport.discard_input().await?;
        if discarded == 0 {
            break;
        }
        debug!("Discarded {} stale bytes", discarded);
        sleep(config.quiet_interval).await;
    }

    Ok(())
}
