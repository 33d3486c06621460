//! Control loop
//!
//! Single-threaded scheduler that keeps the device in step after the
//! handshake: it services notifications, drains the event log, applies the
//! public-open override and sends drift-free heartbeats.

use doorlink_core::{constants::UNLOCK_KEY, Command};
use doorlink_transport::Transport;
use doorlink_types::{CredentialSet, LogEntry};
use tokio::time::{sleep, Instant};
use tracing::{debug, error, info};

use crate::config::ControllerConfig;
use crate::drain::drain;
use crate::error::Result;
use crate::handshake::handshake;
use crate::link::Link;
use crate::override_window::{OverrideSignal, PublicOpenWindow};
use crate::sync::{CredentialSync, SyncOutcome};

/// Controller lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkState {
    /// No confirmed session with the device
    Disconnected,

    /// Handshake in progress
    Handshaking,

    /// Handshake done, control loop running
    Steady,
}

/// What one control loop tick did
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TickReport {
    /// Frames routed from the inbound buffer
    pub frames: usize,

    /// Log entries drained, in device order
    pub log_entries: Vec<LogEntry>,

    /// Keypad characters consumed
    pub keys: Option<String>,

    /// Unlock issued for the public-open window
    pub unlocked: bool,

    /// Heartbeat sent
    pub heartbeat: bool,
}

/// Door controller
///
/// # Examples
///
/// ```no_run
/// use doorlink::{Controller, ControllerConfig, FileOverrideSignal, StreamTransport};
/// use doorlink::CredentialSet;
///
/// # async fn example() -> doorlink::Result<()> {
/// let credentials = CredentialSet::load("cards.dat")?;
/// let mut controller = Controller::new(
///     StreamTransport::serial("/dev/ttyUSB0"),
///     credentials,
///     FileOverrideSignal::default(),
///     ControllerConfig::default(),
/// );
///
/// controller.run().await
/// # }
/// ```
pub struct Controller {
    link: Link,
    sync: CredentialSync,
    signal: Box<dyn OverrideSignal>,
    window: PublicOpenWindow,
    config: ControllerConfig,
    state: LinkState,
    next_heartbeat: Instant,
}

impl Controller {
    pub fn new(
        transport: impl Transport + 'static,
        credentials: CredentialSet,
        signal: impl OverrideSignal + 'static,
        config: ControllerConfig,
    ) -> Self {
        Self {
            link: Link::new(Box::new(transport)).with_read_timeout(config.read_timeout),
            sync: CredentialSync::new(credentials),
            signal: Box::new(signal),
            window: PublicOpenWindow::default(),
            config,
            state: LinkState::Disconnected,
            next_heartbeat: Instant::now(),
        }
    }

    pub fn state(&self) -> LinkState {
        self.state
    }

    pub fn window(&self) -> &PublicOpenWindow {
        &self.window
    }

    pub fn link(&self) -> &Link {
        &self.link
    }

    /// Deadline of the next heartbeat
    pub fn next_heartbeat(&self) -> Instant {
        self.next_heartbeat
    }

    /// Handshake and run the control loop until a fatal error
    pub async fn run(&mut self) -> Result<()> {
        self.resync().await?;

        loop {
            let report = match self.tick(Instant::now()).await {
                Ok(report) => report,
                Err(e) => {
                    error!("Control loop failed: {}", e);
                    self.state = LinkState::Disconnected;
                    return Err(e);
                }
            };

            if !report.heartbeat {
                sleep(self.config.idle_quantum).await;
            }
        }
    }

    /// Run the handshake; the first heartbeat falls due immediately after
    pub async fn resync(&mut self) -> Result<SyncOutcome> {
        self.state = LinkState::Handshaking;

        match handshake(&mut self.link, &self.sync, &self.config).await {
            Ok(outcome) => {
                self.state = LinkState::Steady;
                self.next_heartbeat = Instant::now();
                Ok(outcome)
            }
            Err(e) => {
                self.state = LinkState::Disconnected;
                Err(e)
            }
        }
    }

    /// One pass of the control loop at time `now`
    ///
    /// Never sleeps; [`Controller::run`] idles between ticks that did not
    /// heartbeat.
    pub async fn tick(&mut self, now: Instant) -> Result<TickReport> {
        let mut report = TickReport::default();

        self.evaluate_override(now)?;

        report.frames = self.link.pump().await?;

        if self.link.take_event_pending() {
            report.log_entries = drain(&mut self.link).await?;
        }

        if let Some(keys) = self.link.take_keypad() {
            debug!("Keypad {}", keys);
            if self.window.is_active() && keys == UNLOCK_KEY {
                info!("Public-open unlock");
                let reply = self.link.do_command(&Command::Unlock).await?;
                debug!("Unlock reply {}", reply);
                report.unlocked = true;
            }
            report.keys = Some(keys);
        }

        if now >= self.next_heartbeat {
            self.link.heartbeat().await?;
            self.next_heartbeat += self.config.heartbeat_period;
            report.heartbeat = true;
        }

        Ok(report)
    }

    fn evaluate_override(&mut self, now: Instant) -> Result<()> {
        if let Some(hours) = self.signal.poll()? {
            self.window.open(now, hours);
        }
        self.window.expire(now);
        Ok(())
    }
}
