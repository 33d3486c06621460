//! Frame transceiver
//!
//! [`Link`] owns the transport and is the single path for every
//! command/response exchange. Unsolicited notifications that arrive while a
//! reply is awaited are routed into the session flags in arrival order; they
//! are never taken for the reply.

use std::time::Duration;

use doorlink_core::{
    command::reply,
    constants::DEFAULT_READ_TIMEOUT,
    frame::{self, encode_line},
    timestamp, Command, Notification,
};
use doorlink_transport::Transport;
use tracing::{debug, trace, warn};

use crate::error::{Error, Mismatch, Result};

/// Constructor for the error raised when a reply is not the expected one
pub type MismatchError = fn(Mismatch) -> Error;

/// Command/response session over a transport
pub struct Link {
    transport: Box<dyn Transport>,
    read_timeout: Duration,
    event_pending: bool,
    keypad: Option<String>,
}

impl Link {
    pub fn new(transport: Box<dyn Transport>) -> Self {
        Self {
            transport,
            read_timeout: DEFAULT_READ_TIMEOUT,
            event_pending: false,
            keypad: None,
        }
    }

    /// Set the per-frame read timeout
    pub fn with_read_timeout(mut self, timeout: Duration) -> Self {
        self.read_timeout = timeout;
        self
    }

    pub fn transport(&self) -> &dyn Transport {
        self.transport.as_ref()
    }

    pub fn transport_mut(&mut self) -> &mut dyn Transport {
        self.transport.as_mut()
    }

    /// Write one command line
    pub async fn send(&mut self, command: &Command) -> Result<()> {
        debug!("Sending {}", command);

        let line = encode_line(&command.encode());
        self.transport.write(line.as_bytes()).await?;

        Ok(())
    }

    /// Read and classify one line
    ///
    /// # Errors
    ///
    /// - [`Error::TransportTimeout`] if nothing arrived within the read timeout
    /// - checksum mismatch (see [`Error::is_checksum_mismatch`])
    pub async fn receive_one(&mut self) -> Result<Notification> {
        let line = self
            .transport
            .read_line(self.read_timeout)
            .await
            .map_err(|e| match e {
                doorlink_transport::Error::ReadTimeout => Error::TransportTimeout {
                    seconds: self.read_timeout.as_secs(),
                },
                other => Error::Transport(other),
            })?;

        let line = String::from_utf8_lossy(&line);
        trace!("Response: {}", line.trim_end());

        Ok(frame::classify(&line)?)
    }

    /// Fold a notification into the session flags, passing replies through
    fn route(&mut self, notification: Notification) -> Option<String> {
        match notification {
            Notification::EventPending => {
                self.event_pending = true;
                None
            }
            Notification::KeypadDigit(key) => {
                self.keypad.get_or_insert_with(String::new).push(key);
                None
            }
            Notification::Noise => None,
            Notification::Reply(body) => Some(body),
        }
    }

    /// Send a command and wait for its reply body
    pub async fn do_command(&mut self, command: &Command) -> Result<String> {
        self.send(command).await?;

        loop {
            let notification = self.receive_one().await?;
            if let Some(body) = self.route(notification) {
                debug!("Reply to {}: {}", command.name(), body);
                return Ok(body);
            }
        }
    }

    /// Send a command and require an exact reply
    pub async fn expect(
        &mut self,
        command: &Command,
        expected: &str,
        on_mismatch: MismatchError,
    ) -> Result<()> {
        let body = self.do_command(command).await?;
        if body != expected {
            debug!("Expected {:?} got {:?}", expected, body);
            return Err(on_mismatch(Mismatch::new(expected, body)));
        }
        Ok(())
    }

    /// Route every frame already buffered, without sending anything
    ///
    /// Returns the number of frames consumed. A reply seen here answers no
    /// outstanding command and is dropped.
    pub async fn pump(&mut self) -> Result<usize> {
        let mut frames = 0;
        while self.transport.bytes_available().await? > 0 {
            let notification = self.receive_one().await?;
            frames += 1;
            if let Some(body) = self.route(notification) {
                warn!(body = %body, "Dropping unsolicited reply");
            }
        }
        Ok(frames)
    }

    /// Liveness probe: the device must echo the current encoded time
    pub async fn heartbeat(&mut self) -> Result<()> {
        let now = timestamp::encoded_now();
        let echo = reply::heartbeat_echo(&now);

        self.expect(&Command::Heartbeat(now), &echo, Error::HeartbeatFailed)
            .await
    }

    /// Consume the event-pending flag
    pub fn take_event_pending(&mut self) -> bool {
        std::mem::take(&mut self.event_pending)
    }

    /// Consume the buffered keypad characters
    pub fn take_keypad(&mut self) -> Option<String> {
        self.keypad.take()
    }

    pub fn event_pending(&self) -> bool {
        self.event_pending
    }

    pub fn keypad(&self) -> Option<&str> {
        self.keypad.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use doorlink_core::checksum::checksum;
    use doorlink_transport::{MockHandle, MockTransport};
    use pretty_assertions::assert_eq;

    fn link(responder: impl FnMut(&str) -> Vec<String> + Send + 'static) -> (Link, MockHandle) {
        let (transport, handle) = MockTransport::opened(responder);
        (Link::new(Box::new(transport)), handle)
    }

    #[tokio::test]
    async fn test_send_appends_checksum() {
        let (mut link, handle) = link(|_| vec![]);

        link.send(&Command::ClaimAddress).await.unwrap();

        assert_eq!(handle.sent(), vec!["S0"]);
    }

    #[tokio::test]
    async fn test_receive_event_pending() {
        let (mut link, handle) = link(|_| vec![]);
        handle.push_line(format!("E{}\n", checksum("E")));

        assert_eq!(link.receive_one().await.unwrap(), Notification::EventPending);
    }

    #[tokio::test]
    async fn test_receive_timeout_is_fatal() {
        let (mut link, _handle) = link(|_| vec![]);

        let err = link.receive_one().await.unwrap_err();
        assert!(matches!(err, Error::TransportTimeout { seconds: 30 }));
    }

    #[tokio::test]
    async fn test_do_command_routes_notifications() {
        let (mut link, _handle) = link(|payload| match payload {
            "K0" => vec![
                "# debug chatter\n".to_string(),
                encode_line("E"),
                encode_line("Y01"),
                encode_line("Y0#"),
                encode_line("H0ABCD"),
            ],
            _ => vec![],
        });

        let body = link.do_command(&Command::ReportKeyHash).await.unwrap();

        assert_eq!(body, "H0ABCD");
        assert!(link.event_pending());
        assert_eq!(link.keypad(), Some("1#"));
    }

    #[tokio::test]
    async fn test_pump_after_reply_is_empty() {
        let (mut link, _handle) = link(|payload| match payload {
            "S0" => vec![encode_line("S1")],
            _ => vec![],
        });

        let body = link.do_command(&Command::ClaimAddress).await.unwrap();
        assert_eq!(body, "S1");
        assert_eq!(link.pump().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_do_command_checksum_mismatch() {
        let (mut link, _handle) = link(|_| vec!["S1FFFF\n".to_string()]);

        let err = link.do_command(&Command::ClaimAddress).await.unwrap_err();
        assert!(err.is_checksum_mismatch());
    }

    #[tokio::test]
    async fn test_expect_mismatch() {
        let (mut link, _handle) = link(|_| vec![encode_line("S2")]);

        let err = link
            .expect(&Command::ClaimAddress, "S1", Error::AddressClaimFailed)
            .await
            .unwrap_err();

        match err {
            Error::AddressClaimFailed(m) => assert_eq!(m, Mismatch::new("S1", "S2")),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_pump_drains_notifications() {
        let (mut link, handle) = link(|_| vec![]);
        handle.push_line(encode_line("Y05"));
        handle.push_line(encode_line("A0"));
        handle.push_line(encode_line("E"));

        assert_eq!(link.pump().await.unwrap(), 3);
        assert!(link.take_event_pending());
        assert!(!link.take_event_pending());
        assert_eq!(link.take_keypad().as_deref(), Some("5"));
        assert_eq!(link.take_keypad(), None);
    }

    #[tokio::test]
    async fn test_heartbeat_echo() {
        let (mut link, handle) = link(|payload| match payload.strip_prefix("P0") {
            Some(time) => vec![encode_line(&format!("P1{time}"))],
            None => vec![],
        });

        link.heartbeat().await.unwrap();

        let sent = handle.sent();
        assert_eq!(sent.len(), 1);
        assert!(sent[0].starts_with("P0"));
        assert!(timestamp::decode_time(&sent[0][2..]).is_ok());
    }

    #[tokio::test]
    async fn test_heartbeat_wrong_echo() {
        let (mut link, _handle) = link(|_| vec![encode_line("P1AAAAAA")]);

        let err = link.heartbeat().await.unwrap_err();
        assert!(matches!(err, Error::HeartbeatFailed(_)));
    }
}
