//! Scripted in-memory device
//!
//! `MockTransport` stands in for the serial link in tests. Every checksummed
//! line the controller writes is recorded and handed to a responder closure,
//! whose returned lines are queued as device output. A [`MockHandle`] keeps
//! access to the shared state after the transport has been moved into the
//! code under test.

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use bytes::BytesMut;
use doorlink_core::checksum;
use doorlink_core::constants::{CHECKSUM_LEN, MIN_FRAME_LEN};
use parking_lot::Mutex;
use tracing::trace;

use crate::{error::*, Transport};

type Responder = Box<dyn FnMut(&str) -> Vec<String> + Send>;

#[derive(Debug, Default)]
struct MockState {
    open: bool,
    opened: usize,
    inbound: VecDeque<String>,
    sent: Vec<String>,
}

/// Scripted transport
pub struct MockTransport {
    state: Arc<Mutex<MockState>>,
    responder: Responder,
}

/// Inspection handle for a [`MockTransport`]
#[derive(Clone)]
pub struct MockHandle {
    state: Arc<Mutex<MockState>>,
}

impl MockTransport {
    /// Create a transport answering each command payload with `responder`
    ///
    /// The responder receives the payload without checksum and returns full
    /// lines; use [`doorlink_core::frame::encode_line`] for well-formed ones.
    pub fn new<F>(responder: F) -> (Self, MockHandle)
    where
        F: FnMut(&str) -> Vec<String> + Send + 'static,
    {
        let state = Arc::new(Mutex::new(MockState::default()));
        let transport = Self {
            state: Arc::clone(&state),
            responder: Box::new(responder),
        };
        (transport, MockHandle { state })
    }

    /// Create a transport that never answers
    pub fn silent() -> (Self, MockHandle) {
        Self::new(|_| Vec::new())
    }

    /// Create an already-open transport
    pub fn opened<F>(responder: F) -> (Self, MockHandle)
    where
        F: FnMut(&str) -> Vec<String> + Send + 'static,
    {
        let (transport, handle) = Self::new(responder);
        transport.state.lock().open = true;
        (transport, handle)
    }
}

/// Strip a valid checksum trailer, if the line has one
fn checked_payload(line: &str) -> Option<&str> {
    if line.len() < MIN_FRAME_LEN || !line.is_char_boundary(line.len() - CHECKSUM_LEN) {
        return None;
    }
    let (payload, trailer) = line.split_at(line.len() - CHECKSUM_LEN);
    checksum::verify(payload, trailer).then_some(payload)
}

#[async_trait]
impl Transport for MockTransport {
    async fn open(&mut self) -> Result<()> {
        let mut state = self.state.lock();
        if state.open {
            return Err(Error::AlreadyConnected);
        }
        state.open = true;
        state.opened += 1;
        Ok(())
    }

    async fn close(&mut self) -> Result<()> {
        self.state.lock().open = false;
        Ok(())
    }

    fn is_open(&self) -> bool {
        self.state.lock().open
    }

    async fn write(&mut self, data: &[u8]) -> Result<()> {
        let mut state = self.state.lock();
        if !state.open {
            return Err(Error::NotConnected);
        }

        let text = String::from_utf8_lossy(data);
        for line in text.lines() {
            match checked_payload(line) {
                Some(payload) => {
                    state.sent.push(payload.to_string());
                    let replies = (self.responder)(payload);
                    trace!(payload = payload, ?replies, "Mock device answered");
                    state.inbound.extend(replies);
                }
                None => state.sent.push(line.to_string()),
            }
        }
        Ok(())
    }

    async fn read_line(&mut self, _timeout: Duration) -> Result<BytesMut> {
        let mut state = self.state.lock();
        if !state.open {
            return Err(Error::NotConnected);
        }

        state
            .inbound
            .pop_front()
            .map(|line| BytesMut::from(line.as_bytes()))
            .ok_or(Error::ReadTimeout)
    }

    async fn bytes_available(&mut self) -> Result<usize> {
        Ok(self.state.lock().inbound.iter().map(String::len).sum())
    }

    async fn discard_input(&mut self) -> Result<usize> {
        let mut state = self.state.lock();
        let discarded = state.inbound.iter().map(String::len).sum();
        state.inbound.clear();
        Ok(discarded)
    }

    fn describe(&self) -> String {
        "mock".to_string()
    }
}

impl MockHandle {
    /// Payloads written so far, checksums stripped, in order
    pub fn sent(&self) -> Vec<String> {
        self.state.lock().sent.clone()
    }

    /// Forget recorded payloads
    pub fn clear_sent(&self) {
        self.state.lock().sent.clear();
    }

    /// Queue an unsolicited device line
    pub fn push_line(&self, line: impl Into<String>) {
        self.state.lock().inbound.push_back(line.into());
    }

    /// Lines queued but not yet read
    pub fn pending(&self) -> usize {
        self.state.lock().inbound.len()
    }

    /// Number of times the transport was opened
    pub fn open_count(&self) -> usize {
        self.state.lock().opened
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use doorlink_core::frame::encode_line;

    #[tokio::test]
    async fn test_responder_replies_to_commands() {
        let (mut transport, handle) = MockTransport::opened(|payload| match payload {
            "S0" => vec![encode_line("S1")],
            _ => vec![],
        });

        transport.write(encode_line("S0").as_bytes()).await.unwrap();

        assert_eq!(handle.sent(), vec!["S0"]);
        let line = transport.read_line(Duration::from_secs(1)).await.unwrap();
        assert_eq!(&line[..], encode_line("S1").as_bytes());
    }

    #[tokio::test]
    async fn test_bare_lines_recorded_verbatim() {
        let (mut transport, handle) = MockTransport::silent();
        transport.open().await.unwrap();

        transport.write(b"X\n").await.unwrap();

        assert_eq!(handle.sent(), vec!["X"]);
        assert_eq!(handle.open_count(), 1);
    }

    #[tokio::test]
    async fn test_empty_queue_times_out() {
        let (mut transport, _handle) = MockTransport::opened(|_| vec![]);

        let result = transport.read_line(Duration::from_secs(1)).await;
        assert!(matches!(result, Err(Error::ReadTimeout)));
    }

    #[tokio::test]
    async fn test_unsolicited_lines_and_discard() {
        let (mut transport, handle) = MockTransport::opened(|_| vec![]);

        handle.push_line("#boot\n");
        assert_eq!(transport.bytes_available().await.unwrap(), 6);

        assert_eq!(transport.discard_input().await.unwrap(), 6);
        assert_eq!(handle.pending(), 0);
    }

    #[tokio::test]
    async fn test_closed_transport_rejects_io() {
        let (mut transport, _handle) = MockTransport::silent();

        assert!(matches!(transport.write(b"X\n").await, Err(Error::NotConnected)));
        assert!(matches!(
            transport.read_line(Duration::from_secs(1)).await,
            Err(Error::NotConnected)
        ));
    }
}
