//! Simulated door device for integration tests

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::Arc;

use doorlink::{Credential, CredentialSet, MockTransport};
use doorlink_core::frame::encode_line;
use doorlink_transport::MockHandle;
use parking_lot::{Mutex, MutexGuard};

/// Device-side state
#[derive(Debug, Default)]
pub struct DeviceState {
    pub keys: Vec<Credential>,
    pub log: VecDeque<String>,
    pub unlocks: usize,
    /// Lines emitted ahead of the next reply
    pub interleave: VecDeque<String>,
    pub refuse_keys: bool,
}

#[derive(Clone, Default)]
pub struct SimDevice {
    state: Arc<Mutex<DeviceState>>,
}

impl SimDevice {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_keys(keys: &CredentialSet) -> Self {
        let device = Self::new();
        device.state().keys = keys.iter().cloned().collect();
        device
    }

    pub fn state(&self) -> MutexGuard<'_, DeviceState> {
        self.state.lock()
    }

    /// Transport the controller still has to open
    pub fn transport(&self) -> (MockTransport, MockHandle) {
        MockTransport::new(responder(Arc::clone(&self.state)))
    }

    /// Transport that skips the link reset
    pub fn opened_transport(&self) -> (MockTransport, MockHandle) {
        MockTransport::opened(responder(Arc::clone(&self.state)))
    }

}

fn responder(state: Arc<Mutex<DeviceState>>) -> impl FnMut(&str) -> Vec<String> + Send + 'static {
    move |payload| {
        let mut state = state.lock();
        let reply = answer(&mut state, payload);
        let mut lines: Vec<String> = state.interleave.drain(..).collect();
        lines.extend(reply.map(|body| encode_line(&body)));
        lines
    }
}

fn answer(state: &mut DeviceState, payload: &str) -> Option<String> {
    let (command, arg) = payload.split_at(payload.len().min(2));
    let body = match command {
        "S0" => "S1".to_string(),
        "P0" => format!("P1{arg}"),
        "K0" => format!("H0{}", state.keys.iter().cloned().collect::<CredentialSet>().hash()),
        "R0" => {
            state.keys.clear();
            "A0".to_string()
        }
        "N0" if state.refuse_keys => "A1".to_string(),
        "N0" => {
            let (card_id, pin) = arg.split_once(' ')?;
            state.keys.push(Credential::new(card_id, pin));
            "A0".to_string()
        }
        "G0" => format!("V0{}", state.log.front().map(String::as_str).unwrap_or("")),
        "C0" => {
            state.log.pop_front();
            "A0".to_string()
        }
        "U0" => {
            state.unlocks += 1;
            "A0".to_string()
        }
        _ => return None,
    };
    Some(body)
}

pub fn credentials() -> CredentialSet {
    CredentialSet::parse(
        "card_id pin user_id\n\
         04a1b2c3 1234 alice\n\
         04D4E5F6 9876 bob\n\
         0499AA01 0000 carol\n",
    )
    .unwrap()
}
