//! Credential synchronization
//!
//! The device reports a rolling hash of its credential store. When it differs
//! from the hash of the local set, the store is wiped and re-uploaded in
//! order, then the hash is checked again.

use doorlink_core::{command::reply, Command};
use doorlink_types::CredentialSet;
use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::link::Link;

/// What [`CredentialSync::reconcile`] had to do
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncOutcome {
    /// Device hash already matched
    InSync,

    /// Store was reset and this many credentials uploaded
    Uploaded { count: usize },
}

/// Owner of the authorized credential set
#[derive(Debug, Clone)]
pub struct CredentialSync {
    credentials: CredentialSet,
    hash_reply: String,
}

impl CredentialSync {
    pub fn new(credentials: CredentialSet) -> Self {
        let hash = credentials.hash();
        debug!("key hash {}", hash);

        Self {
            hash_reply: reply::key_hash(&hash),
            credentials,
        }
    }

    pub fn credentials(&self) -> &CredentialSet {
        &self.credentials
    }

    /// Hash reply a device in sync gives to `K0`
    pub fn expected_hash_reply(&self) -> &str {
        &self.hash_reply
    }

    /// Bring the device credential store in line with the local set
    ///
    /// # Errors
    ///
    /// - [`Error::KeyResetFailed`] if the store reset is not acknowledged
    /// - [`Error::KeyUploadRejected`] if any credential is refused
    /// - [`Error::KeyUploadCorrupt`] if the hash still differs after upload
    pub async fn reconcile(&self, link: &mut Link) -> Result<SyncOutcome> {
        let reported = link.do_command(&Command::ReportKeyHash).await?;
        if reported == self.hash_reply {
            debug!("Device keys in sync");
            return Ok(SyncOutcome::InSync);
        }

        info!(
            device = %reported,
            local = %self.hash_reply,
            count = self.credentials.len(),
            "Uploading keys"
        );

        link.expect(&Command::ResetKeys, reply::ACK, Error::KeyResetFailed)
            .await?;

        for credential in &self.credentials {
            let command = Command::AddKey {
                card_id: credential.card_id.clone(),
                pin: credential.pin.clone(),
            };
            link.expect(&command, reply::ACK, Error::KeyUploadRejected)
                .await?;
        }

        link.expect(&Command::ReportKeyHash, &self.hash_reply, Error::KeyUploadCorrupt)
            .await?;

        Ok(SyncOutcome::Uploaded {
            count: self.credentials.len(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use doorlink_core::frame::encode_line;
    use doorlink_transport::MockTransport;
    use doorlink_types::Credential;
    use pretty_assertions::assert_eq;

    fn credentials() -> CredentialSet {
        [Credential::new("04a1", "1234"), Credential::new("04B2", "9876")]
            .into_iter()
            .collect()
    }

    #[tokio::test]
    async fn test_in_sync_uploads_nothing() {
        let sync = CredentialSync::new(credentials());
        let hash_reply = sync.expected_hash_reply().to_string();
        let (transport, handle) = MockTransport::opened(move |payload| match payload {
            "K0" => vec![encode_line(&hash_reply)],
            _ => vec![],
        });
        let mut link = Link::new(Box::new(transport));

        assert_eq!(sync.reconcile(&mut link).await.unwrap(), SyncOutcome::InSync);
        assert_eq!(handle.sent(), vec!["K0"]);
    }

    #[test]
    fn test_matching_literal_hash() {
        let sync = CredentialSync::new(credentials());
        let hash = credentials().hash();
        assert_eq!(sync.expected_hash_reply(), format!("H0{hash}"));
    }

    #[tokio::test]
    async fn test_mismatch_uploads_in_order() {
        let sync = CredentialSync::new(credentials());
        let hash_reply = sync.expected_hash_reply().to_string();
        let mut reports = 0;
        let (transport, handle) = MockTransport::opened(move |payload| match payload {
            "K0" => {
                reports += 1;
                if reports == 1 {
                    vec![encode_line("H01234")]
                } else {
                    vec![encode_line(&hash_reply)]
                }
            }
            "R0" => vec![encode_line("A0")],
            p if p.starts_with("N0") => vec![encode_line("A0")],
            _ => vec![],
        });
        let mut link = Link::new(Box::new(transport));

        let outcome = sync.reconcile(&mut link).await.unwrap();

        assert_eq!(outcome, SyncOutcome::Uploaded { count: 2 });
        assert_eq!(
            handle.sent(),
            vec!["K0", "R0", "N004A1 1234", "N004B2 9876", "K0"]
        );
    }

    #[tokio::test]
    async fn test_reset_refused() {
        let sync = CredentialSync::new(credentials());
        let (transport, handle) = MockTransport::opened(|payload| match payload {
            "K0" => vec![encode_line("H01234")],
            "R0" => vec![encode_line("A1")],
            _ => vec![],
        });
        let mut link = Link::new(Box::new(transport));

        let err = sync.reconcile(&mut link).await.unwrap_err();

        assert!(matches!(err, Error::KeyResetFailed(_)));
        assert_eq!(handle.sent(), vec!["K0", "R0"]);
    }

    #[tokio::test]
    async fn test_upload_rejected_stops_upload() {
        let sync = CredentialSync::new(credentials());
        let (transport, handle) = MockTransport::opened(|payload| match payload {
            "K0" => vec![encode_line("H01234")],
            "R0" => vec![encode_line("A0")],
            _ => vec![encode_line("A1")],
        });
        let mut link = Link::new(Box::new(transport));

        let err = sync.reconcile(&mut link).await.unwrap_err();

        assert!(matches!(err, Error::KeyUploadRejected(_)));
        assert_eq!(handle.sent(), vec!["K0", "R0", "N004A1 1234"]);
    }

    #[tokio::test]
    async fn test_upload_corrupt() {
        let sync = CredentialSync::new(credentials());
        let (transport, _handle) = MockTransport::opened(|payload| match payload {
            "K0" => vec![encode_line("H01234")],
            _ => vec![encode_line("A0")],
        });
        let mut link = Link::new(Box::new(transport));

        let err = sync.reconcile(&mut link).await.unwrap_err();

        match err {
            Error::KeyUploadCorrupt(m) => assert_eq!(m.received, "H01234"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_empty_set_still_resets() {
        let sync = CredentialSync::new(CredentialSet::default());
        let mut reports = 0;
        let (transport, handle) = MockTransport::opened(move |payload| match payload {
            "K0" => {
                reports += 1;
                if reports == 1 {
                    vec![encode_line("H01234")]
                } else {
                    vec![encode_line("H00000")]
                }
            }
            _ => vec![encode_line("A0")],
        });
        let mut link = Link::new(Box::new(transport));

        let outcome = sync.reconcile(&mut link).await.unwrap();

        assert_eq!(outcome, SyncOutcome::Uploaded { count: 0 });
        assert_eq!(handle.sent(), vec!["K0", "R0", "K0"]);
    }
}
