//! Request handling and app ticket storage

use std::borrow::Cow;
use std::fmt;
use std::sync::Arc;

use arc_swap::ArcSwapOption;
use feishu_auth::AppTicketProvider;
use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::event::Event;
use crate::payload::{
    EncryptedPayload, PAYLOAD_TYPE_EVENT_CALLBACK, PAYLOAD_TYPE_URL_VERIFICATION, Payload,
};

/// Decrypts the `encrypt` field of an encrypted request body.
///
/// Feishu encrypts with AES-256-CBC keyed by the SHA-256 of the app's
/// encrypt key; implementations return the plaintext JSON bytes.
pub trait Decrypt: Send + Sync {
    fn decrypt(
        &self,
        ciphertext_b64: &str,
    ) -> std::result::Result<Vec<u8>, Box<dyn std::error::Error + Send + Sync>>;
}

/// What the caller should do with an accepted request.
#[derive(Debug)]
pub enum Outcome {
    /// `url_verification`: respond with `{"challenge": ...}`.
    Challenge(String),
    /// `event_callback` with its decoded event.
    Event { payload: Payload, event: Event },
    /// Any other payload type, passed through undecoded.
    Other(Payload),
}

/// Validates and decodes webhook requests, remembering the latest app ticket.
pub struct WebhookHandler {
    verification_token: String,
    decrypter: Option<Arc<dyn Decrypt>>,
    ticket: ArcSwapOption<String>,
}

impl WebhookHandler {
    /// Handler for plaintext payloads.
    pub fn new(verification_token: impl Into<String>) -> Result<Self> {
        let verification_token = verification_token.into();
        if verification_token.is_empty() {
            return Err(Error::InvalidConfig(
                "verification token must not be empty".into(),
            ));
        }
        Ok(Self {
            verification_token,
            decrypter: None,
            ticket: ArcSwapOption::empty(),
        })
    }

    /// Require encrypted payloads, decrypted with `decrypter`.
    pub fn with_decrypter(mut self, decrypter: Arc<dyn Decrypt>) -> Self {
        self.decrypter = Some(decrypter);
        self
    }

    /// Validate and decode one request body.
    pub fn handle(&self, body: &[u8]) -> Result<Outcome> {
        let plaintext = self.plaintext(body)?;

        let payload: Payload = serde_json::from_slice(&plaintext)
            .map_err(|e| Error::MalformedPayload(e.to_string()))?;

        if payload.token != self.verification_token {
            return Err(Error::VerificationFailed);
        }

        match payload.kind.as_str() {
            PAYLOAD_TYPE_URL_VERIFICATION => {
                debug!("answering url verification challenge");
                Ok(Outcome::Challenge(payload.challenge))
            }
            PAYLOAD_TYPE_EVENT_CALLBACK => {
                let event = Event::decode(&payload.event)?;
                if let Event::AppTicket(ticket) = &event {
                    self.ticket.store(Some(Arc::new(ticket.app_ticket.clone())));
                    info!(app_id = %ticket.app_id, "app ticket updated");
                }
                debug!(kind = event.kind(), uuid = %payload.uuid, "event received");
                Ok(Outcome::Event { payload, event })
            }
            _ => Ok(Outcome::Other(payload)),
        }
    }

    /// Latest app ticket, or `NoTicketYet` before the first `app_ticket` event.
    pub fn app_ticket(&self) -> Result<String> {
        self.ticket
            .load_full()
            .map(|ticket| ticket.as_str().to_owned())
            .ok_or(Error::NoTicketYet)
    }

    fn plaintext<'a>(&self, body: &'a [u8]) -> Result<Cow<'a, [u8]>> {
        match &self.decrypter {
            Some(decrypter) => {
                let envelope: EncryptedPayload = serde_json::from_slice(body)
                    .map_err(|e| Error::Decrypt(format!("not an encrypted payload: {e}")))?;
                let plaintext = decrypter
                    .decrypt(&envelope.encrypt)
                    .map_err(|e| Error::Decrypt(e.to_string()))?;
                Ok(Cow::Owned(plaintext))
            }
            None => {
                if serde_json::from_slice::<EncryptedPayload>(body).is_ok() {
                    return Err(Error::NoDecrypter);
                }
                Ok(Cow::Borrowed(body))
            }
        }
    }
}

impl AppTicketProvider for WebhookHandler {
    fn app_ticket(&self) -> feishu_auth::Result<String> {
        WebhookHandler::app_ticket(self).map_err(|e| feishu_auth::Error::Unavailable(e.to_string()))
    }
}

impl fmt::Debug for WebhookHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WebhookHandler")
            .field("encrypted", &self.decrypter.is_some())
            .field("has_ticket", &self.ticket.load().is_some())
            .finish_non_exhaustive()
    }
}
