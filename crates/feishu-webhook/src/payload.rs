//! Webhook envelope

use serde::Deserialize;
use serde_json::Value;

pub const PAYLOAD_TYPE_URL_VERIFICATION: &str = "url_verification";
pub const PAYLOAD_TYPE_EVENT_CALLBACK: &str = "event_callback";

/// Outer payload of every subscription request, after decryption.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Payload {
    /// `event_callback` or `url_verification`.
    #[serde(rename = "type")]
    pub kind: String,
    /// Verification token.
    pub token: String,
    /// Present for `url_verification`; must be echoed back.
    pub challenge: String,
    /// Send time, for `event_callback`.
    #[serde(rename = "ts")]
    pub timestamp: String,
    /// Unique event id, for idempotent processing of `event_callback`.
    pub uuid: String,
    /// Undecoded event body, for `event_callback`.
    pub event: Value,
}

/// Body sent when an encrypt key is configured for the app.
#[derive(Debug, Deserialize)]
pub(crate) struct EncryptedPayload {
    pub encrypt: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_event_callback_envelope() {
        let payload: Payload = serde_json::from_str(
            r#"{"type":"event_callback","token":"vt","ts":"1600000000.1","uuid":"u-1","event":{"type":"app_ticket"}}"#,
        )
        .unwrap();
        assert_eq!(payload.kind, PAYLOAD_TYPE_EVENT_CALLBACK);
        assert_eq!(payload.timestamp, "1600000000.1");
        assert_eq!(payload.uuid, "u-1");
        assert_eq!(payload.event["type"], "app_ticket");
        assert!(payload.challenge.is_empty());
    }

    #[test]
    fn missing_fields_default_to_empty() {
        let payload: Payload = serde_json::from_str("{}").unwrap();
        assert!(payload.kind.is_empty());
        assert!(payload.event.is_null());
    }
}
