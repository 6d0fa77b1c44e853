//! Feishu event subscription webhook
//!
//! Decodes the payloads Feishu POSTs to an app's event subscription URL,
//! answers URL verification challenges, and keeps the latest app ticket so a
//! public app identity can read it through `AppTicketProvider`.
//!
//! Request handling:
//! 1. Encrypted bodies (`{"encrypt": ...}`) go through the configured
//!    `Decrypt` implementation
//! 2. The verification token must match the configured one
//! 3. `url_verification` echoes the challenge; `event_callback` decodes the
//!    event by its `type` tag

pub mod error;
pub mod event;
pub mod handler;
pub mod payload;

pub use error::{Error, Result};
pub use event::Event;
pub use handler::{Decrypt, Outcome, WebhookHandler};
pub use payload::{PAYLOAD_TYPE_EVENT_CALLBACK, PAYLOAD_TYPE_URL_VERIFICATION, Payload};
