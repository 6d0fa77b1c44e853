//! Feishu open platform authorization calls
//!
//! Wraps the five `/auth/v3` endpoints the driver needs to keep app and
//! tenant access tokens alive, plus the provider traits the rest of the
//! workspace uses to hand tokens and app tickets to each other.
//!
//! Token kinds:
//! 1. Internal app: app id + secret -> app access token / tenant access token
//! 2. Public app: app id + secret + app ticket -> app access token
//! 3. Public tenant: public app access token + tenant key -> tenant access token
//!
//! The app ticket is pushed by Feishu to the app's webhook roughly every
//! hour; `resend_app_ticket` asks for an immediate push.

pub mod client;
pub mod config;
pub mod constants;
pub mod error;
pub mod provider;

pub use client::{AccessToken, AuthClient};
pub use config::AppCredentials;
pub use constants::*;
pub use error::{Error, Result};
pub use provider::{AppAccessTokenProvider, AppTicketProvider, TenantAccessTokenProvider};
