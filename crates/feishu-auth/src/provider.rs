//! Read contracts between token holders
//!
//! Identities expose their cached tokens through these traits so that a
//! tenant identity can borrow an app identity's token, and a public app can
//! read the app ticket collected by the webhook. Reads are synchronous and
//! must never perform I/O.

use crate::error::Result;

/// Supplies the latest app access token.
pub trait AppAccessTokenProvider: Send + Sync {
    fn app_access_token(&self) -> Result<String>;
}

/// Supplies the latest tenant access token.
pub trait TenantAccessTokenProvider: Send + Sync {
    fn tenant_access_token(&self) -> Result<String>;
}

/// Supplies the latest app ticket pushed to a public app.
pub trait AppTicketProvider: Send + Sync {
    fn app_ticket(&self) -> Result<String>;
}
