//! Feishu open platform endpoints
//!
//! Paths are relative to the API base URL. Token validity is fixed by the
//! platform at two hours; a new token is issued once fewer than ten minutes
//! remain, while the old one stays valid until its own expiry.

/// Default API base URL
pub const DEFAULT_BASE_URL: &str = "https://open.feishu.cn/open-apis";

/// App access token for internal (self-built) apps
pub const INTERNAL_APP_ACCESS_TOKEN_PATH: &str = "/auth/v3/app_access_token/internal";

/// App access token for public (app store) apps, requires an app ticket
pub const PUBLIC_APP_ACCESS_TOKEN_PATH: &str = "/auth/v3/app_access_token";

/// Tenant access token for internal apps
pub const INTERNAL_TENANT_ACCESS_TOKEN_PATH: &str = "/auth/v3/tenant_access_token/internal";

/// Tenant access token for public apps, exchanged from an app access token
pub const PUBLIC_TENANT_ACCESS_TOKEN_PATH: &str = "/auth/v3/tenant_access_token";

/// Ask the platform to push a fresh app ticket to the webhook
pub const RESEND_APP_TICKET_PATH: &str = "/auth/v3/app_ticket/resend";
