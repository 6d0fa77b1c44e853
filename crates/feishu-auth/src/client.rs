//! Authorization endpoint calls
//!
//! Every call is a JSON POST to `base_url + path`. The platform answers
//! HTTP 200 with a `code`/`msg` pair even for business errors, so a
//! non-zero `code` is mapped to `Error::Api` before the token is trusted.

use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::AppCredentials;
use crate::constants::{
    DEFAULT_BASE_URL, INTERNAL_APP_ACCESS_TOKEN_PATH, INTERNAL_TENANT_ACCESS_TOKEN_PATH,
    PUBLIC_APP_ACCESS_TOKEN_PATH, PUBLIC_TENANT_ACCESS_TOKEN_PATH, RESEND_APP_TICKET_PATH,
};
use crate::error::{Error, Result};

/// A freshly issued token and how long it stays valid from now.
#[derive(Clone, PartialEq, Eq)]
pub struct AccessToken {
    pub token: String,
    pub expires_in: Duration,
}

impl std::fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AccessToken")
            .field("token", &"[REDACTED]")
            .field("expires_in", &self.expires_in)
            .finish()
    }
}

#[derive(Serialize)]
struct AppCredentialsBody<'a> {
    app_id: &'a str,
    app_secret: &'a str,
}

#[derive(Serialize)]
struct PublicAppTokenBody<'a> {
    app_id: &'a str,
    app_secret: &'a str,
    app_ticket: &'a str,
}

#[derive(Serialize)]
struct PublicTenantTokenBody<'a> {
    app_access_token: &'a str,
    tenant_key: &'a str,
}

/// Result envelope shared by every endpoint.
#[derive(Debug, Deserialize)]
struct ApiStatus {
    #[serde(default)]
    code: i64,
    #[serde(default)]
    msg: String,
}

impl ApiStatus {
    fn check(&self) -> Result<()> {
        if self.code != 0 {
            return Err(Error::Api {
                code: self.code,
                msg: self.msg.clone(),
            });
        }
        Ok(())
    }
}

#[derive(Debug, Deserialize)]
struct AppAccessTokenResponse {
    #[serde(flatten)]
    status: ApiStatus,
    #[serde(default)]
    app_access_token: String,
    #[serde(default)]
    expire: u64,
}

#[derive(Debug, Deserialize)]
struct TenantAccessTokenResponse {
    #[serde(flatten)]
    status: ApiStatus,
    #[serde(default)]
    tenant_access_token: String,
    #[serde(default)]
    expire: u64,
}

fn issued(status: &ApiStatus, token: String, expire: u64, kind: &str) -> Result<AccessToken> {
    status.check()?;
    if token.is_empty() {
        return Err(Error::InvalidResponse(format!("{kind} missing from response")));
    }
    Ok(AccessToken {
        token,
        expires_in: Duration::from_secs(expire),
    })
}

/// Client for the `/auth/v3` endpoints.
///
/// Cheap to clone; the underlying `reqwest::Client` shares its pool.
#[derive(Debug, Clone)]
pub struct AuthClient {
    http: reqwest::Client,
    base_url: String,
}

impl AuthClient {
    /// Client against the public Feishu API.
    pub fn new(http: reqwest::Client) -> Self {
        Self::with_base_url(http, DEFAULT_BASE_URL)
    }

    /// Client against a custom base URL (Lark, proxies, tests).
    /// Trailing slashes are trimmed.
    pub fn with_base_url(http: reqwest::Client, base_url: &str) -> Self {
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_owned(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// App access token for an internal app.
    pub async fn internal_app_access_token(&self, creds: &AppCredentials) -> Result<AccessToken> {
        let body = AppCredentialsBody {
            app_id: &creds.app_id,
            app_secret: creds.app_secret.expose(),
        };
        let res: AppAccessTokenResponse =
            self.post_json(INTERNAL_APP_ACCESS_TOKEN_PATH, &body).await?;
        issued(&res.status, res.app_access_token, res.expire, "app_access_token")
    }

    /// App access token for a public app, bound to the latest app ticket.
    pub async fn public_app_access_token(
        &self,
        creds: &AppCredentials,
        app_ticket: &str,
    ) -> Result<AccessToken> {
        let body = PublicAppTokenBody {
            app_id: &creds.app_id,
            app_secret: creds.app_secret.expose(),
            app_ticket,
        };
        let res: AppAccessTokenResponse = self.post_json(PUBLIC_APP_ACCESS_TOKEN_PATH, &body).await?;
        issued(&res.status, res.app_access_token, res.expire, "app_access_token")
    }

    /// Tenant access token for an internal app.
    pub async fn internal_tenant_access_token(
        &self,
        creds: &AppCredentials,
    ) -> Result<AccessToken> {
        let body = AppCredentialsBody {
            app_id: &creds.app_id,
            app_secret: creds.app_secret.expose(),
        };
        let res: TenantAccessTokenResponse =
            self.post_json(INTERNAL_TENANT_ACCESS_TOKEN_PATH, &body).await?;
        issued(
            &res.status,
            res.tenant_access_token,
            res.expire,
            "tenant_access_token",
        )
    }

    /// Tenant access token for one tenant of a public app.
    pub async fn public_tenant_access_token(
        &self,
        app_access_token: &str,
        tenant_key: &str,
    ) -> Result<AccessToken> {
        let body = PublicTenantTokenBody {
            app_access_token,
            tenant_key,
        };
        let res: TenantAccessTokenResponse =
            self.post_json(PUBLIC_TENANT_ACCESS_TOKEN_PATH, &body).await?;
        issued(
            &res.status,
            res.tenant_access_token,
            res.expire,
            "tenant_access_token",
        )
    }

    /// Ask the platform to push the app ticket to the webhook again.
    pub async fn resend_app_ticket(&self, creds: &AppCredentials) -> Result<()> {
        let body = AppCredentialsBody {
            app_id: &creds.app_id,
            app_secret: creds.app_secret.expose(),
        };
        let status: ApiStatus = self.post_json(RESEND_APP_TICKET_PATH, &body).await?;
        status.check()
    }

    async fn post_json<B, R>(&self, path: &str, body: &B) -> Result<R>
    where
        B: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let url = format!("{}{}", self.base_url, path);
        debug!(path, "calling Feishu auth endpoint");

        let response = self
            .http
            .post(&url)
            .json(body)
            .send()
            .await
            .map_err(|e| Error::Http(format!("POST {path} failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| String::from("<no body>"));
            return Err(Error::Http(format!("POST {path} returned {status}: {body}")));
        }

        response
            .json::<R>()
            .await
            .map_err(|e| Error::InvalidResponse(format!("decoding {path} response: {e}")))
    }
}
