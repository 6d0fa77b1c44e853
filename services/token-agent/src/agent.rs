//! Identity assembly
//!
//! Builds the identities the config asks for and gives main and the health
//! endpoint one handle to start, inspect and stop them.

use std::sync::Arc;

use feishu_app::{InternalApp, PublicApp, PublicAppTenant};
use feishu_auth::{AppCredentials, AuthClient};
use feishu_webhook::WebhookHandler;
use serde::Serialize;
use token_refresh::{CachedToken, RefreshConfig};
use tokio::time::Instant;
use tracing::{info, warn};

use crate::config::{AppMode, Config};

/// Health view of one refresher. Never carries the token itself.
#[derive(Debug, Clone, Serialize)]
pub struct TokenStatus {
    pub name: String,
    pub available: bool,
    pub generation: u64,
    pub expires_in_secs: u64,
}

impl TokenStatus {
    fn new(name: &str, token: Option<Arc<CachedToken>>) -> Self {
        match token {
            Some(token) => Self {
                name: name.to_owned(),
                available: true,
                generation: token.generation(),
                expires_in_secs: token
                    .expires_at()
                    .saturating_duration_since(Instant::now())
                    .as_secs(),
            },
            None => Self {
                name: name.to_owned(),
                available: false,
                generation: 0,
                expires_in_secs: 0,
            },
        }
    }
}

/// The identities this agent keeps alive.
#[derive(Debug)]
pub enum Agent {
    Internal(InternalApp),
    Public {
        app: Arc<PublicApp>,
        tenants: Vec<PublicAppTenant>,
    },
}

impl Agent {
    /// Build the identities for `config`. Public mode reads app tickets from
    /// `webhook`.
    pub fn build(
        config: &Config,
        client: AuthClient,
        refresh: RefreshConfig,
        webhook: Option<Arc<WebhookHandler>>,
    ) -> anyhow::Result<Self> {
        let creds = AppCredentials::new(config.app.app_id.clone(), config.app.app_secret.clone());

        match config.app.mode {
            AppMode::Internal => Ok(Agent::Internal(
                InternalApp::builder(client, creds).config(refresh).build(),
            )),
            AppMode::Public => {
                let tickets = webhook
                    .ok_or_else(|| anyhow::anyhow!("public mode needs the webhook handler"))?;
                let app = Arc::new(
                    PublicApp::builder(client.clone(), creds, tickets)
                        .config(refresh)
                        .build(),
                );
                let tenants = config
                    .app
                    .tenants
                    .iter()
                    .map(|tenant_key| {
                        PublicAppTenant::builder(client.clone(), app.clone(), tenant_key.as_str())
                            .config(refresh)
                            .build()
                    })
                    .collect();
                Ok(Agent::Public { app, tenants })
            }
        }
    }

    /// Start every identity. Failures are logged, not fatal: each refresher
    /// keeps retrying in the background. Returns how many identities failed
    /// their first fetch.
    pub async fn start(&self) -> usize {
        let mut failed = 0;
        match self {
            Agent::Internal(app) => {
                if let Err(e) = app.start().await {
                    warn!(app_id = %app.app_id(), error = %e, "initial token fetch failed, retrying in background");
                    failed += 1;
                }
            }
            Agent::Public { app, tenants } => {
                if let Err(e) = app.start().await {
                    warn!(app_id = %app.app_id(), error = %e, "initial app token fetch failed, waiting for app ticket");
                    failed += 1;
                }
                for tenant in tenants {
                    if let Err(e) = tenant.start().await {
                        warn!(tenant_key = %tenant.tenant_key(), error = %e, "initial tenant token fetch failed, retrying in background");
                        failed += 1;
                    }
                }
            }
        }
        info!(failed, "identities started");
        failed
    }

    /// Ask Feishu for an immediate app ticket push. No-op in internal mode.
    pub async fn request_ticket_resend(&self) {
        if let Agent::Public { app, .. } = self {
            if let Err(e) = app.request_ticket_resend().await {
                warn!(app_id = %app.app_id(), error = %e, "app ticket resend request failed");
            }
        }
    }

    pub fn token_statuses(&self) -> Vec<TokenStatus> {
        let snapshots = match self {
            Agent::Internal(app) => app.snapshots(),
            Agent::Public { app, tenants } => {
                let mut all = app.snapshots();
                for tenant in tenants {
                    all.extend(tenant.snapshots());
                }
                all
            }
        };
        snapshots
            .into_iter()
            .map(|(name, token)| TokenStatus::new(name, token))
            .collect()
    }

    pub fn stop(&self) {
        match self {
            Agent::Internal(app) => app.stop(),
            Agent::Public { app, tenants } => {
                for tenant in tenants {
                    tenant.stop();
                }
                app.stop();
            }
        }
        info!("identities stopped");
    }
}
