//! Tenant identity of a public app

use std::sync::Arc;

use feishu_auth::{AppAccessTokenProvider, AuthClient, TenantAccessTokenProvider};
use token_refresh::{BoxError, CachedToken, RefreshConfig, TokenRefresher, UpdateCallback};

use crate::error::{Result, unavailable};
use crate::sources::PublicTenantTokenSource;

/// Tenant access token for one tenant that installed a public app.
///
/// Reads the app access token from another identity on every fetch, so it
/// keeps failing (and retrying) until that identity has a token.
#[derive(Debug)]
pub struct PublicAppTenant {
    tenant_key: String,
    tenant: TokenRefresher,
}

pub struct PublicAppTenantBuilder {
    client: AuthClient,
    app_tokens: Arc<dyn AppAccessTokenProvider>,
    tenant_key: String,
    config: RefreshConfig,
    on_tenant_token: Option<UpdateCallback>,
}

impl PublicAppTenantBuilder {
    pub fn config(mut self, config: RefreshConfig) -> Self {
        self.config = config;
        self
    }

    pub fn on_tenant_token<F>(mut self, callback: F) -> Self
    where
        F: Fn(&str) -> std::result::Result<(), BoxError> + Send + Sync + 'static,
    {
        self.on_tenant_token = Some(Arc::new(callback));
        self
    }

    pub fn build(self) -> PublicAppTenant {
        let source =
            PublicTenantTokenSource::new(self.client, self.app_tokens, self.tenant_key.clone());
        let mut tenant =
            TokenRefresher::builder(format!("PA-tenant-{}", self.tenant_key), source)
                .config(self.config);
        if let Some(callback) = self.on_tenant_token {
            tenant = tenant.on_update_shared(callback);
        }

        PublicAppTenant {
            tenant_key: self.tenant_key,
            tenant: tenant.build(),
        }
    }
}

impl PublicAppTenant {
    pub fn builder(
        client: AuthClient,
        app_tokens: Arc<dyn AppAccessTokenProvider>,
        tenant_key: impl Into<String>,
    ) -> PublicAppTenantBuilder {
        PublicAppTenantBuilder {
            client,
            app_tokens,
            tenant_key: tenant_key.into(),
            config: RefreshConfig::default(),
            on_tenant_token: None,
        }
    }

    pub fn tenant_key(&self) -> &str {
        &self.tenant_key
    }

    pub async fn start(&self) -> Result<()> {
        Ok(self.tenant.start().await?)
    }

    pub fn tenant_access_token(&self) -> Result<String> {
        Ok(self.tenant.get()?)
    }

    pub fn snapshots(&self) -> Vec<(&str, Option<Arc<CachedToken>>)> {
        vec![(self.tenant.name(), self.tenant.snapshot())]
    }

    pub fn stop(&self) {
        self.tenant.stop();
    }
}

impl TenantAccessTokenProvider for PublicAppTenant {
    fn tenant_access_token(&self) -> feishu_auth::Result<String> {
        self.tenant.get().map_err(unavailable)
    }
}
