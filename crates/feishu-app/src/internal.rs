//! Internal (self-built) app identity

use std::sync::Arc;

use feishu_auth::{AppAccessTokenProvider, AppCredentials, AuthClient, TenantAccessTokenProvider};
use token_refresh::{BoxError, CachedToken, RefreshConfig, TokenRefresher, UpdateCallback};

use crate::error::{Result, unavailable};
use crate::sources::{InternalAppTokenSource, InternalTenantTokenSource};

/// Internal app: app access token and tenant access token, both issued from
/// the app id and secret alone.
#[derive(Debug)]
pub struct InternalApp {
    app_id: String,
    app: TokenRefresher,
    tenant: TokenRefresher,
}

pub struct InternalAppBuilder {
    client: AuthClient,
    creds: AppCredentials,
    config: RefreshConfig,
    on_app_token: Option<UpdateCallback>,
    on_tenant_token: Option<UpdateCallback>,
}

impl InternalAppBuilder {
    pub fn config(mut self, config: RefreshConfig) -> Self {
        self.config = config;
        self
    }

    /// Called with the app access token after every refresh cycle.
    pub fn on_app_token<F>(mut self, callback: F) -> Self
    where
        F: Fn(&str) -> std::result::Result<(), BoxError> + Send + Sync + 'static,
    {
        self.on_app_token = Some(Arc::new(callback));
        self
    }

    /// Called with the tenant access token after every refresh cycle.
    pub fn on_tenant_token<F>(mut self, callback: F) -> Self
    where
        F: Fn(&str) -> std::result::Result<(), BoxError> + Send + Sync + 'static,
    {
        self.on_tenant_token = Some(Arc::new(callback));
        self
    }

    pub fn build(self) -> InternalApp {
        let app_id = self.creds.app_id.clone();

        let mut app = TokenRefresher::builder(
            format!("IA-{app_id}-app"),
            InternalAppTokenSource::new(self.client.clone(), self.creds.clone()),
        )
        .config(self.config);
        if let Some(callback) = self.on_app_token {
            app = app.on_update_shared(callback);
        }

        let mut tenant = TokenRefresher::builder(
            format!("IA-{app_id}-tenant"),
            InternalTenantTokenSource::new(self.client, self.creds),
        )
        .config(self.config);
        if let Some(callback) = self.on_tenant_token {
            tenant = tenant.on_update_shared(callback);
        }

        InternalApp {
            app_id,
            app: app.build(),
            tenant: tenant.build(),
        }
    }
}

impl InternalApp {
    pub fn builder(client: AuthClient, creds: AppCredentials) -> InternalAppBuilder {
        InternalAppBuilder {
            client,
            creds,
            config: RefreshConfig::default(),
            on_app_token: None,
            on_tenant_token: None,
        }
    }

    pub fn app_id(&self) -> &str {
        &self.app_id
    }

    /// Start both refreshers. Both are armed even if the first one fails;
    /// the first error is returned.
    pub async fn start(&self) -> Result<()> {
        let app = self.app.start().await;
        let tenant = self.tenant.start().await;
        app?;
        tenant?;
        Ok(())
    }

    pub fn app_access_token(&self) -> Result<String> {
        Ok(self.app.get()?)
    }

    pub fn tenant_access_token(&self) -> Result<String> {
        Ok(self.tenant.get()?)
    }

    /// Cached tokens keyed by refresher name, for health reporting.
    pub fn snapshots(&self) -> Vec<(&str, Option<Arc<CachedToken>>)> {
        vec![
            (self.app.name(), self.app.snapshot()),
            (self.tenant.name(), self.tenant.snapshot()),
        ]
    }

    pub fn stop(&self) {
        self.app.stop();
        self.tenant.stop();
    }
}

impl AppAccessTokenProvider for InternalApp {
    fn app_access_token(&self) -> feishu_auth::Result<String> {
        self.app.get().map_err(unavailable)
    }
}

impl TenantAccessTokenProvider for InternalApp {
    fn tenant_access_token(&self) -> feishu_auth::Result<String> {
        self.tenant.get().map_err(unavailable)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use std::time::Duration;

    use crate::Error;
    use crate::testing::{client_for, creds, start_counting_mock_feishu, start_mock_feishu};

    #[tokio::test]
    async fn start_fetches_both_tokens() {
        let base = start_mock_feishu().await;
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);

        let identity = InternalApp::builder(client_for(&base), creds())
            .on_tenant_token(move |token| {
                sink.lock().unwrap().push(token.to_owned());
                Ok(())
            })
            .build();
        identity.start().await.unwrap();

        assert_eq!(identity.app_access_token().unwrap(), "a-internal");
        assert_eq!(identity.tenant_access_token().unwrap(), "t-internal");
        assert_eq!(*seen.lock().unwrap(), vec!["t-internal"]);
        identity.stop();
    }

    #[tokio::test]
    async fn refresher_names_follow_app_id() {
        let identity = InternalApp::builder(client_for("http://127.0.0.1:1"), creds()).build();
        let names: Vec<&str> = identity.snapshots().into_iter().map(|(name, _)| name).collect();
        assert_eq!(names, ["IA-cli_test-app", "IA-cli_test-tenant"]);
        assert_eq!(identity.app_id(), "cli_test");
    }

    #[tokio::test]
    async fn bad_secret_surfaces_api_error_from_start() {
        let base = start_mock_feishu().await;
        let creds = AppCredentials::new("cli_test", "wrong".into());
        let identity = InternalApp::builder(client_for(&base), creds).build();

        let err = identity.start().await.unwrap_err();
        assert!(matches!(err, Error::Refresh(token_refresh::Error::FetchFailed { .. })));
        assert!(err.to_string().contains("invalid app_secret"), "got: {err}");

        let read = AppAccessTokenProvider::app_access_token(&identity).unwrap_err();
        assert!(matches!(read, feishu_auth::Error::Unavailable(_)));
        identity.stop();
    }

    #[tokio::test]
    async fn stop_silences_both_refreshers() {
        let (base, calls) = start_counting_mock_feishu().await;
        // A bad secret keeps both refreshers on the 1s retry cadence.
        let creds = AppCredentials::new("cli_test", "wrong".into());
        let identity = InternalApp::builder(client_for(&base), creds)
            .config(RefreshConfig::new(Duration::from_secs(60), Duration::from_secs(1)).unwrap())
            .build();

        assert!(identity.start().await.is_err());
        tokio::time::sleep(Duration::from_millis(1_500)).await;
        assert!(calls.internal() >= 4, "got {} calls", calls.internal());

        identity.stop();
        tokio::time::sleep(Duration::from_millis(200)).await;
        let after_stop = calls.internal();

        tokio::time::sleep(Duration::from_millis(2_500)).await;
        assert_eq!(calls.internal(), after_stop, "no fetch may happen after stop");
    }
}
