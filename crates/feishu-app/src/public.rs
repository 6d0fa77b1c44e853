//! Public (store) app identity

use std::sync::Arc;

use feishu_auth::{AppAccessTokenProvider, AppCredentials, AppTicketProvider, AuthClient};
use token_refresh::{BoxError, CachedToken, RefreshConfig, TokenRefresher, UpdateCallback};
use tracing::info;

use crate::error::{Result, unavailable};
use crate::sources::PublicAppTokenSource;

/// Public app: one app access token, issued against the latest app ticket.
///
/// Until the webhook has received a ticket every fetch fails and the
/// refresher stays on its retry cadence.
#[derive(Debug)]
pub struct PublicApp {
    client: AuthClient,
    creds: AppCredentials,
    app: TokenRefresher,
}

pub struct PublicAppBuilder {
    client: AuthClient,
    creds: AppCredentials,
    tickets: Arc<dyn AppTicketProvider>,
    config: RefreshConfig,
    on_app_token: Option<UpdateCallback>,
}

impl PublicAppBuilder {
    pub fn config(mut self, config: RefreshConfig) -> Self {
        self.config = config;
        self
    }

    pub fn on_app_token<F>(mut self, callback: F) -> Self
    where
        F: Fn(&str) -> std::result::Result<(), BoxError> + Send + Sync + 'static,
    {
        self.on_app_token = Some(Arc::new(callback));
        self
    }

    pub fn build(self) -> PublicApp {
        let source =
            PublicAppTokenSource::new(self.client.clone(), self.creds.clone(), self.tickets);
        let mut app = TokenRefresher::builder(format!("PA-{}-app", self.creds.app_id), source)
            .config(self.config);
        if let Some(callback) = self.on_app_token {
            app = app.on_update_shared(callback);
        }

        PublicApp {
            client: self.client,
            creds: self.creds,
            app: app.build(),
        }
    }
}

impl PublicApp {
    pub fn builder(
        client: AuthClient,
        creds: AppCredentials,
        tickets: Arc<dyn AppTicketProvider>,
    ) -> PublicAppBuilder {
        PublicAppBuilder {
            client,
            creds,
            tickets,
            config: RefreshConfig::default(),
            on_app_token: None,
        }
    }

    pub fn app_id(&self) -> &str {
        &self.creds.app_id
    }

    pub async fn start(&self) -> Result<()> {
        Ok(self.app.start().await?)
    }

    pub fn app_access_token(&self) -> Result<String> {
        Ok(self.app.get()?)
    }

    /// Ask Feishu to push the app ticket to the webhook again. Useful right
    /// after deployment, when the next scheduled push may be an hour away.
    pub async fn request_ticket_resend(&self) -> Result<()> {
        self.client.resend_app_ticket(&self.creds).await?;
        info!(app_id = %self.creds.app_id, "requested app ticket resend");
        Ok(())
    }

    pub fn snapshots(&self) -> Vec<(&str, Option<Arc<CachedToken>>)> {
        vec![(self.app.name(), self.app.snapshot())]
    }

    pub fn stop(&self) {
        self.app.stop();
    }
}

impl AppAccessTokenProvider for PublicApp {
    fn app_access_token(&self) -> feishu_auth::Result<String> {
        self.app.get().map_err(unavailable)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use crate::testing::{TicketSlot, client_for, creds, start_counting_mock_feishu};

    fn fast_config() -> RefreshConfig {
        RefreshConfig::new(Duration::from_secs(60), Duration::from_secs(1)).unwrap()
    }

    #[tokio::test]
    async fn missing_ticket_fails_start_then_heals() {
        let (base, _calls) = start_counting_mock_feishu().await;
        let tickets = Arc::new(TicketSlot::default());
        let identity = PublicApp::builder(client_for(&base), creds(), tickets.clone())
            .config(fast_config())
            .build();

        let err = identity.start().await.unwrap_err();
        assert!(err.to_string().contains("no app ticket"), "got: {err}");
        assert!(identity.app_access_token().is_err());

        tickets.set("ticket-1");
        let mut token = None;
        for _ in 0..50 {
            tokio::time::sleep(Duration::from_millis(100)).await;
            if let Ok(value) = identity.app_access_token() {
                token = Some(value);
                break;
            }
        }
        assert_eq!(token.as_deref(), Some("a-public"));
        identity.stop();
    }

    #[tokio::test]
    async fn request_ticket_resend_calls_endpoint() {
        let (base, calls) = start_counting_mock_feishu().await;
        let identity =
            PublicApp::builder(client_for(&base), creds(), Arc::new(TicketSlot::default())).build();

        identity.request_ticket_resend().await.unwrap();
        assert_eq!(calls.resend(), 1);
        assert!(!identity.app.is_running(), "resend does not start the refresher");
    }

    #[tokio::test]
    async fn refresher_name_follows_app_id() {
        let identity = PublicApp::builder(
            client_for("http://127.0.0.1:1"),
            creds(),
            Arc::new(TicketSlot::default()),
        )
        .build();
        assert_eq!(identity.snapshots()[0].0, "PA-cli_test-app");
        assert!(identity.snapshots()[0].1.is_none());
    }
}
