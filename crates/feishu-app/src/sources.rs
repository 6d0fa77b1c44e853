//! Token sources backed by the Feishu auth endpoints

use std::sync::Arc;

use feishu_auth::{
    AccessToken, AppAccessTokenProvider, AppCredentials, AppTicketProvider, AuthClient,
};
use token_refresh::{BoxError, IssuedToken, TokenFuture, TokenSource};

fn into_issued(token: AccessToken) -> IssuedToken {
    IssuedToken::expiring_in(token.token, token.expires_in)
}

/// App access token of an internal app.
pub struct InternalAppTokenSource {
    client: AuthClient,
    creds: AppCredentials,
}

impl InternalAppTokenSource {
    pub fn new(client: AuthClient, creds: AppCredentials) -> Self {
        Self { client, creds }
    }
}

impl TokenSource for InternalAppTokenSource {
    fn fetch(&self) -> TokenFuture<'_> {
        Box::pin(async move {
            let token = self.client.internal_app_access_token(&self.creds).await?;
            Ok::<_, BoxError>(into_issued(token))
        })
    }
}

/// Tenant access token of an internal app.
pub struct InternalTenantTokenSource {
    client: AuthClient,
    creds: AppCredentials,
}

impl InternalTenantTokenSource {
    pub fn new(client: AuthClient, creds: AppCredentials) -> Self {
        Self { client, creds }
    }
}

impl TokenSource for InternalTenantTokenSource {
    fn fetch(&self) -> TokenFuture<'_> {
        Box::pin(async move {
            let token = self.client.internal_tenant_access_token(&self.creds).await?;
            Ok::<_, BoxError>(into_issued(token))
        })
    }
}

/// App access token of a public app. Needs the current app ticket; without
/// one the fetch fails and the refresher falls back to its retry cadence.
pub struct PublicAppTokenSource {
    client: AuthClient,
    creds: AppCredentials,
    tickets: Arc<dyn AppTicketProvider>,
}

impl PublicAppTokenSource {
    pub fn new(
        client: AuthClient,
        creds: AppCredentials,
        tickets: Arc<dyn AppTicketProvider>,
    ) -> Self {
        Self {
            client,
            creds,
            tickets,
        }
    }
}

impl TokenSource for PublicAppTokenSource {
    fn fetch(&self) -> TokenFuture<'_> {
        Box::pin(async move {
            let ticket = self.tickets.app_ticket()?;
            let token = self
                .client
                .public_app_access_token(&self.creds, &ticket)
                .await?;
            Ok::<_, BoxError>(into_issued(token))
        })
    }
}

/// Tenant access token for one tenant of a public app, exchanged from the
/// app's current app access token.
pub struct PublicTenantTokenSource {
    client: AuthClient,
    app_tokens: Arc<dyn AppAccessTokenProvider>,
    tenant_key: String,
}

impl PublicTenantTokenSource {
    pub fn new(
        client: AuthClient,
        app_tokens: Arc<dyn AppAccessTokenProvider>,
        tenant_key: impl Into<String>,
    ) -> Self {
        Self {
            client,
            app_tokens,
            tenant_key: tenant_key.into(),
        }
    }
}

impl TokenSource for PublicTenantTokenSource {
    fn fetch(&self) -> TokenFuture<'_> {
        Box::pin(async move {
            let app_token = self.app_tokens.app_access_token()?;
            let token = self
                .client
                .public_tenant_access_token(&app_token, &self.tenant_key)
                .await?;
            Ok::<_, BoxError>(into_issued(token))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{StaticTicket, client_for, creds, start_mock_feishu};
    use axum::Json;
    use axum::routing::post;
    use feishu_auth::INTERNAL_APP_ACCESS_TOKEN_PATH;
    use serde_json::json;
    use token_refresh::MAX_TOKEN_TTL;
    use tokio::net::TcpListener;
    use tokio::time::Instant;

    #[tokio::test]
    async fn internal_sources_return_tokens_with_expiry() {
        let base = start_mock_feishu().await;

        let before = Instant::now();
        let app = InternalAppTokenSource::new(client_for(&base), creds())
            .fetch()
            .await
            .unwrap();
        assert_eq!(app.value, "a-internal");
        assert!(app.expires_at >= before + std::time::Duration::from_secs(7200));

        let tenant = InternalTenantTokenSource::new(client_for(&base), creds())
            .fetch()
            .await
            .unwrap();
        assert_eq!(tenant.value, "t-internal");
    }

    #[tokio::test]
    async fn public_source_without_ticket_fails_before_network() {
        // Unroutable base: the call must not get that far.
        let source = PublicAppTokenSource::new(
            client_for("http://127.0.0.1:1"),
            creds(),
            Arc::new(StaticTicket(None)),
        );
        let err = source.fetch().await.unwrap_err();
        assert!(err.to_string().contains("no app ticket"), "got: {err}");
    }

    #[tokio::test]
    async fn public_source_uses_ticket() {
        let base = start_mock_feishu().await;
        let source = PublicAppTokenSource::new(
            client_for(&base),
            creds(),
            Arc::new(StaticTicket(Some("ticket-1".into()))),
        );
        assert_eq!(source.fetch().await.unwrap().value, "a-public");
    }

    #[tokio::test]
    async fn public_tenant_source_exchanges_app_token() {
        struct FixedAppToken;
        impl AppAccessTokenProvider for FixedAppToken {
            fn app_access_token(&self) -> feishu_auth::Result<String> {
                Ok("a-public".into())
            }
        }

        let base = start_mock_feishu().await;
        let source = PublicTenantTokenSource::new(client_for(&base), Arc::new(FixedAppToken), "acme");
        assert_eq!(source.fetch().await.unwrap().value, "t-acme");
    }

    #[tokio::test]
    async fn huge_expire_is_clamped_not_overflowed() {
        let app = axum::Router::new().route(
            INTERNAL_APP_ACCESS_TOKEN_PATH,
            post(|| async {
                Json(json!({"code": 0, "msg": "ok", "app_access_token": "a", "expire": u64::MAX}))
            }),
        );
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let base = format!("http://{}", listener.local_addr().unwrap());
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        let before = Instant::now();
        let token = InternalAppTokenSource::new(client_for(&base), creds())
            .fetch()
            .await
            .unwrap();
        assert_eq!(token.value, "a");
        assert!(token.expires_at >= before + MAX_TOKEN_TTL);
        assert!(token.expires_at <= Instant::now() + MAX_TOKEN_TTL);
    }
}
