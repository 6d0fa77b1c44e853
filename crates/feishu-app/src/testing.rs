//! Shared fixtures for identity tests

use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use axum::Json;
use axum::routing::post;
use feishu_auth::{
    AppCredentials, AppTicketProvider, AuthClient, INTERNAL_APP_ACCESS_TOKEN_PATH,
    INTERNAL_TENANT_ACCESS_TOKEN_PATH, PUBLIC_APP_ACCESS_TOKEN_PATH,
    PUBLIC_TENANT_ACCESS_TOKEN_PATH, RESEND_APP_TICKET_PATH,
};
use serde_json::{Value, json};
use tokio::net::TcpListener;

pub fn creds() -> AppCredentials {
    AppCredentials::new("cli_test", "secret".into())
}

pub fn client_for(base: &str) -> AuthClient {
    AuthClient::with_base_url(reqwest::Client::new(), base)
}

/// Ticket provider with a settable value.
pub struct StaticTicket(pub Option<String>);

impl AppTicketProvider for StaticTicket {
    fn app_ticket(&self) -> feishu_auth::Result<String> {
        self.0
            .clone()
            .ok_or_else(|| feishu_auth::Error::Unavailable("no app ticket yet".into()))
    }
}

/// Ticket provider that can be filled in after construction.
#[derive(Default)]
pub struct TicketSlot(pub Mutex<Option<String>>);

impl TicketSlot {
    pub fn set(&self, ticket: &str) {
        *self.0.lock().unwrap() = Some(ticket.to_owned());
    }
}

impl AppTicketProvider for TicketSlot {
    fn app_ticket(&self) -> feishu_auth::Result<String> {
        self.0
            .lock()
            .unwrap()
            .clone()
            .ok_or_else(|| feishu_auth::Error::Unavailable("no app ticket yet".into()))
    }
}

/// Per-endpoint call counters of the mock server.
#[derive(Default)]
pub struct Calls {
    pub internal: AtomicUsize,
    pub resend: AtomicUsize,
    pub tenant: AtomicUsize,
}

impl Calls {
    /// Calls to either internal token endpoint.
    pub fn internal(&self) -> usize {
        self.internal.load(Ordering::SeqCst)
    }

    pub fn resend(&self) -> usize {
        self.resend.load(Ordering::SeqCst)
    }

    pub fn tenant(&self) -> usize {
        self.tenant.load(Ordering::SeqCst)
    }
}

pub async fn start_mock_feishu() -> String {
    start_counting_mock_feishu().await.0
}

/// Start a mock Feishu auth server; returns its base URL and call counters.
pub async fn start_counting_mock_feishu() -> (String, Arc<Calls>) {
    let calls = Arc::new(Calls::default());
    let app_calls = Arc::clone(&calls);
    let internal_tenant_calls = Arc::clone(&calls);
    let tenant_calls = Arc::clone(&calls);
    let resend_calls = Arc::clone(&calls);

    let app = axum::Router::new()
        .route(
            INTERNAL_APP_ACCESS_TOKEN_PATH,
            post(move |Json(body): Json<Value>| async move {
                app_calls.internal.fetch_add(1, Ordering::SeqCst);
                if body["app_secret"] != "secret" {
                    return Json(json!({"code": 10003, "msg": "invalid app_secret"}));
                }
                Json(json!({"code": 0, "msg": "ok", "app_access_token": "a-internal", "expire": 7200}))
            }),
        )
        .route(
            INTERNAL_TENANT_ACCESS_TOKEN_PATH,
            post(move |Json(body): Json<Value>| async move {
                internal_tenant_calls.internal.fetch_add(1, Ordering::SeqCst);
                if body["app_secret"] != "secret" {
                    return Json(json!({"code": 10003, "msg": "invalid app_secret"}));
                }
                Json(json!({"code": 0, "msg": "ok", "tenant_access_token": "t-internal", "expire": 7200}))
            }),
        )
        .route(
            PUBLIC_APP_ACCESS_TOKEN_PATH,
            post(|Json(body): Json<Value>| async move {
                if body["app_ticket"] != "ticket-1" {
                    return Json(json!({"code": 10012, "msg": "app_ticket is invalid"}));
                }
                Json(json!({"code": 0, "msg": "ok", "app_access_token": "a-public", "expire": 7200}))
            }),
        )
        .route(
            PUBLIC_TENANT_ACCESS_TOKEN_PATH,
            post(move |Json(body): Json<Value>| async move {
                tenant_calls.tenant.fetch_add(1, Ordering::SeqCst);
                if body["app_access_token"] != "a-public" {
                    return Json(json!({"code": 99991663, "msg": "app access token invalid"}));
                }
                let tenant = body["tenant_key"].as_str().unwrap_or_default().to_owned();
                Json(json!({"code": 0, "msg": "ok", "tenant_access_token": format!("t-{tenant}"), "expire": 7200}))
            }),
        )
        .route(
            RESEND_APP_TICKET_PATH,
            post(move || async move {
                resend_calls.resend.fetch_add(1, Ordering::SeqCst);
                Json(json!({"code": 0, "msg": "ok"}))
            }),
        );

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    (format!("http://{addr}"), calls)
}
