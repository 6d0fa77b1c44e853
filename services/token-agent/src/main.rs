//! Feishu token agent
//!
//! Single-binary service that:
//! 1. Keeps the configured app's access tokens fresh in the background
//! 2. Receives Feishu event subscription requests and collects app tickets
//! 3. Reports token availability on /health and refresh metrics on /metrics

mod agent;
mod config;
mod metrics;

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use axum::Router;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use feishu_auth::AuthClient;
use feishu_webhook::{Outcome, WebhookHandler};
use metrics_exporter_prometheus::PrometheusHandle;
use tokio::net::TcpListener;
use tokio::time::Instant;
use tracing::{debug, error, info, warn};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::agent::Agent;
use crate::config::Config;

/// Maximum time to wait for in-flight requests after a shutdown signal.
const DRAIN_TIMEOUT: Duration = Duration::from_secs(10);

/// Shared application state accessible from all handlers
#[derive(Clone)]
struct AppState {
    agent: Arc<Agent>,
    webhook: Option<Arc<WebhookHandler>>,
    prometheus: PrometheusHandle,
    started_at: Instant,
}

/// Build the axum router with all routes and shared state.
fn build_router(state: AppState, max_connections: usize) -> Router {
    let mut router = Router::new()
        .route("/health", get(health_handler))
        .route("/metrics", get(metrics_handler));
    if state.webhook.is_some() {
        router = router.route("/webhook", post(webhook_handler));
    }
    router
        .layer(tower::limit::ConcurrencyLimitLayer::new(max_connections))
        .with_state(state)
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing with JSON output and LOG_LEVEL / RUST_LOG support
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_env("LOG_LEVEL")
                .or_else(|_| EnvFilter::try_from_default_env())
                .unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with(tracing_subscriber::fmt::layer().json())
        .init();

    info!("starting feishu-token-agent");

    // Install before any refresher records a metric
    let prometheus_handle = metrics::install_recorder()?;

    // CLI: simple --config flag parsing
    let args: Vec<String> = std::env::args().collect();
    let cli_config_path = args
        .iter()
        .position(|a| a == "--config")
        .and_then(|i| args.get(i + 1))
        .map(|s| s.as_str());

    let config_path = Config::resolve_path(cli_config_path);
    info!(path = %config_path.display(), "loading configuration");

    let config = Config::load(&config_path)
        .with_context(|| format!("failed to load config from {}", config_path.display()))?;
    let refresh = config
        .refresh
        .to_refresh_config()
        .context("invalid refresh settings")?;

    info!(
        app_id = %config.app.app_id,
        mode = ?config.app.mode,
        tenants = config.app.tenants.len(),
        listen_addr = %config.server.listen_addr,
        update_interval_secs = refresh.update_interval().as_secs(),
        retry_interval_secs = refresh.retry_interval().as_secs(),
        "configuration loaded"
    );

    let webhook = match &config.webhook {
        Some(webhook) => Some(Arc::new(
            WebhookHandler::new(webhook.verification_token.clone())
                .context("invalid webhook settings")?,
        )),
        None => None,
    };

    let http = reqwest::Client::builder()
        .timeout(Duration::from_secs(30))
        .build()
        .context("failed to build HTTP client")?;
    let client = AuthClient::with_base_url(http, &config.app.base_url);

    let agent = Arc::new(Agent::build(&config, client, refresh, webhook.clone())?);

    // Bind before the first fetch so Feishu can deliver the app ticket
    // while public identities are still waiting for it.
    let listen_addr = config.server.listen_addr;
    let listener = TcpListener::bind(listen_addr)
        .await
        .with_context(|| format!("failed to bind to {listen_addr}"))?;

    let state = AppState {
        agent: Arc::clone(&agent),
        webhook,
        prometheus: prometheus_handle,
        started_at: Instant::now(),
    };
    let app = build_router(state, config.server.max_connections);

    let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel::<()>();
    let server_handle = tokio::spawn(async move {
        axum::serve(listener, app)
            .with_graceful_shutdown(async {
                let _ = shutdown_rx.await;
            })
            .await
    });
    info!(addr = %listen_addr, "accepting requests");

    let request_ticket = config
        .webhook
        .as_ref()
        .is_some_and(|webhook| webhook.request_ticket_on_start);
    run_until_shutdown(&agent, request_ticket, shutdown_signal()).await;

    // Stop refreshing first so no cycle runs during the drain
    agent.stop();
    let _ = shutdown_tx.send(());

    match tokio::time::timeout(DRAIN_TIMEOUT, server_handle).await {
        Ok(Ok(Ok(()))) => info!("all in-flight requests drained"),
        Ok(Ok(Err(e))) => error!(error = %e, "server error during shutdown"),
        Ok(Err(e)) => error!(error = %e, "server task panicked"),
        Err(_) => warn!(
            drain_timeout_secs = DRAIN_TIMEOUT.as_secs(),
            "drain timeout exceeded, forcing shutdown"
        ),
    }

    info!("shutdown complete");
    Ok(())
}

/// Health endpoint: token availability per refresher. Returns 200 when every
/// refresher holds a token, 503 otherwise.
async fn health_handler(State(state): State<AppState>) -> impl IntoResponse {
    let tokens = state.agent.token_statuses();
    let healthy = tokens.iter().all(|t| t.available);

    let status_code = if healthy {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    let body = serde_json::json!({
        "status": if healthy { "healthy" } else { "degraded" },
        "uptime_seconds": state.started_at.elapsed().as_secs(),
        "app_ticket": state.webhook.as_ref().map(|w| w.app_ticket().is_ok()),
        "tokens": tokens,
    });

    (
        status_code,
        [(header::CONTENT_TYPE, "application/json")],
        body.to_string(),
    )
}

/// Prometheus metrics endpoint, text exposition format.
async fn metrics_handler(State(state): State<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(
            header::CONTENT_TYPE,
            "text/plain; version=0.0.4; charset=utf-8",
        )],
        state.prometheus.render(),
    )
}

/// Feishu event subscription endpoint.
async fn webhook_handler(State(state): State<AppState>, body: Bytes) -> Response {
    let Some(handler) = state.webhook.as_ref() else {
        return StatusCode::NOT_FOUND.into_response();
    };

    match handler.handle(&body) {
        Ok(Outcome::Challenge(challenge)) => {
            metrics::record_webhook_request("challenge");
            axum::Json(serde_json::json!({ "challenge": challenge })).into_response()
        }
        Ok(Outcome::Event { payload, event }) => {
            metrics::record_webhook_request("event");
            info!(kind = event.kind(), uuid = %payload.uuid, "event received");
            StatusCode::OK.into_response()
        }
        Ok(Outcome::Other(payload)) => {
            metrics::record_webhook_request("other");
            debug!(kind = %payload.kind, "ignoring payload");
            StatusCode::OK.into_response()
        }
        Err(e) => {
            let code = e.status_code();
            metrics::record_webhook_request(&code.to_string());
            warn!(status = code, error = %e, "rejected webhook request");
            let status = StatusCode::from_u16(code).unwrap_or(StatusCode::BAD_REQUEST);
            (status, "Invalid payload").into_response()
        }
    }
}

/// Start the identities and wait for `shutdown`. A shutdown during a slow
/// startup abandons the remaining first fetches.
async fn run_until_shutdown<F>(agent: &Agent, request_ticket: bool, shutdown: F)
where
    F: Future<Output = ()>,
{
    tokio::pin!(shutdown);
    let startup = async {
        if request_ticket {
            agent.request_ticket_resend().await;
        }
        agent.start().await
    };

    tokio::select! {
        _ = startup => {}
        _ = &mut shutdown => {
            warn!("shutdown requested during startup");
            return;
        }
    }
    shutdown.await;
}

/// Wait for SIGTERM or SIGINT for graceful shutdown.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("received SIGINT, shutting down"),
        _ = terminate => info!("received SIGTERM, shutting down"),
    }
}
