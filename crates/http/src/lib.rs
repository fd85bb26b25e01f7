//! HTTP callback transport: axum server, middleware, and the interactions
//! endpoint.

use std::sync::Arc;

use anyhow::Context;
use axum::{
    extract::Request,
    http::HeaderValue,
    middleware,
    routing::{get, post},
    Router,
};
use bookclub_kernel::settings::ServerSettings;
use bookclub_kernel::Dispatcher;
use bookclub_platform::InteractionApi;
use tower_http::request_id::{MakeRequestId, RequestId};
use uuid::{Timestamp, Uuid};

pub mod error;
pub mod interactions;
pub mod router;
pub mod signature;

use router::RouterBuilder;
pub use signature::SignatureVerifier;

/// Shared by every request handled by the server
#[derive(Clone)]
pub struct AppState {
    pub dispatcher: Arc<Dispatcher>,
    pub api: Arc<dyn InteractionApi>,
    /// Callback signature check; `None` only in tests.
    pub verifier: Option<Arc<SignatureVerifier>>,
}

/// Start the HTTP server
pub async fn start_server(state: AppState, settings: &ServerSettings) -> anyhow::Result<()> {
    if state.verifier.is_none() {
        anyhow::bail!("refusing to serve interaction callbacks without a signature verifier");
    }
    let app = build_router(state, settings);

    let listener = tokio::net::TcpListener::bind(format!("{}:{}", settings.host, settings.port))
        .await
        .context("failed to bind to address")?;

    tracing::info!(
        "HTTP server listening on http://{}:{}",
        settings.host,
        settings.port
    );

    axum::serve(listener, app)
        .await
        .context("HTTP server failed")?;

    Ok(())
}

/// Build the main HTTP router
pub fn build_router(state: AppState, settings: &ServerSettings) -> Router {
    let mut callbacks = Router::new().route("/interactions", post(interactions::interactions));
    if let Some(verifier) = state.verifier.clone() {
        callbacks = callbacks.route_layer(middleware::from_fn_with_state(
            verifier,
            signature::verify_signature,
        ));
    }
    let callbacks = callbacks.with_state(state);

    RouterBuilder::new()
        .route("/healthz", get(health_check))
        .merge(callbacks)
        .with_tracing()
        .with_request_id()
        .with_timeout(settings.request_timeout_ms)
        .build()
}

/// Health check endpoint
async fn health_check() -> &'static str {
    "ok"
}

/// Request ID generator for tracing
#[derive(Clone)]
pub(crate) struct MakeRequestUuid;

impl MakeRequestId for MakeRequestUuid {
    fn make_request_id<B>(&mut self, _request: &Request<B>) -> Option<RequestId> {
        let timestamp = Timestamp::now(uuid::NoContext);
        let request_id = Uuid::new_v7(timestamp)
            .to_string()
            .parse::<HeaderValue>()
            .ok()?;
        Some(RequestId::new(request_id))
    }
}
