//! The webhook endpoint.

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::rejection::FormRejection;
use axum::extract::{DefaultBodyLimit, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Form, Json, Router};
use changes::{ChangeHook, ChangeHookConfig, ChangeHookError, ChangeSink};
use serde::Deserialize;
use serde_json::json;
use tower_http::trace::TraceLayer;

use crate::ListenerError;

/// Route the webhook is served on unless configured otherwise.
pub const DEFAULT_HOOK_PATH: &str = "/change_hook/bitbucket";

/// Route of the liveness probe.
pub const HEALTH_PATH: &str = "/health";

/// Largest request body accepted by default (32 MiB).
///
/// Form-encoded pushes of a few thousand commits pass axum's own 2 MiB cap.
pub const DEFAULT_BODY_LIMIT: usize = 32 * 1024 * 1024;

/// Response body for a valid push that carried no commits.
pub const NO_CHANGES_BODY: &str = "no changes found";

/// Response body for any push that could not be processed.
pub const ERROR_BODY: &str = "Error processing changes.";

/// Form fields posted by the hosting service.
#[derive(Debug, Default, Deserialize)]
pub struct HookForm {
    /// JSON push payload.
    pub payload: Option<String>,
    /// Project tag to stamp on every change record.
    pub project: Option<String>,
}

#[derive(Clone)]
struct HookState {
    hook: Arc<ChangeHook>,
    sink: Arc<dyn ChangeSink>,
}

/// Builder for the webhook [`Router`].
pub struct HookServer {
    config: ChangeHookConfig,
    path: String,
    body_limit: usize,
    sink: Arc<dyn ChangeSink>,
}

impl HookServer {
    /// Creates a server that hands change records to `sink`.
    pub fn new(sink: Arc<dyn ChangeSink>) -> Self {
        Self {
            config: ChangeHookConfig::default(),
            path: DEFAULT_HOOK_PATH.to_string(),
            body_limit: DEFAULT_BODY_LIMIT,
            sink,
        }
    }

    /// Sets the hook configuration.
    pub fn config(mut self, config: ChangeHookConfig) -> Self {
        self.config = config;
        self
    }

    /// Sets the route the webhook is served on.
    pub fn path(mut self, path: impl Into<String>) -> Self {
        self.path = path.into();
        self
    }

    /// Sets the largest request body, in bytes, the webhook accepts.
    ///
    /// Larger bodies fail form decoding and are answered like any other
    /// processing failure.
    pub fn body_limit(mut self, limit: usize) -> Self {
        self.body_limit = limit;
        self
    }

    /// Builds the router.
    ///
    /// # Panics
    ///
    /// If the configured path is not a valid route (it must start with `/`).
    pub fn build(self) -> Router {
        let state = HookState {
            hook: Arc::new(ChangeHook::new(self.config)),
            sink: self.sink,
        };

        Router::new()
            .route(HEALTH_PATH, get(health))
            .route(&self.path, post(receive_push))
            .layer(DefaultBodyLimit::max(self.body_limit))
            .layer(TraceLayer::new_for_http())
            .with_state(state)
    }
}

/// Serves `app` on `addr` until `shutdown` resolves.
///
/// # Errors
///
/// [`ListenerError::Bind`] if the socket cannot be bound, and
/// [`ListenerError::Serve`] if the server stops with an I/O failure.
pub async fn serve<F>(addr: SocketAddr, app: Router, shutdown: F) -> Result<(), ListenerError>
where
    F: Future<Output = ()> + Send + 'static,
{
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|source| ListenerError::Bind { addr, source })?;
    tracing::info!(addr = %addr, "Webhook listener started");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await?;

    tracing::info!("Webhook listener stopped");
    Ok(())
}

async fn health() -> impl IntoResponse {
    Json(json!({ "status": "ok" }))
}

async fn receive_push(
    State(state): State<HookState>,
    form: Result<Form<HookForm>, FormRejection>,
) -> Response {
    match process(&state, form).await {
        Ok(0) => (StatusCode::OK, NO_CHANGES_BODY).into_response(),
        Ok(_) => StatusCode::OK.into_response(),
        Err(err) => {
            tracing::error!(
                error = %err,
                client_fault = err.is_client_fault(),
                "Error processing changes"
            );
            (StatusCode::INTERNAL_SERVER_ERROR, ERROR_BODY).into_response()
        }
    }
}

/// Runs one push through the hook and the sink, returning the record count.
async fn process(
    state: &HookState,
    form: Result<Form<HookForm>, FormRejection>,
) -> Result<usize, ChangeHookError> {
    let Form(form) = form.map_err(ChangeHookError::malformed)?;
    let payload = form
        .payload
        .ok_or_else(|| ChangeHookError::malformed("missing form field 'payload'"))?;

    let changes = state.hook.process(&payload, form.project.as_deref())?;
    if changes.is_empty() {
        return Ok(0);
    }

    state.sink.add_changes(&changes).await?;
    Ok(changes.len())
}
