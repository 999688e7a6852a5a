//! Browser form: an axum router serving the planner page and its actions.

pub mod errors;
pub mod handlers;
pub mod page;
pub mod session;

use std::sync::Arc;

use anyhow::Context;
use axum::{
    Router,
    routing::{get, post},
};
use tokio_util::sync::CancellationToken;
use tower_http::trace::TraceLayer;

use crate::travel::TripPlanner;

use session::SessionStore;

#[derive(Clone)]
pub struct AppState {
    pub planner: Arc<TripPlanner>,
    pub sessions: SessionStore,
}

impl AppState {
    pub fn new(planner: TripPlanner) -> Self {
        Self {
            planner: Arc::new(planner),
            sessions: SessionStore::new(),
        }
    }

    pub fn with_sessions(mut self, sessions: SessionStore) -> Self {
        self.sessions = sessions;
        self
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::index))
        .route("/plan", post(handlers::plan))
        .route("/history/clear", post(handlers::clear_history))
        .route("/session/kill", post(handlers::kill_session))
        .route("/theme", post(handlers::set_theme))
        .route("/health", get(handlers::health))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Bind `addr` and serve until `shutdown` is cancelled.
pub async fn serve(addr: &str, state: AppState, shutdown: CancellationToken) -> anyhow::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    let local = listener.local_addr()?;
    tracing::info!("Web server running at http://{local}");

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown.cancelled_owned())
        .await
        .context("Web server error")?;

    tracing::info!("Web server stopped");
    Ok(())
}
