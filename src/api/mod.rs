//! HTTP API server for the intercom gateway

pub mod health;
pub mod twilio;

use std::path::PathBuf;
use std::sync::Arc;

use axum::Router;
use tokio::net::TcpListener;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::Result;
use crate::call::CallFlow;
use crate::voice::AUDIO_ROUTE;

/// Shared state for API handlers
pub struct ApiState {
    pub calls: CallFlow,
}

/// API server
pub struct ApiServer {
    state: Arc<ApiState>,
    port: u16,
    audio_dir: PathBuf,
}

impl ApiServer {
    #[must_use]
    pub fn new(calls: CallFlow, port: u16, audio_dir: PathBuf) -> Self {
        Self {
            state: Arc::new(ApiState { calls }),
            port,
            audio_dir,
        }
    }

    /// Build the router with all routes
    #[must_use]
    pub fn router(&self) -> Router {
        router(self.state.clone(), &self.audio_dir)
    }

    /// Run the API server
    ///
    /// # Errors
    ///
    /// Returns error if server fails to bind or run
    pub async fn run(self) -> Result<()> {
        let addr = format!("0.0.0.0:{}", self.port);
        let listener = TcpListener::bind(&addr)
            .await
            .map_err(|e| crate::Error::Config(format!("failed to bind API server: {e}")))?;

        tracing::info!(port = self.port, audio_dir = %self.audio_dir.display(), "API server listening");

        axum::serve(listener, self.router())
            .await
            .map_err(|e| crate::Error::Config(format!("API server error: {e}")))?;

        Ok(())
    }
}

/// Build the full router over shared state
pub fn router(state: Arc<ApiState>, audio_dir: &std::path::Path) -> Router {
    Router::new()
        .merge(health::router())
        .nest("/twilio", twilio::router(state))
        .nest_service(AUDIO_ROUTE, ServeDir::new(audio_dir))
        .layer(TraceLayer::new_for_http())
}
