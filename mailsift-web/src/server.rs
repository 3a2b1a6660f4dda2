//! HTTP server

use axum::{
    Router,
    extract::DefaultBodyLimit,
    routing::{get, post},
};
use mailsift_common::Signal;
use tokio::net::TcpListener;

use crate::{AppState, WebConfig, WebError, handlers};

/// Build the application router.
pub fn router(state: AppState, config: &WebConfig) -> Router {
    Router::new()
        .route("/validate", post(handlers::validate))
        .route("/validate/stream", post(handlers::validate_stream))
        .route("/validate_stream", post(handlers::validate_stream))
        .route("/download/deliverable", get(handlers::download_deliverable))
        .route(
            "/download/undeliverable",
            get(handlers::download_undeliverable),
        )
        .route("/health/live", get(handlers::liveness))
        .layer(DefaultBodyLimit::max(config.max_body_bytes))
        .with_state(state)
}

/// Web front-end server
pub struct WebServer {
    listener: TcpListener,
    router: Router,
    state: AppState,
}

impl WebServer {
    /// Bind the listener and build the router.
    ///
    /// # Errors
    ///
    /// Returns an error if binding to the configured address fails.
    pub async fn new(config: WebConfig, state: AppState) -> Result<Self, WebError> {
        let listener = TcpListener::bind(&config.listen_address)
            .await
            .map_err(|e| WebError::BindError {
                address: config.listen_address.clone(),
                source: e,
            })?;

        tracing::info!(
            address = %config.listen_address,
            "Web server bound successfully"
        );

        let router = router(state.clone(), &config);

        Ok(Self {
            listener,
            router,
            state,
        })
    }

    /// Address the server is listening on
    ///
    /// # Errors
    ///
    /// Returns an error if the socket has no local address.
    pub fn local_addr(&self) -> Result<std::net::SocketAddr, WebError> {
        self.listener
            .local_addr()
            .map_err(|e| WebError::ServerError(e.to_string()))
    }

    /// Run until a shutdown signal is received.
    ///
    /// Running batches are cancelled when the signal arrives, so open event
    /// streams finish promptly.
    ///
    /// # Errors
    ///
    /// Returns an error if the server encounters a runtime error.
    pub async fn serve(
        self,
        mut shutdown: tokio::sync::broadcast::Receiver<Signal>,
    ) -> Result<(), WebError> {
        tracing::info!("Web server starting");

        let state = self.state;
        axum::serve(self.listener, self.router)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Web server received shutdown signal");
                state.shutdown();
            })
            .await
            .map_err(|e| WebError::ServerError(e.to_string()))?;

        tracing::info!("Web server stopped");
        Ok(())
    }
}
