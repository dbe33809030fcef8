//! Router configuration and server setup.

use axum::{
    routing::{get, post},
    Router,
};
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tracing::info;

use crate::handlers;
use crate::state::AppState;

/// Creates the simulator router with all routes configured.
pub fn create_router(state: AppState) -> Router {
    // Any origin, so a browser chat UI can call us from another port
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(handlers::health))
        .route("/send-message", post(handlers::send_message))
        .route("/send-callback", post(handlers::send_callback))
        .layer(ServiceBuilder::new().layer(cors))
        .with_state(state)
}

/// Starts the simulator server.
pub async fn serve(state: AppState) -> Result<(), std::io::Error> {
    let addr = state.config.bind_address();
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("Simulator listening on {}", addr);
    axum::serve(listener, create_router(state))
        .with_graceful_shutdown(echobot_telegram::webhook::shutdown_signal())
        .await
}
