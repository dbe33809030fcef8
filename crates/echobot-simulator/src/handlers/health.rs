//! Health check handler.

use axum::{extract::State, Json};

use crate::state::AppState;
use crate::types::HealthResponse;

/// GET / - Health check endpoint.
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        simulator: "running".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        remote_url: state.config.remote_url.clone(),
        modes: state.available_modes(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SimulatorConfig;
    use crate::types::Mode;

    #[tokio::test]
    async fn test_health_handler() {
        let config = SimulatorConfig::default().with_remote_url(Some("https://hook.example.com".into()));
        let response = health(State(AppState::new(config))).await;

        assert_eq!(response.status, "ok");
        assert_eq!(response.simulator, "running");
        assert_eq!(response.modes, vec![Mode::Local, Mode::Remote]);
    }
}
