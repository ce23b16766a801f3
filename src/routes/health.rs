use axum::extract::State;
use axum::Json;
use serde::Serialize;

use crate::app_state::AppState;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub provider: String,
    pub mode: String,
    pub services: ConfiguredServices,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfiguredServices {
    pub storage: bool,
    pub generation_provider: bool,
}

#[derive(Serialize)]
pub struct ServiceInfo {
    pub message: String,
    pub version: String,
    pub provider: String,
}

/// GET /health: which external services have credentials configured.
///
/// Pure introspection: nothing is contacted, and the answer is always 200.
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let services = ConfiguredServices {
        storage: state.storage.is_configured(),
        generation_provider: state.provider.is_configured(),
    };
    let all_configured = services.storage && services.generation_provider;

    Json(HealthResponse {
        status: if all_configured {
            "healthy".to_string()
        } else {
            "degraded".to_string()
        },
        version: env!("CARGO_PKG_VERSION").to_string(),
        provider: state.provider.id().to_string(),
        mode: state.config.response_mode.as_str().to_string(),
        services,
    })
}

/// GET /: service banner.
pub async fn service_info(State(state): State<AppState>) -> Json<ServiceInfo> {
    Json(ServiceInfo {
        message: "Lip-sync video generation gateway".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        provider: state.provider.id().to_string(),
    })
}
