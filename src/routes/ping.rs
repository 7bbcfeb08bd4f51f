use axum::{routing::get, Json, Router};
use serde::Serialize;
use tracing::{info, instrument};

use crate::{
    auth::{claims::SessionIdentity, jwt::AuthUser},
    state::AppState,
};

#[derive(Debug, Serialize)]
pub struct PingResponse {
    pub success: bool,
    pub message: String,
    pub user: SessionIdentity,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub message: &'static str,
}

pub fn ping_routes() -> Router<AppState> {
    Router::new().route("/ping", get(ping))
}

/// Confirms the bearer token and echoes the identity it asserts.
#[instrument(skip_all, fields(user_id = %identity.user_id))]
pub async fn ping(AuthUser(identity): AuthUser) -> Json<PingResponse> {
    info!("token verified");
    Json(PingResponse {
        success: true,
        message: "Authentication successful".into(),
        user: identity,
    })
}

pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "success",
        message: "Backend is running!",
    })
}
