use axum::{
    extract::{rejection::JsonRejection, FromRef, Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use tracing::{instrument, warn};

use crate::{
    auth::{
        dto::{AuthResponse, LoginRequest, RegisterRequest, SearchQuery, UsersResponse},
        jwt::JwtKeys,
        repo_types::PublicUser,
        services::{is_valid_email, login_user, normalize_email, register_user},
    },
    error::{AppError, AppResult},
    state::AppState,
};

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
        .route("/auth/users", get(list_users))
        .route("/auth/users/search", get(search_users))
}

fn missing_fields() -> AppError {
    AppError::BadRequest("Missing required fields".into())
}

/// Returns the trimmed value, or `None` when absent or blank.
fn required(field: Option<String>) -> Option<String> {
    field
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[instrument(skip(state, payload))]
pub async fn register(
    State(state): State<AppState>,
    payload: Result<Json<RegisterRequest>, JsonRejection>,
) -> AppResult<(StatusCode, Json<AuthResponse>)> {
    let Json(payload) = payload.map_err(|e| {
        warn!(error = %e, "register body rejected");
        missing_fields()
    })?;

    let (Some(name), Some(email), Some(password)) = (
        required(payload.name),
        required(payload.email),
        payload.password.filter(|p| !p.is_empty()),
    ) else {
        return Err(missing_fields());
    };

    let email = normalize_email(&email);
    if !is_valid_email(&email) {
        warn!(%email, "invalid email");
        return Err(AppError::BadRequest("Invalid email".into()));
    }

    let keys = JwtKeys::from_ref(&state);
    let session = register_user(state.users.as_ref(), &keys, &name, &email, &password).await?;

    Ok((
        StatusCode::CREATED,
        Json(AuthResponse {
            success: true,
            message: "User registered successfully".into(),
            token: session.token,
            user: session.user,
        }),
    ))
}

#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> AppResult<Json<AuthResponse>> {
    let Json(payload) = payload.map_err(|_| missing_fields())?;
    let (Some(email), Some(password)) = (
        required(payload.email),
        payload.password.filter(|p| !p.is_empty()),
    ) else {
        return Err(missing_fields());
    };

    let keys = JwtKeys::from_ref(&state);
    let session = login_user(
        state.users.as_ref(),
        &keys,
        &normalize_email(&email),
        &password,
    )
    .await?;

    Ok(Json(AuthResponse {
        success: true,
        message: "Login successful".into(),
        token: session.token,
        user: session.user,
    }))
}

#[instrument(skip(state))]
pub async fn list_users(State(state): State<AppState>) -> AppResult<Json<UsersResponse>> {
    let users = state
        .users
        .list_all()
        .await
        .map_err(|e| AppError::Internal(e.into()))?;
    Ok(Json(UsersResponse {
        success: true,
        users,
    }))
}

#[instrument(skip(state))]
pub async fn search_users(
    State(state): State<AppState>,
    Query(q): Query<SearchQuery>,
) -> AppResult<Json<UsersResponse>> {
    let prefix = q.prefix.unwrap_or_default();
    let users = state
        .users
        .search_by_name_prefix(prefix.trim())
        .await
        .map_err(|e| AppError::Internal(e.into()))?;
    Ok(Json(UsersResponse {
        success: true,
        users: users.into_iter().map(PublicUser::from).collect(),
    }))
}
