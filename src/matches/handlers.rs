use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection},
        Path, Query, State,
    },
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use tracing::{error, instrument, warn};
use uuid::Uuid;

use crate::{
    auth::jwt::AuthUser,
    error::{AppError, AppResult},
    state::AppState,
};

use super::dto::{
    LimitQuery, MatchListResponse, MatchResponse, RecordMatchRequest, RecordMatchResponse,
};
use super::services::{get_all_matches, get_match, get_user_matches, record_match};

pub fn match_routes() -> Router<AppState> {
    Router::new()
        .route("/matches", post(create_match))
        .route("/matches/all", get(list_all_matches))
        .route("/matches/user/:user_id", get(list_user_matches))
        .route("/matches/:match_id", get(match_by_id))
}

fn parse_id(id: Result<Path<Uuid>, PathRejection>, what: &str) -> AppResult<Uuid> {
    id.map(|Path(id)| id)
        .map_err(|_| AppError::BadRequest(format!("Invalid {what} id")))
}

/// POST /matches
#[instrument(skip_all, fields(reporter = %identity.user_id))]
pub async fn create_match(
    State(state): State<AppState>,
    AuthUser(identity): AuthUser,
    body: Result<Json<RecordMatchRequest>, JsonRejection>,
) -> AppResult<(StatusCode, Json<RecordMatchResponse>)> {
    let Json(req) = body.map_err(|e| {
        warn!(error = %e, "match body rejected");
        AppError::BadRequest("No valid match data provided".into())
    })?;

    let recorded = record_match(
        state.users.as_ref(),
        state.matches.as_ref(),
        identity.user_id,
        req,
    )
    .await
    .map_err(|e| {
        warn!(reason = %e, "match not recorded");
        AppError::from(e)
    })?;

    Ok((
        StatusCode::CREATED,
        Json(RecordMatchResponse {
            success: true,
            message: "Match recorded successfully".into(),
            match_id: recorded.match_id,
            is_bagel: recorded.is_bagel,
            winner_team: recorded.winner_team,
        }),
    ))
}

/// GET /matches/user/:user_id?limit=
#[instrument(skip_all)]
pub async fn list_user_matches(
    State(state): State<AppState>,
    _auth: AuthUser,
    user_id: Result<Path<Uuid>, PathRejection>,
    Query(q): Query<LimitQuery>,
) -> AppResult<Json<MatchListResponse>> {
    let user_id = parse_id(user_id, "user")?;
    let matches = get_user_matches(state.matches.as_ref(), user_id, q.parsed())
        .await
        .map_err(|e| {
            error!(error = %e, %user_id, "get_user_matches failed");
            AppError::Internal(e.into())
        })?;
    Ok(Json(MatchListResponse {
        success: true,
        message: "Matches retrieved successfully".into(),
        matches,
    }))
}

/// GET /matches/:match_id
#[instrument(skip_all)]
pub async fn match_by_id(
    State(state): State<AppState>,
    _auth: AuthUser,
    match_id: Result<Path<Uuid>, PathRejection>,
) -> AppResult<Json<MatchResponse>> {
    let match_id = parse_id(match_id, "match")?;
    match get_match(state.matches.as_ref(), match_id).await {
        Ok(Some(m)) => Ok(Json(MatchResponse {
            success: true,
            match_: m,
        })),
        Ok(None) => Err(AppError::NotFound("Match not found".into())),
        Err(e) => {
            error!(error = %e, %match_id, "get_match failed");
            Err(AppError::Internal(e.into()))
        }
    }
}

/// GET /matches/all?limit=
#[instrument(skip_all)]
pub async fn list_all_matches(
    State(state): State<AppState>,
    _auth: AuthUser,
    Query(q): Query<LimitQuery>,
) -> AppResult<Json<MatchListResponse>> {
    let matches = get_all_matches(state.matches.as_ref(), q.parsed())
        .await
        .map_err(|e| {
            error!(error = %e, "get_all_matches failed");
            AppError::Internal(e.into())
        })?;
    Ok(Json(MatchListResponse {
        success: true,
        message: "Matches retrieved successfully".into(),
        matches,
    }))
}
