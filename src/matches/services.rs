use std::collections::HashSet;

use serde_json::Value;
use thiserror::Error;
use tracing::{info, warn};
use uuid::Uuid;

use crate::{
    auth::repo::UserRepo,
    db::RepoError,
    error::AppError,
    matches::{
        dto::RecordMatchRequest,
        repo::MatchRepo,
        repo_types::{Match, MatchType, NewMatch, BAGEL_GAMES},
    },
};

pub const DEFAULT_USER_LIMIT: i64 = 10;
pub const DEFAULT_ALL_LIMIT: i64 = 50;
pub const MAX_LIMIT: i64 = 200;

#[derive(Debug, Error)]
pub enum MatchError {
    #[error("User not found: {0}")]
    UserNotFound(String),
    #[error("{0} must be a valid user id")]
    InvalidPlayerId(&'static str),
    #[error("Missing required field: {0}")]
    MissingField(&'static str),
    #[error("Invalid match type. Must be 'singles' or 'doubles'")]
    InvalidMatchType,
    #[error("Doubles match requires four players")]
    DoublesNeedsFourPlayers,
    #[error("A player cannot be listed more than once in a match")]
    DuplicatePlayer,
    #[error("{0} must be an integer")]
    NotAnInteger(&'static str),
    #[error("Scores cannot be negative")]
    NegativeScore,
    #[error("At least one team should have a score of 6 or higher for a completed match")]
    Incomplete,
    #[error("One or more players do not exist in the system")]
    PlayerNotFound,
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl From<RepoError> for MatchError {
    fn from(e: RepoError) -> Self {
        match e {
            RepoError::PlayerNotFound => MatchError::PlayerNotFound,
            other => MatchError::Internal(other.into()),
        }
    }
}

impl From<MatchError> for AppError {
    fn from(e: MatchError) -> Self {
        match e {
            MatchError::Internal(inner) => AppError::Internal(inner),
            other => AppError::BadRequest(other.to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedMatch {
    pub match_id: Uuid,
    pub is_bagel: bool,
    pub winner_team: Option<i16>,
}

struct Slot {
    id: Option<String>,
    name: Option<String>,
}

fn non_blank(v: Option<String>) -> Option<String> {
    v.map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
}

/// A player slot after name lookup. Raw ids are parsed only once the slot is
/// known to take part in the match.
enum PlayerRef {
    Resolved(Uuid),
    Raw(String),
}

impl PlayerRef {
    fn into_id(self, field: &'static str) -> Result<Uuid, MatchError> {
        match self {
            PlayerRef::Resolved(id) => Ok(id),
            PlayerRef::Raw(raw) => {
                Uuid::parse_str(&raw).map_err(|_| MatchError::InvalidPlayerId(field))
            }
        }
    }
}

async fn resolve_slot(users: &dyn UserRepo, slot: Slot) -> Result<Option<PlayerRef>, MatchError> {
    if let Some(name) = non_blank(slot.name) {
        return match users.find_by_name(&name).await? {
            Some(user) => Ok(Some(PlayerRef::Resolved(user.id))),
            None => {
                warn!(%name, "player name did not resolve");
                Err(MatchError::UserNotFound(name))
            }
        };
    }
    Ok(non_blank(slot.id).map(PlayerRef::Raw))
}

fn parse_score(field: &'static str, value: &Value) -> Result<i32, MatchError> {
    let parsed = match value {
        Value::Number(n) => n.as_i64().or_else(|| {
            n.as_f64()
                .filter(|f| f.fract() == 0.0 && f.abs() <= i32::MAX as f64)
                .map(|f| f as i64)
        }),
        Value::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    };
    parsed
        .and_then(|v| i32::try_from(v).ok())
        .ok_or(MatchError::NotAnInteger(field))
}

/// Validates a submission and persists it. Checks run in a fixed order and the
/// first failure is returned without touching the store.
pub async fn record_match(
    users: &dyn UserRepo,
    matches: &dyn MatchRepo,
    reporter_user_id: Uuid,
    req: RecordMatchRequest,
) -> Result<RecordedMatch, MatchError> {
    let RecordMatchRequest {
        match_type,
        team1_player1_id,
        team1_player2_id,
        team2_player1_id,
        team2_player2_id,
        team1_player1_name,
        team1_player2_name,
        team2_player1_name,
        team2_player2_name,
        team1_score,
        team2_score,
    } = req;

    let t1p1 = resolve_slot(
        users,
        Slot { id: team1_player1_id, name: team1_player1_name },
    )
    .await?;
    let t1p2 = resolve_slot(
        users,
        Slot { id: team1_player2_id, name: team1_player2_name },
    )
    .await?;
    let t2p1 = resolve_slot(
        users,
        Slot { id: team2_player1_id, name: team2_player1_name },
    )
    .await?;
    let t2p2 = resolve_slot(
        users,
        Slot { id: team2_player2_id, name: team2_player2_name },
    )
    .await?;

    let match_type = non_blank(match_type).ok_or(MatchError::MissingField("match_type"))?;
    let t1p1 = t1p1.ok_or(MatchError::MissingField("team1_player1_id"))?;
    let t2p1 = t2p1.ok_or(MatchError::MissingField("team2_player1_id"))?;
    let team1_score = team1_score
        .filter(|v| !v.is_null())
        .ok_or(MatchError::MissingField("team1_score"))?;
    let team2_score = team2_score
        .filter(|v| !v.is_null())
        .ok_or(MatchError::MissingField("team2_score"))?;

    let match_type: MatchType = match_type
        .parse()
        .map_err(|_| MatchError::InvalidMatchType)?;

    let (t1p2, t2p2) = match match_type {
        MatchType::Singles => (None, None),
        MatchType::Doubles => match (t1p2, t2p2) {
            (Some(a), Some(b)) => (
                Some(a.into_id("team1_player2_id")?),
                Some(b.into_id("team2_player2_id")?),
            ),
            _ => return Err(MatchError::DoublesNeedsFourPlayers),
        },
    };
    let t1p1 = t1p1.into_id("team1_player1_id")?;
    let t2p1 = t2p1.into_id("team2_player1_id")?;

    let players: Vec<Uuid> = [Some(t1p1), t1p2, Some(t2p1), t2p2]
        .into_iter()
        .flatten()
        .collect();
    let distinct: HashSet<&Uuid> = players.iter().collect();
    if distinct.len() < players.len() {
        return Err(MatchError::DuplicatePlayer);
    }

    let team1_score = parse_score("team1_score", &team1_score)?;
    let team2_score = parse_score("team2_score", &team2_score)?;
    if team1_score < 0 || team2_score < 0 {
        return Err(MatchError::NegativeScore);
    }
    if team1_score.max(team2_score) < BAGEL_GAMES {
        return Err(MatchError::Incomplete);
    }

    let saved = matches
        .create(NewMatch {
            match_type,
            match_date: None,
            reporter_user_id,
            team1_player1_id: t1p1,
            team1_player2_id: t1p2,
            team2_player1_id: t2p1,
            team2_player2_id: t2p2,
            team1_score,
            team2_score,
        })
        .await?;

    info!(
        match_id = %saved.id,
        reporter = %reporter_user_id,
        %match_type,
        score = %format!("{}-{}", saved.team1_score, saved.team2_score),
        is_bagel = saved.is_bagel,
        "match recorded"
    );
    Ok(RecordedMatch {
        match_id: saved.id,
        is_bagel: saved.is_bagel,
        winner_team: saved.winner_team,
    })
}

fn clamp_limit(limit: Option<i64>, default: i64) -> i64 {
    limit.unwrap_or(default).clamp(1, MAX_LIMIT)
}

pub async fn get_user_matches(
    matches: &dyn MatchRepo,
    user_id: Uuid,
    limit: Option<i64>,
) -> Result<Vec<Match>, MatchError> {
    let limit = clamp_limit(limit, DEFAULT_USER_LIMIT);
    Ok(matches.get_matches_by_user(user_id, limit).await?)
}

pub async fn get_all_matches(
    matches: &dyn MatchRepo,
    limit: Option<i64>,
) -> Result<Vec<Match>, MatchError> {
    let limit = clamp_limit(limit, DEFAULT_ALL_LIMIT);
    Ok(matches.get_all_matches(limit).await?)
}

pub async fn get_match(
    matches: &dyn MatchRepo,
    match_id: Uuid,
) -> Result<Option<Match>, MatchError> {
    Ok(matches.find_by_id(match_id).await?)
}
