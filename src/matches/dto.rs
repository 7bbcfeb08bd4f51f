use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::matches::repo_types::Match;

/// Body of `POST /matches`. Each player slot accepts an id or a user name; a
/// name wins when both are given. Scores accept JSON integers or integer strings.
#[derive(Debug, Default, Deserialize)]
pub struct RecordMatchRequest {
    pub match_type: Option<String>,
    pub team1_player1_id: Option<String>,
    pub team1_player2_id: Option<String>,
    pub team2_player1_id: Option<String>,
    pub team2_player2_id: Option<String>,
    pub team1_player1_name: Option<String>,
    pub team1_player2_name: Option<String>,
    pub team2_player1_name: Option<String>,
    pub team2_player2_name: Option<String>,
    pub team1_score: Option<serde_json::Value>,
    pub team2_score: Option<serde_json::Value>,
}

/// `?limit=` kept as text so a malformed value falls back to the default.
#[derive(Debug, Deserialize)]
pub struct LimitQuery {
    pub limit: Option<String>,
}

impl LimitQuery {
    pub fn parsed(&self) -> Option<i64> {
        self.limit.as_deref().and_then(|v| v.trim().parse().ok())
    }
}

#[derive(Debug, Serialize)]
pub struct RecordMatchResponse {
    pub success: bool,
    pub message: String,
    pub match_id: Uuid,
    pub is_bagel: bool,
    pub winner_team: Option<i16>,
}

#[derive(Debug, Serialize)]
pub struct MatchListResponse {
    pub success: bool,
    pub message: String,
    pub matches: Vec<Match>,
}

#[derive(Debug, Serialize)]
pub struct MatchResponse {
    pub success: bool,
    #[serde(rename = "match")]
    pub match_: Match,
}
