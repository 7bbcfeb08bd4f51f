use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use thiserror::Error;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::db::RepoError;

/// Game count a shutout must reach to count as a bagel.
pub const BAGEL_GAMES: i32 = 6;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum MatchType {
    Singles,
    Doubles,
}

impl MatchType {
    pub fn as_str(self) -> &'static str {
        match self {
            MatchType::Singles => "singles",
            MatchType::Doubles => "doubles",
        }
    }
}

impl fmt::Display for MatchType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error)]
#[error("unknown match type: {0}")]
pub struct UnknownMatchType(pub String);

impl FromStr for MatchType {
    type Err = UnknownMatchType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "singles" => Ok(MatchType::Singles),
            "doubles" => Ok(MatchType::Doubles),
            other => Err(UnknownMatchType(other.to_string())),
        }
    }
}

/// Fields derived from the score line. Never taken from the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Outcome {
    pub winner_team: Option<i16>, // 1, 2, or None on a tie
    pub is_bagel: bool,
}

impl Outcome {
    /// A bagel is exactly 6-0 or 0-6; 7-0 and 6-1 are not.
    pub fn from_scores(team1: i32, team2: i32) -> Self {
        let winner_team = match team1.cmp(&team2) {
            std::cmp::Ordering::Greater => Some(1),
            std::cmp::Ordering::Less => Some(2),
            std::cmp::Ordering::Equal => None,
        };
        let is_bagel = (team1 == BAGEL_GAMES && team2 == 0) || (team1 == 0 && team2 == BAGEL_GAMES);
        Self {
            winner_team,
            is_bagel,
        }
    }
}

/// Raw `matches` row.
#[derive(Debug, FromRow)]
pub struct MatchRow {
    pub id: Uuid,
    pub match_type: String,
    pub match_date: OffsetDateTime,
    pub reporter_user_id: Uuid,
    pub team1_player1_id: Uuid,
    pub team1_player2_id: Option<Uuid>,
    pub team2_player1_id: Uuid,
    pub team2_player2_id: Option<Uuid>,
    pub team1_score: i32,
    pub team2_score: i32,
    pub winner_team: Option<i16>,
    pub is_bagel: bool,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct Match {
    #[serde(rename = "match_id")]
    pub id: Uuid,
    pub match_type: MatchType,
    #[serde(with = "time::serde::rfc3339")]
    pub match_date: OffsetDateTime,
    pub reporter_user_id: Uuid,
    pub team1_player1_id: Uuid,
    pub team1_player2_id: Option<Uuid>,
    pub team2_player1_id: Uuid,
    pub team2_player2_id: Option<Uuid>,
    pub team1_score: i32,
    pub team2_score: i32,
    pub winner_team: Option<i16>,
    pub is_bagel: bool,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

impl Match {
    pub fn outcome(&self) -> Outcome {
        Outcome::from_scores(self.team1_score, self.team2_score)
    }

    /// Overwrites the derived fields from the current scores.
    pub fn recompute_outcome(&mut self) {
        let o = self.outcome();
        self.winner_team = o.winner_team;
        self.is_bagel = o.is_bagel;
    }

    pub fn involves(&self, user_id: Uuid) -> bool {
        self.team1_player1_id == user_id
            || self.team2_player1_id == user_id
            || self.team1_player2_id == Some(user_id)
            || self.team2_player2_id == Some(user_id)
    }
}

impl TryFrom<MatchRow> for Match {
    type Error = RepoError;

    fn try_from(r: MatchRow) -> Result<Self, Self::Error> {
        let match_type = r
            .match_type
            .parse()
            .map_err(|e: UnknownMatchType| RepoError::Database(sqlx::Error::Decode(Box::new(e))))?;
        Ok(Self {
            id: r.id,
            match_type,
            match_date: r.match_date,
            reporter_user_id: r.reporter_user_id,
            team1_player1_id: r.team1_player1_id,
            team1_player2_id: r.team1_player2_id,
            team2_player1_id: r.team2_player1_id,
            team2_player2_id: r.team2_player2_id,
            team1_score: r.team1_score,
            team2_score: r.team2_score,
            winner_team: r.winner_team,
            is_bagel: r.is_bagel,
            created_at: r.created_at,
            updated_at: r.updated_at,
        })
    }
}

/// A validated match ready to insert. Carries no derived fields.
#[derive(Debug, Clone)]
pub struct NewMatch {
    pub match_type: MatchType,
    pub match_date: Option<OffsetDateTime>, // None = record time
    pub reporter_user_id: Uuid,
    pub team1_player1_id: Uuid,
    pub team1_player2_id: Option<Uuid>,
    pub team2_player1_id: Uuid,
    pub team2_player2_id: Option<Uuid>,
    pub team1_score: i32,
    pub team2_score: i32,
}

impl NewMatch {
    pub fn outcome(&self) -> Outcome {
        Outcome::from_scores(self.team1_score, self.team2_score)
    }
}
