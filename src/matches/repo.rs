use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::db::RepoError;
use crate::matches::repo_types::{Match, MatchRow, NewMatch};

/// Persistence for recorded matches. Implementations derive winner and bagel
/// from the scores on every write.
#[async_trait]
pub trait MatchRepo: Send + Sync {
    async fn create(&self, new_match: NewMatch) -> Result<Match, RepoError>;
    async fn update(&self, m: &Match) -> Result<Match, RepoError>;
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Match>, RepoError>;
    /// Matches where `user_id` holds any of the four player slots, newest first.
    async fn get_matches_by_user(&self, user_id: Uuid, limit: i64)
        -> Result<Vec<Match>, RepoError>;
    async fn get_all_matches(&self, limit: i64) -> Result<Vec<Match>, RepoError>;
}

#[derive(Clone)]
pub struct PgMatchRepo {
    db: PgPool,
}

impl PgMatchRepo {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

const MATCH_COLUMNS: &str = "id, match_type, match_date, reporter_user_id, \
     team1_player1_id, team1_player2_id, team2_player1_id, team2_player2_id, \
     team1_score, team2_score, winner_team, is_bagel, created_at, updated_at";

#[async_trait]
impl MatchRepo for PgMatchRepo {
    async fn create(&self, new_match: NewMatch) -> Result<Match, RepoError> {
        let outcome = new_match.outcome();
        let row = sqlx::query_as::<_, MatchRow>(&format!(
            r#"
            INSERT INTO matches (
                match_type, match_date, reporter_user_id,
                team1_player1_id, team1_player2_id,
                team2_player1_id, team2_player2_id,
                team1_score, team2_score, winner_team, is_bagel
            )
            VALUES ($1, COALESCE($2, now()), $3, $4, $5, $6, $7, $8, $9, $10, $11)
            RETURNING {MATCH_COLUMNS}
            "#
        ))
        .bind(new_match.match_type.as_str())
        .bind(new_match.match_date)
        .bind(new_match.reporter_user_id)
        .bind(new_match.team1_player1_id)
        .bind(new_match.team1_player2_id)
        .bind(new_match.team2_player1_id)
        .bind(new_match.team2_player2_id)
        .bind(new_match.team1_score)
        .bind(new_match.team2_score)
        .bind(outcome.winner_team)
        .bind(outcome.is_bagel)
        .fetch_one(&self.db)
        .await?;
        Match::try_from(row)
    }

    async fn update(&self, m: &Match) -> Result<Match, RepoError> {
        let outcome = m.outcome();
        let row = sqlx::query_as::<_, MatchRow>(&format!(
            r#"
            UPDATE matches
            SET match_type = $1, match_date = $2, reporter_user_id = $3,
                team1_player1_id = $4, team1_player2_id = $5,
                team2_player1_id = $6, team2_player2_id = $7,
                team1_score = $8, team2_score = $9,
                winner_team = $10, is_bagel = $11, updated_at = now()
            WHERE id = $12
            RETURNING {MATCH_COLUMNS}
            "#
        ))
        .bind(m.match_type.as_str())
        .bind(m.match_date)
        .bind(m.reporter_user_id)
        .bind(m.team1_player1_id)
        .bind(m.team1_player2_id)
        .bind(m.team2_player1_id)
        .bind(m.team2_player2_id)
        .bind(m.team1_score)
        .bind(m.team2_score)
        .bind(outcome.winner_team)
        .bind(outcome.is_bagel)
        .bind(m.id)
        .fetch_optional(&self.db)
        .await?
        .ok_or(RepoError::NotFound)?;
        Match::try_from(row)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Match>, RepoError> {
        let row = sqlx::query_as::<_, MatchRow>(&format!(
            "SELECT {MATCH_COLUMNS} FROM matches WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.db)
        .await?;
        row.map(Match::try_from).transpose()
    }

    async fn get_matches_by_user(
        &self,
        user_id: Uuid,
        limit: i64,
    ) -> Result<Vec<Match>, RepoError> {
        let rows = sqlx::query_as::<_, MatchRow>(&format!(
            r#"
            SELECT {MATCH_COLUMNS}
            FROM matches
            WHERE team1_player1_id = $1
               OR team1_player2_id = $1
               OR team2_player1_id = $1
               OR team2_player2_id = $1
            ORDER BY match_date DESC, created_at DESC
            LIMIT $2
            "#
        ))
        .bind(user_id)
        .bind(limit)
        .fetch_all(&self.db)
        .await?;
        rows.into_iter().map(Match::try_from).collect()
    }

    async fn get_all_matches(&self, limit: i64) -> Result<Vec<Match>, RepoError> {
        let rows = sqlx::query_as::<_, MatchRow>(&format!(
            r#"
            SELECT {MATCH_COLUMNS}
            FROM matches
            ORDER BY match_date DESC, created_at DESC
            LIMIT $1
            "#
        ))
        .bind(limit)
        .fetch_all(&self.db)
        .await?;
        rows.into_iter().map(Match::try_from).collect()
    }
}
