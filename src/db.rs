use std::time::Duration;

use anyhow::Context;
use sqlx::{error::ErrorKind, postgres::PgPoolOptions, PgPool};
use thiserror::Error;
use tracing::{info, warn};

use crate::config::AppConfig;

pub const USERS_NAME_KEY: &str = "users_name_key";
pub const USERS_EMAIL_KEY: &str = "users_email_key";

/// Errors surfaced by the repositories, with constraint violations already classified.
#[derive(Debug, Error)]
pub enum RepoError {
    #[error("Name already taken")]
    NameTaken,
    #[error("Email already registered")]
    EmailTaken,
    #[error("Record conflicts with an existing one")]
    Conflict,
    #[error("One or more players do not exist in the system")]
    PlayerNotFound,
    #[error("Record not found")]
    NotFound,
    #[error("database error: {0}")]
    Database(#[source] sqlx::Error),
}

impl From<sqlx::Error> for RepoError {
    fn from(err: sqlx::Error) -> Self {
        classify(err)
    }
}

/// Maps a store error onto the domain taxonomy by inspecting its kind and constraint name.
pub fn classify(err: sqlx::Error) -> RepoError {
    let sqlx::Error::Database(db_err) = &err else {
        return RepoError::Database(err);
    };
    match db_err.kind() {
        ErrorKind::UniqueViolation => match db_err.constraint() {
            Some(USERS_NAME_KEY) => RepoError::NameTaken,
            Some(USERS_EMAIL_KEY) => RepoError::EmailTaken,
            other => {
                warn!(constraint = ?other, "unclassified unique violation");
                RepoError::Conflict
            }
        },
        ErrorKind::ForeignKeyViolation => RepoError::PlayerNotFound,
        _ => RepoError::Database(err),
    }
}

/// Escapes LIKE metacharacters so the input matches literally (default `\` escape).
pub fn escape_like(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        if matches!(c, '%' | '_' | '\\') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

pub async fn connect(config: &AppConfig) -> anyhow::Result<PgPool> {
    let pool = PgPoolOptions::new()
        .max_connections(config.db.max_connections)
        .acquire_timeout(Duration::from_secs(config.db.connect_timeout_secs))
        .connect(&config.database_url)
        .await
        .context("connect to database")?;
    info!(
        max_connections = config.db.max_connections,
        "database pool ready"
    );
    Ok(pool)
}
