use async_trait::async_trait;
use sqlx::PgPool;

use crate::auth::repo_types::{NewUser, PublicUser, User, UserRow};
use crate::db::{escape_like, RepoError};

pub const SEARCH_LIMIT: i64 = 5;

/// Persistence for user accounts.
#[async_trait]
pub trait UserRepo: Send + Sync {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, RepoError>;
    async fn find_by_name(&self, name: &str) -> Result<Option<User>, RepoError>;
    /// At most [`SEARCH_LIMIT`] users whose name starts with `prefix`, ordered by name.
    async fn search_by_name_prefix(&self, prefix: &str) -> Result<Vec<User>, RepoError>;
    async fn list_all(&self) -> Result<Vec<PublicUser>, RepoError>;
    /// Insert a new user. Unique conflicts come back as `NameTaken`/`EmailTaken`.
    async fn create(&self, new_user: NewUser) -> Result<User, RepoError>;
    /// Rewrite all mutable fields of an existing user and bump `updated_at`.
    async fn update(&self, user: &User) -> Result<User, RepoError>;
}

#[derive(Clone)]
pub struct PgUserRepo {
    db: PgPool,
}

impl PgUserRepo {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    async fn find_one(&self, sql: &str, arg: &str) -> Result<Option<User>, RepoError> {
        let row = sqlx::query_as::<_, UserRow>(sql)
            .bind(arg)
            .fetch_optional(&self.db)
            .await?;
        row.map(User::try_from).transpose()
    }
}

const USER_COLUMNS: &str =
    "id, name, email, password_hash, account_status, created_at, updated_at";

#[async_trait]
impl UserRepo for PgUserRepo {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, RepoError> {
        self.find_one(
            &format!("SELECT {USER_COLUMNS} FROM users WHERE email = $1"),
            email,
        )
        .await
    }

    async fn find_by_name(&self, name: &str) -> Result<Option<User>, RepoError> {
        self.find_one(
            &format!("SELECT {USER_COLUMNS} FROM users WHERE name = $1"),
            name,
        )
        .await
    }

    async fn search_by_name_prefix(&self, prefix: &str) -> Result<Vec<User>, RepoError> {
        if prefix.is_empty() {
            return Ok(Vec::new());
        }
        let rows = sqlx::query_as::<_, UserRow>(&format!(
            r#"
            SELECT {USER_COLUMNS}
            FROM users
            WHERE name LIKE $1 || '%'
            ORDER BY name ASC
            LIMIT $2
            "#
        ))
        .bind(escape_like(prefix))
        .bind(SEARCH_LIMIT)
        .fetch_all(&self.db)
        .await?;
        rows.into_iter().map(User::try_from).collect()
    }

    async fn list_all(&self) -> Result<Vec<PublicUser>, RepoError> {
        let rows = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM users ORDER BY name ASC"
        ))
        .fetch_all(&self.db)
        .await?;
        rows.into_iter()
            .map(|r| User::try_from(r).map(PublicUser::from))
            .collect()
    }

    async fn create(&self, new_user: NewUser) -> Result<User, RepoError> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            r#"
            INSERT INTO users (name, email, password_hash)
            VALUES ($1, $2, $3)
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(&new_user.name)
        .bind(&new_user.email)
        .bind(&new_user.password_hash)
        .fetch_one(&self.db)
        .await?;
        User::try_from(row)
    }

    async fn update(&self, user: &User) -> Result<User, RepoError> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            r#"
            UPDATE users
            SET name = $1, email = $2, password_hash = $3,
                account_status = $4, updated_at = now()
            WHERE id = $5
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(&user.name)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(user.status.as_str())
        .bind(user.id)
        .fetch_optional(&self.db)
        .await?
        .ok_or(RepoError::NotFound)?;
        User::try_from(row)
    }
}
