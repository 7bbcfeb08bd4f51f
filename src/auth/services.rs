use lazy_static::lazy_static;
use regex::Regex;
use thiserror::Error;
use tracing::{info, warn};

use crate::{
    auth::{
        dto::SessionUser,
        jwt::JwtKeys,
        password::{hash_password, verify_password, ABSENT_USER_HASH},
        repo::UserRepo,
        repo_types::NewUser,
    },
    db::RepoError,
    error::AppError,
};

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Email already registered")]
    EmailRegistered,
    #[error("Name already taken")]
    NameTaken,
    #[error("Account already exists")]
    AccountExists,
    /// Same reason for unknown email, wrong password and inactive account.
    #[error("Invalid email or password")]
    InvalidCredentials,
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl From<RepoError> for AuthError {
    fn from(e: RepoError) -> Self {
        match e {
            RepoError::EmailTaken => AuthError::EmailRegistered,
            RepoError::NameTaken => AuthError::NameTaken,
            RepoError::Conflict => AuthError::AccountExists,
            other => AuthError::Internal(other.into()),
        }
    }
}

impl From<AuthError> for AppError {
    fn from(e: AuthError) -> Self {
        match e {
            AuthError::EmailRegistered | AuthError::NameTaken | AuthError::AccountExists => {
                AppError::BadRequest(e.to_string())
            }
            AuthError::InvalidCredentials => AppError::Unauthorized(e.to_string()),
            AuthError::Internal(inner) => AppError::Internal(inner),
        }
    }
}

/// A freshly issued session.
#[derive(Debug)]
pub struct AuthSession {
    pub token: String,
    pub user: SessionUser,
}

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex =
            Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("email regex is valid");
    }
    EMAIL_RE.is_match(email)
}

pub(crate) fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

pub async fn register_user(
    users: &dyn UserRepo,
    keys: &JwtKeys,
    name: &str,
    email: &str,
    password: &str,
) -> Result<AuthSession, AuthError> {
    if users.find_by_email(email).await?.is_some() {
        warn!(%email, "email already registered");
        return Err(AuthError::EmailRegistered);
    }
    if users.find_by_name(name).await?.is_some() {
        warn!(%name, "name already taken");
        return Err(AuthError::NameTaken);
    }

    let password_hash = hash_password(password)?;
    let user = users
        .create(NewUser {
            name: name.to_string(),
            email: email.to_string(),
            password_hash,
        })
        .await?;

    let token = keys.sign(user.id, &user.email)?;
    info!(user_id = %user.id, name = %user.name, "user registered");
    Ok(AuthSession {
        token,
        user: SessionUser::from(&user),
    })
}

pub async fn login_user(
    users: &dyn UserRepo,
    keys: &JwtKeys,
    email: &str,
    password: &str,
) -> Result<AuthSession, AuthError> {
    let Some(user) = users.find_by_email(email).await? else {
        verify_password(password, ABSENT_USER_HASH)?;
        warn!(%email, "login unknown email");
        return Err(AuthError::InvalidCredentials);
    };

    if !verify_password(password, &user.password_hash)? {
        warn!(user_id = %user.id, "login invalid password");
        return Err(AuthError::InvalidCredentials);
    }

    if !user.status.is_active() {
        warn!(user_id = %user.id, status = %user.status, "login on inactive account");
        return Err(AuthError::InvalidCredentials);
    }

    let token = keys.sign(user.id, &user.email)?;
    info!(user_id = %user.id, "user logged in");
    Ok(AuthSession {
        token,
        user: SessionUser::from(&user),
    })
}
