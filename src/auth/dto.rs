use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::auth::repo_types::{PublicUser, User};

/// Request body for user registration. Fields are optional so that a missing
/// one yields the envelope error instead of a framework rejection.
#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
}

/// Request body for login.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    pub prefix: Option<String>,
}

/// Response returned after register or login.
#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub success: bool,
    pub message: String,
    pub token: String,
    pub user: SessionUser,
}

/// User fields echoed back with a fresh session.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct SessionUser {
    pub user_id: Uuid,
    pub name: String,
    pub email: String,
}

impl From<&User> for SessionUser {
    fn from(u: &User) -> Self {
        Self {
            user_id: u.id,
            name: u.name.clone(),
            email: u.email.clone(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct UsersResponse {
    pub success: bool,
    pub users: Vec<PublicUser>,
}
