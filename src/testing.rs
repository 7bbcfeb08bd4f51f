//! In-memory stand-ins for the Postgres repositories. They enforce the same
//! unique and foreign-key constraints and report them with the same errors.

use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::{
    auth::{
        jwt::JwtKeys,
        repo::{UserRepo, SEARCH_LIMIT},
        repo_types::{AccountStatus, NewUser, PublicUser, User},
    },
    config::JwtConfig,
    db::RepoError,
    matches::{
        repo::MatchRepo,
        repo_types::{Match, NewMatch},
    },
};

pub fn test_jwt_config() -> JwtConfig {
    JwtConfig {
        secret: "test-secret".into(),
        issuer: "test-issuer".into(),
        audience: "test-aud".into(),
    }
}

pub fn test_keys() -> JwtKeys {
    JwtKeys::new(&test_jwt_config())
}

#[derive(Default)]
struct Tables {
    users: Vec<User>,
    matches: Vec<Match>,
}

#[derive(Clone, Default)]
pub struct MemoryStore {
    inner: Arc<Mutex<Tables>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn tables(&self) -> MutexGuard<'_, Tables> {
        self.inner.lock().unwrap()
    }

    /// Inserts a user directly, with a placeholder hash.
    pub fn seed_user(&self, name: &str, email: &str) -> User {
        let now = OffsetDateTime::now_utc();
        let user = User {
            id: Uuid::new_v4(),
            name: name.to_string(),
            email: email.to_string(),
            password_hash: "$argon2id$seeded".to_string(),
            status: AccountStatus::Active,
            created_at: now,
            updated_at: now,
        };
        self.tables().users.push(user.clone());
        user
    }

    pub fn match_count(&self) -> usize {
        self.tables().matches.len()
    }
}

fn check_unique(
    users: &[User],
    id: Option<Uuid>,
    name: &str,
    email: &str,
) -> Result<(), RepoError> {
    let others = || users.iter().filter(|u| Some(u.id) != id);
    if others().any(|u| u.name == name) {
        return Err(RepoError::NameTaken);
    }
    if others().any(|u| u.email == email) {
        return Err(RepoError::EmailTaken);
    }
    Ok(())
}

fn check_players(users: &[User], ids: &[Option<Uuid>]) -> Result<(), RepoError> {
    let exists = |id: &Uuid| users.iter().any(|u| u.id == *id);
    if ids.iter().flatten().all(exists) {
        Ok(())
    } else {
        Err(RepoError::PlayerNotFound)
    }
}

fn newest_first(matches: &mut [Match]) {
    matches.sort_by(|a, b| {
        b.match_date
            .cmp(&a.match_date)
            .then(b.created_at.cmp(&a.created_at))
    });
}

#[async_trait]
impl UserRepo for MemoryStore {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, RepoError> {
        Ok(self.tables().users.iter().find(|u| u.email == email).cloned())
    }

    async fn find_by_name(&self, name: &str) -> Result<Option<User>, RepoError> {
        Ok(self.tables().users.iter().find(|u| u.name == name).cloned())
    }

    async fn search_by_name_prefix(&self, prefix: &str) -> Result<Vec<User>, RepoError> {
        if prefix.is_empty() {
            return Ok(Vec::new());
        }
        let mut found: Vec<User> = self
            .tables()
            .users
            .iter()
            .filter(|u| u.name.starts_with(prefix))
            .cloned()
            .collect();
        found.sort_by(|a, b| a.name.cmp(&b.name));
        found.truncate(SEARCH_LIMIT as usize);
        Ok(found)
    }

    async fn list_all(&self) -> Result<Vec<PublicUser>, RepoError> {
        let mut users = self.tables().users.clone();
        users.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(users.into_iter().map(PublicUser::from).collect())
    }

    async fn create(&self, new_user: NewUser) -> Result<User, RepoError> {
        let mut t = self.tables();
        check_unique(&t.users, None, &new_user.name, &new_user.email)?;
        let now = OffsetDateTime::now_utc();
        let user = User {
            id: Uuid::new_v4(),
            name: new_user.name,
            email: new_user.email,
            password_hash: new_user.password_hash,
            status: AccountStatus::Active,
            created_at: now,
            updated_at: now,
        };
        t.users.push(user.clone());
        Ok(user)
    }

    async fn update(&self, user: &User) -> Result<User, RepoError> {
        let mut t = self.tables();
        check_unique(&t.users, Some(user.id), &user.name, &user.email)?;
        let slot = t
            .users
            .iter_mut()
            .find(|u| u.id == user.id)
            .ok_or(RepoError::NotFound)?;
        *slot = User {
            created_at: slot.created_at,
            updated_at: OffsetDateTime::now_utc(),
            ..user.clone()
        };
        Ok(slot.clone())
    }
}

#[async_trait]
impl MatchRepo for MemoryStore {
    async fn create(&self, new_match: NewMatch) -> Result<Match, RepoError> {
        let mut t = self.tables();
        check_players(
            &t.users,
            &[
                Some(new_match.reporter_user_id),
                Some(new_match.team1_player1_id),
                new_match.team1_player2_id,
                Some(new_match.team2_player1_id),
                new_match.team2_player2_id,
            ],
        )?;
        let outcome = new_match.outcome();
        let now = OffsetDateTime::now_utc();
        let m = Match {
            id: Uuid::new_v4(),
            match_type: new_match.match_type,
            match_date: new_match.match_date.unwrap_or(now),
            reporter_user_id: new_match.reporter_user_id,
            team1_player1_id: new_match.team1_player1_id,
            team1_player2_id: new_match.team1_player2_id,
            team2_player1_id: new_match.team2_player1_id,
            team2_player2_id: new_match.team2_player2_id,
            team1_score: new_match.team1_score,
            team2_score: new_match.team2_score,
            winner_team: outcome.winner_team,
            is_bagel: outcome.is_bagel,
            created_at: now,
            updated_at: now,
        };
        t.matches.push(m.clone());
        Ok(m)
    }

    async fn update(&self, m: &Match) -> Result<Match, RepoError> {
        let mut t = self.tables();
        check_players(
            &t.users,
            &[
                Some(m.reporter_user_id),
                Some(m.team1_player1_id),
                m.team1_player2_id,
                Some(m.team2_player1_id),
                m.team2_player2_id,
            ],
        )?;
        let slot = t
            .matches
            .iter_mut()
            .find(|x| x.id == m.id)
            .ok_or(RepoError::NotFound)?;
        let mut next = m.clone();
        next.recompute_outcome();
        next.created_at = slot.created_at;
        next.updated_at = OffsetDateTime::now_utc();
        *slot = next;
        Ok(slot.clone())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Match>, RepoError> {
        Ok(self.tables().matches.iter().find(|m| m.id == id).cloned())
    }

    async fn get_matches_by_user(
        &self,
        user_id: Uuid,
        limit: i64,
    ) -> Result<Vec<Match>, RepoError> {
        let mut found: Vec<Match> = self
            .tables()
            .matches
            .iter()
            .filter(|m| m.involves(user_id))
            .cloned()
            .collect();
        newest_first(&mut found);
        found.truncate(limit.max(0) as usize);
        Ok(found)
    }

    async fn get_all_matches(&self, limit: i64) -> Result<Vec<Match>, RepoError> {
        let mut all = self.tables().matches.clone();
        newest_first(&mut all);
        all.truncate(limit.max(0) as usize);
        Ok(all)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn update_on_unknown_user_is_not_found() {
        let store = MemoryStore::new();
        let ghost = store.seed_user("ghost", "ghost@example.com");
        let fresh = MemoryStore::new();
        let err = UserRepo::update(&fresh, &ghost).await.unwrap_err();
        assert!(matches!(err, RepoError::NotFound));
    }

    #[tokio::test]
    async fn update_rejects_taking_another_users_name() {
        let store = MemoryStore::new();
        store.seed_user("rafa", "rafa@example.com");
        let mut roger = store.seed_user("roger", "roger@example.com");
        roger.name = "rafa".into();
        let err = UserRepo::update(&store, &roger).await.unwrap_err();
        assert!(matches!(err, RepoError::NameTaken));
    }

    #[tokio::test]
    async fn prefix_search_caps_and_orders() {
        let store = MemoryStore::new();
        for n in ["ana", "andy", "anders", "anita", "annie", "anya", "bob"] {
            store.seed_user(n, &format!("{n}@example.com"));
        }
        let found = store.search_by_name_prefix("an").await.unwrap();
        let names: Vec<&str> = found.iter().map(|u| u.name.as_str()).collect();
        assert_eq!(names, vec!["ana", "anders", "andy", "anita", "annie"]);
        assert!(store.search_by_name_prefix("").await.unwrap().is_empty());
    }
}
