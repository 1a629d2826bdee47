use async_trait::async_trait;

use crate::models::*;

#[derive(thiserror::Error, Debug)]
pub enum RepoError {
    #[error("not found")] NotFound,
    #[error("conflict")] Conflict,
    #[error("invalid: {0}")] Invalid(#[from] InvalidItem),
    #[error("internal: {0}")] Internal(String),
}

pub type RepoResult<T> = Result<T, RepoError>;

/// Emails are compared trimmed and lowercased everywhere.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

#[async_trait]
pub trait UserRepo: Send + Sync {
    /// Fails with `Conflict` when the normalized email is already registered.
    async fn create_user(&self, email: &str, name: &str, password_hash: &str) -> RepoResult<UserRow>;
    async fn find_user_by_email(&self, email: &str) -> RepoResult<UserRow>;
    async fn find_user_by_id(&self, id: &str) -> RepoResult<UserRow>;
}

#[async_trait]
pub trait TrackedRepo: Send + Sync {
    /// Absent collections read as empty.
    async fn get_tracked(&self, user_id: &str, mode: Mode) -> RepoResult<Vec<TrackedItem>>;
    /// Atomically insert or wholly replace the collection for `(user_id, mode)`, echoing `items`.
    async fn put_tracked(&self, user_id: &str, mode: Mode, items: Vec<TrackedItem>) -> RepoResult<Vec<TrackedItem>>;
}

pub trait Repo: UserRepo + TrackedRepo {}

impl<T> Repo for T where T: UserRepo + TrackedRepo {}

pub mod inmem {
    use super::*;
    use chrono::{DateTime, Utc};
    use std::collections::HashMap;
    use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

    struct TrackedRow {
        items: Vec<TrackedItem>,
        updated_at: DateTime<Utc>,
    }

    #[derive(Default)]
    struct State {
        users: HashMap<String, UserRow>,
        ids_by_email: HashMap<String, String>,
        tracked: HashMap<(String, Mode), TrackedRow>,
    }

    /// Process-local store. Every check-and-write happens under a single write lock.
    #[derive(Clone, Default)]
    pub struct InMemRepo {
        state: Arc<RwLock<State>>,
    }

    impl InMemRepo {
        pub fn new() -> Self {
            Self::default()
        }

        fn read(&self) -> RepoResult<RwLockReadGuard<'_, State>> {
            self.state.read().map_err(|_| RepoError::Internal("state lock poisoned".into()))
        }

        fn write(&self) -> RepoResult<RwLockWriteGuard<'_, State>> {
            self.state.write().map_err(|_| RepoError::Internal("state lock poisoned".into()))
        }

        /// When the collection for `(user_id, mode)` was last written.
        pub fn last_modified(&self, user_id: &str, mode: Mode) -> Option<DateTime<Utc>> {
            let s = self.read().ok()?;
            s.tracked.get(&(user_id.to_string(), mode)).map(|row| row.updated_at)
        }
    }

    #[async_trait]
    impl UserRepo for InMemRepo {
        async fn create_user(&self, email: &str, name: &str, password_hash: &str) -> RepoResult<UserRow> {
            let email = normalize_email(email);
            let mut s = self.write()?;
            if s.ids_by_email.contains_key(&email) {
                return Err(RepoError::Conflict);
            }
            let user = UserRow {
                id: uuid::Uuid::new_v4().to_string(),
                email: email.clone(),
                name: name.to_string(),
                avatar_url: None,
                password_hash: password_hash.to_string(),
            };
            s.ids_by_email.insert(email, user.id.clone());
            s.users.insert(user.id.clone(), user.clone());
            Ok(user)
        }

        async fn find_user_by_email(&self, email: &str) -> RepoResult<UserRow> {
            let s = self.read()?;
            s.ids_by_email
                .get(&normalize_email(email))
                .and_then(|id| s.users.get(id))
                .cloned()
                .ok_or(RepoError::NotFound)
        }

        async fn find_user_by_id(&self, id: &str) -> RepoResult<UserRow> {
            let s = self.read()?;
            s.users.get(id).cloned().ok_or(RepoError::NotFound)
        }
    }

    #[async_trait]
    impl TrackedRepo for InMemRepo {
        async fn get_tracked(&self, user_id: &str, mode: Mode) -> RepoResult<Vec<TrackedItem>> {
            let s = self.read()?;
            Ok(s.tracked
                .get(&(user_id.to_string(), mode))
                .map(|row| row.items.clone())
                .unwrap_or_default())
        }

        async fn put_tracked(&self, user_id: &str, mode: Mode, items: Vec<TrackedItem>) -> RepoResult<Vec<TrackedItem>> {
            validate_items(&items)?;
            let mut s = self.write()?;
            // mirrors the foreign key on the relational backend
            if !s.users.contains_key(user_id) {
                return Err(RepoError::NotFound);
            }
            s.tracked.insert(
                (user_id.to_string(), mode),
                TrackedRow { items: items.clone(), updated_at: Utc::now() },
            );
            Ok(items)
        }
    }
}

pub mod pg {
    use super::*;
    use chrono::Utc;
    use sqlx::types::Json;
    use sqlx::{Pool, Postgres};
    use uuid::Uuid;

    impl From<sqlx::Error> for RepoError {
        fn from(e: sqlx::Error) -> Self {
            match e {
                sqlx::Error::RowNotFound => RepoError::NotFound,
                sqlx::Error::Database(db) if db.is_unique_violation() => RepoError::Conflict,
                sqlx::Error::Database(db) if db.is_foreign_key_violation() => RepoError::NotFound,
                other => RepoError::Internal(other.to_string()),
            }
        }
    }

    const USER_COLUMNS: &str = "id::text AS id, email, name, avatar_url, password_hash";

    #[derive(Clone)]
    pub struct PgRepo { pool: Pool<Postgres> }

    impl PgRepo {
        pub fn new(pool: Pool<Postgres>) -> Self { Self { pool } }

        pub fn pool(&self) -> &Pool<Postgres> { &self.pool }
    }

    // Subjects come from tokens; anything that is not a uuid cannot name a row.
    fn parse_id(id: &str) -> RepoResult<Uuid> {
        Uuid::parse_str(id).map_err(|_| RepoError::NotFound)
    }

    #[async_trait]
    impl UserRepo for PgRepo {
        async fn create_user(&self, email: &str, name: &str, password_hash: &str) -> RepoResult<UserRow> {
            // uniqueness is the table's constraint, not a prior lookup
            let rec = sqlx::query_as::<_, UserRow>(&format!(
                "INSERT INTO users (email, name, password_hash) VALUES ($1, $2, $3) RETURNING {USER_COLUMNS}"
            ))
            .bind(normalize_email(email))
            .bind(name)
            .bind(password_hash)
            .fetch_one(&self.pool)
            .await?;
            Ok(rec)
        }

        async fn find_user_by_email(&self, email: &str) -> RepoResult<UserRow> {
            let rec = sqlx::query_as::<_, UserRow>(&format!("SELECT {USER_COLUMNS} FROM users WHERE email = $1"))
                .bind(normalize_email(email))
                .fetch_one(&self.pool)
                .await?;
            Ok(rec)
        }

        async fn find_user_by_id(&self, id: &str) -> RepoResult<UserRow> {
            let id = parse_id(id)?;
            let rec = sqlx::query_as::<_, UserRow>(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1"))
                .bind(id)
                .fetch_one(&self.pool)
                .await?;
            Ok(rec)
        }
    }

    #[async_trait]
    impl TrackedRepo for PgRepo {
        async fn get_tracked(&self, user_id: &str, mode: Mode) -> RepoResult<Vec<TrackedItem>> {
            let Ok(user_id) = Uuid::parse_str(user_id) else { return Ok(Vec::new()) };
            let rec = sqlx::query_scalar::<_, Json<Vec<TrackedItem>>>(
                "SELECT items FROM tracked_items WHERE user_id = $1 AND mode = $2",
            )
            .bind(user_id)
            .bind(mode.as_str())
            .fetch_optional(&self.pool)
            .await?;
            Ok(rec.map(|Json(items)| items).unwrap_or_default())
        }

        async fn put_tracked(&self, user_id: &str, mode: Mode, items: Vec<TrackedItem>) -> RepoResult<Vec<TrackedItem>> {
            validate_items(&items)?;
            let user_id = parse_id(user_id)?;
            sqlx::query(r#"
                INSERT INTO tracked_items (user_id, mode, items, updated_at)
                VALUES ($1, $2, $3, $4)
                ON CONFLICT (user_id, mode)
                DO UPDATE SET items = EXCLUDED.items, updated_at = EXCLUDED.updated_at
            "#)
            .bind(user_id)
            .bind(mode.as_str())
            .bind(Json(&items))
            .bind(Utc::now())
            .execute(&self.pool)
            .await?;
            Ok(items)
        }
    }
}
