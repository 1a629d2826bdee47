use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Gameplay scope a tracked collection belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    Pvp,
    Pve,
}

impl Mode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Mode::Pvp => "pvp",
            Mode::Pve => "pve",
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(thiserror::Error, Debug, PartialEq, Eq)]
#[error("unknown mode")]
pub struct UnknownMode;

impl FromStr for Mode {
    type Err = UnknownMode;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "pvp" => Ok(Mode::Pvp),
            "pve" => Ok(Mode::Pve),
            _ => Err(UnknownMode),
        }
    }
}

/// Stored user record. Only the repository and the login path ever see `password_hash`.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct UserRow {
    pub id: String,
    pub email: String,
    pub name: String,
    pub avatar_url: Option<String>,
    pub password_hash: String,
}

/// Public view of a user.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub email: String,
    pub name: String,
    pub avatar_url: Option<String>,
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        Self { id: row.id, email: row.email, name: row.name, avatar_url: row.avatar_url }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct TrackedItem {
    pub id: String,
    #[serde(default)]
    pub icon_link: Option<String>,
    #[serde(default)]
    pub updated_at: i64,
}

#[derive(thiserror::Error, Debug, PartialEq, Eq)]
pub enum InvalidItem {
    #[error("item at index {0} has an empty id")]
    EmptyId(usize),
    #[error("item {0:?} has a negative updatedAt")]
    NegativeTimestamp(String),
    #[error("item id {0:?} appears more than once")]
    DuplicateId(String),
}

/// Structural checks every tracked collection must pass before it is written.
pub fn validate_items(items: &[TrackedItem]) -> Result<(), InvalidItem> {
    let mut seen = HashSet::with_capacity(items.len());
    for (idx, item) in items.iter().enumerate() {
        if item.id.trim().is_empty() {
            return Err(InvalidItem::EmptyId(idx));
        }
        if item.updated_at < 0 {
            return Err(InvalidItem::NegativeTimestamp(item.id.clone()));
        }
        if !seen.insert(item.id.as_str()) {
            return Err(InvalidItem::DuplicateId(item.id.clone()));
        }
    }
    Ok(())
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct RegisterRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct LoginRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AuthResponse {
    pub token: String,
    pub user: User,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct MeResponse {
    pub user: User,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct TrackedItemsResponse {
    pub items: Vec<TrackedItem>,
}

/// A missing or `null` item list is an empty collection.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct PutTrackedRequest {
    #[serde(default)]
    pub items: Option<Vec<TrackedItem>>,
}

#[derive(Debug, Deserialize)]
pub struct ModeQuery {
    pub mode: Option<String>,
}
