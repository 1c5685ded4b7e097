use sqlx::FromRow;
use time::OffsetDateTime;

/// User record in the `app_user` table.
#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct User {
    pub id: i64,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub password: String,                  // Argon2 PHC string, never plaintext
    pub created_at: OffsetDateTime,
    pub updated_at: Option<OffsetDateTime>, // reserved
}

impl User {
    pub fn display_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

/// Row to insert; id and timestamps are assigned by the store.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub password_hash: String,
}

/// Limit/offset window for listing users.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub limit: i64,
    pub offset: i64,
}

impl Page {
    pub const DEFAULT_LIMIT: i64 = 15;

    /// Negative values fall back to the defaults and `limit` is capped at
    /// `max_limit`.
    pub fn new(limit: Option<i64>, offset: Option<i64>, max_limit: i64) -> Self {
        let limit = limit
            .filter(|l| *l >= 0)
            .unwrap_or(Self::DEFAULT_LIMIT)
            .min(max_limit);
        let offset = offset.filter(|o| *o >= 0).unwrap_or(0);
        Self { limit, offset }
    }
}

impl Default for Page {
    fn default() -> Self {
        Self {
            limit: Self::DEFAULT_LIMIT,
            offset: 0,
        }
    }
}
