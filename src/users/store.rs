use async_trait::async_trait;

use super::repo_types::{NewUser, Page, User};
use crate::context::{Cancelled, RequestContext};

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("user not found")]
    NotFound,
    #[error("constraint violation: {0}")]
    ConstraintViolation(String),
    #[error("connection error: {0}")]
    Connection(String),
    #[error("operation cancelled")]
    Cancelled,
    #[error("store error: {0}")]
    Backend(String),
}

impl From<Cancelled> for StoreError {
    fn from(_: Cancelled) -> Self {
        StoreError::Cancelled
    }
}

impl From<sqlx::Error> for StoreError {
    fn from(e: sqlx::Error) -> Self {
        match e {
            sqlx::Error::RowNotFound => StoreError::NotFound,
            sqlx::Error::Database(db) if db.is_unique_violation() => {
                StoreError::ConstraintViolation(db.message().to_string())
            }
            e @ (sqlx::Error::Io(_)
            | sqlx::Error::Tls(_)
            | sqlx::Error::PoolTimedOut
            | sqlx::Error::PoolClosed
            | sqlx::Error::WorkerCrashed) => StoreError::Connection(e.to_string()),
            other => StoreError::Backend(other.to_string()),
        }
    }
}

/// Persistence contract for user records. Every call except `close` honours
/// the caller's [`RequestContext`] and fails with [`StoreError::Cancelled`]
/// once it is cancelled or past its deadline.
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Fails with `ConstraintViolation` when the email is already taken.
    async fn insert(&self, ctx: &RequestContext, user: NewUser) -> Result<User, StoreError>;

    /// Most recently created first. An empty page is not an error.
    async fn list_users(&self, ctx: &RequestContext, page: Page) -> Result<Vec<User>, StoreError>;

    async fn get_by_id(&self, ctx: &RequestContext, id: i64) -> Result<User, StoreError>;

    async fn get_by_email(&self, ctx: &RequestContext, email: &str) -> Result<User, StoreError>;

    async fn close(&self) -> Result<(), StoreError>;
}
