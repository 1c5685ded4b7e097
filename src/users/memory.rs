use async_trait::async_trait;
use time::OffsetDateTime;
use tokio::sync::RwLock;

use super::repo_types::{NewUser, Page, User};
use super::store::{StoreError, UserStore};
use crate::context::RequestContext;

#[derive(Debug, Default)]
struct Inner {
    rows: Vec<User>, // ascending id
    next_id: i64,
    closed: bool,
}

/// In-process [`UserStore`]. Selected with `DATABASE_URL=memory://` and used
/// by the service and router tests.
#[derive(Debug, Default)]
pub struct MemoryUserStore {
    inner: RwLock<Inner>,
}

impl MemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }

    #[cfg(test)]
    pub async fn len(&self) -> usize {
        self.inner.read().await.rows.len()
    }
}

fn ensure_open(inner: &Inner) -> Result<(), StoreError> {
    if inner.closed {
        return Err(StoreError::Connection("store is closed".into()));
    }
    Ok(())
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn insert(&self, ctx: &RequestContext, user: NewUser) -> Result<User, StoreError> {
        let mut inner = ctx.run(self.inner.write()).await?;
        ensure_open(&inner)?;

        if inner.rows.iter().any(|u| u.email == user.email) {
            return Err(StoreError::ConstraintViolation(format!(
                "email '{}' already exists",
                user.email
            )));
        }

        inner.next_id += 1;
        let row = User {
            id: inner.next_id,
            first_name: user.first_name,
            last_name: user.last_name,
            email: user.email,
            password: user.password_hash,
            created_at: OffsetDateTime::now_utc(),
            updated_at: None,
        };
        inner.rows.push(row.clone());
        Ok(row)
    }

    async fn list_users(&self, ctx: &RequestContext, page: Page) -> Result<Vec<User>, StoreError> {
        let inner = ctx.run(self.inner.read()).await?;
        ensure_open(&inner)?;

        Ok(inner
            .rows
            .iter()
            .rev()
            .skip(page.offset.max(0) as usize)
            .take(page.limit.max(0) as usize)
            .cloned()
            .collect())
    }

    async fn get_by_id(&self, ctx: &RequestContext, id: i64) -> Result<User, StoreError> {
        let inner = ctx.run(self.inner.read()).await?;
        ensure_open(&inner)?;
        inner
            .rows
            .iter()
            .find(|u| u.id == id)
            .cloned()
            .ok_or(StoreError::NotFound)
    }

    async fn get_by_email(&self, ctx: &RequestContext, email: &str) -> Result<User, StoreError> {
        let inner = ctx.run(self.inner.read()).await?;
        ensure_open(&inner)?;
        inner
            .rows
            .iter()
            .find(|u| u.email == email)
            .cloned()
            .ok_or(StoreError::NotFound)
    }

    async fn close(&self) -> Result<(), StoreError> {
        self.inner.write().await.closed = true;
        Ok(())
    }
}
