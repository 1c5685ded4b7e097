use async_trait::async_trait;
use sqlx::PgPool;
use tracing::debug;

use super::repo_types::{NewUser, Page, User};
use super::store::{StoreError, UserStore};
use crate::context::RequestContext;

/// PostgreSQL-backed [`UserStore`] over the `app_user` table.
#[derive(Debug, Clone)]
pub struct PgUserStore {
    pool: PgPool,
}

impl PgUserStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn insert(&self, ctx: &RequestContext, user: NewUser) -> Result<User, StoreError> {
        let query = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO app_user (first_name, last_name, email, password)
            VALUES ($1, $2, $3, $4)
            RETURNING id, first_name, last_name, email, password, created_at, updated_at
            "#,
        )
        .bind(&user.first_name)
        .bind(&user.last_name)
        .bind(&user.email)
        .bind(&user.password_hash)
        .fetch_one(&self.pool);

        let row = ctx.run(query).await??;
        debug!(user_id = row.id, "user row inserted");
        Ok(row)
    }

    async fn list_users(&self, ctx: &RequestContext, page: Page) -> Result<Vec<User>, StoreError> {
        let query = sqlx::query_as::<_, User>(
            r#"
            SELECT id, first_name, last_name, email, password, created_at, updated_at
            FROM app_user
            ORDER BY id DESC
            LIMIT $1 OFFSET $2
            "#,
        )
        .bind(page.limit)
        .bind(page.offset)
        .fetch_all(&self.pool);

        Ok(ctx.run(query).await??)
    }

    async fn get_by_id(&self, ctx: &RequestContext, id: i64) -> Result<User, StoreError> {
        let query = sqlx::query_as::<_, User>(
            r#"
            SELECT id, first_name, last_name, email, password, created_at, updated_at
            FROM app_user
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool);

        ctx.run(query).await??.ok_or(StoreError::NotFound)
    }

    async fn get_by_email(&self, ctx: &RequestContext, email: &str) -> Result<User, StoreError> {
        let query = sqlx::query_as::<_, User>(
            r#"
            SELECT id, first_name, last_name, email, password, created_at, updated_at
            FROM app_user
            WHERE email = $1
            "#,
        )
        .bind(email)
        .fetch_optional(&self.pool);

        ctx.run(query).await??.ok_or(StoreError::NotFound)
    }

    async fn close(&self) -> Result<(), StoreError> {
        self.pool.close().await;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::postgres::PgPoolOptions;

    // Runs only against a scratch database given by TEST_DATABASE_URL.
    async fn scratch_store() -> Option<PgUserStore> {
        let url = std::env::var("TEST_DATABASE_URL").ok()?;
        let pool = PgPoolOptions::new()
            .max_connections(2)
            .connect(&url)
            .await
            .expect("connect to TEST_DATABASE_URL");
        sqlx::query("DROP TABLE IF EXISTS app_user")
            .execute(&pool)
            .await
            .expect("drop table");
        sqlx::query(include_str!("../../sql/schema.sql"))
            .execute(&pool)
            .await
            .expect("create table");
        Some(PgUserStore::new(pool))
    }

    fn new_user(email: &str) -> NewUser {
        NewUser {
            first_name: "ADA".into(),
            last_name: "LOVELACE".into(),
            email: email.into(),
            password_hash: "$argon2id$fake".into(),
        }
    }

    #[tokio::test]
    async fn postgres_round_trip_and_constraints() {
        let Some(store) = scratch_store().await else {
            return;
        };
        let ctx = RequestContext::new();

        for i in 1..=5 {
            store
                .insert(&ctx, new_user(&format!("u{i}@example.com")))
                .await
                .unwrap();
        }

        let page = store
            .list_users(&ctx, Page { limit: 2, offset: 2 })
            .await
            .unwrap();
        let ids: Vec<i64> = page.iter().map(|u| u.id).collect();
        assert_eq!(ids, vec![3, 2]);

        let dup = store.insert(&ctx, new_user("u1@example.com")).await;
        assert!(matches!(dup, Err(StoreError::ConstraintViolation(_))));

        let by_email = store.get_by_email(&ctx, "u1@example.com").await.unwrap();
        assert_eq!(by_email.id, 1);
        assert!(matches!(
            store.get_by_id(&ctx, 999).await,
            Err(StoreError::NotFound)
        ));

        store.close().await.unwrap();
    }
}
