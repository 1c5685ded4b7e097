use std::sync::Arc;

use lazy_static::lazy_static;
use regex::Regex;
use tracing::{info, warn};

use super::dto::{UserList, UserView};
use super::repo_types::{NewUser, Page, User};
use super::store::{StoreError, UserStore};
use crate::auth::{
    jwt::{JwtKeys, TokenError},
    password::{hash_password, verify_password, PasswordError},
};
use crate::context::RequestContext;

const MIN_PASSWORD_CHARS: usize = 5;

#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("validation failed: {}", .0.join("; "))]
    Validation(Vec<String>),
    #[error("user not found")]
    NotFound,
    #[error("invalid credentials")]
    Unauthorized,
    #[error(transparent)]
    Store(StoreError),
    #[error(transparent)]
    Password(#[from] PasswordError),
    #[error(transparent)]
    Token(#[from] TokenError),
}

impl From<StoreError> for ServiceError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::NotFound => ServiceError::NotFound,
            other => ServiceError::Store(other),
        }
    }
}

/// Successful login.
#[derive(Debug, Clone)]
pub struct Session {
    pub user_id: i64,
    pub email: String,
    pub display_name: String,
    pub token: String,
}

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(
            r"^[a-zA-Z0-9.!#$%&'*+/=?^_`{|}~-]+@[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?(?:\.[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?)*$"
        )
        .unwrap();
    }
    EMAIL_RE.is_match(email)
}

/// Collects every problem with a login payload.
fn validate_login(email: &str, password: &str) -> Vec<String> {
    let mut errors = Vec::new();
    if email.is_empty() {
        errors.push("email is required".to_string());
    } else if !is_valid_email(email) {
        errors.push(format!("email '{email}' is not valid"));
    }
    if password.chars().count() < MIN_PASSWORD_CHARS {
        errors.push(format!(
            "password must be at least {MIN_PASSWORD_CHARS} characters"
        ));
    }
    errors
}

/// Runs argon2 work off the async workers. A panicked or aborted task is a
/// hashing failure, never a verdict on the password.
async fn run_blocking<T, F>(f: F) -> Result<T, PasswordError>
where
    F: FnOnce() -> T + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| PasswordError::Hashing(e.to_string()))
}

/// Signup, login and read paths over an injected [`UserStore`].
#[derive(Clone)]
pub struct UserService {
    store: Arc<dyn UserStore>,
    keys: JwtKeys,
    max_page_size: i64,
}

impl UserService {
    pub fn new(store: Arc<dyn UserStore>, keys: JwtKeys, max_page_size: i64) -> Self {
        Self {
            store,
            keys,
            max_page_size,
        }
    }

    pub fn store(&self) -> &Arc<dyn UserStore> {
        &self.store
    }

    pub fn page(&self, limit: Option<i64>, offset: Option<i64>) -> Page {
        Page::new(limit, offset, self.max_page_size)
    }

    pub async fn sign_up(
        &self,
        ctx: &RequestContext,
        first_name: &str,
        last_name: &str,
        email: &str,
        password: &str,
    ) -> Result<User, ServiceError> {
        let plain = password.to_owned();
        let password_hash = run_blocking(move || hash_password(&plain)).await??;
        let user = self
            .store
            .insert(
                ctx,
                NewUser {
                    first_name: first_name.to_uppercase(),
                    last_name: last_name.to_uppercase(),
                    email: email.to_string(),
                    password_hash,
                },
            )
            .await?;
        info!(user_id = user.id, email = %user.email, "user registered");
        Ok(user)
    }

    pub async fn login(
        &self,
        ctx: &RequestContext,
        email: &str,
        password: &str,
    ) -> Result<Session, ServiceError> {
        let errors = validate_login(email, password);
        if !errors.is_empty() {
            warn!(count = errors.len(), "login payload rejected");
            return Err(ServiceError::Validation(errors));
        }

        let user = self.store.get_by_email(ctx, email).await.map_err(|e| {
            if matches!(e, StoreError::NotFound) {
                warn!(email, "login unknown email");
            }
            ServiceError::from(e)
        })?;

        let (hash, plain) = (user.password.clone(), password.to_owned());
        let matched = run_blocking(move || verify_password(&hash, &plain)).await?;
        if !matched {
            warn!(user_id = user.id, "login invalid password");
            return Err(ServiceError::Unauthorized);
        }

        let token = self.keys.sign(user.id)?;
        info!(user_id = user.id, "user logged in");
        Ok(Session {
            user_id: user.id,
            display_name: user.display_name(),
            email: user.email,
            token,
        })
    }

    pub async fn list_users(&self, ctx: &RequestContext, page: Page) -> Result<UserList, ServiceError> {
        let page = Page::new(Some(page.limit), Some(page.offset), self.max_page_size);
        let users: Vec<UserView> = self
            .store
            .list_users(ctx, page)
            .await?
            .into_iter()
            .map(UserView::from)
            .collect();
        Ok(UserList {
            count: users.len(),
            users,
        })
    }

    pub async fn get_user(&self, ctx: &RequestContext, id: i64) -> Result<UserView, ServiceError> {
        let user = self.store.get_by_id(ctx, id).await?;
        Ok(UserView::from(user))
    }
}
