use crate::auth::jwt::JwtKeys;
use crate::config::AppConfig;
use crate::db;
use crate::users::{services::UserService, store::UserStore};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub users: UserService,
    /// Cancelled once a shutdown signal arrives; every request context is a
    /// child of it.
    pub shutdown: CancellationToken,
}

impl AppState {
    pub async fn init() -> anyhow::Result<Self> {
        let config = Arc::new(AppConfig::from_env()?);
        let store = db::connect_store(&config).await?;
        Ok(Self::from_parts(config, store))
    }

    pub fn from_parts(config: Arc<AppConfig>, store: Arc<dyn UserStore>) -> Self {
        let users = UserService::new(
            store,
            JwtKeys::from_config(&config.jwt),
            config.max_page_size,
        );
        Self {
            config,
            users,
            shutdown: CancellationToken::new(),
        }
    }

    #[cfg(test)]
    pub fn fake() -> Self {
        use crate::users::memory::MemoryUserStore;

        let config = Arc::new(AppConfig {
            host: "127.0.0.1".into(),
            port: 0,
            database_url: "memory://".into(),
            db_max_connections: 1,
            jwt: crate::config::JwtConfig {
                secret: "test".into(),
                ttl_hours: 24,
            },
            max_page_size: 100,
            request_timeout: None,
        });
        Self::from_parts(config, Arc::new(MemoryUserStore::new()))
    }
}
