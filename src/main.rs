mod app;
mod auth;
mod config;
mod context;
mod db;
mod error;
mod state;
mod users;

use users::store::UserStore;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let env_filter = std::env::var("RUST_LOG")
        .unwrap_or_else(|_| "userhub=debug,axum=info,tower_http=info".to_string());
    let json_logs = std::env::var("LOG_FORMAT")
        .map(|v| v == "json")
        .unwrap_or(false);

    if json_logs {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_target(false)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(env_filter).init();
    }

    let app_state = state::AppState::init().await?;
    let store = app_state.users.store().clone();
    let shutdown = app_state.shutdown.clone();
    let (host, port) = (app_state.config.host.clone(), app_state.config.port);

    let result = app::serve(app::build_app(app_state), &host, port, shutdown).await;

    if let Err(e) = store.close().await {
        tracing::warn!(error = %e, "closing user store failed");
    }
    result
}
