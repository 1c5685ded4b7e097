use axum::{
    extract::{
        rejection::{PathRejection, QueryRejection},
        Path, Query, State,
    },
    routing::get,
    Json, Router,
};
use tracing::instrument;

use super::dto::{Pagination, UserList, UserView};
use crate::{auth::extractors::AuthUser, context::RequestContext, error::ApiError, state::AppState};

pub fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/user", get(list_users))
        .route("/user/:id", get(get_user))
}

pub fn me_routes() -> Router<AppState> {
    Router::new().route("/me", get(get_me))
}

#[instrument(skip(state, ctx, query))]
pub async fn list_users(
    State(state): State<AppState>,
    ctx: RequestContext,
    query: Result<Query<Pagination>, QueryRejection>,
) -> Result<Json<UserList>, ApiError> {
    // unreadable query strings fall back to the default page
    let p = query.map(|Query(p)| p).unwrap_or_default();
    let page = state.users.page(p.limit(), p.offset());
    let list = state.users.list_users(&ctx, page).await?;
    Ok(Json(list))
}

#[instrument(skip(state, ctx, id))]
pub async fn get_user(
    State(state): State<AppState>,
    ctx: RequestContext,
    id: Result<Path<u64>, PathRejection>,
) -> Result<Json<UserView>, ApiError> {
    let Path(id) = id.map_err(|e| ApiError::BadRequest(e.body_text()))?;
    let id = i64::try_from(id)
        .map_err(|_| ApiError::BadRequest(format!("id {id} is out of range")))?;
    let view = state.users.get_user(&ctx, id).await?;
    Ok(Json(view))
}

#[instrument(skip(state, ctx))]
pub async fn get_me(
    State(state): State<AppState>,
    ctx: RequestContext,
    AuthUser(user_id): AuthUser,
) -> Result<Json<UserView>, ApiError> {
    let view = state.users.get_user(&ctx, user_id).await?;
    Ok(Json(view))
}
