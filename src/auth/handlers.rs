use axum::{
    extract::{rejection::JsonRejection, State},
    routing::post,
    Json, Router,
};
use tracing::{instrument, warn};

use crate::{
    auth::dto::{LoginRequest, LoginResponse, SignUpRequest, SignUpResponse},
    context::RequestContext,
    error::ApiError,
    state::AppState,
};

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        // "singin" is the historical path clients already call
        .route("/auth/singin", post(sign_up))
        .route("/auth/signup", post(sign_up))
        .route("/auth/login", post(login))
}

fn decode<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, ApiError> {
    match payload {
        Ok(Json(v)) => Ok(v),
        Err(e) => {
            warn!(error = %e, "request body rejected");
            Err(ApiError::Decode(e.body_text()))
        }
    }
}

#[instrument(skip(state, ctx, payload))]
pub async fn sign_up(
    State(state): State<AppState>,
    ctx: RequestContext,
    payload: Result<Json<SignUpRequest>, JsonRejection>,
) -> Result<Json<SignUpResponse>, ApiError> {
    let req = decode(payload)?;
    let user = state
        .users
        .sign_up(&ctx, &req.first_name, &req.last_name, &req.email, &req.password)
        .await?;

    Ok(Json(SignUpResponse {
        message: "User created successfully".into(),
        status: true,
        email: user.email,
    }))
}

#[instrument(skip(state, ctx, payload))]
pub async fn login(
    State(state): State<AppState>,
    ctx: RequestContext,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Json<LoginResponse>, ApiError> {
    let req = decode(payload)?;
    let session = state.users.login(&ctx, &req.email, &req.password).await?;

    Ok(Json(LoginResponse {
        email: session.email,
        name: session.display_name,
        token: session.token,
    }))
}
